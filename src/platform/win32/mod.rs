// ── Win32 platform implementation ─────────────────────────────────────────────
//
// One of exactly two modules in the crate where `unsafe` code is permitted
// (the other is `platform::appkit`).  Every `unsafe` block MUST carry a
// `// SAFETY:` comment that states:
//   • which invariant makes the operation sound, and
//   • what the caller is responsible for maintaining.
//
// Nothing in this module is `pub` beyond what the facade genuinely needs; keep
// the unsafe surface as small as possible.

#![allow(unsafe_code)]

// ── Sub-modules ───────────────────────────────────────────────────────────────

pub(crate) mod dialogs; // common open/save dialogs
