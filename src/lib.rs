//! Native file dialogs for choosing files to open and places to save.
//!
//! An [`Explorer`] shows the operating system's own dialog and hands back the
//! chosen path(s):
//!
//! * [`Explorer::choose_file`] / [`Explorer::choose_files`] select existing
//!   files, optionally restricted to a list of extensions.
//! * [`Explorer::create_file`] selects where a new file should go.
//! * [`Explorer::open_file`], [`Explorer::open_files`] and
//!   [`Explorer::create_file_writer`] also open the result.
//!
//! Windows uses the common open/save dialogs, macOS uses `NSOpenPanel` and
//! `NSSavePanel`.  Every other target returns [`Error::Unsupported`].
//!
//! A cancelled dialog is reported as [`Error::UserDeclined`], never as an
//! empty result.

// ── Safety policy ────────────────────────────────────────────────────────────
// Unsafe code is forbidden everywhere except:
//   • `platform::win32` – common-dialog FFI
//   • `platform::appkit` – AppKit panel FFI
// Each unsafe block in those modules MUST carry a `// SAFETY:` comment.
#![deny(unsafe_code)]

mod config;
mod decode;
mod error;
mod explorer;
mod filter;
mod platform;
mod registry;

pub use config::{Config, DEFAULT_PATH_BUFFER_LEN, MIN_PATH_BUFFER_LEN};
pub use error::{Error, Result};
pub use explorer::Explorer;
pub use platform::{RunHandler, Task};
pub use raw_window_handle;
pub use registry::Identity;
