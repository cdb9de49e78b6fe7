// ── Common dialogs ─────────────────────────────────────────────────────────────
//
// Wrappers around `GetOpenFileNameW` / `GetSaveFileNameW`.  Both block the
// calling thread in their own modal loop, so the run handler is never used:
// the answer comes back as the return value plus the buffer we lent.
//
// This is inside `platform::win32` so `unsafe` is permitted per crate policy.

#![allow(unsafe_code)]

use std::path::PathBuf;

use windows::{
    core::{PCWSTR, PWSTR},
    Win32::{
        Foundation::HWND,
        UI::Controls::Dialogs::{
            CommDlgExtendedError, GetOpenFileNameW, GetSaveFileNameW, OFN_ALLOWMULTISELECT,
            OFN_EXPLORER, OFN_FILEMUSTEXIST, OFN_FORCESHOWHIDDEN, OFN_NODEREFERENCELINKS,
            OFN_OVERWRITEPROMPT, OFN_PATHMUSTEXIST, OPENFILENAMEW, OPEN_FILENAME_FLAGS,
        },
    },
};

use crate::{
    config::Config,
    decode, filter,
    error::{Error, Result},
    platform::{BackendContext, BoundView, DialogBackend, ViewHandle},
    registry::Identity,
};

// ── Adapter ───────────────────────────────────────────────────────────────────

pub(crate) struct CommonDialogs {
    identity: Identity,
    config: Config,
    view: BoundView,
    /// Raw selection buffer, reused across calls and cleared before each one.
    buf: Vec<u16>,
}

/// Which entry point a call goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    OpenOne,
    OpenMany,
    Save,
}

impl CommonDialogs {
    pub(crate) fn new(ctx: BackendContext) -> Self {
        let len = ctx.config.path_buffer_len;
        Self {
            identity: ctx.identity,
            config: ctx.config,
            view: ctx.view,
            buf: vec![0u16; len],
        }
    }

    /// Owner window for the next dialog, as the integer value of its `HWND`.
    fn owner(&self) -> isize {
        match self.view.get() {
            Some(ViewHandle::Win32(hwnd)) => hwnd,
            Some(other) => {
                log::warn!("explorer {}: ignoring non-Win32 view {other:?}", self.identity);
                0
            }
            None => 0,
        }
    }

    /// Show one dialog and decode the buffer.
    ///
    /// `filter` and `default_ext` must already be NUL-terminated UTF-16.
    fn show(
        &mut self,
        kind: Kind,
        filter: Option<&[u16]>,
        default_ext: Option<&[u16]>,
    ) -> Result<Vec<PathBuf>> {
        log::debug!("explorer {}: showing {kind:?} dialog", self.identity);

        let mut ofn = OPENFILENAMEW {
            lStructSize: std::mem::size_of::<OPENFILENAMEW>() as u32,
            hwndOwner: HWND(self.owner() as *mut core::ffi::c_void),
            lpstrFilter: filter.map_or(PCWSTR::null(), |f| PCWSTR(f.as_ptr())),
            lpstrFile: PWSTR(self.buf.as_mut_ptr()),
            // Config::validate bounds the length to u32.
            nMaxFile: self.buf.len() as u32,
            lpstrDefExt: default_ext.map_or(PCWSTR::null(), |e| PCWSTR(e.as_ptr())),
            Flags: flags(&self.config, kind),
            ..Default::default()
        };

        // SAFETY: `ofn` is fully initialised; `self.buf`, `filter` and
        // `default_ext` outlive this call and `nMaxFile` is the true length of
        // `self.buf`.  The dialog reads and writes only within those buffers.
        // It runs its own modal loop on the calling thread.
        let ok = unsafe {
            match kind {
                Kind::Save => GetSaveFileNameW(&mut ofn),
                Kind::OpenOne | Kind::OpenMany => GetOpenFileNameW(&mut ofn),
            }
        };

        if !ok.as_bool() {
            return Err(cancel_or_failure(match kind {
                Kind::Save => "GetSaveFileNameW",
                Kind::OpenOne | Kind::OpenMany => "GetOpenFileNameW",
            }));
        }

        let paths = decode::decode_wide(&self.buf)?;
        log::debug!("explorer {}: {} path(s) selected", self.identity, paths.len());
        Ok(paths)
    }

    fn clear(&mut self) {
        self.buf.fill(0);
    }
}

impl DialogBackend for CommonDialogs {
    fn choose_one(&mut self, extensions: &[String]) -> Result<PathBuf> {
        self.clear();
        let filter = filter::wide_filter(extensions);
        let mut paths = self.show(Kind::OpenOne, filter.as_deref(), None)?;
        Ok(paths.swap_remove(0))
    }

    fn choose_many(&mut self, extensions: &[String]) -> Result<Vec<PathBuf>> {
        self.clear();
        let filter = filter::wide_filter(extensions);
        self.show(Kind::OpenMany, filter.as_deref(), None)
    }

    fn create_and_choose(&mut self, suggested_name: &str) -> Result<PathBuf> {
        self.clear();
        if prefill(&mut self.buf, suggested_name) {
            log::warn!(
                "explorer {}: suggested name truncated to {} UTF-16 units",
                self.identity,
                self.buf.len() - 1
            );
        }

        let (filter, default_ext) = filter::save_filter(suggested_name);
        let mut paths = self.show(Kind::Save, filter.as_deref(), default_ext.as_deref())?;
        Ok(paths.swap_remove(0))
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn flags(config: &Config, kind: Kind) -> OPEN_FILENAME_FLAGS {
    let mut flags = OFN_EXPLORER;
    match kind {
        Kind::OpenOne | Kind::OpenMany => {
            flags |= OFN_FILEMUSTEXIST;
            if config.show_hidden {
                flags |= OFN_FORCESHOWHIDDEN;
            }
            if !config.follow_links {
                flags |= OFN_NODEREFERENCELINKS;
            }
            if kind == Kind::OpenMany {
                flags |= OFN_ALLOWMULTISELECT;
            }
        }
        Kind::Save => {
            flags |= OFN_PATHMUSTEXIST;
            if config.overwrite_prompt {
                flags |= OFN_OVERWRITEPROMPT;
            }
        }
    }
    flags
}

/// Copy `name` into the front of a zeroed `buf`, keeping the last unit as the
/// terminator.  Returns `true` if the name did not fit and was cut short; a
/// cut never leaves half a surrogate pair behind.
fn prefill(buf: &mut [u16], name: &str) -> bool {
    let Some(max) = buf.len().checked_sub(1) else {
        return !name.is_empty();
    };
    let mut written = 0;
    let mut units = name.encode_utf16();
    for (dst, unit) in buf[..max].iter_mut().zip(&mut units) {
        *dst = unit;
        written += 1;
    }
    let truncated = units.next().is_some();
    if truncated && written > 0 && (0xD800..0xDC00).contains(&buf[written - 1]) {
        buf[written - 1] = 0;
    }
    truncated
}

/// Tell a cancelled dialog apart from a failed one.
///
/// Must be called right after the dialog returns zero: the extended error is
/// thread-local state that the next common-dialog call overwrites.
fn cancel_or_failure(function: &'static str) -> Error {
    // SAFETY: CommDlgExtendedError reads thread-local state set by the last
    // common-dialog call.  It has no preconditions and never fails.
    let code = unsafe { CommDlgExtendedError() };
    if code.0 == 0 {
        Error::UserDeclined
    } else {
        log::warn!("{function} failed with extended error {:#x}", code.0);
        Error::Native {
            function,
            code: code.0,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn has(flags: OPEN_FILENAME_FLAGS, flag: OPEN_FILENAME_FLAGS) -> bool {
        flags.0 & flag.0 == flag.0
    }

    // ── flags ────────────────────────────────────────────────────────────────

    #[test]
    fn default_open_flags() {
        let f = flags(&Config::default(), Kind::OpenOne);
        assert!(has(f, OFN_EXPLORER));
        assert!(has(f, OFN_FILEMUSTEXIST));
        assert!(has(f, OFN_FORCESHOWHIDDEN));
        assert!(has(f, OFN_NODEREFERENCELINKS));
        assert!(!has(f, OFN_ALLOWMULTISELECT));
        assert!(!has(f, OFN_OVERWRITEPROMPT));
    }

    #[test]
    fn multiselect_only_for_open_many() {
        let config = Config::default();
        assert!(has(flags(&config, Kind::OpenMany), OFN_ALLOWMULTISELECT));
        assert!(!has(flags(&config, Kind::OpenOne), OFN_ALLOWMULTISELECT));
        assert!(!has(flags(&config, Kind::Save), OFN_ALLOWMULTISELECT));
    }

    #[test]
    fn follow_links_drops_no_dereference() {
        let config = Config {
            follow_links: true,
            ..Config::default()
        };
        assert!(!has(flags(&config, Kind::OpenOne), OFN_NODEREFERENCELINKS));
        assert!(!has(flags(&config, Kind::OpenMany), OFN_NODEREFERENCELINKS));
    }

    #[test]
    fn hidden_files_can_be_hidden() {
        let config = Config {
            show_hidden: false,
            ..Config::default()
        };
        assert!(!has(flags(&config, Kind::OpenOne), OFN_FORCESHOWHIDDEN));
    }

    #[test]
    fn save_flags_follow_overwrite_prompt() {
        let f = flags(&Config::default(), Kind::Save);
        assert!(has(f, OFN_EXPLORER));
        assert!(has(f, OFN_PATHMUSTEXIST));
        assert!(has(f, OFN_OVERWRITEPROMPT));
        assert!(!has(f, OFN_FILEMUSTEXIST));

        let quiet = Config {
            overwrite_prompt: false,
            ..Config::default()
        };
        assert!(!has(flags(&quiet, Kind::Save), OFN_OVERWRITEPROMPT));
    }

    // ── prefill ──────────────────────────────────────────────────────────────

    #[test]
    fn prefill_writes_terminated_name() {
        let mut buf = vec![0u16; 32];
        assert!(!prefill(&mut buf, "default-name.txt"));
        let expected: Vec<u16> = "default-name.txt".encode_utf16().collect();
        assert_eq!(&buf[..expected.len()], expected.as_slice());
        assert_eq!(buf[expected.len()], 0);
    }

    #[test]
    fn prefill_reports_truncation() {
        let mut buf = vec![0u16; 5];
        assert!(prefill(&mut buf, "abcdef"));
        assert_eq!(buf, "abcd\0".encode_utf16().collect::<Vec<_>>());
    }

    #[test]
    fn prefill_exact_fit_is_not_truncated() {
        let mut buf = vec![0u16; 5];
        assert!(!prefill(&mut buf, "abcd"));
        assert_eq!(buf[4], 0);
    }

    #[test]
    fn prefill_never_splits_surrogate_pair() {
        // "a" + U+1F600 is three units; only two fit before the terminator.
        let mut buf = vec![0u16; 3];
        assert!(prefill(&mut buf, "a\u{1F600}"));
        assert_eq!(buf, vec![u16::from(b'a'), 0, 0]);
    }
}
