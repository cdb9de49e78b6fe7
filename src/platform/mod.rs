// ── Platform abstraction layer ────────────────────────────────────────────────
//
// This module defines the interface the facade uses to talk to the OS.  No
// `unsafe` lives here; all FFI is confined to the per-OS sub-modules and never
// leaks outward.
//
// Exactly one backend is compiled in, chosen by target:
//   • Windows  → `win32`        synchronous common dialogs
//   • macOS    → `appkit`       panels answering through a callback
//   • anything else → `unsupported`

use std::{fmt, path::PathBuf, sync::Arc};

use parking_lot::Mutex;
use raw_window_handle::RawWindowHandle;

use crate::{
    config::Config,
    error::Result,
    registry::{Identity, Registry},
};

pub(crate) mod callback;

#[cfg(target_os = "macos")]
pub(crate) mod appkit;
#[cfg(not(any(windows, target_os = "macos")))]
pub(crate) mod unsupported;
#[cfg(windows)]
pub(crate) mod win32;

// ── Backend interface ─────────────────────────────────────────────────────────

/// The capability set every dialog adapter provides.
///
/// Calls block until the dialog closes.  The facade guarantees that at most
/// one call per adapter is in flight.  The anchor view is not part of the
/// trait: adapters read their [`BoundView`] at the start of each call.
pub(crate) trait DialogBackend: Send {
    /// Let the user pick one existing file.
    fn choose_one(&mut self, extensions: &[String]) -> Result<PathBuf>;

    /// Let the user pick one or more existing files.
    fn choose_many(&mut self, extensions: &[String]) -> Result<Vec<PathBuf>>;

    /// Let the user pick where to save `suggested_name`.
    fn create_and_choose(&mut self, suggested_name: &str) -> Result<PathBuf>;
}

/// Everything a backend needs at construction time.
#[cfg_attr(not(any(windows, target_os = "macos")), allow(dead_code))]
pub(crate) struct BackendContext {
    pub(crate) identity: Identity,
    pub(crate) run: RunHandler,
    pub(crate) config: Config,
    pub(crate) registry: &'static Registry,
    pub(crate) view: BoundView,
}

/// Build the backend for the current target.
pub(crate) fn native(ctx: BackendContext) -> Box<dyn DialogBackend> {
    #[cfg(windows)]
    {
        Box::new(win32::dialogs::CommonDialogs::new(ctx))
    }
    #[cfg(target_os = "macos")]
    {
        Box::new(appkit::Panels::new(ctx))
    }
    #[cfg(not(any(windows, target_os = "macos")))]
    {
        Box::new(unsupported::Unsupported::new(ctx))
    }
}

// ── View handle ───────────────────────────────────────────────────────────────

/// Native view a dialog is anchored to, stored as a plain integer so that
/// backends stay `Send`.  Only dereferenced on the thread that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ViewHandle {
    /// `HWND` of the owner window.
    Win32(isize),
    /// `NSView *` of the host view.
    AppKit(usize),
    /// A handle kind no backend uses.
    Other,
}

impl From<RawWindowHandle> for ViewHandle {
    fn from(raw: RawWindowHandle) -> Self {
        match raw {
            RawWindowHandle::Win32(h) => Self::Win32(h.hwnd.get()),
            RawWindowHandle::AppKit(h) => Self::AppKit(h.ns_view.as_ptr() as usize),
            _ => Self::Other,
        }
    }
}

/// The view an explorer's dialogs are anchored to.
///
/// Written by the facade from any thread, read by the adapter when a dialog
/// starts.  Never locked across a dialog, so re-binding while a call is
/// pending does not wait for that call.
#[derive(Debug, Clone, Default)]
pub(crate) struct BoundView(Arc<Mutex<Option<ViewHandle>>>);

impl BoundView {
    pub(crate) fn set(&self, view: ViewHandle) {
        *self.0.lock() = Some(view);
    }

    #[cfg_attr(not(any(windows, target_os = "macos")), allow(dead_code))]
    pub(crate) fn get(&self) -> Option<ViewHandle> {
        *self.0.lock()
    }
}

// ── Run handler ───────────────────────────────────────────────────────────────

/// Unit of work handed to a [`RunHandler`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs a task on the thread that owns the host's UI.
///
/// AppKit only shows panels from the main thread, so the host passes the
/// equivalent of its window's "run on UI thread" entry point.  Windows shows
/// its dialogs from the calling thread and never uses the handler.
///
/// If the handler drops a task without running it, the call waiting on that
/// task never returns.
#[derive(Clone)]
pub struct RunHandler(Arc<dyn Fn(Task) + Send + Sync>);

impl RunHandler {
    /// Wrap the host's dispatch function.
    pub fn new(run: impl Fn(Task) + Send + Sync + 'static) -> Self {
        Self(Arc::new(run))
    }

    /// Run every task immediately on the calling thread.
    pub fn inline() -> Self {
        Self::new(|task| task())
    }

    #[cfg_attr(not(target_os = "macos"), allow(dead_code))]
    pub(crate) fn run(&self, task: Task) {
        (self.0)(task)
    }
}

impl Default for RunHandler {
    fn default() -> Self {
        Self::inline()
    }
}

impl fmt::Debug for RunHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RunHandler(..)")
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
