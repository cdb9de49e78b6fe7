// ── AppKit panels ─────────────────────────────────────────────────────────────
//
// `NSOpenPanel` / `NSSavePanel` must be created and shown on the main thread,
// and when attached to a window they answer later through a completion
// handler.  So every call goes through `CallbackBridge`:
//
//   caller thread                 main thread (run handler)
//   ─────────────                 ─────────────────────────
//   arm registry slot
//   post `show`            ──▶    build panel, begin sheet
//   block on slot                 …user picks…
//                                 completion handler → Registry::deliver
//   decode URLs            ◀──
//
// With no bound view (or a view not yet in a window) the panel runs
// application-modal and the same completion path is taken on return.
//
// One of exactly two modules in the crate where `unsafe` is permitted (the
// other is `platform::win32`).  Every `unsafe` block carries a `// SAFETY:`
// comment.

#![allow(unsafe_code)]

use std::path::PathBuf;

use block2::RcBlock;
use objc2::{rc::Retained, MainThreadMarker};
use objc2_app_kit::{NSModalResponse, NSModalResponseOK, NSOpenPanel, NSSavePanel, NSView};
use objc2_foundation::{NSArray, NSString};

use crate::{
    error::{Error, Result},
    filter,
    platform::{callback::CallbackBridge, BackendContext, BoundView, DialogBackend, ViewHandle},
    registry::{Identity, Registry},
};

// ── Adapter ───────────────────────────────────────────────────────────────────

pub(crate) struct Panels {
    bridge: CallbackBridge,
    view: BoundView,
}

/// What the main thread should show.  Plain data so it can cross threads.
#[derive(Debug)]
enum Request {
    Open { types: Option<String>, many: bool },
    Save { name: String },
}

impl Panels {
    pub(crate) fn new(ctx: BackendContext) -> Self {
        Self {
            bridge: CallbackBridge::new(ctx.identity, ctx.run, ctx.registry),
            view: ctx.view,
        }
    }

    /// `NSView *` of the bound host view.  Only dereferenced on the main thread.
    fn anchor(&self) -> Option<usize> {
        match self.view.get()? {
            ViewHandle::AppKit(ptr) => Some(ptr),
            other => {
                log::warn!(
                    "explorer {}: ignoring non-AppKit view {other:?}",
                    self.bridge.identity()
                );
                None
            }
        }
    }

    fn present(&self, request: Request) -> Result<Vec<PathBuf>> {
        log::debug!("explorer {}: presenting {request:?}", self.bridge.identity());
        let view = self.anchor();
        let paths = self
            .bridge
            .request(move |id, registry| show(id, registry, view, request))?;
        log::debug!(
            "explorer {}: {} path(s) selected",
            self.bridge.identity(),
            paths.len()
        );
        Ok(paths)
    }
}

impl DialogBackend for Panels {
    fn choose_one(&mut self, extensions: &[String]) -> Result<PathBuf> {
        let mut paths = self.present(Request::Open {
            types: filter::joined_filter(extensions),
            many: false,
        })?;
        Ok(paths.swap_remove(0))
    }

    fn choose_many(&mut self, extensions: &[String]) -> Result<Vec<PathBuf>> {
        self.present(Request::Open {
            types: filter::joined_filter(extensions),
            many: true,
        })
    }

    fn create_and_choose(&mut self, suggested_name: &str) -> Result<PathBuf> {
        let mut paths = self.present(Request::Save {
            name: suggested_name.to_owned(),
        })?;
        Ok(paths.swap_remove(0))
    }
}

// ── Main-thread side ──────────────────────────────────────────────────────────

#[derive(Clone)]
enum Panel {
    Open(Retained<NSOpenPanel>),
    Save(Retained<NSSavePanel>),
}

impl Panel {
    fn as_save(&self) -> &NSSavePanel {
        match self {
            Self::Open(p) => p,
            Self::Save(p) => p,
        }
    }

    /// Absolute URL strings of the current selection.
    fn urls(&self) -> Vec<String> {
        match self {
            Self::Open(p) => {
                let urls = p.URLs();
                (0..urls.count())
                    .filter_map(|i| urls.objectAtIndex(i).absoluteString())
                    .map(|s| s.to_string())
                    .collect()
            }
            Self::Save(p) => p
                .URL()
                .and_then(|u| u.absoluteString())
                .map(|s| vec![s.to_string()])
                .unwrap_or_default(),
        }
    }
}

/// Build and show the panel.  Runs on the main thread via the run handler.
fn show(id: Identity, registry: &'static Registry, view: Option<usize>, request: Request) {
    let Some(mtm) = MainThreadMarker::new() else {
        log::warn!("explorer {id}: run handler did not execute on the main thread");
        registry.deliver(
            id,
            Err(Error::Native {
                function: "MainThreadMarker::new",
                code: 0,
            }),
        );
        return;
    };

    let panel = match request {
        Request::Open { types, many } => {
            let open = NSOpenPanel::openPanel(mtm);
            // SAFETY: plain property setters on a panel we own, main thread.
            unsafe {
                open.setCanChooseFiles(true);
                open.setCanChooseDirectories(false);
                open.setAllowsMultipleSelection(many);
            }
            if let Some(types) = types {
                set_allowed_types(&open, &types);
            }
            Panel::Open(open)
        }
        Request::Save { name } => {
            let save = NSSavePanel::savePanel(mtm);
            // SAFETY: plain property setter on a panel we own, main thread.
            unsafe { save.setNameFieldStringValue(&NSString::from_str(&name)) };
            Panel::Save(save)
        }
    };

    let window = view.and_then(|ptr| {
        // SAFETY: the host bound a live `NSView *` through `set_view`, and we
        // are on the main thread that owns it.
        let view: &NSView = unsafe { &*(ptr as *const NSView) };
        view.window()
    });

    match window {
        Some(window) => {
            let answering = panel.clone();
            let handler = RcBlock::new(move |response: NSModalResponse| {
                complete(registry, id, &answering, response);
            });
            // SAFETY: `window` and `handler` are retained for the duration of
            // the sheet; AppKit copies the block.
            unsafe {
                panel
                    .as_save()
                    .beginSheetModalForWindow_completionHandler(&window, &handler)
            };
        }
        None => {
            // SAFETY: main thread; the panel is fully configured.
            let response = unsafe { panel.as_save().runModal() };
            complete(registry, id, &panel, response);
        }
    }
}

/// Completion callback: report the selection (empty on cancel) for `id`.
fn complete(registry: &Registry, id: Identity, panel: &Panel, response: NSModalResponse) {
    let urls = if response == NSModalResponseOK {
        panel.urls()
    } else {
        Vec::new()
    };
    if !registry.deliver(id, Ok(urls)) {
        log::debug!("explorer {id}: answer arrived after the explorer was dropped");
    }
}

/// Restrict the panel to the comma-joined extensions in `types`.
#[allow(deprecated)]
fn set_allowed_types(panel: &NSSavePanel, types: &str) {
    let list: Vec<Retained<NSString>> = types.split(',').map(NSString::from_str).collect();
    let array = NSArray::from_retained_slice(&list);
    // SAFETY: main thread; `array` outlives the call and AppKit copies it.
    unsafe { panel.setAllowedFileTypes(Some(&array)) };
}
