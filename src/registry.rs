// ── Request correlation registry ──────────────────────────────────────────────
//
// Callback-native dialogs (AppKit panels) answer on the UI thread through a
// completion callback that only carries a small integer.  This table maps that
// integer back to the explorer whose caller is blocked waiting for the answer.
//
//   register  → on explorer construction; the identity lives as long as it.
//   arm       → at the start of every call; parks a one-shot sender.
//   deliver   → from the callback; takes the parked sender and answers once.
//   release   → on explorer drop.
//
// Deliveries that cannot be matched (identity already released, nobody
// waiting, second answer for the same call) are dropped with a warning.  They
// never block and never panic.

use std::{
    collections::{hash_map::Entry, HashMap},
    fmt,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc, LazyLock,
    },
};

use crossbeam::channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;

use crate::error::Result;

/// Raw answer of one callback: the selected file URLs, or the reason the
/// native layer could not produce any.
pub(crate) type Reply = Result<Vec<String>>;

// ── Identity ──────────────────────────────────────────────────────────────────

/// Process-unique identity of an [`Explorer`](crate::Explorer).
///
/// Never `0`, and never handed to two live explorers at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(u32);

impl Identity {
    /// The raw value embedded in native calls.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

/// Per-explorer waiting slot.  Holds a sender only while a call is pending.
#[derive(Default)]
struct Slot {
    waiter: Mutex<Option<Sender<Reply>>>,
}

pub(crate) struct Registry {
    next: AtomicU32,
    slots: Mutex<HashMap<Identity, Arc<Slot>>>,
}

static GLOBAL: LazyLock<Registry> = LazyLock::new(Registry::new);

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            next: AtomicU32::new(1),
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// The process-wide table used by every [`Explorer`](crate::Explorer).
    pub(crate) fn global() -> &'static Registry {
        &GLOBAL
    }

    /// Allocate the next identity and create its slot.
    ///
    /// Skips `0` and any value still held by a live explorer, so a wrapped
    /// counter can never alias an identity in use.
    pub(crate) fn register(&self) -> Identity {
        let mut slots = self.slots.lock();
        loop {
            let raw = self.next.fetch_add(1, Ordering::Relaxed);
            if raw == 0 {
                continue;
            }
            let id = Identity(raw);
            if let Entry::Vacant(entry) = slots.entry(id) {
                entry.insert(Arc::default());
                log::trace!("registered explorer {id}");
                return id;
            }
        }
    }

    /// Prepare `id` for exactly one answer and return the receiving end.
    ///
    /// Returns `None` if `id` is not registered.
    #[cfg_attr(not(target_os = "macos"), allow(dead_code))]
    pub(crate) fn arm(&self, id: Identity) -> Option<Receiver<Reply>> {
        let slot = self.slot(id)?;
        let (tx, rx) = bounded(1);
        if slot.waiter.lock().replace(tx).is_some() {
            // Callers are serialised per explorer, so this means the previous
            // call gave up without an answer.  Its receiver sees a disconnect.
            log::warn!("explorer {id}: re-armed while a request was still unanswered");
        }
        Some(rx)
    }

    /// Hand `reply` to the call pending on `id`.
    ///
    /// Returns `true` if a waiting call received it.  Unknown identities,
    /// identities with nothing pending, and duplicate answers are dropped.
    #[cfg_attr(not(target_os = "macos"), allow(dead_code))]
    pub(crate) fn deliver(&self, id: Identity, reply: Reply) -> bool {
        let Some(slot) = self.slot(id) else {
            log::warn!("dropping dialog answer for unknown explorer {id}");
            return false;
        };

        let Some(tx) = slot.waiter.lock().take() else {
            log::warn!("dropping dialog answer for explorer {id}: no request pending");
            return false;
        };

        // Fresh capacity-one channel with a single sender: never blocks.
        if tx.send(reply).is_err() {
            log::warn!("dropping dialog answer for explorer {id}: caller went away");
            return false;
        }
        true
    }

    /// Forget `id`.  Returns `false` if it was not registered.
    pub(crate) fn release(&self, id: Identity) -> bool {
        let removed = self.slots.lock().remove(&id).is_some();
        if removed {
            log::trace!("released explorer {id}");
        }
        removed
    }

    #[cfg(test)]
    pub(crate) fn is_registered(&self, id: Identity) -> bool {
        self.slots.lock().contains_key(&id)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.lock().len()
    }

    fn slot(&self, id: Identity) -> Option<Arc<Slot>> {
        self.slots.lock().get(&id).cloned()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
