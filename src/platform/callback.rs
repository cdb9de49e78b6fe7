// ── Callback rendezvous ───────────────────────────────────────────────────────
//
// Shared plumbing for backends whose native layer answers asynchronously:
//
//   1. arm the explorer's registry slot,
//   2. hand the native work to the host's run handler (UI thread),
//   3. block the calling thread until the native completion callback delivers
//      through the registry,
//   4. decode the delivered URLs.
//
// There is no timeout.  The call returns when the dialog closes.

#![cfg_attr(not(target_os = "macos"), allow(dead_code))]

use std::path::PathBuf;

use crate::{
    decode,
    error::{Error, Result},
    registry::{Identity, Registry},
};

use super::RunHandler;

pub(crate) struct CallbackBridge {
    identity: Identity,
    run: RunHandler,
    registry: &'static Registry,
}

impl CallbackBridge {
    pub(crate) fn new(identity: Identity, run: RunHandler, registry: &'static Registry) -> Self {
        Self {
            identity,
            run,
            registry,
        }
    }

    pub(crate) fn identity(&self) -> Identity {
        self.identity
    }

    /// Run `present` on the UI thread and wait for its answer.
    ///
    /// `present` receives the identity and registry to answer through; it (or
    /// a completion handler it installs) must call `Registry::deliver` once.
    pub(crate) fn request<F>(&self, present: F) -> Result<Vec<PathBuf>>
    where
        F: FnOnce(Identity, &'static Registry) + Send + 'static,
    {
        let id = self.identity;
        let reply = self.registry.arm(id).ok_or(Error::Native {
            function: "Registry::arm",
            code: 0,
        })?;

        let registry = self.registry;
        self.run.run(Box::new(move || present(id, registry)));

        let urls = reply.recv().map_err(|_| Error::Native {
            function: "completion handler",
            code: 0,
        })??;

        log::trace!("explorer {id}: callback delivered {} url(s)", urls.len());
        decode::decode_urls(&urls)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
