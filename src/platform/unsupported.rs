// ── Unsupported platforms ─────────────────────────────────────────────────────
//
// No native dialog binding exists here.  Every call fails immediately with
// `Error::Unsupported`; nothing is dispatched and nothing waits.

use std::path::PathBuf;

use crate::error::{Error, Result};

use super::{BackendContext, DialogBackend};

pub(crate) struct Unsupported;

impl Unsupported {
    pub(crate) fn new(ctx: BackendContext) -> Self {
        log::debug!(
            "explorer {}: no native file dialogs on this platform",
            ctx.identity
        );
        Self
    }
}

impl DialogBackend for Unsupported {
    fn choose_one(&mut self, _extensions: &[String]) -> Result<PathBuf> {
        Err(Error::Unsupported)
    }

    fn choose_many(&mut self, _extensions: &[String]) -> Result<Vec<PathBuf>> {
        Err(Error::Unsupported)
    }

    fn create_and_choose(&mut self, _suggested_name: &str) -> Result<PathBuf> {
        Err(Error::Unsupported)
    }
}
