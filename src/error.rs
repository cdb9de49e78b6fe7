// ── Central error type ────────────────────────────────────────────────────────
//
// Every fallible operation in osdialog returns `error::Result<T>`.  Nothing is
// retried: an error surfaces from the blocking call that produced it, and a
// second attempt is the caller's decision.

/// Every error that osdialog can produce.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The user dismissed the dialog without choosing anything.
    ///
    /// This is the normal "no selection" outcome, not a failure.
    #[error("user exited the file selector without selecting a file")]
    UserDeclined,

    /// There is no native dialog adapter for the current platform.
    #[error("file dialogs are not supported on this platform")]
    Unsupported,

    /// The native layer handed back a result that could not be turned into a
    /// filesystem path.
    #[error("malformed dialog result {input:?}: {reason}")]
    Decode {
        /// The raw value as received, for display purposes.
        input: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A native call failed for a reason other than the user cancelling.
    #[error("{function} failed (error {code:#010x})")]
    Native {
        /// The name of the failing function, for display purposes.
        function: &'static str,
        /// The raw platform error code, `0` when the platform gives none.
        code: u32,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A configuration file is not valid JSON for [`Config`](crate::Config).
    #[error("invalid configuration file: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error (config read, opening a chosen file, …).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// `true` for [`Error::UserDeclined`], the expected "no selection" result.
    pub fn is_user_declined(&self) -> bool {
        matches!(self, Self::UserDeclined)
    }

    pub(crate) fn decode(input: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Decode {
            input: input.into(),
            reason: reason.to_string(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

// ── Tests ─────────────────────────────────────────────────────────────────────
