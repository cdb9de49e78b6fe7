// ── Dialog configuration ──────────────────────────────────────────────────────
//
// Optional JSON file, normally `%APPDATA%\osdialog\config.json` on Windows or
// `$XDG_CONFIG_HOME/osdialog/config.json` elsewhere.  Read-only: osdialog never
// writes it.  No `unsafe` here: plain serde_json.

use std::{fs, io, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ── Limits ────────────────────────────────────────────────────────────────────

/// Default size of the raw selection buffer in UTF-16 units.  Large enough
/// for a multi-selection of a few hundred long names.
pub const DEFAULT_PATH_BUFFER_LEN: usize = 65_535;

/// Smallest accepted buffer: one classic `MAX_PATH`.
pub const MIN_PATH_BUFFER_LEN: usize = 260;

// ── Config ────────────────────────────────────────────────────────────────────

/// Options shared by every dialog an [`Explorer`](crate::Explorer) opens.
///
/// Every field is optional in the JSON form; missing fields take the
/// [`Default`] value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Capacity of the buffer the OS writes the selection into, in UTF-16
    /// units.  Windows only.
    pub path_buffer_len: usize,
    /// Show hidden and system files in open dialogs.
    pub show_hidden: bool,
    /// Resolve shortcuts to their targets instead of returning the link file.
    pub follow_links: bool,
    /// Ask before the save dialog returns an existing file.
    pub overwrite_prompt: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path_buffer_len: DEFAULT_PATH_BUFFER_LEN,
            show_hidden: true,
            follow_links: false,
            overwrite_prompt: true,
        }
    }
}

impl Config {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate the file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.path_buffer_len < MIN_PATH_BUFFER_LEN
            || u32::try_from(self.path_buffer_len).is_err()
        {
            return Err(Error::Config(format!(
                "path_buffer_len must be between {MIN_PATH_BUFFER_LEN} and {}, got {}",
                u32::MAX,
                self.path_buffer_len
            )));
        }
        Ok(())
    }

    /// Where [`Config::discover`] looks for the configuration file.
    ///
    /// Returns `None` if none of `APPDATA`, `XDG_CONFIG_HOME` or `HOME` is set.
    pub fn default_path() -> Option<PathBuf> {
        let base = std::env::var_os("APPDATA")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from))
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("osdialog").join("config.json"))
    }

    /// Load the configuration from [`Config::default_path`].
    ///
    /// Never fails: a missing file gives the defaults silently, an unreadable
    /// or invalid one gives the defaults with a warning.
    pub fn discover() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        match Self::load(&path) {
            Ok(config) => {
                log::debug!("loaded dialog configuration from {}", path.display());
                config
            }
            Err(Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                log::warn!("ignoring {}: {e}", path.display());
                Self::default()
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
