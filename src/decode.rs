// ── Selection decoding ────────────────────────────────────────────────────────
//
// Pure functions that turn a native dialog's raw answer into absolute paths.
// Two raw shapes exist:
//
//   • Windows: a UTF-16 buffer of NUL-separated tokens.  A single token is the
//     chosen path.  Two or more tokens mean a multi-selection: the first is the
//     shared directory and the rest are file names inside it.
//   • macOS: `file://` URL strings with a percent-encoded path.
//
// An empty answer is always `Error::UserDeclined`.  A malformed one is
// `Error::Decode` and discards anything already decoded for that call.

use std::path::PathBuf;

use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::{Error, Result};

// ── NUL-delimited UTF-16 ──────────────────────────────────────────────────────

/// Decode the `lpstrFile` buffer filled by `GetOpenFileNameW` /
/// `GetSaveFileNameW`.
///
/// Runs of NULs are separators; decoding stops at the first double NUL, so
/// stale bytes past the terminator of a reused buffer are never read.
#[cfg_attr(not(windows), allow(dead_code))]
pub(crate) fn decode_wide(buf: &[u16]) -> Result<Vec<PathBuf>> {
    let mut tokens: Vec<&[u16]> = Vec::new();
    for token in buf.split(|&c| c == 0) {
        if token.is_empty() {
            // Empty run: either the double-NUL terminator or trailing padding.
            break;
        }
        tokens.push(token);
    }

    match tokens.as_slice() {
        [] => Err(Error::UserDeclined),
        [single] => Ok(vec![PathBuf::from(wide_to_os(single))]),
        [dir, names @ ..] => {
            let dir = wide_to_os(dir);
            Ok(names
                .iter()
                .map(|name| join_windows(&dir, wide_to_os(name)))
                .collect())
        }
    }
}

/// Join a directory and a file name with a backslash.
///
/// The buffer always carries Windows paths, so the separator is fixed rather
/// than taken from the host `Path` rules.
fn join_windows(dir: &std::ffi::OsStr, name: std::ffi::OsString) -> PathBuf {
    let mut full = dir.to_os_string();
    let ends_with_sep = dir
        .to_string_lossy()
        .ends_with(|c: char| c == '\\' || c == '/');
    if !ends_with_sep {
        full.push("\\");
    }
    full.push(name);
    PathBuf::from(full)
}

#[cfg(windows)]
fn wide_to_os(units: &[u16]) -> std::ffi::OsString {
    use std::os::windows::ffi::OsStringExt;
    std::ffi::OsString::from_wide(units)
}

#[cfg(not(windows))]
fn wide_to_os(units: &[u16]) -> std::ffi::OsString {
    String::from_utf16_lossy(units).into()
}

// ── File URLs ─────────────────────────────────────────────────────────────────

/// Decode every URL of one panel answer.  No partial results: the first bad
/// entry fails the whole batch.
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
pub(crate) fn decode_urls<S: AsRef<str>>(urls: &[S]) -> Result<Vec<PathBuf>> {
    if urls.is_empty() {
        return Err(Error::UserDeclined);
    }
    urls.iter().map(|u| decode_url(u.as_ref())).collect()
}

/// Decode a single `file://` URL into a path.
///
/// An empty string is the panel's "cancelled" answer.  A value with no scheme
/// is treated as an already-bare, possibly percent-encoded path.
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
pub(crate) fn decode_url(raw: &str) -> Result<PathBuf> {
    if raw.is_empty() {
        return Err(Error::UserDeclined);
    }

    let encoded_path = match Url::parse(raw) {
        Ok(url) => {
            if url.scheme() != "file" {
                return Err(Error::decode(raw, format!("unexpected scheme {:?}", url.scheme())));
            }
            url.path().to_owned()
        }
        Err(url::ParseError::RelativeUrlWithoutBase) => raw.to_owned(),
        Err(e) => return Err(Error::decode(raw, e)),
    };

    let path = percent_decode_str(&encoded_path)
        .decode_utf8()
        .map_err(|e| Error::decode(raw, e))?;

    if path.is_empty() {
        return Err(Error::UserDeclined);
    }

    Ok(PathBuf::from(path.into_owned()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
