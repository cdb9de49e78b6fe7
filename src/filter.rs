// ── Extension filters ─────────────────────────────────────────────────────────
//
// Turns the caller's extension list into whatever each native dialog expects.
// An empty list (or one holding only blanks) always means "accept every file"
// and is returned as `None`, never as an empty buffer.
//
// No `unsafe` here; the adapters own the pointers.

use std::path::Path;

/// Strip the wildcard and dot a caller may have written in front of an
/// extension: `"*.jpg"`, `".jpg"` and `"jpg"` all become `"jpg"`.
pub(crate) fn normalize_extension(ext: &str) -> &str {
    ext.trim().trim_start_matches('*').trim_start_matches('.')
}

fn normalized<'a, S: AsRef<str>>(extensions: &'a [S]) -> impl Iterator<Item = &'a str> + 'a {
    extensions
        .iter()
        .map(|e| normalize_extension(e.as_ref()))
        .filter(|e| !e.is_empty())
}

// ── Windows ───────────────────────────────────────────────────────────────────

/// Build the `lpstrFilter` string-pair for the Windows common dialogs.
///
/// The visible label and the match pattern are the same upper-cased text, so
/// `["jpg", "png"]` encodes as:
///
/// ```text
/// *.JPG;*.PNG \0 *.JPG;*.PNG \0 \0
/// ```
///
/// Exactly one NUL separates label and pattern and two NULs end the block.
#[cfg_attr(not(windows), allow(dead_code))]
pub(crate) fn wide_filter<S: AsRef<str>>(extensions: &[S]) -> Option<Vec<u16>> {
    let pattern = normalized(extensions)
        .map(|e| format!("*.{}", e.to_uppercase()))
        .collect::<Vec<_>>()
        .join(";");

    if pattern.is_empty() {
        return None;
    }

    let mut blob: Vec<u16> = Vec::with_capacity(pattern.len() * 2 + 3);
    blob.extend(pattern.encode_utf16()); // label
    blob.push(0);
    blob.extend(pattern.encode_utf16()); // pattern
    blob.extend([0, 0]);
    Some(blob)
}

/// Filter and default extension for a save dialog pre-filled with `name`.
///
/// Both come from the name's extension: `"default-name.txt"` filters on
/// `*.TXT` and defaults to `txt\0`.  A name without an extension gives
/// `(None, None)`, so the dialog shows every file and appends nothing.
#[cfg_attr(not(windows), allow(dead_code))]
pub(crate) fn save_filter(name: &str) -> (Option<Vec<u16>>, Option<Vec<u16>>) {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(normalize_extension)
        .filter(|e| !e.is_empty());

    match ext {
        Some(ext) => (
            wide_filter(&[ext]),
            Some(ext.encode_utf16().chain(std::iter::once(0)).collect()),
        ),
        None => (None, None),
    }
}

// ── macOS ─────────────────────────────────────────────────────────────────────

/// Build the comma-joined list of bare extensions handed to the AppKit panel
/// (`"jpg,png"`).  Case is preserved; AppKit matches case-insensitively.
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
pub(crate) fn joined_filter<S: AsRef<str>>(extensions: &[S]) -> Option<String> {
    let joined = normalized(extensions).collect::<Vec<_>>().join(",");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn wide(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    #[test]
    fn normalize_strips_wildcard_and_dot() {
        assert_eq!(normalize_extension("jpg"), "jpg");
        assert_eq!(normalize_extension(".jpg"), "jpg");
        assert_eq!(normalize_extension("*.jpg"), "jpg");
        assert_eq!(normalize_extension("  .tar.gz "), "tar.gz");
        assert_eq!(normalize_extension("."), "");
    }

    // ── wide_filter ──────────────────────────────────────────────────────────

    #[test]
    fn empty_list_accepts_everything() {
        let none: [&str; 0] = [];
        assert_eq!(wide_filter(&none), None);
        assert_eq!(wide_filter(&["", " . "]), None);
    }

    #[test]
    fn two_extensions_exact_layout() {
        let blob = wide_filter(&["jpg", "png"]).expect("filter");
        assert_eq!(blob, wide("*.JPG;*.PNG\0*.JPG;*.PNG\0\0"));

        // Label and pattern halves are byte-identical around a single NUL.
        let label_len = "*.JPG;*.PNG".len();
        assert_eq!(blob[label_len], 0);
        assert_eq!(blob[..label_len], blob[label_len + 1..2 * label_len + 1]);
        assert_eq!(&blob[blob.len() - 2..], &[0, 0]);
        assert_ne!(blob[blob.len() - 3], 0);
    }

    #[test]
    fn leading_dots_are_not_doubled() {
        let blob = wide_filter(&[".txt", "*.md"]).expect("filter");
        assert_eq!(blob, wide("*.TXT;*.MD\0*.TXT;*.MD\0\0"));
    }

    #[test]
    fn single_extension() {
        let blob = wide_filter(&["rs"]).expect("filter");
        assert_eq!(blob, wide("*.RS\0*.RS\0\0"));
    }

    #[test]
    fn wide_filter_is_deterministic() {
        let exts = vec!["png".to_owned(), "jpeg".to_owned(), ".jpg".to_owned()];
        assert_eq!(wide_filter(&exts), wide_filter(&exts));
    }

    // ── save_filter ──────────────────────────────────────────────────────────

    #[test]
    fn save_filter_follows_suggested_extension() {
        let (filter, default_ext) = save_filter("default-name.txt");
        assert_eq!(filter, Some(wide("*.TXT\0*.TXT\0\0")));
        assert_eq!(default_ext, Some(wide("txt\0")));
    }

    #[test]
    fn save_filter_uses_last_extension_only() {
        let (filter, default_ext) = save_filter("backup.tar.gz");
        assert_eq!(filter, Some(wide("*.GZ\0*.GZ\0\0")));
        assert_eq!(default_ext, Some(wide("gz\0")));
    }

    #[test]
    fn save_filter_without_extension_is_unfiltered() {
        assert_eq!(save_filter("README"), (None, None));
        assert_eq!(save_filter(".profile"), (None, None));
        assert_eq!(save_filter("trailing."), (None, None));
        assert_eq!(save_filter(""), (None, None));
    }

    // ── joined_filter ────────────────────────────────────────────────────────

    #[test]
    fn joined_filter_bare_extensions() {
        assert_eq!(
            joined_filter(&[".png", "jpeg", "*.jpg"]).as_deref(),
            Some("png,jpeg,jpg")
        );
    }

    #[test]
    fn joined_filter_empty_is_none() {
        let none: [String; 0] = [];
        assert_eq!(joined_filter(&none), None);
        assert_eq!(joined_filter(&["."]), None);
    }
}
