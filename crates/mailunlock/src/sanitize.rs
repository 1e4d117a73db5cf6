//! Helpers for turning untrusted names into safe on-disk names and for
//! keeping full paths out of tracing span attributes.

use std::path::Path;

/// Characters that never make it into a staged filename.
const UNSAFE_CHARS: [char; 10] = ['/', '*', ':', '<', '>', '|', '"', '’', '–', ' '];

/// Replaces every unsafe character in an attachment name with `_`.
///
/// Only the listed characters are touched; everything else, including
/// non-ASCII letters, is kept as sent.
///
/// - `My File: "draft" <v2>.pdf` → `My_File___draft___v2_.pdf`
/// - `../etc/passwd` → `.._etc_passwd`
pub fn sanitize_filename(raw: &str) -> String {
    raw.chars()
        .map(|c| if UNSAFE_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Returns only the filename component of a path (no directory).
///
/// Keeps the full path out of span fields.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}
