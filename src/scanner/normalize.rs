//! Title normalization for ROM filenames and search queries.
//!
//! Filenames in ROM collections carry a lot of noise that is irrelevant when
//! matching a title typed by a user: file extensions, region and revision tags
//! such as `(USA)` or `[v1.1]`, and word separators like `_` or `.`.
//!
//! Both functions here are pure: the same input always produces the same
//! output, and neither touches the filesystem.
//!
//! # Example
//!
//! ```
//! use romsearch::scanner::normalize::{normalize_query, normalize_title};
//!
//! assert_eq!(normalize_title("Super_Mario_World (USA) [!].sfc"), "super mario world");
//! assert_eq!(normalize_query("  Super Mario World "), "super mario world");
//! ```

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Bracketed or parenthesized tags: `(USA)`, `[v1.1]`, `{Beta}`.
static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\([^)]*\)|\[[^\]]*\]|\{[^}]*\}").expect("tag pattern is valid")
});

/// Runs of separator characters and whitespace.
static SEPARATOR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[._\-\s]+").expect("separator pattern is valid"));

/// Longest suffix still treated as a file extension.
const MAX_EXTENSION_LEN: usize = 8;

/// Normalize a filename into a comparable title.
///
/// Strips the extension, removes bracketed tags, folds diacritics, collapses
/// separator runs into single spaces, then trims and lowercases.
/// Names without an extension go through the same pipeline.
#[must_use]
pub fn normalize_title(filename: &str) -> String {
    normalize_text(strip_extension(filename.trim()))
}

/// Normalize free text typed by a user.
///
/// Identical to [`normalize_title`] except that no extension is stripped, so
/// queries like `Zelda 2.5` keep their trailing component.
#[must_use]
pub fn normalize_query(query: &str) -> String {
    normalize_text(query)
}

fn normalize_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let without_tags = TAG_PATTERN.replace_all(text, " ");
    let folded = fold_diacritics(&without_tags);
    SEPARATOR_PATTERN
        .replace_all(&folded, " ")
        .trim()
        .to_lowercase()
}

/// Remove a trailing `.ext` when it looks like a real extension.
///
/// An extension is 1 to 8 ASCII alphanumerics after the last dot. Names such
/// as `Dr. Mario` or `Super Mario Bros. 3` keep their dot-separated tail.
fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
                && ext.chars().any(|c| c.is_ascii_alphabetic()) =>
        {
            stem
        }
        _ => name,
    }
}

/// Decompose to NFD and drop combining marks (`é` -> `e`).
fn fold_diacritics(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Lowercased extension of a filename, if any.
#[must_use]
pub fn extension_of(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}
