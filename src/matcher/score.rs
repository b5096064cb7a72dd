//! Similarity scoring between a normalized query and a normalized title.
//!
//! The score is a partial ratio: the shorter string is compared against every
//! equally long window of the longer one with normalized Levenshtein
//! similarity, and the best window wins. A query that appears verbatim inside
//! a longer title therefore scores 100.
//!
//! Scoring is preceded by a cheap word-coverage check that rejects titles
//! sharing too few query words, so long titles cannot reach the threshold
//! through incidental character overlap.

use strsim::normalized_levenshtein;

/// Fraction of query words that must appear in a title.
pub const DEFAULT_WORD_COVERAGE: f64 = 0.6;

/// Queries shorter than this skip the word-coverage check.
const MIN_QUERY_LEN_FOR_COVERAGE: usize = 3;

/// Words shorter than this are ignored by the coverage check.
const MIN_WORD_LEN: usize = 2;

/// Similarity of two normalized strings on a 0-100 scale.
///
/// Returns 0 when either side is empty.
///
/// # Example
///
/// ```
/// use romsearch::matcher::score::similarity;
///
/// assert_eq!(similarity("mario world", "super mario world"), 100.0);
/// assert!(similarity("zelda", "metroid") < 50.0);
/// ```
#[must_use]
pub fn similarity(query: &str, title: &str) -> f64 {
    if query.is_empty() || title.is_empty() {
        return 0.0;
    }

    let query_chars: Vec<char> = query.chars().collect();
    let title_chars: Vec<char> = title.chars().collect();
    let (short, long) = if query_chars.len() <= title_chars.len() {
        (query, &title_chars)
    } else {
        (title, &query_chars)
    };

    let short_len = short.chars().count();
    if short_len == long.len() {
        return normalized_levenshtein(query, title) * 100.0;
    }

    let mut best = 0.0_f64;
    let mut window = String::with_capacity(short.len());
    for start in 0..=(long.len() - short_len) {
        window.clear();
        window.extend(&long[start..start + short_len]);
        let ratio = normalized_levenshtein(short, &window);
        if ratio > best {
            best = ratio;
            if best >= 1.0 {
                break;
            }
        }
    }

    best * 100.0
}

/// Whether `title` contains enough of the query's words.
///
/// At least `max(1, floor(coverage * n))` of the `n` query words with two or
/// more characters must occur as substrings of the title. Queries shorter than
/// three characters, or without qualifying words, always pass.
#[must_use]
pub fn covers_query_words(query: &str, title: &str, coverage: f64) -> bool {
    if query.chars().count() < MIN_QUERY_LEN_FOR_COVERAGE {
        return true;
    }

    let words: Vec<&str> = query
        .split_whitespace()
        .filter(|w| w.chars().count() >= MIN_WORD_LEN)
        .collect();
    if words.is_empty() {
        return true;
    }

    let found = words.iter().filter(|w| title.contains(*w)).count();
    let required = ((words.len() as f64 * coverage).floor() as usize).max(1);
    found >= required
}
