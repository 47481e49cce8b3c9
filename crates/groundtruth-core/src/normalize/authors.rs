use regex::Regex;
use std::sync::LazyLock;

use super::markup::collapse_whitespace;

static CONJUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+(?:and|&)\s+").expect("conjunction pattern is valid"));

static TRAILING_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s,]\d+$").expect("trailing marker pattern is valid"));

static SPACED_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\s)\d+").expect("spaced digits pattern is valid"));

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("digits pattern is valid"));

/// One or more initials such as `J.`, `A. B.` or `J.-P.`.
static INITIALS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\p{Lu}\.(?:\s*-?\s*\p{Lu}\.)*\s*$").expect("initials pattern is valid")
});

const STRIPPED_SYMBOLS: [char; 5] = ['&', '‡', '§', '†', '*'];

/// Canonicalize a single author string (possibly holding several names).
pub fn canonicalize_author_string(authors: &str) -> Vec<String> {
    canonicalize_authors(std::iter::once(authors))
}

/// Canonicalize a list of author entries into an ordered list of names.
///
/// Each entry is split on ` and `, ` & ` and on commas. A comma directly
/// followed by a digit is an affiliation marker and a comma followed by an
/// initials-only segment separates surname from initials; neither splits.
/// Affiliation digits, footnote symbols and a leading `by ` are removed, and
/// entries left empty or holding only punctuation are dropped. Duplicates are
/// kept.
pub fn canonicalize_authors<I, S>(authors: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut names = Vec::new();

    for entry in authors {
        for piece in CONJUNCTION.split(entry.as_ref()) {
            for candidate in split_on_commas(piece) {
                if let Some(name) = clean_name(candidate) {
                    names.push(name);
                }
            }
        }
    }

    names
}

fn split_on_commas(entry: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;

    for (idx, _) in entry.match_indices(',') {
        if comma_is_protected(&entry[idx + 1..]) {
            continue;
        }
        parts.push(&entry[start..idx]);
        start = idx + 1;
    }
    parts.push(&entry[start..]);

    parts
}

fn comma_is_protected(rest: &str) -> bool {
    if rest.starts_with(|c: char| c.is_ascii_digit()) {
        return true;
    }
    let segment = rest.split(',').next().unwrap_or_default();
    INITIALS.is_match(segment)
}

fn clean_name(candidate: &str) -> Option<String> {
    let name = candidate.replace(STRIPPED_SYMBOLS, "");
    let name = TRAILING_MARKER.replace(&name, "");
    let name = SPACED_DIGITS.replace_all(&name, "$1");
    let name = DIGITS.replace_all(&name, "");
    let name = name.trim_matches(|c: char| c == ',' || c.is_whitespace());
    let name = name.strip_prefix("by ").unwrap_or(name);
    let name = collapse_whitespace(name.trim_matches(|c: char| c == ',' || c.is_whitespace()));

    if name.chars().any(char::is_alphanumeric) {
        Some(name)
    } else {
        None
    }
}
