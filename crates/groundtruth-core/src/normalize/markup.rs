use regex::Regex;
use scraper::Html;
use std::borrow::Cow;
use std::sync::LazyLock;

static TAG_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));

/// Clean a free-text value scraped from a page or read from a sidecar.
///
/// Markup is only parsed when the input contains something that looks like a
/// tag; plain strings take the cheap path. Both paths turn line and tab breaks
/// into single spaces and trim the result. Returns `None` when nothing is left.
pub fn clean_text(raw: &str) -> Option<String> {
    let text: Cow<'_, str> = if TAG_LIKE.is_match(raw) {
        Cow::Owned(strip_markup(raw))
    } else {
        Cow::Borrowed(raw)
    };

    let cleaned = collapse_whitespace(&text);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Drop tags and decode entities by parsing the input as an HTML fragment.
fn strip_markup(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    fragment.root_element().text().collect()
}

/// Collapse every run of whitespace (including `\n`, `\t`, `\r`) to one space.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
