use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

/// `YYYY-MM-DD`, optionally followed by a time of day and a zone offset.
static ISO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4})-(\d{2})-(\d{2})(?:[T ]\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:Z|[+-]\d{2}:?\d{2})?)?$",
    )
    .expect("iso date pattern is valid")
});

static DAY_MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})\s+([A-Za-z]+)\.?\s+(\d{4})$").expect("dmy pattern is valid")
});

static MONTH_DAY_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]+)\.?\s+(\d{1,2}),\s*(\d{4})$").expect("mdy pattern is valid")
});

static LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i:posted|published)(?:\s+on)?\s*:?\s*").expect("label pattern is valid")
});

/// A labelled date embedded in a longer text block.
static EMBEDDED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:Posted|Published)(?:\s+on)?:?\s+(?:[A-Za-z]+\.?\s+\d{1,2},\s*\d{4}|\d{1,2}\s+[A-Za-z]+\.?\s+\d{4})")
        .expect("embedded date pattern is valid")
});

/// Canonicalize a date string to `DD-MM-YYYY`.
///
/// Accepted shapes:
/// - `2023-05-01`, `2023-05-01T17:59:59Z`, `2023-05-01 17:59:59+00:00`
/// - `1 May 2023`, `01 Sep 2023`, `Published: 1 May 2023`
/// - `Posted May 1, 2023.`, `Published May 01, 2023`
///
/// Anything else (including all-numeric forms like `01/02/2023`, whose
/// day/month order is ambiguous) returns `None`.
pub fn canonicalize_date(raw: &str) -> Option<String> {
    parse_date(raw).map(|date| date.format("%d-%m-%Y").to_string())
}

/// Locate a `Posted ...`/`Published ...` date inside free text and canonicalize it.
pub fn find_date(text: &str) -> Option<String> {
    EMBEDDED
        .find(text)
        .and_then(|m| canonicalize_date(m.as_str()))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim().trim_end_matches('.').trim();

    if let Some(caps) = ISO.captures(trimmed) {
        return ymd(&caps[1], &caps[2], &caps[3]);
    }

    let unlabelled = LABEL.replace(trimmed, "");
    let unlabelled = unlabelled.trim();

    if let Some(caps) = DAY_MONTH_YEAR.captures(unlabelled) {
        let month = month_number(&caps[2])?;
        return from_parts(&caps[3], month, &caps[1]);
    }

    if let Some(caps) = MONTH_DAY_YEAR.captures(unlabelled) {
        let month = month_number(&caps[1])?;
        return from_parts(&caps[3], month, &caps[2]);
    }

    None
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    let month: u32 = month.parse().ok()?;
    from_parts(year, month, day)
}

fn from_parts(year: &str, month: u32, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month, day.parse().ok()?)
}

fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    let month = match lower.as_str() {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sep" | "sept" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}
