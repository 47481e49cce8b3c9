use groundtruth_core::model::{ExtractedRecord, ExtractionField};
use groundtruth_core::BatchSummary;

const PREVIEW_CHARS: usize = 200;

pub fn print_record(record: &ExtractedRecord, show_trace: bool) {
    let f = &record.fields;

    println!("=== {} ===\n", record.page_path.display());
    println!("  Source:       {}", record.source);
    println!("  Companion:    {}", record.companion_path.display());
    if !f.valid_content {
        println!("  Content:      INVALID (page holds no usable article)");
    }
    println!();

    let rows: [(ExtractionField, String); 10] = [
        (ExtractionField::Title, opt(&f.title)),
        (ExtractionField::Authors, list(&f.authors)),
        (ExtractionField::CreationDate, opt(&f.creation_date)),
        (ExtractionField::Keywords, list(&f.keywords)),
        (ExtractionField::Doi, opt(&f.doi)),
        (ExtractionField::Producer, opt(&f.producer)),
        (ExtractionField::Format, opt(&f.format)),
        (ExtractionField::FirstPage, opt(&f.first_page)),
        (ExtractionField::Abstract, preview(&f.abstract_text)),
        (ExtractionField::DocumentText, preview(&f.document_text)),
    ];

    let width = rows.iter().map(|(field, _)| field.as_str().len()).max().unwrap_or(10);
    for (field, value) in &rows {
        let origin = match (show_trace, record.trace.outcome(*field)) {
            (true, Some(outcome)) => format!("  [{outcome}]"),
            _ => String::new(),
        };
        println!("  {:<width$}  {}{}", field.as_str(), value, origin, width = width);
    }

    if !f.unsupported_packages.is_empty() {
        println!("\n  Unsupported packages: {}", f.unsupported_packages.join(", "));
    }

    if show_trace {
        let failures: Vec<_> = record.trace.failures().collect();
        if !failures.is_empty() {
            println!("\n  Failed fields:");
            for failure in failures {
                println!(
                    "    {}: {}",
                    failure.field,
                    failure.message.as_deref().unwrap_or("unknown error")
                );
            }
        }
        let stages: Vec<String> = record.trace.stages.iter().map(|s| s.to_string()).collect();
        println!("\n  Stages: {}", stages.join(" -> "));
    }
}

pub fn print_batch_summary(summary: &BatchSummary) {
    println!(
        "Wrote {} {} record(s) to {}",
        summary.written,
        summary.source,
        summary.output_path.display()
    );
    if !summary.skipped.is_empty() {
        eprintln!("  {} page(s) skipped:", summary.skipped.len());
        for skipped in &summary.skipped {
            eprintln!("    {}: {}", skipped.path.display(), skipped.reason);
        }
    }
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".into())
}

fn list(values: &Option<Vec<String>>) -> String {
    match values {
        Some(values) if !values.is_empty() => values.join("; "),
        Some(_) => "(none)".into(),
        None => "-".into(),
    }
}

fn preview(value: &Option<String>) -> String {
    match value {
        Some(text) if text.chars().count() > PREVIEW_CHARS => {
            let head: String = text.chars().take(PREVIEW_CHARS).collect();
            format!("{head}... ({} chars)", text.chars().count())
        }
        Some(text) => text.clone(),
        None => "-".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates_long_text() {
        let long = Some("x".repeat(PREVIEW_CHARS + 5));
        let out = preview(&long);
        assert!(out.ends_with(&format!("... ({} chars)", PREVIEW_CHARS + 5)));
        assert_eq!(preview(&Some("short".into())), "short");
        assert_eq!(preview(&None), "-");
    }

    #[test]
    fn test_list_formatting() {
        assert_eq!(list(&Some(vec!["A".into(), "B".into()])), "A; B");
        assert_eq!(list(&Some(vec![])), "(none)");
        assert_eq!(list(&None), "-");
    }
}
