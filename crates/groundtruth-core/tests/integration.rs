//! Integration tests for the extraction pipeline end to end.
//!
//! Uses a MockRenderer that serves inline HTML fixtures by file name, so page
//! files on disk only need to exist as placeholders.

use groundtruth_core::error::GroundtruthError;
use groundtruth_core::model::{ExtractionField, Shape};
use groundtruth_core::rebase::{rebase_batches, replace_with_rebased, ReplaceOutcome};
use groundtruth_core::render::{PageRenderer, RenderedPage};
use groundtruth_core::trace::{FieldOutcome, RecordStage};
use groundtruth_core::{ExtractConfig, Orchestrator, VariantRegistry};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

struct MockRenderer {
    pages: HashMap<String, String>,
}

impl MockRenderer {
    fn new(fixtures: &[(&str, &str)]) -> Self {
        Self {
            pages: fixtures
                .iter()
                .map(|(name, html)| (name.to_string(), html.to_string()))
                .collect(),
        }
    }
}

impl PageRenderer for MockRenderer {
    fn render(&self, path: &Path) -> Result<RenderedPage, GroundtruthError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        match self.pages.get(name) {
            Some(html) => Ok(RenderedPage::from_html(path, html)),
            None => Err(GroundtruthError::Render(format!("no fixture for {name}"))),
        }
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

fn orchestrator(config: ExtractConfig, fixtures: &[(&str, &str)]) -> Orchestrator {
    Orchestrator::new(
        config,
        VariantRegistry::builtin(),
        Box::new(MockRenderer::new(fixtures)),
    )
}

/// Create `<root>/<source>/html/<name>` placeholders and return their paths.
fn placeholders(root: &Path, source: &str, names: &[&str]) -> Vec<PathBuf> {
    let dir = root.join(source).join("html");
    std::fs::create_dir_all(&dir).unwrap();
    names
        .iter()
        .map(|name| {
            let path = dir.join(name);
            std::fs::write(&path, "").unwrap();
            path
        })
        .collect()
}

fn write_file(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

const ARXIV_PAGE: &str = r#"<html><body>
    <div id="watermark-tr">arXiv:2401.00001v1 [cs.LG] 12 Jan 2024</div>
    <span class="ltx_personname">Alice Smith<br>Bob Jones</span>
    <div class="ltx_abstract"><p class="ltx_p">Abstract text.</p></div>
    <section class="ltx_section"><p>Body.</p></section>
</body></html>"#;

const ARXIV_UNAVAILABLE: &str = r#"<html><body>
    <h1>No HTML for '2401.99999'</h1>
    <p>HTML is not available for the source.</p>
</body></html>"#;

fn nature_section(n: usize, heading: &str, body: &str) -> String {
    format!(
        r#"<div class="c-article-section" id="Sec{n}-section"><h2 id="Sec{n}">{heading}</h2>
           <div id="Sec{n}-content"><p>{body}</p></div></div>"#
    )
}

fn nature_page() -> String {
    format!(
        r#"<html><body>
        <h1 class="c-article-title">Deep Sea Vents</h1>
        <ul class="c-article-author-list"><li><a data-test="author-name">Ida Berg</a></li></ul>
        {}{}{}{}
        </body></html>"#,
        nature_section(1, "Intro", "Intro text."),
        nature_section(2, "Results", "Results text."),
        nature_section(3, "References", "1. Someone et al."),
        nature_section(4, "Acknowledgements", "We thank the crew."),
    )
}

// ---------------------------------------------------------------------------
// Sidecar values win over the page
// ---------------------------------------------------------------------------
#[test]
fn sidecar_fields_take_precedence() {
    let dir = tempfile::tempdir().unwrap();
    let pages = placeholders(dir.path(), "arxiv", &["2401.00001v1.html"]);
    write_file(
        &dir.path().join("arxiv").join("csv").join("2401.00001v1.csv"),
        "title|date_published|doi\nFoo|2023-05-01|10.1/x\n",
    );

    let orch = orchestrator(ExtractConfig::default(), &[("2401.00001v1.html", ARXIV_PAGE)]);
    let record = orch.extract_page("arxiv", &pages[0]).unwrap();

    assert_eq!(record.fields.title.as_deref(), Some("Foo"));
    assert_eq!(record.fields.creation_date.as_deref(), Some("01-05-2023"));
    assert_eq!(record.fields.doi.as_deref(), Some("10.1/x"));
    // Not in the sidecar: taken from the page.
    assert_eq!(
        record.fields.authors,
        Some(vec!["Alice Smith".to_string(), "Bob Jones".to_string()])
    );
    assert_eq!(record.trace.outcome(ExtractionField::Title), Some(FieldOutcome::Sidecar));
    assert_eq!(record.trace.outcome(ExtractionField::Authors), Some(FieldOutcome::Dom));
    assert_eq!(record.sidecar.get("title"), Some("Foo"));
}

#[test]
fn arxiv_page_without_html_is_invalid_content() {
    let dir = tempfile::tempdir().unwrap();
    let pages = placeholders(dir.path(), "arxiv", &["2401.99999.html"]);
    let orch = orchestrator(ExtractConfig::default(), &[("2401.99999.html", ARXIV_UNAVAILABLE)]);

    let record = orch.extract_page("arxiv", &pages[0]).unwrap();
    assert!(!record.fields.valid_content);
    assert_eq!(record.fields.title, None);

    let value = record.to_value(Shape::Full).unwrap();
    assert_eq!(value["extrametadata"]["valid_content"], false);
}

#[test]
fn nature_body_excludes_back_matter() {
    let dir = tempfile::tempdir().unwrap();
    let pages = placeholders(dir.path(), "nature", &["s41586.html"]);
    let html = nature_page();
    let orch = orchestrator(ExtractConfig::default(), &[("s41586.html", html.as_str())]);

    let record = orch.extract_page("nature", &pages[0]).unwrap();
    assert_eq!(
        record.fields.document_text.as_deref(),
        Some("Intro text. Results text.")
    );
    assert!(record.fields.valid_content);
}

const MDPI_PAGE: &str = r#"<html><body>
    <h1 class="title hypothesis_container">Page Title</h1>
    <div class="art-authors hypothesis_container"><div class="profile-card-drop">Page Author</div></div>
    <div class="bib-identity"><a href="https://doi.org/10.3390/page">doi</a></div>
    <div class="pubhistory"><span>Published: 15 March 2023</span></div>
    <section class="html-abstract"><div class="html-p">Page abstract.</div></section>
    <div id="html-keywords"><a>soil</a><a>climate</a></div>
</body></html>"#;

#[test]
fn transposed_sidecar_fields_take_precedence() {
    let dir = tempfile::tempdir().unwrap();
    let pages = placeholders(dir.path(), "mdpi", &["soil-07-00002.html"]);
    write_file(
        &dir.path().join("mdpi").join("csv").join("soil-07-00002.csv"),
        "|0\ntitle|Sidecar Title\nauthors|Ann Lee; Bo Chen\ndate|2022-11-30\ndoi|10.3390/side\nabstract|Sidecar abstract.\n",
    );

    let orch = orchestrator(ExtractConfig::default(), &[("soil-07-00002.html", MDPI_PAGE)]);
    let record = orch.extract_page("mdpi", &pages[0]).unwrap();

    assert_eq!(record.fields.title.as_deref(), Some("Sidecar Title"));
    assert_eq!(
        record.fields.authors,
        Some(vec!["Ann Lee".to_string(), "Bo Chen".to_string()])
    );
    assert_eq!(record.fields.creation_date.as_deref(), Some("30-11-2022"));
    assert_eq!(record.fields.doi.as_deref(), Some("10.3390/side"));
    assert_eq!(record.fields.abstract_text.as_deref(), Some("Sidecar abstract."));
    // No keywords in the sidecar: taken from the page.
    assert_eq!(
        record.fields.keywords,
        Some(vec!["soil".to_string(), "climate".to_string()])
    );
    assert_eq!(record.trace.outcome(ExtractionField::Doi), Some(FieldOutcome::Sidecar));
    assert_eq!(record.trace.outcome(ExtractionField::Keywords), Some(FieldOutcome::Dom));
    assert_eq!(record.sidecar.get("0"), None);
}

#[test]
fn medrxiv_doi_inferred_from_file_name() {
    let dir = tempfile::tempdir().unwrap();
    let pages = placeholders(dir.path(), "medrxiv", &["10_1101_2020_01_01.html"]);
    let orch = orchestrator(
        ExtractConfig::default(),
        &[("10_1101_2020_01_01.html", "<html><body><h1 id='page-title'>T</h1></body></html>")],
    );

    let record = orch.extract_page("medrxiv", &pages[0]).unwrap();
    assert_eq!(record.fields.doi.as_deref(), Some("10.1101/2020.01.01"));
    assert_eq!(record.trace.outcome(ExtractionField::Doi), Some(FieldOutcome::Inferred));
}

#[test]
fn reextraction_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let pages = placeholders(dir.path(), "arxiv", &["a.html"]);
    write_file(
        &dir.path().join("arxiv").join("csv").join("a.csv"),
        "title|summary\nFoo|Sidecar abstract\n",
    );
    let orch = orchestrator(ExtractConfig::default(), &[("a.html", ARXIV_PAGE)]);

    let first = orch.extract_page("arxiv", &pages[0]).unwrap();
    let second = orch.extract_page("arxiv", &pages[0]).unwrap();
    for shape in [Shape::Full, Shape::Parser] {
        assert_eq!(first.to_json(shape).unwrap(), second.to_json(shape).unwrap());
    }
}

#[test]
fn authors_never_contain_empty_entries() {
    let messy = r#"<html><body>
        <span class="ltx_personname">†<br> , <br>Jane Doe1,2</span>
        <div class="art-authors hypothesis_container"><div class="profile-card-drop">*</div><div class="profile-card-drop">by Sam Roe ‡</div></div>
        <span class="highwire-citation-author"> 3 </span><span class="highwire-citation-author">Lee Wu &amp; Kim Oh</span>
        <ul class="c-article-author-list"><li><a data-test="author-name">§</a></li><li><a data-test="author-name">Ana Paz</a></li></ul>
    </body></html>"#;

    let dir = tempfile::tempdir().unwrap();
    let registry = VariantRegistry::builtin();
    for tag in registry.tags() {
        let pages = placeholders(dir.path(), tag, &["messy.html"]);
        let orch = orchestrator(ExtractConfig::default(), &[("messy.html", messy)]);
        let record = orch.extract_page(tag, &pages[0]).unwrap();

        let authors = record.fields.authors.unwrap_or_default();
        assert!(!authors.is_empty(), "{tag}: no authors");
        for name in &authors {
            assert!(
                name.chars().any(char::is_alphanumeric),
                "{tag}: bad author {name:?}"
            );
        }
    }
}

#[test]
fn creation_dates_are_canonical() {
    let dir = tempfile::tempdir().unwrap();
    let pages = placeholders(dir.path(), "arxiv", &["a.html"]);
    let orch = orchestrator(ExtractConfig::default(), &[("a.html", ARXIV_PAGE)]);
    let record = orch.extract_page("arxiv", &pages[0]).unwrap();
    assert_eq!(record.fields.creation_date.as_deref(), Some("12-01-2024"));
}

#[test]
fn record_reaches_assembled_stage() {
    let dir = tempfile::tempdir().unwrap();
    let pages = placeholders(dir.path(), "arxiv", &["a.html"]);
    let orch = orchestrator(ExtractConfig::default(), &[("a.html", ARXIV_PAGE)]);

    let mut record = orch.extract_page("arxiv", &pages[0]).unwrap();
    assert_eq!(
        record.trace.stages,
        vec![
            RecordStage::New,
            RecordStage::SidecarLoaded,
            RecordStage::FieldsExtracted,
            RecordStage::Assembled
        ]
    );
    record.serialize(Shape::Parser).unwrap();
    assert_eq!(record.trace.stage(), RecordStage::SerializedParser);
}

// ---------------------------------------------------------------------------
// Batch mode
// ---------------------------------------------------------------------------
#[test]
fn batch_writes_records_in_order_and_skips_failures() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let pages = placeholders(
        dir.path(),
        "arxiv",
        &["a.html", "b.html", "broken.html", "c.html"],
    );
    // Not a page: wrong extension.
    write_file(&dir.path().join("arxiv").join("html").join("notes.txt"), "");

    let config = ExtractConfig {
        output_dir: out.clone(),
        data_root: Some(dir.path().to_path_buf()),
        workers: 3,
        ..Default::default()
    };
    let orch = orchestrator(
        config,
        &[("a.html", ARXIV_PAGE), ("b.html", ARXIV_PAGE), ("c.html", ARXIV_PAGE)],
    );

    let summary = orch.run_batch("arxiv", None, Shape::Full).unwrap();
    assert_eq!(summary.written, 3);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].path, pages[2]);
    assert!(summary.skipped[0].reason.contains("no fixture"));

    assert_eq!(summary.output_path.parent(), Some(out.as_path()));
    let stem = summary.output_path.file_stem().unwrap().to_str().unwrap();
    assert!(uuid::Uuid::parse_str(stem).is_ok());
    assert_eq!(summary.output_path.extension().unwrap(), "jsonl");

    let content = std::fs::read_to_string(&summary.output_path).unwrap();
    let paths: Vec<String> = content
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            value["path"].as_str().unwrap().to_string()
        })
        .collect();
    let expected: Vec<String> = [&pages[0], &pages[1], &pages[3]]
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    assert_eq!(paths, expected);

    // Only the artifact is left in the output directory.
    assert_eq!(std::fs::read_dir(&out).unwrap().count(), 1);
}

#[test]
fn batch_runs_get_unique_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    placeholders(dir.path(), "arxiv", &["a.html"]);
    let config = ExtractConfig {
        output_dir: out.clone(),
        ..Default::default()
    };
    let orch = orchestrator(config, &[("a.html", ARXIV_PAGE)]);
    let input = dir.path().join("arxiv").join("html");

    let first = orch.run_batch("arxiv", Some(&input), Shape::Full).unwrap();
    let second = orch.run_batch("arxiv", Some(&input), Shape::Full).unwrap();
    assert_ne!(first.output_path, second.output_path);
    assert_eq!(
        std::fs::read_to_string(&first.output_path).unwrap(),
        std::fs::read_to_string(&second.output_path).unwrap()
    );
}

#[test]
fn companion_requirement_skips_pages_in_batch() {
    let dir = tempfile::tempdir().unwrap();
    placeholders(dir.path(), "arxiv", &["a.html", "b.html"]);
    write_file(&dir.path().join("arxiv").join("pdf").join("a.pdf"), "%PDF");

    let config = ExtractConfig {
        output_dir: dir.path().join("out"),
        data_root: Some(dir.path().to_path_buf()),
        require_companion: true,
        ..Default::default()
    };
    let orch = orchestrator(config, &[("a.html", ARXIV_PAGE), ("b.html", ARXIV_PAGE)]);

    let summary = orch.run_batch("arxiv", None, Shape::Parser).unwrap();
    assert_eq!(summary.written, 1);
    assert_eq!(summary.skipped.len(), 1);
    assert!(summary.skipped[0].reason.contains("companion"));

    let content = std::fs::read_to_string(&summary.output_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
    let expected = dir.path().join("arxiv").join("pdf").join("a.pdf");
    assert_eq!(value["path"], expected.display().to_string());
    assert!(value.get("text").is_some());
}

// ---------------------------------------------------------------------------
// Rebase
// ---------------------------------------------------------------------------
#[test]
fn rebase_and_replace_batch_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let old_root = dir.path().join("old");
    let new_root = dir.path().join("new");
    placeholders(&old_root, "arxiv", &["a.html"]);
    write_file(&new_root.join("arxiv").join("pdf").join("a.pdf"), "%PDF");

    let config = ExtractConfig {
        output_dir: dir.path().join("batches"),
        data_root: Some(old_root.clone()),
        ..Default::default()
    };
    let orch = orchestrator(config, &[("a.html", ARXIV_PAGE)]);
    let summary = orch.run_batch("arxiv", None, Shape::Parser).unwrap();

    // A notebook checkpoint line is dropped during rebase.
    let mut content = std::fs::read_to_string(&summary.output_path).unwrap();
    content.push_str("{\"text\":null,\"path\":\"/x/.ipynb_checkpoints/a-checkpoint.pdf\"}\n");
    std::fs::write(&summary.output_path, content).unwrap();

    let batch_dir = dir.path().join("batches");
    let rebased = rebase_batches(&batch_dir, &new_root).unwrap();
    assert_eq!(rebased.len(), 1);
    assert_eq!(rebased[0].records, 1);
    assert_eq!(rebased[0].dropped, 1);

    let outcomes = replace_with_rebased(&batch_dir).unwrap();
    assert_eq!(
        outcomes,
        vec![ReplaceOutcome::Replaced {
            original: summary.output_path.clone()
        }]
    );

    let replaced = std::fs::read_to_string(&summary.output_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(replaced.trim()).unwrap();
    let expected = new_root.join("arxiv").join("pdf").join("a.pdf");
    assert_eq!(value["path"], expected.display().to_string());
    assert!(!rebased[0].rebased.exists());
}
