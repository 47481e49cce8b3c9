use crate::normalize::{clean_text, find_date};
use crate::sidecar::SidecarLayout;
use crate::sources::{
    authors_from, date_from, doi_from_link, join_blocks, resolve, FieldContext, FieldResult,
    Origin, SourceExtractor, Sourced,
};
use std::path::Path;

const TITLE: &str = "#page-title";
const AUTHORS: &str = "span.highwire-citation-author";
const POSTED: &str = "div.panel-pane.pane-custom.pane-1 > div.pane-content";
const DOI: &str = "span.highwire-cite-metadata-doi";
const ABSTRACT: &str = "#abstract-1";
const MARKUP: &str = "div.highwire-markup";
const SECTIONS: &str = "div.highwire-markup div.section[id^='sec-']";

const DATE_KEYS: &[&str] = &["date", "data", "date_posted"];

/// Preprint servers on the HighWire platform (medRxiv, bioRxiv), with a
/// transposed key/value sidecar.
pub struct MedrxivExtractor {
    source: &'static str,
}

impl MedrxivExtractor {
    pub fn new(source: &'static str) -> Self {
        Self { source }
    }
}

impl SourceExtractor for MedrxivExtractor {
    fn source(&self) -> &str {
        self.source
    }

    fn sidecar_layout(&self) -> Option<SidecarLayout> {
        Some(SidecarLayout::Transposed)
    }

    fn title(&self, cx: &FieldContext<'_>) -> FieldResult<String> {
        resolve(cx.sidecar_text(&["title"]), || cx.text_of(TITLE))
    }

    fn authors(&self, cx: &FieldContext<'_>) -> FieldResult<Vec<String>> {
        resolve(cx.sidecar_authors(&["authors"]), || {
            Ok(authors_from(&cx.wait_for_all(AUTHORS)?))
        })
    }

    fn creation_date(&self, cx: &FieldContext<'_>) -> FieldResult<String> {
        resolve(cx.sidecar_date(DATE_KEYS), || {
            let text = cx.wait_for(POSTED)?.text();
            match find_date(&text) {
                Some(date) => Ok(Some(date)),
                None => date_from(&text).map(Some),
            }
        })
    }

    /// Preprint pages list no keywords.
    fn keywords(&self, _cx: &FieldContext<'_>) -> FieldResult<Vec<String>> {
        Ok(None)
    }

    /// Sidecar, then the citation block, then the page file name.
    fn doi(&self, cx: &FieldContext<'_>) -> FieldResult<String> {
        let scraped = resolve(cx.sidecar_text(&["doi"]), || {
            let Some(element) = cx.page.find(DOI)? else {
                return Ok(None);
            };
            let text = element.text();
            Ok(doi_from_link(&text).or_else(|| clean_text(strip_doi_label(&text))))
        })?;

        if scraped.is_some() {
            return Ok(scraped);
        }
        Ok(infer_doi(cx.page.path()).map(|doi| Sourced::new(doi, Origin::Inferred)))
    }

    fn abstract_text(&self, cx: &FieldContext<'_>) -> FieldResult<String> {
        resolve(cx.sidecar_text(&["abstract"]), || {
            let section = cx.wait_for(ABSTRACT)?;
            let parts: Vec<String> = section
                .children()
                .iter()
                .filter(|child| child.name() != "h2")
                .map(|child| child.text())
                .collect();
            Ok(join_blocks(parts))
        })
    }

    fn document_text(&self, cx: &FieldContext<'_>) -> FieldResult<String> {
        resolve(None, || {
            cx.wait_for(MARKUP)?;
            let sections = cx.page.find_all(SECTIONS)?;
            Ok(join_blocks(sections.iter().map(|s| s.text())))
        })
    }
}

fn strip_doi_label(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("doi:")
        .or_else(|| trimmed.strip_prefix("DOI:"))
        .unwrap_or(trimmed)
}

/// DOI encoded in a page file name.
///
/// `10.1101_2020.01.01.123.html` -> `10.1101/2020.01.01.123`;
/// `10_1101_2020_01_01.html` -> `10.1101/2020.01.01`.
pub fn infer_doi(page: &Path) -> Option<String> {
    let stem = page.file_stem()?.to_str()?;
    let tokens: Vec<&str> = stem.split('_').filter(|t| !t.is_empty()).collect();
    if tokens.len() < 2 {
        return None;
    }

    if stem.contains('.') {
        return Some(tokens.join("/"));
    }

    if tokens.len() < 3 {
        return None;
    }
    Some(format!(
        "{}.{}/{}",
        tokens[0],
        tokens[1],
        tokens[2..].join(".")
    ))
}
