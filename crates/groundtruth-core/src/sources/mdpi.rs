use crate::error::FieldError;
use crate::normalize::clean_text;
use crate::sidecar::SidecarLayout;
use crate::sources::{
    authors_from, date_from, doi_from_link, join_blocks, resolve, FieldContext, FieldResult,
    SourceExtractor,
};

const TITLE: &str = "h1.title.hypothesis_container";
const AUTHORS: &str = "div.art-authors.hypothesis_container div.profile-card-drop";
const PUB_HISTORY: &str = "div.pubhistory";
const KEYWORDS: &str = "#html-keywords";
const BIB_IDENTITY: &str = "div.bib-identity";
const ABSTRACT: &str = "section.html-abstract div.html-p";
const PARAGRAPH: &str = "div.html-p";
const BODY_PARAGRAPHS: &str = "div.html-body section div.html-p";

const DATE_KEYS: &[&str] = &["date", "data", "date_posted"];

/// MDPI journal pages with a transposed key/value sidecar.
pub struct MdpiExtractor;

impl MdpiExtractor {
    pub fn new() -> Self {
        MdpiExtractor
    }
}

impl Default for MdpiExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceExtractor for MdpiExtractor {
    fn source(&self) -> &str {
        "mdpi"
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
            let history = cx.wait_for(PUB_HISTORY)?;
            let published = history
                .find_all("span")?
                .into_iter()
                .map(|span| span.text())
                .find(|text| text.contains("Published:"));
            match published {
                Some(text) => date_from(&text).map(Some),
                None => Err(FieldError::MissingElement {
                    selector: format!("{PUB_HISTORY} span (Published:)"),
                }),
            }
        })
    }

    fn keywords(&self, cx: &FieldContext<'_>) -> FieldResult<Vec<String>> {
        resolve(None, || {
            let container = cx.wait_for(KEYWORDS)?;
            let keywords: Vec<String> = container
                .find_all("a")?
                .iter()
                .filter_map(|a| clean_text(&a.text()))
                .collect();
            Ok(Some(keywords).filter(|k| !k.is_empty()))
        })
    }

    fn doi(&self, cx: &FieldContext<'_>) -> FieldResult<String> {
        resolve(cx.sidecar_text(&["doi"]), || {
            let link = cx.wait_for(BIB_IDENTITY)?.find("a")?;
            Ok(link.and_then(|a| a.attr("href")).and_then(doi_from_link))
        })
    }

    fn abstract_text(&self, cx: &FieldContext<'_>) -> FieldResult<String> {
        resolve(cx.sidecar_text(&["abstract"]), || {
            match cx.page.find(ABSTRACT)? {
                Some(paragraph) => Ok(clean_text(&paragraph.text())),
                None => cx.text_of(PARAGRAPH),
            }
        })
    }

    fn document_text(&self, cx: &FieldContext<'_>) -> FieldResult<String> {
        resolve(None, || {
            let paragraphs = cx.wait_for_all(BODY_PARAGRAPHS)?;
            Ok(join_blocks(paragraphs.iter().map(|p| p.text())))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderedPage;
    use crate::sidecar::SidecarMetadata;
    use crate::sources::Origin;
    use std::time::Duration;

    const PAGE: &str = r#"<html><body>
        <h1 class="title hypothesis_container">Soil  Microbes &amp; Climate</h1>
        <div class="art-authors hypothesis_container">
          <span class="inlineblock"><div class="profile-card-drop">Anna Berg <sup>1</sup></div>,</span>
          <span class="inlineblock"><div class="profile-card-drop">Jonas Lind <sup>2,*</sup></div></span>
        </div>
        <div class="bib-identity"><a href="https://doi.org/10.3390/soil7010002">doi</a></div>
        <div class="pubhistory"><span>Received: 2 January 2023</span> / <span>Published: 15 March 2023</span></div>
        <section class="html-abstract"><div class="html-p">Microbes matter.</div></section>
        <div id="html-keywords"><a>soil</a><a> climate </a></div>
        <div class="html-body">
          <section><h2>1. Introduction</h2><div class="html-p">First part.</div>
            <section><div class="html-p">Nested part.</div></section>
          </section>
          <section><h2>2. Methods</h2><div class="html-p">Second part.</div></section>
        </div>
    </body></html>"#;

    fn with_page<R>(html: &str, sidecar: &SidecarMetadata, f: impl FnOnce(&FieldContext<'_>) -> R) -> R {
        let page = RenderedPage::from_html("mdpi/html/a.html", html);
        let cx = FieldContext::new(&page, sidecar, Duration::ZERO);
        f(&cx)
    }

    #[test]
    fn test_dom_fields() {
        let ex = MdpiExtractor::new();
        let sidecar = SidecarMetadata::new();
        with_page(PAGE, &sidecar, |cx| {
            assert_eq!(ex.title(cx).unwrap().unwrap().value, "Soil Microbes & Climate");
            assert_eq!(
                ex.authors(cx).unwrap().unwrap().value,
                vec!["Anna Berg", "Jonas Lind"]
            );
            assert_eq!(ex.creation_date(cx).unwrap().unwrap().value, "15-03-2023");
            assert_eq!(ex.keywords(cx).unwrap().unwrap().value, vec!["soil", "climate"]);
            assert_eq!(ex.doi(cx).unwrap().unwrap().value, "10.3390/soil7010002");
            assert_eq!(ex.abstract_text(cx).unwrap().unwrap().value, "Microbes matter.");
            assert_eq!(
                ex.document_text(cx).unwrap().unwrap().value,
                "First part. Nested part. Second part."
            );
        });
    }

    #[test]
    fn test_transposed_sidecar_wins() {
        let ex = MdpiExtractor::new();
        let sidecar = SidecarMetadata::from_pairs([
            ("title", "Sidecar Title"),
            ("authors", "Eva Holm; Per Ek"),
            ("data", "2022-11-30"),
            ("doi", "10.3390/other"),
            ("abstract", "nan"),
        ]);
        with_page(PAGE, &sidecar, |cx| {
            let title = ex.title(cx).unwrap().unwrap();
            assert_eq!(title.value, "Sidecar Title");
            assert_eq!(title.origin, Origin::Sidecar);
            assert_eq!(ex.authors(cx).unwrap().unwrap().value, vec!["Eva Holm", "Per Ek"]);
            assert_eq!(ex.creation_date(cx).unwrap().unwrap().value, "30-11-2022");
            assert_eq!(ex.doi(cx).unwrap().unwrap().value, "10.3390/other");
            // `nan` placeholder falls back to the page.
            let abs = ex.abstract_text(cx).unwrap().unwrap();
            assert_eq!(abs.origin, Origin::Dom);
        });
    }

    #[test]
    fn test_abstract_falls_back_to_first_paragraph() {
        let ex = MdpiExtractor::new();
        let sidecar = SidecarMetadata::new();
        let html = r#"<div class="html-p">Lead paragraph.</div><div class="html-p">Other.</div>"#;
        with_page(html, &sidecar, |cx| {
            assert_eq!(ex.abstract_text(cx).unwrap().unwrap().value, "Lead paragraph.");
        });
    }

    #[test]
    fn test_missing_elements_fail_per_field() {
        let ex = MdpiExtractor::new();
        let sidecar = SidecarMetadata::new();
        with_page("<p>empty</p>", &sidecar, |cx| {
            assert!(matches!(ex.title(cx), Err(FieldError::MissingElement { .. })));
            assert!(ex.keywords(cx).is_err());
            assert!(ex.doi(cx).is_err());
            assert!(ex.creation_date(cx).is_err());
            assert_eq!(ex.producer(cx), Ok(None));
        });
    }
}
