use crate::error::FieldError;
use crate::model::ExtractedFields;
use crate::normalize::clean_text;
use crate::sidecar::SidecarLayout;
use crate::sources::{
    authors_from, date_from, doi_from_link, join_blocks, resolve, FieldContext, FieldResult,
    SourceExtractor,
};

const TITLE: &str = "h1.c-article-title";
const AUTHORS: &str = "ul.c-article-author-list a[data-test='author-name']";
const PUBLISHED: &str = "li.c-article-identifiers__item time";
const DOI: &str =
    "li.c-bibliographic-information__list-item--full-width span.c-bibliographic-information__value";
const ABSTRACT: &str = "section[aria-labelledby=\"Abs1\"]";
const SECTION_BLOCKS: &str = "div[id^='Sec'][id$='-content']";

/// Section headings that end the main text.
const END_OF_MAIN_TEXT: &[&str] = &[
    "References",
    "Availability of data and materials",
    "Abbreviations",
    "Acknowledgements",
    "Funding",
    "Author information",
    "About this article",
    "Rights and permissions",
    "Ethics declarations",
    "Additional information",
    "Supplementary Information",
];

const CORRECTION_PREFIXES: &[&str] = &["Correction to:", "Author Correction:", "Publisher Correction:"];

/// Springer Nature article pages (nature.com, BMC). No sidecar.
pub struct NatureExtractor {
    source: &'static str,
}

impl NatureExtractor {
    pub fn new(source: &'static str) -> Self {
        Self { source }
    }
}

impl SourceExtractor for NatureExtractor {
    fn source(&self) -> &str {
        self.source
    }

    fn sidecar_layout(&self) -> Option<SidecarLayout> {
        None
    }

    fn title(&self, cx: &FieldContext<'_>) -> FieldResult<String> {
        resolve(None, || cx.text_of(TITLE))
    }

    fn authors(&self, cx: &FieldContext<'_>) -> FieldResult<Vec<String>> {
        resolve(None, || Ok(authors_from(&cx.wait_for_all(AUTHORS)?)))
    }

    fn creation_date(&self, cx: &FieldContext<'_>) -> FieldResult<String> {
        resolve(None, || {
            let time = cx.wait_for(PUBLISHED)?;
            date_from(&time.text()).map(Some)
        })
    }

    fn keywords(&self, _cx: &FieldContext<'_>) -> FieldResult<Vec<String>> {
        Ok(None)
    }

    fn doi(&self, cx: &FieldContext<'_>) -> FieldResult<String> {
        resolve(None, || {
            let text = cx.wait_for(DOI)?.text();
            Ok(doi_from_link(&text).or_else(|| clean_text(&text)))
        })
    }

    fn abstract_text(&self, cx: &FieldContext<'_>) -> FieldResult<String> {
        resolve(None, || {
            let section = cx.wait_for(ABSTRACT)?;
            let Some(content) = section.find("div[id$='-content']")? else {
                return Err(FieldError::MissingElement {
                    selector: format!("{ABSTRACT} div[id$='-content']"),
                });
            };
            let paragraphs = content.find_all("p")?;
            Ok(join_blocks(paragraphs.iter().map(|p| p.text())))
        })
    }

    /// Paragraphs of each numbered section, in document order, up to the
    /// first back-matter heading. Nothing after that heading is kept.
    fn document_text(&self, cx: &FieldContext<'_>) -> FieldResult<String> {
        resolve(None, || {
            let blocks = cx.wait_for_all(SECTION_BLOCKS)?;
            let mut texts = Vec::new();

            for block in blocks {
                let heading = block
                    .preceding_sibling("h2")
                    .map(|h| h.text())
                    .unwrap_or_default();
                if END_OF_MAIN_TEXT.contains(&heading.as_str()) {
                    break;
                }
                for paragraph in block.find_all("p")? {
                    texts.push(paragraph.text());
                }
            }

            Ok(join_blocks(texts))
        })
    }

    /// Correction notices are not articles.
    fn valid_content(
        &self,
        _cx: &FieldContext<'_>,
        fields: &ExtractedFields,
    ) -> Result<bool, FieldError> {
        let is_correction = fields
            .title
            .as_deref()
            .is_some_and(|title| CORRECTION_PREFIXES.iter().any(|p| title.starts_with(p)));
        Ok(!is_correction)
    }
}
