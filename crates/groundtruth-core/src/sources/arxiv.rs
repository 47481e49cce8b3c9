use crate::error::FieldError;
use crate::model::ExtractedFields;
use crate::normalize::{canonicalize_authors, clean_text};
use crate::sidecar::SidecarLayout;
use crate::sources::{
    date_from, fixed, join_blocks, resolve, FieldContext, FieldResult, SourceExtractor,
};
use regex::Regex;
use std::sync::LazyLock;

/// `arXiv:2401.00001v1 [cs.CL] 1 Jan 2024`
static WATERMARK_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"arXiv:\S+\s+\[[^\]]+\]\s+(\d{1,2}\s+[A-Za-z]+\.?\s+\d{4})")
        .expect("watermark pattern is valid")
});

const UNAVAILABLE_NOTICE: &str = "HTML is not available for the source.";

/// arXiv HTML (LaTeXML) pages with a one-row sidecar from the arXiv API.
pub struct ArxivExtractor;

impl ArxivExtractor {
    pub fn new() -> Self {
        ArxivExtractor
    }
}

impl Default for ArxivExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceExtractor for ArxivExtractor {
    fn source(&self) -> &str {
        "arxiv"
    }

    fn sidecar_layout(&self) -> Option<SidecarLayout> {
        Some(SidecarLayout::Row)
    }

    fn title(&self, cx: &FieldContext<'_>) -> FieldResult<String> {
        resolve(cx.sidecar_text(&["title"]), || cx.text_of(".ltx_title"))
    }

    fn authors(&self, cx: &FieldContext<'_>) -> FieldResult<Vec<String>> {
        resolve(None, || {
            let elements = cx.wait_for_all(".ltx_personname")?;
            // One element may hold several names separated by <br>.
            let names = canonicalize_authors(elements.iter().flat_map(|el| el.lines()));
            Ok(Some(names).filter(|n| !n.is_empty()))
        })
    }

    fn creation_date(&self, cx: &FieldContext<'_>) -> FieldResult<String> {
        resolve(cx.sidecar_date(&["date_published"]), || {
            let watermark = cx.wait_for("#watermark-tr")?.text();
            let date = WATERMARK_DATE
                .captures(&watermark)
                .map(|caps| caps[1].to_string())
                .ok_or_else(|| FieldError::UnresolvableDate(watermark.clone()))?;
            date_from(&date).map(Some)
        })
    }

    fn keywords(&self, _cx: &FieldContext<'_>) -> FieldResult<Vec<String>> {
        fixed(Vec::new())
    }

    /// arXiv pages carry no publisher DOI; only the sidecar may hold one.
    fn doi(&self, cx: &FieldContext<'_>) -> FieldResult<String> {
        resolve(cx.sidecar_text(&["doi"]), || Ok(None))
    }

    fn abstract_text(&self, cx: &FieldContext<'_>) -> FieldResult<String> {
        resolve(cx.sidecar_text(&["summary"]), || {
            let abstract_div = cx.wait_for(".ltx_abstract")?;
            let paragraphs = abstract_div.find_all(".ltx_p")?;
            Ok(join_blocks(paragraphs.iter().map(|p| p.text())))
        })
    }

    fn document_text(&self, cx: &FieldContext<'_>) -> FieldResult<String> {
        resolve(None, || {
            cx.wait_for(".ltx_section")?;
            let sections = cx
                .page
                .find_all("section.ltx_section:not(.ltx_bibliography)")?;
            Ok(join_blocks(sections.iter().map(|s| s.text())))
        })
    }

    fn unsupported_packages(&self, cx: &FieldContext<'_>) -> Result<Vec<String>, FieldError> {
        let Some(list) = cx
            .page
            .find("ul[aria-label='Unsupported packages used in this paper']")?
        else {
            return Ok(Vec::new());
        };
        Ok(list
            .find_all("li")?
            .iter()
            .filter_map(|li| clean_text(&li.text()))
            .collect())
    }

    fn valid_content(
        &self,
        cx: &FieldContext<'_>,
        _fields: &ExtractedFields,
    ) -> Result<bool, FieldError> {
        let unavailable = cx
            .page
            .find_all("p")?
            .iter()
            .any(|p| p.text() == UNAVAILABLE_NOTICE);
        Ok(!unavailable)
    }
}
