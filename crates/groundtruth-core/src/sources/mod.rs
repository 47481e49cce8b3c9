pub mod arxiv;
pub mod mdpi;
pub mod medrxiv;
pub mod nature;

use crate::error::{FieldError, GroundtruthError};
use crate::model::ExtractedFields;
use crate::normalize::{canonicalize_authors, canonicalize_date, clean_text};
use crate::render::{Element, RenderedPage};
use crate::sidecar::{SidecarLayout, SidecarMetadata};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Where an extracted value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Publisher-supplied sidecar table.
    Sidecar,
    /// Scraped from the rendered page.
    Dom,
    /// Derived from the page handle itself (e.g. the file name).
    Inferred,
    /// A constant the source always reports.
    Fixed,
}

/// A field value tagged with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sourced<T> {
    pub value: T,
    pub origin: Origin,
}

impl<T> Sourced<T> {
    pub fn new(value: T, origin: Origin) -> Self {
        Self { value, origin }
    }

    pub fn sidecar(value: T) -> Self {
        Self::new(value, Origin::Sidecar)
    }

    pub fn dom(value: T) -> Self {
        Self::new(value, Origin::Dom)
    }
}

/// Result of one field operation: a value, no value, or a recovered failure.
pub type FieldResult<T> = Result<Option<Sourced<T>>, FieldError>;

/// Everything a field operation may consult for one page.
pub struct FieldContext<'a> {
    pub page: &'a RenderedPage,
    pub sidecar: &'a SidecarMetadata,
    pub wait: Duration,
}

impl<'a> FieldContext<'a> {
    pub fn new(page: &'a RenderedPage, sidecar: &'a SidecarMetadata, wait: Duration) -> Self {
        Self {
            page,
            sidecar,
            wait,
        }
    }

    /// Cleaned sidecar text under the first present key.
    pub fn sidecar_text(&self, keys: &[&str]) -> Option<String> {
        self.sidecar.get_any(keys).and_then(clean_text)
    }

    /// Sidecar author list (`;`-separated), canonicalized.
    pub fn sidecar_authors(&self, keys: &[&str]) -> Option<Vec<String>> {
        let raw = self.sidecar.get_any(keys)?;
        non_empty(canonicalize_authors(raw.split(';')))
    }

    /// Canonical sidecar date under the first present key.
    pub fn sidecar_date(&self, keys: &[&str]) -> Option<String> {
        self.sidecar.get_any(keys).and_then(canonicalize_date)
    }

    /// Wait for the first element matching `selector`.
    pub fn wait_for(&self, selector: &str) -> Result<Element<'a>, FieldError> {
        self.page.wait_until_present(selector, self.wait)
    }

    /// Wait for every element matching `selector`; none is a failure.
    pub fn wait_for_all(&self, selector: &str) -> Result<Vec<Element<'a>>, FieldError> {
        self.page.wait_until_all_present(selector, self.wait)
    }

    /// Cleaned text of the first element matching `selector`.
    pub fn text_of(&self, selector: &str) -> Result<Option<String>, FieldError> {
        Ok(clean_text(&self.wait_for(selector)?.text()))
    }
}

/// Two-tier resolution shared by every source: a present sidecar value wins,
/// otherwise the DOM scrape is consulted, otherwise the field stays null.
///
/// The DOM closure only runs when the sidecar has nothing, so DOM data can
/// never overwrite sidecar data.
pub fn resolve<T, F>(sidecar: Option<T>, dom: F) -> FieldResult<T>
where
    F: FnOnce() -> Result<Option<T>, FieldError>,
{
    if let Some(value) = sidecar {
        return Ok(Some(Sourced::sidecar(value)));
    }
    Ok(dom()?.map(Sourced::dom))
}

/// A value the source always reports the same way.
pub fn fixed<T>(value: T) -> FieldResult<T> {
    Ok(Some(Sourced::new(value, Origin::Fixed)))
}

/// Canonical date from scraped text, or `UnresolvableDate`.
pub fn date_from(text: &str) -> Result<String, FieldError> {
    canonicalize_date(text).ok_or_else(|| FieldError::UnresolvableDate(text.trim().to_string()))
}

/// DOI part of a resolver link: everything after `doi.org/`.
pub fn doi_from_link(href: &str) -> Option<String> {
    let (_, doi) = href.split_once("doi.org/")?;
    clean_text(doi)
}

/// Canonical author names from the text of each element.
pub fn authors_from(elements: &[Element<'_>]) -> Option<Vec<String>> {
    non_empty(canonicalize_authors(elements.iter().map(|el| el.text())))
}

/// Join text blocks with single spaces and clean the result.
pub fn join_blocks<I, S>(blocks: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = blocks
        .into_iter()
        .map(|b| b.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(" ");
    clean_text(&joined)
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// The field operations every publisher source supports.
///
/// Each operation is fault-isolated: an `Err` only leaves that field null.
/// The orchestrator calls them in [`ExtractionField::ORDER`](crate::model::ExtractionField::ORDER).
pub trait SourceExtractor: Send + Sync {
    /// Source tag this extractor is registered under.
    fn source(&self) -> &str;

    /// Shape of the companion sidecar, or `None` for DOM-only sources.
    fn sidecar_layout(&self) -> Option<SidecarLayout>;

    fn title(&self, cx: &FieldContext<'_>) -> FieldResult<String>;

    fn authors(&self, cx: &FieldContext<'_>) -> FieldResult<Vec<String>>;

    /// Publication date as `DD-MM-YYYY`.
    fn creation_date(&self, cx: &FieldContext<'_>) -> FieldResult<String>;

    fn keywords(&self, cx: &FieldContext<'_>) -> FieldResult<Vec<String>>;

    fn doi(&self, cx: &FieldContext<'_>) -> FieldResult<String>;

    fn producer(&self, _cx: &FieldContext<'_>) -> FieldResult<String> {
        Ok(None)
    }

    fn format(&self, _cx: &FieldContext<'_>) -> FieldResult<String> {
        Ok(None)
    }

    fn first_page(&self, _cx: &FieldContext<'_>) -> FieldResult<String> {
        Ok(None)
    }

    fn abstract_text(&self, cx: &FieldContext<'_>) -> FieldResult<String>;

    fn document_text(&self, cx: &FieldContext<'_>) -> FieldResult<String>;

    /// Markup packages the publisher could not convert for this article.
    fn unsupported_packages(&self, _cx: &FieldContext<'_>) -> Result<Vec<String>, FieldError> {
        Ok(Vec::new())
    }

    /// Whether the page holds real article content. Runs after every other
    /// field, so it may inspect what was extracted.
    fn valid_content(
        &self,
        _cx: &FieldContext<'_>,
        _fields: &ExtractedFields,
    ) -> Result<bool, FieldError> {
        Ok(true)
    }
}

pub type ExtractorFactory = fn() -> Box<dyn SourceExtractor>;

/// Source tag to extractor factory.
pub struct VariantRegistry {
    factories: BTreeMap<String, ExtractorFactory>,
}

impl VariantRegistry {
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry with every built-in publisher source.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("arxiv", || Box::new(arxiv::ArxivExtractor::new()));
        registry.register("mdpi", || Box::new(mdpi::MdpiExtractor::new()));
        registry.register("medrxiv", || Box::new(medrxiv::MedrxivExtractor::new("medrxiv")));
        registry.register("biorxiv", || Box::new(medrxiv::MedrxivExtractor::new("biorxiv")));
        registry.register("nature", || Box::new(nature::NatureExtractor::new("nature")));
        registry.register("bmc", || Box::new(nature::NatureExtractor::new("bmc")));
        registry
    }

    /// Add or replace the factory for `tag`.
    pub fn register(&mut self, tag: &str, factory: ExtractorFactory) {
        self.factories.insert(tag.to_lowercase(), factory);
    }

    pub fn resolve(&self, tag: &str) -> Result<Box<dyn SourceExtractor>, GroundtruthError> {
        self.factories
            .get(&tag.trim().to_lowercase())
            .map(|factory| factory())
            .ok_or_else(|| GroundtruthError::UnknownSource {
                tag: tag.to_string(),
                available: self.tags().join(", "),
            })
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

impl Default for VariantRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
