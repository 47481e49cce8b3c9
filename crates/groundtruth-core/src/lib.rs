pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod rebase;
pub mod render;
pub mod sidecar;
pub mod sources;
pub mod trace;

pub use config::{DirectoryLayout, ExtractConfig};
pub use error::{FieldError, GroundtruthError, SidecarError};
pub use model::{ExtractedFields, ExtractedRecord, ExtractionField, Shape};
pub use pipeline::{BatchSummary, Orchestrator, SkippedPage};
pub use render::static_html::StaticHtmlRenderer;
pub use render::{Element, PageRenderer, RenderedPage};
pub use sidecar::{SidecarLayout, SidecarMetadata};
pub use sources::{SourceExtractor, VariantRegistry};

/// Extract a single stored page with the built-in sources and default settings.
pub fn extract_page(source: &str, page: &std::path::Path) -> Result<ExtractedRecord, GroundtruthError> {
    Orchestrator::with_defaults(ExtractConfig::default()).extract_page(source, page)
}
