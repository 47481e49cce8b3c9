use crate::sidecar::SidecarMetadata;
use crate::trace::{ExtractionTrace, RecordStage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The extractable fields of an article, in extraction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionField {
    Title,
    Authors,
    CreationDate,
    Keywords,
    Doi,
    Producer,
    Format,
    FirstPage,
    Abstract,
    DocumentText,
    UnsupportedPackages,
    ValidContent,
}

impl ExtractionField {
    /// Fixed call order of a single extraction; diagnostics run last.
    pub const ORDER: [ExtractionField; 12] = [
        ExtractionField::Title,
        ExtractionField::Authors,
        ExtractionField::CreationDate,
        ExtractionField::Keywords,
        ExtractionField::Doi,
        ExtractionField::Producer,
        ExtractionField::Format,
        ExtractionField::FirstPage,
        ExtractionField::Abstract,
        ExtractionField::DocumentText,
        ExtractionField::UnsupportedPackages,
        ExtractionField::ValidContent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionField::Title => "title",
            ExtractionField::Authors => "authors",
            ExtractionField::CreationDate => "creation_date",
            ExtractionField::Keywords => "keywords",
            ExtractionField::Doi => "doi",
            ExtractionField::Producer => "producer",
            ExtractionField::Format => "format",
            ExtractionField::FirstPage => "first_page",
            ExtractionField::Abstract => "abstract",
            ExtractionField::DocumentText => "document_text",
            ExtractionField::UnsupportedPackages => "unsupported_packages",
            ExtractionField::ValidContent => "valid_content",
        }
    }
}

impl fmt::Display for ExtractionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized field values of one article. Every field is independently
/// nullable; diagnostics always carry a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub title: Option<String>,
    pub authors: Option<Vec<String>>,
    pub creation_date: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub doi: Option<String>,
    pub producer: Option<String>,
    pub format: Option<String>,
    pub first_page: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub document_text: Option<String>,
    pub unsupported_packages: Vec<String>,
    pub valid_content: bool,
}

impl Default for ExtractedFields {
    fn default() -> Self {
        Self {
            title: None,
            authors: None,
            creation_date: None,
            keywords: None,
            doi: None,
            producer: None,
            format: None,
            first_page: None,
            abstract_text: None,
            document_text: None,
            unsupported_packages: Vec::new(),
            valid_content: true,
        }
    }
}

/// Output shape of a serialized record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// Full record keyed by the page path, with diagnostics and sidecar data.
    #[default]
    Full,
    /// Record keyed by the companion artifact path, for parser evaluation.
    Parser,
}

impl Shape {
    pub fn from_name(name: &str) -> Option<Shape> {
        match name.trim().to_lowercase().as_str() {
            "full" => Some(Shape::Full),
            "parser" | "parser-compatible" => Some(Shape::Parser),
            _ => None,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Full => write!(f, "full"),
            Shape::Parser => write!(f, "parser"),
        }
    }
}

/// One extracted article: fields, provenance, the raw sidecar and the trace.
/// Built once per page; only the trace advances after assembly.
#[derive(Debug, Clone)]
pub struct ExtractedRecord {
    pub source: String,
    pub page_path: PathBuf,
    pub companion_path: PathBuf,
    pub fields: ExtractedFields,
    pub sidecar: SidecarMetadata,
    pub trace: ExtractionTrace,
}

#[derive(Serialize)]
struct MetadataView<'a> {
    title: &'a Option<String>,
    authors: &'a Option<Vec<String>>,
    creationdate: &'a Option<String>,
    keywords: &'a Option<Vec<String>>,
    doi: &'a Option<String>,
    producer: &'a Option<String>,
    format: &'a Option<String>,
    first_page: &'a Option<String>,
    #[serde(rename = "abstract")]
    abstract_text: &'a Option<String>,
}

#[derive(Serialize)]
struct ExtraMetadataView<'a> {
    unsupported_packages: &'a [String],
    valid_content: bool,
    csv_data_dict: &'a SidecarMetadata,
}

#[derive(Serialize)]
struct FullView<'a> {
    text_groundtruth: &'a Option<String>,
    path: String,
    metadata: MetadataView<'a>,
    extrametadata: ExtraMetadataView<'a>,
}

#[derive(Serialize)]
struct ParserView<'a> {
    text: &'a Option<String>,
    path: String,
    metadata: MetadataView<'a>,
}

impl ExtractedRecord {
    fn metadata(&self) -> MetadataView<'_> {
        let f = &self.fields;
        MetadataView {
            title: &f.title,
            authors: &f.authors,
            creationdate: &f.creation_date,
            keywords: &f.keywords,
            doi: &f.doi,
            producer: &f.producer,
            format: &f.format,
            first_page: &f.first_page,
            abstract_text: &f.abstract_text,
        }
    }

    /// Serialize the record as a single-line JSON object in the given shape.
    pub fn to_json(&self, shape: Shape) -> Result<String, serde_json::Error> {
        match shape {
            Shape::Full => serde_json::to_string(&FullView {
                text_groundtruth: &self.fields.document_text,
                path: self.page_path.display().to_string(),
                metadata: self.metadata(),
                extrametadata: ExtraMetadataView {
                    unsupported_packages: &self.fields.unsupported_packages,
                    valid_content: self.fields.valid_content,
                    csv_data_dict: &self.sidecar,
                },
            }),
            Shape::Parser => serde_json::to_string(&ParserView {
                text: &self.fields.document_text,
                path: self.companion_path.display().to_string(),
                metadata: self.metadata(),
            }),
        }
    }

    /// Serialize for output and record the serialization stage in the trace.
    pub fn serialize(&mut self, shape: Shape) -> Result<String, serde_json::Error> {
        let line = self.to_json(shape)?;
        self.trace.enter(match shape {
            Shape::Full => RecordStage::SerializedFull,
            Shape::Parser => RecordStage::SerializedParser,
        });
        Ok(line)
    }

    pub fn to_value(&self, shape: Shape) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.to_json(shape)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ExtractedRecord {
        ExtractedRecord {
            source: "arxiv".into(),
            page_path: PathBuf::from("/data/arxiv/html/a.html"),
            companion_path: PathBuf::from("/data/arxiv/pdf/a.pdf"),
            fields: ExtractedFields {
                title: Some("Foo".into()),
                authors: Some(vec!["Alice".into()]),
                abstract_text: Some("Short".into()),
                document_text: Some("Body".into()),
                ..Default::default()
            },
            sidecar: SidecarMetadata::from_pairs([("title", "Foo")]),
            trace: ExtractionTrace::default(),
        }
    }

    #[test]
    fn test_full_shape_keys() {
        let value = record().to_value(Shape::Full).unwrap();
        assert_eq!(value["text_groundtruth"], "Body");
        assert_eq!(value["path"], "/data/arxiv/html/a.html");
        assert_eq!(value["metadata"]["title"], "Foo");
        assert_eq!(value["metadata"]["abstract"], "Short");
        assert!(value["metadata"]["creationdate"].is_null());
        assert_eq!(value["extrametadata"]["valid_content"], true);
        assert_eq!(value["extrametadata"]["csv_data_dict"]["title"], "Foo");
        assert!(value.get("trace").is_none());
    }

    #[test]
    fn test_parser_shape_uses_companion_path() {
        let value = record().to_value(Shape::Parser).unwrap();
        assert_eq!(value["text"], "Body");
        assert_eq!(value["path"], "/data/arxiv/pdf/a.pdf");
        assert!(value.get("extrametadata").is_none());
    }

    #[test]
    fn test_shape_names() {
        assert_eq!(Shape::from_name("Full"), Some(Shape::Full));
        assert_eq!(Shape::from_name("parser"), Some(Shape::Parser));
        assert_eq!(Shape::from_name("xml"), None);
    }

    #[test]
    fn test_field_order_ends_with_diagnostics() {
        assert_eq!(ExtractionField::ORDER[0], ExtractionField::Title);
        assert_eq!(ExtractionField::ORDER[9], ExtractionField::DocumentText);
        assert_eq!(ExtractionField::ORDER[11], ExtractionField::ValidContent);
    }
}
