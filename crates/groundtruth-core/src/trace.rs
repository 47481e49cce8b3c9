use crate::model::ExtractionField;
use crate::sources::Origin;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const TRACE_SCHEMA_VERSION: &str = "1.0";

/// Lifecycle stages of one record. Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStage {
    New,
    SidecarLoaded,
    FieldsExtracted,
    Assembled,
    SerializedFull,
    SerializedParser,
}

impl fmt::Display for RecordStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordStage::New => "new",
            RecordStage::SidecarLoaded => "sidecar_loaded",
            RecordStage::FieldsExtracted => "fields_extracted",
            RecordStage::Assembled => "assembled",
            RecordStage::SerializedFull => "serialized_full",
            RecordStage::SerializedParser => "serialized_parser",
        };
        f.write_str(name)
    }
}

/// Where a field value came from, or why it is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldOutcome {
    Sidecar,
    Dom,
    Inferred,
    Fixed,
    Absent,
    Failed,
}

impl From<Origin> for FieldOutcome {
    fn from(origin: Origin) -> Self {
        match origin {
            Origin::Sidecar => FieldOutcome::Sidecar,
            Origin::Dom => FieldOutcome::Dom,
            Origin::Inferred => FieldOutcome::Inferred,
            Origin::Fixed => FieldOutcome::Fixed,
        }
    }
}

impl fmt::Display for FieldOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldOutcome::Sidecar => "sidecar",
            FieldOutcome::Dom => "dom",
            FieldOutcome::Inferred => "inferred",
            FieldOutcome::Fixed => "fixed",
            FieldOutcome::Absent => "absent",
            FieldOutcome::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldTrace {
    pub field: ExtractionField,
    pub outcome: FieldOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionTrace {
    pub trace_schema_version: String,
    pub stages: Vec<RecordStage>,
    pub fields: Vec<FieldTrace>,
}

impl Default for ExtractionTrace {
    fn default() -> Self {
        Self {
            trace_schema_version: TRACE_SCHEMA_VERSION.to_string(),
            stages: vec![RecordStage::New],
            fields: Vec::new(),
        }
    }
}

impl ExtractionTrace {
    /// Record that `stage` was reached. Backward moves are ignored.
    pub fn enter(&mut self, stage: RecordStage) {
        if !matches!(self.stages.last(), Some(last) if *last >= stage) {
            self.stages.push(stage);
        }
    }

    pub fn stage(&self) -> RecordStage {
        self.stages.last().copied().unwrap_or(RecordStage::New)
    }

    pub fn record(&mut self, field: ExtractionField, outcome: FieldOutcome, message: Option<String>) {
        self.fields.push(FieldTrace {
            field,
            outcome,
            message,
        });
    }

    pub fn outcome(&self, field: ExtractionField) -> Option<FieldOutcome> {
        self.fields
            .iter()
            .find(|t| t.field == field)
            .map(|t| t.outcome)
    }

    /// Fields whose operation failed, with the failure message.
    pub fn failures(&self) -> impl Iterator<Item = &FieldTrace> {
        self.fields
            .iter()
            .filter(|t| t.outcome == FieldOutcome::Failed)
    }
}
