use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum GroundtruthError {
    #[error("invalid page handle {path}: {reason}")]
    InvalidPageHandle { path: PathBuf, reason: String },

    #[error("unknown source '{tag}'. Available: {available}")]
    UnknownSource { tag: String, available: String },

    #[error("rendering failed: {0}")]
    Render(String),

    #[error("no input directory for source '{tag}': pass one explicitly or set data_root")]
    NoInputDirectory { tag: String },

    #[error("batch worker failed: {0}")]
    Worker(String),

    #[error("failed to load config from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("failed to rebase {path}: {reason}")]
    Rebase { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of a single field operation. Always recovered: the field stays null.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("element not found: {selector}")]
    MissingElement { selector: String },

    #[error("timed out after {timeout_ms} ms waiting for {selector}")]
    TimeoutWaiting { selector: String, timeout_ms: u64 },

    #[error("could not resolve a date from '{0}'")]
    UnresolvableDate(String),

    #[error("invalid selector: {0}")]
    InvalidSelector(String),
}

/// Failure to read a companion sidecar table. Recovered with an empty mapping.
#[derive(Debug, thiserror::Error)]
pub enum SidecarError {
    #[error("malformed sidecar {path}: {reason}")]
    MalformedSidecar { path: PathBuf, reason: String },
}
