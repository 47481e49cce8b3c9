use crate::error::GroundtruthError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory segment and extension names of the on-disk corpus layout.
///
/// A page at `<root>/<source>/html/<stem>.html` has its sidecar at
/// `<root>/<source>/csv/<stem>.csv` and its companion artifact at
/// `<root>/<source>/pdf/<stem>.pdf`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryLayout {
    pub page_dir: String,
    pub page_extension: String,
    pub sidecar_dir: String,
    pub sidecar_extension: String,
    pub companion_dir: String,
    pub companion_extension: String,
}

impl Default for DirectoryLayout {
    fn default() -> Self {
        Self {
            page_dir: "html".into(),
            page_extension: "html".into(),
            sidecar_dir: "csv".into(),
            sidecar_extension: "csv".into(),
            companion_dir: "pdf".into(),
            companion_extension: "pdf".into(),
        }
    }
}

/// Settings passed to the orchestrator at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Directory that receives batch artifacts.
    pub output_dir: PathBuf,
    /// Corpus root holding one directory per source tag.
    pub data_root: Option<PathBuf>,
    /// Upper bound for each per-field presence wait.
    pub wait_timeout_ms: u64,
    /// Number of worker threads used by batch runs.
    pub workers: usize,
    /// Treat a missing companion artifact as an invalid page handle.
    pub require_companion: bool,
    pub layout: DirectoryLayout,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            data_root: None,
            wait_timeout_ms: 200,
            workers: 1,
            require_companion: false,
            layout: DirectoryLayout::default(),
        }
    }
}

impl ExtractConfig {
    /// Load a config from a JSON file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, GroundtruthError> {
        let content = std::fs::read_to_string(path).map_err(|e| GroundtruthError::ConfigLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config: ExtractConfig =
            serde_json::from_str(&content).map_err(|e| GroundtruthError::ConfigLoad {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<(), GroundtruthError> {
        if self.workers == 0 {
            return Err(GroundtruthError::ConfigLoad {
                path: path.to_path_buf(),
                reason: "workers must be at least 1".into(),
            });
        }
        if self.layout.page_extension.is_empty() {
            return Err(GroundtruthError::ConfigLoad {
                path: path.to_path_buf(),
                reason: "layout.page_extension must not be empty".into(),
            });
        }
        Ok(())
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    /// Page directory for a source under the configured data root.
    pub fn source_dir(&self, source: &str) -> Option<PathBuf> {
        self.data_root
            .as_ref()
            .map(|root| root.join(source).join(&self.layout.page_dir))
    }
}
