pub mod batch;
pub mod extract;
pub mod rebase;
pub mod sources;

use groundtruth_core::error::GroundtruthError;
use groundtruth_core::ExtractConfig;
use std::path::PathBuf;

/// Config from `--config`, or defaults when no file is given.
fn load_config(path: Option<PathBuf>) -> Result<ExtractConfig, GroundtruthError> {
    match path {
        Some(path) => ExtractConfig::load(&path),
        None => Ok(ExtractConfig::default()),
    }
}
