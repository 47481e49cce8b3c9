use groundtruth_core::model::Shape;
use groundtruth_core::Orchestrator;
use std::path::PathBuf;

use crate::output;

pub fn run(
    source: &str,
    input: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    shape: &str,
    workers: Option<usize>,
    config: Option<PathBuf>,
) -> Result<(), groundtruth_core::error::GroundtruthError> {
    let mut config = super::load_config(config)?;

    // Flags override the config file.
    if let Some(out_dir) = out_dir {
        config.output_dir = out_dir;
    }
    if let Some(workers) = workers {
        config.workers = workers.max(1);
    }

    let shape = Shape::from_name(shape).unwrap_or_default();
    let orchestrator = Orchestrator::with_defaults(config);
    let summary = orchestrator.run_batch(source, input.as_deref(), shape)?;

    output::table::print_batch_summary(&summary);
    Ok(())
}
