use groundtruth_core::model::Shape;
use groundtruth_core::Orchestrator;
use std::path::PathBuf;

use crate::output;

pub fn run(
    page: PathBuf,
    source: &str,
    output_format: &str,
    shape: &str,
    show_trace: bool,
    config: Option<PathBuf>,
) -> Result<(), groundtruth_core::error::GroundtruthError> {
    let config = super::load_config(config)?;
    let orchestrator = Orchestrator::with_defaults(config);
    tracing::debug!(renderer = orchestrator.renderer_name(), "extracting {}", page.display());

    let mut record = orchestrator.extract_page(source, &page)?;

    match output_format {
        "json" => {
            let shape = Shape::from_name(shape).unwrap_or_default();
            output::json::print_record(&mut record, shape, show_trace)?
        }
        _ => output::table::print_record(&record, show_trace),
    }

    Ok(())
}
