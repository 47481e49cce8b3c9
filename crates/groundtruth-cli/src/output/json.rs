use groundtruth_core::error::GroundtruthError;
use groundtruth_core::model::{ExtractedRecord, Shape};

pub fn print_record(
    record: &mut ExtractedRecord,
    shape: Shape,
    show_trace: bool,
) -> Result<(), GroundtruthError> {
    let line = record.serialize(shape)?;
    let value: serde_json::Value = serde_json::from_str(&line)?;

    let json = if show_trace {
        serde_json::to_string_pretty(&serde_json::json!({
            "record": value,
            "trace": record.trace,
        }))?
    } else {
        serde_json::to_string_pretty(&value)?
    };
    println!("{json}");
    Ok(())
}
