use groundtruth_core::rebase::{rebase_batches, replace_with_rebased, ReplaceOutcome};
use std::path::Path;

pub fn run(
    batch_dir: &Path,
    new_root: &Path,
    replace: bool,
) -> Result<(), groundtruth_core::error::GroundtruthError> {
    let rebased = rebase_batches(batch_dir, new_root)?;
    for artifact in &rebased {
        println!(
            "{} -> {} ({} record(s), {} checkpoint record(s) dropped)",
            artifact.original.display(),
            artifact.rebased.display(),
            artifact.records,
            artifact.dropped
        );
    }

    if !replace {
        return Ok(());
    }

    for outcome in replace_with_rebased(batch_dir)? {
        match outcome {
            ReplaceOutcome::Replaced { original } => {
                println!("replaced {}", original.display())
            }
            ReplaceOutcome::NoRebasedVersion { original } => {
                eprintln!("  no rebased version of {}", original.display())
            }
            ReplaceOutcome::Mismatch { original, rebased } => eprintln!(
                "  {} and {} differ outside `path`; kept both",
                original.display(),
                rebased.display()
            ),
        }
    }
    Ok(())
}
