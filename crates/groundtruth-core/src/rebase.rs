use crate::error::GroundtruthError;
use serde_json::Value;
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};

const REBASED_SUFFIX: &str = "_new.jsonl";
const CHECKPOINT_MARKER: &str = "ipynb_checkpoints";

/// One batch artifact rewritten onto a new storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebasedArtifact {
    pub original: PathBuf,
    pub rebased: PathBuf,
    pub records: usize,
    /// Notebook checkpoint records that were dropped.
    pub dropped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceOutcome {
    Replaced { original: PathBuf },
    NoRebasedVersion { original: PathBuf },
    Mismatch { original: PathBuf, rebased: PathBuf },
}

fn rebase_error(path: &Path, reason: impl Into<String>) -> GroundtruthError {
    GroundtruthError::Rebase {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Rewrite the `path` of every record in each batch artifact of `batch_dir`
/// to `<new_root>/<last three components of the old path>` and write the
/// result next to it as `<stem>_new.jsonl`.
///
/// An artifact is only written once every rewritten path exists.
pub fn rebase_batches(batch_dir: &Path, new_root: &Path) -> Result<Vec<RebasedArtifact>, GroundtruthError> {
    if !new_root.is_dir() {
        return Err(rebase_error(new_root, "new root is not a directory"));
    }
    let artifacts = batch_artifacts(batch_dir)?;
    if artifacts.is_empty() {
        return Err(rebase_error(batch_dir, "no .jsonl batch artifacts found"));
    }

    artifacts
        .iter()
        .map(|artifact| rebase_artifact(artifact, new_root))
        .collect()
}

fn rebase_artifact(artifact: &Path, new_root: &Path) -> Result<RebasedArtifact, GroundtruthError> {
    let mut output = String::new();
    let mut records = 0;
    let mut dropped = 0;

    for mut record in read_records(artifact)? {
        let old_path = record_path(&record).to_string();
        if old_path.contains(CHECKPOINT_MARKER) {
            dropped += 1;
            continue;
        }

        let new_path = rebased_path(&old_path, new_root).ok_or_else(|| {
            rebase_error(artifact, format!("cannot rebase '{old_path}': fewer than three path components"))
        })?;
        if !new_path.exists() {
            return Err(rebase_error(
                artifact,
                format!("{} does not exist", new_path.display()),
            ));
        }

        let Some(object) = record.as_object_mut() else {
            return Err(rebase_error(artifact, "record is not a JSON object"));
        };
        object.insert("path".into(), Value::String(new_path.display().to_string()));

        output.push_str(&serde_json::to_string(&record)?);
        output.push('\n');
        records += 1;
    }

    let rebased = rebased_name(artifact);
    std::fs::write(&rebased, output)?;
    info!(artifact = %rebased.display(), records, dropped, "wrote rebased artifact");

    Ok(RebasedArtifact {
        original: artifact.to_path_buf(),
        rebased,
        records,
        dropped,
    })
}

/// Replace each artifact by its `_new` version when both hold the same
/// records apart from `path`.
pub fn replace_with_rebased(batch_dir: &Path) -> Result<Vec<ReplaceOutcome>, GroundtruthError> {
    let mut outcomes = Vec::new();

    for original in batch_artifacts(batch_dir)? {
        let rebased = rebased_name(&original);
        if !rebased.is_file() {
            warn!(artifact = %original.display(), "no rebased version");
            outcomes.push(ReplaceOutcome::NoRebasedVersion { original });
            continue;
        }

        if same_records(&original, &rebased)? {
            std::fs::rename(&rebased, &original)?;
            info!(artifact = %original.display(), "replaced with rebased version");
            outcomes.push(ReplaceOutcome::Replaced { original });
        } else {
            warn!(
                artifact = %original.display(),
                "rebased version differs outside `path`; keeping both"
            );
            outcomes.push(ReplaceOutcome::Mismatch { original, rebased });
        }
    }

    Ok(outcomes)
}

/// `<new_root>/<a>/<b>/<c>` for an old path ending in `<a>/<b>/<c>`.
pub fn rebased_path(old_path: &str, new_root: &Path) -> Option<PathBuf> {
    let parts: Vec<&std::ffi::OsStr> = Path::new(old_path)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();
    if parts.len() < 3 {
        return None;
    }
    let mut path = new_root.to_path_buf();
    path.extend(&parts[parts.len() - 3..]);
    Some(path)
}

fn same_records(original: &Path, rebased: &Path) -> Result<bool, GroundtruthError> {
    let old: Vec<Value> = read_records(original)?
        .into_iter()
        .filter(|r| !record_path(r).contains(CHECKPOINT_MARKER))
        .collect();
    let new = read_records(rebased)?;

    if old.len() != new.len() {
        return Ok(false);
    }
    Ok(old
        .into_iter()
        .zip(new)
        .all(|(a, b)| without_path(a) == without_path(b)))
}

fn without_path(mut record: Value) -> Value {
    if let Some(object) = record.as_object_mut() {
        object.remove("path");
    }
    record
}

fn record_path(record: &Value) -> &str {
    record.get("path").and_then(Value::as_str).unwrap_or_default()
}

fn read_records(artifact: &Path) -> Result<Vec<Value>, GroundtruthError> {
    let content = std::fs::read_to_string(artifact)?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line)
                .map_err(|e| rebase_error(artifact, format!("line {}: {e}", idx + 1)))
        })
        .collect()
}

fn rebased_name(artifact: &Path) -> PathBuf {
    let stem = artifact
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    artifact.with_file_name(format!("{stem}{REBASED_SUFFIX}"))
}

/// Batch artifacts of a directory, sorted, excluding rebased versions.
fn batch_artifacts(dir: &Path) -> Result<Vec<PathBuf>, GroundtruthError> {
    if !dir.is_dir() {
        return Err(rebase_error(dir, "batch directory does not exist"));
    }
    let mut artifacts = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_artifact = path.is_file()
            && path.extension().is_some_and(|ext| ext == "jsonl")
            && !path
                .file_name()
                .is_some_and(|name| name.to_string_lossy().ends_with(REBASED_SUFFIX));
        if is_artifact {
            artifacts.push(path);
        }
    }
    artifacts.sort();
    Ok(artifacts)
}
