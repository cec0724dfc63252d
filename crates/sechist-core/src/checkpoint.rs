//! Filesystem checkpoint artifacts.
//!
//! Each phase is a pure function from (checkpoint files + external queries)
//! to new checkpoint files; nothing is held in memory across phases. Files
//! are created by one phase and consumed, never mutated, by the next:
//!
//! - `{engine}_issue_ids.json` — sorted ID array written by collect.
//! - `{engine}_sec_issue_ids_{first}_{last}.json` — per-chunk classification
//!   maps written by identify, keyed by the chunk's first and last input ID.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::domain::{ClassificationMap, IssueId, Result, SechistError};

pub fn issue_ids_path(work_dir: &Path, engine: &str) -> PathBuf {
    work_dir.join(format!("{engine}_issue_ids.json"))
}

pub fn chunk_path(work_dir: &Path, engine: &str, first: IssueId, last: IssueId) -> PathBuf {
    work_dir.join(format!("{engine}_sec_issue_ids_{first}_{last}.json"))
}

/// Write the collected ID list, creating the work directory if absent.
pub fn write_issue_ids(work_dir: &Path, engine: &str, ids: &[IssueId]) -> Result<()> {
    fs::create_dir_all(work_dir)?;
    let json = serde_json::to_string_pretty(ids)?;
    fs::write(issue_ids_path(work_dir, engine), json)?;
    Ok(())
}

/// Load the collected ID list written by the collect phase.
pub fn load_issue_ids(work_dir: &Path, engine: &str) -> Result<Vec<IssueId>> {
    let path = issue_ids_path(work_dir, engine);
    let raw = fs::read_to_string(&path)
        .map_err(|e| SechistError::malformed(&path, format!("unreadable: {e}")))?;
    serde_json::from_str(&raw)
        .map_err(|e| SechistError::malformed(&path, format!("not a JSON ID array: {e}")))
}

/// Write one chunk's classification map. Integer keys serialize as strings,
/// which is the published artifact format.
pub fn write_chunk(path: &Path, classified: &ClassificationMap) -> Result<()> {
    let json = serde_json::to_string_pretty(classified)?;
    fs::write(path, json)?;
    Ok(())
}

/// Merge every chunk checkpoint for `engine` in `work_dir` into one map.
///
/// Chunks are disjoint by construction, so the merge tolerates any subset of
/// files being present and any filesystem order. A key seen in more than one
/// file is last-writer-wins and reported as a warning, since it indicates
/// stale chunks from a differently-bounded earlier run.
pub fn merge_classifications(work_dir: &Path, engine: &str) -> Result<ClassificationMap> {
    let pattern = work_dir
        .join(format!("{engine}_sec_issue_ids_*.json"))
        .display()
        .to_string();
    let mut paths: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| SechistError::malformed(&pattern, e.to_string()))?
        .filter_map(|entry| entry.ok())
        .collect();
    paths.sort();

    let mut merged = ClassificationMap::new();
    for path in &paths {
        let raw = fs::read_to_string(path)
            .map_err(|e| SechistError::malformed(path, format!("unreadable: {e}")))?;
        let chunk: BTreeMap<IssueId, crate::domain::Visibility> = serde_json::from_str(&raw)
            .map_err(|e| SechistError::malformed(path, format!("not a classification map: {e}")))?;
        for (id, visibility) in chunk {
            if merged.insert(id, visibility).is_some() {
                warn!(
                    issue_id = id,
                    file = %path.display(),
                    "issue ID present in more than one chunk checkpoint; \
                     later file wins (stale chunks from an earlier run?)"
                );
            }
        }
    }
    Ok(merged)
}
