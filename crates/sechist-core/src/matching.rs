//! Phase 3: match classified issue IDs back to commits and write the
//! final dataset.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::checkpoint;
use crate::domain::{
    format_datetime, ClassificationMap, Dataset, DatasetMetadata, Result, SecurityCommit,
};
use crate::engine::EngineProfile;
use crate::output::{self, OutputFormat};
use crate::scan::{CommitScanner, DateWindow};

/// Options for a match run.
#[derive(Debug, Default, Clone, Copy)]
pub struct MatchOptions {
    pub window: DateWindow,
    pub format: OutputFormat,
    /// Include author/committer identities and the raw message per commit.
    pub extended: bool,
}

/// Result of a match run.
#[derive(Debug, Clone)]
pub struct MatchSummary {
    pub commit_count: usize,
    pub classified_issues: usize,
    pub output_path: PathBuf,
}

/// Merge all chunk checkpoints, re-scan the window, emit one record per
/// commit referencing at least one classified issue, and write the dataset
/// as `{engine}_sec_commits.{format}`.
pub fn run(
    scanner: &CommitScanner,
    engine: &EngineProfile,
    work_dir: &Path,
    options: &MatchOptions,
) -> Result<MatchSummary> {
    info!(engine = engine.name(), "loading identified security issue IDs");
    let sec_issues = checkpoint::merge_classifications(work_dir, engine.name())?;
    info!(count = sec_issues.len(), "found security issues");
    warn_on_stale_classifications(work_dir, engine, &sec_issues);

    info!("matching security issue IDs to commits");
    let mut commits = Vec::new();
    for commit in scanner.commits(&options.window)? {
        let commit = commit?;
        let referenced: ClassificationMap = engine
            .extract_issue_ids(&commit.message)
            .into_iter()
            .filter_map(|id| sec_issues.get(&id).map(|vis| (id, *vis)))
            .collect();
        if !referenced.is_empty() {
            commits.push(SecurityCommit::from_commit(&commit, referenced, options.extended));
        }
    }
    // Scan order is newest first; the dataset wants oldest first.
    commits.reverse();

    let metadata = DatasetMetadata {
        committed_after: options.window.after.map(format_datetime),
        committed_before: options.window.before.map(format_datetime),
        generator: format!("sechist {}", crate::VERSION),
        issue_tracker: engine.tracker_url().to_string(),
        project: engine.name().to_string(),
        repository: scanner.origin_url(),
    };

    let summary = MatchSummary {
        commit_count: commits.len(),
        classified_issues: sec_issues.len(),
        output_path: work_dir.join(format!(
            "{}_sec_commits.{}",
            engine.name(),
            options.format.extension()
        )),
    };
    output::write_dataset(&summary.output_path, options.format, &Dataset { commits, metadata })?;
    info!(
        count = summary.commit_count,
        output = %summary.output_path.display(),
        "found security-related commits"
    );
    Ok(summary)
}

/// Chunk checkpoints carry no run identifier, so stale files from an earlier
/// differently-bounded identify run merge silently. Detect the common case:
/// classified IDs that the current collect checkpoint never produced.
fn warn_on_stale_classifications(
    work_dir: &Path,
    engine: &EngineProfile,
    sec_issues: &ClassificationMap,
) {
    let Ok(collected) = checkpoint::load_issue_ids(work_dir, engine.name()) else {
        return;
    };
    let collected: HashSet<_> = collected.into_iter().collect();
    let stale = sec_issues
        .keys()
        .filter(|id| !collected.contains(id))
        .count();
    if stale > 0 {
        warn!(
            count = stale,
            "classified issue IDs not present in the collect checkpoint; \
             chunk files from an earlier run may be stale"
        );
    }
}
