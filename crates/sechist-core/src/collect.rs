//! Phase 1: collect unique issue IDs referenced in commit messages.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::checkpoint;
use crate::domain::{IssueId, Result};
use crate::engine::EngineProfile;
use crate::scan::{CommitScanner, DateWindow};

/// Scan statistics reported after a collect run.
#[derive(Debug, Default, Clone)]
pub struct CollectSummary {
    pub commit_count: usize,
    pub unique_ids: usize,
    pub first_committed: Option<DateTime<Utc>>,
    pub last_committed: Option<DateTime<Utc>>,
}

/// Scan the date window, union the extracted issue IDs of every commit,
/// subtract the engine denylist, and checkpoint the sorted result as
/// `{engine}_issue_ids.json`.
pub fn run(
    scanner: &CommitScanner,
    engine: &EngineProfile,
    window: &DateWindow,
    work_dir: &Path,
) -> Result<CollectSummary> {
    info!(engine = engine.name(), "collecting issue IDs from git log");

    let mut ids: BTreeSet<IssueId> = BTreeSet::new();
    let mut summary = CollectSummary::default();

    for commit in scanner.commits(window)? {
        let commit = commit?;
        ids.extend(engine.extract_issue_ids(&commit.message));

        summary.commit_count += 1;
        summary.first_committed = Some(match summary.first_committed {
            Some(first) => first.min(commit.committed),
            None => commit.committed,
        });
        summary.last_committed = Some(match summary.last_committed {
            Some(last) => last.max(commit.committed),
            None => commit.committed,
        });
    }

    ids.retain(|id| !engine.is_denylisted(*id));
    summary.unique_ids = ids.len();

    info!(
        commits = summary.commit_count,
        first = ?summary.first_committed,
        last = ?summary.last_committed,
        "processed commit history"
    );
    info!(count = summary.unique_ids, "found unique issue IDs");

    let sorted: Vec<IssueId> = ids.into_iter().collect();
    checkpoint::write_issue_ids(work_dir, engine.name(), &sorted)?;
    Ok(summary)
}
