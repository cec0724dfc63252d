//! Read-only commit history scanning.
//!
//! [`CommitScanner`] walks a branch newest-first and yields [`CommitInfo`]
//! records filtered by a strict half-open [`DateWindow`]. Consumers that
//! need chronological order (the final dataset) reverse at assembly time.

use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use git2::{BranchType, Repository, Sort};

use crate::domain::{CommitInfo, Identity, Result, SechistError};

/// Parse a `YYYY-MM-DD [HH[:MM[:SS]]]` string into a UTC timestamp.
///
/// Each omitted component defaults to zero, so `2019-07-01` means midnight
/// on that day.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    const FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];
    for format in FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(naive.and_utc());
        }
    }
    // chrono refuses to build a datetime from an hour without minutes, so
    // the hour-only form is completed to `HH:00` before parsing.
    if let Ok(naive) = NaiveDateTime::parse_from_str(&format!("{s}:00"), "%Y-%m-%d %H:%M") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(SechistError::InvalidDate(s.to_string()))
}

/// Optional half-open date bounds on committed timestamps.
///
/// A commit is skipped when `committed >= before` or `committed <= after`;
/// both boundary values themselves are excluded.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateWindow {
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
}

impl DateWindow {
    pub fn excludes(&self, committed: DateTime<Utc>) -> bool {
        self.before.is_some_and(|b| committed >= b) || self.after.is_some_and(|a| committed <= a)
    }
}

/// Read-only access to one branch of a git repository.
pub struct CommitScanner {
    repo: Repository,
    branch: String,
}

impl CommitScanner {
    /// Open `repo_dir` and verify that `branch` exists.
    pub fn open(repo_dir: &Path, branch: &str) -> Result<CommitScanner> {
        let repo = Repository::open(repo_dir).map_err(|e| {
            SechistError::Repository(format!(
                "cannot open repository at {}: {}",
                repo_dir.display(),
                e.message()
            ))
        })?;
        if repo.find_branch(branch, BranchType::Local).is_err() {
            return Err(SechistError::Repository(format!(
                "branch '{branch}' not found in {}",
                repo_dir.display()
            )));
        }
        Ok(CommitScanner {
            repo,
            branch: branch.to_string(),
        })
    }

    /// Lazily iterate the branch's commits, newest first, skipping any
    /// commit excluded by `window`.
    pub fn commits<'a>(
        &'a self,
        window: &'a DateWindow,
    ) -> Result<impl Iterator<Item = Result<CommitInfo>> + 'a> {
        let mut walk = self.repo.revwalk().map_err(Self::walk_error)?;
        walk.set_sorting(Sort::TIME).map_err(Self::walk_error)?;
        walk.push_ref(&format!("refs/heads/{}", self.branch))
            .map_err(Self::walk_error)?;

        Ok(walk.filter_map(move |oid| {
            let commit = oid
                .and_then(|oid| self.repo.find_commit(oid))
                .map_err(Self::walk_error);
            match commit {
                Ok(commit) => {
                    let info = commit_info(&commit);
                    (!window.excludes(info.committed)).then_some(Ok(info))
                }
                Err(e) => Some(Err(e)),
            }
        }))
    }

    /// First configured URL of the `origin` remote, if any.
    pub fn origin_url(&self) -> Option<String> {
        self.repo
            .find_remote("origin")
            .ok()
            .and_then(|remote| remote.url().map(str::to_string))
    }

    fn walk_error(e: git2::Error) -> SechistError {
        SechistError::Repository(format!("history walk failed: {}", e.message()))
    }
}

fn commit_info(commit: &git2::Commit<'_>) -> CommitInfo {
    let author = commit.author();
    let committer = commit.committer();
    CommitInfo {
        id: commit.id().to_string(),
        authored: timestamp(author.when().seconds()),
        committed: timestamp(commit.time().seconds()),
        author: identity(&author),
        committer: identity(&committer),
        message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
    }
}

fn identity(sig: &git2::Signature<'_>) -> Identity {
    Identity {
        email: sig.email().unwrap_or_default().to_string(),
        name: sig.name().unwrap_or_default().to_string(),
    }
}

fn timestamp(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds, 0).unwrap_or_default()
}
