//! Domain model: commits, issue visibility, and the output dataset.
//!
//! Serde field names are declared in alphabetical order of their serialized
//! names so that struct output matches the sorted-keys contract of the JSON
//! dumper without a post-processing pass.

pub mod error;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use error::{Result, SechistError};

/// Issue-tracker ID. Positive integer, unique within one tracker instance.
pub type IssueId = u64;

/// Visibility of a security issue on the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Issue record is readable and matched the engine's public-security
    /// predicate.
    Public,
    /// Tracker refused access (fault code 102), taken as a proxy for a
    /// privately-marked security issue.
    Private,
}

/// Mapping from referenced issue IDs to their visibility. Absence of an ID
/// means it was never classified as security-related.
pub type ClassificationMap = BTreeMap<IssueId, Visibility>;

/// Name and email of a commit author or committer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
    pub name: String,
}

/// A single commit as read from version control. Never mutated.
#[derive(Debug, Clone)]
pub struct CommitInfo {
    pub id: String,
    pub authored: DateTime<Utc>,
    pub committed: DateTime<Utc>,
    pub author: Identity,
    pub committer: Identity,
    pub message: String,
}

/// Format commit timestamps the way they appear in the output dataset.
pub fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S%:z").to_string()
}

/// One security-relevant commit in the output dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityCommit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<Identity>,

    #[serde(rename = "authored-date")]
    pub authored_date: String,

    #[serde(rename = "committed-date")]
    pub committed_date: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub committer: Option<Identity>,

    /// Commit hash.
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// The classified subset of issue IDs this commit references.
    #[serde(rename = "security-issue-ids")]
    pub security_issue_ids: ClassificationMap,
}

impl SecurityCommit {
    /// Build a record from a scanned commit and the classified subset of the
    /// issue IDs its message references. `extended` additionally copies the
    /// author/committer identities and the raw message.
    pub fn from_commit(commit: &CommitInfo, issues: ClassificationMap, extended: bool) -> Self {
        SecurityCommit {
            author: extended.then(|| commit.author.clone()),
            authored_date: format_datetime(commit.authored),
            committed_date: format_datetime(commit.committed),
            committer: extended.then(|| commit.committer.clone()),
            id: commit.id.clone(),
            message: extended.then(|| commit.message.clone()),
            security_issue_ids: issues,
        }
    }
}

/// Dataset-level metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetMetadata {
    #[serde(rename = "committed-after", skip_serializing_if = "Option::is_none")]
    pub committed_after: Option<String>,

    #[serde(rename = "committed-before", skip_serializing_if = "Option::is_none")]
    pub committed_before: Option<String>,

    /// Tool name and version that produced the dataset.
    pub generator: String,

    #[serde(rename = "issue-tracker")]
    pub issue_tracker: String,

    pub project: String,

    /// First configured URL of the repository's origin remote.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
}

/// The final output artifact: metadata plus security commits in
/// chronological order, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub commits: Vec<SecurityCommit>,
    pub metadata: DatasetMetadata,
}
