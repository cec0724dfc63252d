//! Error taxonomy for the mining pipeline.

use std::path::PathBuf;

/// Errors produced by the mining phases.
///
/// Repository and checkpoint failures are local and deterministic; they are
/// surfaced immediately. Tracker query failures are the only errors that get
/// bounded retry before escalation (see [`crate::retry::with_retry`]).
#[derive(Debug, thiserror::Error)]
pub enum SechistError {
    #[error("repository error: {0}")]
    Repository(String),

    #[error("tracker query failed: {0}")]
    TrackerQuery(String),

    #[error("malformed checkpoint {path}: {reason}")]
    MalformedCheckpoint { path: PathBuf, reason: String },

    #[error("invalid date: {0} (expected YYYY-MM-DD [HH[:MM[:SS]]])")]
    InvalidDate(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("yaml serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SechistError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        SechistError::MalformedCheckpoint {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for mining operations.
pub type Result<T> = std::result::Result<T, SechistError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SechistError::Repository("branch 'master' not found".to_string());
        assert!(err.to_string().contains("repository error"));

        let err = SechistError::TrackerQuery("connection reset".to_string());
        assert!(err.to_string().contains("tracker query failed"));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_malformed_checkpoint_names_path() {
        let err = SechistError::malformed("/work/firefox_issue_ids.json", "not a JSON array");
        let msg = err.to_string();
        assert!(msg.contains("firefox_issue_ids.json"));
        assert!(msg.contains("not a JSON array"));
    }
}
