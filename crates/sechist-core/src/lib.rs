//! sechist core library
//!
//! Mines a browser engine's git history and its Bugzilla issue tracker to
//! produce a dataset of security-relevant commits, in three re-runnable
//! phases connected by filesystem checkpoint artifacts:
//!
//! 1. [`collect`] — scan commit messages for issue-ID references.
//! 2. [`identify`] — classify the collected IDs against the tracker in
//!    bounded, paced, retrying chunks.
//! 3. [`matching`] — merge the classifications, re-scan the history, and
//!    write the final dataset.

pub mod checkpoint;
pub mod classify;
pub mod collect;
pub mod domain;
pub mod engine;
pub mod identify;
pub mod matching;
pub mod output;
pub mod retry;
pub mod scan;
pub mod telemetry;
pub mod tracker;

pub use classify::{ClassifySummary, IssueClassifier, DEFAULT_CHUNK_SIZE, DEFAULT_SLEEP_TIME};
pub use collect::CollectSummary;
pub use domain::{
    ClassificationMap, CommitInfo, Dataset, DatasetMetadata, Identity, IssueId, Result,
    SechistError, SecurityCommit, Visibility,
};
pub use engine::EngineProfile;
pub use matching::{MatchOptions, MatchSummary};
pub use output::OutputFormat;
pub use retry::{with_retry, Sleeper, ThreadSleeper};
pub use scan::{parse_datetime, CommitScanner, DateWindow};
pub use telemetry::init_tracing;
pub use tracker::{BulkResponse, IssueFault, IssueFields, IssueTracker, RestTracker};

/// sechist version, embedded in dataset metadata.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
