//! Chunked, retrying issue classification against the tracker.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use crate::checkpoint;
use crate::domain::{ClassificationMap, IssueId, Result, Visibility};
use crate::engine::EngineProfile;
use crate::retry::{with_retry, Sleeper};
use crate::tracker::{BulkResponse, IssueTracker, FAULT_ACCESS_DENIED};

/// Issue IDs queried per bulk-fetch request.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Pacing delay between chunks; retry backoff is twice this.
pub const DEFAULT_SLEEP_TIME: Duration = Duration::from_secs(30);

/// Totals reported after a classification run.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClassifySummary {
    pub chunks: usize,
    pub public: usize,
    pub private: usize,
}

/// Drives bulk classification: partitions IDs into chunks, queries each
/// chunk with bounded retry, interprets the response, and checkpoints each
/// chunk's result before moving on.
pub struct IssueClassifier<'a> {
    tracker: &'a dyn IssueTracker,
    sleeper: &'a dyn Sleeper,
    chunk_size: usize,
    sleep_time: Duration,
    retry: u32,
}

impl<'a> IssueClassifier<'a> {
    pub fn new(tracker: &'a dyn IssueTracker, sleeper: &'a dyn Sleeper) -> IssueClassifier<'a> {
        IssueClassifier {
            tracker,
            sleeper,
            chunk_size: DEFAULT_CHUNK_SIZE,
            sleep_time: DEFAULT_SLEEP_TIME,
            retry: 0,
        }
    }

    /// Number of additional attempts per chunk after the first failure.
    pub fn with_retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk size must be positive");
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_sleep_time(mut self, sleep_time: Duration) -> Self {
        self.sleep_time = sleep_time;
        self
    }

    /// Classify `ids` (caller's order preserved) and write one checkpoint
    /// per chunk into `work_dir`.
    ///
    /// A chunk that keeps failing after all retries aborts the run with the
    /// underlying error; checkpoints already written remain valid, so a
    /// restart resumes from the failed chunk's range.
    pub fn run(
        &self,
        ids: &[IssueId],
        work_dir: &Path,
        engine: &EngineProfile,
    ) -> Result<ClassifySummary> {
        self.tracker.clear_cached_auth()?;

        let mut summary = ClassifySummary::default();
        for chunk in ids.chunks(self.chunk_size) {
            let (first, last) = (chunk[0], chunk[chunk.len() - 1]);
            info!(
                count = chunk.len(),
                first, last, "querying issue tracker for chunk"
            );

            let response = with_retry(self.retry, 2 * self.sleep_time, self.sleeper, || {
                self.tracker.fetch_bulk(chunk)
            })?;
            let classified = classify_response(&response, engine);

            let public = classified
                .values()
                .filter(|v| **v == Visibility::Public)
                .count();
            let private = classified.len() - public;
            info!(public, private, "classified security issue IDs in chunk");
            summary.chunks += 1;
            summary.public += public;
            summary.private += private;

            checkpoint::write_chunk(
                &checkpoint::chunk_path(work_dir, engine.name(), first, last),
                &classified,
            )?;

            debug!(secs = self.sleep_time.as_secs(), "pacing before next chunk");
            self.sleeper.sleep(self.sleep_time);
        }
        Ok(summary)
    }
}

/// Three-way interpretation of a bulk response:
/// faults with code 102 are `private`; readable records passing the engine's
/// public-security predicate are `public`; everything else is dropped from
/// the output entirely. Drops are deliberate exclusions (resolved-invalid
/// issues, duplicates, unrelated permission faults), not errors.
fn classify_response(response: &BulkResponse, engine: &EngineProfile) -> ClassificationMap {
    let mut classified = ClassificationMap::new();
    for fault in &response.faults {
        if fault.fault_code == FAULT_ACCESS_DENIED {
            classified.insert(fault.id, Visibility::Private);
        } else {
            debug!(
                issue_id = fault.id,
                fault_code = fault.fault_code,
                "dropping issue with non-access-denied fault"
            );
        }
    }
    for bug in &response.bugs {
        if engine.is_public(bug) {
            classified.insert(bug.id, Visibility::Public);
        } else {
            debug!(issue_id = bug.id, "dropping readable non-security issue");
        }
    }
    classified
}
