//! Phase 2: identify security issue IDs by querying the tracker.

use std::path::Path;

use tracing::info;

use crate::checkpoint;
use crate::classify::{ClassifySummary, IssueClassifier};
use crate::domain::{IssueId, Result};
use crate::engine::EngineProfile;

/// Load the collected ID checkpoint, apply the optional inclusive
/// `[from_id, to_id]` bound, and run the classifier over the result.
pub fn run(
    classifier: &IssueClassifier<'_>,
    engine: &EngineProfile,
    work_dir: &Path,
    from_id: Option<IssueId>,
    to_id: Option<IssueId>,
) -> Result<ClassifySummary> {
    info!(engine = engine.name(), "loading collected issue IDs");
    let mut ids = checkpoint::load_issue_ids(work_dir, engine.name())?;
    log_span("found", &ids);

    if from_id.is_some() || to_id.is_some() {
        if let Some(from_id) = from_id {
            ids.retain(|id| *id >= from_id);
        }
        if let Some(to_id) = to_id {
            ids.retain(|id| *id <= to_id);
        }
        log_span("bounded list has", &ids);
    }

    classifier.run(&ids, work_dir, engine)
}

fn log_span(what: &str, ids: &[IssueId]) {
    info!(
        count = ids.len(),
        first = ids.first().copied(),
        last = ids.last().copied(),
        "{what} issue IDs"
    );
}
