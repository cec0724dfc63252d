//! End-to-end pipeline test: collect -> identify -> match over a scratch
//! git repository and a fake issue tracker.

use std::cell::RefCell;
use std::path::Path;
use std::time::Duration;

use git2::{Oid, Repository, RepositoryInitOptions, Signature, Time};
use sechist_core::{
    checkpoint, collect, identify, matching, parse_datetime, BulkResponse, CommitScanner, Dataset,
    DateWindow, EngineProfile, IssueClassifier, IssueFault, IssueFields, IssueId, IssueTracker,
    MatchOptions, OutputFormat, Sleeper, Visibility,
};

const T1: i64 = 1_560_000_000; // oldest commit
const T2: i64 = T1 + 86_400;
const T3: i64 = T1 + 2 * 86_400; // newest commit

struct NoopSleeper;

impl Sleeper for NoopSleeper {
    fn sleep(&self, _duration: Duration) {}
}

/// Fake tracker for the 3-commit scenario: 100 is a readable security
/// issue, 300 is access-denied, 200 is readable but not security-related.
struct FakeTracker {
    requests: RefCell<Vec<Vec<IssueId>>>,
}

impl FakeTracker {
    fn new() -> Self {
        FakeTracker {
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl IssueTracker for FakeTracker {
    fn fetch_bulk(&self, ids: &[IssueId]) -> sechist_core::Result<BulkResponse> {
        self.requests.borrow_mut().push(ids.to_vec());
        let mut response = BulkResponse::default();
        for id in ids {
            match id {
                100 => response.bugs.push(IssueFields {
                    id: 100,
                    product: "Core".to_string(),
                    component: "Security: Memory Safety".to_string(),
                }),
                200 => response.bugs.push(IssueFields {
                    id: 200,
                    product: "Core".to_string(),
                    component: "Layout".to_string(),
                }),
                300 => response.faults.push(IssueFault {
                    id: 300,
                    fault_code: 102,
                }),
                _ => {} // unknown IDs appear in neither list
            }
        }
        Ok(response)
    }

    fn clear_cached_auth(&self) -> sechist_core::Result<()> {
        Ok(())
    }
}

fn scratch_repo(dir: &Path) -> Repository {
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("master");
    let repo = Repository::init_opts(dir, &opts).unwrap();
    repo.remote("origin", "https://example.org/engine.git")
        .unwrap();
    repo
}

fn add_commit(repo: &Repository, message: &str, when: i64, parent: Option<Oid>) -> Oid {
    let sig = Signature::new("Alice Dev", "alice@example.org", &Time::new(when, 0)).unwrap();
    let tree_id = repo.index().unwrap().write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let parent_commit = parent.map(|oid| repo.find_commit(oid).unwrap());
    let parents: Vec<_> = parent_commit.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap()
}

/// C1 references 100, C2 references 200, C3 references 100 and 300.
fn three_commit_history(dir: &Path) -> Repository {
    let repo = scratch_repo(dir);
    let c1 = add_commit(&repo, "Bug 100 - fix use-after-free in parser", T1, None);
    let c2 = add_commit(&repo, "bug 200 - refactor layout code", T2, Some(c1));
    add_commit(
        &repo,
        "Bug 100 follow-up, also addresses bug 300",
        T3,
        Some(c2),
    );
    repo
}

#[test]
fn test_full_pipeline_three_commit_example() {
    let repo_dir = tempfile::tempdir().unwrap();
    let work_dir = tempfile::tempdir().unwrap();
    three_commit_history(repo_dir.path());

    let engine = EngineProfile::firefox();
    let scanner = CommitScanner::open(repo_dir.path(), "master").unwrap();
    let window = DateWindow::default();

    // Phase 1: collect.
    let summary = collect::run(&scanner, &engine, &window, work_dir.path()).unwrap();
    assert_eq!(summary.commit_count, 3);
    assert_eq!(summary.unique_ids, 3);
    assert_eq!(
        checkpoint::load_issue_ids(work_dir.path(), "firefox").unwrap(),
        vec![100, 200, 300]
    );

    // Phase 2: identify.
    let tracker = FakeTracker::new();
    let sleeper = NoopSleeper;
    let classifier = IssueClassifier::new(&tracker, &sleeper);
    let summary = identify::run(&classifier, &engine, work_dir.path(), None, None).unwrap();
    assert_eq!(summary.chunks, 1);
    assert_eq!(summary.public, 1);
    assert_eq!(summary.private, 1);
    assert_eq!(*tracker.requests.borrow(), vec![vec![100, 200, 300]]);

    // Phase 3: match.
    let summary = matching::run(
        &scanner,
        &engine,
        work_dir.path(),
        &MatchOptions::default(),
    )
    .unwrap();
    assert_eq!(summary.commit_count, 2);

    let raw = std::fs::read_to_string(&summary.output_path).unwrap();
    let dataset: Dataset = serde_json::from_str(&raw).unwrap();

    // C2 references only the unclassified issue 200 and is omitted; the
    // remaining records are chronological, oldest first.
    assert_eq!(dataset.commits.len(), 2);
    let c1 = &dataset.commits[0];
    let c3 = &dataset.commits[1];
    assert!(c1.committed_date < c3.committed_date);
    assert_eq!(
        c1.security_issue_ids,
        [(100, Visibility::Public)].into_iter().collect()
    );
    assert_eq!(
        c3.security_issue_ids,
        [(100, Visibility::Public), (300, Visibility::Private)]
            .into_iter()
            .collect()
    );

    // Plain mode omits details.
    assert!(c1.author.is_none());
    assert!(c1.message.is_none());

    assert_eq!(dataset.metadata.project, "firefox");
    assert_eq!(dataset.metadata.issue_tracker, "https://bugzilla.mozilla.org");
    assert_eq!(
        dataset.metadata.repository.as_deref(),
        Some("https://example.org/engine.git")
    );
    assert!(dataset.metadata.generator.starts_with("sechist "));
    assert!(dataset.metadata.committed_before.is_none());
}

#[test]
fn test_date_window_bounds_collect_and_match() {
    let repo_dir = tempfile::tempdir().unwrap();
    let work_dir = tempfile::tempdir().unwrap();
    three_commit_history(repo_dir.path());

    let engine = EngineProfile::firefox();
    let scanner = CommitScanner::open(repo_dir.path(), "master").unwrap();

    // Window strictly between C1 and C3: both boundary commits excluded.
    let window = DateWindow {
        after: Some(chrono::DateTime::from_timestamp(T1, 0).unwrap()),
        before: Some(chrono::DateTime::from_timestamp(T3, 0).unwrap()),
    };

    let summary = collect::run(&scanner, &engine, &window, work_dir.path()).unwrap();
    assert_eq!(summary.commit_count, 1);
    assert_eq!(
        checkpoint::load_issue_ids(work_dir.path(), "firefox").unwrap(),
        vec![200]
    );
}

#[test]
fn test_denylisted_ids_never_reach_collect_output() {
    let repo_dir = tempfile::tempdir().unwrap();
    let work_dir = tempfile::tempdir().unwrap();
    let repo = scratch_repo(repo_dir.path());
    // 191053 is on the firefox denylist.
    add_commit(&repo, "Bug 191053 and Bug 42 touched together", T1, None);

    let engine = EngineProfile::firefox();
    let scanner = CommitScanner::open(repo_dir.path(), "master").unwrap();
    collect::run(&scanner, &engine, &DateWindow::default(), work_dir.path()).unwrap();

    assert_eq!(
        checkpoint::load_issue_ids(work_dir.path(), "firefox").unwrap(),
        vec![42]
    );
}

#[test]
fn test_extended_match_includes_commit_details() {
    let repo_dir = tempfile::tempdir().unwrap();
    let work_dir = tempfile::tempdir().unwrap();
    three_commit_history(repo_dir.path());

    let engine = EngineProfile::firefox();
    let scanner = CommitScanner::open(repo_dir.path(), "master").unwrap();
    collect::run(&scanner, &engine, &DateWindow::default(), work_dir.path()).unwrap();

    let tracker = FakeTracker::new();
    let sleeper = NoopSleeper;
    let classifier = IssueClassifier::new(&tracker, &sleeper);
    identify::run(&classifier, &engine, work_dir.path(), None, None).unwrap();

    let options = MatchOptions {
        extended: true,
        format: OutputFormat::Yaml,
        ..MatchOptions::default()
    };
    let summary = matching::run(&scanner, &engine, work_dir.path(), &options).unwrap();
    assert!(summary.output_path.ends_with("firefox_sec_commits.yaml"));

    let raw = std::fs::read_to_string(&summary.output_path).unwrap();
    let dataset: Dataset = serde_yaml::from_str(&raw).unwrap();
    let first = &dataset.commits[0];
    assert_eq!(first.author.as_ref().unwrap().name, "Alice Dev");
    assert_eq!(first.committer.as_ref().unwrap().email, "alice@example.org");
    assert_eq!(
        first.message.as_deref(),
        Some("Bug 100 - fix use-after-free in parser")
    );
}

#[test]
fn test_missing_branch_is_repository_error() {
    let repo_dir = tempfile::tempdir().unwrap();
    three_commit_history(repo_dir.path());
    let Err(err) = CommitScanner::open(repo_dir.path(), "release") else {
        panic!("open should fail for a missing branch");
    };
    assert!(err.to_string().contains("release"));
}

#[test]
fn test_identify_id_bounds_restrict_queries() {
    let repo_dir = tempfile::tempdir().unwrap();
    let work_dir = tempfile::tempdir().unwrap();
    three_commit_history(repo_dir.path());

    let engine = EngineProfile::firefox();
    let scanner = CommitScanner::open(repo_dir.path(), "master").unwrap();
    collect::run(&scanner, &engine, &DateWindow::default(), work_dir.path()).unwrap();

    let tracker = FakeTracker::new();
    let sleeper = NoopSleeper;
    let classifier = IssueClassifier::new(&tracker, &sleeper);
    identify::run(&classifier, &engine, work_dir.path(), Some(150), Some(250)).unwrap();
    assert_eq!(*tracker.requests.borrow(), vec![vec![200]]);
}

#[test]
fn test_parse_datetime_feeds_window_as_utc() {
    let dt = parse_datetime("2019-06-08 13:20:00").unwrap();
    assert_eq!(dt.timestamp(), T1);
}
