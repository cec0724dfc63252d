//! sechist — Security Commit History mining tool
//!
//! Mines a browser engine's git history and its Bugzilla issue tracker in
//! three batch steps connected by checkpoint files in the output directory:
//!
//! - `collect`: collect unique issue IDs referenced in commit messages
//! - `identify`: identify security issue IDs by querying the issue tracker
//! - `match`: match security issue IDs to commits and write the dataset

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::Level;

use sechist_core::{
    collect, identify, init_tracing, matching, parse_datetime, CommitScanner, DateWindow,
    EngineProfile, IssueClassifier, IssueId, MatchOptions, OutputFormat, RestTracker,
    ThreadSleeper,
};

#[derive(Parser)]
#[command(name = "sechist")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Mine security-relevant commits from a browser engine's git history and issue tracker", long_about = None)]
struct Cli {
    /// Browser engine to mine (firefox, webkit)
    #[arg(short, long)]
    engine: String,

    /// Output directory for checkpoint and result files
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Step 1: collect unique issue IDs referenced in commit messages
    Collect {
        /// Directory of the engine's git repository
        #[arg(short, long)]
        repo: PathBuf,

        /// Branch to scan
        #[arg(long, default_value = "master")]
        branch: String,

        /// Only consider commits committed before this date
        /// (format: YYYY-MM-DD [HH[:MM[:SS]]], UTC)
        #[arg(long, value_parser = parse_datetime_arg)]
        before: Option<DateTime<Utc>>,

        /// Only consider commits committed after this date
        /// (format: YYYY-MM-DD [HH[:MM[:SS]]], UTC)
        #[arg(long, value_parser = parse_datetime_arg)]
        after: Option<DateTime<Utc>>,
    },

    /// Step 2: identify security issue IDs by querying the issue tracker
    Identify {
        /// Lower bound of issue IDs to query (default: first collected ID)
        #[arg(long = "from")]
        from_id: Option<IssueId>,

        /// Upper bound of issue IDs to query (default: last collected ID)
        #[arg(long = "to")]
        to_id: Option<IssueId>,

        /// Number of times to retry a failed issue tracker query
        #[arg(long, default_value_t = 0)]
        retry: u32,
    },

    /// Step 3: match security issue IDs to commits
    Match {
        /// Directory of the engine's git repository
        #[arg(short, long)]
        repo: PathBuf,

        /// Branch to scan
        #[arg(long, default_value = "master")]
        branch: String,

        /// Only consider commits committed before this date
        #[arg(long, value_parser = parse_datetime_arg)]
        before: Option<DateTime<Utc>>,

        /// Only consider commits committed after this date
        #[arg(long, value_parser = parse_datetime_arg)]
        after: Option<DateTime<Utc>>,

        /// Result format (json, yaml)
        #[arg(long, default_value = "json")]
        format: OutputFormat,

        /// Include author, committer, and commit message in the result
        #[arg(long)]
        extended: bool,
    },
}

fn parse_datetime_arg(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    parse_datetime(s).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.log_json, level);

    let engine = EngineProfile::by_name(&cli.engine).with_context(|| {
        format!(
            "unknown engine '{}' (known: {})",
            cli.engine,
            EngineProfile::known_engines().join(", ")
        )
    })?;

    match cli.command {
        Commands::Collect {
            repo,
            branch,
            before,
            after,
        } => cmd_collect(&engine, &cli.out, &repo, &branch, after, before),
        Commands::Identify {
            from_id,
            to_id,
            retry,
        } => cmd_identify(&engine, &cli.out, from_id, to_id, retry),
        Commands::Match {
            repo,
            branch,
            before,
            after,
            format,
            extended,
        } => cmd_match(
            &engine, &cli.out, &repo, &branch, after, before, format, extended,
        ),
    }
}

fn cmd_collect(
    engine: &EngineProfile,
    out: &Path,
    repo: &Path,
    branch: &str,
    after: Option<DateTime<Utc>>,
    before: Option<DateTime<Utc>>,
) -> Result<()> {
    let scanner = CommitScanner::open(repo, branch)?;
    let window = DateWindow { after, before };
    collect::run(&scanner, engine, &window, out).context("collect step failed")?;
    Ok(())
}

fn cmd_identify(
    engine: &EngineProfile,
    out: &Path,
    from_id: Option<IssueId>,
    to_id: Option<IssueId>,
    retry: u32,
) -> Result<()> {
    let tracker =
        RestTracker::new(engine.tracker_url()).context("cannot build tracker client")?;
    let sleeper = ThreadSleeper;
    let classifier = IssueClassifier::new(&tracker, &sleeper).with_retry(retry);
    identify::run(&classifier, engine, out, from_id, to_id).context("identify step failed")?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_match(
    engine: &EngineProfile,
    out: &Path,
    repo: &Path,
    branch: &str,
    after: Option<DateTime<Utc>>,
    before: Option<DateTime<Utc>>,
    format: OutputFormat,
    extended: bool,
) -> Result<()> {
    let scanner = CommitScanner::open(repo, branch)?;
    let options = MatchOptions {
        window: DateWindow { after, before },
        format,
        extended,
    };
    matching::run(&scanner, engine, out, &options).context("match step failed")?;
    Ok(())
}
