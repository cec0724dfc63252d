//! Bugzilla bulk-fetch client.
//!
//! The pipeline talks to the tracker through the [`IssueTracker`] trait so
//! that the classifier can be tested against in-memory fakes. The production
//! implementation, [`RestTracker`], issues anonymous REST requests; it never
//! authenticates, and [`IssueTracker::clear_cached_auth`] removes any cached
//! credential files up front so visibility results do not depend on the
//! invoking user's privileges.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::{IssueId, Result, SechistError};

/// Tracker fault code for "access denied", taken as a proxy for a
/// privately-marked (likely security) issue.
pub const FAULT_ACCESS_DENIED: i64 = 102;

/// Fields of an issue record the invoker is allowed to read.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueFields {
    pub id: IssueId,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub component: String,
}

/// Per-ID failure entry of a permissive bulk fetch.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueFault {
    pub id: IssueId,
    #[serde(rename = "faultCode")]
    pub fault_code: i64,
}

/// Response of one bulk-fetch request. IDs that the tracker knows nothing
/// about appear in neither list.
#[derive(Debug, Default, Deserialize)]
pub struct BulkResponse {
    #[serde(default)]
    pub bugs: Vec<IssueFields>,
    #[serde(default)]
    pub faults: Vec<IssueFault>,
}

/// Remote capability: bulk-fetch issues by ID.
pub trait IssueTracker {
    /// Fetch all `ids` in one request, returning per-ID fields or faults.
    fn fetch_bulk(&self, ids: &[IssueId]) -> Result<BulkResponse>;

    /// Remove any locally cached authentication state so subsequent queries
    /// run unauthenticated.
    fn clear_cached_auth(&self) -> Result<()>;
}

/// Anonymous Bugzilla REST client.
pub struct RestTracker {
    http: reqwest::blocking::Client,
    base_url: String,
    auth_cache: Vec<PathBuf>,
}

impl RestTracker {
    pub fn new(base_url: &str) -> Result<RestTracker> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .user_agent(concat!("sechist/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SechistError::TrackerQuery(e.to_string()))?;
        Ok(RestTracker {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_cache: auth_cache_paths(),
        })
    }
}

impl IssueTracker for RestTracker {
    fn fetch_bulk(&self, ids: &[IssueId]) -> Result<BulkResponse> {
        let id_list = ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        debug!(count = ids.len(), url = %self.base_url, "issuing bulk fetch");
        let response = self
            .http
            .get(format!("{}/rest/bug", self.base_url))
            .query(&[
                ("id", id_list.as_str()),
                ("permissive", "1"),
                ("include_fields", "id,product,component"),
            ])
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|e| SechistError::TrackerQuery(e.to_string()))?;
        response
            .json::<BulkResponse>()
            .map_err(|e| SechistError::TrackerQuery(format!("malformed response: {e}")))
    }

    fn clear_cached_auth(&self) -> Result<()> {
        for path in &self.auth_cache {
            if path.exists() {
                fs::remove_file(path)?;
                info!(path = %path.display(), "removed cached tracker credentials");
            }
        }
        Ok(())
    }
}

/// Credential cache files to remove before anonymous querying. Overridable
/// via `SECHIST_TOKEN_FILE` for setups that keep a token elsewhere.
fn auth_cache_paths() -> Vec<PathBuf> {
    if let Some(token_file) = std::env::var_os("SECHIST_TOKEN_FILE") {
        return vec![PathBuf::from(token_file)];
    }
    let Some(home) = std::env::var_os("HOME") else {
        return Vec::new();
    };
    let cache = PathBuf::from(home).join(".cache").join("sechist");
    vec![cache.join("token"), cache.join("cookies")]
}
