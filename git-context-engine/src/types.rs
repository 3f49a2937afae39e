//! Data model for exported pull requests.
//!
//! These types are the "normalized output" of the GitHub fetch step and are
//! consumed by the analysis orchestrator. The serialized shape doubles as the
//! `--input_json` file format, so field names are part of the contract.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Search window for closed pull requests in one repository.
#[derive(Debug, Clone)]
pub struct PrSearchQuery {
    /// Repository name in `owner/repo` form.
    pub repo: String,
    /// Author login whose PRs are exported.
    pub author: String,
    /// Inclusive start of the closing-date window.
    pub closed_from: NaiveDate,
    /// Inclusive end of the closing-date window.
    pub closed_to: NaiveDate,
}

/// One changed file inside a pull request.
///
/// `patch` is the provider's unified diff for the file; it is absent for
/// binary files and for diffs the provider refused to inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrFileChange {
    pub filename: String,
    #[serde(default)]
    pub patch: Option<String>,
}

/// Full export of one pull request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestExport {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub files: Vec<PrFileChange>,
    /// Messages of every commit attached to the PR.
    #[serde(default)]
    pub commits_messages: Vec<String>,
    /// Bodies of the review comments left on the PR.
    #[serde(default)]
    pub comments: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
}
