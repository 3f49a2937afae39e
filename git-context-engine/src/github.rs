//! GitHub provider (REST v3) for closed-PR search and per-PR export.
//!
//! Endpoints used (as of 2025):
//!   * GET /search/issues?q=...                       (closed-PR search)
//!   * GET /repos/{owner}/{repo}/pulls/{number}
//!   * GET /repos/{owner}/{repo}/pulls/{number}/files
//!   * GET /repos/{owner}/{repo}/pulls/{number}/commits
//!   * GET /repos/{owner}/{repo}/pulls/{number}/comments

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::errors::{GitContextEngineConfigError, GitContextEngineResult};
use crate::types::{PrFileChange, PrSearchQuery, PullRequestExport};

/// Public GitHub REST API base.
pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";

/// GitHub HTTP client wrapper.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    base_api: String, // "https://api.github.com"
    token: String,    // raw PAT; sent as "Bearer <token>"
}

impl GitHubClient {
    /// Constructs a GitHub client with a shared HTTP instance and auth token.
    pub fn new(http: Client, base_api: String, token: String) -> Self {
        debug!("Creating GitHubClient with base_api={}", base_api);
        Self {
            http,
            base_api,
            token,
        }
    }

    /// Builds a client with its own HTTP instance and a stable user agent so
    /// the provider can identify the integration.
    ///
    /// # Errors
    /// - [`GitContextEngineConfigError::MissingToken`] if the token is empty
    pub fn from_token(base_api: String, token: String) -> GitContextEngineResult<Self> {
        if token.trim().is_empty() {
            return Err(GitContextEngineConfigError::MissingToken.into());
        }

        let http = Client::builder()
            .user_agent("git-context-engine/0.1")
            .build()?;

        Ok(Self::new(http, base_api, token))
    }

    /// Exports every closed pull request matching the query.
    ///
    /// This is the main entry point: it searches for closed PRs authored by
    /// `query.author` whose closing date falls in the window, then gathers
    /// title, description, changed files, commit messages and review comments
    /// for each match, strictly sequentially.
    pub async fn export_pr_data(
        &self,
        query: &PrSearchQuery,
    ) -> GitContextEngineResult<Vec<PullRequestExport>> {
        if !query.repo.contains('/') {
            return Err(crate::errors::GitContextEngineError::Validation(format!(
                "repository must be in owner/repo form, got '{}'",
                query.repo
            )));
        }

        let numbers = self.search_closed_pull_requests(query).await?;
        info!(
            repo = %query.repo,
            author = %query.author,
            matches = numbers.len(),
            "closed-PR search finished"
        );

        let mut exports = Vec::with_capacity(numbers.len());
        for number in numbers {
            exports.push(self.export_one(&query.repo, number).await?);
        }
        Ok(exports)
    }

    /// Searches closed PRs via `/search/issues` and returns their numbers.
    async fn search_closed_pull_requests(
        &self,
        query: &PrSearchQuery,
    ) -> GitContextEngineResult<Vec<u64>> {
        let q = build_search_query(query);
        let url = format!(
            "{}/search/issues?q={}&per_page=100",
            self.base_api,
            urlencoding::encode(&q)
        );
        debug!("GitHub search: {}", url);

        // NOTE: this reads the first result page only; windows with more than
        // 100 closed PRs need pagination here.
        let resp: SearchResponse = self
            .http
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(resp.items.into_iter().map(|i| i.number).collect())
    }

    /// Gathers the full export for a single pull request.
    async fn export_one(
        &self,
        repo: &str,
        number: u64,
    ) -> GitContextEngineResult<PullRequestExport> {
        debug!("exporting PR: repo={}, number={}", repo, number);

        let pull = self.get_pull(repo, number).await?;
        let files = self.get_files(repo, number).await?;
        let commits_messages = self.get_commit_messages(repo, number).await?;
        let comments = self.get_comments(repo, number).await?;

        if files.is_empty() {
            warn!("PR #{number} in {repo} has no changed files");
        }

        Ok(PullRequestExport {
            title: pull.title,
            description: pull.body,
            files,
            commits_messages,
            comments,
            url: Some(pull.html_url),
        })
    }

    /// Fetches PR metadata (title, body, URL).
    async fn get_pull(&self, repo: &str, number: u64) -> GitContextEngineResult<GitHubPr> {
        let url = format!("{}/repos/{}/pulls/{}", self.base_api, repo, number);
        debug!("GitHub get_pull: {}", url);

        let resp: GitHubPr = self
            .http
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(resp)
    }

    /// Fetches changed files; the `patch` field is the per-file unified diff.
    async fn get_files(
        &self,
        repo: &str,
        number: u64,
    ) -> GitContextEngineResult<Vec<PrFileChange>> {
        let url = format!(
            "{}/repos/{}/pulls/{}/files?per_page=100",
            self.base_api, repo, number
        );
        debug!("GitHub get_files: {}", url);

        // NOTE: this ignores pagination beyond 100 files; can be extended later.
        let files: Vec<GitHubPrFile> = self
            .http
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(files
            .into_iter()
            .map(|f| PrFileChange {
                filename: f.filename,
                patch: f.patch,
            })
            .collect())
    }

    /// Fetches the messages of every commit attached to the PR.
    async fn get_commit_messages(
        &self,
        repo: &str,
        number: u64,
    ) -> GitContextEngineResult<Vec<String>> {
        let url = format!(
            "{}/repos/{}/pulls/{}/commits",
            self.base_api, repo, number
        );
        debug!("GitHub get_commit_messages: {}", url);

        let raw: Vec<GitHubPrCommit> = self
            .http
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(raw.into_iter().map(|c| c.commit.message).collect())
    }

    /// Fetches the bodies of the review comments left on the PR.
    async fn get_comments(&self, repo: &str, number: u64) -> GitContextEngineResult<Vec<String>> {
        let url = format!(
            "{}/repos/{}/pulls/{}/comments",
            self.base_api, repo, number
        );
        debug!("GitHub get_comments: {}", url);

        let raw: Vec<GitHubReviewComment> = self
            .http
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(raw.into_iter().filter_map(|c| c.body).collect())
    }
}

/// Formats the `/search/issues` qualifier string for the query.
fn build_search_query(query: &PrSearchQuery) -> String {
    format!(
        "is:pr repo:{} author:{} is:closed closed:{}..{}",
        query.repo,
        query.author,
        query.closed_from.format("%Y-%m-%d"),
        query.closed_to.format("%Y-%m-%d")
    )
}

/// --- GitHub response shapes (subset of fields we actually use) ---

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Vec<SearchIssue>,
}

#[derive(Debug, Deserialize)]
struct SearchIssue {
    number: u64,
}

#[derive(Debug, Deserialize)]
struct GitHubPr {
    title: String,
    body: Option<String>,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct GitHubPrFile {
    filename: String,
    #[serde(default)]
    patch: Option<String>, // unified diff; None for binary/too large
}

#[derive(Debug, Deserialize)]
struct GitHubPrCommit {
    commit: GitHubCommitInner,
}

#[derive(Debug, Deserialize)]
struct GitHubCommitInner {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GitHubReviewComment {
    #[serde(default)]
    body: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn query() -> PrSearchQuery {
        PrSearchQuery {
            repo: "octo/widgets".into(),
            author: "octocat".into(),
            closed_from: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            closed_to: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
        }
    }

    #[test]
    fn search_query_uses_closed_window_qualifiers() {
        assert_eq!(
            build_search_query(&query()),
            "is:pr repo:octo/widgets author:octocat is:closed closed:2025-01-01..2025-01-31"
        );
    }

    #[test]
    fn from_token_rejects_empty_token() {
        let res = GitHubClient::from_token(DEFAULT_GITHUB_API.to_string(), "  ".to_string());
        assert!(res.is_err());
    }

    #[test]
    fn search_response_decodes_numbers() {
        let raw = r#"{"total_count": 2, "items": [{"number": 7, "title": "x"}, {"number": 9}]}"#;
        let resp: SearchResponse = serde_json::from_str(raw).unwrap();
        let numbers: Vec<u64> = resp.items.into_iter().map(|i| i.number).collect();
        assert_eq!(numbers, vec![7, 9]);
    }
}
