//! GitHub pull-request export for quality analysis.
//!
//! The crate answers one question for the analysis pipeline: "which closed
//! pull requests did this author land in this window, and what changed in
//! them?". The exported records carry title, description, per-file patches,
//! commit messages and review comments, and are serde round-trippable so
//! they can be stored and re-analyzed later without touching the provider.

mod errors;
pub mod github;
pub mod types;

pub use errors::{
    GitContextEngineConfigError, GitContextEngineError, GitContextEngineProviderError,
    GitContextEngineResult,
};
pub use github::{DEFAULT_GITHUB_API, GitHubClient};
pub use types::{PrFileChange, PrSearchQuery, PullRequestExport};
