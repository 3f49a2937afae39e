//! Crate-wide error hierarchy for mr-analyzer.
//!
//! Goals:
//! - Single root `Error` for all public functions.
//! - Per-unit failures stay embeddable: most pipeline faults degrade into an
//!   error-tagged `AnalysisResult` instead of surfacing here.
//! - No dynamic dispatch, ergonomic `?` via `From` impls.

use std::path::PathBuf;
use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type AnalyzerResult<T> = Result<T, Error>;

/// Root error type for the mr-analyzer crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Repository dump reading failure.
    #[error(transparent)]
    Dump(#[from] DumpError),

    /// Completion-service failure at setup level (bad config, bad client).
    #[error(transparent)]
    Llm(#[from] ai_llm_service::AiLlmError),

    /// Input validation errors (bad records, unsupported shapes).
    #[error("validation error: {0}")]
    Validation(String),

    /// Generic catch-all error when nothing else fits.
    #[error("other error: {0}")]
    Other(String),
}

/// Repository dump I/O errors.
///
/// Malformed dump *content* is never an error: unparsable sections are
/// skipped with a warning and an empty dump parses to an empty mapping.
#[derive(Debug, Error)]
pub enum DumpError {
    /// Input path does not exist.
    #[error("repository file does not exist: {0}")]
    NotFound(PathBuf),

    /// Unexpected I/O fault while reading the dump.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
