//! Public entry for the merge-request quality analysis pipeline.
//!
//! One analysis unit flows through four stages:
//!
//! 1) **Input normalization**: a raw diff, a repository dump file or a
//!    structured pull-request record is turned into a single diff blob
//!    (`dump` + `diff` modules);
//! 2) **Prompt assembly**: the fixed scoring-rubric template is rendered
//!    around the diff (`prompt` module);
//! 3) **Completion call**: the prompt is sent to the configured completion
//!    model via `ai-llm-service`;
//! 4) **Response normalization**: the free-form reply is converted into a
//!    typed [`AnalysisResult`] through an ordered chain of extraction
//!    strategies (`normalize` module).
//!
//! Units are processed strictly sequentially and independently: a transport
//! or parsing failure in one unit is embedded into that unit's result and
//! never aborts its siblings. The pipeline uses `tracing` for diagnostics
//! and avoids heap trait objects; errors are unified by the crate-level
//! error type.

pub mod analyzer;
pub mod diff;
pub mod dump;
pub mod errors;
pub mod normalize;
pub mod prompt;
pub mod types;

pub use analyzer::MergeRequestAnalyzer;
pub use errors::{AnalyzerResult, DumpError, Error};
pub use types::{AnalysisResult, ModelReply, PrFile, PullRequestRecord, ReplyAlternative};
