//! Analysis orchestration: one [`AnalysisResult`] per diff-equivalent input.
//!
//! The analyzer owns no state beyond the shared completion service. Methods
//! process their unit to completion (synthesize → prompt → remote call →
//! normalize) before returning; callers iterate units strictly sequentially.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use ai_llm_service::YandexGptService;

use crate::diff;
use crate::dump;
use crate::errors::AnalyzerResult;
use crate::normalize;
use crate::prompt::{SYSTEM_PROMPT, build_analysis_prompt};
use crate::types::{AnalysisResult, ModelReply, PullRequestRecord, ReplyAlternative};

/// Main entry for analyzing merge-request quality.
pub struct MergeRequestAnalyzer {
    llm: Arc<YandexGptService>,
}

impl MergeRequestAnalyzer {
    /// Wraps a shared completion service; construct the service once at
    /// process start and pass clones of the `Arc` here.
    pub fn new(llm: Arc<YandexGptService>) -> Self {
        Self { llm }
    }

    /// Analyzes raw diff text.
    ///
    /// Transport and provider failures are embedded into the result instead
    /// of propagating, so one bad unit never aborts its siblings. An empty
    /// diff yields an error-tagged empty result without a remote call.
    pub async fn analyze_code_changes(&self, diff_content: &str) -> AnalysisResult {
        info!("starting code changes analysis");

        if diff_content.trim().is_empty() {
            warn!("diff content is empty, returning empty analysis");
            return AnalysisResult::from_error("Input diff content was empty.");
        }

        let prompt = build_analysis_prompt(diff_content);
        let reply = match self.llm.complete(&prompt, Some(SYSTEM_PROMPT)).await {
            Ok(completed) => ModelReply::Completed(
                completed
                    .alternatives
                    .into_iter()
                    .map(|alt| ReplyAlternative { text: alt.text })
                    .collect(),
            ),
            Err(err) => ModelReply::Failed(err.to_string()),
        };

        normalize::normalize(&reply)
    }

    /// Analyzes a repository dump file: parse → synthesize → analyze.
    ///
    /// A missing file is an error for this unit. An empty dump, or one whose
    /// every file was skipped as binary, degrades to an error-tagged result.
    pub async fn analyze_repository_dump(
        &self,
        path: impl AsRef<Path>,
    ) -> AnalyzerResult<AnalysisResult> {
        let path = path.as_ref();
        info!("starting repository dump analysis: {}", path.display());

        let files = dump::parse_dump_file(path)?;
        if files.is_empty() {
            return Ok(AnalysisResult::from_error(format!(
                "No files parsed from repository file: {}",
                path.display()
            )));
        }

        let diff_content = diff::synthesize_from_files(&files);
        if diff_content.is_empty() {
            return Ok(AnalysisResult::from_error(format!(
                "Generated empty diff from repository file: {}",
                path.display()
            )));
        }

        Ok(self.analyze_code_changes(&diff_content).await)
    }

    /// Analyzes a structured pull-request record.
    ///
    /// A record without files degrades to an error-tagged result.
    pub async fn analyze_pull_request(&self, record: &PullRequestRecord) -> AnalysisResult {
        info!("starting pull request analysis: {}", record.title);

        if record.files.is_empty() {
            warn!("no files found in the pull request record, returning empty analysis");
            return AnalysisResult::from_error("No files found in PR data.");
        }

        let diff_content = diff::synthesize_from_pull_request(record);
        self.analyze_code_changes(&diff_content).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_llm_service::YandexGptConfig;
    use std::io::Write;

    // The degradation paths below short-circuit before any remote call, so a
    // service built from a dummy config is enough.
    fn test_analyzer() -> MergeRequestAnalyzer {
        let cfg = YandexGptConfig {
            api_key: "test-key".into(),
            folder_id: "folder".into(),
            model_name: "yandexgpt-lite".into(),
            endpoint: "https://llm.api.cloud.yandex.net".into(),
            max_tokens: Some(1500),
            temperature: Some(0.2),
            timeout_secs: Some(60),
        };
        MergeRequestAnalyzer::new(Arc::new(YandexGptService::new(cfg).unwrap()))
    }

    #[tokio::test]
    async fn empty_diff_short_circuits_with_error() {
        let result = test_analyzer().analyze_code_changes("   ").await;
        assert_eq!(result.error.as_deref(), Some("Input diff content was empty."));
        assert!(result.quality_issues.is_empty());
        assert_eq!(result.overall_score, None);
    }

    #[tokio::test]
    async fn markerless_dump_degrades_to_error_result() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, "no file markers here at all").unwrap();

        let result = test_analyzer()
            .analyze_repository_dump(tmp.path())
            .await
            .unwrap();
        assert!(
            result
                .error
                .as_deref()
                .unwrap()
                .starts_with("No files parsed from repository file")
        );
        assert!(result.quality_issues.is_empty());
        assert!(result.good_practices.is_empty());
    }

    #[tokio::test]
    async fn missing_dump_path_is_an_error_for_the_unit() {
        let err = test_analyzer()
            .analyze_repository_dump("definitely/not/here.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, crate::errors::Error::Dump(_)));
    }

    #[tokio::test]
    async fn pr_record_without_files_degrades_to_error_result() {
        let record = PullRequestRecord {
            title: "Tidy up".into(),
            description: None,
            files: Vec::new(),
            commit_messages: Vec::new(),
            comments: Vec::new(),
            url: None,
        };
        let result = test_analyzer().analyze_pull_request(&record).await;
        assert_eq!(result.error.as_deref(), Some("No files found in PR data."));
    }
}
