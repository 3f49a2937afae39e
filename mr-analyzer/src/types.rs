//! Data model for analysis inputs and results.

use serde::{Deserialize, Serialize};

/// Structured result of one analysis unit.
///
/// Serialized as-is into the output JSON. Exactly one result is produced per
/// diff-equivalent input; it is constructed fresh for each call and never
/// mutated afterward. `raw_response` always carries the unprocessed model
/// text (or the failure message when the completion call itself failed).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub quality_issues: Vec<String>,
    pub good_practices: Vec<String>,
    pub patterns: Vec<String>,
    pub anti_patterns: Vec<String>,
    pub overall_score: Option<f64>,
    pub raw_response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    /// Empty result tagged with an error message.
    ///
    /// `raw_response` mirrors the message so consumers reading only the raw
    /// field still see what happened.
    pub fn from_error(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            raw_response: message.clone(),
            error: Some(message),
            ..Default::default()
        }
    }
}

/// One changed file inside a pull-request record.
///
/// `patch` may be absent (binary file, oversized diff); synthesis then emits
/// a placeholder line instead of a fenced diff block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrFile {
    pub filename: String,
    #[serde(default)]
    pub patch: Option<String>,
}

/// Structured pull-request record, as read from `--input_json` files or
/// mapped from the GitHub exporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestRecord {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub files: Vec<PrFile>,
    /// Commit messages gathered by the exporter. Informational: the prompt
    /// currently reviews title/description/files only.
    #[serde(default, rename = "commits_messages")]
    pub commit_messages: Vec<String>,
    /// Review comments gathered by the exporter. Informational, see above.
    #[serde(default)]
    pub comments: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
}

fn default_title() -> String {
    "N/A".to_string()
}

/// One candidate completion.
#[derive(Debug, Clone)]
pub struct ReplyAlternative {
    pub text: String,
}

/// Outcome of one completion call, as consumed by the normalizer.
///
/// Either an error marker with a message, or an ordered sequence of
/// alternative completions. Ephemeral: built right after the model call and
/// consumed immediately.
#[derive(Debug, Clone)]
pub enum ModelReply {
    Completed(Vec<ReplyAlternative>),
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_key_is_omitted_from_clean_results() {
        let clean = AnalysisResult {
            raw_response: "ok".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&clean).unwrap();
        assert!(json.get("error").is_none());
        assert!(json.get("quality_issues").is_some());

        let failed = AnalysisResult::from_error("boom");
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["error"], "boom");
        assert_eq!(json["raw_response"], "boom");
    }

    #[test]
    fn pr_record_tolerates_sparse_json() {
        let record: PullRequestRecord =
            serde_json::from_str(r#"{"files": [{"filename": "a.py"}]}"#).unwrap();
        assert_eq!(record.title, "N/A");
        assert!(record.description.is_none());
        assert_eq!(record.files.len(), 1);
        assert!(record.files[0].patch.is_none());
        assert!(record.commit_messages.is_empty());
    }

    #[test]
    fn pr_record_reads_exporter_field_names() {
        let raw = r#"{
            "title": "Add parser",
            "description": "Adds the parser.",
            "files": [{"filename": "parser.py", "patch": "@@ -0,0 +1 @@\n+x = 1"}],
            "commits_messages": ["add parser"],
            "comments": ["nice"],
            "url": "https://api.github.com/repos/o/r/pulls/1"
        }"#;
        let record: PullRequestRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.commit_messages, vec!["add parser"]);
        assert_eq!(record.comments, vec!["nice"]);
    }
}
