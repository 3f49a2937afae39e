//! Diff synthesis: turning parsed dumps or pull-request records into a
//! unified-diff-shaped blob suitable for prompting.
//!
//! Dump contents have no "before" state, so every line is emitted as an
//! addition under a synthetic `@@ -0,0 +1,N @@` hunk header. Binary-looking
//! files are skipped with a warning. Pull-request records already carry real
//! per-file patches and are formatted as a Markdown-ish document instead.

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::types::PullRequestRecord;

/// Per-file content cap applied before diff formatting.
const MAX_FILE_CONTENT_CHARS: usize = 10_000;
/// Cap on the whole synthesized blob.
const MAX_DIFF_CONTENT_CHARS: usize = 100_000;
/// Marker appended wherever content is cut.
pub const TRUNCATION_MARKER: &str = "[... TRUNCATED DUE TO SIZE ...]";

/// Synthesizes an all-additions unified diff from a path → content mapping,
/// in mapping order.
///
/// Returns an empty string for an empty mapping (and for a mapping whose
/// every file was skipped as binary).
pub fn synthesize_from_files(files: &IndexMap<String, String>) -> String {
    if files.is_empty() {
        warn!("no files to generate diff for");
        return String::new();
    }

    let mut parts: Vec<String> = Vec::new();
    for (path, content) in files {
        debug!("processing file for diff: {}", path);

        if looks_like_binary(content) {
            warn!("skipping potentially binary file: {}", path);
            continue;
        }

        let content = bounded_content(path, content);

        parts.push(format!("--- a/{path}"));
        parts.push(format!("+++ b/{path}"));

        let lines: Vec<&str> = content.split('\n').collect();
        parts.push(format!("@@ -0,0 +1,{} @@", lines.len()));
        for line in &lines {
            parts.push(format!("+{}", line.trim_end_matches(['\r', '\n'])));
        }

        // Blank separator between file diffs.
        parts.push(String::new());
    }

    let mut blob = parts.join("\n");
    if blob.chars().count() > MAX_DIFF_CONTENT_CHARS {
        warn!(
            "diff content too large ({} chars), truncating",
            blob.chars().count()
        );
        blob = blob.chars().take(MAX_DIFF_CONTENT_CHARS).collect();
        blob.push('\n');
        blob.push_str(TRUNCATION_MARKER);
    }

    info!(
        "successfully generated diff content for {} files ({} chars)",
        files.len(),
        blob.len()
    );
    blob
}

/// Formats a structured pull-request record as a Markdown-ish diff document.
///
/// Files with a patch get `--- a/` / `+++ b/` headers and a fenced ```diff
/// block; files without one get the headers and a placeholder line. No size
/// truncation happens here; the completion layer enforces the final prompt
/// budget.
pub fn synthesize_from_pull_request(pr: &PullRequestRecord) -> String {
    let mut parts: Vec<String> = Vec::new();

    parts.push(format!("# Pull Request: {}", pr.title));
    let description = pr
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or("No description provided.");
    parts.push(format!("\n## Description\n{description}\n"));
    parts.push("## Changes\n".to_string());

    for file in &pr.files {
        if file.filename.is_empty() {
            warn!("skipping pull-request file entry with empty filename");
            continue;
        }

        parts.push(format!("--- a/{}", file.filename));
        parts.push(format!("+++ b/{}", file.filename));

        match file.patch.as_deref().filter(|p| !p.is_empty()) {
            Some(patch) => {
                parts.push("```diff".to_string());
                parts.push(patch.trim_matches('\n').to_string());
                parts.push("```\n".to_string());
            }
            None => {
                warn!("file '{}' in PR data has no patch content", file.filename);
                parts.push("(No patch content provided)\n".to_string());
            }
        }
    }

    parts.join("\n")
}

/// Applies the per-file character cap, appending the truncation marker as an
/// extra content line when the file was cut.
fn bounded_content(path: &str, content: &str) -> String {
    if content.chars().count() <= MAX_FILE_CONTENT_CHARS {
        return content.to_string();
    }
    warn!(
        "file content too large ({} chars), truncating: {}",
        content.chars().count(),
        path
    );
    let mut cut: String = content.chars().take(MAX_FILE_CONTENT_CHARS).collect();
    cut.push('\n');
    cut.push_str(TRUNCATION_MARKER);
    cut
}

/// Binary heuristic: a NUL byte, or control characters outside of ordinary
/// text whitespace.
fn looks_like_binary(content: &str) -> bool {
    content
        .chars()
        .any(|c| c == '\0' || (c.is_control() && c != '\n' && c != '\r' && c != '\t'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PrFile, PullRequestRecord};

    fn files_of(entries: &[(&str, &str)]) -> IndexMap<String, String> {
        entries
            .iter()
            .map(|(p, c)| (p.to_string(), c.to_string()))
            .collect()
    }

    fn record_with_files(files: Vec<PrFile>) -> PullRequestRecord {
        PullRequestRecord {
            title: "Add widgets".into(),
            description: Some("Widget support.".into()),
            files,
            commit_messages: Vec::new(),
            comments: Vec::new(),
            url: None,
        }
    }

    #[test]
    fn hunk_header_counts_newline_separated_lines() {
        let files = files_of(&[("a.py", "one\ntwo\nthree")]);
        let blob = synthesize_from_files(&files);
        assert!(blob.contains("@@ -0,0 +1,3 @@"));
    }

    #[test]
    fn two_file_dump_emits_expected_headers_and_additions() {
        let files = files_of(&[("a.py", "print(1)"), ("b.py", "print(2)")]);
        let blob = synthesize_from_files(&files);

        assert_eq!(blob.matches("+++ b/").count(), 2);
        assert_eq!(blob.matches("--- a/").count(), 2);
        assert_eq!(blob.matches("@@ -0,0 +1,1 @@").count(), 2);
        assert_eq!(
            blob.lines().filter(|l| l.starts_with('+')).count(),
            4,
            "two `+++` headers plus one added line per file"
        );
        // Mapping order is preserved.
        assert!(blob.find("a.py").unwrap() < blob.find("b.py").unwrap());
    }

    #[test]
    fn binary_looking_files_are_skipped() {
        let files = files_of(&[("blob.bin", "PK\u{0003}\u{0004}data"), ("ok.py", "x = 1")]);
        let blob = synthesize_from_files(&files);
        assert!(!blob.contains("blob.bin"));
        assert!(blob.contains("+++ b/ok.py"));

        let nul = files_of(&[("nul.dat", "a\0b")]);
        assert_eq!(synthesize_from_files(&nul), "");
    }

    #[test]
    fn oversized_file_content_is_truncated_with_marker() {
        let big = "y".repeat(MAX_FILE_CONTENT_CHARS + 50);
        let files = files_of(&[("big.py", &big)]);
        let blob = synthesize_from_files(&files);

        assert!(blob.contains(TRUNCATION_MARKER));
        // The marker becomes one extra added line under the same hunk.
        assert!(blob.contains("@@ -0,0 +1,2 @@"));
        assert!(blob.contains(&format!("+{TRUNCATION_MARKER}")));
    }

    #[test]
    fn oversized_blob_is_truncated_once_at_the_end() {
        // 20 files of ~9k chars each overflow the 100k blob budget.
        let content = "z".repeat(9_000);
        let entries: Vec<(String, String)> = (0..20)
            .map(|i| (format!("f{i}.py"), content.clone()))
            .collect();
        let files: IndexMap<String, String> = entries.into_iter().collect();

        let blob = synthesize_from_files(&files);
        assert!(blob.ends_with(TRUNCATION_MARKER));
        assert!(blob.chars().count() <= MAX_DIFF_CONTENT_CHARS + TRUNCATION_MARKER.len() + 1);
    }

    #[test]
    fn empty_mapping_yields_empty_blob() {
        assert_eq!(synthesize_from_files(&IndexMap::new()), "");
    }

    #[test]
    fn crlf_content_lines_are_trimmed_before_prefixing() {
        let files = files_of(&[("w.py", "left\r\nright")]);
        let blob = synthesize_from_files(&files);
        assert!(blob.contains("+left\n"));
        assert!(!blob.contains('\r'));
    }

    #[test]
    fn pr_with_patch_gets_fenced_diff_block() {
        let record = record_with_files(vec![PrFile {
            filename: "widget.py".into(),
            patch: Some("@@ -1,1 +1,2 @@\n+import os\n".into()),
        }]);
        let doc = synthesize_from_pull_request(&record);

        assert!(doc.starts_with("# Pull Request: Add widgets"));
        assert!(doc.contains("## Description\nWidget support."));
        assert!(doc.contains("--- a/widget.py"));
        assert!(doc.contains("```diff\n@@ -1,1 +1,2 @@\n+import os\n```"));
    }

    #[test]
    fn pr_file_without_patch_gets_placeholder_and_no_synthetic_hunk() {
        let record = record_with_files(vec![PrFile {
            filename: "image.png".into(),
            patch: None,
        }]);
        let doc = synthesize_from_pull_request(&record);

        assert!(doc.contains("--- a/image.png"));
        assert!(doc.contains("+++ b/image.png"));
        assert!(doc.contains("(No patch content provided)"));
        assert!(!doc.contains("@@"));
    }

    #[test]
    fn pr_empty_description_gets_placeholder() {
        let mut record = record_with_files(Vec::new());
        record.description = Some("   ".into());
        let doc = synthesize_from_pull_request(&record);
        assert!(doc.contains("No description provided."));
    }
}
