//! Repository-dump parsing: flat text archives bundling many source files.
//!
//! Format:
//! - an optional preamble starting with `Directory structure:` and terminated
//!   by the first blank line (ignored);
//! - sections separated by a delimiter line consisting solely of 48 `=`
//!   characters;
//! - each section carries a `FILE: <relative-path>` line; everything after it
//!   (trimmed) is the file content.
//!
//! Parsing is deliberately tolerant. Sections without a `FILE:` marker and
//! sections with an empty filename are skipped with a warning; a marker-less
//! or empty input yields an empty mapping, not an error. The delimiter scan
//! is line-based, so a missing trailing newline after the final section is
//! fine. When a path occurs twice, the last occurrence wins.

use std::path::Path;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::errors::{AnalyzerResult, DumpError};

/// Section delimiter: a line of exactly 48 `=` characters.
pub const SECTION_DELIMITER: &str = "================================================";

const PREAMBLE_MARKER: &str = "Directory structure:";

/// Parses dump text into an insertion-ordered path → content mapping.
pub fn parse(text: &str) -> IndexMap<String, String> {
    let body = strip_preamble(text);

    let mut files: IndexMap<String, String> = IndexMap::new();
    let mut section: Vec<&str> = Vec::new();
    for line in body.lines() {
        if line.trim_end() == SECTION_DELIMITER {
            flush_section(&mut files, &section);
            section.clear();
        } else {
            section.push(line);
        }
    }
    flush_section(&mut files, &section);

    if files.is_empty() {
        warn!("no file sections found in the repository dump");
    } else {
        info!("successfully parsed {} files from repository dump", files.len());
    }
    files
}

/// Reads and parses a dump file from disk.
///
/// Bytes are decoded lossily (UTF-8 with replacement characters): dump
/// archives occasionally embed stray bytes and the parser must not choke on
/// them.
///
/// # Errors
/// - [`DumpError::NotFound`] when the path does not point to a file
/// - [`DumpError::Io`] on unexpected read faults
pub fn parse_dump_file(path: impl AsRef<Path>) -> AnalyzerResult<IndexMap<String, String>> {
    let path = path.as_ref();
    info!("parsing repository dump: {}", path.display());

    if !path.is_file() {
        return Err(DumpError::NotFound(path.to_path_buf()).into());
    }

    let bytes = std::fs::read(path).map_err(DumpError::Io)?;
    let text = String::from_utf8_lossy(&bytes);

    if text.trim().is_empty() {
        warn!("repository dump is empty: {}", path.display());
        return Ok(IndexMap::new());
    }
    Ok(parse(&text))
}

/// Serializes a mapping back into the canonical dump format.
///
/// Inverse of [`parse`] for trimmed content: `parse(&serialize(&d)) == d`.
pub fn serialize(files: &IndexMap<String, String>) -> String {
    let mut out = String::new();
    for (path, content) in files {
        out.push_str(SECTION_DELIMITER);
        out.push('\n');
        out.push_str("FILE: ");
        out.push_str(path);
        out.push('\n');
        out.push_str(content);
        out.push('\n');
    }
    out
}

fn strip_preamble(text: &str) -> &str {
    if !text.starts_with(PREAMBLE_MARKER) {
        return text;
    }
    match text.find("\n\n") {
        Some(idx) => &text[idx + 2..],
        None => text,
    }
}

fn flush_section(files: &mut IndexMap<String, String>, lines: &[&str]) {
    if lines.iter().all(|l| l.trim().is_empty()) {
        return;
    }

    let Some(pos) = lines.iter().position(|l| l.trim_start().starts_with("FILE:")) else {
        warn!(
            "could not extract filename from section: {}...",
            section_preview(lines)
        );
        return;
    };

    let filename = lines[pos].trim_start().trim_start_matches("FILE:").trim();
    if filename.is_empty() {
        warn!("found empty filename in section, skipping");
        return;
    }

    let content = lines[pos + 1..].join("\n").trim().to_string();
    debug!("parsed file: {} ({} bytes)", filename, content.len());
    files.insert(filename.to_string(), content);
}

fn section_preview(lines: &[&str]) -> String {
    let joined = lines.join("\\n");
    joined.chars().take(100).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn dump_of(entries: &[(&str, &str)]) -> IndexMap<String, String> {
        entries
            .iter()
            .map(|(p, c)| (p.to_string(), c.to_string()))
            .collect()
    }

    #[test]
    fn serialize_then_parse_round_trips() {
        let files = dump_of(&[
            ("src/app.py", "import os\n\nprint(os.name)"),
            ("README.md", "# Title"),
            ("empty.txt", ""),
        ]);
        assert_eq!(parse(&serialize(&files)), files);
    }

    #[test]
    fn preamble_is_ignored() {
        let text = format!(
            "Directory structure:\n└── src/\n    └── a.py\n\n{delim}\nFILE: src/a.py\nprint(1)\n",
            delim = SECTION_DELIMITER
        );
        let files = parse(&text);
        assert_eq!(files.len(), 1);
        assert_eq!(files["src/a.py"], "print(1)");
    }

    #[test]
    fn section_without_marker_is_skipped() {
        let text = format!(
            "{d}\nsome stray text\n{d}\nFILE: kept.py\nx = 1\n",
            d = SECTION_DELIMITER
        );
        let files = parse(&text);
        assert_eq!(files.len(), 1);
        assert!(files.contains_key("kept.py"));
    }

    #[test]
    fn empty_filename_is_skipped() {
        let text = format!("{d}\nFILE:   \ncontent\n", d = SECTION_DELIMITER);
        assert!(parse(&text).is_empty());
    }

    #[test]
    fn markerless_input_yields_empty_mapping() {
        assert!(parse("just some prose, no delimiters at all").is_empty());
        assert!(parse("").is_empty());
    }

    #[test]
    fn missing_trailing_newline_is_tolerated() {
        let text = format!("{d}\nFILE: a.py\nprint(1)", d = SECTION_DELIMITER);
        let files = parse(&text);
        assert_eq!(files["a.py"], "print(1)");
    }

    #[test]
    fn duplicate_path_last_occurrence_wins() {
        let text = format!(
            "{d}\nFILE: a.py\nold\n{d}\nFILE: a.py\nnew\n",
            d = SECTION_DELIMITER
        );
        let files = parse(&text);
        assert_eq!(files.len(), 1);
        assert_eq!(files["a.py"], "new");
    }

    #[test]
    fn longer_equals_runs_are_not_delimiters() {
        // Content lines made of '=' must not split a section unless they are
        // exactly the 48-char delimiter.
        let ruler = "=".repeat(60);
        let text = format!("{d}\nFILE: a.txt\n{ruler}\nend\n", d = SECTION_DELIMITER);
        let files = parse(&text);
        assert_eq!(files["a.txt"], format!("{ruler}\nend"));
    }

    #[test]
    fn parse_dump_file_reports_missing_path() {
        let err = parse_dump_file("definitely/not/here.txt").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn parse_dump_file_reads_real_files() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(
            tmp,
            "{d}\nFILE: b.py\nprint(2)\n",
            d = SECTION_DELIMITER
        )
        .unwrap();
        let files = parse_dump_file(tmp.path()).unwrap();
        assert_eq!(files["b.py"], "print(2)");
    }

    #[test]
    fn delimiter_is_exactly_48_equals() {
        assert_eq!(SECTION_DELIMITER.len(), 48);
        assert!(SECTION_DELIMITER.chars().all(|c| c == '='));
    }
}
