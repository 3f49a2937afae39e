//! Response normalization: recovering a typed [`AnalysisResult`] from a
//! free-form model reply.
//!
//! The model is asked for a single JSON object but drifts in practice: the
//! object arrives fenced, buried in prose, or the reply is plain numbered
//! prose following the rubric's enumeration. Extraction therefore runs as an
//! explicit ordered list of strategies, first non-empty result wins:
//!
//! 1. the whole reply is a JSON object (optionally code-fenced);
//! 2. a fenced ```json block embedded anywhere in the reply;
//! 3. numbered prose sections matching the prompt's enumeration; in this
//!    tier `patterns` and `anti_patterns` cannot be recovered reliably and
//!    stay empty.
//!
//! Whatever happens, the raw reply text is preserved in `raw_response`. A
//! reply that no strategy can ground yields empty lists and no score, which
//! is not an error. The score is reported exactly as the model returned it;
//! the normalizer does not re-clamp it into [0, 10].

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::types::{AnalysisResult, ModelReply};

/// Fields recovered by one extraction strategy.
#[derive(Debug, Default, PartialEq)]
struct ExtractedFields {
    quality_issues: Vec<String>,
    good_practices: Vec<String>,
    patterns: Vec<String>,
    anti_patterns: Vec<String>,
    overall_score: Option<f64>,
}

/// Ordered extraction strategies; the first one returning `Some` wins.
const STRATEGIES: &[(&str, fn(&str) -> Option<ExtractedFields>)] = &[
    ("direct-json", extract_direct_json),
    ("fenced-json", extract_fenced_json),
    ("enumerated-sections", extract_enumerated_sections),
];

/// Converts a completion reply into a typed analysis result.
///
/// A failed reply short-circuits to an error-tagged result without running
/// any extraction strategy.
pub fn normalize(reply: &ModelReply) -> AnalysisResult {
    let message = match reply {
        ModelReply::Failed(err) => {
            warn!("completion call failed: {}", err);
            return AnalysisResult::from_error(format!("API Error: {err}"));
        }
        ModelReply::Completed(alternatives) => match alternatives.first() {
            Some(alt) => alt.text.clone(),
            None => {
                warn!("model reply contained no alternatives");
                return AnalysisResult::from_error("API response contained no alternatives.");
            }
        },
    };

    let mut result = AnalysisResult {
        raw_response: message.clone(),
        ..Default::default()
    };

    for (name, strategy) in STRATEGIES {
        if let Some(fields) = strategy(&message) {
            debug!("normalized model reply via {} strategy", name);
            result.quality_issues = fields.quality_issues;
            result.good_practices = fields.good_practices;
            result.patterns = fields.patterns;
            result.anti_patterns = fields.anti_patterns;
            result.overall_score = fields.overall_score;
            return result;
        }
    }

    debug!("no extraction strategy matched the model reply");
    result
}

/* ------------------------------------------------------------------------- */
/* Tier 1: the reply itself is a JSON object                                 */
/* ------------------------------------------------------------------------- */

/// The trimmed reply is a JSON object, possibly wrapped in a single
/// ```json fence.
fn extract_direct_json(message: &str) -> Option<ExtractedFields> {
    let mut cleaned = message.trim();
    if let Some(rest) = cleaned.strip_prefix("```json") {
        cleaned = rest.trim().strip_suffix("```").unwrap_or(rest).trim_end();
        cleaned = cleaned.trim();
    }

    if !(cleaned.starts_with('{') && cleaned.ends_with('}')) {
        return None;
    }

    match serde_json::from_str::<Value>(cleaned) {
        Ok(value) => fields_from_json(&value),
        Err(err) => {
            warn!("reply looked like a JSON object but failed to parse: {}", err);
            None
        }
    }
}

/* ------------------------------------------------------------------------- */
/* Tier 2: a fenced JSON block somewhere in the reply                        */
/* ------------------------------------------------------------------------- */

lazy_static! {
    static ref FENCED_JSON_RE: Regex =
        Regex::new(r"(?s)```json\s*(\{.*?\})\s*```").expect("fenced json regex");
}

/// First fenced ```json block anywhere in the reply.
fn extract_fenced_json(message: &str) -> Option<ExtractedFields> {
    let captures = FENCED_JSON_RE.captures(message)?;
    match serde_json::from_str::<Value>(&captures[1]) {
        Ok(value) => fields_from_json(&value),
        Err(err) => {
            warn!("failed to parse extracted JSON block: {}", err);
            None
        }
    }
}

/* ------------------------------------------------------------------------- */
/* Shared JSON field extraction                                              */
/* ------------------------------------------------------------------------- */

/// Pulls the schema fields out of a parsed JSON value.
///
/// Absent or malformed fields degrade to empty instead of failing the tier:
/// once we hold a JSON object, it is the best grounding we will get.
fn fields_from_json(value: &Value) -> Option<ExtractedFields> {
    let obj = value.as_object()?;
    Some(ExtractedFields {
        quality_issues: string_list("quality_issues", obj.get("quality_issues")),
        good_practices: string_list("good_practices", obj.get("good_practices")),
        patterns: string_list("patterns", obj.get("patterns")),
        anti_patterns: string_list("anti_patterns", obj.get("anti_patterns")),
        overall_score: score_value(obj.get("overall_score")),
    })
}

/// Coerces a JSON value into a list of strings. Non-lists become empty;
/// non-string items are stringified rather than dropped.
fn string_list(field: &str, value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(_) => {
            warn!("field '{}' is not a list, resetting to empty list", field);
            Vec::new()
        }
        None => Vec::new(),
    }
}

/// Accepts numeric and numeric-string scores; anything else is dropped.
fn score_value(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(score) => Some(score),
            Err(_) => {
                warn!("could not convert overall_score '{}' to float", s);
                None
            }
        },
        other => {
            warn!("could not convert overall_score '{}' to float", other);
            None
        }
    }
}

/* ------------------------------------------------------------------------- */
/* Tier 3: numbered prose sections                                           */
/* ------------------------------------------------------------------------- */

lazy_static! {
    static ref QUALITY_SECTION_RE: Regex =
        Regex::new(r"(?si)1\.\s*Code quality issues:?\s*\n(.*?)(?:\n\s*2\.|\z)")
            .expect("quality section regex");
    static ref PRACTICES_SECTION_RE: Regex =
        Regex::new(r"(?si)2\.\s*Good practices:?\s*\n(.*?)(?:\n\s*3\.|\z)")
            .expect("practices section regex");
    static ref SCORE_RE: Regex =
        Regex::new(r"(?si)3\.\s*Overall quality score:?\s*.*?(\d+(?:\.\d+)?)\s*(?:/|out of)\s*10")
            .expect("score regex");
    static ref BULLET_ITEM_RE: Regex =
        Regex::new(r"(?m)^\s*[-•*]\s+(.*)").expect("bullet item regex");
    static ref NUMBERED_ITEM_RE: Regex =
        Regex::new(r"(?m)^\s*\d+\.\s+(.*)").expect("numbered item regex");
}

/// Numbered prose sections following the prompt's enumeration.
///
/// Returns `None` when no section is recognizable at all, so an ungrounded
/// reply falls through to an empty, error-free result.
fn extract_enumerated_sections(message: &str) -> Option<ExtractedFields> {
    let quality_issues = QUALITY_SECTION_RE
        .captures(message)
        .map(|c| list_items(c[1].trim()))
        .unwrap_or_default();
    let good_practices = PRACTICES_SECTION_RE
        .captures(message)
        .map(|c| list_items(c[1].trim()))
        .unwrap_or_default();
    let overall_score = SCORE_RE
        .captures(message)
        .and_then(|c| c[1].parse::<f64>().ok());

    if quality_issues.is_empty() && good_practices.is_empty() && overall_score.is_none() {
        return None;
    }

    warn!("fell back to prose extraction; patterns and anti-patterns are left empty");
    Some(ExtractedFields {
        quality_issues,
        good_practices,
        overall_score,
        ..Default::default()
    })
}

/// Bullet-prefixed items first; falls back to numbered items.
fn list_items(section: &str) -> Vec<String> {
    let bullets: Vec<String> = BULLET_ITEM_RE
        .captures_iter(section)
        .map(|c| c[1].trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();
    if !bullets.is_empty() {
        return bullets;
    }
    NUMBERED_ITEM_RE
        .captures_iter(section)
        .map(|c| c[1].trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReplyAlternative;

    fn completed(text: &str) -> ModelReply {
        ModelReply::Completed(vec![ReplyAlternative {
            text: text.to_string(),
        }])
    }

    const SCHEMA_REPLY: &str = r#"{"quality_issues":["X"],"good_practices":[],"patterns":[],"anti_patterns":[],"overall_score":7.5}"#;

    #[test]
    fn direct_json_fields_are_taken_verbatim() {
        let result = normalize(&completed(SCHEMA_REPLY));
        assert_eq!(result.quality_issues, vec!["X"]);
        assert!(result.good_practices.is_empty());
        assert_eq!(result.overall_score, Some(7.5));
        assert!(result.error.is_none());
        assert_eq!(result.raw_response, SCHEMA_REPLY);
    }

    #[test]
    fn fenced_reply_parses_in_tier_one() {
        let text = format!("```json\n{SCHEMA_REPLY}\n```");
        let result = normalize(&completed(&text));
        assert_eq!(result.quality_issues, vec!["X"]);
        assert_eq!(result.overall_score, Some(7.5));
        assert!(result.error.is_none());
        assert_eq!(result.raw_response, text);
    }

    #[test]
    fn json_buried_in_prose_parses_in_tier_two() {
        let text = format!(
            "Here is my detailed review.\n\n```json\n{SCHEMA_REPLY}\n```\n\nHope this helps!"
        );
        let result = normalize(&completed(&text));
        assert_eq!(result.quality_issues, vec!["X"]);
        assert_eq!(result.overall_score, Some(7.5));
    }

    #[test]
    fn numbered_prose_parses_in_tier_three() {
        let text = "\
1. Code quality issues:
   - Magic numbers in config.py
   - Long function in utils.py
2. Good practices:
   - Clear naming throughout
3. Overall quality score: 8/10 because the change is small and tidy.";
        let result = normalize(&completed(text));
        assert_eq!(
            result.quality_issues,
            vec!["Magic numbers in config.py", "Long function in utils.py"]
        );
        assert_eq!(result.good_practices, vec!["Clear naming throughout"]);
        assert_eq!(result.overall_score, Some(8.0));
        assert!(result.patterns.is_empty());
        assert!(result.anti_patterns.is_empty());
        assert!(result.error.is_none());
    }

    #[test]
    fn prose_score_accepts_out_of_ten_wording() {
        let text = "1. Code quality issues:\n- none\n3. Overall quality score: 9.5 out of 10";
        let result = normalize(&completed(text));
        assert_eq!(result.overall_score, Some(9.5));
    }

    #[test]
    fn ungrounded_prose_yields_empty_result_without_error() {
        let text = "The change looks reasonable overall and I have no structured feedback.";
        let result = normalize(&completed(text));
        assert!(result.quality_issues.is_empty());
        assert!(result.good_practices.is_empty());
        assert!(result.patterns.is_empty());
        assert!(result.anti_patterns.is_empty());
        assert_eq!(result.overall_score, None);
        assert!(result.error.is_none());
        assert_eq!(result.raw_response, text);
    }

    #[test]
    fn failed_reply_short_circuits_with_error() {
        let result = normalize(&ModelReply::Failed("connection refused".into()));
        assert_eq!(result.error.as_deref(), Some("API Error: connection refused"));
        assert!(result.quality_issues.is_empty());
        assert_eq!(result.overall_score, None);
    }

    #[test]
    fn empty_alternatives_degrade_to_error() {
        let result = normalize(&ModelReply::Completed(Vec::new()));
        assert!(result.error.is_some());
    }

    #[test]
    fn score_as_string_is_coerced() {
        let text = r#"{"quality_issues":[],"good_practices":[],"patterns":[],"anti_patterns":[],"overall_score":"7.5"}"#;
        let result = normalize(&completed(text));
        assert_eq!(result.overall_score, Some(7.5));
    }

    #[test]
    fn out_of_range_score_passes_through_unclamped() {
        let text = r#"{"quality_issues":[],"good_practices":[],"patterns":[],"anti_patterns":[],"overall_score":12.4}"#;
        let result = normalize(&completed(text));
        assert_eq!(result.overall_score, Some(12.4));
    }

    #[test]
    fn non_list_fields_reset_to_empty() {
        let text = r#"{"quality_issues":"oops","good_practices":[1,2],"overall_score":null}"#;
        let result = normalize(&completed(text));
        assert!(result.quality_issues.is_empty());
        // Non-string items are stringified, not dropped.
        assert_eq!(result.good_practices, vec!["1", "2"]);
        assert_eq!(result.overall_score, None);
    }

    #[test]
    fn broken_direct_json_falls_through_to_later_tiers() {
        let text = "{not json at all\n\n1. Code quality issues:\n- trailing brace}";
        let result = normalize(&completed(text));
        assert_eq!(result.quality_issues, vec!["trailing brace}"]);
    }

    #[test]
    fn only_first_alternative_is_normalized() {
        let reply = ModelReply::Completed(vec![
            ReplyAlternative {
                text: SCHEMA_REPLY.to_string(),
            },
            ReplyAlternative {
                text: "ignored".to_string(),
            },
        ]);
        let result = normalize(&reply);
        assert_eq!(result.quality_issues, vec!["X"]);
        assert_eq!(result.raw_response, SCHEMA_REPLY);
    }
}
