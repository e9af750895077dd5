//! Response Parser: turns an untrusted model reply into triage data.
//!
//! Models are told to answer with raw JSON, but real replies come back
//! fenced, prefixed with prose, or not as JSON at all. Parsing is
//! best-effort by contract: any shape we cannot read yields `None`,
//! never an error, and the pipeline continues without triage data.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::Priority;

/// Triage data merged into a ticket. `priority` is already normalized:
/// anything the model said outside {low, medium, high} became medium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageResult {
    pub summary: Option<String>,
    pub priority: Priority,
    pub helpful_notes: Option<String>,
    pub related_skills: Vec<String>,
}

/// Field names as the model emits them (camelCase, everything optional).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTriage {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    helpful_notes: Option<String>,
    #[serde(default)]
    related_skills: Vec<String>,
}

static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)```json\s*(.*?)\s*```").expect("fenced-json pattern"));

impl TriageResult {
    /// Interpret an already-structured payload. Non-objects are not
    /// triage data.
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value::<RawTriage>(value.clone())
            .ok()
            .map(Self::from_raw)
    }

    fn from_raw(raw: RawTriage) -> Self {
        Self {
            summary: raw.summary,
            priority: raw
                .priority
                .as_deref()
                .and_then(Priority::parse)
                .unwrap_or(Priority::Medium),
            helpful_notes: raw.helpful_notes,
            related_skills: raw.related_skills,
        }
    }
}

/// Extract triage data from a raw model reply.
///
/// Tries, in order: a ```json fenced block, the whole trimmed reply, and
/// the first balanced `{...}` substring for replies with surrounding
/// prose.
pub fn parse_triage(raw: &str) -> Option<TriageResult> {
    let candidate = match FENCED_JSON.captures(raw) {
        Some(captures) => captures.get(1)?.as_str(),
        None => raw.trim(),
    };

    if let Some(result) = try_parse(candidate) {
        return Some(result);
    }
    first_json_object(candidate).and_then(try_parse)
}

fn try_parse(s: &str) -> Option<TriageResult> {
    let value = serde_json::from_str::<Value>(s).ok()?;
    TriageResult::from_value(&value)
}

/// First balanced `{...}` substring, tracking strings and escapes so
/// braces inside JSON string values do not throw off the depth count.
fn first_json_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in s[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start..start + i + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json() {
        let result = parse_triage(
            r#"{"summary":"s","priority":"high","helpfulNotes":"n","relatedSkills":["React"]}"#,
        )
        .unwrap();
        assert_eq!(result.summary.as_deref(), Some("s"));
        assert_eq!(result.priority, Priority::High);
        assert_eq!(result.helpful_notes.as_deref(), Some("n"));
        assert_eq!(result.related_skills, vec!["React".to_string()]);
    }

    #[test]
    fn parses_fenced_block_and_normalizes_unknown_priority() {
        let raw = "Here you go:\n```json\n{\"summary\":\"x\",\"priority\":\"URGENT\",\"helpfulNotes\":\"n\",\"relatedSkills\":[\"Go\"]}\n```";
        let result = parse_triage(raw).unwrap();
        assert_eq!(result.priority, Priority::Medium);
        assert_eq!(result.related_skills, vec!["Go".to_string()]);
    }

    #[test]
    fn parses_object_embedded_in_prose() {
        let raw = "Sure! The analysis is {\"priority\":\"low\",\"relatedSkills\":[]} — hope that helps.";
        let result = parse_triage(raw).unwrap();
        assert_eq!(result.priority, Priority::Low);
    }

    #[test]
    fn braces_inside_strings_do_not_confuse_extraction() {
        let raw = r#"note: {"summary":"use {curly} braces","priority":"high"} trailing"#;
        let result = parse_triage(raw).unwrap();
        assert_eq!(result.summary.as_deref(), Some("use {curly} braces"));
        assert_eq!(result.priority, Priority::High);
    }

    #[test]
    fn missing_priority_defaults_to_medium() {
        let result = parse_triage(r#"{"summary":"s"}"#).unwrap();
        assert_eq!(result.priority, Priority::Medium);
        assert!(result.related_skills.is_empty());
    }

    #[test]
    fn garbage_yields_no_data() {
        assert_eq!(parse_triage("the model refused to answer"), None);
        assert_eq!(parse_triage(""), None);
        assert_eq!(parse_triage("{\"unterminated\": "), None);
    }

    #[test]
    fn non_object_json_yields_no_data() {
        assert_eq!(parse_triage("[1, 2, 3]"), None);
        assert_eq!(parse_triage("\"just a string\""), None);
    }

    #[test]
    fn from_value_accepts_structured_input() {
        let value = serde_json::json!({
            "summary": "s",
            "priority": "low",
            "relatedSkills": ["MongoDB"]
        });
        let result = TriageResult::from_value(&value).unwrap();
        assert_eq!(result.priority, Priority::Low);
        assert_eq!(result.related_skills, vec!["MongoDB".to_string()]);
        assert_eq!(TriageResult::from_value(&serde_json::json!(42)), None);
    }

    #[test]
    fn fenced_block_wins_over_surrounding_text() {
        let raw = "prefix {\"priority\":\"low\"}\n```json\n{\"priority\":\"high\"}\n```";
        let result = parse_triage(raw).unwrap();
        assert_eq!(result.priority, Priority::High);
    }
}
