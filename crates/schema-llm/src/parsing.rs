//! Strict-JSON response parsing (§4.4). Grounded on the teacher's
//! `intent_extractor::parse_response` fence-stripping convention: never
//! retried — a malformed response aborts the task outright.

use serde::{Deserialize, Serialize};

use schema_core::error::SchemaIntelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjudicationAction {
    Confirm,
    Reject,
    NeedsReview,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Decision {
    pub candidate_id: String,
    pub action: AdjudicationAction,
    pub confidence: f64,
    pub reasoning: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewRelationship {
    pub source_table: String,
    pub source_column: String,
    pub target_table: String,
    pub target_column: String,
    pub cardinality: String,
    pub reasoning: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AdjudicationOutput {
    #[serde(default)]
    pub decisions: Vec<Decision>,
    #[serde(default)]
    pub new_relationships: Vec<NewRelationship>,
}

/// Strip a leading ` ```json ` / ` ``` ` fence and a trailing ` ``` ` the way
/// most LLM providers wrap JSON-mode output even when not asked to.
fn strip_code_fence(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Parses a raw LLM response into `AdjudicationOutput`. Never retried: a
/// parse failure means the task aborts with `ParseError` and no partial
/// decisions are applied (§4.4).
pub fn parse_llm_response(raw: &str) -> Result<AdjudicationOutput, SchemaIntelError> {
    let cleaned = strip_code_fence(raw);
    serde_json::from_str(cleaned).map_err(|e| {
        SchemaIntelError::ParseError(format!("adjudication response is not valid JSON: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json() {
        let raw = r#"{"decisions":[{"candidate_id":"c1","action":"confirm","confidence":0.9,"reasoning":"fk-like"}],"new_relationships":[]}"#;
        let out = parse_llm_response(raw).unwrap();
        assert_eq!(out.decisions.len(), 1);
        assert_eq!(out.decisions[0].action, AdjudicationAction::Confirm);
    }

    #[test]
    fn strips_fenced_code_block() {
        let raw = "```json\n{\"decisions\":[],\"new_relationships\":[]}\n```";
        let out = parse_llm_response(raw).unwrap();
        assert!(out.decisions.is_empty());
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let out = parse_llm_response("{}").unwrap();
        assert!(out.decisions.is_empty());
        assert!(out.new_relationships.is_empty());
    }

    #[test]
    fn garbage_input_is_a_parse_error_not_a_panic() {
        let err = parse_llm_response("not json at all").unwrap_err();
        assert!(matches!(err, SchemaIntelError::ParseError(_)));
    }
}
