use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::warn;

use triage_models::candidate::Candidate;

use crate::error::EngineError;

/// Extract the first JSON object from text that may contain surrounding prose.
///
/// Handles the formats classifier CLIs are known to emit:
/// - Clean JSON: `{"candidates": [...]}`
/// - Markdown-fenced: ```json\n{...}\n```
/// - Prefixed: `Here is the selection:\n{...}`
pub fn extract_json(text: &str) -> Result<String, EngineError> {
    let trimmed = text.trim();

    if trimmed.starts_with('{') && serde_json::from_str::<serde_json::Value>(trimmed).is_ok() {
        return Ok(trimmed.to_string());
    }

    if let Some(candidate) = fenced_block(trimmed) {
        if serde_json::from_str::<serde_json::Value>(&candidate).is_ok() {
            return Ok(candidate);
        }
    }

    if let Some(candidate) = first_balanced_object(trimmed) {
        if serde_json::from_str::<serde_json::Value>(&candidate).is_ok() {
            return Ok(candidate);
        }
    }

    Err(EngineError::Parse(format!(
        "No valid JSON object found in classifier output (length={})",
        text.len()
    )))
}

/// Contents of the first ```json (or bare ```) fence, if any.
fn fenced_block(text: &str) -> Option<String> {
    for marker in ["```json\n", "```json\r\n", "```\n", "```\r\n"] {
        if let Some(open) = text.find(marker) {
            let body_start = open + marker.len();
            if let Some(close) = text[body_start..].find("```") {
                return Some(text[body_start..body_start + close].trim().to_string());
            }
        }
    }
    None
}

/// The first balanced `{ ... }` span, respecting string literals and escapes.
fn first_balanced_object(text: &str) -> Option<String> {
    let mut depth = 0usize;
    let mut span_start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (position, ch) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => {
                if depth == 0 {
                    span_start = Some(position);
                }
                depth += 1;
            }
            '}' if !in_string && depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return span_start.map(|start| text[start..=position].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Envelope the external classifier is prompted to emit.
#[derive(Debug, Deserialize)]
struct CandidateEnvelope {
    candidates: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawCandidate {
    agent_code: triage_models::AgentCode,
    confidence: Decimal,
    reasoning: String,
}

/// Parse scored candidates from raw classifier output.
///
/// The envelope must be present and well-formed; individual entries that
/// violate the contract (unknown codes, out-of-range confidence, missing
/// fields) are dropped with a warning rather than failing the whole score.
pub fn parse_candidates(raw: &str) -> Result<Vec<Candidate>, EngineError> {
    let json_str = extract_json(raw)?;
    let envelope: CandidateEnvelope = serde_json::from_str(&json_str)
        .map_err(|e| EngineError::Parse(format!("Classifier envelope: {e}")))?;

    let mut candidates = Vec::new();
    for value in envelope.candidates {
        match serde_json::from_value::<RawCandidate>(value) {
            Ok(raw) if raw.confidence >= Decimal::ZERO && raw.confidence <= Decimal::ONE => {
                candidates.push(Candidate::scored(
                    raw.agent_code,
                    raw.confidence,
                    raw.reasoning,
                ));
            }
            Ok(raw) => {
                warn!(
                    code = %raw.agent_code,
                    confidence = %raw.confidence,
                    "Dropping classifier candidate with out-of-range confidence"
                );
            }
            Err(e) => {
                warn!(error = %e, "Dropping malformed classifier candidate");
            }
        }
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use triage_models::AgentCode;

    #[test]
    fn extract_clean_json() {
        let input = r#"{"candidates": []}"#;
        assert_eq!(extract_json(input).unwrap(), input);
    }

    #[test]
    fn extract_from_fenced_block() {
        let input = "Selection below:\n```json\n{\"candidates\": []}\n```\nDone.";
        assert_eq!(extract_json(input).unwrap(), r#"{"candidates": []}"#);
    }

    #[test]
    fn extract_from_bare_fence() {
        let input = "```\n{\"candidates\": []}\n```";
        assert_eq!(extract_json(input).unwrap(), r#"{"candidates": []}"#);
    }

    #[test]
    fn extract_with_prefix_text() {
        let input = "Based on the request I selected:\n{\"candidates\": [{\"agent_code\": \"API\", \"confidence\": \"0.8\", \"reasoning\": \"endpoints\"}]}";
        assert!(extract_json(input).unwrap().contains("API"));
    }

    #[test]
    fn braces_inside_strings_do_not_confuse_extraction() {
        let input = r#"{"candidates": [{"agent_code": "DOCS", "confidence": "0.5", "reasoning": "mentions {braces} inline"}]}"#;
        let parsed = parse_candidates(input).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].agent_code, AgentCode::Docs);
    }

    #[test]
    fn extract_plain_text_fails() {
        assert!(extract_json("no json here at all").is_err());
    }

    #[test]
    fn parse_full_envelope() {
        let input = r#"```json
{
    "candidates": [
        {"agent_code": "SECURITY", "confidence": "0.90", "reasoning": "auth flow"},
        {"agent_code": "PERFORMANCE", "confidence": "0.65", "reasoning": "slow query"}
    ]
}
```"#;

        let candidates = parse_candidates(input).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].agent_code, AgentCode::Security);
        assert_eq!(candidates[0].confidence, dec!(0.90));
        assert_eq!(candidates[1].agent_code, AgentCode::Performance);
    }

    #[test]
    fn malformed_entries_are_dropped_not_fatal() {
        let input = r#"{
            "candidates": [
                {"agent_code": "SECURITY", "confidence": "0.90", "reasoning": "ok"},
                {"agent_code": "NOT_AN_AGENT", "confidence": "0.50", "reasoning": "unknown"},
                {"agent_code": "DATABASE", "confidence": "1.50", "reasoning": "out of range"},
                {"agent_code": "API"}
            ]
        }"#;

        let candidates = parse_candidates(input).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].agent_code, AgentCode::Security);
    }

    #[test]
    fn missing_envelope_is_fatal() {
        let result = parse_candidates(r#"{"agents": []}"#);
        assert!(result.is_err());
    }
}
