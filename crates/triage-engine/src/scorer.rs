use async_trait::async_trait;
use rust_decimal::Decimal;

use triage_models::agent::AgentCode;
use triage_models::candidate::Candidate;
use triage_models::request::RequestContext;

use crate::error::EngineError;

/// Contract with the natural-language scorer.
///
/// The engine tolerates both failure modes: an `Err` and an empty candidate
/// list each degrade into an explanatory empty selection. Mockable for
/// testing.
#[async_trait]
pub trait SignalScorer: Send + Sync {
    fn name(&self) -> &str;

    async fn score(
        &self,
        request_text: &str,
        context: &RequestContext,
    ) -> Result<Vec<Candidate>, EngineError>;
}

/// Deterministic fallback scorer driven by the descriptors' trigger
/// heuristics. Used when no external classifier is configured or reachable.
///
/// Weights per hit: content keyword 0.3, current file marker 0.4 (first
/// marker per file), recent error keyword 0.5, changed file marker 0.2.
/// Scores are capped at 1.0. Threshold policy is left entirely to the
/// tiering stage.
pub struct RuleScorer;

#[async_trait]
impl SignalScorer for RuleScorer {
    fn name(&self) -> &str {
        "rules"
    }

    async fn score(
        &self,
        request_text: &str,
        context: &RequestContext,
    ) -> Result<Vec<Candidate>, EngineError> {
        let text = request_text.to_lowercase();
        let mut candidates = Vec::new();

        for code in AgentCode::ALL {
            let descriptor = code.descriptor();
            let mut score = Decimal::ZERO;
            let mut reasons: Vec<String> = Vec::new();

            for keyword in descriptor.content_keywords {
                if text.contains(keyword) {
                    score += Decimal::new(3, 1);
                    reasons.push(format!("request mentions \"{keyword}\""));
                }
            }

            for file in &context.current_files {
                let lowered = file.to_lowercase();
                for marker in descriptor.file_markers {
                    if lowered.contains(marker) {
                        score += Decimal::new(4, 1);
                        reasons.push(format!("working with {file}"));
                        break;
                    }
                }
            }

            for error in &context.recent_errors {
                let lowered = error.to_lowercase();
                for keyword in descriptor.error_keywords {
                    if lowered.contains(keyword) {
                        score += Decimal::new(5, 1);
                        reasons.push(format!("recent error matches \"{keyword}\""));
                    }
                }
            }

            for file in &context.changed_files {
                let lowered = file.to_lowercase();
                for marker in descriptor.file_markers {
                    if lowered.contains(marker) {
                        score += Decimal::new(2, 1);
                        reasons.push(format!("recent changes in {file}"));
                    }
                }
            }

            if score > Decimal::ZERO {
                candidates.push(Candidate::scored(
                    code,
                    score.min(Decimal::ONE),
                    reasons.join("; "),
                ));
            }
        }

        candidates.sort_by(|a, b| {
            b.confidence.cmp(&a.confidence).then(
                b.agent_code
                    .descriptor()
                    .base_priority
                    .cmp(&a.agent_code.descriptor().base_priority),
            )
        });

        Ok(candidates)
    }
}
