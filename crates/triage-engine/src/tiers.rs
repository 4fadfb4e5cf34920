use std::collections::HashSet;

use triage_models::agent::AgentCode;
use triage_models::candidate::{Candidate, ConfidenceTier, TierThresholds};
use triage_models::selection::ConfidenceDistribution;

/// Candidates partitioned into confidence bands, each preserving input order.
#[derive(Debug, Default)]
pub struct TierSet {
    pub critical: Vec<Candidate>,
    pub high: Vec<Candidate>,
    pub medium: Vec<Candidate>,
    pub low: Vec<Candidate>,
}

impl TierSet {
    pub fn len(&self) -> usize {
        self.critical.len() + self.high.len() + self.medium.len() + self.low.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partition candidates into tiers. Candidates below the low threshold are
/// discarded and never reconsidered; duplicate agent codes are dropped on
/// intake, first occurrence winning.
pub fn partition(candidates: Vec<Candidate>, thresholds: &TierThresholds) -> TierSet {
    let mut seen: HashSet<AgentCode> = HashSet::new();
    let mut tiers = TierSet::default();

    for candidate in candidates {
        if !seen.insert(candidate.agent_code) {
            continue;
        }
        match thresholds.tier_of(candidate.confidence) {
            Some(ConfidenceTier::Critical) => tiers.critical.push(candidate),
            Some(ConfidenceTier::High) => tiers.high.push(candidate),
            Some(ConfidenceTier::Medium) => tiers.medium.push(candidate),
            Some(ConfidenceTier::Low) => tiers.low.push(candidate),
            None => {}
        }
    }
    tiers
}

/// Band counts for the final selection. Anything below the medium threshold,
/// including synthesized candidates under the low threshold, counts as low.
pub fn distribution(
    candidates: &[Candidate],
    thresholds: &TierThresholds,
) -> ConfidenceDistribution {
    let mut distribution = ConfidenceDistribution::default();
    for candidate in candidates {
        match thresholds.tier_of(candidate.confidence) {
            Some(ConfidenceTier::Critical) => distribution.critical += 1,
            Some(ConfidenceTier::High) => distribution.high += 1,
            Some(ConfidenceTier::Medium) => distribution.medium += 1,
            _ => distribution.low += 1,
        }
    }
    distribution
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn scored(code: AgentCode, confidence: rust_decimal::Decimal) -> Candidate {
        Candidate::scored(code, confidence, "test")
    }

    #[test]
    fn each_candidate_lands_in_exactly_one_tier() {
        let thresholds = TierThresholds::default();
        let candidates = vec![
            scored(AgentCode::Security, dec!(0.90)),
            scored(AgentCode::Testing, dec!(0.80)),
            scored(AgentCode::Performance, dec!(0.65)),
            scored(AgentCode::Docs, dec!(0.45)),
            scored(AgentCode::Cost, dec!(0.20)),
        ];

        let tiers = partition(candidates, &thresholds);
        assert_eq!(tiers.critical.len(), 1);
        assert_eq!(tiers.high.len(), 1);
        assert_eq!(tiers.medium.len(), 1);
        assert_eq!(tiers.low.len(), 1);
        // The 0.20 candidate is discarded entirely.
        assert_eq!(tiers.len(), 4);
    }

    #[test]
    fn tier_boundaries_are_inclusive_at_the_bottom() {
        let thresholds = TierThresholds::default();
        let tiers = partition(
            vec![
                scored(AgentCode::Security, dec!(0.85)),
                scored(AgentCode::Testing, dec!(0.75)),
                scored(AgentCode::Performance, dec!(0.60)),
                scored(AgentCode::Docs, dec!(0.40)),
            ],
            &thresholds,
        );

        assert_eq!(tiers.critical[0].agent_code, AgentCode::Security);
        assert_eq!(tiers.high[0].agent_code, AgentCode::Testing);
        assert_eq!(tiers.medium[0].agent_code, AgentCode::Performance);
        assert_eq!(tiers.low[0].agent_code, AgentCode::Docs);
    }

    #[test]
    fn input_order_is_preserved_within_a_tier() {
        let thresholds = TierThresholds::default();
        let tiers = partition(
            vec![
                scored(AgentCode::Performance, dec!(0.62)),
                scored(AgentCode::Database, dec!(0.70)),
                scored(AgentCode::Api, dec!(0.65)),
            ],
            &thresholds,
        );

        let codes: Vec<AgentCode> = tiers.medium.iter().map(|c| c.agent_code).collect();
        assert_eq!(
            codes,
            vec![AgentCode::Performance, AgentCode::Database, AgentCode::Api]
        );
    }

    #[test]
    fn duplicate_codes_first_occurrence_wins() {
        let thresholds = TierThresholds::default();
        let tiers = partition(
            vec![
                scored(AgentCode::Security, dec!(0.90)),
                scored(AgentCode::Security, dec!(0.50)),
            ],
            &thresholds,
        );

        assert_eq!(tiers.len(), 1);
        assert_eq!(tiers.critical[0].confidence, dec!(0.90));
    }

    #[test]
    fn distribution_counts_sub_low_as_low() {
        let thresholds = TierThresholds::default();
        let candidates = vec![
            scored(AgentCode::Security, dec!(0.90)),
            scored(AgentCode::Performance, dec!(0.65)),
            scored(AgentCode::Docs, dec!(0.30)),
        ];

        let distribution = distribution(&candidates, &thresholds);
        assert_eq!(distribution.critical, 1);
        assert_eq!(distribution.medium, 1);
        assert_eq!(distribution.low, 1);
        assert_eq!(distribution.high, 0);
    }
}
