use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::agent::AgentCode;
use crate::config::ConfigError;

/// How a candidate entered the working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateOrigin {
    /// Produced directly by the signal scorer.
    Scored,
    /// Synthesized because a selected agent declares it as a prerequisite.
    Dependency,
    /// Synthesized to complete a mostly-present synergy group.
    Synergy,
}

/// A proposed agent with an associated confidence for the current request.
///
/// Within one selection run there is at most one live candidate per
/// `agent_code`; when a synthesized candidate would duplicate an existing one,
/// the existing one wins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub agent_code: AgentCode,
    /// 0.0 to 1.0.
    pub confidence: Decimal,
    pub reasoning: String,
    pub origin: CandidateOrigin,
}

impl Candidate {
    pub fn scored(agent_code: AgentCode, confidence: Decimal, reasoning: impl Into<String>) -> Self {
        Self {
            agent_code,
            confidence,
            reasoning: reasoning.into(),
            origin: CandidateOrigin::Scored,
        }
    }

    /// Ordering class used by the max-agent cap:
    /// critical > high > dependency > synergy > normal.
    pub fn priority_class(&self, thresholds: &TierThresholds) -> u8 {
        match self.origin {
            CandidateOrigin::Dependency => 2,
            CandidateOrigin::Synergy => 1,
            CandidateOrigin::Scored => match thresholds.tier_of(self.confidence) {
                Some(ConfidenceTier::Critical) => 4,
                Some(ConfidenceTier::High) => 3,
                _ => 0,
            },
        }
    }
}

/// Confidence band governing default inclusion policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    Critical,
    High,
    Medium,
    Low,
}

/// The four ascending tier boundaries.
///
/// Must satisfy `low < medium < high < critical`, all within [0, 1];
/// violations are rejected at selector construction, never at request time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierThresholds {
    pub low: Decimal,
    pub medium: Decimal,
    pub high: Decimal,
    pub critical: Decimal,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            low: Decimal::new(40, 2),
            medium: Decimal::new(60, 2),
            high: Decimal::new(75, 2),
            critical: Decimal::new(85, 2),
        }
    }
}

impl TierThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for value in [self.low, self.medium, self.high, self.critical] {
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(ConfigError::ThresholdRange(value));
            }
        }
        if self.low < self.medium && self.medium < self.high && self.high < self.critical {
            Ok(())
        } else {
            Err(ConfigError::ThresholdOrder {
                low: self.low,
                medium: self.medium,
                high: self.high,
                critical: self.critical,
            })
        }
    }

    /// The tier a confidence falls into, or `None` below the low threshold.
    pub fn tier_of(&self, confidence: Decimal) -> Option<ConfidenceTier> {
        if confidence >= self.critical {
            Some(ConfidenceTier::Critical)
        } else if confidence >= self.high {
            Some(ConfidenceTier::High)
        } else if confidence >= self.medium {
            Some(ConfidenceTier::Medium)
        } else if confidence >= self.low {
            Some(ConfidenceTier::Low)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn roundtrip_candidate() {
        let candidate = Candidate::scored(
            AgentCode::Security,
            dec!(0.90),
            "Request mentions authentication",
        );

        let json = serde_json::to_string(&candidate).unwrap();
        let deserialized: Candidate = serde_json::from_str(&json).unwrap();
        assert_eq!(candidate, deserialized);
    }

    #[test]
    fn origin_serialization() {
        assert_eq!(
            serde_json::to_string(&CandidateOrigin::Dependency).unwrap(),
            "\"dependency\""
        );
        assert_eq!(
            serde_json::to_string(&CandidateOrigin::Synergy).unwrap(),
            "\"synergy\""
        );
    }

    #[test]
    fn default_thresholds_are_valid() {
        assert!(TierThresholds::default().validate().is_ok());
    }

    #[test]
    fn inverted_thresholds_rejected() {
        let thresholds = TierThresholds {
            low: dec!(0.60),
            medium: dec!(0.40),
            high: dec!(0.75),
            critical: dec!(0.85),
        };
        assert!(matches!(
            thresholds.validate(),
            Err(ConfigError::ThresholdOrder { .. })
        ));
    }

    #[test]
    fn equal_thresholds_rejected() {
        let thresholds = TierThresholds {
            low: dec!(0.40),
            medium: dec!(0.40),
            high: dec!(0.75),
            critical: dec!(0.85),
        };
        assert!(thresholds.validate().is_err());
    }

    #[test]
    fn out_of_range_threshold_rejected() {
        let thresholds = TierThresholds {
            low: dec!(0.40),
            medium: dec!(0.60),
            high: dec!(0.75),
            critical: dec!(1.10),
        };
        assert_eq!(
            thresholds.validate(),
            Err(ConfigError::ThresholdRange(dec!(1.10)))
        );
    }

    #[test]
    fn every_confidence_lands_in_exactly_one_tier() {
        let thresholds = TierThresholds::default();
        let cases = [
            (dec!(0.90), Some(ConfidenceTier::Critical)),
            (dec!(0.85), Some(ConfidenceTier::Critical)),
            (dec!(0.80), Some(ConfidenceTier::High)),
            (dec!(0.75), Some(ConfidenceTier::High)),
            (dec!(0.65), Some(ConfidenceTier::Medium)),
            (dec!(0.60), Some(ConfidenceTier::Medium)),
            (dec!(0.45), Some(ConfidenceTier::Low)),
            (dec!(0.40), Some(ConfidenceTier::Low)),
            (dec!(0.39), None),
            (dec!(0.00), None),
        ];
        for (confidence, expected) in cases {
            assert_eq!(thresholds.tier_of(confidence), expected, "at {confidence}");
        }
    }

    #[test]
    fn priority_class_ordering() {
        let thresholds = TierThresholds::default();
        let critical = Candidate::scored(AgentCode::Security, dec!(0.90), "x");
        let high = Candidate::scored(AgentCode::Api, dec!(0.80), "x");
        let normal = Candidate::scored(AgentCode::Docs, dec!(0.65), "x");
        let dependency = Candidate {
            origin: CandidateOrigin::Dependency,
            ..Candidate::scored(AgentCode::Database, dec!(0.72), "x")
        };
        let synergy = Candidate {
            origin: CandidateOrigin::Synergy,
            ..Candidate::scored(AgentCode::Cost, dec!(0.70), "x")
        };

        assert_eq!(critical.priority_class(&thresholds), 4);
        assert_eq!(high.priority_class(&thresholds), 3);
        assert_eq!(dependency.priority_class(&thresholds), 2);
        assert_eq!(synergy.priority_class(&thresholds), 1);
        assert_eq!(normal.priority_class(&thresholds), 0);
    }
}
