use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agent::AgentCode;
use crate::candidate::TierThresholds;

/// Configuration problems detected at construction. These never surface at
/// request time; a built selector only ever sees a validated config.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error(
        "confidence thresholds must satisfy low < medium < high < critical, \
         got {low} / {medium} / {high} / {critical}"
    )]
    ThresholdOrder {
        low: Decimal,
        medium: Decimal,
        high: Decimal,
        critical: Decimal,
    },

    #[error("confidence threshold out of [0, 1]: {0}")]
    ThresholdRange(Decimal),

    #[error("min_agents must be at least 1")]
    MinAgentsZero,

    #[error("min_agents ({min}) exceeds max_agents ({max})")]
    MinExceedsMax { min: usize, max: usize },
}

/// Top-level configuration for the triage engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TriageConfig {
    pub cache: CacheConfig,
    pub selection: SelectionConfig,
    pub scorer: ScorerConfig,
}

impl TriageConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.selection.validate()
    }
}

/// Settings for the score and pattern caches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
    /// TTL for cached scorer results, in seconds.
    pub score_ttl_seconds: u64,
    pub score_max_entries: usize,
    /// TTL for remembered request → pattern associations, in seconds.
    pub pattern_ttl_seconds: u64,
    pub pattern_max_entries: usize,
    /// Background sweep period. None disables the sweeper; expired entries
    /// are then only removed lazily on access.
    pub sweep_interval_seconds: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            score_ttl_seconds: 300,
            score_max_entries: 500,
            pattern_ttl_seconds: 3600,
            pattern_max_entries: 200,
            sweep_interval_seconds: Some(60),
        }
    }
}

/// Settings for the selection pipeline itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectionConfig {
    pub thresholds: TierThresholds,
    /// Hard cap on the number of selected agents. None = no cap.
    pub max_agents: Option<usize>,
    /// Floor the constrainer never trims below when candidates exist.
    pub min_agents: usize,
    /// Execution-time budget. None = unlimited.
    pub time_budget_ms: Option<u64>,
    pub parallel_execution: bool,
    pub enable_dependencies: bool,
    pub enable_synergy: bool,
    /// Budget for the keep-high-tier heuristic. 1.0 = normal load.
    pub complexity_budget: Decimal,
    /// Per-agent execution cost overrides; falls back to built-in estimates.
    #[serde(default)]
    pub cost_estimates_ms: HashMap<AgentCode, u64>,
    /// Overall per-request deadline for the selection pipeline.
    pub deadline_ms: u64,
    /// Bound on the in-memory selection history ledger.
    pub history_capacity: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            thresholds: TierThresholds::default(),
            max_agents: None,
            min_agents: 1,
            time_budget_ms: Some(10_000),
            parallel_execution: true,
            enable_dependencies: true,
            enable_synergy: true,
            complexity_budget: Decimal::ONE,
            cost_estimates_ms: HashMap::new(),
            deadline_ms: 10_000,
            history_capacity: 1000,
        }
    }
}

impl SelectionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds.validate()?;
        if self.min_agents == 0 {
            return Err(ConfigError::MinAgentsZero);
        }
        if let Some(max) = self.max_agents {
            if self.min_agents > max {
                return Err(ConfigError::MinExceedsMax {
                    min: self.min_agents,
                    max,
                });
            }
        }
        Ok(())
    }

    /// Execution cost estimate for one agent, honoring overrides.
    pub fn cost_of(&self, code: AgentCode) -> u64 {
        self.cost_estimates_ms
            .get(&code)
            .copied()
            .unwrap_or_else(|| code.default_cost_ms())
    }
}

/// Which scorer implementation the facade is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerMode {
    /// Deterministic trigger-heuristic fallback; no external process.
    Rules,
    /// External classifier CLI.
    Cli,
}

/// Settings for the signal scorer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScorerConfig {
    pub mode: ScorerMode,
    /// External classifier command, used in `cli` mode.
    pub command: String,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            mode: ScorerMode::Rules,
            command: "claude".to_string(),
            model: "claude-3-5-haiku-latest".to_string(),
            timeout_seconds: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn default_config_is_valid() {
        assert!(TriageConfig::default().validate().is_ok());
    }

    #[test]
    fn roundtrip_triage_config() {
        let mut config = TriageConfig::default();
        config
            .selection
            .cost_estimates_ms
            .insert(AgentCode::Security, 2500);

        let json = serde_json::to_string(&config).unwrap();
        let deserialized: TriageConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn min_agents_zero_rejected() {
        let mut config = TriageConfig::default();
        config.selection.min_agents = 0;
        assert_eq!(config.validate(), Err(ConfigError::MinAgentsZero));
    }

    #[test]
    fn min_exceeding_max_rejected() {
        let mut config = TriageConfig::default();
        config.selection.min_agents = 5;
        config.selection.max_agents = Some(3);
        assert_eq!(
            config.validate(),
            Err(ConfigError::MinExceedsMax { min: 5, max: 3 })
        );
    }

    #[test]
    fn inverted_thresholds_rejected_at_top_level() {
        let mut config = TriageConfig::default();
        config.selection.thresholds.low = dec!(0.90);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ThresholdOrder { .. })
        ));
    }

    #[test]
    fn cost_of_prefers_override() {
        let mut selection = SelectionConfig::default();
        assert_eq!(selection.cost_of(AgentCode::Testing), 2000);

        selection.cost_estimates_ms.insert(AgentCode::Testing, 500);
        assert_eq!(selection.cost_of(AgentCode::Testing), 500);
    }

    #[test]
    fn config_from_toml() {
        let toml_str = r#"
[cache]
score_ttl_seconds = 120
score_max_entries = 100
pattern_ttl_seconds = 600
pattern_max_entries = 50

[selection]
max_agents = 5
min_agents = 2
time_budget_ms = 8000
parallel_execution = true
enable_dependencies = true
enable_synergy = false
complexity_budget = "1.5"
deadline_ms = 5000
history_capacity = 200

[selection.thresholds]
low = "0.30"
medium = "0.55"
high = "0.70"
critical = "0.90"

[scorer]
mode = "rules"
command = "claude"
model = "claude-3-5-haiku-latest"
timeout_seconds = 20
"#;

        let config: TriageConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.selection.max_agents, Some(5));
        assert_eq!(config.selection.thresholds.critical, dec!(0.90));
        assert_eq!(config.cache.sweep_interval_seconds, None);
        assert!(!config.selection.enable_synergy);
        assert_eq!(config.scorer.mode, ScorerMode::Rules);
    }
}
