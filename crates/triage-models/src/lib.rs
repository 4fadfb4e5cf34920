pub mod agent;
pub mod candidate;
pub mod config;
pub mod pattern;
pub mod request;
pub mod selection;

pub use agent::{AgentCode, AgentDescriptor, SYNERGY_GROUPS};
pub use candidate::{Candidate, CandidateOrigin, ConfidenceTier, TierThresholds};
pub use config::{
    CacheConfig, ConfigError, ScorerConfig, ScorerMode, SelectionConfig, TriageConfig,
};
pub use pattern::TaskPattern;
pub use request::RequestContext;
pub use selection::{
    ConfidenceDistribution, ExecutionStrategy, RecordedAgent, SelectedAgent, SelectionRecord,
    SelectionResult, SynergyPresence,
};
