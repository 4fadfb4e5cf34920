use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::AgentCode;
use crate::candidate::CandidateOrigin;
use crate::pattern::TaskPattern;

/// How the selected agents should be driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStrategy {
    /// Dependencies present; batches must run strictly in order.
    OrderedExecution,
    /// No ordering constraints, but synergy groups benefit from co-execution.
    SynergisticParallel,
    /// Everything can run at once.
    FullParallel,
    /// Parallel execution disabled; one agent at a time by confidence.
    Sequential,
}

/// One agent in the final selection, annotated with its execution slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectedAgent {
    pub agent_code: AgentCode,
    pub confidence: Decimal,
    pub reasoning: String,
    pub origin: CandidateOrigin,
    /// Index of the execution batch this agent belongs to. Batches run in
    /// order; agents sharing a batch are eligible for concurrent execution.
    pub batch: usize,
    pub can_parallel: bool,
}

/// Count of selected agents per confidence band. Synthesized candidates below
/// the medium threshold count toward the low bucket.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfidenceDistribution {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// A synergy group with at least two members in the final selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SynergyPresence {
    pub members_present: Vec<AgentCode>,
    pub missing: Vec<AgentCode>,
    /// Fraction of the group that made it into the selection.
    pub completeness: Decimal,
}

/// The immutable outcome of one selection run.
///
/// Degraded conditions (empty selection, scorer failure, deadline overrun)
/// are expressed through `reason` and `timed_out` rather than errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectionResult {
    pub id: Uuid,
    pub decided_at: DateTime<Utc>,
    pub selected: Vec<SelectedAgent>,
    pub execution_strategy: ExecutionStrategy,
    pub task_pattern: TaskPattern,
    pub confidence_distribution: ConfidenceDistribution,
    pub synergy_groups_present: Vec<SynergyPresence>,
    /// Estimated wall-clock cost of executing the selection.
    pub estimated_time_ms: u64,
    /// Human-readable explanation when the selection is empty or degraded.
    pub reason: Option<String>,
    /// True when the per-request deadline elapsed before all stages ran.
    pub timed_out: bool,
    pub elapsed_ms: u64,
}

impl SelectionResult {
    /// An empty selection carrying an explanation. Used for every degraded
    /// path: scorer failure, no candidates, deadline overrun.
    pub fn empty(reason: impl Into<String>, timed_out: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            decided_at: Utc::now(),
            selected: Vec::new(),
            execution_strategy: ExecutionStrategy::FullParallel,
            task_pattern: TaskPattern::General,
            confidence_distribution: ConfidenceDistribution::default(),
            synergy_groups_present: Vec::new(),
            estimated_time_ms: 0,
            reason: Some(reason.into()),
            timed_out,
            elapsed_ms: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn batch_count(&self) -> usize {
        self.selected.iter().map(|s| s.batch + 1).max().unwrap_or(0)
    }

    /// Selected agents grouped by batch index, in execution order.
    pub fn batches(&self) -> Vec<Vec<&SelectedAgent>> {
        (0..self.batch_count())
            .map(|index| self.selected.iter().filter(|s| s.batch == index).collect())
            .collect()
    }
}

/// Compact per-selection history entry kept for pattern lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectionRecord {
    pub recorded_at: DateTime<Utc>,
    pub request_text: String,
    pub pattern: TaskPattern,
    pub agents: Vec<RecordedAgent>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordedAgent {
    pub agent_code: AgentCode,
    pub confidence: Decimal,
}
