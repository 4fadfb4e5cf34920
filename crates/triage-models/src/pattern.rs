use serde::{Deserialize, Serialize};

use crate::agent::AgentCode;

/// Recognized request shapes, each mapping to the agents that typically
/// participate. Detection tries text keywords first, then infers from the
/// scored agent codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPattern {
    FullImplementation,
    BugFix,
    Optimization,
    NewFeature,
    SecurityAudit,
    Refactoring,
    Documentation,
    DatabaseWork,
    General,
}

impl TaskPattern {
    /// Detection order; earlier patterns win keyword-count ties.
    const DETECTABLE: [TaskPattern; 8] = [
        TaskPattern::FullImplementation,
        TaskPattern::BugFix,
        TaskPattern::Optimization,
        TaskPattern::NewFeature,
        TaskPattern::SecurityAudit,
        TaskPattern::Refactoring,
        TaskPattern::Documentation,
        TaskPattern::DatabaseWork,
    ];

    /// Agents that typically participate in this kind of task.
    pub fn agents(&self) -> &'static [AgentCode] {
        match self {
            TaskPattern::FullImplementation => &[
                AgentCode::Design,
                AgentCode::Database,
                AgentCode::Api,
                AgentCode::Security,
                AgentCode::Testing,
                AgentCode::Performance,
            ],
            TaskPattern::BugFix => &[AgentCode::Debug, AgentCode::Testing, AgentCode::Security],
            TaskPattern::Optimization => {
                &[AgentCode::Performance, AgentCode::Database, AgentCode::Cost]
            }
            TaskPattern::NewFeature => &[
                AgentCode::Design,
                AgentCode::Api,
                AgentCode::Database,
                AgentCode::Testing,
            ],
            TaskPattern::SecurityAudit => &[
                AgentCode::Security,
                AgentCode::Database,
                AgentCode::Api,
                AgentCode::Testing,
            ],
            TaskPattern::Refactoring => {
                &[AgentCode::Performance, AgentCode::Testing, AgentCode::Design]
            }
            TaskPattern::Documentation => &[AgentCode::Docs, AgentCode::Api],
            TaskPattern::DatabaseWork => &[
                AgentCode::Database,
                AgentCode::Performance,
                AgentCode::Security,
            ],
            TaskPattern::General => &[],
        }
    }

    fn trigger_keywords(&self) -> &'static [&'static str] {
        match self {
            TaskPattern::FullImplementation => {
                &["full implementation", "implement the whole", "end-to-end build"]
            }
            TaskPattern::BugFix => &["bug", "fix", "broken", "regression", "crash"],
            TaskPattern::Optimization => {
                &["slow", "optimize", "optimization", "latency", "bottleneck"]
            }
            TaskPattern::NewFeature => &["new feature", "add support for", "build a new"],
            TaskPattern::SecurityAudit => {
                &["security audit", "vulnerability", "audit", "pentest"]
            }
            TaskPattern::Refactoring => &["refactor", "restructure", "clean up"],
            TaskPattern::Documentation => &["document", "readme", "changelog"],
            TaskPattern::DatabaseWork => &["migration", "schema", "sql"],
            TaskPattern::General => &[],
        }
    }

    /// Detect a pattern from request text alone. The pattern with the most
    /// keyword hits wins; ties go to the earlier pattern in detection order.
    pub fn from_keywords(text: &str) -> Option<TaskPattern> {
        let lowered = text.to_lowercase();
        let mut best: Option<(TaskPattern, usize)> = None;
        for pattern in Self::DETECTABLE {
            let hits = pattern
                .trigger_keywords()
                .iter()
                .filter(|kw| lowered.contains(**kw))
                .count();
            if hits > 0 && best.map_or(true, |(_, b)| hits > b) {
                best = Some((pattern, hits));
            }
        }
        best.map(|(pattern, _)| pattern)
    }

    /// Infer a pattern from the combination of scored agent codes.
    pub fn from_codes(codes: &[AgentCode]) -> Option<TaskPattern> {
        let has = |code| codes.contains(&code);
        if has(AgentCode::Debug) && has(AgentCode::Testing) {
            Some(TaskPattern::BugFix)
        } else if has(AgentCode::Performance) && has(AgentCode::Database) {
            Some(TaskPattern::Optimization)
        } else if has(AgentCode::Security) {
            Some(TaskPattern::SecurityAudit)
        } else if has(AgentCode::Design) && has(AgentCode::Api) {
            Some(TaskPattern::NewFeature)
        } else {
            None
        }
    }
}
