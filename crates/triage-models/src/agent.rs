use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed set of sub-agent codes the engine can select.
///
/// Every code maps exhaustively to a descriptor, a prerequisite list and a
/// cost estimate, so adding a variant forces every dispatch site to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentCode {
    Security,
    Performance,
    Design,
    Testing,
    Database,
    Api,
    Cost,
    Docs,
    Dependency,
    Debug,
}

/// Static configuration for one sub-agent.
///
/// The trigger heuristics are consumed only by the rule-based fallback scorer;
/// an external classifier receives the catalog through its prompt instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentDescriptor {
    pub display_name: &'static str,
    /// Importance independent of the current request (0-100).
    pub base_priority: u8,
    /// Substrings matched against file paths.
    pub file_markers: &'static [&'static str],
    /// Keywords matched against the request text.
    pub content_keywords: &'static [&'static str],
    /// Keywords matched against recent error messages.
    pub error_keywords: &'static [&'static str],
}

const SECURITY: AgentDescriptor = AgentDescriptor {
    display_name: "Security Sub-Agent",
    base_priority: 90,
    file_markers: &["auth", "login", "password", "security", "jwt", "oauth", "session"],
    content_keywords: &[
        "authentication",
        "authorization",
        "security",
        "vulnerability",
        "encrypt",
        "decrypt",
        "hash",
        "token",
    ],
    error_keywords: &[
        "unauthorized",
        "forbidden",
        "authentication failed",
        "invalid token",
    ],
};

const PERFORMANCE: AgentDescriptor = AgentDescriptor {
    display_name: "Performance Sub-Agent",
    base_priority: 80,
    file_markers: &["performance", "optimization", "cache", "query", "slow"],
    content_keywords: &[
        "slow",
        "performance",
        "optimization",
        "cache",
        "latency",
        "bottleneck",
        "speed",
    ],
    error_keywords: &["timeout", "slow query", "high cpu", "memory leak", "performance"],
};

const DESIGN: AgentDescriptor = AgentDescriptor {
    display_name: "Design Sub-Agent",
    base_priority: 70,
    file_markers: &["component", ".tsx", ".vue", ".jsx", "styles", "css", "ui"],
    content_keywords: &[
        "ui",
        "ux",
        "design",
        "component",
        "responsive",
        "accessibility",
        "layout",
    ],
    error_keywords: &["layout shift", "accessibility", "responsive", "css error"],
};

const TESTING: AgentDescriptor = AgentDescriptor {
    display_name: "Testing Sub-Agent",
    base_priority: 85,
    file_markers: &["test", "spec", ".test.", ".spec.", "cypress", "playwright"],
    content_keywords: &[
        "test",
        "testing",
        "coverage",
        "e2e",
        "unit test",
        "integration",
        "qa",
    ],
    error_keywords: &["test failed", "assertion error", "test timeout", "coverage"],
};

const DATABASE: AgentDescriptor = AgentDescriptor {
    display_name: "Database Sub-Agent",
    base_priority: 85,
    file_markers: &["schema", "migration", "sql", "db", "database", "model"],
    content_keywords: &[
        "database",
        "schema",
        "migration",
        "query",
        "sql",
        "table",
        "index",
    ],
    error_keywords: &[
        "database error",
        "connection refused",
        "migration failed",
        "sql error",
    ],
};

const API: AgentDescriptor = AgentDescriptor {
    display_name: "API Sub-Agent",
    base_priority: 75,
    file_markers: &["api", "endpoint", "route", "controller", "service"],
    content_keywords: &["api", "endpoint", "rest", "graphql", "webhook", "integration"],
    error_keywords: &["api error", "404", "500", "connection refused", "timeout"],
};

const COST: AgentDescriptor = AgentDescriptor {
    display_name: "Cost Optimization Sub-Agent",
    base_priority: 60,
    file_markers: &["docker", "config", "infrastructure", "deploy"],
    content_keywords: &[
        "cost",
        "optimization",
        "resources",
        "infrastructure",
        "scaling",
        "cloud",
    ],
    error_keywords: &["resource exhausted", "quota exceeded", "billing"],
};

const DOCS: AgentDescriptor = AgentDescriptor {
    display_name: "Documentation Sub-Agent",
    base_priority: 65,
    file_markers: &["readme", "doc", ".md", "comment"],
    content_keywords: &["documentation", "readme", "guide", "comments", "explain"],
    error_keywords: &["missing documentation", "undocumented"],
};

const DEPENDENCY: AgentDescriptor = AgentDescriptor {
    display_name: "Dependency Sub-Agent",
    base_priority: 70,
    file_markers: &["package.json", "yarn.lock", "cargo.toml", "requirements.txt"],
    content_keywords: &[
        "dependency",
        "package",
        "version",
        "update",
        "upgrade",
        "install",
    ],
    error_keywords: &["dependency error", "module not found", "version conflict"],
};

const DEBUG: AgentDescriptor = AgentDescriptor {
    display_name: "Debugging Sub-Agent",
    base_priority: 80,
    file_markers: &["error", "bug", "issue", "debug"],
    content_keywords: &["bug", "error", "issue", "debug", "troubleshoot", "fix", "problem"],
    error_keywords: &["error", "exception", "crash", "failure", "bug"],
};

/// Agent groups known to produce better combined results.
///
/// Groups may overlap; each is evaluated independently by the synergy
/// expander.
pub const SYNERGY_GROUPS: &[&[AgentCode]] = &[
    &[AgentCode::Security, AgentCode::Database, AgentCode::Api],
    &[AgentCode::Performance, AgentCode::Database],
    &[AgentCode::Design, AgentCode::Testing],
    &[AgentCode::Debug, AgentCode::Testing, AgentCode::Performance],
    &[AgentCode::Cost, AgentCode::Performance, AgentCode::Database],
];

impl AgentCode {
    pub const ALL: [AgentCode; 10] = [
        AgentCode::Security,
        AgentCode::Performance,
        AgentCode::Design,
        AgentCode::Testing,
        AgentCode::Database,
        AgentCode::Api,
        AgentCode::Cost,
        AgentCode::Docs,
        AgentCode::Dependency,
        AgentCode::Debug,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentCode::Security => "SECURITY",
            AgentCode::Performance => "PERFORMANCE",
            AgentCode::Design => "DESIGN",
            AgentCode::Testing => "TESTING",
            AgentCode::Database => "DATABASE",
            AgentCode::Api => "API",
            AgentCode::Cost => "COST",
            AgentCode::Docs => "DOCS",
            AgentCode::Dependency => "DEPENDENCY",
            AgentCode::Debug => "DEBUG",
        }
    }

    pub fn descriptor(&self) -> &'static AgentDescriptor {
        match self {
            AgentCode::Security => &SECURITY,
            AgentCode::Performance => &PERFORMANCE,
            AgentCode::Design => &DESIGN,
            AgentCode::Testing => &TESTING,
            AgentCode::Database => &DATABASE,
            AgentCode::Api => &API,
            AgentCode::Cost => &COST,
            AgentCode::Docs => &DOCS,
            AgentCode::Dependency => &DEPENDENCY,
            AgentCode::Debug => &DEBUG,
        }
    }

    /// Prerequisite agents that provide context this agent relies on.
    /// Acyclic by construction; the scheduler tolerates cycles regardless.
    pub fn dependencies(&self) -> &'static [AgentCode] {
        match self {
            AgentCode::Security => &[AgentCode::Database, AgentCode::Api],
            AgentCode::Performance => &[AgentCode::Database, AgentCode::Api],
            AgentCode::Testing => &[AgentCode::Security, AgentCode::Performance],
            AgentCode::Database => &[],
            AgentCode::Api => &[AgentCode::Database, AgentCode::Security],
            AgentCode::Design => &[AgentCode::Performance],
            AgentCode::Cost => &[AgentCode::Database, AgentCode::Performance],
            AgentCode::Docs => &[],
            AgentCode::Dependency => &[],
            AgentCode::Debug => &[AgentCode::Testing],
        }
    }

    /// Baseline execution time estimate, used for time-budget trimming.
    /// Overridable per deployment via `SelectionConfig::cost_estimates_ms`.
    pub fn default_cost_ms(&self) -> u64 {
        match self {
            AgentCode::Security => 1500,
            AgentCode::Performance => 1800,
            AgentCode::Design => 800,
            AgentCode::Testing => 2000,
            AgentCode::Database => 1200,
            AgentCode::Api => 1000,
            AgentCode::Cost => 1000,
            AgentCode::Docs => 600,
            AgentCode::Dependency => 700,
            AgentCode::Debug => 1500,
        }
    }
}

impl fmt::Display for AgentCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
