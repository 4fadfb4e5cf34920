use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use triage_models::agent::AgentCode;
use triage_models::request::RequestContext;
use triage_models::selection::SelectionResult;

use crate::error::EngineError;

/// A capability handler that can be invoked for a selected agent.
#[async_trait]
pub trait AgentRunner: Send + Sync {
    fn code(&self) -> AgentCode;

    async fn run(
        &self,
        request_text: &str,
        context: &RequestContext,
    ) -> Result<serde_json::Value, EngineError>;
}

/// Terminal state of one agent's execution attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum OutcomeStatus {
    Completed { output: serde_json::Value },
    Failed { error: String },
    TimedOut,
    Skipped { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentOutcome {
    pub agent_code: AgentCode,
    pub batch: usize,
    pub status: OutcomeStatus,
    pub elapsed_ms: u64,
}

/// Result of driving a full selection.
#[derive(Debug)]
pub struct ExecutionReport {
    pub outcomes: Vec<AgentOutcome>,
    pub batches_run: usize,
    /// True when the overall deadline cut execution short.
    pub partial: bool,
    pub elapsed_ms: u64,
}

impl ExecutionReport {
    pub fn completed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Completed { .. }))
            .count()
    }
}

/// Drives the batches of a selection: batches strictly in order, agents
/// within a batch launched concurrently, each racing a per-agent timeout.
///
/// A slow, failing or panicking agent never aborts its batch; its outcome is
/// captured individually. Once the overall deadline is spent, remaining
/// batches are skipped and the report is marked partial.
pub struct BatchExecutor {
    runners: HashMap<AgentCode, Arc<dyn AgentRunner>>,
    per_agent_timeout: Duration,
    overall_deadline: Option<Duration>,
}

impl BatchExecutor {
    pub fn new(runners: Vec<Arc<dyn AgentRunner>>, per_agent_timeout: Duration) -> Self {
        Self {
            runners: runners.into_iter().map(|r| (r.code(), r)).collect(),
            per_agent_timeout,
            overall_deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.overall_deadline = Some(deadline);
        self
    }

    pub async fn execute(
        &self,
        selection: &SelectionResult,
        request_text: &str,
        context: &RequestContext,
    ) -> ExecutionReport {
        let started = Instant::now();
        let mut outcomes = Vec::new();
        let mut batches_run = 0;
        let mut partial = false;

        for (index, batch) in selection.batches().iter().enumerate() {
            let deadline_spent = self
                .overall_deadline
                .is_some_and(|deadline| started.elapsed() >= deadline);
            if deadline_spent {
                partial = true;
                for agent in batch {
                    outcomes.push(AgentOutcome {
                        agent_code: agent.agent_code,
                        batch: index,
                        status: OutcomeStatus::Skipped {
                            reason: "overall deadline elapsed".to_string(),
                        },
                        elapsed_ms: 0,
                    });
                }
                continue;
            }

            let mut handles = Vec::new();
            for agent in batch {
                let code = agent.agent_code;
                match self.runners.get(&code) {
                    Some(runner) => {
                        let runner = Arc::clone(runner);
                        let text = request_text.to_string();
                        let ctx = context.clone();
                        let timeout = self.per_agent_timeout;
                        handles.push(tokio::spawn(async move {
                            let agent_started = Instant::now();
                            let status =
                                match tokio::time::timeout(timeout, runner.run(&text, &ctx)).await
                                {
                                    Ok(Ok(output)) => OutcomeStatus::Completed { output },
                                    Ok(Err(e)) => OutcomeStatus::Failed {
                                        error: e.to_string(),
                                    },
                                    Err(_) => OutcomeStatus::TimedOut,
                                };
                            (code, status, agent_started.elapsed().as_millis() as u64)
                        }));
                    }
                    None => {
                        outcomes.push(AgentOutcome {
                            agent_code: code,
                            batch: index,
                            status: OutcomeStatus::Skipped {
                                reason: "no runner registered".to_string(),
                            },
                            elapsed_ms: 0,
                        });
                    }
                }
            }

            for handle in handles {
                match handle.await {
                    Ok((code, status, elapsed_ms)) => {
                        match &status {
                            OutcomeStatus::Completed { .. } => {
                                info!(agent = %code, elapsed_ms, "Agent completed")
                            }
                            OutcomeStatus::Failed { error } => {
                                warn!(agent = %code, error = %error, "Agent failed")
                            }
                            OutcomeStatus::TimedOut => warn!(
                                agent = %code,
                                timeout_ms = self.per_agent_timeout.as_millis() as u64,
                                "Agent timed out"
                            ),
                            OutcomeStatus::Skipped { .. } => {}
                        }
                        outcomes.push(AgentOutcome {
                            agent_code: code,
                            batch: index,
                            status,
                            elapsed_ms,
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "Agent task panicked");
                    }
                }
            }

            batches_run += 1;
        }

        ExecutionReport {
            outcomes,
            batches_run,
            partial,
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }
}
