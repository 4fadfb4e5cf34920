//! Test support: canned scorers and runners for exercising the pipeline
//! without an external classifier.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use triage_models::agent::AgentCode;
use triage_models::candidate::Candidate;
use triage_models::request::RequestContext;

use crate::error::EngineError;
use crate::executor::AgentRunner;
use crate::scorer::SignalScorer;

/// Scorer returning a fixed candidate list, with an invocation counter for
/// cache assertions.
pub struct MockScorer {
    candidates: Vec<Candidate>,
    should_fail: bool,
    calls: AtomicUsize,
}

impl MockScorer {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            should_fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn failing() -> Self {
        let mut mock = Self::empty();
        mock.should_fail = true;
        mock
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SignalScorer for MockScorer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn score(
        &self,
        _request_text: &str,
        _context: &RequestContext,
    ) -> Result<Vec<Candidate>, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(EngineError::Scorer("mock scorer failure".to_string()));
        }
        Ok(self.candidates.clone())
    }
}

/// Shorthand for a scored candidate in tests.
pub fn scored(code: AgentCode, confidence: Decimal) -> Candidate {
    Candidate::scored(code, confidence, format!("mock signal for {code}"))
}

/// Runner with configurable delay and failure for executor tests.
pub struct MockRunner {
    code: AgentCode,
    delay: Duration,
    should_fail: bool,
}

impl MockRunner {
    pub fn ok(code: AgentCode) -> Self {
        Self {
            code,
            delay: Duration::ZERO,
            should_fail: false,
        }
    }

    pub fn failing(code: AgentCode) -> Self {
        Self {
            code,
            delay: Duration::ZERO,
            should_fail: true,
        }
    }

    pub fn slow(code: AgentCode, delay: Duration) -> Self {
        Self {
            code,
            delay,
            should_fail: false,
        }
    }
}

#[async_trait]
impl AgentRunner for MockRunner {
    fn code(&self) -> AgentCode {
        self.code
    }

    async fn run(
        &self,
        _request_text: &str,
        _context: &RequestContext,
    ) -> Result<serde_json::Value, EngineError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.should_fail {
            return Err(EngineError::Runner(format!("mock {} failure", self.code)));
        }
        Ok(serde_json::json!({ "agent": self.code.as_str(), "status": "ok" }))
    }
}
