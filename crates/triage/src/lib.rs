//! TRIAGE - context-aware sub-agent selection.
//!
//! Given a free-text request and ambient project context, decides which
//! specialized sub-agents should run, in what grouping, and in what order:
//! confidence-tiered classification, dependency completion, synergy
//! expansion, budget trimming and dependency-respecting batch scheduling.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use triage::models::{RequestContext, SelectionResult, TriageConfig};
//! use triage::engine::{RuleScorer, Selector};
//! ```

pub use triage_cache as cache;
pub use triage_engine as engine;
pub use triage_models as models;

use std::sync::Arc;

use triage_engine::classifier_cli::{ClassifierCliConfig, CliScorer};
use triage_engine::scorer::{RuleScorer, SignalScorer};
use triage_engine::selector::Selector;
use triage_models::config::{ScorerMode, TriageConfig};
use triage_models::request::RequestContext;
use triage_models::selection::SelectionResult;

/// Build a selector from configuration, choosing the scorer implementation
/// by `scorer.mode`. Fails fast on malformed configuration.
pub fn build_selector(config: TriageConfig) -> Result<Selector, anyhow::Error> {
    let scorer: Arc<dyn SignalScorer> = match config.scorer.mode {
        ScorerMode::Rules => Arc::new(RuleScorer),
        ScorerMode::Cli => Arc::new(CliScorer::new(ClassifierCliConfig::from(&config.scorer))),
    };
    Ok(Selector::new(scorer, config)?)
}

/// Run one selection with the given selector.
pub async fn select(
    selector: &Selector,
    request_text: &str,
    context: &RequestContext,
) -> SelectionResult {
    selector.select(request_text, context).await
}
