use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use triage_cache::TtlCache;
use triage_models::agent::AgentCode;
use triage_models::candidate::Candidate;
use triage_models::config::{ConfigError, SelectionConfig, TriageConfig};
use triage_models::pattern::TaskPattern;
use triage_models::request::RequestContext;
use triage_models::selection::{
    ExecutionStrategy, RecordedAgent, SelectionRecord, SelectionResult, SynergyPresence,
};

use crate::constrain;
use crate::error::EngineError;
use crate::expand;
use crate::history::SelectionHistory;
use crate::schedule;
use crate::scorer::SignalScorer;
use crate::tiers::{self, TierSet};

/// Optional persistence hook for completed selections. Invoked
/// fire-and-forget; failures are logged and never affect the returned result.
#[async_trait]
pub trait SelectionStore: Send + Sync {
    async fn record_selection(&self, record: &SelectionRecord) -> Result<(), EngineError>;
}

/// The selection facade.
///
/// Composes scoring, tiering, dependency and synergy expansion, resource
/// constraining and batch scheduling into one call, with score caching, task
/// pattern detection and a bounded history ledger on the side.
pub struct Selector {
    scorer: Arc<dyn SignalScorer>,
    config: TriageConfig,
    score_cache: Arc<TtlCache<u64, Vec<Candidate>>>,
    pattern_cache: Arc<TtlCache<String, TaskPattern>>,
    history: Mutex<SelectionHistory>,
    store: Option<Arc<dyn SelectionStore>>,
}

impl Selector {
    /// Build a selector. Fails fast on malformed configuration; request-time
    /// paths never validate again.
    ///
    /// Cache sweepers start only when built inside a tokio runtime; without
    /// one, expired entries are still removed lazily on access.
    pub fn new(scorer: Arc<dyn SignalScorer>, config: TriageConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let score_cache = Arc::new(TtlCache::new(
            config.cache.score_max_entries,
            Duration::from_secs(config.cache.score_ttl_seconds),
        ));
        let pattern_cache = Arc::new(TtlCache::new(
            config.cache.pattern_max_entries,
            Duration::from_secs(config.cache.pattern_ttl_seconds),
        ));
        if let Some(seconds) = config.cache.sweep_interval_seconds {
            if tokio::runtime::Handle::try_current().is_ok() {
                let interval = Duration::from_secs(seconds.max(1));
                score_cache.start_sweep(interval);
                pattern_cache.start_sweep(interval);
            }
        }

        let history = Mutex::new(SelectionHistory::new(config.selection.history_capacity));

        Ok(Self {
            scorer,
            config,
            score_cache,
            pattern_cache,
            history,
            store: None,
        })
    }

    pub fn with_store(mut self, store: Arc<dyn SelectionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &TriageConfig {
        &self.config
    }

    /// Stop background cache maintenance and drop cached state.
    pub fn shutdown(&self) {
        self.score_cache.destroy();
        self.pattern_cache.destroy();
    }

    /// Decide which agents should handle `request_text`.
    ///
    /// Never fails for request-shaped input: scorer errors, empty scores and
    /// deadline overruns all produce an explanatory empty result instead.
    pub async fn select(&self, request_text: &str, context: &RequestContext) -> SelectionResult {
        let started = Instant::now();
        let deadline = Duration::from_millis(self.config.selection.deadline_ms);

        // 1. Score, via cache when the same request was seen recently.
        let fingerprint = fingerprint(request_text, context);
        let scored = match self.score_cache.get(&fingerprint) {
            Some(cached) => cached,
            None => {
                let remaining = deadline.saturating_sub(started.elapsed());
                match tokio::time::timeout(remaining, self.scorer.score(request_text, context))
                    .await
                {
                    Ok(Ok(candidates)) => {
                        self.score_cache.set(fingerprint, candidates.clone());
                        candidates
                    }
                    Ok(Err(e)) => {
                        warn!(scorer = self.scorer.name(), error = %e, "Scorer failed; returning empty selection");
                        return finish(
                            SelectionResult::empty(
                                format!("scorer {} failed: {e}", self.scorer.name()),
                                false,
                            ),
                            started,
                        );
                    }
                    Err(_) => {
                        warn!(
                            scorer = self.scorer.name(),
                            deadline_ms = self.config.selection.deadline_ms,
                            "Deadline elapsed during scoring"
                        );
                        return finish(
                            SelectionResult::empty("selection deadline elapsed while scoring", true),
                            started,
                        );
                    }
                }
            }
        };

        if scored.is_empty() {
            return finish(
                SelectionResult::empty("no relevant agents identified", false),
                started,
            );
        }

        // 2. Task pattern, from the scored codes before synthesis widens them.
        let scored_codes: Vec<AgentCode> = scored.iter().map(|c| c.agent_code).collect();
        let pattern = self.detect_pattern(request_text, &scored_codes);

        // 3. Tier and apply the inclusion policy.
        let tier_set = tiers::partition(scored, &self.config.selection.thresholds);
        let kept = self.choose(tier_set, pattern);
        if kept.is_empty() {
            return finish(
                SelectionResult::empty("no candidate cleared the inclusion policy", false),
                started,
            );
        }

        // 4. Complete the set.
        let mut candidates = kept;
        if self.config.selection.enable_dependencies {
            candidates = expand::resolve_dependencies(candidates);
        }
        if self.config.selection.enable_synergy {
            candidates = expand::expand_synergies(candidates);
        }

        // 5. Fit the budget, then schedule.
        candidates = constrain::apply(candidates, &self.config.selection);
        let estimated_time_ms = constrain::estimate_time_ms(&candidates, &self.config.selection);
        let confidence_distribution =
            tiers::distribution(&candidates, &self.config.selection.thresholds);
        let synergy_groups_present = expand::synergy_presence(&candidates);
        let execution_strategy =
            strategy_for(&candidates, &synergy_groups_present, &self.config.selection);
        let selected = schedule::assign_batches(candidates, &self.config.selection);

        let timed_out = started.elapsed() > deadline;
        let result = finish(
            SelectionResult {
                id: Uuid::new_v4(),
                decided_at: Utc::now(),
                selected,
                execution_strategy,
                task_pattern: pattern,
                confidence_distribution,
                synergy_groups_present,
                estimated_time_ms,
                reason: timed_out
                    .then(|| "deadline elapsed before scheduling completed".to_string()),
                timed_out,
                elapsed_ms: 0,
            },
            started,
        );

        info!(
            id = %result.id,
            agents = result.selected.len(),
            batches = result.batch_count(),
            pattern = ?result.task_pattern,
            strategy = ?result.execution_strategy,
            estimated_ms = result.estimated_time_ms,
            elapsed_ms = result.elapsed_ms,
            "Selection complete"
        );

        // 6. Remember for future pattern lookup.
        self.record(request_text, &result);
        result
    }

    /// Keyword triggers first, then inference from the scored codes, then the
    /// pattern cache and history similarity, else General.
    fn detect_pattern(&self, request_text: &str, scored_codes: &[AgentCode]) -> TaskPattern {
        if let Some(pattern) = TaskPattern::from_keywords(request_text) {
            return pattern;
        }
        if let Some(pattern) = TaskPattern::from_codes(scored_codes) {
            return pattern;
        }
        if let Some(pattern) = self.pattern_cache.get(&prompt_key(request_text)) {
            return pattern;
        }
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history
            .find_similar_pattern(request_text)
            .unwrap_or(TaskPattern::General)
    }

    /// Inclusion policy over the tiered candidates: critical agents are
    /// always kept; high ones unless the load heuristic objects; medium ones
    /// when they fit the detected pattern or synergize with something already
    /// kept; low ones only as declared prerequisites of kept agents. The
    /// remainder backfills to `min_agents`, highest confidence first.
    fn choose(&self, tier_set: TierSet, pattern: TaskPattern) -> Vec<Candidate> {
        let selection = &self.config.selection;
        let mut kept: Vec<Candidate> = Vec::new();
        let mut rest: Vec<Candidate> = Vec::new();

        kept.extend(tier_set.critical);

        if has_resource_budget(tier_set.high.len(), selection.complexity_budget) {
            kept.extend(tier_set.high);
        } else {
            rest.extend(tier_set.high);
        }

        let pattern_agents = pattern.agents();
        let (in_pattern, out_of_pattern): (Vec<Candidate>, Vec<Candidate>) = tier_set
            .medium
            .into_iter()
            .partition(|c| pattern_agents.contains(&c.agent_code));
        kept.extend(in_pattern);
        for candidate in out_of_pattern {
            if expand::is_synergistic(candidate.agent_code, &kept) {
                kept.push(candidate);
            } else {
                rest.push(candidate);
            }
        }

        for candidate in tier_set.low {
            if expand::is_required_dependency(candidate.agent_code, &kept) {
                kept.push(candidate);
            } else {
                rest.push(candidate);
            }
        }

        if kept.len() < selection.min_agents && !rest.is_empty() {
            rest.sort_by(|a, b| b.confidence.cmp(&a.confidence));
            let needed = selection.min_agents - kept.len();
            kept.extend(rest.into_iter().take(needed));
        }

        kept
    }

    fn record(&self, request_text: &str, result: &SelectionResult) {
        let record = SelectionRecord {
            recorded_at: result.decided_at,
            request_text: request_text.to_string(),
            pattern: result.task_pattern,
            agents: result
                .selected
                .iter()
                .map(|s| RecordedAgent {
                    agent_code: s.agent_code,
                    confidence: s.confidence,
                })
                .collect(),
        };

        self.pattern_cache
            .set(prompt_key(request_text), result.task_pattern);

        {
            let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
            history.push(record.clone());
        }

        if let Some(store) = &self.store {
            let store = Arc::clone(store);
            tokio::spawn(async move {
                if let Err(e) = store.record_selection(&record).await {
                    warn!(error = %e, "Selection store rejected record");
                }
            });
        }
    }
}

/// Load heuristic gating the high tier: fixed baseline plus a tenth per
/// agent, compared against the configured complexity budget.
fn has_resource_budget(additional_agents: usize, budget: Decimal) -> bool {
    let projected = Decimal::new(5, 1) + Decimal::new(additional_agents as i64, 1);
    projected <= budget
}

fn strategy_for(
    candidates: &[Candidate],
    synergies: &[SynergyPresence],
    config: &SelectionConfig,
) -> ExecutionStrategy {
    if !config.parallel_execution {
        return ExecutionStrategy::Sequential;
    }
    let has_dependencies = candidates
        .iter()
        .any(|c| !c.agent_code.dependencies().is_empty());
    if has_dependencies {
        ExecutionStrategy::OrderedExecution
    } else if !synergies.is_empty() {
        ExecutionStrategy::SynergisticParallel
    } else {
        ExecutionStrategy::FullParallel
    }
}

/// Stable in-process fingerprint of the request and the context fields that
/// influence scoring.
fn fingerprint(request_text: &str, context: &RequestContext) -> u64 {
    let mut hasher = DefaultHasher::new();
    request_text.hash(&mut hasher);
    context.current_files.hash(&mut hasher);
    context.changed_files.hash(&mut hasher);
    context.recent_errors.hash(&mut hasher);
    hasher.finish()
}

/// Key for the request → pattern cache.
fn prompt_key(request_text: &str) -> String {
    request_text.to_lowercase().chars().take(50).collect()
}

fn finish(mut result: SelectionResult, started: Instant) -> SelectionResult {
    result.elapsed_ms = started.elapsed().as_millis() as u64;
    result
}
