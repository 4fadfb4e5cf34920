use triage_models::candidate::Candidate;
use triage_models::config::SelectionConfig;

use crate::schedule;

/// Apply the max-agent and time-budget caps, in that order.
///
/// Neither cap trims the set below `min_agents` when at least that many
/// candidates exist. (`max_agents >= min_agents` is guaranteed by config
/// validation.)
pub fn apply(mut candidates: Vec<Candidate>, config: &SelectionConfig) -> Vec<Candidate> {
    if let Some(max) = config.max_agents {
        if candidates.len() > max {
            candidates.sort_by(|a, b| {
                b.priority_class(&config.thresholds)
                    .cmp(&a.priority_class(&config.thresholds))
                    .then(b.confidence.cmp(&a.confidence))
            });
            candidates.truncate(max);
        }
    }

    if let Some(budget) = config.time_budget_ms {
        if estimate_time_ms(&candidates, config) > budget {
            candidates.sort_by(|a, b| b.confidence.cmp(&a.confidence));
            while candidates.len() > config.min_agents
                && estimate_time_ms(&candidates, config) > budget
            {
                candidates.pop();
            }
        }
    }

    candidates
}

/// Estimated wall-clock cost of executing the candidates: the sum of
/// per-agent costs when sequential, or the sum of per-batch maxima over the
/// dependency batches when parallel.
pub fn estimate_time_ms(candidates: &[Candidate], config: &SelectionConfig) -> u64 {
    if !config.parallel_execution {
        return candidates
            .iter()
            .map(|c| config.cost_of(c.agent_code))
            .sum();
    }

    schedule::dependency_batches(candidates)
        .iter()
        .map(|batch| {
            batch
                .iter()
                .map(|c| config.cost_of(c.agent_code))
                .max()
                .unwrap_or(0)
        })
        .sum()
}
