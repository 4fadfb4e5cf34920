use std::collections::{HashMap, HashSet};

use triage_models::agent::AgentCode;
use triage_models::candidate::Candidate;
use triage_models::config::SelectionConfig;
use triage_models::selection::SelectedAgent;

/// Group candidates into dependency-respecting batches using the static
/// prerequisite graph.
pub fn dependency_batches(candidates: &[Candidate]) -> Vec<Vec<&Candidate>> {
    batches_with(candidates, AgentCode::dependencies)
}

/// Batching state machine with an injectable dependency lookup.
///
/// Batch 0 holds candidates with no prerequisite inside the selection. Each
/// following batch holds the candidates whose every prerequisite is already
/// batched. When no progress is possible but candidates remain (a cycle, or
/// a prerequisite that was never selected), the whole remainder becomes one
/// terminal batch. The scheduler therefore always terminates and emits every
/// candidate exactly once.
pub fn batches_with<'a, F>(candidates: &'a [Candidate], deps_of: F) -> Vec<Vec<&'a Candidate>>
where
    F: Fn(&AgentCode) -> &'static [AgentCode],
{
    let selected: HashSet<AgentCode> = candidates.iter().map(|c| c.agent_code).collect();
    let mut batched: HashSet<AgentCode> = HashSet::new();
    let mut batches: Vec<Vec<&Candidate>> = Vec::new();

    let independent: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| {
            let deps = deps_of(&c.agent_code);
            deps.is_empty() || deps.iter().all(|dep| !selected.contains(dep))
        })
        .collect();
    if !independent.is_empty() {
        batched.extend(independent.iter().map(|c| c.agent_code));
        batches.push(independent);
    }

    while batched.len() < selected.len() {
        let next: Vec<&Candidate> = candidates
            .iter()
            .filter(|c| !batched.contains(&c.agent_code))
            .filter(|c| deps_of(&c.agent_code).iter().all(|dep| batched.contains(dep)))
            .collect();

        if next.is_empty() {
            // Cycle or dangling prerequisite: flush the remainder rather
            // than loop.
            let remaining: Vec<&Candidate> = candidates
                .iter()
                .filter(|c| !batched.contains(&c.agent_code))
                .collect();
            batches.push(remaining);
            break;
        }

        batched.extend(next.iter().map(|c| c.agent_code));
        batches.push(next);
    }

    batches
}

/// Annotate the final candidates with their execution slots.
///
/// With parallel execution disabled, agents instead run one per batch in
/// descending confidence order. Output is ordered by batch.
pub fn assign_batches(candidates: Vec<Candidate>, config: &SelectionConfig) -> Vec<SelectedAgent> {
    if !config.parallel_execution {
        let mut sorted = candidates;
        sorted.sort_by(|a, b| b.confidence.cmp(&a.confidence));
        return sorted
            .into_iter()
            .enumerate()
            .map(|(index, candidate)| SelectedAgent {
                agent_code: candidate.agent_code,
                confidence: candidate.confidence,
                reasoning: candidate.reasoning,
                origin: candidate.origin,
                batch: index,
                can_parallel: false,
            })
            .collect();
    }

    let mut slots: HashMap<AgentCode, (usize, bool)> = HashMap::new();
    for (index, batch) in dependency_batches(&candidates).iter().enumerate() {
        for candidate in batch {
            slots.insert(candidate.agent_code, (index, batch.len() > 1));
        }
    }

    let mut selected: Vec<SelectedAgent> = candidates
        .into_iter()
        .map(|candidate| {
            let (batch, can_parallel) = slots
                .get(&candidate.agent_code)
                .copied()
                .unwrap_or((0, false));
            SelectedAgent {
                agent_code: candidate.agent_code,
                confidence: candidate.confidence,
                reasoning: candidate.reasoning,
                origin: candidate.origin,
                batch,
                can_parallel,
            }
        })
        .collect();
    selected.sort_by_key(|agent| agent.batch);
    selected
}
