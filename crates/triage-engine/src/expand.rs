use std::collections::HashSet;

use rust_decimal::Decimal;

use triage_models::agent::{AgentCode, SYNERGY_GROUPS};
use triage_models::candidate::{Candidate, CandidateOrigin};
use triage_models::selection::SynergyPresence;

/// Add missing prerequisites for every selected candidate, at a discounted
/// confidence of 0.8 × the parent's.
///
/// Single, non-recursive pass: a synthesized prerequisite does not trigger
/// resolution of its own prerequisites, so a chain A→B→C with only A selected
/// yields B but not C. An agent already present is never overwritten.
pub fn resolve_dependencies(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut present: HashSet<AgentCode> = candidates.iter().map(|c| c.agent_code).collect();
    let snapshot: Vec<(AgentCode, Decimal)> = candidates
        .iter()
        .map(|c| (c.agent_code, c.confidence))
        .collect();

    for (parent, confidence) in snapshot {
        for dep in parent.dependencies() {
            if present.insert(*dep) {
                candidates.push(Candidate {
                    agent_code: *dep,
                    confidence: confidence * Decimal::new(8, 1),
                    reasoning: format!("required by {parent}"),
                    origin: CandidateOrigin::Dependency,
                });
            }
        }
    }
    candidates
}

/// Complete synergy groups that are mostly present.
///
/// A group is completed when at least ceil(0.6 × size) of its members are
/// already selected and at least one is missing; missing members join at a
/// fixed 0.7 confidence, citing the present members. Groups are evaluated
/// independently and additions are first-writer-wins, so re-running the
/// expansion changes nothing.
pub fn expand_synergies(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut present_codes: HashSet<AgentCode> = candidates.iter().map(|c| c.agent_code).collect();

    for group in SYNERGY_GROUPS {
        let present: Vec<AgentCode> = group
            .iter()
            .copied()
            .filter(|code| present_codes.contains(code))
            .collect();
        let missing: Vec<AgentCode> = group
            .iter()
            .copied()
            .filter(|code| !present_codes.contains(code))
            .collect();

        let needed = (group.len() * 3).div_ceil(5);
        if missing.is_empty() || present.len() < needed {
            continue;
        }

        let cited = present
            .iter()
            .map(|code| code.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        for code in missing {
            present_codes.insert(code);
            candidates.push(Candidate {
                agent_code: code,
                confidence: Decimal::new(7, 1),
                reasoning: format!("synergistic with {cited}"),
                origin: CandidateOrigin::Synergy,
            });
        }
    }
    candidates
}

/// Whether `code` shares a synergy group with any already-kept candidate.
pub fn is_synergistic(code: AgentCode, kept: &[Candidate]) -> bool {
    let kept_codes: HashSet<AgentCode> = kept.iter().map(|c| c.agent_code).collect();
    SYNERGY_GROUPS.iter().any(|group| {
        group.contains(&code) && group.iter().any(|member| kept_codes.contains(member))
    })
}

/// Whether any kept candidate declares `code` as a prerequisite.
pub fn is_required_dependency(code: AgentCode, kept: &[Candidate]) -> bool {
    kept.iter()
        .any(|candidate| candidate.agent_code.dependencies().contains(&code))
}

/// Synergy groups with at least two members in the final selection, reported
/// on the result for the caller's benefit.
pub fn synergy_presence(candidates: &[Candidate]) -> Vec<SynergyPresence> {
    let codes: HashSet<AgentCode> = candidates.iter().map(|c| c.agent_code).collect();
    let mut groups = Vec::new();

    for group in SYNERGY_GROUPS {
        let members_present: Vec<AgentCode> = group
            .iter()
            .copied()
            .filter(|code| codes.contains(code))
            .collect();
        if members_present.len() < 2 {
            continue;
        }
        let missing: Vec<AgentCode> = group
            .iter()
            .copied()
            .filter(|code| !codes.contains(code))
            .collect();
        groups.push(SynergyPresence {
            completeness: Decimal::from(members_present.len() as u64)
                / Decimal::from(group.len() as u64),
            members_present,
            missing,
        });
    }
    groups
}
