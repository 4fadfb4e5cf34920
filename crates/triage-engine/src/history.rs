use std::collections::{HashSet, VecDeque};

use triage_models::pattern::TaskPattern;
use triage_models::selection::SelectionRecord;

/// How many of the newest records a similarity lookup scans.
const LOOKUP_WINDOW: usize = 50;

/// Word-overlap ratio a past request must clear to donate its pattern.
const SIMILARITY_FLOOR: f64 = 0.6;

/// Bounded in-memory ledger of past selections, used for pattern lookup on
/// requests that match nothing else. Oldest entries are evicted first once
/// capacity is reached.
pub struct SelectionHistory {
    records: VecDeque<SelectionRecord>,
    capacity: usize,
}

impl SelectionHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, record: SelectionRecord) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SelectionRecord> {
        self.records.iter()
    }

    /// Pattern of the most similar recent request, newest first.
    pub fn find_similar_pattern(&self, request_text: &str) -> Option<TaskPattern> {
        self.records
            .iter()
            .rev()
            .take(LOOKUP_WINDOW)
            .find(|record| similarity(request_text, &record.request_text) > SIMILARITY_FLOOR)
            .map(|record| record.pattern)
    }
}

/// Jaccard similarity over lowercased word sets.
fn similarity(a: &str, b: &str) -> f64 {
    let lowered_a = a.to_lowercase();
    let lowered_b = b.to_lowercase();
    let words_a: HashSet<&str> = lowered_a.split_whitespace().collect();
    let words_b: HashSet<&str> = lowered_b.split_whitespace().collect();
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }
    let intersection = words_a.intersection(&words_b).count();
    let union = words_a.union(&words_b).count();
    intersection as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(text: &str, pattern: TaskPattern) -> SelectionRecord {
        SelectionRecord {
            recorded_at: Utc::now(),
            request_text: text.to_string(),
            pattern,
            agents: Vec::new(),
        }
    }

    #[test]
    fn capacity_evicts_oldest_first() {
        let mut history = SelectionHistory::new(2);
        history.push(record("first", TaskPattern::BugFix));
        history.push(record("second", TaskPattern::Optimization));
        history.push(record("third", TaskPattern::General));

        assert_eq!(history.len(), 2);
        let texts: Vec<&str> = history.iter().map(|r| r.request_text.as_str()).collect();
        assert_eq!(texts, vec!["second", "third"]);
    }

    #[test]
    fn similar_request_donates_its_pattern() {
        let mut history = SelectionHistory::new(10);
        history.push(record(
            "optimize the slow checkout query",
            TaskPattern::Optimization,
        ));

        let found = history.find_similar_pattern("optimize the slow checkout path");
        assert_eq!(found, Some(TaskPattern::Optimization));
    }

    #[test]
    fn dissimilar_request_finds_nothing() {
        let mut history = SelectionHistory::new(10);
        history.push(record(
            "optimize the slow checkout query",
            TaskPattern::Optimization,
        ));

        assert_eq!(
            history.find_similar_pattern("write onboarding documentation"),
            None
        );
    }

    #[test]
    fn newest_match_wins() {
        let mut history = SelectionHistory::new(10);
        history.push(record("tune the slow report query", TaskPattern::DatabaseWork));
        history.push(record("tune the slow report query", TaskPattern::Optimization));

        assert_eq!(
            history.find_similar_pattern("tune the slow report query"),
            Some(TaskPattern::Optimization)
        );
    }

    #[test]
    fn similarity_is_word_overlap() {
        assert_eq!(similarity("a b c", "a b c"), 1.0);
        assert_eq!(similarity("", "a b"), 0.0);
        assert!(similarity("a b c d e", "a b c d x") > 0.6);
        assert!(similarity("a b", "x y") < 0.01);
    }
}
