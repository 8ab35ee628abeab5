use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    catalog::quiz::{Answer, Question},
    config::SessionConfig,
};

/// Outcome of one submitted question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    question: Question,
    is_correct: bool,
    selected: Vec<Answer>,
    elapsed_secs: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub elapsed_secs: u32,
    pub score: u32,
}

/// Everything a finished session hands over for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub results: Vec<QuestionResult>,
    pub totals: Totals,
}

impl QuestionResult {
    pub fn new(question: Question, is_correct: bool, selected: Vec<Answer>, elapsed_secs: u32) -> Self {
        Self {
            question,
            is_correct,
            selected,
            elapsed_secs,
        }
    }

    pub fn question(&self) -> &Question {
        &self.question
    }

    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    pub fn selected(&self) -> &[Answer] {
        &self.selected
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }
}

impl AnalysisRecord {
    pub fn correct_count(&self) -> usize {
        self.results.iter().filter(|result| result.is_correct()).count()
    }

    /// Share of correct answers, rounded to a whole percent.
    pub fn accuracy_percent(&self) -> u32 {
        let total = self.results.len();
        if total == 0 {
            return 0;
        }
        ((self.correct_count() * 100 + total / 2) / total) as u32
    }

    /// Score, accuracy and time, each against what the quiz allowed.
    pub fn summary(&self, config: &SessionConfig) -> String {
        let total = self.results.len();
        format!(
            "Score: {} out of {} points\nAccuracy: {}% ({}/{} correct answers)\nTime taken: {} of {}",
            self.totals.score,
            config.max_score(total),
            self.accuracy_percent(),
            self.correct_count(),
            total,
            seconds_to_minutes(self.totals.elapsed_secs),
            seconds_to_minutes(config.time_budget_secs(total))
        )
    }
}

/// Formats seconds as `m:ss`.
pub fn seconds_to_minutes(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Finished-session records for the current process, keyed by topic or
/// conversation id. Nothing outlives the owner.
#[derive(Debug, Default)]
pub struct AnalysisStore {
    records: HashMap<Uuid, AnalysisRecord>,
}

impl AnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &Uuid) -> Option<&AnalysisRecord> {
        self.records.get(id)
    }

    /// Stores `record` for `id`, replacing an earlier attempt.
    pub fn set(&mut self, id: Uuid, record: AnalysisRecord) {
        tracing::debug!(%id, score = record.totals.score, "analysis stored");
        self.records.insert(id, record);
    }

    pub fn remove(&mut self, id: &Uuid) -> Option<AnalysisRecord> {
        self.records.remove(id)
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Uuid, &AnalysisRecord)> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::quiz::QuestionKind;

    fn record(score: u32, outcomes: &[bool]) -> AnalysisRecord {
        let results = outcomes
            .iter()
            .map(|&ok| {
                let question = Question::new("q", QuestionKind::Single, vec![Answer::new("a", true)]);
                QuestionResult::new(question, ok, vec![], 4)
            })
            .collect();

        AnalysisRecord {
            results,
            totals: Totals {
                elapsed_secs: 125,
                score,
            },
        }
    }

    #[test]
    fn formats_minutes() {
        assert_eq!(seconds_to_minutes(0), "0:00");
        assert_eq!(seconds_to_minutes(59), "0:59");
        assert_eq!(seconds_to_minutes(125), "2:05");
        assert_eq!(seconds_to_minutes(3600), "60:00");
    }

    #[test]
    fn summary_counts_correct_answers() {
        let record = record(10, &[true, false, true]);
        let config = SessionConfig {
            time_limit_secs: 60,
            score_per_correct: 5,
        };
        assert_eq!(record.correct_count(), 2);
        assert_eq!(record.accuracy_percent(), 67);
        assert_eq!(
            record.summary(&config),
            "Score: 10 out of 15 points\nAccuracy: 67% (2/3 correct answers)\nTime taken: 2:05 of 3:00"
        );
    }

    #[test]
    fn accuracy_rounds_half_up() {
        assert_eq!(record(0, &[]).accuracy_percent(), 0);
        assert_eq!(record(5, &[true, false]).accuracy_percent(), 50);
        assert_eq!(record(5, &[true, false, false, false, false, false, false, false]).accuracy_percent(), 13);
        assert_eq!(record(15, &[true, true, true]).accuracy_percent(), 100);
    }

    #[test]
    fn store_replaces_and_clears() {
        let mut store = AnalysisStore::new();
        let topic = Uuid::new_v4();

        store.set(topic, record(5, &[true]));
        store.set(topic, record(0, &[false]));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&topic).unwrap().totals.score, 0);

        store.set(Uuid::new_v4(), record(5, &[true]));
        assert!(store.remove(&topic).is_some());
        assert!(store.get(&topic).is_none());

        store.clear();
        assert!(store.is_empty());
    }
}
