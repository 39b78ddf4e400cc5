use std::collections::BTreeMap;

use chrono::{DateTime, Local};

use crate::quiz::{Question, QuestionKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub asked: usize,
    pub correct: usize,
}

impl Tally {
    pub fn record(&mut self, correct: bool) {
        self.asked += 1;
        if correct {
            self.correct += 1;
        }
    }

    pub fn incorrect(&self) -> usize {
        self.asked - self.correct
    }

    /// Percentage of correct answers, 0 when nothing was asked.
    pub fn accuracy(&self) -> f64 {
        if self.asked == 0 {
            return 0.0;
        }
        self.correct as f64 / self.asked as f64 * 100.0
    }

    /// What was added on top of an earlier snapshot.
    pub fn since(&self, earlier: Tally) -> Tally {
        Tally {
            asked: self.asked - earlier.asked,
            correct: self.correct - earlier.correct,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    overall: Tally,
    by_kind: BTreeMap<QuestionKind, Tally>,
    skipped: usize,
}

impl SessionStats {
    pub fn overall(&self) -> Tally {
        self.overall
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn by_kind(&self) -> impl Iterator<Item = (QuestionKind, Tally)> + '_ {
        self.by_kind.iter().map(|(kind, tally)| (*kind, *tally))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerRecord {
    pub question: Question,
    pub user_response: String,
    pub is_correct: bool,
    pub timestamp: DateTime<Local>,
}

/// Graded answers and the statistics derived from them.
///
/// Statistics only change through [`Scorecard::record`], which also appends to
/// the history, so `stats().overall().asked == history().len()` always holds.
/// Skipped questions are counted but leave no record.
#[derive(Debug, Clone, Default)]
pub struct Scorecard {
    stats: SessionStats,
    history: Vec<AnswerRecord>,
}

impl Scorecard {
    pub fn record(&mut self, question: Question, user_response: String, is_correct: bool) -> &AnswerRecord {
        self.stats.overall.record(is_correct);
        self.stats.by_kind.entry(question.kind).or_default().record(is_correct);

        self.history.push(AnswerRecord {
            question,
            user_response,
            is_correct,
            timestamp: Local::now(),
        });
        &self.history[self.history.len() - 1]
    }

    pub fn skip(&mut self) {
        self.stats.skipped += 1;
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn history(&self) -> &[AnswerRecord] {
        &self.history
    }
}
