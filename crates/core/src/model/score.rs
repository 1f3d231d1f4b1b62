use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::model::ids::SessionId;
use crate::model::question::{Difficulty, Topic};

//
// ─── TALLIES ───────────────────────────────────────────────────────────────────
//

/// Correct/incorrect tally for one topic/difficulty cell.
///
/// `correct + incorrect == total` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CellTally {
    pub correct: u32,
    pub incorrect: u32,
    pub total: u32,
}

impl CellTally {
    pub fn record(&mut self, correct: bool) {
        if correct {
            self.correct = self.correct.saturating_add(1);
        } else {
            self.incorrect = self.incorrect.saturating_add(1);
        }
        self.total = self.correct + self.incorrect;
    }

    /// Accuracy of this cell in percent, 0.0 when empty.
    #[must_use]
    pub fn accuracy_percent(&self) -> f64 {
        percent(self.correct, self.total)
    }
}

/// Nested topic → difficulty → tally breakdown, ordered for stable output.
pub type TopicBreakdown = BTreeMap<Topic, BTreeMap<Difficulty, CellTally>>;

/// Consecutive-correct streak in asking order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Streak {
    pub current: u32,
    pub best: u32,
}

impl Streak {
    pub fn record(&mut self, correct: bool) {
        if correct {
            self.current = self.current.saturating_add(1);
            self.best = self.best.max(self.current);
        } else {
            self.current = 0;
        }
    }
}

/// Accumulates graded answers in order and produces a [`Score`].
#[derive(Debug, Clone, Default)]
pub struct ScoreTally {
    correct: u32,
    incorrect: u32,
    breakdown: TopicBreakdown,
    streak: Streak,
}

impl ScoreTally {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one graded answer. Call in asking order; the streak depends on it.
    pub fn record(&mut self, topic: Topic, difficulty: Difficulty, correct: bool) {
        if correct {
            self.correct = self.correct.saturating_add(1);
        } else {
            self.incorrect = self.incorrect.saturating_add(1);
        }
        self.streak.record(correct);
        self.breakdown
            .entry(topic)
            .or_default()
            .entry(difficulty)
            .or_default()
            .record(correct);
    }

    #[must_use]
    pub fn finish(self, session_id: SessionId, total_questions: u32, elapsed_seconds: u64) -> Score {
        let total_answered = self.correct + self.incorrect;
        Score {
            session_id,
            total_questions,
            total_answered,
            correct: self.correct,
            incorrect: self.incorrect,
            accuracy_percent: percent(self.correct, total_answered),
            elapsed_seconds,
            topic_breakdown: self.breakdown,
            streak: self.streak,
        }
    }
}

//
// ─── SCORE ─────────────────────────────────────────────────────────────────────
//

/// Performance summary for a session's answered questions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Score {
    session_id: SessionId,
    total_questions: u32,
    total_answered: u32,
    correct: u32,
    incorrect: u32,
    accuracy_percent: f64,
    elapsed_seconds: u64,
    topic_breakdown: TopicBreakdown,
    streak: Streak,
}

impl Score {
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// The session's configured question count.
    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    /// Answers that were scored. May be lower than `total_questions`.
    #[must_use]
    pub fn total_answered(&self) -> u32 {
        self.total_answered
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn incorrect(&self) -> u32 {
        self.incorrect
    }

    #[must_use]
    pub fn accuracy_percent(&self) -> f64 {
        self.accuracy_percent
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    #[must_use]
    pub fn topic_breakdown(&self) -> &TopicBreakdown {
        &self.topic_breakdown
    }

    #[must_use]
    pub fn cell(&self, topic: Topic, difficulty: Difficulty) -> Option<CellTally> {
        self.topic_breakdown
            .get(&topic)
            .and_then(|row| row.get(&difficulty))
            .copied()
    }

    #[must_use]
    pub fn streak(&self) -> Streak {
        self.streak
    }

    /// Accuracy across every difficulty of `topic`, if the topic was scored.
    #[must_use]
    pub fn topic_accuracy(&self, topic: Topic) -> Option<f64> {
        let row = self.topic_breakdown.get(&topic)?;
        let (correct, total) = row
            .values()
            .fold((0, 0), |(c, t), cell| (c + cell.correct, t + cell.total));
        Some(percent(correct, total))
    }

    /// Answered questions per minute, 0.0 when no time has elapsed.
    #[must_use]
    pub fn questions_per_minute(&self) -> f64 {
        if self.elapsed_seconds == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let minutes = self.elapsed_seconds as f64 / 60.0;
        round2(f64::from(self.total_answered) / minutes)
    }

    #[must_use]
    pub fn performance_grade(&self) -> PerformanceGrade {
        PerformanceGrade::from_accuracy(self.accuracy_percent)
    }
}

/// Letter grade derived from accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PerformanceGrade {
    A,
    B,
    C,
    D,
    F,
}

impl PerformanceGrade {
    #[must_use]
    pub fn from_accuracy(accuracy_percent: f64) -> Self {
        match accuracy_percent {
            a if a >= 90.0 => Self::A,
            a if a >= 80.0 => Self::B,
            a if a >= 70.0 => Self::C,
            a if a >= 60.0 => Self::D,
            _ => Self::F,
        }
    }
}

impl fmt::Display for PerformanceGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        };
        f.write_str(letter)
    }
}

/// Rounds to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn percent(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(f64::from(part) / f64::from(whole) * 100.0)
}
