use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use quiz_core::model::{Difficulty, PerformanceGrade, Score, Session, SessionId, Topic};

/// Cells below this accuracy get a review flag.
pub const REVIEW_THRESHOLD_PERCENT: f64 = 60.0;

/// Fewer answered questions per minute than this is slow.
pub const SLOW_PACE_PER_MINUTE: f64 = 1.0;

/// More answered questions per minute than this is rushed.
pub const FAST_PACE_PER_MINUTE: f64 = 5.0;

//
// ─── CLASSIFICATIONS ───────────────────────────────────────────────────────────
//

/// Fixed accuracy bands: 90 / 70 / 50.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyBand {
    Excellent,
    Good,
    Fair,
    NeedsPractice,
}

impl AccuracyBand {
    #[must_use]
    pub fn from_accuracy(accuracy_percent: f64) -> Self {
        match accuracy_percent {
            a if a >= 90.0 => Self::Excellent,
            a if a >= 70.0 => Self::Good,
            a if a >= 50.0 => Self::Fair,
            _ => Self::NeedsPractice,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::NeedsPractice => "needs practice",
        }
    }

    fn recommendation(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent performance! Consider trying harder difficulty levels.",
            Self::Good => {
                "Good performance! Review incorrect answers and practice similar questions."
            }
            Self::Fair => "Fair performance. Focus on understanding fundamental concepts.",
            Self::NeedsPractice => {
                "Keep practicing! Consider reviewing study materials for this topic."
            }
        }
    }
}

impl fmt::Display for AccuracyBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pace outside the comfortable 1..=5 answered questions per minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaceNote {
    TooSlow,
    Rushing,
}

impl PaceNote {
    /// `None` when the pace is comfortable or no time has elapsed.
    /// Nothing answered over a measured time counts as too slow.
    #[must_use]
    pub fn from_score(score: &Score) -> Option<Self> {
        if score.elapsed_seconds() == 0 {
            return None;
        }
        let pace = score.questions_per_minute();
        if pace < SLOW_PACE_PER_MINUTE {
            Some(Self::TooSlow)
        } else if pace > FAST_PACE_PER_MINUTE {
            Some(Self::Rushing)
        } else {
            None
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::TooSlow => "too slow",
            Self::Rushing => "rushing",
        }
    }

    fn recommendation(self) -> &'static str {
        match self {
            Self::TooSlow => "Try to answer questions more quickly with practice.",
            Self::Rushing => "Great speed! Make sure you're not rushing through questions.",
        }
    }
}

/// A topic/difficulty cell whose own accuracy fell below the review threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReviewFlag {
    pub topic: Topic,
    pub difficulty: Difficulty,
    pub accuracy_percent: f64,
}

impl ReviewFlag {
    fn recommendation(&self) -> String {
        format!(
            "Review {} ({}) questions: {:.2}% correct.",
            self.topic, self.difficulty, self.accuracy_percent
        )
    }
}

//
// ─── REPORT ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub topic: Topic,
    pub difficulty: Difficulty,
    pub total_questions: u32,
    pub is_active: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_seconds: u64,
    /// Human-readable form of `duration_seconds`, e.g. "2m 5s".
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub answered: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub accuracy_percent: f64,
    pub grade: PerformanceGrade,
    pub questions_per_minute: f64,
    pub band: AccuracyBand,
    pub pace: Option<PaceNote>,
}

/// Score plus fixed-threshold feedback for one session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
    pub session: SessionInfo,
    pub performance: PerformanceSummary,
    pub review: Vec<ReviewFlag>,
    pub recommendations: Vec<String>,
    pub score: Score,
}

impl PerformanceReport {
    #[must_use]
    pub fn build(session: &Session, score: Score) -> Self {
        let duration_seconds = score.elapsed_seconds();
        let band = AccuracyBand::from_accuracy(score.accuracy_percent());
        let pace = PaceNote::from_score(&score);
        let review = review_flags(&score);

        let mut recommendations = vec![band.recommendation().to_owned()];
        recommendations.extend(pace.map(|note| note.recommendation().to_owned()));
        recommendations.extend(review.iter().map(ReviewFlag::recommendation));

        Self {
            session: SessionInfo {
                session_id: session.id(),
                topic: session.topic(),
                difficulty: session.difficulty(),
                total_questions: session.total_questions(),
                is_active: session.is_active(),
                started_at: session.started_at(),
                completed_at: session.completed_at(),
                duration_seconds,
                duration: format_duration(duration_seconds),
            },
            performance: PerformanceSummary {
                answered: score.total_answered(),
                correct: score.correct(),
                incorrect: score.incorrect(),
                accuracy_percent: score.accuracy_percent(),
                grade: score.performance_grade(),
                questions_per_minute: score.questions_per_minute(),
                band,
                pace,
            },
            review,
            recommendations,
            score,
        }
    }
}

fn review_flags(score: &Score) -> Vec<ReviewFlag> {
    score
        .topic_breakdown()
        .iter()
        .flat_map(|(topic, row)| {
            row.iter().map(move |(difficulty, cell)| (*topic, *difficulty, *cell))
        })
        .filter(|(_, _, cell)| cell.total > 0)
        .filter_map(|(topic, difficulty, cell)| {
            let accuracy_percent = cell.accuracy_percent();
            (accuracy_percent < REVIEW_THRESHOLD_PERCENT).then_some(ReviewFlag {
                topic,
                difficulty,
                accuracy_percent,
            })
        })
        .collect()
}

/// "45s", "2m 5s", "1h 3m".
#[must_use]
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}
