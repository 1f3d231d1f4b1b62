use serde::Serialize;
use std::collections::BTreeSet;

use quiz_core::model::{Difficulty, OPTION_COUNT, QuestionId, QuestionRecord, Topic};

/// Canned explanation attached to incorrect answers.
pub const EXPLANATION: &str = "The correct answer is highlighted above.";

/// Question as served to a client. Carries no correctness data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionPrompt {
    pub id: QuestionId,
    pub text: String,
    pub options: [String; OPTION_COUNT],
}

impl QuestionPrompt {
    #[must_use]
    pub fn from_record(record: &QuestionRecord) -> Self {
        Self {
            id: record.id(),
            text: record.text().to_owned(),
            options: record.options().clone(),
        }
    }
}

/// Result of asking for the next question.
///
/// `Complete` and `Exhausted` both mean there is nothing to serve; neither
/// changes the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextQuestion {
    Question(QuestionPrompt),
    /// The session already asked `total_questions` questions.
    Complete,
    /// No unasked question matches the session's topic and difficulty.
    Exhausted,
}

impl NextQuestion {
    #[must_use]
    pub fn into_question(self) -> Option<QuestionPrompt> {
        match self {
            Self::Question(prompt) => Some(prompt),
            Self::Complete | Self::Exhausted => None,
        }
    }

    #[must_use]
    pub fn is_served(&self) -> bool {
        matches!(self, Self::Question(_))
    }
}

/// Outcome of one submitted answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerOutcome {
    pub question_id: QuestionId,
    pub correct: bool,
    pub correct_answer: String,
    /// Only set for incorrect answers.
    pub explanation: Option<String>,
}

/// Counts over every registered session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionStatistics {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    pub topics: BTreeSet<Topic>,
    pub difficulties: BTreeSet<Difficulty>,
}
