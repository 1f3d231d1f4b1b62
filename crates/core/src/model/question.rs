use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionRecordError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("option {index} cannot be empty")]
    EmptyOption { index: usize },

    #[error("option {value:?} appears more than once")]
    DuplicateOption { value: String },

    #[error("correct answer {value:?} is not one of the options")]
    AnswerNotInOptions { value: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown topic {raw:?}, expected one of Physics, Chemistry, Math")]
pub struct ParseTopicError {
    pub raw: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown difficulty {raw:?}, expected one of Easy, Medium, Hard")]
pub struct ParseDifficultyError {
    pub raw: String,
}

//
// ─── TOPIC / DIFFICULTY ────────────────────────────────────────────────────────
//

/// Subject area of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Topic {
    Physics,
    Chemistry,
    Math,
}

impl Topic {
    pub const ALL: [Topic; 3] = [Topic::Physics, Topic::Chemistry, Topic::Math];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Topic::Physics => "Physics",
            Topic::Chemistry => "Chemistry",
            Topic::Math => "Math",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = ParseTopicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Topic::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseTopicError { raw: s.to_owned() })
    }
}

/// Difficulty tier of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| ParseDifficultyError { raw: s.to_owned() })
    }
}

//
// ─── QUESTION RECORD ───────────────────────────────────────────────────────────
//

/// Number of answer options every question carries.
pub const OPTION_COUNT: usize = 4;

/// A validated multiple-choice question.
///
/// Immutable once built: the correct answer is always one of the four
/// options, and the options are pairwise distinct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    id: QuestionId,
    topic: Topic,
    difficulty: Difficulty,
    text: String,
    options: [String; OPTION_COUNT],
    correct_answer: String,
}

impl QuestionRecord {
    /// Build a question record, checking its invariants.
    ///
    /// # Errors
    ///
    /// Returns `QuestionRecordError` when the text or an option is blank, an
    /// option is repeated, or the correct answer is not among the options.
    pub fn new(
        id: QuestionId,
        topic: Topic,
        difficulty: Difficulty,
        text: impl Into<String>,
        options: [String; OPTION_COUNT],
        correct_answer: impl Into<String>,
    ) -> Result<Self, QuestionRecordError> {
        let text = text.into();
        let correct_answer = correct_answer.into();

        if text.trim().is_empty() {
            return Err(QuestionRecordError::EmptyText);
        }
        for (index, option) in options.iter().enumerate() {
            if option.trim().is_empty() {
                return Err(QuestionRecordError::EmptyOption { index });
            }
            let key = normalize(option);
            if options[..index].iter().any(|earlier| normalize(earlier) == key) {
                return Err(QuestionRecordError::DuplicateOption {
                    value: option.clone(),
                });
            }
        }
        if !options.contains(&correct_answer) {
            return Err(QuestionRecordError::AnswerNotInOptions {
                value: correct_answer,
            });
        }

        Ok(Self {
            id,
            topic,
            difficulty,
            text,
            options,
            correct_answer,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn topic(&self) -> Topic {
        self.topic
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    /// Exact match after trimming whitespace, ignoring case.
    #[must_use]
    pub fn is_correct(&self, answer: &str) -> bool {
        normalize(answer) == normalize(&self.correct_answer)
    }
}

/// Comparison key shared by answer matching and option uniqueness.
fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}
