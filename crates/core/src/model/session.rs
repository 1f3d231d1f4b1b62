use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::model::ids::{QuestionId, SessionId};
use crate::model::progress::SessionProgress;
use crate::model::question::{Difficulty, Topic};
use crate::time::elapsed_seconds;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Rejected transitions of the session state machine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionStateError {
    #[error("session must ask at least one question")]
    ZeroQuestions,

    #[error("session is no longer active")]
    Inactive,

    #[error("session already completed")]
    AlreadyCompleted,

    #[error("question {question_id} was already asked")]
    AlreadyAsked { question_id: QuestionId },

    #[error("question limit of {limit} reached")]
    LimitReached { limit: u32 },

    #[error("question {question_id} was not asked in this session")]
    NotAsked { question_id: QuestionId },

    #[error("question {question_id} was already answered")]
    AlreadyAnswered { question_id: QuestionId },

    #[error("answer text cannot be empty")]
    EmptyAnswer,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One practice run bound to a topic, a difficulty and a target question count.
///
/// The session is the single source of truth for which questions were asked
/// (ordered, unique) and which were answered. It starts `Active` and moves to
/// `Completed` exactly once via [`Session::complete`]; a completed session
/// refuses every further `ask`/`answer`.
#[derive(Clone, PartialEq)]
pub struct Session {
    id: SessionId,
    topic: Topic,
    difficulty: Difficulty,
    total_questions: u32,
    asked: Vec<QuestionId>,
    current_index: usize,
    answers: HashMap<QuestionId, String>,
    is_active: bool,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Start a new active session.
    ///
    /// Bounds beyond "at least one question" are enforced by the caller.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::ZeroQuestions` when `total_questions` is 0.
    pub fn new(
        id: SessionId,
        topic: Topic,
        difficulty: Difficulty,
        total_questions: u32,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionStateError> {
        if total_questions == 0 {
            return Err(SessionStateError::ZeroQuestions);
        }

        Ok(Self {
            id,
            topic,
            difficulty,
            total_questions,
            asked: Vec::new(),
            current_index: 0,
            answers: HashMap::new(),
            is_active: true,
            started_at,
            completed_at: None,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
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
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    /// Questions asked so far, in asking order.
    #[must_use]
    pub fn asked(&self) -> &[QuestionId] {
        &self.asked
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn answer_for(&self, question_id: QuestionId) -> Option<&str> {
        self.answers.get(&question_id).map(String::as_str)
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Answered questions in the order they were asked.
    pub fn answers_in_order(&self) -> impl Iterator<Item = (QuestionId, &str)> + '_ {
        self.asked
            .iter()
            .filter_map(|id| self.answers.get(id).map(|text| (*id, text.as_str())))
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Record `question_id` as the next asked question.
    ///
    /// # Errors
    ///
    /// Fails when the session is inactive, the question was already asked,
    /// or `total_questions` questions have been asked.
    pub fn ask(&mut self, question_id: QuestionId) -> Result<(), SessionStateError> {
        if !self.is_active {
            return Err(SessionStateError::Inactive);
        }
        if self.asked.contains(&question_id) {
            return Err(SessionStateError::AlreadyAsked { question_id });
        }
        if self.asked_count() >= self.total_questions {
            return Err(SessionStateError::LimitReached {
                limit: self.total_questions,
            });
        }

        self.asked.push(question_id);
        self.current_index += 1;
        Ok(())
    }

    /// Store the answer for a previously asked question.
    ///
    /// The text is stored trimmed.
    ///
    /// # Errors
    ///
    /// Fails when the session is inactive, the question was never asked,
    /// the question already has an answer, or the text is blank.
    pub fn answer(&mut self, question_id: QuestionId, text: &str) -> Result<(), SessionStateError> {
        if !self.is_active {
            return Err(SessionStateError::Inactive);
        }
        if !self.asked.contains(&question_id) {
            return Err(SessionStateError::NotAsked { question_id });
        }
        if self.answers.contains_key(&question_id) {
            return Err(SessionStateError::AlreadyAnswered { question_id });
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionStateError::EmptyAnswer);
        }

        self.answers.insert(question_id, text.to_owned());
        Ok(())
    }

    /// Move to the terminal state.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::AlreadyCompleted` on a second call.
    pub fn complete(&mut self, at: DateTime<Utc>) -> Result<(), SessionStateError> {
        if !self.is_active {
            return Err(SessionStateError::AlreadyCompleted);
        }
        self.is_active = false;
        self.completed_at = Some(at.max(self.started_at));
        Ok(())
    }

    /// True once `total_questions` questions have been asked, answered or not.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.asked_count() >= self.total_questions
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let asked = self.asked_count();
        let answered = u32::try_from(self.answers.len()).unwrap_or(u32::MAX);
        SessionProgress {
            total: self.total_questions,
            asked,
            answered,
            remaining: self.total_questions.saturating_sub(asked),
            percent: f64::from(asked) / f64::from(self.total_questions) * 100.0,
            is_complete: self.is_complete(),
        }
    }

    /// Measured duration: up to the end time once completed, otherwise up to `now`.
    #[must_use]
    pub fn duration_seconds(&self, now: DateTime<Utc>) -> u64 {
        elapsed_seconds(self.started_at, self.completed_at.unwrap_or(now))
    }

    fn asked_count(&self) -> u32 {
        u32::try_from(self.asked.len()).unwrap_or(u32::MAX)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .field("difficulty", &self.difficulty)
            .field("total_questions", &self.total_questions)
            .field("asked_len", &self.asked.len())
            .field("answers_len", &self.answers.len())
            .field("is_active", &self.is_active)
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
