//! Shared error types for the services crate.
//!
//! Four kinds reach callers: validation, session, question and score errors.
//! None of them is caught or retried inside the crate.

use thiserror::Error;

use quiz_core::model::{
    ParseDifficultyError, ParseIdError, ParseTopicError, QuestionId, SessionId, SessionStateError,
};
use quiz_storage::StorageError;

/// Bad input, detected before any state changes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("topic {value:?} is not available")]
    UnknownTopic { value: String },

    #[error("difficulty {value:?} is not available")]
    UnknownDifficulty { value: String },

    #[error("total_questions must be between {min} and {max}, got {value}")]
    TotalQuestionsOutOfRange { value: u32, min: u32, max: u32 },

    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    #[error("invalid {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },
}

impl ValidationError {
    /// Name of the offending input field.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::UnknownTopic { .. } => "topic",
            Self::UnknownDifficulty { .. } => "difficulty",
            Self::TotalQuestionsOutOfRange { .. } => "total_questions",
            Self::Empty { field } | Self::InvalidValue { field, .. } => *field,
        }
    }
}

impl From<ParseTopicError> for ValidationError {
    fn from(err: ParseTopicError) -> Self {
        Self::UnknownTopic { value: err.raw }
    }
}

impl From<ParseDifficultyError> for ValidationError {
    fn from(err: ParseDifficultyError) -> Self {
        Self::UnknownDifficulty { value: err.raw }
    }
}

impl From<ParseIdError> for ValidationError {
    fn from(err: ParseIdError) -> Self {
        let field = match err.kind() {
            "SessionId" => "session_id",
            _ => "question_id",
        };
        Self::InvalidValue {
            field,
            value: err.raw().to_owned(),
        }
    }
}

/// Session lookup or state-machine failure. Always names the session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session {session_id} not found")]
    NotFound { session_id: SessionId },

    #[error("session {session_id}: {source}")]
    State {
        session_id: SessionId,
        #[source]
        source: SessionStateError,
    },

    #[error("session {session_id}: {source}")]
    Storage {
        session_id: SessionId,
        #[source]
        source: StorageError,
    },
}

impl SessionError {
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        match self {
            Self::NotFound { session_id }
            | Self::State { session_id, .. }
            | Self::Storage { session_id, .. } => *session_id,
        }
    }

    pub(crate) fn from_storage(session_id: SessionId, source: StorageError) -> Self {
        match source {
            StorageError::NotFound(_) => Self::NotFound { session_id },
            source => Self::Storage { session_id, source },
        }
    }

    pub(crate) fn state(session_id: SessionId) -> impl FnOnce(SessionStateError) -> Self {
        move |source| Self::State { session_id, source }
    }
}

/// Unknown question referenced by an answer submission.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {question_id} not found")]
    NotFound { question_id: QuestionId },
}

/// Score requested for a session that cannot produce one.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScoreError {
    #[error("no score available for session {session_id}: session not found")]
    SessionNotFound { session_id: SessionId },

    #[error("session {session_id} is still active and has no final score")]
    NotCompleted { session_id: SessionId },

    #[error("score for session {session_id} unavailable: {source}")]
    Storage {
        session_id: SessionId,
        #[source]
        source: StorageError,
    },

    #[error("score cache unavailable: {0}")]
    Cache(#[source] StorageError),
}

impl ScoreError {
    pub(crate) fn from_storage(session_id: SessionId, source: StorageError) -> Self {
        match source {
            StorageError::NotFound(_) => Self::SessionNotFound { session_id },
            source => Self::Storage { session_id, source },
        }
    }
}

/// Invalid quiz settings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error(
        "session length bounds must satisfy 1 <= min ({min}) <= default ({default}) <= max ({max})"
    )]
    InvalidBounds { min: u32, default: u32, max: u32 },
}

/// Errors emitted by the quiz services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
