#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod scoring;
pub mod sessions;

pub use quiz_core::Clock;

pub use config::QuizSettings;
pub use error::{
    ConfigError, QuestionError, QuizError, ScoreError, SessionError, ValidationError,
};
pub use scoring::{AccuracyBand, PaceNote, PerformanceReport, ReviewFlag, ScoreAggregator};
pub use sessions::{AnswerOutcome, NextQuestion, QuestionPrompt, QuizService, SessionStatistics};
