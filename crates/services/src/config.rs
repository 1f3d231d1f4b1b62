use crate::error::{ConfigError, ValidationError};

pub const MIN_SESSION_LENGTH_KEY: &str = "QUIZ_MIN_SESSION_LENGTH";
pub const MAX_SESSION_LENGTH_KEY: &str = "QUIZ_MAX_SESSION_LENGTH";
pub const DEFAULT_SESSION_LENGTH_KEY: &str = "QUIZ_DEFAULT_SESSION_LENGTH";

/// Session-length bounds applied when sessions are created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizSettings {
    min_questions: u32,
    max_questions: u32,
    default_questions: u32,
}

impl QuizSettings {
    pub const DEFAULT_MIN_QUESTIONS: u32 = 1;
    pub const DEFAULT_MAX_QUESTIONS: u32 = 50;
    pub const DEFAULT_QUESTIONS: u32 = 10;

    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBounds` unless `1 <= min <= default <= max`.
    pub fn new(
        min_questions: u32,
        max_questions: u32,
        default_questions: u32,
    ) -> Result<Self, ConfigError> {
        let ordered = 1 <= min_questions
            && min_questions <= default_questions
            && default_questions <= max_questions;
        if !ordered {
            return Err(ConfigError::InvalidBounds {
                min: min_questions,
                default: default_questions,
                max: max_questions,
            });
        }
        Ok(Self {
            min_questions,
            max_questions,
            default_questions,
        })
    }

    /// Read bounds from `QUIZ_*_SESSION_LENGTH` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for unparsable values or inconsistent bounds.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`QuizSettings::from_env`] with a custom key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for unparsable values or inconsistent bounds.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &'static str, fallback: u32| -> Result<u32, ConfigError> {
            match lookup(key) {
                None => Ok(fallback),
                Some(raw) => match raw.trim().parse::<u32>() {
                    Ok(value) => Ok(value),
                    Err(_) => Err(ConfigError::InvalidNumber { key, value: raw }),
                },
            }
        };

        Self::new(
            read(MIN_SESSION_LENGTH_KEY, Self::DEFAULT_MIN_QUESTIONS)?,
            read(MAX_SESSION_LENGTH_KEY, Self::DEFAULT_MAX_QUESTIONS)?,
            read(DEFAULT_SESSION_LENGTH_KEY, Self::DEFAULT_QUESTIONS)?,
        )
    }

    #[must_use]
    pub fn min_questions(&self) -> u32 {
        self.min_questions
    }

    #[must_use]
    pub fn max_questions(&self) -> u32 {
        self.max_questions
    }

    #[must_use]
    pub fn default_questions(&self) -> u32 {
        self.default_questions
    }

    /// # Errors
    ///
    /// Returns `ValidationError::TotalQuestionsOutOfRange` outside the bounds.
    pub fn check_total_questions(&self, value: u32) -> Result<(), ValidationError> {
        if (self.min_questions..=self.max_questions).contains(&value) {
            Ok(())
        } else {
            Err(ValidationError::TotalQuestionsOutOfRange {
                value,
                min: self.min_questions,
                max: self.max_questions,
            })
        }
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            min_questions: Self::DEFAULT_MIN_QUESTIONS,
            max_questions: Self::DEFAULT_MAX_QUESTIONS,
            default_questions: Self::DEFAULT_QUESTIONS,
        }
    }
}
