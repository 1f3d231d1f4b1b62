//! Parsing of raw transport input into typed values.
//!
//! Every failure is a `ValidationError` naming the field. Surrounding
//! whitespace is ignored; blank input is `ValidationError::Empty`.

use quiz_core::model::{Difficulty, QuestionId, SessionId, Topic};

use crate::error::ValidationError;

fn non_empty<'a>(field: &'static str, raw: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(trimmed)
}

/// # Errors
///
/// Returns `ValidationError` for blank input or an unknown topic name.
pub fn parse_topic(raw: &str) -> Result<Topic, ValidationError> {
    Ok(non_empty("topic", raw)?.parse::<Topic>()?)
}

/// # Errors
///
/// Returns `ValidationError` for blank input or an unknown difficulty name.
pub fn parse_difficulty(raw: &str) -> Result<Difficulty, ValidationError> {
    Ok(non_empty("difficulty", raw)?.parse::<Difficulty>()?)
}

/// # Errors
///
/// Returns `ValidationError` for blank or non-numeric input.
pub fn parse_question_id(raw: &str) -> Result<QuestionId, ValidationError> {
    Ok(non_empty("question_id", raw)?.parse::<QuestionId>()?)
}

/// # Errors
///
/// Returns `ValidationError` for blank input or a malformed UUID.
pub fn parse_session_id(raw: &str) -> Result<SessionId, ValidationError> {
    Ok(non_empty("session_id", raw)?.parse::<SessionId>()?)
}

/// Parses the requested question count. Bounds are checked at session creation.
///
/// # Errors
///
/// Returns `ValidationError` for blank or non-numeric input.
pub fn parse_total_questions(raw: &str) -> Result<u32, ValidationError> {
    let value = non_empty("total_questions", raw)?;
    value
        .parse::<u32>()
        .map_err(|_| ValidationError::InvalidValue {
            field: "total_questions",
            value: value.to_owned(),
        })
}
