mod input;
mod service;
mod view;

pub use input::{
    parse_difficulty, parse_question_id, parse_session_id, parse_topic, parse_total_questions,
};
pub use service::QuizService;
pub use view::{AnswerOutcome, EXPLANATION, NextQuestion, QuestionPrompt, SessionStatistics};
