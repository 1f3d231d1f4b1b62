mod ids;
mod progress;
mod question;
mod score;
mod session;

pub use ids::{ParseIdError, QuestionId, SessionId};
pub use progress::SessionProgress;
pub use question::{
    Difficulty, OPTION_COUNT, ParseDifficultyError, ParseTopicError, QuestionRecord,
    QuestionRecordError, Topic,
};
pub use score::{CellTally, PerformanceGrade, Score, ScoreTally, Streak, TopicBreakdown, round2};
pub use session::{Session, SessionStateError};
