use std::sync::Arc;

use quiz_core::model::{
    Difficulty, QuestionId, Score, Session, SessionId, SessionProgress, SessionStateError, Topic,
};
use quiz_core::{Catalog, Clock, QuestionFilter, QuestionLookup};
use quiz_storage::{SessionHandle, SessionRepository, Storage};

use super::view::{AnswerOutcome, EXPLANATION, NextQuestion, QuestionPrompt, SessionStatistics};
use crate::config::QuizSettings;
use crate::error::{QuestionError, QuizError, SessionError, ValidationError};
use crate::scoring::{PerformanceReport, ScoreAggregator};

/// Orchestrates quiz sessions between the catalog and the session store.
///
/// Every mutation of a session happens under that session's write lock, so
/// `next_question` and `submit_answer` are atomic per session. Different
/// sessions never contend.
#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    settings: QuizSettings,
    catalog: Arc<Catalog>,
    sessions: Arc<dyn SessionRepository>,
    scoring: ScoreAggregator,
}

impl QuizService {
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, storage: &Storage, settings: QuizSettings) -> Self {
        let clock = Clock::default();
        let questions: Arc<dyn QuestionLookup> = catalog.clone();
        let scoring = ScoreAggregator::new(
            clock,
            storage.session_reader.clone(),
            questions,
            storage.scores.clone(),
        );
        Self {
            clock,
            settings,
            catalog,
            sessions: storage.sessions.clone(),
            scoring,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self.scoring = self.scoring.with_clock(clock);
        self
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn scoring(&self) -> &ScoreAggregator {
        &self.scoring
    }

    //
    // ─── LIFECYCLE ─────────────────────────────────────────────────────────────
    //

    /// Register a new active session and return its id.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the topic or difficulty has no questions in
    /// the catalog, or `total_questions` is outside the configured bounds.
    pub fn create_session(
        &self,
        topic: Topic,
        difficulty: Difficulty,
        total_questions: u32,
    ) -> Result<SessionId, QuizError> {
        if !self.catalog.available_topics().contains(&topic) {
            return Err(ValidationError::UnknownTopic {
                value: topic.to_string(),
            }
            .into());
        }
        if !self.catalog.available_difficulties().contains(&difficulty) {
            return Err(ValidationError::UnknownDifficulty {
                value: difficulty.to_string(),
            }
            .into());
        }
        self.settings.check_total_questions(total_questions)?;

        let session_id = SessionId::generate();
        let session = Session::new(
            session_id,
            topic,
            difficulty,
            total_questions,
            self.clock.now(),
        )
        .map_err(SessionError::state(session_id))?;
        self.sessions
            .insert(session)
            .map_err(|source| SessionError::from_storage(session_id, source))?;

        tracing::info!(
            session_id = %session_id,
            topic = %topic,
            difficulty = %difficulty,
            total_questions,
            "quiz session created"
        );
        Ok(session_id)
    }

    /// Same as [`QuizService::create_session`] with the configured default length.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the topic or difficulty has no questions.
    pub fn create_default_session(
        &self,
        topic: Topic,
        difficulty: Difficulty,
    ) -> Result<SessionId, QuizError> {
        self.create_session(topic, difficulty, self.settings.default_questions())
    }

    /// Serve a random unasked question and record it as asked.
    ///
    /// Returns `NextQuestion::Complete` once the session has asked its quota
    /// and `NextQuestion::Exhausted` when no unasked question matches; neither
    /// changes the session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFound` for an unknown id and
    /// `SessionError::State` for a session completed before its quota.
    pub fn next_question(&self, session_id: SessionId) -> Result<NextQuestion, QuizError> {
        let handle = self.handle(session_id)?;
        let mut session = handle
            .write()
            .map_err(|source| SessionError::from_storage(session_id, source))?;

        if session.is_complete() {
            return Ok(NextQuestion::Complete);
        }
        if !session.is_active() {
            return Err(SessionError::State {
                session_id,
                source: SessionStateError::Inactive,
            }
            .into());
        }

        let filter = QuestionFilter::new()
            .with_topic(session.topic())
            .with_difficulty(session.difficulty())
            .excluding(session.asked().iter().copied());
        let Some(record) = self.catalog.random_match(&filter) else {
            tracing::debug!(session_id = %session_id, "no unasked question left to serve");
            return Ok(NextQuestion::Exhausted);
        };

        session
            .ask(record.id())
            .map_err(SessionError::state(session_id))?;
        tracing::debug!(
            session_id = %session_id,
            question_id = %record.id(),
            asked = session.asked().len(),
            "question served"
        );
        Ok(NextQuestion::Question(QuestionPrompt::from_record(record)))
    }

    /// Record an answer for a question this session has asked.
    ///
    /// Correctness is a trimmed, case-insensitive exact match.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::Empty` for a blank answer,
    /// `QuestionError::NotFound` for an id missing from the catalog, and
    /// `SessionError` for an unknown, inactive or out-of-order session.
    pub fn submit_answer(
        &self,
        session_id: SessionId,
        question_id: QuestionId,
        answer: &str,
    ) -> Result<AnswerOutcome, QuizError> {
        if answer.trim().is_empty() {
            return Err(ValidationError::Empty { field: "answer" }.into());
        }
        let record = self
            .catalog
            .get_by_id(question_id)
            .ok_or(QuestionError::NotFound { question_id })?;
        let correct = record.is_correct(answer);

        let handle = self.handle(session_id)?;
        {
            let mut session = handle
                .write()
                .map_err(|source| SessionError::from_storage(session_id, source))?;
            session
                .answer(question_id, answer)
                .map_err(SessionError::state(session_id))?;
        }

        tracing::debug!(
            session_id = %session_id,
            question_id = %question_id,
            correct,
            "answer recorded"
        );
        Ok(AnswerOutcome {
            question_id,
            correct,
            correct_answer: record.correct_answer().to_owned(),
            explanation: (!correct).then(|| EXPLANATION.to_owned()),
        })
    }

    /// End the session and return its final score.
    ///
    /// Safe to repeat: later calls return the score cached by the first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFound` for an unknown id, or `ScoreError`
    /// if the score cannot be cached, in which case the session stays active.
    pub fn complete_session(&self, session_id: SessionId) -> Result<Score, QuizError> {
        let handle = self.handle(session_id)?;
        let mut session = handle
            .write()
            .map_err(|source| SessionError::from_storage(session_id, source))?;

        let newly_completed = session.is_active();
        let score = if newly_completed {
            // The completed state is only stored once its score is cached.
            let mut completed = session.clone();
            completed
                .complete(self.clock.now())
                .map_err(SessionError::state(session_id))?;
            let score = self.scoring.finalize(&completed)?;
            *session = completed;
            score
        } else {
            self.scoring.finalize(&session)?
        };

        if newly_completed {
            tracing::info!(
                session_id = %session_id,
                answered = score.total_answered(),
                correct = score.correct(),
                accuracy = score.accuracy_percent(),
                "quiz session completed"
            );
        }
        Ok(score)
    }

    //
    // ─── QUERIES ───────────────────────────────────────────────────────────────
    //

    /// Score of the session right now, recomputed on every call.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::SessionNotFound` for an unknown id.
    pub fn live_score(&self, session_id: SessionId) -> Result<Score, QuizError> {
        Ok(self.scoring.live_score(session_id)?)
    }

    /// # Errors
    ///
    /// Returns `ScoreError::SessionNotFound` for an unknown id.
    pub fn summarize(&self, session_id: SessionId) -> Result<PerformanceReport, QuizError> {
        Ok(self.scoring.summarize(session_id)?)
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotFound` for an unknown id.
    pub fn session(&self, session_id: SessionId) -> Result<Session, QuizError> {
        Ok(self
            .sessions
            .snapshot(session_id)
            .map_err(|source| SessionError::from_storage(session_id, source))?)
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotFound` for an unknown id.
    pub fn progress(&self, session_id: SessionId) -> Result<SessionProgress, QuizError> {
        Ok(self.session(session_id)?.progress())
    }

    /// Sessions not yet completed, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the registry is unavailable.
    pub fn active_sessions(&self) -> Result<Vec<Session>, QuizError> {
        let mut sessions = self.sessions.list()?;
        sessions.retain(Session::is_active);
        Ok(sessions)
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the registry is unavailable.
    pub fn session_statistics(&self) -> Result<SessionStatistics, QuizError> {
        let sessions = self.sessions.list()?;
        let mut stats = SessionStatistics {
            total: sessions.len(),
            ..SessionStatistics::default()
        };
        for session in &sessions {
            if session.is_active() {
                stats.active += 1;
            } else {
                stats.completed += 1;
            }
            stats.topics.insert(session.topic());
            stats.difficulties.insert(session.difficulty());
        }
        Ok(stats)
    }

    //
    // ─── SCORE CACHE ───────────────────────────────────────────────────────────
    //

    /// # Errors
    ///
    /// Returns `ScoreError::Cache` if the cache is unavailable.
    pub fn cached_scores(&self) -> Result<Vec<Score>, QuizError> {
        Ok(self.scoring.cached_scores()?)
    }

    /// # Errors
    ///
    /// Returns `ScoreError::Cache` if the cache is unavailable.
    pub fn average_accuracy(&self, topic: Option<Topic>) -> Result<f64, QuizError> {
        Ok(self.scoring.average_accuracy(topic)?)
    }

    /// # Errors
    ///
    /// Returns `ScoreError::Storage` if the cache is unavailable.
    pub fn forget_score(&self, session_id: SessionId) -> Result<bool, QuizError> {
        Ok(self.scoring.forget_score(session_id)?)
    }

    /// # Errors
    ///
    /// Returns `ScoreError::Cache` if the cache is unavailable.
    pub fn clear_scores(&self) -> Result<(), QuizError> {
        Ok(self.scoring.clear_scores()?)
    }

    fn handle(&self, session_id: SessionId) -> Result<SessionHandle, SessionError> {
        self.sessions
            .handle(session_id)
            .map_err(|source| SessionError::from_storage(session_id, source))
    }
}
