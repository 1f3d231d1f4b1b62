use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::QuestionLookup;
use quiz_core::model::{Score, ScoreTally, Session, SessionId, Topic, round2};
use quiz_storage::{ScoreRepository, SessionReader};

use super::report::PerformanceReport;
use crate::error::ScoreError;

/// Turns a session's answer log into a [`Score`] and caches final results.
///
/// Holds read-only capabilities only: a session reader, a question lookup
/// and the score cache. It never calls back into the orchestrator.
#[derive(Clone)]
pub struct ScoreAggregator {
    clock: Clock,
    sessions: Arc<dyn SessionReader>,
    questions: Arc<dyn QuestionLookup>,
    scores: Arc<dyn ScoreRepository>,
}

impl ScoreAggregator {
    #[must_use]
    pub fn new(
        clock: Clock,
        sessions: Arc<dyn SessionReader>,
        questions: Arc<dyn QuestionLookup>,
        scores: Arc<dyn ScoreRepository>,
    ) -> Self {
        Self {
            clock,
            sessions,
            questions,
            scores,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Score `session` as it stands, walking answers in asking order.
    ///
    /// Answers whose question cannot be resolved are left out of every count.
    #[must_use]
    pub fn compute(&self, session: &Session) -> Score {
        let mut tally = ScoreTally::new();
        for (question_id, answer) in session.answers_in_order() {
            let Some(question) = self.questions.question(question_id) else {
                tracing::warn!(
                    session_id = %session.id(),
                    question_id = %question_id,
                    "answered question missing from catalog, excluded from score"
                );
                continue;
            };
            tally.record(
                question.topic(),
                question.difficulty(),
                question.is_correct(answer),
            );
        }

        let elapsed = session.duration_seconds(self.clock.now());
        tally.finish(session.id(), session.total_questions(), elapsed)
    }

    /// Final score of a completed session, computed once and then served from cache.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::NotCompleted` for an active session, or
    /// `ScoreError::Storage` if the cache is unavailable.
    pub fn finalize(&self, session: &Session) -> Result<Score, ScoreError> {
        let session_id = session.id();
        if session.is_active() {
            return Err(ScoreError::NotCompleted { session_id });
        }
        if let Some(cached) = self.cached_score(session_id)? {
            return Ok(cached);
        }

        let score = self.compute(session);
        self.scores
            .cache_if_absent(score)
            .map_err(|source| ScoreError::from_storage(session_id, source))
    }

    /// Freshly computed score, never cached.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::SessionNotFound` for an unknown session id.
    pub fn live_score(&self, session_id: SessionId) -> Result<Score, ScoreError> {
        let session = self.snapshot(session_id)?;
        Ok(self.compute(&session))
    }

    /// # Errors
    ///
    /// Returns `ScoreError::Storage` if the cache is unavailable.
    pub fn cached_score(&self, session_id: SessionId) -> Result<Option<Score>, ScoreError> {
        self.scores
            .cached(session_id)
            .map_err(|source| ScoreError::from_storage(session_id, source))
    }

    /// Performance report for a session: the cached final score when there is
    /// one, otherwise a live score.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::SessionNotFound` for an unknown session id.
    pub fn summarize(&self, session_id: SessionId) -> Result<PerformanceReport, ScoreError> {
        let session = self.snapshot(session_id)?;
        let score = match self.cached_score(session_id)? {
            Some(score) => score,
            None => self.compute(&session),
        };
        Ok(PerformanceReport::build(&session, score))
    }

    /// Every cached final score.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::Cache` if the cache is unavailable.
    pub fn cached_scores(&self) -> Result<Vec<Score>, ScoreError> {
        self.scores.all().map_err(ScoreError::Cache)
    }

    /// Mean accuracy over cached final scores, optionally only those that
    /// scored at least one answer in `topic`. 0.0 when there are none.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::Cache` if the cache is unavailable.
    pub fn average_accuracy(&self, topic: Option<Topic>) -> Result<f64, ScoreError> {
        let scores: Vec<Score> = self
            .cached_scores()?
            .into_iter()
            .filter(|score| topic.is_none_or(|t| score.topic_breakdown().contains_key(&t)))
            .collect();
        if scores.is_empty() {
            return Ok(0.0);
        }
        let sum: f64 = scores.iter().map(Score::accuracy_percent).sum();
        #[allow(clippy::cast_precision_loss)]
        let count = scores.len() as f64;
        Ok(round2(sum / count))
    }

    /// Drop a cached score. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::Storage` if the cache is unavailable.
    pub fn forget_score(&self, session_id: SessionId) -> Result<bool, ScoreError> {
        self.scores
            .remove(session_id)
            .map_err(|source| ScoreError::from_storage(session_id, source))
    }

    /// # Errors
    ///
    /// Returns `ScoreError::Cache` if the cache is unavailable.
    pub fn clear_scores(&self) -> Result<(), ScoreError> {
        self.scores.clear().map_err(ScoreError::Cache)
    }

    fn snapshot(&self, session_id: SessionId) -> Result<Session, ScoreError> {
        self.sessions
            .snapshot(session_id)
            .map_err(|source| ScoreError::from_storage(session_id, source))
    }
}
