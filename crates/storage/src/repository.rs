use quiz_core::model::{Score, Session, SessionId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

/// Errors surfaced by the session and score stores.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("session {0} not found")]
    NotFound(SessionId),

    #[error("session {0} is already registered")]
    Conflict(SessionId),

    #[error("store lock poisoned: {0}")]
    Poisoned(String),
}

fn poisoned<E: std::fmt::Display>(err: E) -> StorageError {
    StorageError::Poisoned(err.to_string())
}

//
// ─── SESSION HANDLE ────────────────────────────────────────────────────────────
//

/// Shared, individually locked session.
///
/// Every mutation of one session goes through `write`, so read-then-ask and
/// check-then-answer sequences are atomic per session. Readers share `read`
/// and always observe a whole transition.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<RwLock<Session>>,
}

impl SessionHandle {
    fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(RwLock::new(session)),
        }
    }

    /// # Errors
    ///
    /// Returns `StorageError::Poisoned` if a writer panicked while holding the lock.
    pub fn read(&self) -> Result<RwLockReadGuard<'_, Session>, StorageError> {
        self.inner.read().map_err(poisoned)
    }

    /// # Errors
    ///
    /// Returns `StorageError::Poisoned` if a writer panicked while holding the lock.
    pub fn write(&self) -> Result<RwLockWriteGuard<'_, Session>, StorageError> {
        self.inner.write().map_err(poisoned)
    }

    /// Consistent copy of the session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Poisoned` if the lock is poisoned.
    pub fn snapshot(&self) -> Result<Session, StorageError> {
        Ok(self.read()?.clone())
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_read() {
            Ok(session) => f.debug_tuple("SessionHandle").field(&session.id()).finish(),
            Err(_) => f.write_str("SessionHandle(<locked>)"),
        }
    }
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// Read-only access to registered sessions.
pub trait SessionReader: Send + Sync {
    /// Copy of the session as of now.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the id is unknown.
    fn snapshot(&self, id: SessionId) -> Result<Session, StorageError>;

    /// Copies of every registered session, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Poisoned` if a lock is poisoned.
    fn list(&self) -> Result<Vec<Session>, StorageError>;
}

/// Registry of live and finished sessions.
pub trait SessionRepository: SessionReader {
    /// Register a new session and return its handle.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the id is already registered.
    fn insert(&self, session: Session) -> Result<SessionHandle, StorageError>;

    /// Fetch the lockable handle of a session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the id is unknown.
    fn handle(&self, id: SessionId) -> Result<SessionHandle, StorageError>;
}

/// Cache of final scores keyed by session id.
pub trait ScoreRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::Poisoned` if the lock is poisoned.
    fn cached(&self, id: SessionId) -> Result<Option<Score>, StorageError>;

    /// Store `score` unless one is already cached; returns whichever is stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Poisoned` if the lock is poisoned.
    fn cache_if_absent(&self, score: Score) -> Result<Score, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::Poisoned` if the lock is poisoned.
    fn all(&self) -> Result<Vec<Score>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::Poisoned` if the lock is poisoned.
    fn remove(&self, id: SessionId) -> Result<bool, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::Poisoned` if the lock is poisoned.
    fn clear(&self) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY STORE ───────────────────────────────────────────────────────────
//

/// Process-local session registry and score cache.
///
/// Owned by whatever hosts the quiz core; create one per process (or per
/// test) and drop it at shutdown. Nothing is persisted.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    sessions: Arc<RwLock<HashMap<SessionId, SessionHandle>>>,
    scores: Arc<RwLock<HashMap<SessionId, Score>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionReader for InMemoryStore {
    fn snapshot(&self, id: SessionId) -> Result<Session, StorageError> {
        self.handle(id)?.snapshot()
    }

    fn list(&self) -> Result<Vec<Session>, StorageError> {
        let handles: Vec<SessionHandle> = {
            let guard = self.sessions.read().map_err(poisoned)?;
            guard.values().cloned().collect()
        };
        let mut sessions = handles
            .iter()
            .map(SessionHandle::snapshot)
            .collect::<Result<Vec<_>, _>>()?;
        sessions.sort_by_key(|s| (s.started_at(), s.id()));
        Ok(sessions)
    }
}

impl SessionRepository for InMemoryStore {
    fn insert(&self, session: Session) -> Result<SessionHandle, StorageError> {
        let mut guard = self.sessions.write().map_err(poisoned)?;
        let id = session.id();
        if guard.contains_key(&id) {
            return Err(StorageError::Conflict(id));
        }
        let handle = SessionHandle::new(session);
        guard.insert(id, handle.clone());
        Ok(handle)
    }

    fn handle(&self, id: SessionId) -> Result<SessionHandle, StorageError> {
        let guard = self.sessions.read().map_err(poisoned)?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound(id))
    }
}

impl ScoreRepository for InMemoryStore {
    fn cached(&self, id: SessionId) -> Result<Option<Score>, StorageError> {
        let guard = self.scores.read().map_err(poisoned)?;
        Ok(guard.get(&id).cloned())
    }

    fn cache_if_absent(&self, score: Score) -> Result<Score, StorageError> {
        let mut guard = self.scores.write().map_err(poisoned)?;
        Ok(guard.entry(score.session_id()).or_insert(score).clone())
    }

    fn all(&self) -> Result<Vec<Score>, StorageError> {
        let guard = self.scores.read().map_err(poisoned)?;
        Ok(guard.values().cloned().collect())
    }

    fn remove(&self, id: SessionId) -> Result<bool, StorageError> {
        let mut guard = self.scores.write().map_err(poisoned)?;
        Ok(guard.remove(&id).is_some())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut guard = self.scores.write().map_err(poisoned)?;
        guard.clear();
        Ok(())
    }
}

/// Store contracts behind trait objects, all backed by one store.
#[derive(Clone)]
pub struct Storage {
    pub sessions: Arc<dyn SessionRepository>,
    pub session_reader: Arc<dyn SessionReader>,
    pub scores: Arc<dyn ScoreRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let store = InMemoryStore::new();
        let sessions: Arc<dyn SessionRepository> = Arc::new(store.clone());
        let session_reader: Arc<dyn SessionReader> = Arc::new(store.clone());
        let scores: Arc<dyn ScoreRepository> = Arc::new(store);
        Self {
            sessions,
            session_reader,
            scores,
        }
    }
}
