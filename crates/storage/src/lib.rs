#![forbid(unsafe_code)]

pub mod repository;

pub use repository::{
    InMemoryStore, ScoreRepository, SessionHandle, SessionReader, SessionRepository, Storage,
    StorageError,
};
