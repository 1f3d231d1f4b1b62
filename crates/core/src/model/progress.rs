use serde::{Deserialize, Serialize};

/// Derived view of how far a session has got.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionProgress {
    pub total: u32,
    pub asked: u32,
    pub answered: u32,
    pub remaining: u32,
    /// Share of `total` already asked, 0-100.
    pub percent: f64,
    pub is_complete: bool,
}
