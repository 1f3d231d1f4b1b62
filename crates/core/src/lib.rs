#![forbid(unsafe_code)]

pub mod catalog;
pub mod model;
pub mod time;

pub use catalog::{Catalog, CatalogError, CatalogStats, QuestionFilter, QuestionLookup};
pub use time::Clock;
