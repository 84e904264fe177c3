//! Storage crate: application and session persistence.
//!
//! ## Modules
//!
//! - [`error`] – Storage error types
//! - [`models`] – ApplicationRecord, HistoryQuery, StatusSummary, SessionRecord
//! - [`application_repo`] – ApplicationRepository (SQLite)
//! - [`session_repo`] – SessionRepository (SQLite)
//! - [`sqlite_pool`] – SqlitePoolManager

mod application_repo;
mod error;
mod models;
mod session_repo;
mod sqlite_pool;

pub use application_repo::{ApplicationRepository, HistoryPage};
pub use error::StorageError;
pub use models::{
    age_on, ApplicationRecord, ApplicationStatus, HistoryQuery, NewApplication, PublicApplication,
    SessionRecord, StatusSummary, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use session_repo::SessionRepository;
pub use sqlite_pool::SqlitePoolManager;
