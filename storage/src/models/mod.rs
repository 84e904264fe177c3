//! Persistence models: application record, history query, status summary, session.

mod application_record;
mod history_query;
mod session;
mod status_summary;

pub use application_record::{
    age_on, ApplicationRecord, ApplicationStatus, NewApplication, PublicApplication,
};
pub use history_query::{HistoryQuery, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use session::SessionRecord;
pub use status_summary::StatusSummary;
