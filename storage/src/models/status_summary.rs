//! Per-status counts for one identity's applications.
//!
//! Returned alongside a history page. Counts cover all of the identity's
//! records regardless of the page's status filter.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}
