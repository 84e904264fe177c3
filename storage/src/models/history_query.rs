//! Query parameters for listing an identity's applications.
//!
//! Used by ApplicationRepository::history. The identifier is matched against
//! either identity column (chat or game).

use serde::{Deserialize, Serialize};

use super::application_record::ApplicationStatus;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryQuery {
    /// Matched against chat_id OR game_id.
    pub identifier: String,
    /// Optional status filter; `None` lists every status.
    pub status: Option<ApplicationStatus>,
    /// 1-based page number.
    pub page: i64,
    pub limit: i64,
}

impl HistoryQuery {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            status: None,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }

    /// Clamps page to ≥1 and limit to 1..=MAX_PAGE_SIZE.
    pub fn normalized(mut self) -> Self {
        self.page = self.page.max(1);
        self.limit = self.limit.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}
