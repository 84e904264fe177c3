//! Session record model for identity binding.
//!
//! One row per issued bearer token. The game identity is primary; the chat
//! identity can be attached and detached without touching the token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SessionRecord {
    /// Opaque bearer token, also the primary key.
    pub token: String,
    pub game_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub chat_id: Option<String>,
    pub chat_username: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Creates a session for a verified game identity; chat identity unbound.
    pub fn new(game_id: String, display_name: String, avatar_url: Option<String>) -> Self {
        Self {
            token: Uuid::new_v4().to_string(),
            game_id,
            display_name,
            avatar_url,
            chat_id: None,
            chat_username: None,
            created_at: Utc::now(),
        }
    }
}
