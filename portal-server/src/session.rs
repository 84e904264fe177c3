//! Session store: bearer-token identity binding over the session repository.
//!
//! The game identity is the primary login; the chat identity can be attached
//! and detached later without invalidating the token.

use portal_core::PortalError;
use review::storage_error;
use serde::Serialize;
use storage::{SessionRecord, SessionRepository};
use tracing::info;

use crate::identity::{ChatProfile, GameProfile};

/// Identity view returned to the client; the token travels separately.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub game_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub chat_id: Option<String>,
    pub chat_username: Option<String>,
}

impl From<&SessionRecord> for SessionView {
    fn from(session: &SessionRecord) -> Self {
        Self {
            game_id: session.game_id.clone(),
            display_name: session.display_name.clone(),
            avatar_url: session.avatar_url.clone(),
            chat_id: session.chat_id.clone(),
            chat_username: session.chat_username.clone(),
        }
    }
}

#[derive(Clone)]
pub struct SessionStore {
    repo: SessionRepository,
}

impl SessionStore {
    pub fn new(repo: SessionRepository) -> Self {
        Self { repo }
    }

    /// Issues a bearer session for a verified game identity.
    pub async fn issue(&self, profile: GameProfile) -> Result<SessionRecord, PortalError> {
        let session = SessionRecord::new(
            profile.game_id,
            profile.display_name,
            profile.avatar_url,
        );
        self.repo.insert(&session).await.map_err(storage_error)?;
        Ok(session)
    }

    /// Resolves a bearer token; an unknown token is an authorization failure,
    /// not a 404.
    pub async fn validate(&self, token: &str) -> Result<SessionRecord, PortalError> {
        self.repo
            .find_by_token(token)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| PortalError::Unauthorized("Invalid or expired session.".to_string()))
    }

    /// Binds the chat identity to an existing session.
    pub async fn attach_chat(
        &self,
        token: &str,
        profile: &ChatProfile,
    ) -> Result<SessionRecord, PortalError> {
        let attached = self
            .repo
            .attach_chat(token, &profile.chat_id, profile.username.as_deref())
            .await
            .map_err(storage_error)?;
        if !attached {
            return Err(PortalError::Unauthorized(
                "Invalid or expired session.".to_string(),
            ));
        }
        info!(chat_id = %profile.chat_id, "Chat identity linked");
        self.validate(token).await
    }

    /// Unbinds the chat identity; the game login stays valid.
    pub async fn detach_chat(&self, token: &str) -> Result<SessionRecord, PortalError> {
        let detached = self.repo.detach_chat(token).await.map_err(storage_error)?;
        if !detached {
            return Err(PortalError::Unauthorized(
                "Invalid or expired session.".to_string(),
            ));
        }
        self.validate(token).await
    }
}
