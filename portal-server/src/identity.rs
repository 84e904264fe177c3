//! Identity provider seams.
//!
//! The portal never talks to login redirects itself; it only needs "verify a
//! game-platform ticket" and "exchange a chat-platform OAuth code". Both are
//! traits so tests can substitute fakes; the HTTP implementations use bounded
//! timeouts and surface failures as dependency errors.

use std::time::Duration;

use async_trait::async_trait;
use portal_core::PortalError;
use serde::Deserialize;
use tracing::debug;

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_CHAT_TOKEN_URL: &str = "https://discord.com/api/v10/oauth2/token";
const DEFAULT_CHAT_USER_URL: &str = "https://discord.com/api/v10/users/@me";

/// Verified game-platform identity payload.
#[derive(Debug, Clone, Deserialize)]
pub struct GameProfile {
    pub game_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// Chat-platform identity returned by the OAuth code exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatProfile {
    pub chat_id: String,
    pub username: Option<String>,
    pub avatar: Option<String>,
    pub email: Option<String>,
}

#[async_trait]
pub trait GameIdentityProvider: Send + Sync {
    /// Verifies a login ticket and extracts the game identity.
    async fn verify(&self, ticket: &str) -> Result<GameProfile, PortalError>;
}

#[async_trait]
pub trait ChatIdentityProvider: Send + Sync {
    /// Exchanges an OAuth code for the chat identity.
    async fn exchange_code(&self, code: &str) -> Result<ChatProfile, PortalError>;
}

/// Game identity verification over HTTP.
pub struct HttpGameIdentityProvider {
    http: reqwest::Client,
    verify_url: String,
}

impl HttpGameIdentityProvider {
    pub fn new(verify_url: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(PROVIDER_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");
        Self { http, verify_url }
    }
}

#[async_trait]
impl GameIdentityProvider for HttpGameIdentityProvider {
    async fn verify(&self, ticket: &str) -> Result<GameProfile, PortalError> {
        debug!("Verifying game login ticket");

        let response = self
            .http
            .post(&self.verify_url)
            .json(&serde_json::json!({ "ticket": ticket }))
            .send()
            .await
            .map_err(|e| PortalError::Dependency(format!("game identity provider: {}", e)))?;

        if !response.status().is_success() {
            return Err(PortalError::Unauthorized(
                "Game login could not be verified.".to_string(),
            ));
        }

        response
            .json::<GameProfile>()
            .await
            .map_err(|e| PortalError::Dependency(format!("game identity provider: {}", e)))
    }
}

/// Chat identity OAuth code exchange (token endpoint, then profile fetch).
pub struct HttpChatIdentityProvider {
    http: reqwest::Client,
    token_url: String,
    user_url: String,
    client_id: String,
    client_secret: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ChatUserResponse {
    id: String,
    username: Option<String>,
    avatar: Option<String>,
    email: Option<String>,
}

impl HttpChatIdentityProvider {
    pub fn new(client_id: String, client_secret: String, token_url: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(PROVIDER_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");
        let token_url = token_url.unwrap_or_else(|| DEFAULT_CHAT_TOKEN_URL.to_string());
        // Profile endpoint lives next to the token endpoint.
        let user_url = token_url
            .strip_suffix("/oauth2/token")
            .map(|base| format!("{}/users/@me", base))
            .unwrap_or_else(|| DEFAULT_CHAT_USER_URL.to_string());
        Self {
            http,
            token_url,
            user_url,
            client_id,
            client_secret,
        }
    }
}

#[async_trait]
impl ChatIdentityProvider for HttpChatIdentityProvider {
    async fn exchange_code(&self, code: &str) -> Result<ChatProfile, PortalError> {
        debug!("Exchanging chat OAuth code");

        let token_response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PortalError::Dependency(format!("chat identity provider: {}", e)))?;

        if !token_response.status().is_success() {
            return Err(PortalError::Unauthorized(
                "Chat account could not be linked: the code was not accepted.".to_string(),
            ));
        }

        let token: TokenResponse = token_response
            .json()
            .await
            .map_err(|e| PortalError::Dependency(format!("chat identity provider: {}", e)))?;

        let user_response = self
            .http
            .get(&self.user_url)
            .header("Authorization", format!("Bearer {}", token.access_token))
            .send()
            .await
            .map_err(|e| PortalError::Dependency(format!("chat identity provider: {}", e)))?;

        if !user_response.status().is_success() {
            return Err(PortalError::Dependency(
                "chat identity provider rejected the profile request".to_string(),
            ));
        }

        let user: ChatUserResponse = user_response
            .json()
            .await
            .map_err(|e| PortalError::Dependency(format!("chat identity provider: {}", e)))?;

        Ok(ChatProfile {
            chat_id: user.id,
            username: user.username,
            avatar: user.avatar,
            email: user.email,
        })
    }
}
