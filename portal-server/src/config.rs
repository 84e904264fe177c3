//! Portal configuration, loaded from environment variables.
//!
//! External: reads DATABASE_URL, BIND_ADDR, DISCORD_* and the identity
//! provider settings. Load .env (dotenvy) before calling `load`.

use anyhow::Result;
use std::env;
use tracing::warn;

pub struct PortalConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub log_file: String,
    pub discord_bot_token: String,
    /// Optional Discord API base URL override (tests point this at a mock server).
    pub discord_api_url: Option<String>,
    /// Channel receiving interactive review notifications.
    pub review_channel_id: String,
    /// Webhook used for degraded, non-interactive delivery. Optional.
    pub fallback_webhook_url: Option<String>,
    /// Role allowed to review. Unset leaves the guard permissive (logged).
    pub reviewer_role_id: Option<String>,
    /// Endpoint verifying game-platform login tickets.
    pub game_verify_url: String,
    pub chat_oauth_client_id: String,
    pub chat_oauth_client_secret: String,
    /// OAuth token endpoint override; defaults to the public Discord endpoint.
    pub chat_oauth_token_url: Option<String>,
}

impl PortalConfig {
    /// Loads configuration from the environment. `bind` overrides BIND_ADDR.
    pub fn load(bind: Option<String>) -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./whitelist_portal.db".to_string());
        let bind_addr = bind
            .or_else(|| env::var("BIND_ADDR").ok())
            .unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let log_file =
            env::var("LOG_FILE").unwrap_or_else(|_| "logs/whitelist-portal.log".to_string());
        let discord_bot_token = env::var("DISCORD_BOT_TOKEN")
            .map_err(|_| anyhow::anyhow!("DISCORD_BOT_TOKEN not set"))?;
        let discord_api_url = env::var("DISCORD_API_URL").ok();
        let review_channel_id = env::var("DISCORD_REVIEW_CHANNEL_ID")
            .map_err(|_| anyhow::anyhow!("DISCORD_REVIEW_CHANNEL_ID not set"))?;
        let fallback_webhook_url = env::var("DISCORD_FALLBACK_WEBHOOK_URL").ok();
        let reviewer_role_id = env::var("REVIEWER_ROLE_ID").ok();
        let game_verify_url = env::var("GAME_VERIFY_URL")
            .unwrap_or_else(|_| "http://localhost:30120/verify".to_string());
        let chat_oauth_client_id = env::var("CHAT_OAUTH_CLIENT_ID").unwrap_or_default();
        let chat_oauth_client_secret = env::var("CHAT_OAUTH_CLIENT_SECRET").unwrap_or_default();
        let chat_oauth_token_url = env::var("CHAT_OAUTH_TOKEN_URL").ok();

        Ok(Self {
            database_url,
            bind_addr,
            log_file,
            discord_bot_token,
            discord_api_url,
            review_channel_id,
            fallback_webhook_url,
            reviewer_role_id,
            game_verify_url,
            chat_oauth_client_id,
            chat_oauth_client_secret,
            chat_oauth_token_url,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.discord_bot_token.is_empty() {
            anyhow::bail!("DISCORD_BOT_TOKEN is empty");
        }
        if self.review_channel_id.is_empty() {
            anyhow::bail!("DISCORD_REVIEW_CHANNEL_ID is empty");
        }
        if self.reviewer_role_id.is_none() {
            warn!("REVIEWER_ROLE_ID not set; any chat user may review applications");
        }
        Ok(())
    }
}
