//! Application state, component wiring, and the axum router.
//!
//! Components are built once at startup and injected through [`AppState`];
//! tests construct the state with fakes instead of the Discord-backed pieces.

use std::sync::Arc;

use anyhow::Result;
use axum::routing::{get, post};
use axum::Router;
use discord::{DiscordClient, DiscordNotifier};
use review::{Notifier, ReviewProtocol, SubmissionService};
use storage::{ApplicationRepository, SessionRepository, SqlitePoolManager};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::PortalConfig;
use crate::identity::{
    ChatIdentityProvider, GameIdentityProvider, HttpChatIdentityProvider,
    HttpGameIdentityProvider,
};
use crate::routes::{applications, auth, interactions};
use crate::session::SessionStore;

const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    pub submissions: Arc<SubmissionService>,
    pub protocol: Arc<ReviewProtocol>,
    pub applications: ApplicationRepository,
    pub sessions: SessionStore,
    pub game_identity: Arc<dyn GameIdentityProvider>,
    pub chat_identity: Arc<dyn ChatIdentityProvider>,
}

/// Builds production components from config: one pool, the repositories, the
/// Discord notifier, and the HTTP identity providers.
pub async fn build_state(config: &PortalConfig) -> Result<AppState> {
    let pool_manager = SqlitePoolManager::new(&config.database_url).await?;
    let applications = ApplicationRepository::new(pool_manager.clone()).await?;
    let session_repo = SessionRepository::new(pool_manager).await?;

    let client = match &config.discord_api_url {
        Some(url) => DiscordClient::with_base_url(config.discord_bot_token.clone(), url.clone()),
        None => DiscordClient::new(config.discord_bot_token.clone()),
    };
    let notifier: Arc<dyn Notifier> = Arc::new(DiscordNotifier::new(
        client,
        config.review_channel_id.clone(),
        config.fallback_webhook_url.clone(),
    ));

    let submissions = Arc::new(SubmissionService::new(
        applications.clone(),
        notifier.clone(),
    ));
    let protocol = Arc::new(ReviewProtocol::new(
        applications.clone(),
        notifier,
        config.reviewer_role_id.clone(),
    ));
    let sessions = SessionStore::new(session_repo);

    let game_identity: Arc<dyn GameIdentityProvider> =
        Arc::new(HttpGameIdentityProvider::new(config.game_verify_url.clone()));
    let chat_identity: Arc<dyn ChatIdentityProvider> = Arc::new(HttpChatIdentityProvider::new(
        config.chat_oauth_client_id.clone(),
        config.chat_oauth_client_secret.clone(),
        config.chat_oauth_token_url.clone(),
    ));

    Ok(AppState {
        submissions,
        protocol,
        applications,
        sessions,
        game_identity,
        chat_identity,
    })
}

/// Builds the HTTP router over the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(applications::health))
        .route("/api/applications", post(applications::submit))
        .route(
            "/api/applications/status/:game_id",
            get(applications::status),
        )
        .route(
            "/api/applications/history/:identifier",
            get(applications::history),
        )
        .route("/api/interactions", post(interactions::handle))
        .route("/api/auth/game/callback", post(auth::game_callback))
        .route(
            "/api/auth/chat/link",
            post(auth::link_chat).delete(auth::unlink_chat),
        )
        .route("/api/auth/me", get(auth::me))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Main entry: validate config, init logging, wire components, serve.
pub async fn run_server(config: PortalConfig) -> Result<()> {
    config.validate()?;
    std::fs::create_dir_all("logs")?;
    portal_core::init_tracing(&config.log_file)?;

    info!(
        database_url = %config.database_url,
        bind_addr = %config.bind_addr,
        "Initializing portal"
    );

    let state = build_state(&config).await?;
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "Portal started");
    axum::serve(listener, router).await?;

    Ok(())
}
