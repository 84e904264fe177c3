//! Session endpoints: game login callback, chat identity link/unlink, and the
//! current identity view.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use portal_core::PortalError;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::routes::ApiError;
use crate::session::SessionView;

/// Extracts the bearer token from the Authorization header.
fn bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.to_string())
        .ok_or_else(|| {
            PortalError::Unauthorized("Missing bearer token.".to_string()).into()
        })
}

#[derive(Debug, Deserialize)]
pub struct GameCallbackRequest {
    /// Opaque login ticket produced by the game-platform redirect.
    pub ticket: String,
}

#[derive(Debug, Serialize)]
pub struct GameCallbackResponse {
    pub token: String,
    pub profile: SessionView,
}

/// `POST /api/auth/game/callback`: verifies the login payload and issues a
/// bearer session.
pub async fn game_callback(
    State(state): State<AppState>,
    Json(request): Json<GameCallbackRequest>,
) -> Result<Json<GameCallbackResponse>, ApiError> {
    let profile = state.game_identity.verify(&request.ticket).await?;
    let session = state.sessions.issue(profile).await?;

    Ok(Json(GameCallbackResponse {
        token: session.token.clone(),
        profile: SessionView::from(&session),
    }))
}

#[derive(Debug, Deserialize)]
pub struct LinkChatRequest {
    pub code: String,
}

/// `POST /api/auth/chat/link`: exchanges the OAuth code and binds the chat
/// identity to the session.
pub async fn link_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<LinkChatRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let token = bearer_token(&headers)?;
    state.sessions.validate(&token).await?;

    let profile = state.chat_identity.exchange_code(&request.code).await?;
    let session = state.sessions.attach_chat(&token, &profile).await?;

    Ok(Json(SessionView::from(&session)))
}

/// `DELETE /api/auth/chat/link`: unbinds the chat identity; the game login
/// stays valid.
pub async fn unlink_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionView>, ApiError> {
    let token = bearer_token(&headers)?;
    let session = state.sessions.detach_chat(&token).await?;
    Ok(Json(SessionView::from(&session)))
}

/// `GET /api/auth/me`: bound identities for the current session.
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionView>, ApiError> {
    let token = bearer_token(&headers)?;
    let session = state.sessions.validate(&token).await?;
    Ok(Json(SessionView::from(&session)))
}
