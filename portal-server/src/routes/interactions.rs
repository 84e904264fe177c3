//! Inbound interaction webhook.
//!
//! Decodes the chat-platform payload into the tagged interaction union, runs
//! the review protocol, and encodes the reply. Signature verification is
//! delivery mechanics handled upstream and is not re-checked here.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use discord::{decode_interaction, encode_reply};
use portal_core::{InteractionReply, PortalError};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::app::AppState;

/// `POST /api/interactions`: ping/verification, control activations, and
/// dialog submissions.
pub async fn handle(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let interaction = match decode_interaction(&body) {
        Ok(interaction) => interaction,
        Err(e) => {
            info!(error = %e, "Malformed interaction payload");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Malformed interaction payload." })),
            )
                .into_response();
        }
    };

    match state.protocol.handle(&interaction).await {
        Ok(reply) => Json(encode_reply(&reply)).into_response(),
        Err(PortalError::Dependency(message)) => {
            error!(error = %message, "Interaction failed on a dependency");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": "Service temporarily unavailable." })),
            )
                .into_response()
        }
        Err(e) => {
            // The protocol acks expected outcomes in-band; anything else is
            // answered with a generic ephemeral message so the reviewer is
            // never left without feedback.
            error!(error = %e, "Interaction handling failed");
            Json(encode_reply(&InteractionReply::Ephemeral(
                "Something went wrong handling this action. Please try again.".to_string(),
            )))
            .into_response()
        }
    }
}
