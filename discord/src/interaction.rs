//! Wire codec for the interaction webhook.
//!
//! Inbound payloads are loosely typed JSON; this module decodes them into
//! [`portal_core::Interaction`] at the boundary and encodes
//! [`portal_core::InteractionReply`] back into response JSON, so nothing
//! downstream reads raw fields.

use portal_core::{Actor, CommandOption, Interaction, InteractionReply};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

// Interaction types (receive).
const TYPE_PING: u8 = 1;
const TYPE_APPLICATION_COMMAND: u8 = 2;
const TYPE_MESSAGE_COMPONENT: u8 = 3;
const TYPE_MODAL_SUBMIT: u8 = 5;

// Callback types (respond).
const CALLBACK_PONG: u8 = 1;
const CALLBACK_CHANNEL_MESSAGE: u8 = 4;
const CALLBACK_MODAL: u8 = 9;

const FLAG_EPHEMERAL: u64 = 64;

#[derive(Debug, Deserialize)]
struct WirePayload {
    #[serde(rename = "type")]
    kind: u8,
    data: Option<WireData>,
    member: Option<WireMember>,
    user: Option<WireUser>,
}

#[derive(Debug, Deserialize)]
struct WireData {
    custom_id: Option<String>,
    name: Option<String>,
    #[serde(default)]
    options: Vec<WireOption>,
    #[serde(default)]
    components: Vec<WireComponentRow>,
}

#[derive(Debug, Deserialize)]
struct WireOption {
    name: String,
    value: Value,
}

#[derive(Debug, Deserialize)]
struct WireComponentRow {
    #[serde(default)]
    components: Vec<WireInput>,
}

#[derive(Debug, Deserialize)]
struct WireInput {
    custom_id: Option<String>,
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireMember {
    user: Option<WireUser>,
    #[serde(default)]
    roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    id: String,
    username: Option<String>,
}

fn actor_and_roles(payload: &WirePayload) -> Option<(Actor, Vec<String>)> {
    let (user, roles) = match (&payload.member, &payload.user) {
        (Some(member), _) => (member.user.as_ref(), member.roles.clone()),
        (None, Some(user)) => (Some(user), Vec::new()),
        (None, None) => (None, Vec::new()),
    };
    user.map(|u| {
        (
            Actor {
                id: u.id.clone(),
                username: u.username.clone(),
            },
            roles,
        )
    })
}

fn option_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// First free-text value in a submitted dialog.
fn dialog_text(data: &WireData) -> String {
    data.components
        .iter()
        .flat_map(|row| row.components.iter())
        .find_map(|input| input.value.clone())
        .unwrap_or_default()
}

/// Decodes a webhook body into an [`Interaction`]. Structurally malformed
/// JSON is a decode error (the route answers 400); recognizable payloads the
/// portal does not act on become [`Interaction::Unsupported`].
pub fn decode_interaction(body: &Value) -> Result<Interaction, serde_json::Error> {
    let payload: WirePayload = serde_json::from_value(body.clone())?;

    let interaction = match payload.kind {
        TYPE_PING => Interaction::Ping,

        TYPE_MESSAGE_COMPONENT => {
            let custom_id = payload.data.as_ref().and_then(|d| d.custom_id.clone());
            match (custom_id, actor_and_roles(&payload)) {
                (Some(custom_id), Some((actor, roles))) => Interaction::Component {
                    custom_id,
                    actor,
                    roles,
                },
                _ => {
                    warn!("Component interaction missing custom_id or actor");
                    Interaction::Unsupported
                }
            }
        }

        TYPE_MODAL_SUBMIT => {
            let data = payload.data.as_ref();
            let custom_id = data.and_then(|d| d.custom_id.clone());
            match (custom_id, actor_and_roles(&payload)) {
                (Some(custom_id), Some((actor, roles))) => Interaction::DialogSubmit {
                    custom_id,
                    actor,
                    roles,
                    text: data.map(dialog_text).unwrap_or_default(),
                },
                _ => {
                    warn!("Modal interaction missing custom_id or actor");
                    Interaction::Unsupported
                }
            }
        }

        TYPE_APPLICATION_COMMAND => {
            let data = payload.data.as_ref();
            let name = data.and_then(|d| d.name.clone());
            match (name, actor_and_roles(&payload)) {
                (Some(name), Some((actor, roles))) => Interaction::Command {
                    name,
                    options: data
                        .map(|d| {
                            d.options
                                .iter()
                                .map(|o| CommandOption {
                                    name: o.name.clone(),
                                    value: option_value(&o.value),
                                })
                                .collect()
                        })
                        .unwrap_or_default(),
                    actor,
                    roles,
                },
                _ => {
                    warn!("Command interaction missing name or actor");
                    Interaction::Unsupported
                }
            }
        }

        other => {
            warn!(interaction_type = other, "Unhandled interaction type");
            Interaction::Unsupported
        }
    };

    Ok(interaction)
}

/// Encodes a reply into interaction-response JSON.
pub fn encode_reply(reply: &InteractionReply) -> Value {
    match reply {
        InteractionReply::Pong => json!({ "type": CALLBACK_PONG }),

        InteractionReply::Ephemeral(content) => json!({
            "type": CALLBACK_CHANNEL_MESSAGE,
            "data": {
                "content": content,
                "flags": FLAG_EPHEMERAL,
            }
        }),

        InteractionReply::Dialog {
            custom_id,
            title,
            input_custom_id,
            input_label,
        } => json!({
            "type": CALLBACK_MODAL,
            "data": {
                "custom_id": custom_id,
                "title": title,
                "components": [{
                    "type": 1,
                    "components": [{
                        "type": 4,
                        "custom_id": input_custom_id,
                        "label": input_label,
                        "style": 2,
                        "required": false,
                    }]
                }]
            }
        }),
    }
}
