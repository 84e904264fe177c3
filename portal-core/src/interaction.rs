//! Decoded chat-platform interaction events and the replies sent back.
//!
//! The webhook payload is loosely typed on the wire; the adapter decodes it
//! into [`Interaction`] at the boundary so protocol logic never inspects raw
//! JSON fields.

use serde::{Deserialize, Serialize};

/// Chat-platform user acting on an interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub username: Option<String>,
}

impl Actor {
    /// Name shown in review metadata and acks; falls back to the raw id.
    pub fn display_name(&self) -> String {
        self.username.clone().unwrap_or_else(|| self.id.clone())
    }
}

/// One inbound interaction event, decoded from the webhook payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    /// Endpoint verification handshake.
    Ping,
    /// A button on a posted notification was pressed.
    Component {
        custom_id: String,
        actor: Actor,
        roles: Vec<String>,
    },
    /// The rejection-reason dialog was submitted. `text` may be empty.
    DialogSubmit {
        custom_id: String,
        actor: Actor,
        roles: Vec<String>,
        text: String,
    },
    /// Manual review command (the degraded path when buttons are unavailable).
    Command {
        name: String,
        options: Vec<CommandOption>,
        actor: Actor,
        roles: Vec<String>,
    },
    /// Any interaction type this portal does not handle.
    Unsupported,
}

/// Name/value pair from a command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOption {
    pub name: String,
    pub value: String,
}

/// Outbound reply to an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionReply {
    /// Answer to [`Interaction::Ping`].
    Pong,
    /// Message visible only to the acting user.
    Ephemeral(String),
    /// Opens the free-text dialog collecting a rejection reason. The dialog is
    /// interaction-scoped: `custom_id` carries the application id, nothing is
    /// held server-side between button press and dialog submit.
    Dialog {
        custom_id: String,
        title: String,
        input_custom_id: String,
        input_label: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_display_name_prefers_username() {
        let actor = Actor {
            id: "42".to_string(),
            username: Some("mod_anna".to_string()),
        };
        assert_eq!(actor.display_name(), "mod_anna");
    }

    #[test]
    fn test_actor_display_name_falls_back_to_id() {
        let actor = Actor {
            id: "42".to_string(),
            username: None,
        };
        assert_eq!(actor.display_name(), "42");
    }
}
