//! Review protocol: interprets decoded interaction events, authorizes the
//! actor, transitions the record, and re-renders the chat-side notification.
//!
//! Approval mutates immediately; rejection goes through a reason dialog first.
//! The dialog is interaction-scoped: its custom id carries the application id,
//! so nothing is held server-side between button press and dialog submit.
//! Record transitions go through the conditional update in storage, so a
//! concurrent reviewer's duplicate action degrades to an "already …" ack.

use std::sync::Arc;

use portal_core::{Actor, Interaction, InteractionReply, PortalError};
use storage::{ApplicationRecord, ApplicationRepository, ApplicationStatus};
use tracing::{info, warn};

use crate::notify::Notifier;
use crate::storage_error;

/// Control/custom-id scheme shared between rendering and the protocol.
pub mod control {
    pub const APPROVE_PREFIX: &str = "wl_approve:";
    pub const REJECT_PREFIX: &str = "wl_reject:";
    pub const REJECT_DIALOG_PREFIX: &str = "wl_reject_reason:";
    pub const REASON_INPUT_ID: &str = "reason";

    pub fn approve_id(application_id: &str) -> String {
        format!("{}{}", APPROVE_PREFIX, application_id)
    }

    pub fn reject_id(application_id: &str) -> String {
        format!("{}{}", REJECT_PREFIX, application_id)
    }

    pub fn reject_dialog_id(application_id: &str) -> String {
        format!("{}{}", REJECT_DIALOG_PREFIX, application_id)
    }
}

/// A control/dialog custom id resolved to its review meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Control {
    Approve(String),
    Reject(String),
    RejectReason(String),
}

fn parse_control(custom_id: &str) -> Option<Control> {
    if let Some(id) = custom_id.strip_prefix(control::APPROVE_PREFIX) {
        return Some(Control::Approve(id.to_string()));
    }
    if let Some(id) = custom_id.strip_prefix(control::REJECT_PREFIX) {
        return Some(Control::Reject(id.to_string()));
    }
    if let Some(id) = custom_id.strip_prefix(control::REJECT_DIALOG_PREFIX) {
        return Some(Control::RejectReason(id.to_string()));
    }
    None
}

pub struct ReviewProtocol {
    repo: ApplicationRepository,
    notifier: Arc<dyn Notifier>,
    /// Role whose holders may review. `None` leaves the guard permissive and
    /// logs a warning per activation.
    reviewer_role_id: Option<String>,
}

impl ReviewProtocol {
    pub fn new(
        repo: ApplicationRepository,
        notifier: Arc<dyn Notifier>,
        reviewer_role_id: Option<String>,
    ) -> Self {
        Self {
            repo,
            notifier,
            reviewer_role_id,
        }
    }

    /// Handles one decoded interaction. Review outcomes, denials, and stale
    /// references all come back as in-band replies; only infrastructure
    /// failures surface as errors.
    pub async fn handle(&self, interaction: &Interaction) -> Result<InteractionReply, PortalError> {
        match interaction {
            Interaction::Ping => Ok(InteractionReply::Pong),

            Interaction::Component {
                custom_id,
                actor,
                roles,
            } => {
                if !self.authorized(roles) {
                    return Ok(Self::denied(actor));
                }
                match parse_control(custom_id) {
                    Some(Control::Approve(id)) => self.approve(&id, actor).await,
                    Some(Control::Reject(id)) => self.open_reject_dialog(&id).await,
                    _ => Ok(InteractionReply::Ephemeral(
                        "This control is not recognized.".to_string(),
                    )),
                }
            }

            Interaction::DialogSubmit {
                custom_id,
                actor,
                roles,
                text,
            } => {
                // Role membership may have changed since the dialog opened.
                if !self.authorized(roles) {
                    return Ok(Self::denied(actor));
                }
                match parse_control(custom_id) {
                    Some(Control::RejectReason(id)) => self.reject(&id, actor, text).await,
                    _ => Ok(InteractionReply::Ephemeral(
                        "This dialog is not recognized.".to_string(),
                    )),
                }
            }

            Interaction::Command {
                name,
                options,
                actor,
                roles,
            } => {
                if !self.authorized(roles) {
                    return Ok(Self::denied(actor));
                }
                self.handle_command(name, options, actor).await
            }

            Interaction::Unsupported => Ok(InteractionReply::Ephemeral(
                "This interaction is not supported.".to_string(),
            )),
        }
    }

    /// Manual `/review` command: the degraded path referenced by the fallback
    /// notification when interactive controls could not be delivered.
    async fn handle_command(
        &self,
        name: &str,
        options: &[portal_core::CommandOption],
        actor: &Actor,
    ) -> Result<InteractionReply, PortalError> {
        if name != "review" {
            return Ok(InteractionReply::Ephemeral(format!(
                "Unknown command: {}",
                name
            )));
        }

        let option = |key: &str| {
            options
                .iter()
                .find(|o| o.name == key)
                .map(|o| o.value.clone())
        };

        let action = option("action").unwrap_or_default();
        let id = match option("id") {
            Some(id) => id,
            None => {
                return Ok(InteractionReply::Ephemeral(
                    "Missing application id.".to_string(),
                ))
            }
        };

        match action.as_str() {
            "approve" => self.approve(&id, actor).await,
            "reject" => {
                let reason = option("reason").unwrap_or_default();
                self.reject(&id, actor, &reason).await
            }
            other => Ok(InteractionReply::Ephemeral(format!(
                "Unknown review action: {}",
                other
            ))),
        }
    }

    async fn approve(&self, id: &str, actor: &Actor) -> Result<InteractionReply, PortalError> {
        let record = match self.load(id).await? {
            Ok(record) => record,
            Err(reply) => return Ok(reply),
        };

        if !record.is_pending() {
            return Ok(Self::already(&record));
        }

        let applied = self
            .repo
            .transition(
                id,
                ApplicationStatus::Approved,
                &actor.id,
                &actor.display_name(),
                "",
            )
            .await
            .map_err(storage_error)?;

        if !applied {
            // A concurrent reviewer resolved it between our read and write.
            return self.ack_current_state(id).await;
        }

        info!(
            application_id = %id,
            reviewer_id = %actor.id,
            "Application approved"
        );

        self.refresh_notification(id).await?;

        Ok(InteractionReply::Ephemeral(format!(
            "Application for {} approved.",
            record.character_name
        )))
    }

    /// Opens the rejection-reason dialog. Read-only: the record is untouched
    /// until the dialog comes back.
    async fn open_reject_dialog(&self, id: &str) -> Result<InteractionReply, PortalError> {
        let record = match self.load(id).await? {
            Ok(record) => record,
            Err(reply) => return Ok(reply),
        };

        if !record.is_pending() {
            return Ok(Self::already(&record));
        }

        Ok(InteractionReply::Dialog {
            custom_id: control::reject_dialog_id(id),
            title: format!("Reject application: {}", record.character_name),
            input_custom_id: control::REASON_INPUT_ID.to_string(),
            input_label: "Reason (optional)".to_string(),
        })
    }

    async fn reject(
        &self,
        id: &str,
        actor: &Actor,
        reason: &str,
    ) -> Result<InteractionReply, PortalError> {
        let record = match self.load(id).await? {
            Ok(record) => record,
            Err(reply) => return Ok(reply),
        };

        if !record.is_pending() {
            return Ok(Self::already(&record));
        }

        let applied = self
            .repo
            .transition(
                id,
                ApplicationStatus::Rejected,
                &actor.id,
                &actor.display_name(),
                reason,
            )
            .await
            .map_err(storage_error)?;

        if !applied {
            return self.ack_current_state(id).await;
        }

        info!(
            application_id = %id,
            reviewer_id = %actor.id,
            "Application rejected"
        );

        self.refresh_notification(id).await?;

        Ok(InteractionReply::Ephemeral(format!(
            "Application for {} rejected.",
            record.character_name
        )))
    }

    /// Loads the record or produces the stale-reference ack.
    async fn load(
        &self,
        id: &str,
    ) -> Result<Result<ApplicationRecord, InteractionReply>, PortalError> {
        match self.repo.find_by_id(id).await.map_err(storage_error)? {
            Some(record) => Ok(Ok(record)),
            None => Ok(Err(InteractionReply::Ephemeral(
                "Application not found. The message may refer to a removed record.".to_string(),
            ))),
        }
    }

    /// Re-renders the notification from the freshly persisted state. The
    /// mutation stands regardless; a re-render failure is only logged.
    async fn refresh_notification(&self, id: &str) -> Result<(), PortalError> {
        match self.repo.find_by_id(id).await.map_err(storage_error)? {
            Some(updated) => {
                if let Err(e) = self.notifier.update(&updated).await {
                    warn!(
                        application_id = %id,
                        error = %e,
                        "Failed to re-render notification after transition"
                    );
                }
            }
            None => {
                warn!(application_id = %id, "Record vanished after transition");
            }
        }
        Ok(())
    }

    async fn ack_current_state(&self, id: &str) -> Result<InteractionReply, PortalError> {
        match self.repo.find_by_id(id).await.map_err(storage_error)? {
            Some(record) => Ok(Self::already(&record)),
            None => Ok(InteractionReply::Ephemeral(
                "Application not found. The message may refer to a removed record.".to_string(),
            )),
        }
    }

    fn already(record: &ApplicationRecord) -> InteractionReply {
        InteractionReply::Ephemeral(format!("This application is already {}.", record.status))
    }

    fn denied(actor: &Actor) -> InteractionReply {
        warn!(actor_id = %actor.id, "Review action denied: missing reviewer role");
        InteractionReply::Ephemeral(
            "You do not have permission to review applications.".to_string(),
        )
    }

    fn authorized(&self, roles: &[String]) -> bool {
        match &self.reviewer_role_id {
            Some(role_id) => roles.iter().any(|r| r == role_id),
            None => {
                warn!(
                    "Reviewer role not configured; allowing review action (degraded security posture)"
                );
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_control_roundtrip() {
        assert_eq!(
            parse_control(&control::approve_id("abc")),
            Some(Control::Approve("abc".to_string()))
        );
        assert_eq!(
            parse_control(&control::reject_id("abc")),
            Some(Control::Reject("abc".to_string()))
        );
        assert_eq!(
            parse_control(&control::reject_dialog_id("abc")),
            Some(Control::RejectReason("abc".to_string()))
        );
    }

    #[test]
    fn test_parse_control_rejects_unknown_ids() {
        assert_eq!(parse_control("something_else"), None);
        assert_eq!(parse_control(""), None);
    }
}
