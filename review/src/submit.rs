//! Submission service: validate → gate → persist → best-effort notify.
//!
//! The record is the source of truth; notification delivery happens after the
//! insert and its failure never fails the submission.

use std::sync::Arc;

use portal_core::PortalError;
use storage::{ApplicationRecord, ApplicationRepository, NewApplication, StorageError};
use tracing::{info, warn};

use crate::gate::SubmissionGate;
use crate::notify::{Delivery, Notifier};
use crate::storage_error;
use crate::validation::{validate, SubmissionInput};

pub struct SubmissionService {
    repo: ApplicationRepository,
    gate: SubmissionGate,
    notifier: Arc<dyn Notifier>,
}

impl SubmissionService {
    pub fn new(repo: ApplicationRepository, notifier: Arc<dyn Notifier>) -> Self {
        let gate = SubmissionGate::new(repo.clone());
        Self {
            repo,
            gate,
            notifier,
        }
    }

    /// Creates a pending application from raw form input.
    ///
    /// Returns the created record; its notification linkage is filled in when
    /// the interactive post succeeded. Validation and conflict failures happen
    /// before any mutation.
    pub async fn submit(&self, input: SubmissionInput) -> Result<ApplicationRecord, PortalError> {
        let validated = validate(&input).map_err(PortalError::Validation)?;

        self.gate.check(&validated.chat_id).await?;

        let mut record = ApplicationRecord::new(NewApplication {
            chat_id: validated.chat_id.clone(),
            game_id: validated.game_id,
            character_name: validated.character_name,
            birth_date: validated.birth_date,
            backstory: validated.backstory,
            reason: validated.reason,
            ip_address: validated.ip_address,
            user_agent: validated.user_agent,
        });

        match self.repo.insert(&record).await {
            Ok(()) => {}
            Err(StorageError::AlreadyExists(_)) => {
                // Lost the check-then-create race; the gate phrases the
                // conflict from the now-visible winner.
                self.gate.check(&validated.chat_id).await?;
                return Err(PortalError::Conflict(
                    "You already have an active application.".to_string(),
                ));
            }
            Err(e) => return Err(storage_error(e)),
        }

        info!(
            application_id = %record.id,
            chat_id = %record.chat_id,
            "Application submitted"
        );

        // Side-channel only from here on: the submission already succeeded.
        match self.notifier.post(&record).await {
            Ok(Delivery::Interactive(notification)) => {
                record.notification_channel_id = Some(notification.channel_id.clone());
                record.notification_message_id = Some(notification.message_id.clone());
                if let Err(e) = self
                    .repo
                    .set_notification_ref(
                        &record.id,
                        &notification.channel_id,
                        &notification.message_id,
                    )
                    .await
                {
                    warn!(
                        application_id = %record.id,
                        error = %e,
                        "Failed to store notification reference"
                    );
                }
            }
            Ok(Delivery::Degraded) => {
                info!(
                    application_id = %record.id,
                    "Notification delivered without interactive controls"
                );
            }
            Err(e) => {
                warn!(
                    application_id = %record.id,
                    error = %e,
                    "Notification delivery failed; submission stands"
                );
            }
        }

        Ok(record)
    }
}
