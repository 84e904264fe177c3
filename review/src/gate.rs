//! Submission gate: one active application per chat identity.
//!
//! Check-then-create is not atomic against a concurrent submission; the
//! partial unique index in storage is the authoritative backstop. The gate
//! exists to give the applicant a precise conflict message up front.

use portal_core::PortalError;
use storage::{ApplicationRepository, ApplicationStatus};
use tracing::info;

use crate::storage_error;

#[derive(Clone)]
pub struct SubmissionGate {
    repo: ApplicationRepository,
}

impl SubmissionGate {
    pub fn new(repo: ApplicationRepository) -> Self {
        Self { repo }
    }

    /// Permits the submission or returns a conflict naming the blocking state.
    pub async fn check(&self, chat_id: &str) -> Result<(), PortalError> {
        let existing = self
            .repo
            .find_active_by_chat_id(chat_id)
            .await
            .map_err(storage_error)?;

        match existing {
            None => Ok(()),
            Some(record) => {
                info!(
                    chat_id = %chat_id,
                    blocking_status = %record.status,
                    "Submission blocked by existing application"
                );
                let message = match record.status {
                    ApplicationStatus::Pending => {
                        "You already have a pending application awaiting review."
                    }
                    ApplicationStatus::Approved => {
                        "You already have an approved application."
                    }
                    // Active lookup only returns pending/approved rows.
                    ApplicationStatus::Rejected => "You already have an active application.",
                };
                Err(PortalError::Conflict(message.to_string()))
            }
        }
    }
}
