//! Discord implementation of the [`review::Notifier`] seam.
//!
//! Primary delivery posts an interactive message to the review channel via
//! the bot API; when that fails a configured webhook delivers the same
//! content without controls, flagged for manual review. Notification failures
//! are reported as [`PortalError::Notification`] and never touch the record.

use async_trait::async_trait;
use portal_core::{PortalError, Result};
use review::{Delivery, NotificationRef, Notifier};
use storage::ApplicationRecord;
use tracing::{debug, warn};

use crate::client::{DiscordClient, MessagePayload};
use crate::render::{render_degraded_content, render_payload};

pub struct DiscordNotifier {
    client: DiscordClient,
    review_channel_id: String,
    fallback_webhook_url: Option<String>,
}

impl DiscordNotifier {
    pub fn new(
        client: DiscordClient,
        review_channel_id: String,
        fallback_webhook_url: Option<String>,
    ) -> Self {
        Self {
            client,
            review_channel_id,
            fallback_webhook_url,
        }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn post(&self, record: &ApplicationRecord) -> Result<Delivery> {
        let payload = render_payload(record);

        let primary_error = match self
            .client
            .create_message(&self.review_channel_id, &payload)
            .await
        {
            Ok(message) => {
                return Ok(Delivery::Interactive(NotificationRef {
                    channel_id: message.channel_id,
                    message_id: message.id,
                }))
            }
            Err(e) => e,
        };

        warn!(
            application_id = %record.id,
            error = %primary_error,
            "Interactive notification failed; trying fallback webhook"
        );

        let webhook_url = match &self.fallback_webhook_url {
            Some(url) => url,
            None => {
                return Err(PortalError::Notification(format!(
                    "primary delivery failed and no fallback configured: {}",
                    primary_error
                )))
            }
        };

        self.client
            .execute_webhook(webhook_url, &render_degraded_content(record))
            .await
            .map_err(|e| {
                PortalError::Notification(format!(
                    "primary delivery failed ({}); fallback failed ({})",
                    primary_error, e
                ))
            })?;

        Ok(Delivery::Degraded)
    }

    async fn update(&self, record: &ApplicationRecord) -> Result<()> {
        let (channel_id, message_id) = match (
            &record.notification_channel_id,
            &record.notification_message_id,
        ) {
            (Some(channel), Some(message)) => (channel, message),
            _ => {
                // Degraded or failed deliveries have no editable message.
                debug!(
                    application_id = %record.id,
                    "No notification reference; skipping re-render"
                );
                return Ok(());
            }
        };

        let payload: MessagePayload = render_payload(record);
        self.client
            .edit_message(channel_id, message_id, &payload)
            .await
            .map_err(|e| PortalError::Notification(e.to_string()))?;

        Ok(())
    }
}
