//! Notifier abstraction for the chat-side representation of an application.
//!
//! The trait is the injected seam between the review workflow and the chat
//! platform; the concrete implementation lives in the discord crate and tests
//! substitute a fake. Failures here are expected and non-propagating: callers
//! log them and never roll back record state.

use async_trait::async_trait;
use portal_core::Result;
use storage::ApplicationRecord;

/// Reference to the posted chat-side message, needed for later edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRef {
    pub channel_id: String,
    pub message_id: String,
}

/// Outcome of a successful post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Interactive message posted; the record stores this reference so the
    /// message can be re-rendered after review.
    Interactive(NotificationRef),
    /// Fallback path delivered plain content without controls; there is no
    /// editable reference, so later updates become no-ops.
    Degraded,
}

/// Posts and re-renders the chat-side notification for an application.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Posts the notification for a new pending application.
    async fn post(&self, record: &ApplicationRecord) -> Result<Delivery>;

    /// Re-renders the notification after a status change, removing the
    /// interactive controls. Must not touch the record on failure.
    async fn update(&self, record: &ApplicationRecord) -> Result<()>;
}
