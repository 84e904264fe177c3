//! # review
//!
//! Domain services for the whitelist application lifecycle: field validation,
//! the one-active-application gate, the submission service, and the review
//! protocol driven by chat-platform interactions. The chat platform itself is
//! behind the [`Notifier`] seam.

pub mod gate;
pub mod notify;
pub mod protocol;
pub mod submit;
pub mod validation;

pub use gate::SubmissionGate;
pub use notify::{Delivery, NotificationRef, Notifier};
pub use protocol::{control, ReviewProtocol};
pub use submit::SubmissionService;
pub use validation::{validate, SubmissionInput, ValidatedSubmission, MIN_AGE};

use portal_core::PortalError;
use storage::StorageError;

/// Maps storage failures into the portal taxonomy: unavailability is a
/// dependency failure, the rest keep their meaning.
pub fn storage_error(e: StorageError) -> PortalError {
    match e {
        StorageError::NotFound(msg) => PortalError::NotFound(msg),
        StorageError::AlreadyExists(msg) => PortalError::Conflict(msg),
        StorageError::Database(msg) => PortalError::Dependency(msg),
    }
}
