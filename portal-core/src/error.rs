use serde::Serialize;
use thiserror::Error;

/// One failed field in a submission, surfaced verbatim to the applicant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum PortalError {
    /// Client input malformed; carries every failing field, not just the first.
    #[error("validation failed: {0:?}")]
    Validation(Vec<FieldError>),

    /// Duplicate active application; message distinguishes pending from approved.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Actor lacks the reviewer role. Distinct from NotFound so operators can
    /// tell "wrong permissions" from "bad reference".
    #[error("permission denied: {0}")]
    Unauthorized(String),

    /// Notification delivery failed. Expected and non-propagating: callers log
    /// it and keep the record mutation.
    #[error("notification delivery failed: {0}")]
    Notification(String),

    /// Persistence or an external provider is unreachable; fatal to the
    /// request, never to the process.
    #[error("dependency unavailable: {0}")]
    Dependency(String),
}

pub type Result<T> = std::result::Result<T, PortalError>;
