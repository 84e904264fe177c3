//! # portal-core
//!
//! Shared types for the whitelist portal: decoded interaction events, the
//! error taxonomy, and tracing initialization. Transport- and
//! storage-agnostic; used by every other crate in the workspace.

pub mod error;
pub mod interaction;
pub mod logger;

pub use error::{FieldError, PortalError, Result};
pub use interaction::{Actor, CommandOption, Interaction, InteractionReply};
pub use logger::init_tracing;
