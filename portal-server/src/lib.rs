//! # portal-server
//!
//! HTTP surface and wiring for the whitelist portal: env config, session and
//! identity-provider seams, the axum routes, and server startup.

pub mod app;
pub mod cli;
pub mod config;
pub mod identity;
pub mod routes;
pub mod session;

pub use app::{build_router, build_state, run_server, AppState};
pub use cli::{load_config, Cli, Commands};
pub use config::PortalConfig;
pub use identity::{
    ChatIdentityProvider, ChatProfile, GameIdentityProvider, GameProfile,
    HttpChatIdentityProvider, HttpGameIdentityProvider,
};
pub use session::{SessionStore, SessionView};
