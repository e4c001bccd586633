//! HTTP middleware for the API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, trace requests)
//! 2. Session layer (tower-sessions with `PostgreSQL` store)

pub mod auth;
pub mod session;

pub use auth::{
    RequireAuth, clear_current_user, require_catalog_manager, require_order_manager,
    set_current_user,
};
pub use session::create_session_layer;
