//! Authentication extractors.
//!
//! Routes take `RequireAuth(user)` to demand a logged-in user, then
//! call a capability gate (`require_catalog_manager`,
//! `require_order_manager`) where the operation is role-restricted.
//! The extractor reads the `CurrentUser` stored in the session at
//! login.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};

/// Extractor that requires an authenticated user.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_user(parts).await.map(Self).map_err(IntoResponse::into_response)
    }
}

/// Gate for catalog and coupon management.
///
/// # Errors
///
/// Returns `AppError::Forbidden` if the user's role lacks the
/// capability.
pub fn require_catalog_manager(user: &CurrentUser) -> Result<(), AppError> {
    if user.role.can_manage_catalog() {
        Ok(())
    } else {
        Err(AppError::Forbidden("catalog management requires admin access".to_string()))
    }
}

/// Gate for order status overrides, refunds, and order deletion.
///
/// # Errors
///
/// Returns `AppError::Forbidden` if the user's role lacks the
/// capability.
pub fn require_order_manager(user: &CurrentUser) -> Result<(), AppError> {
    if user.role.can_manage_orders() {
        Ok(())
    } else {
        Err(AppError::Forbidden("order management requires admin access".to_string()))
    }
}

async fn current_user(parts: &mut Parts) -> Result<CurrentUser, AppError> {
    // The session is set in extensions by SessionManagerLayer
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or_else(|| AppError::Unauthorized("not logged in".to_string()))?;

    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
        .ok_or_else(|| AppError::Unauthorized("not logged in".to_string()))
}

/// Helper to set the current user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<CurrentUser>(session_keys::CURRENT_USER).await?;
    Ok(())
}
