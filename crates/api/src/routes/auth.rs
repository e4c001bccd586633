//! Authentication route handlers: register, login, logout.
//!
//! Passwords are hashed with argon2; the logged-in user is stored in a
//! `PostgreSQL`-backed session.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode};
use tower_sessions::Session;
use tracing::instrument;

use sugarloaf_core::{Email, Role};

use crate::db::UserRepository;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::{CurrentUser, LoginInput, RegisterInput, User};
use crate::state::AppState;

/// `POST /auth/register` - create an account and log it in.
#[instrument(skip(state, session, input))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<RegisterInput>,
) -> Result<(StatusCode, Json<User>)> {
    input.validate().map_err(AppError::BadRequest)?;
    let email = Email::parse(input.email.trim().to_lowercase().as_str())
        .map_err(|e| AppError::BadRequest(format!("invalid email: {e}")))?;

    let password_hash = hash_password(&input.password)?;

    let repo = UserRepository::new(state.pool());
    let user = repo.create(&email, &password_hash, Role::Customer).await?;
    tracing::info!(user_id = %user.id, "account registered");

    log_in(&session, &user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// `POST /auth/login` - verify credentials and open a session.
#[instrument(skip(state, session, input))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<LoginInput>,
) -> Result<Json<User>> {
    let repo = UserRepository::new(state.pool());
    let Some((user, password_hash)) = repo.get_by_email_with_hash(&input.email).await? else {
        // Burn a verification anyway so a missing account takes as long
        // as a wrong password.
        let _ = verify_password(&input.password, DUMMY_HASH);
        return Err(AppError::Unauthorized("invalid credentials".to_string()));
    };

    if !verify_password(&input.password, &password_hash) {
        return Err(AppError::Unauthorized("invalid credentials".to_string()));
    }

    log_in(&session, &user).await?;
    tracing::info!(user_id = %user.id, "logged in");
    Ok(Json(user))
}

/// `POST /auth/logout` - close the session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// A valid argon2 hash of a throwaway password, used to equalize login
/// timing when the account does not exist.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$gZiV/M1gPc22ElAH/Jh1Hw$CWOrkoo7oJBQ/iyh7uJ0LO2aLEfrHwTWllSAxT0zRno";

async fn log_in(session: &Session, user: &User) -> Result<()> {
    let current = CurrentUser::from(user);
    set_current_user(session, &current)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_roundtrip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn dummy_hash_is_a_valid_argon2_hash() {
        assert!(PasswordHash::new(DUMMY_HASH).is_ok());
        assert!(!verify_password("anything", DUMMY_HASH));
    }
}
