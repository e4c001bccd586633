//! User account model and session types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sugarloaf_core::{Email, Role, UserId};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A registered user account.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// The authenticated user stored in the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: String,
    pub role: Role,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self { id: user.id, email: user.email.to_string(), role: user.role }
    }
}

/// Session storage keys.
pub mod session_keys {
    /// Key under which the [`CurrentUser`](super::CurrentUser) is stored.
    pub const CURRENT_USER: &str = "current_user";
}

/// Input for registering an account.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
}

impl RegisterInput {
    /// Validate the password policy. Email syntax is checked separately
    /// by [`Email::parse`](sugarloaf_core::Email).
    ///
    /// # Errors
    ///
    /// Returns a message if the password is too short.
    pub fn validate(&self) -> Result<(), String> {
        if self.password.len() < MIN_PASSWORD_LENGTH {
            return Err(format!(
                "password must be at least {MIN_PASSWORD_LENGTH} characters"
            ));
        }
        Ok(())
    }
}

/// Input for logging in.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_rejects_short_password() {
        let input = RegisterInput {
            email: "a@example.com".to_string(),
            password: "short".to_string(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn current_user_carries_role() {
        let user = User {
            id: UserId::from(7),
            email: Email::parse("a@example.com").unwrap(),
            role: Role::Admin,
            created_at: Utc::now(),
        };
        let current = CurrentUser::from(&user);
        assert_eq!(current.id, UserId::from(7));
        assert_eq!(current.role, Role::Admin);
    }
}
