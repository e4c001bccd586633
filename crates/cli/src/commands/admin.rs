//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a new admin user
//! sl-cli admin create -e admin@example.com -p "a long password"
//! ```
//!
//! # Environment Variables
//!
//! - `SUGARLOAF_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL`
//!   connection string

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;
use thiserror::Error;

use sugarloaf_api::db::{RepositoryError, UserRepository};
use sugarloaf_core::{Email, Role};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Repository error (conflicts, corrupt rows).
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Password too short.
    #[error("Password must be at least 8 characters")]
    WeakPassword,

    /// Password hashing failure.
    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

/// Create a new admin user.
///
/// # Arguments
///
/// * `email` - Admin's email address
/// * `password` - Admin's password
///
/// # Returns
///
/// The ID of the created admin user.
pub async fn create_user(email: &str, password: &str) -> Result<i32, AdminError> {
    dotenvy::dotenv().ok();

    let email = Email::parse(email.trim().to_lowercase().as_str())
        .map_err(|e| AdminError::InvalidEmail(e.to_string()))?;

    if password.len() < 8 {
        return Err(AdminError::WeakPassword);
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AdminError::Hashing(e.to_string()))?
        .to_string();

    let database_url = super::migrate::database_url()
        .map_err(|_| AdminError::MissingEnvVar("SUGARLOAF_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(&database_url).await?;

    tracing::info!("Creating admin user: {}", email);

    let repo = UserRepository::new(&pool);
    let user = repo.create(&email, &password_hash, Role::Admin).await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );

    Ok(user.id.as_i32())
}
