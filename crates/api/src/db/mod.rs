//! Database operations for the Sugarloaf `PostgreSQL` database.
//!
//! ## Tables (schema `shop`)
//!
//! - `shop.user` - Accounts and password hashes
//! - `shop.product` - Catalog products
//! - `shop.cart` / `shop.cart_item` - One cart per user, with line items
//! - `shop.coupon` - Discount coupons
//! - `shop."order"` / `shop.order_item` - Placed orders
//! - `shop.payment` / `shop.refund` - Provider charge and refund records
//! - `sessions` - tower-sessions storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p sugarloaf-cli -- migrate
//! ```
//!
//! Queries use runtime binding with `sqlx::query_as` and internal row
//! types that convert into the domain models.

pub mod carts;
pub mod coupons;
pub mod orders;
pub mod payments;
pub mod products;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use carts::CartRepository;
pub use coupons::CouponRepository;
pub use orders::OrderRepository;
pub use payments::PaymentRepository;
pub use products::ProductRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (unique code, concurrent cart update,
    /// insufficient stock).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// True if the underlying error is a unique constraint violation.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
