//! Database operations for coupons.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use sugarloaf_core::{CouponId, DiscountType};

use super::RepositoryError;
use crate::models::{Coupon, CreateCouponInput};

/// Internal row type for coupon queries.
#[derive(Debug, sqlx::FromRow)]
struct CouponRow {
    id: i32,
    code: String,
    discount_type: String,
    discount_value: Decimal,
    valid_from: DateTime<Utc>,
    valid_to: DateTime<Utc>,
    min_cart_value: Option<Decimal>,
    max_discount: Option<Decimal>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = RepositoryError;

    fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
        let discount_type: DiscountType = row.discount_type.parse().map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "invalid discount_type '{}' for coupon {}",
                row.discount_type, row.id
            ))
        })?;
        Ok(Self {
            id: CouponId::new(row.id),
            code: row.code,
            discount_type,
            discount_value: row.discount_value,
            valid_from: row.valid_from,
            valid_to: row.valid_to,
            min_cart_value: row.min_cart_value,
            max_discount: row.max_discount,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const COUPON_COLUMNS: &str = "id, code, discount_type, discount_value, valid_from, valid_to, \
     min_cart_value, max_discount, is_active, created_at, updated_at";

/// Repository for coupon operations.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    /// Create a new repository with the given pool.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new coupon. The code is stored uppercase.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code already exists.
    pub async fn create(&self, input: &CreateCouponInput) -> Result<Coupon, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            "INSERT INTO shop.coupon \
                 (code, discount_type, discount_value, valid_from, valid_to, \
                  min_cart_value, max_discount, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COUPON_COLUMNS}"
        ))
        .bind(input.normalized_code())
        .bind(input.discount_type.to_string())
        .bind(input.discount_value)
        .bind(input.valid_from)
        .bind(input.valid_to)
        .bind(input.min_cart_value)
        .bind(input.max_discount)
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepositoryError::Conflict(format!(
                    "coupon code '{}' already exists",
                    input.normalized_code()
                ))
            }
            _ => RepositoryError::Database(e),
        })?;

        row.try_into()
    }

    /// Look up a coupon by code (case-insensitive via uppercasing).
    ///
    /// Validity is judged by the caller against the current time; this
    /// is a plain lookup so expired and inactive coupons are still
    /// distinguishable from missing ones.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS} FROM shop.coupon WHERE code = $1"
        ))
        .bind(code.trim().to_uppercase())
        .fetch_optional(self.pool)
        .await?;

        row.map(Coupon::try_from).transpose()
    }

    /// List all coupons, soonest-expiring first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure.
    pub async fn list(&self) -> Result<Vec<Coupon>, RepositoryError> {
        let rows = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS} FROM shop.coupon ORDER BY valid_to ASC, id ASC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Coupon::try_from).collect()
    }

    /// Deactivate a coupon. Already-applied discounts are unaffected.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no coupon has this id.
    pub async fn deactivate(&self, id: CouponId) -> Result<Coupon, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            "UPDATE shop.coupon SET is_active = FALSE, updated_at = NOW() \
             WHERE id = $1 RETURNING {COUPON_COLUMNS}"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }
}
