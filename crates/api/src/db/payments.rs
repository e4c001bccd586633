//! Database operations for payments and refunds.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use sugarloaf_core::{
    CurrencyCode, OrderId, OrderStatus, PaymentId, PaymentMethod, PaymentStatus, RefundId,
    RefundStatus,
};

use super::RepositoryError;
use crate::models::{Payment, Refund};

/// Internal row type for payment queries.
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: i32,
    order_id: i32,
    amount: Decimal,
    currency: String,
    method: String,
    status: String,
    transaction_id: String,
    exchange_rate: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = RepositoryError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let corrupt = |what: &str, value: &str| {
            RepositoryError::DataCorruption(format!(
                "payment {}: invalid {what} '{value}'",
                row.id
            ))
        };
        Ok(Self {
            id: PaymentId::new(row.id),
            order_id: OrderId::new(row.order_id),
            amount: row.amount,
            currency: row
                .currency
                .parse::<CurrencyCode>()
                .map_err(|_| corrupt("currency", &row.currency))?,
            method: row
                .method
                .parse::<PaymentMethod>()
                .map_err(|_| corrupt("method", &row.method))?,
            status: row
                .status
                .parse::<PaymentStatus>()
                .map_err(|_| corrupt("status", &row.status))?,
            transaction_id: row.transaction_id,
            exchange_rate: row.exchange_rate,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Internal row type for refund queries.
#[derive(Debug, sqlx::FromRow)]
struct RefundRow {
    id: i32,
    order_id: i32,
    amount: Decimal,
    reason: String,
    status: String,
    provider_refund_id: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<RefundRow> for Refund {
    type Error = RepositoryError;

    fn try_from(row: RefundRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<RefundStatus>().map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "refund {}: invalid status '{}'",
                row.id, row.status
            ))
        })?;
        Ok(Self {
            id: RefundId::new(row.id),
            order_id: OrderId::new(row.order_id),
            amount: row.amount,
            reason: row.reason,
            status,
            provider_refund_id: row.provider_refund_id,
            created_at: row.created_at,
        })
    }
}

const PAYMENT_COLUMNS: &str = "id, order_id, amount, currency, method, status, transaction_id, \
     exchange_rate, created_at, updated_at";

/// Repository for payment and refund operations.
pub struct PaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentRepository<'a> {
    /// Create a new repository with the given pool.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a successful charge in one transaction: the payment row
    /// plus the order stamped confirmed with its transaction id. A
    /// crash can never leave a recorded payment against a
    /// still-pending order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the transaction id is
    /// already recorded (duplicate provider charge).
    pub async fn record_charge(
        &self,
        order_id: OrderId,
        amount: Decimal,
        currency: CurrencyCode,
        method: PaymentMethod,
        transaction_id: &str,
        exchange_rate: Decimal,
    ) -> Result<Payment, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "INSERT INTO shop.payment \
                 (order_id, amount, currency, method, status, transaction_id, exchange_rate) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(order_id.as_i32())
        .bind(amount)
        .bind(currency.to_string())
        .bind(method.to_string())
        .bind(PaymentStatus::Completed.to_string())
        .bind(transaction_id)
        .bind(exchange_rate)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepositoryError::Conflict(format!(
                    "transaction '{transaction_id}' is already recorded"
                ))
            }
            _ => RepositoryError::Database(e),
        })?;

        sqlx::query(
            "UPDATE shop.\"order\" SET status = $2, payment_transaction_id = $3, \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(order_id.as_i32())
        .bind(OrderStatus::Confirmed.to_string())
        .bind(transaction_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    /// Reconcile a provider webhook outcome onto the matching payment,
    /// idempotently. A completed payment also confirms its order if the
    /// order is still pending.
    ///
    /// Returns `false` when the transaction is unknown or the payment is
    /// already in the target state (repeat delivery).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure.
    pub async fn reconcile_transaction(
        &self,
        transaction_id: &str,
        status: PaymentStatus,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Refunded is terminal for a payment; a late success event must
        // not resurrect it.
        let order_id: Option<i32> = sqlx::query_scalar(
            "UPDATE shop.payment SET status = $2, updated_at = NOW() \
             WHERE transaction_id = $1 AND status <> $2 AND status <> $3 \
             RETURNING order_id",
        )
        .bind(transaction_id)
        .bind(status.to_string())
        .bind(PaymentStatus::Refunded.to_string())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(order_id) = order_id else {
            return Ok(false);
        };

        if status == PaymentStatus::Completed {
            sqlx::query(
                "UPDATE shop.\"order\" SET status = $2, payment_transaction_id = $3, \
                     updated_at = NOW() \
                 WHERE id = $1 AND status = $4",
            )
            .bind(order_id)
            .bind(OrderStatus::Confirmed.to_string())
            .bind(transaction_id)
            .bind(OrderStatus::Pending.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    /// Persist the outcome of a successful provider refund in one
    /// transaction: the refund record, the payment flipped to refunded,
    /// and the order status set refunded.
    ///
    /// Called only after the provider accepted the refund; nothing here
    /// talks to the provider.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure.
    pub async fn record_refund(
        &self,
        order_id: OrderId,
        transaction_id: &str,
        amount: Decimal,
        reason: &str,
        provider_refund_id: &str,
    ) -> Result<Refund, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, RefundRow>(
            "INSERT INTO shop.refund (order_id, amount, reason, status, provider_refund_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, order_id, amount, reason, status, provider_refund_id, created_at",
        )
        .bind(order_id.as_i32())
        .bind(amount)
        .bind(reason)
        .bind(RefundStatus::Processed.to_string())
        .bind(provider_refund_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE shop.payment SET status = $2, updated_at = NOW() WHERE transaction_id = $1",
        )
        .bind(transaction_id)
        .bind(PaymentStatus::Refunded.to_string())
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE shop.\"order\" SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(order_id.as_i32())
            .bind(OrderStatus::Refunded.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        row.try_into()
    }
}
