//! Database operations for orders.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use sugarloaf_core::{
    OrderId, OrderItemId, OrderStatus, PaymentMethod, ProductId, ShippingMethod, UserId, VariantId,
};

use super::RepositoryError;
use crate::models::{Address, CreateOrderInput, Order, OrderItem, Tracking};

/// Internal row type for the order header. Address and tracking are
/// JSONB documents.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    shipping_method: String,
    payment_method: String,
    billing_address: Option<serde_json::Value>,
    coupon_code: Option<String>,
    notes: Option<String>,
    status: String,
    total: Decimal,
    tracking: Option<serde_json::Value>,
    payment_transaction_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Internal row type for order lines.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    product_id: i32,
    quantity: i32,
    price_at_purchase: Decimal,
    variant_id: Option<i32>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(row.id),
            product_id: ProductId::new(row.product_id),
            quantity: row.quantity,
            price_at_purchase: row.price_at_purchase,
            variant_id: row.variant_id.map(VariantId::new),
        }
    }
}

fn corruption(order_id: i32, what: &str, detail: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::DataCorruption(format!("order {order_id}: invalid {what}: {detail}"))
}

fn assemble(row: OrderRow, items: Vec<OrderItemRow>) -> Result<Order, RepositoryError> {
    let status: OrderStatus = row
        .status
        .parse()
        .map_err(|_| corruption(row.id, "status", &row.status))?;
    let shipping_method: ShippingMethod = row
        .shipping_method
        .parse()
        .map_err(|_| corruption(row.id, "shipping_method", &row.shipping_method))?;
    let payment_method: PaymentMethod = row
        .payment_method
        .parse()
        .map_err(|_| corruption(row.id, "payment_method", &row.payment_method))?;
    let billing_address: Option<Address> = row
        .billing_address
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| corruption(row.id, "billing_address", e))?;
    let tracking: Option<Tracking> = row
        .tracking
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| corruption(row.id, "tracking", e))?;

    Ok(Order {
        id: OrderId::new(row.id),
        user_id: UserId::new(row.user_id),
        items: items.into_iter().map(OrderItem::from).collect(),
        shipping_method,
        payment_method,
        billing_address,
        coupon_code: row.coupon_code,
        notes: row.notes,
        status,
        total: row.total,
        tracking,
        payment_transaction_id: row.payment_transaction_id,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

const ORDER_COLUMNS: &str = "id, user_id, shipping_method, payment_method, billing_address, \
     coupon_code, notes, status, total, tracking, payment_transaction_id, created_at, updated_at";

/// Repository for order operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new repository with the given pool.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create an order in one transaction, conditionally decrementing
    /// stock for every line. Any shortfall aborts the whole order.
    ///
    /// `total` is computed by the caller from the submitted line prices.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if a product is missing, or
    /// `RepositoryError::Conflict` naming the product that is out of
    /// stock.
    pub async fn create(
        &self,
        user_id: UserId,
        input: &CreateOrderInput,
        total: Decimal,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for item in &input.items {
            let updated = sqlx::query(
                "UPDATE shop.product SET stock = stock - $2, updated_at = NOW() \
                 WHERE id = $1 AND stock >= $2",
            )
            .bind(item.product_id.as_i32())
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                let exists: Option<i32> =
                    sqlx::query_scalar("SELECT id FROM shop.product WHERE id = $1")
                        .bind(item.product_id.as_i32())
                        .fetch_optional(&mut *tx)
                        .await?;
                return Err(if exists.is_some() {
                    RepositoryError::Conflict(format!(
                        "insufficient stock for product {}",
                        item.product_id
                    ))
                } else {
                    RepositoryError::NotFound
                });
            }
        }

        let billing_address = input
            .billing_address
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(format!("billing_address: {e}")))?;

        let order_id: i32 = sqlx::query_scalar(
            "INSERT INTO shop.\"order\" \
                 (user_id, shipping_method, payment_method, billing_address, coupon_code, \
                  notes, status, total) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING id",
        )
        .bind(user_id.as_i32())
        .bind(input.shipping_method.to_string())
        .bind(input.payment_method.to_string())
        .bind(billing_address)
        .bind(input.coupon_code.as_deref())
        .bind(input.notes.as_deref())
        .bind(OrderStatus::Pending.to_string())
        .bind(total)
        .fetch_one(&mut *tx)
        .await?;

        for item in &input.items {
            sqlx::query(
                "INSERT INTO shop.order_item \
                     (order_id, product_id, quantity, price_at_purchase, variant_id) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(order_id)
            .bind(item.product_id.as_i32())
            .bind(item.quantity)
            .bind(item.snapshot_price)
            .bind(item.variant_id.map(|v| v.as_i32()))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get(OrderId::new(order_id))
            .await?
            .ok_or_else(|| RepositoryError::DataCorruption(format!("order {order_id} vanished")))
    }

    /// Fetch an order with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let Some(row) = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.\"order\" WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItemRow>(
            "SELECT id, product_id, quantity, price_at_purchase, variant_id \
             FROM shop.order_item WHERE order_id = $1 ORDER BY id",
        )
        .bind(row.id)
        .fetch_all(self.pool)
        .await?;

        assemble(row, items).map(Some)
    }

    /// Move an order to a new status, conditional on the status the
    /// caller observed. The transition itself is validated by the caller
    /// with [`OrderStatus::can_transition_to`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order changed status
    /// since it was read.
    pub async fn set_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.\"order\" SET status = $2, updated_at = NOW() \
             WHERE id = $1 AND status = $3",
        )
        .bind(id.as_i32())
        .bind(to.to_string())
        .bind(from.to_string())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(format!(
                "order {id} is no longer {from}"
            )));
        }

        self.get(id)
            .await?
            .ok_or_else(|| RepositoryError::DataCorruption(format!("order {id} vanished")))
    }

    /// Attach shipment tracking details. Status is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no order has this id.
    pub async fn add_tracking(
        &self,
        id: OrderId,
        tracking: &Tracking,
    ) -> Result<Order, RepositoryError> {
        let value = serde_json::to_value(tracking)
            .map_err(|e| RepositoryError::DataCorruption(format!("tracking: {e}")))?;

        let result = sqlx::query(
            "UPDATE shop.\"order\" SET tracking = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(value)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get(id)
            .await?
            .ok_or_else(|| RepositoryError::DataCorruption(format!("order {id} vanished")))
    }

    /// Hard-delete an order and its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no order has this id.
    pub async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.\"order\" WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
