//! Database operations for carts and cart lines.
//!
//! Every mutation runs in a transaction that recomputes the cart
//! subtotal from its lines and finishes with a version-guarded update of
//! the cart row. A lost race surfaces as `RepositoryError::Conflict`;
//! the route layer retries once.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use sugarloaf_core::{CartId, CartItemId, ProductId, UserId, VariantId};

use super::RepositoryError;
use crate::models::cart::MAX_LINE_QUANTITY;
use crate::models::{AddItemInput, Cart, CartItem, CartItemAction, ProductSummary};
use crate::services::pricing::DiscountOutcome;

/// Internal row type for the cart header.
#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: i32,
    user_id: i32,
    subtotal: Decimal,
    coupon_code: Option<String>,
    discount_amount: Option<Decimal>,
    total: Option<Decimal>,
    version: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Internal row type for cart lines joined with the live product.
#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: i32,
    product_id: i32,
    quantity: i32,
    snapshot_price: Decimal,
    variant_id: Option<i32>,
    notes: Option<String>,
    discounted_price: Option<Decimal>,
    product_title: Option<String>,
    product_price: Option<Decimal>,
    product_images: Option<Vec<String>>,
    product_category: Option<String>,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        // The join columns are either all present or all NULL (deleted
        // product), keyed off the title.
        let product = row.product_title.map(|title| ProductSummary {
            title,
            price: row.product_price.unwrap_or_default(),
            images: row.product_images.unwrap_or_default(),
            category: row.product_category.unwrap_or_default(),
        });
        Self {
            id: CartItemId::new(row.id),
            product_id: ProductId::new(row.product_id),
            quantity: row.quantity,
            snapshot_price: row.snapshot_price,
            variant_id: row.variant_id.map(VariantId::new),
            notes: row.notes,
            discounted_price: row.discounted_price,
            product,
        }
    }
}

const ITEM_QUERY: &str = "SELECT ci.id, ci.product_id, ci.quantity, ci.snapshot_price, \
            ci.variant_id, ci.notes, ci.discounted_price, \
            p.title AS product_title, p.price AS product_price, \
            p.images AS product_images, p.category AS product_category \
     FROM shop.cart_item ci \
     LEFT JOIN shop.product p ON p.id = ci.product_id \
     WHERE ci.cart_id = $1 \
     ORDER BY ci.id";

/// Repository for cart operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new repository with the given pool.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch a user's cart with its lines, or `None` if the user has
    /// never carted anything.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure.
    pub async fn get_by_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let Some(row) = sqlx::query_as::<_, CartRow>(
            "SELECT id, user_id, subtotal, coupon_code, discount_amount, total, version, \
                    created_at, updated_at \
             FROM shop.cart WHERE user_id = $1",
        )
        .bind(user_id.as_i32())
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, CartItemRow>(ITEM_QUERY)
            .bind(row.id)
            .fetch_all(self.pool)
            .await?;

        Ok(Some(assemble(row, items)))
    }

    /// Add a line to the cart, creating the cart on first use.
    ///
    /// A line with the same `product_id` and `variant_id` is merged:
    /// its quantity is incremented and clamped to the line maximum.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the cart was modified
    /// concurrently.
    pub async fn add_item(
        &self,
        user_id: UserId,
        input: &AddItemInput,
        snapshot_price: Decimal,
    ) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO shop.cart (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id.as_i32())
            .execute(&mut *tx)
            .await?;

        let (cart_id, version) = cart_head(&mut tx, user_id).await?;

        let existing: Option<i32> = sqlx::query_scalar(
            "SELECT id FROM shop.cart_item \
             WHERE cart_id = $1 AND product_id = $2 AND variant_id IS NOT DISTINCT FROM $3",
        )
        .bind(cart_id)
        .bind(input.product_id.as_i32())
        .bind(input.variant_id.map(|v| v.as_i32()))
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(item_id) = existing {
            sqlx::query("UPDATE shop.cart_item SET quantity = LEAST(quantity + $2, $3) WHERE id = $1")
                .bind(item_id)
                .bind(input.quantity)
                .bind(MAX_LINE_QUANTITY)
                .execute(&mut *tx)
                .await?;
        } else {
            sqlx::query(
                "INSERT INTO shop.cart_item \
                     (cart_id, product_id, quantity, snapshot_price, variant_id, notes) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(cart_id)
            .bind(input.product_id.as_i32())
            .bind(input.quantity)
            .bind(snapshot_price)
            .bind(input.variant_id.map(|v| v.as_i32()))
            .bind(input.notes.as_deref())
            .execute(&mut *tx)
            .await?;
        }

        finalize(&mut tx, cart_id, version).await?;
        tx.commit().await?;

        self.require(user_id).await
    }

    /// Apply an action to a cart line's quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart or line is
    /// absent, or `RepositoryError::Conflict` on a lost race.
    pub async fn update_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        action: CartItemAction,
        amount: i32,
    ) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let (cart_id, version) = cart_head(&mut tx, user_id).await?;

        let result = match action {
            CartItemAction::Increment => {
                sqlx::query(
                    "UPDATE shop.cart_item SET quantity = LEAST(quantity + $3, $4) \
                     WHERE id = $1 AND cart_id = $2",
                )
                .bind(item_id.as_i32())
                .bind(cart_id)
                .bind(amount)
                .bind(MAX_LINE_QUANTITY)
            }
            CartItemAction::Decrement => {
                sqlx::query(
                    "UPDATE shop.cart_item SET quantity = GREATEST(quantity - $3, 1) \
                     WHERE id = $1 AND cart_id = $2",
                )
                .bind(item_id.as_i32())
                .bind(cart_id)
                .bind(amount)
            }
            CartItemAction::Set => {
                sqlx::query(
                    "UPDATE shop.cart_item SET quantity = $3 \
                     WHERE id = $1 AND cart_id = $2",
                )
                .bind(item_id.as_i32())
                .bind(cart_id)
                .bind(amount)
            }
        }
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        finalize(&mut tx, cart_id, version).await?;
        tx.commit().await?;

        self.require(user_id).await
    }

    /// Remove a line. Succeeds silently if the line id is not in the
    /// cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart is absent, or
    /// `RepositoryError::Conflict` on a lost race.
    pub async fn remove_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let (cart_id, version) = cart_head(&mut tx, user_id).await?;

        sqlx::query("DELETE FROM shop.cart_item WHERE id = $1 AND cart_id = $2")
            .bind(item_id.as_i32())
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        finalize(&mut tx, cart_id, version).await?;
        tx.commit().await?;

        self.require(user_id).await
    }

    /// Write an applied coupon: per-line discounted prices plus the
    /// cart-level code, discount amount, and total.
    ///
    /// The caller supplies the `version` observed when the discount was
    /// computed, so a concurrent mutation invalidates the write.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a lost race.
    pub async fn apply_coupon(
        &self,
        user_id: UserId,
        cart_id: CartId,
        version: i32,
        code: &str,
        outcome: &DiscountOutcome,
    ) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for line in &outcome.lines {
            sqlx::query(
                "UPDATE shop.cart_item SET discounted_price = $3 WHERE id = $1 AND cart_id = $2",
            )
            .bind(line.item_id.as_i32())
            .bind(cart_id.as_i32())
            .bind(line.discounted_price)
            .execute(&mut *tx)
            .await?;
        }

        let result = sqlx::query(
            "UPDATE shop.cart SET coupon_code = $2, discount_amount = $3, total = $4, \
                 version = version + 1, updated_at = NOW() \
             WHERE id = $1 AND version = $5",
        )
        .bind(cart_id.as_i32())
        .bind(code)
        .bind(outcome.discount_amount)
        .bind(outcome.total)
        .bind(version)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(
                "cart was modified concurrently".to_string(),
            ));
        }

        tx.commit().await?;
        self.require(user_id).await
    }

    /// Empty the cart and clear any applied coupon.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart is absent, or
    /// `RepositoryError::Conflict` on a lost race.
    pub async fn clear(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let (cart_id, version) = cart_head(&mut tx, user_id).await?;

        sqlx::query("DELETE FROM shop.cart_item WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query(
            "UPDATE shop.cart SET subtotal = 0, coupon_code = NULL, discount_amount = NULL, \
                 total = NULL, version = version + 1, updated_at = NOW() \
             WHERE id = $1 AND version = $2",
        )
        .bind(cart_id)
        .bind(version)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(
                "cart was modified concurrently".to_string(),
            ));
        }

        tx.commit().await?;
        self.require(user_id).await
    }

    /// Fetch the cart, treating absence as corruption (the caller just
    /// committed a mutation on it).
    async fn require(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        self.get_by_user(user_id).await?.ok_or_else(|| {
            RepositoryError::DataCorruption(format!("cart for user {user_id} vanished"))
        })
    }
}

/// Read the cart id and current version for a user.
async fn cart_head(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
) -> Result<(i32, i32), RepositoryError> {
    let head: Option<(i32, i32)> =
        sqlx::query_as("SELECT id, version FROM shop.cart WHERE user_id = $1")
            .bind(user_id.as_i32())
            .fetch_optional(&mut **tx)
            .await?;
    head.ok_or(RepositoryError::NotFound)
}

/// Recompute the subtotal from the lines and bump the version,
/// conditional on the version read at the start of the transaction.
async fn finalize(
    tx: &mut Transaction<'_, Postgres>,
    cart_id: i32,
    version: i32,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        "UPDATE shop.cart SET \
             subtotal = (SELECT COALESCE(SUM(snapshot_price * quantity), 0) \
                         FROM shop.cart_item WHERE cart_id = $1), \
             version = version + 1, updated_at = NOW() \
         WHERE id = $1 AND version = $2",
    )
    .bind(cart_id)
    .bind(version)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::Conflict(
            "cart was modified concurrently".to_string(),
        ));
    }
    Ok(())
}

fn assemble(row: CartRow, items: Vec<CartItemRow>) -> Cart {
    Cart {
        id: CartId::new(row.id),
        user_id: UserId::new(row.user_id),
        items: items.into_iter().map(CartItem::from).collect(),
        subtotal: row.subtotal,
        coupon_code: row.coupon_code,
        discount_amount: row.discount_amount,
        total: row.total,
        version: row.version,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}
