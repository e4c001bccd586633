//! Shopping cart model and input types.
//!
//! Each line item captures the product price at the moment it was added
//! (`snapshot_price`); later catalog price changes do not affect carts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sugarloaf_core::{CartId, CartItemId, ProductId, UserId, VariantId};

/// Maximum quantity per cart line.
pub const MAX_LINE_QUANTITY: i32 = 100;

/// Maximum length for line item notes.
pub const MAX_NOTES_LENGTH: usize = 200;

/// A user's shopping cart with its line items.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    /// Sum of `snapshot_price * quantity` over all items.
    pub subtotal: Decimal,
    /// Code of the coupon last applied, if any.
    pub coupon_code: Option<String>,
    /// Aggregate discount from the applied coupon.
    pub discount_amount: Option<Decimal>,
    /// Subtotal minus discount. Only present after a coupon is applied.
    pub total: Option<Decimal>,
    /// Optimistic-concurrency counter, bumped on every mutation.
    #[serde(skip)]
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single cart line.
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub quantity: i32,
    /// Catalog price captured when the line was created.
    pub snapshot_price: Decimal,
    pub variant_id: Option<VariantId>,
    pub notes: Option<String>,
    /// Per-unit price after the applied coupon, if any.
    pub discounted_price: Option<Decimal>,
    /// Current catalog data for display; `None` if the product was deleted.
    pub product: Option<ProductSummary>,
}

impl CartItem {
    /// Line total at snapshot prices.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.snapshot_price * Decimal::from(self.quantity)
    }
}

/// Display subset of the catalog product joined onto a cart line.
#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
    pub title: String,
    /// Current catalog price, which may differ from the snapshot.
    pub price: Decimal,
    pub images: Vec<String>,
    pub category: String,
}

/// Input for adding an item to the cart.
#[derive(Debug, Clone, Deserialize)]
pub struct AddItemInput {
    pub product_id: ProductId,
    pub quantity: i32,
    pub variant_id: Option<VariantId>,
    pub notes: Option<String>,
}

impl AddItemInput {
    /// Validate quantity bounds.
    ///
    /// # Errors
    ///
    /// Returns a message if the quantity is outside 1..=100.
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_LINE_QUANTITY).contains(&self.quantity) {
            return Err(format!("quantity must be between 1 and {MAX_LINE_QUANTITY}"));
        }
        if let Some(notes) = &self.notes
            && notes.len() > MAX_NOTES_LENGTH
        {
            return Err(format!("notes must be at most {MAX_NOTES_LENGTH} characters"));
        }
        Ok(())
    }
}

/// How to change a cart line's quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartItemAction {
    /// Add `quantity` (default 1), clamped to the line maximum.
    Increment,
    /// Subtract `quantity` (default 1), floored at 1. Never removes the
    /// line; use the delete endpoint for that.
    Decrement,
    /// Replace the quantity with the provided value.
    Set,
}

/// Input for updating a cart line.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateItemInput {
    pub action: CartItemAction,
    /// Amount for `increment`/`decrement` (default 1); required for `set`.
    pub quantity: Option<i32>,
}

impl UpdateItemInput {
    /// Validate the quantity for the chosen action.
    ///
    /// # Errors
    ///
    /// Returns a message if `set` is missing a quantity, or any provided
    /// quantity is outside 1..=100.
    pub fn validate(&self) -> Result<(), String> {
        if self.action == CartItemAction::Set && self.quantity.is_none() {
            return Err("quantity is required for the set action".to_string());
        }
        if let Some(q) = self.quantity
            && !(1..=MAX_LINE_QUANTITY).contains(&q)
        {
            return Err(format!("quantity must be between 1 and {MAX_LINE_QUANTITY}"));
        }
        Ok(())
    }

    /// The effective amount for increment/decrement actions.
    #[must_use]
    pub fn amount(&self) -> i32 {
        self.quantity.unwrap_or(1)
    }
}
