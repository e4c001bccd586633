//! Order model and input types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sugarloaf_core::{
    OrderId, OrderItemId, OrderStatus, PaymentMethod, ProductId, ShippingMethod, UserId, VariantId,
};

use crate::models::cart::MAX_LINE_QUANTITY;

/// A placed order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub shipping_method: ShippingMethod,
    pub payment_method: PaymentMethod,
    pub billing_address: Option<Address>,
    pub coupon_code: Option<String>,
    pub notes: Option<String>,
    pub status: OrderStatus,
    /// Sum of `price_at_purchase * quantity` over all items.
    pub total: Decimal,
    pub tracking: Option<Tracking>,
    /// Provider transaction id of the successful charge, if paid.
    pub payment_transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item on an order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub quantity: i32,
    /// Unit price frozen at order time.
    pub price_at_purchase: Decimal,
    pub variant_id: Option<VariantId>,
}

/// A billing address, stored as a JSON document on the order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// Shipment tracking details, stored as a JSON document on the order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tracking {
    pub tracking_number: String,
    pub carrier: String,
    pub estimated_delivery: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_delivery: Option<DateTime<Utc>>,
}

/// Input line for creating an order. Mirrors the cart line shape so a
/// client can submit its cart items directly.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemInput {
    pub product_id: ProductId,
    pub quantity: i32,
    /// Price the client saw when the item was carted. The order total is
    /// computed from these values.
    pub snapshot_price: Decimal,
    pub variant_id: Option<VariantId>,
}

/// Input for creating an order.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderInput {
    pub items: Vec<OrderItemInput>,
    pub shipping_method: ShippingMethod,
    pub payment_method: PaymentMethod,
    pub billing_address: Option<Address>,
    pub coupon_code: Option<String>,
    pub notes: Option<String>,
}

impl CreateOrderInput {
    /// Validate line constraints.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first violated constraint.
    pub fn validate(&self) -> Result<(), String> {
        if self.items.is_empty() {
            return Err("order must contain at least one item".to_string());
        }
        for item in &self.items {
            if !(1..=MAX_LINE_QUANTITY).contains(&item.quantity) {
                return Err(format!("quantity must be between 1 and {MAX_LINE_QUANTITY}"));
            }
            if item.snapshot_price < Decimal::ZERO {
                return Err("snapshot_price must not be negative".to_string());
            }
        }
        Ok(())
    }
}

/// Input for attaching tracking details to an order.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackingInput {
    pub tracking_number: String,
    pub carrier: String,
    pub estimated_delivery: DateTime<Utc>,
    pub actual_delivery: Option<DateTime<Utc>>,
}

impl TrackingInput {
    /// Validate field constraints.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first violated constraint.
    pub fn validate(&self) -> Result<(), String> {
        if self.tracking_number.trim().is_empty() {
            return Err("tracking_number must not be empty".to_string());
        }
        if self.carrier.trim().is_empty() {
            return Err("carrier must not be empty".to_string());
        }
        Ok(())
    }
}

impl From<TrackingInput> for Tracking {
    fn from(input: TrackingInput) -> Self {
        Self {
            tracking_number: input.tracking_number,
            carrier: input.carrier,
            estimated_delivery: input.estimated_delivery,
            actual_delivery: input.actual_delivery,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i32, price: Decimal) -> OrderItemInput {
        OrderItemInput {
            product_id: ProductId::from(1),
            quantity,
            snapshot_price: price,
            variant_id: None,
        }
    }

    #[test]
    fn create_input_rejects_empty_item_list() {
        let input = CreateOrderInput {
            items: vec![],
            shipping_method: ShippingMethod::Standard,
            payment_method: PaymentMethod::CreditCard,
            billing_address: None,
            coupon_code: None,
            notes: None,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn create_input_rejects_out_of_range_quantity() {
        let input = CreateOrderInput {
            items: vec![item(0, Decimal::TEN)],
            shipping_method: ShippingMethod::Standard,
            payment_method: PaymentMethod::CreditCard,
            billing_address: None,
            coupon_code: None,
            notes: None,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn create_input_accepts_valid_lines() {
        let input = CreateOrderInput {
            items: vec![item(2, Decimal::new(1999, 2)), item(100, Decimal::ONE)],
            shipping_method: ShippingMethod::Express,
            payment_method: PaymentMethod::CreditCard,
            billing_address: None,
            coupon_code: None,
            notes: None,
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn tracking_input_requires_carrier() {
        let input = TrackingInput {
            tracking_number: "1Z999".to_string(),
            carrier: "".to_string(),
            estimated_delivery: Utc::now(),
            actual_delivery: None,
        };
        assert!(input.validate().is_err());
    }
}
