//! Coupon model, input, and validation result types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sugarloaf_core::{CouponId, DiscountType};

/// A discount coupon.
#[derive(Debug, Clone, Serialize)]
pub struct Coupon {
    pub id: CouponId,
    /// Uppercase coupon code, unique.
    pub code: String,
    pub discount_type: DiscountType,
    /// Percentage (0..=100) or fixed amount per unit, depending on type.
    pub discount_value: Decimal,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    /// Minimum cart subtotal required to redeem.
    pub min_cart_value: Option<Decimal>,
    /// Cap on the aggregate discount for one cart.
    pub max_discount: Option<Decimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Coupon {
    /// True if `now` falls inside the validity window and the coupon is
    /// active. Both endpoints are inclusive.
    #[must_use]
    pub fn is_redeemable_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.valid_from <= now && now <= self.valid_to
    }

    /// Check the minimum cart value gate against a subtotal.
    #[must_use]
    pub fn meets_minimum(&self, subtotal: Decimal) -> bool {
        self.min_cart_value.is_none_or(|min| subtotal >= min)
    }
}

/// Input for creating a coupon.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCouponInput {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub min_cart_value: Option<Decimal>,
    pub max_discount: Option<Decimal>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

impl CreateCouponInput {
    /// Uppercase trimmed code, the canonical storage form.
    #[must_use]
    pub fn normalized_code(&self) -> String {
        self.code.trim().to_uppercase()
    }

    /// Validate field constraints.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first violated constraint.
    pub fn validate(&self) -> Result<(), String> {
        let code = self.code.trim();
        if code.is_empty() {
            return Err("code must not be empty".to_string());
        }
        if !(4..=20).contains(&code.len()) {
            return Err("code must be between 4 and 20 characters".to_string());
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err("code may only contain letters, digits, '-' and '_'".to_string());
        }
        if self.discount_value <= Decimal::ZERO {
            return Err("discount_value must be positive".to_string());
        }
        if self.discount_type == DiscountType::Percentage
            && self.discount_value > Decimal::ONE_HUNDRED
        {
            return Err("percentage discount must be at most 100".to_string());
        }
        if self.valid_to <= self.valid_from {
            return Err("valid_to must be after valid_from".to_string());
        }
        if let Some(min) = self.min_cart_value
            && min < Decimal::ZERO
        {
            return Err("min_cart_value must not be negative".to_string());
        }
        if let Some(max) = self.max_discount
            && max <= Decimal::ZERO
        {
            return Err("max_discount must be positive".to_string());
        }
        Ok(())
    }
}

/// Public subset of a coupon returned from the validation endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CouponSummary {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_cart_value: Option<Decimal>,
    pub max_discount: Option<Decimal>,
}

impl From<&Coupon> for CouponSummary {
    fn from(coupon: &Coupon) -> Self {
        Self {
            code: coupon.code.clone(),
            discount_type: coupon.discount_type,
            discount_value: coupon.discount_value,
            min_cart_value: coupon.min_cart_value,
            max_discount: coupon.max_discount,
        }
    }
}

/// Result of checking a coupon against a cart subtotal.
#[derive(Debug, Clone, Serialize)]
pub struct CouponValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon: Option<CouponSummary>,
}

impl CouponValidation {
    #[must_use]
    pub fn valid(coupon: &Coupon) -> Self {
        Self { valid: true, message: None, coupon: Some(CouponSummary::from(coupon)) }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self { valid: false, message: Some(message.into()), coupon: None }
    }
}
