//! Pure pricing arithmetic: subtotals, coupon discounts, order totals.
//!
//! Everything here is side-effect free so the invariants can be tested
//! without a database. All amounts are in major currency units and
//! rounded half-away-from-zero to two decimal places.

use rust_decimal::Decimal;

use sugarloaf_core::{CartItemId, DiscountType, round_money};

use crate::models::{CartItem, Coupon, OrderItemInput};

/// Per-line result of applying a coupon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDiscount {
    pub item_id: CartItemId,
    /// Discounted per-unit price, never negative.
    pub discounted_price: Decimal,
}

/// Cart-level result of applying a coupon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountOutcome {
    pub lines: Vec<LineDiscount>,
    /// Aggregate discount, capped by the coupon's `max_discount`.
    pub discount_amount: Decimal,
    /// `subtotal - discount_amount`.
    pub total: Decimal,
}

/// Cart subtotal: sum of `snapshot_price * quantity` over all lines.
#[must_use]
pub fn cart_subtotal(items: &[CartItem]) -> Decimal {
    round_money(items.iter().map(CartItem::line_total).sum())
}

/// Order total: sum of `snapshot_price * quantity` over the submitted
/// lines. Orders price from the submitted snapshots, not the live
/// catalog.
#[must_use]
pub fn order_total(items: &[OrderItemInput]) -> Decimal {
    round_money(
        items
            .iter()
            .map(|item| item.snapshot_price * Decimal::from(item.quantity))
            .sum(),
    )
}

/// Discounted per-unit price for one line.
///
/// Percentage coupons scale the price; fixed coupons subtract a flat
/// amount per unit, floored at zero.
#[must_use]
pub fn discounted_unit_price(price: Decimal, coupon: &Coupon) -> Decimal {
    let discounted = match coupon.discount_type {
        DiscountType::Percentage => {
            price * (Decimal::ONE - coupon.discount_value / Decimal::ONE_HUNDRED)
        }
        DiscountType::Fixed => (price - coupon.discount_value).max(Decimal::ZERO),
    };
    round_money(discounted)
}

/// Apply a coupon across a cart's lines.
///
/// Per-line prices are discounted individually; the aggregate discount
/// is capped by the coupon's `max_discount` (the cap applies to the
/// total only, per-line prices are left as computed). The caller has
/// already checked redeemability and the minimum cart value.
#[must_use]
pub fn apply_discount(items: &[CartItem], subtotal: Decimal, coupon: &Coupon) -> DiscountOutcome {
    let mut lines = Vec::with_capacity(items.len());
    let mut discount = Decimal::ZERO;

    for item in items {
        let discounted_price = discounted_unit_price(item.snapshot_price, coupon);
        discount += (item.snapshot_price - discounted_price) * Decimal::from(item.quantity);
        lines.push(LineDiscount { item_id: item.id, discounted_price });
    }

    let mut discount_amount = round_money(discount);
    if let Some(cap) = coupon.max_discount {
        discount_amount = discount_amount.min(cap);
    }

    DiscountOutcome { lines, discount_amount, total: round_money(subtotal - discount_amount) }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use sugarloaf_core::{CartItemId, CouponId, ProductId};

    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn item(id: i32, price: &str, quantity: i32) -> CartItem {
        CartItem {
            id: CartItemId::new(id),
            product_id: ProductId::new(id),
            quantity,
            snapshot_price: dec(price),
            variant_id: None,
            notes: None,
            discounted_price: None,
            product: None,
        }
    }

    fn coupon(discount_type: DiscountType, value: &str, max_discount: Option<&str>) -> Coupon {
        Coupon {
            id: CouponId::new(1),
            code: "TEST10".to_string(),
            discount_type,
            discount_value: dec(value),
            valid_from: Utc::now() - Duration::days(1),
            valid_to: Utc::now() + Duration::days(1),
            min_cart_value: None,
            max_discount: max_discount.map(dec),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn subtotal_sums_snapshot_prices() {
        let items = [item(1, "10.00", 2), item(2, "5.50", 3)];
        assert_eq!(cart_subtotal(&items), dec("36.50"));
    }

    #[test]
    fn subtotal_of_empty_cart_is_zero() {
        assert_eq!(cart_subtotal(&[]), Decimal::ZERO);
    }

    #[test]
    fn percentage_discount_scales_price() {
        let c = coupon(DiscountType::Percentage, "10", None);
        assert_eq!(discounted_unit_price(dec("100.00"), &c), dec("90.00"));
        assert_eq!(discounted_unit_price(dec("19.99"), &c), dec("17.99"));
    }

    #[test]
    fn percentage_rounds_half_away_from_zero() {
        // 10.05 * 0.5 = 5.025 -> 5.03
        let c = coupon(DiscountType::Percentage, "50", None);
        assert_eq!(discounted_unit_price(dec("10.05"), &c), dec("5.03"));
    }

    #[test]
    fn fixed_discount_floors_at_zero() {
        let c = coupon(DiscountType::Fixed, "5.00", None);
        assert_eq!(discounted_unit_price(dec("12.00"), &c), dec("7.00"));
        assert_eq!(discounted_unit_price(dec("3.00"), &c), dec("0.00"));
    }

    #[test]
    fn hundred_percent_discount_zeroes_the_cart() {
        let items = [item(1, "10.00", 2), item(2, "7.77", 1)];
        let subtotal = cart_subtotal(&items);
        let c = coupon(DiscountType::Percentage, "100", None);
        let outcome = apply_discount(&items, subtotal, &c);
        assert_eq!(outcome.discount_amount, subtotal);
        assert_eq!(outcome.total, Decimal::ZERO);
        assert!(outcome.lines.iter().all(|l| l.discounted_price == Decimal::ZERO));
    }

    #[test]
    fn discount_never_exceeds_subtotal() {
        // Fixed 5.00 off a 3.00 item floors per-line at zero, so the
        // aggregate can never push the total negative.
        let items = [item(1, "3.00", 4)];
        let subtotal = cart_subtotal(&items);
        let c = coupon(DiscountType::Fixed, "5.00", None);
        let outcome = apply_discount(&items, subtotal, &c);
        assert_eq!(outcome.discount_amount, dec("12.00"));
        assert_eq!(outcome.total, Decimal::ZERO);
    }

    #[test]
    fn aggregate_discount_weights_by_quantity() {
        let items = [item(1, "20.00", 3)];
        let c = coupon(DiscountType::Percentage, "25", None);
        let outcome = apply_discount(&items, cart_subtotal(&items), &c);
        // 5.00 off each of 3 units.
        assert_eq!(outcome.discount_amount, dec("15.00"));
        assert_eq!(outcome.total, dec("45.00"));
    }

    #[test]
    fn max_discount_caps_the_aggregate_only() {
        let items = [item(1, "100.00", 2)];
        let c = coupon(DiscountType::Percentage, "50", Some("30.00"));
        let outcome = apply_discount(&items, cart_subtotal(&items), &c);
        assert_eq!(outcome.discount_amount, dec("30.00"));
        assert_eq!(outcome.total, dec("170.00"));
        // Per-line prices stay as computed.
        assert_eq!(outcome.lines[0].discounted_price, dec("50.00"));
    }

    #[test]
    fn max_discount_above_computed_discount_is_inert() {
        let items = [item(1, "10.00", 1)];
        let c = coupon(DiscountType::Percentage, "10", Some("500.00"));
        let outcome = apply_discount(&items, cart_subtotal(&items), &c);
        assert_eq!(outcome.discount_amount, dec("1.00"));
        assert_eq!(outcome.total, dec("9.00"));
    }

    #[test]
    fn order_total_uses_submitted_snapshots() {
        let items = [
            OrderItemInput {
                product_id: ProductId::new(1),
                quantity: 2,
                snapshot_price: dec("19.99"),
                variant_id: None,
            },
            OrderItemInput {
                product_id: ProductId::new(2),
                quantity: 1,
                snapshot_price: dec("0.01"),
                variant_id: None,
            },
        ];
        assert_eq!(order_total(&items), dec("39.99"));
    }
}
