//! Status and closed-vocabulary enums for commerce entities.
//!
//! Enums are stored as lowercase text in Postgres and converted through
//! `Display`/`FromStr` at the repository boundary.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// The forward progression is pending -> confirmed -> processing -> shipped
/// -> delivered. `Cancelled` and `Refunded` are reachable from any
/// non-terminal state. `Delivered`, `Cancelled`, and `Refunded` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// Whether no further transition is permitted from this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled | Self::Refunded)
    }

    /// Whether an order in this status may move to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            Self::Cancelled | Self::Refunded => true,
            Self::Confirmed => matches!(self, Self::Pending),
            Self::Processing => matches!(self, Self::Confirmed),
            Self::Shipped => matches!(self, Self::Processing),
            Self::Delivered => matches!(self, Self::Shipped),
            Self::Pending => false,
        }
    }
}

/// Payment record status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
}

/// Refund record status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    #[default]
    Requested,
    Processed,
    Rejected,
}

/// Coupon discount kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

/// Accepted payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    BankTransfer,
}

/// Shipping methods offered at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMethod {
    #[default]
    Standard,
    Express,
    Payondelivery,
}

/// ISO 4217 currency codes accepted by the payment connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    JPY,
}

impl CurrencyCode {
    /// Lowercase code for the payment provider API.
    #[must_use]
    pub const fn as_provider_str(self) -> &'static str {
        match self {
            Self::USD => "usd",
            Self::EUR => "eur",
            Self::GBP => "gbp",
            Self::JPY => "jpy",
        }
    }
}

/// User role with different permission levels.
///
/// A closed enum checked through explicit capability methods; roles are never
/// dispatched on by string at request time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access to catalog, coupon, and order management.
    Admin,
    /// Regular shopper: own cart, own orders, payments.
    #[default]
    Customer,
}

impl Role {
    /// May create, update, and delete products and coupons.
    #[must_use]
    pub const fn can_manage_catalog(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// May override order status and delete orders.
    #[must_use]
    pub const fn can_manage_orders(self) -> bool {
        matches!(self, Self::Admin)
    }
}

macro_rules! impl_text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let s = match self {
                    $(Self::$variant => $text,)+
                };
                write!(f, "{s}")
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("invalid ", stringify!($name), ": {}"), s)),
                }
            }
        }
    };
}

impl_text_enum!(OrderStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Processing => "processing",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
    Refunded => "refunded",
});

impl_text_enum!(PaymentStatus {
    Pending => "pending",
    Completed => "completed",
    Failed => "failed",
    Refunded => "refunded",
});

impl_text_enum!(RefundStatus {
    Requested => "requested",
    Processed => "processed",
    Rejected => "rejected",
});

impl_text_enum!(DiscountType {
    Percentage => "percentage",
    Fixed => "fixed",
});

impl_text_enum!(PaymentMethod {
    CreditCard => "credit_card",
    BankTransfer => "bank_transfer",
});

impl_text_enum!(ShippingMethod {
    Standard => "standard",
    Express => "express",
    Payondelivery => "payondelivery",
});

impl_text_enum!(CurrencyCode {
    USD => "USD",
    EUR => "EUR",
    GBP => "GBP",
    JPY => "JPY",
});

impl_text_enum!(Role {
    Admin => "admin",
    Customer => "customer",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_progression_allowed() {
        use OrderStatus::{Confirmed, Delivered, Pending, Processing, Shipped};

        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
    }

    #[test]
    fn test_skipping_forward_states_rejected() {
        use OrderStatus::{Confirmed, Delivered, Pending, Shipped};

        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Pending.can_transition_to(Delivered));
        assert!(!Confirmed.can_transition_to(Delivered));
        assert!(!Shipped.can_transition_to(Confirmed));
    }

    #[test]
    fn test_cancel_and_refund_from_any_non_terminal() {
        use OrderStatus::{Cancelled, Confirmed, Pending, Processing, Refunded, Shipped};

        for status in [Pending, Confirmed, Processing, Shipped] {
            assert!(status.can_transition_to(Cancelled), "{status} -> cancelled");
            assert!(status.can_transition_to(Refunded), "{status} -> refunded");
        }
    }

    #[test]
    fn test_terminal_states_frozen() {
        use OrderStatus::{Cancelled, Confirmed, Delivered, Pending, Refunded};

        for terminal in [Delivered, Cancelled, Refunded] {
            assert!(terminal.is_terminal());
            for next in [Pending, Confirmed, Cancelled, Refunded, Delivered] {
                assert!(!terminal.can_transition_to(next), "{terminal} -> {next}");
            }
        }
    }

    #[test]
    fn test_text_round_trip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
            OrderStatus::Refunded,
        ] {
            let text = status.to_string();
            assert_eq!(text.parse::<OrderStatus>(), Ok(status));
        }

        assert_eq!("credit_card".parse::<PaymentMethod>(), Ok(PaymentMethod::CreditCard));
        assert!("paypal".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&OrderStatus::Confirmed).expect("serialize");
        assert_eq!(json, "\"confirmed\"");

        let status: OrderStatus = serde_json::from_str("\"shipped\"").expect("deserialize");
        assert_eq!(status, OrderStatus::Shipped);
    }

    #[test]
    fn test_role_capabilities() {
        assert!(Role::Admin.can_manage_catalog());
        assert!(Role::Admin.can_manage_orders());
        assert!(!Role::Customer.can_manage_catalog());
        assert!(!Role::Customer.can_manage_orders());
    }
}
