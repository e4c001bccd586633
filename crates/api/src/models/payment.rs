//! Payment and refund models and input types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sugarloaf_core::{CurrencyCode, OrderId, PaymentId, PaymentMethod, PaymentStatus, RefundId,
    RefundStatus};

/// A recorded payment attempt against an order.
#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    /// Charged amount in major currency units.
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// Provider-side charge id.
    pub transaction_id: String,
    /// Rate applied to convert into the store's base currency; 1 for
    /// base-currency charges.
    pub exchange_rate: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for processing a payment.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessPaymentInput {
    pub order_id: OrderId,
    pub amount: Decimal,
    #[serde(default)]
    pub currency: CurrencyCode,
    pub method: PaymentMethod,
    /// Opaque payment source token from the client SDK.
    pub token: String,
    /// Conversion rate into the store's base currency.
    #[serde(default = "default_exchange_rate")]
    pub exchange_rate: Decimal,
}

fn default_exchange_rate() -> Decimal {
    Decimal::ONE
}

impl ProcessPaymentInput {
    /// Validate field constraints.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first violated constraint.
    pub fn validate(&self) -> Result<(), String> {
        if self.amount <= Decimal::ZERO {
            return Err("amount must be positive".to_string());
        }
        if self.token.trim().is_empty() {
            return Err("token must not be empty".to_string());
        }
        if self.exchange_rate <= Decimal::ZERO {
            return Err("exchange_rate must be positive".to_string());
        }
        Ok(())
    }
}

/// A recorded refund against an order.
#[derive(Debug, Clone, Serialize)]
pub struct Refund {
    pub id: RefundId,
    pub order_id: OrderId,
    pub amount: Decimal,
    pub reason: String,
    pub status: RefundStatus,
    /// Provider-side refund id.
    pub provider_refund_id: String,
    pub created_at: DateTime<Utc>,
}

/// Input for refunding an order.
#[derive(Debug, Clone, Deserialize)]
pub struct RefundInput {
    pub amount: Decimal,
    pub reason: String,
}

impl RefundInput {
    /// Validate field constraints.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first violated constraint.
    pub fn validate(&self) -> Result<(), String> {
        if self.amount <= Decimal::ZERO {
            return Err("amount must be positive".to_string());
        }
        if self.reason.trim().is_empty() {
            return Err("reason must not be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_input_rejects_zero_amount() {
        let input = ProcessPaymentInput {
            order_id: OrderId::from(1),
            amount: Decimal::ZERO,
            currency: CurrencyCode::USD,
            method: PaymentMethod::CreditCard,
            token: "tok_visa".to_string(),
            exchange_rate: Decimal::ONE,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn payment_input_requires_token() {
        let input = ProcessPaymentInput {
            order_id: OrderId::from(1),
            amount: Decimal::TEN,
            currency: CurrencyCode::USD,
            method: PaymentMethod::CreditCard,
            token: "  ".to_string(),
            exchange_rate: Decimal::ONE,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn refund_input_requires_reason() {
        let input = RefundInput { amount: Decimal::TEN, reason: String::new() };
        assert!(input.validate().is_err());

        let input = RefundInput { amount: Decimal::TEN, reason: "damaged".to_string() };
        assert!(input.validate().is_ok());
    }
}
