//! Payment route handlers: synchronous charges and the provider
//! webhook.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use chrono::Utc;
use secrecy::ExposeSecret;
use tracing::instrument;

use sugarloaf_core::{OrderStatus, PaymentMethod, PaymentStatus, to_minor_units};

use crate::db::{OrderRepository, PaymentRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, Payment, ProcessPaymentInput};
use crate::services::webhook::{self, DEFAULT_TOLERANCE_SECS};
use crate::services::{ChargeRequest, EmailService};
use crate::state::AppState;

/// Header carrying the provider webhook signature.
const SIGNATURE_HEADER: &str = "stripe-signature";

/// `POST /payments` - charge a pending order.
///
/// Only `credit_card` is supported; the charge carries an
/// order-derived idempotency key so a client retry can never charge
/// twice. On success the payment is recorded and the order confirmed.
#[instrument(skip(state, user, input))]
pub async fn process(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<ProcessPaymentInput>,
) -> Result<(StatusCode, Json<Payment>)> {
    input.validate().map_err(AppError::BadRequest)?;
    if input.method != PaymentMethod::CreditCard {
        return Err(AppError::BadRequest(format!(
            "payment method '{}' is not supported",
            input.method
        )));
    }

    let orders = OrderRepository::new(state.pool());
    let order = orders
        .get(input.order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {} not found", input.order_id)))?;
    if order.user_id != user.id {
        return Err(AppError::Forbidden("order belongs to another user".to_string()));
    }
    if order.status != OrderStatus::Pending {
        return Err(AppError::Conflict(format!(
            "order {} is {}, only pending orders can be charged",
            order.id, order.status
        )));
    }

    let amount_minor = to_minor_units(input.amount)
        .map_err(|e| AppError::BadRequest(format!("invalid amount: {e}")))?;

    let receipt = state
        .gateway()
        .create_charge(&ChargeRequest {
            amount_minor,
            currency: input.currency,
            source_token: input.token.clone(),
            idempotency_key: format!("order-{}-charge", order.id),
            description: format!("Sugarloaf order #{}", order.id),
        })
        .await?;

    let payments = PaymentRepository::new(state.pool());
    let payment = payments
        .record_charge(
            order.id,
            input.amount,
            input.currency,
            input.method,
            &receipt.transaction_id,
            input.exchange_rate,
        )
        .await?;
    tracing::info!(order_id = %order.id, payment_id = %payment.id, "payment completed");

    notify_payment_receipt(state.mailer().cloned(), &user, &payment);

    Ok((StatusCode::CREATED, Json(payment)))
}

/// `POST /payments/webhook` - provider event delivery.
///
/// The signature is verified over the raw body before anything is
/// parsed; a bad signature is a 401 and nothing is persisted. Known
/// events reconcile payment and order state idempotently; unknown
/// events are logged and acknowledged so the provider stops retrying.
#[instrument(skip(state, headers, body))]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing webhook signature".to_string()))?;

    let event = webhook::verify_and_parse(
        &body,
        signature,
        state.config().stripe.webhook_secret.expose_secret(),
        Utc::now().timestamp(),
        DEFAULT_TOLERANCE_SECS,
    )
    .map_err(|err| AppError::Unauthorized(format!("webhook rejected: {err}")))?;

    let status = match event.event_type.as_str() {
        "charge.succeeded" | "payment_intent.succeeded" => PaymentStatus::Completed,
        "charge.failed" | "payment_intent.payment_failed" => PaymentStatus::Failed,
        other => {
            tracing::info!(event = %event.id, event_type = other, "ignoring webhook event");
            return Ok(StatusCode::OK);
        }
    };

    let payments = PaymentRepository::new(state.pool());
    let updated = payments
        .reconcile_transaction(&event.data.object.id, status)
        .await?;
    if updated {
        tracing::info!(
            event = %event.id,
            transaction_id = %event.data.object.id,
            status = %status,
            "webhook reconciled payment"
        );
    } else {
        tracing::debug!(
            event = %event.id,
            transaction_id = %event.data.object.id,
            "webhook was a no-op (unknown or already-settled transaction)"
        );
    }

    Ok(StatusCode::OK)
}

/// Best-effort payment receipt email, spawned after the records are
/// written.
fn notify_payment_receipt(mailer: Option<EmailService>, user: &CurrentUser, payment: &Payment) {
    let Some(mailer) = mailer else {
        return;
    };
    let to = user.email.clone();
    let order_id = payment.order_id;
    let amount = payment.amount;
    tokio::spawn(async move {
        if let Err(err) = mailer.send_payment_receipt(&to, order_id, amount).await {
            tracing::warn!(%order_id, error = %err, "payment receipt email failed");
        }
    });
}
