//! Order route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use sugarloaf_core::{OrderId, OrderStatus, to_minor_units};

use crate::db::{OrderRepository, PaymentRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, require_order_manager};
use crate::models::{CreateOrderInput, CurrentUser, Order, Refund, RefundInput, TrackingInput};
use crate::services::pricing;
use crate::state::AppState;

/// Request body for a status transition.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusInput {
    pub status: OrderStatus,
}

/// `POST /orders` - place an order.
///
/// The total is computed from the submitted snapshot prices; stock is
/// conditionally decremented in the same transaction, so an
/// out-of-stock line aborts the whole order with a 409.
#[instrument(skip(state, user, input))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<CreateOrderInput>,
) -> Result<(StatusCode, Json<Order>)> {
    input.validate().map_err(AppError::BadRequest)?;

    let total = pricing::order_total(&input.items);
    let repo = OrderRepository::new(state.pool());
    let order = repo.create(user.id, &input, total).await?;
    tracing::info!(order_id = %order.id, %total, "order placed");

    notify_order_confirmation(&state, &user, &order);

    Ok((StatusCode::CREATED, Json(order)))
}

/// `GET /orders/{id}` - order detail, visible to its owner or an order
/// manager.
#[instrument(skip(state, user))]
pub async fn get(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = fetch_order(&state, id).await?;
    if order.user_id != user.id {
        require_order_manager(&user)?;
    }
    Ok(Json(order))
}

/// `PATCH /orders/{id}/status` - move an order along its lifecycle
/// (admin).
///
/// Forward progression is pending → confirmed → processing → shipped →
/// delivered; cancelled and refunded are reachable from any non-terminal
/// state. Anything else is a 400.
#[instrument(skip(state, user, input))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
    Json(input): Json<UpdateStatusInput>,
) -> Result<Json<Order>> {
    require_order_manager(&user)?;

    let order = fetch_order(&state, id).await?;
    if !order.status.can_transition_to(input.status) {
        return Err(AppError::BadRequest(format!(
            "cannot move order from {} to {}",
            order.status, input.status
        )));
    }

    let repo = OrderRepository::new(state.pool());
    let order = repo.set_status(id, order.status, input.status).await?;
    tracing::info!(order_id = %id, status = %input.status, "order status updated");
    Ok(Json(order))
}

/// `POST /orders/{id}/tracking` - attach shipment tracking (admin).
#[instrument(skip(state, user, input))]
pub async fn add_tracking(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
    Json(input): Json<TrackingInput>,
) -> Result<Json<Order>> {
    require_order_manager(&user)?;
    input.validate().map_err(AppError::BadRequest)?;

    let repo = OrderRepository::new(state.pool());
    let order = repo.add_tracking(id, &input.into()).await?;
    Ok(Json(order))
}

/// `POST /orders/{id}/refund` - refund an order through the provider
/// (admin).
///
/// The provider call happens first; only on success are the refund
/// record, the payment status, and the order status written, in one
/// transaction. A provider failure leaves every row untouched.
#[instrument(skip(state, user, input))]
pub async fn process_refund(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
    Json(input): Json<RefundInput>,
) -> Result<Json<Refund>> {
    require_order_manager(&user)?;
    input.validate().map_err(AppError::BadRequest)?;

    let order = fetch_order(&state, id).await?;
    let transaction_id = order.payment_transaction_id.ok_or_else(|| {
        AppError::BadRequest("order has no recorded payment to refund".to_string())
    })?;
    if input.amount > order.total {
        return Err(AppError::BadRequest("refund exceeds the order total".to_string()));
    }

    let amount_minor = to_minor_units(input.amount)
        .map_err(|e| AppError::BadRequest(format!("invalid refund amount: {e}")))?;

    let receipt = state
        .gateway()
        .create_refund(&transaction_id, amount_minor)
        .await?;

    let payments = PaymentRepository::new(state.pool());
    let refund = payments
        .record_refund(id, &transaction_id, input.amount, &input.reason, &receipt.refund_id)
        .await?;
    tracing::info!(order_id = %id, refund_id = %refund.id, "order refunded");
    Ok(Json(refund))
}

/// `DELETE /orders/{id}` - hard-delete an order (admin).
#[instrument(skip(state, user))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<StatusCode> {
    require_order_manager(&user)?;

    let repo = OrderRepository::new(state.pool());
    repo.delete(id).await?;
    tracing::info!(order_id = %id, "order deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_order(state: &AppState, id: OrderId) -> Result<Order> {
    OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))
}

/// Best-effort order confirmation email, spawned after commit. Failures
/// are logged, never surfaced.
fn notify_order_confirmation(state: &AppState, user: &CurrentUser, order: &Order) {
    let Some(mailer) = state.mailer().cloned() else {
        return;
    };
    let to = user.email.clone();
    let order_id = order.id;
    let total = order.total;
    tokio::spawn(async move {
        if let Err(err) = mailer.send_order_confirmation(&to, order_id, total).await {
            tracing::warn!(%order_id, error = %err, "order confirmation email failed");
        }
    });
}
