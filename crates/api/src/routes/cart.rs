//! Cart route handlers.
//!
//! All cart routes operate on the authenticated user's own cart. Writes
//! that lose an optimistic-concurrency race are retried once before the
//! Conflict is surfaced.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use sugarloaf_core::CartItemId;

use crate::db::{CartRepository, CouponRepository, ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{AddItemInput, Cart, UpdateItemInput};
use crate::services::pricing;
use crate::state::AppState;

/// Response for a successful coupon application.
#[derive(Debug, Serialize)]
pub struct AppliedCoupon {
    pub cart: Cart,
    pub original_total: Decimal,
    pub discount_amount: Decimal,
    pub new_total: Decimal,
}

/// Request body for applying a coupon.
#[derive(Debug, Deserialize)]
pub struct ApplyCouponInput {
    pub code: String,
}

/// `GET /cart` - the current user's cart.
#[instrument(skip(state, user))]
pub async fn get(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Cart>> {
    let repo = CartRepository::new(state.pool());
    let cart = repo
        .get_by_user(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("cart is empty".to_string()))?;
    Ok(Json(cart))
}

/// `POST /cart/items` - add an item, merging duplicate lines.
#[instrument(skip(state, user, input))]
pub async fn add_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<AddItemInput>,
) -> Result<(StatusCode, Json<Cart>)> {
    input.validate().map_err(AppError::BadRequest)?;

    let products = ProductRepository::new(state.pool());
    let product = products
        .get(input.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {} not found", input.product_id)))?;

    let repo = CartRepository::new(state.pool());
    let cart = retry_once(|| repo.add_item(user.id, &input, product.price)).await?;
    Ok((StatusCode::CREATED, Json(cart)))
}

/// `PATCH /cart/items/{item_id}` - increment, decrement, or set a
/// line's quantity.
#[instrument(skip(state, user, input))]
pub async fn update_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(item_id): Path<CartItemId>,
    Json(input): Json<UpdateItemInput>,
) -> Result<Json<Cart>> {
    input.validate().map_err(AppError::BadRequest)?;

    let repo = CartRepository::new(state.pool());
    let cart =
        retry_once(|| repo.update_item(user.id, item_id, input.action, input.amount())).await?;
    Ok(Json(cart))
}

/// `DELETE /cart/items/{item_id}` - remove a line. Removing an id that
/// is not in the cart succeeds silently.
#[instrument(skip(state, user))]
pub async fn remove_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(item_id): Path<CartItemId>,
) -> Result<Json<Cart>> {
    let repo = CartRepository::new(state.pool());
    let cart = retry_once(|| repo.remove_item(user.id, item_id)).await?;
    Ok(Json(cart))
}

/// Why a coupon could not be applied. Distinct from repository errors
/// so the optimistic-concurrency retry only fires on `Conflict`.
enum CouponRejection {
    MissingCart,
    InvalidCoupon,
    BelowMinimum(Decimal),
}

/// `POST /cart/coupon` - validate a coupon against the cart and apply
/// its discount.
#[instrument(skip(state, user, input))]
pub async fn apply_coupon(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<ApplyCouponInput>,
) -> Result<Json<AppliedCoupon>> {
    let carts = CartRepository::new(state.pool());
    let coupons = CouponRepository::new(state.pool());

    let apply = || async {
        let Some(cart) = carts.get_by_user(user.id).await? else {
            return Ok(Err(CouponRejection::MissingCart));
        };

        let Some(coupon) = coupons
            .find_by_code(&input.code)
            .await?
            .filter(|c| c.is_redeemable_at(Utc::now()))
        else {
            return Ok(Err(CouponRejection::InvalidCoupon));
        };

        if !coupon.meets_minimum(cart.subtotal) {
            // Checked inside the closure so a concurrent cart change is
            // re-evaluated on retry.
            return Ok(Err(CouponRejection::BelowMinimum(
                coupon.min_cart_value.unwrap_or_default(),
            )));
        }

        let outcome = pricing::apply_discount(&cart.items, cart.subtotal, &coupon);
        let subtotal = cart.subtotal;
        let cart = carts
            .apply_coupon(user.id, cart.id, cart.version, &coupon.code, &outcome)
            .await?;

        Ok(Ok(AppliedCoupon {
            original_total: subtotal,
            discount_amount: outcome.discount_amount,
            new_total: outcome.total,
            cart,
        }))
    };

    let applied = match apply().await {
        Err(RepositoryError::Conflict(_)) => apply().await,
        other => other,
    };

    match applied {
        Ok(Ok(applied)) => Ok(Json(applied)),
        Ok(Err(CouponRejection::MissingCart)) => {
            Err(AppError::NotFound("cart not found".to_string()))
        }
        Ok(Err(CouponRejection::InvalidCoupon)) => {
            Err(AppError::NotFound("coupon is invalid or expired".to_string()))
        }
        Ok(Err(CouponRejection::BelowMinimum(minimum))) => Err(AppError::BadRequest(format!(
            "Minimum cart value of {minimum} required"
        ))),
        Err(err) => Err(err.into()),
    }
}

/// `DELETE /cart` - empty the cart.
#[instrument(skip(state, user))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Cart>> {
    let repo = CartRepository::new(state.pool());
    let cart = retry_once(|| repo.clear(user.id)).await?;
    Ok(Json(cart))
}

/// Run a cart mutation, retrying once if it loses the
/// optimistic-concurrency race.
async fn retry_once<F, Fut>(mut operation: F) -> Result<Cart>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<Cart, RepositoryError>>,
{
    match operation().await {
        Err(RepositoryError::Conflict(_)) => {
            tracing::debug!("cart mutation lost a race, retrying");
            Ok(operation().await?)
        }
        other => Ok(other?),
    }
}
