//! Coupon route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use sugarloaf_core::CouponId;

use crate::db::CouponRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, require_catalog_manager};
use crate::models::{Coupon, CouponValidation, CreateCouponInput};
use crate::state::AppState;

/// Query parameters for coupon validation.
#[derive(Debug, Deserialize)]
pub struct ValidateQuery {
    /// Cart subtotal to check `min_cart_value` against.
    pub cart_total: Decimal,
}

/// `POST /coupons` - create a coupon (admin).
#[instrument(skip(state, user, input))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<CreateCouponInput>,
) -> Result<(StatusCode, Json<Coupon>)> {
    require_catalog_manager(&user)?;
    input.validate().map_err(AppError::BadRequest)?;

    let repo = CouponRepository::new(state.pool());
    let coupon = repo.create(&input).await?;
    tracing::info!(coupon = %coupon.code, "coupon created");
    Ok((StatusCode::CREATED, Json(coupon)))
}

/// `GET /coupons` - list coupons, soonest-expiring first (admin).
#[instrument(skip(state, user))]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Coupon>>> {
    require_catalog_manager(&user)?;

    let repo = CouponRepository::new(state.pool());
    Ok(Json(repo.list().await?))
}

/// `GET /coupons/{code}/validate?cart_total=...` - check a code.
///
/// A missing, inactive, or out-of-window coupon is a 404. A coupon that
/// exists but needs a larger cart answers 200 with `valid: false` and
/// an explanatory message; redeemability is always re-checked against
/// the clock, never cached.
#[instrument(skip(state))]
pub async fn validate(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<ValidateQuery>,
) -> Result<Json<CouponValidation>> {
    let repo = CouponRepository::new(state.pool());
    let coupon = repo
        .find_by_code(&code)
        .await?
        .filter(|c| c.is_redeemable_at(Utc::now()))
        .ok_or_else(|| AppError::NotFound("coupon is invalid or expired".to_string()))?;

    if !coupon.meets_minimum(query.cart_total) {
        let minimum = coupon.min_cart_value.unwrap_or_default();
        return Ok(Json(CouponValidation::invalid(format!(
            "Minimum cart value of {minimum} required"
        ))));
    }

    Ok(Json(CouponValidation::valid(&coupon)))
}

/// `POST /coupons/{id}/deactivate` - deactivate a coupon (admin).
///
/// Never retroactive: carts and orders that already applied it keep
/// their discounts.
#[instrument(skip(state, user))]
pub async fn deactivate(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<CouponId>,
) -> Result<Json<Coupon>> {
    require_catalog_manager(&user)?;

    let repo = CouponRepository::new(state.pool());
    let coupon = repo.deactivate(id).await?;
    tracing::info!(coupon = %coupon.code, "coupon deactivated");
    Ok(Json(coupon))
}
