//! Product catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Serialize;
use tracing::instrument;

use sugarloaf_core::ProductId;

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, require_catalog_manager};
use crate::models::{CreateProductInput, PageMeta, Product, ProductFilter, UpdateProductInput};
use crate::state::AppState;

/// Paginated product listing.
#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub meta: PageMeta,
}

/// `GET /products` - list and search the catalog.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<ProductPage>> {
    let repo = ProductRepository::new(state.pool());
    let (products, total) = repo.search(&filter).await?;
    let meta = PageMeta::new(filter.page(), filter.limit(), total);
    Ok(Json(ProductPage { products, meta }))
}

/// `GET /products/{id}` - product detail.
#[instrument(skip(state))]
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let repo = ProductRepository::new(state.pool());
    let product = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id} not found")))?;
    Ok(Json(product))
}

/// `POST /products` - create a product (admin).
#[instrument(skip(state, user, input))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<CreateProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    require_catalog_manager(&user)?;
    input.validate().map_err(AppError::BadRequest)?;

    let repo = ProductRepository::new(state.pool());
    let product = repo.create(&input).await?;
    tracing::info!(product_id = %product.id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// `PATCH /products/{id}` - partial update (admin).
#[instrument(skip(state, user, update))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ProductId>,
    Json(update): Json<UpdateProductInput>,
) -> Result<Json<Product>> {
    require_catalog_manager(&user)?;
    if update.is_empty() {
        return Err(AppError::BadRequest("no fields to update".to_string()));
    }
    update.validate().map_err(AppError::BadRequest)?;

    let repo = ProductRepository::new(state.pool());
    let product = repo.update(id, &update).await?;
    Ok(Json(product))
}

/// `DELETE /products/{id}` - delete a product (admin).
#[instrument(skip(state, user))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    require_catalog_manager(&user)?;

    let repo = ProductRepository::new(state.pool());
    repo.delete(id).await?;
    tracing::info!(product_id = %id, "product deleted");
    Ok(StatusCode::NO_CONTENT)
}
