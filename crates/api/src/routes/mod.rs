//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                    - Liveness check
//! GET  /health/ready              - Readiness check (database ping)
//!
//! # Auth
//! POST /auth/register             - Create an account
//! POST /auth/login                - Log in (session cookie)
//! POST /auth/logout               - Log out
//!
//! # Products
//! GET    /products                - List/search products (q, category, price range)
//! GET    /products/{id}           - Product detail
//! POST   /products                - Create product (admin)
//! PATCH  /products/{id}           - Update product (admin)
//! DELETE /products/{id}           - Delete product (admin)
//!
//! # Cart (requires auth)
//! GET    /cart                    - Current user's cart
//! POST   /cart/items              - Add item (merges duplicate lines)
//! PATCH  /cart/items/{item_id}    - increment / decrement / set quantity
//! DELETE /cart/items/{item_id}    - Remove a line
//! POST   /cart/coupon             - Apply a coupon to the cart
//! DELETE /cart                    - Empty the cart
//!
//! # Coupons
//! POST /coupons                   - Create coupon (admin)
//! GET  /coupons                   - List coupons (admin)
//! GET  /coupons/{code}/validate   - Check a code against a cart total
//! POST /coupons/{id}/deactivate   - Deactivate (admin)
//!
//! # Orders (requires auth)
//! POST   /orders                  - Place an order (decrements stock)
//! GET    /orders/{id}             - Order detail (owner or admin)
//! PATCH  /orders/{id}/status      - Status transition (admin)
//! POST   /orders/{id}/tracking    - Attach tracking (admin)
//! POST   /orders/{id}/refund      - Refund through the provider (admin)
//! DELETE /orders/{id}             - Hard-delete (admin)
//!
//! # Payments
//! POST /payments                  - Charge an order (requires auth)
//! POST /payments/webhook          - Provider webhook (signature-verified)
//! ```

pub mod auth;
pub mod cart;
pub mod coupons;
pub mod orders;
pub mod payments;
pub mod products;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::search).post(products::create))
        .route(
            "/{id}",
            get(products::get).patch(products::update).delete(products::remove),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::get).delete(cart::clear))
        .route("/items", post(cart::add_item))
        .route(
            "/items/{item_id}",
            patch(cart::update_item).delete(cart::remove_item),
        )
        .route("/coupon", post(cart::apply_coupon))
}

/// Create the coupon routes router.
pub fn coupon_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(coupons::create).get(coupons::list))
        .route("/{code}/validate", get(coupons::validate))
        .route("/{id}/deactivate", post(coupons::deactivate))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::create))
        .route("/{id}", get(orders::get).delete(orders::remove))
        .route("/{id}/status", patch(orders::update_status))
        .route("/{id}/tracking", post(orders::add_tracking))
        .route("/{id}/refund", post(orders::process_refund))
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(payments::process))
        .route("/webhook", post(payments::webhook))
}

/// Assemble all application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/coupons", coupon_routes())
        .nest("/orders", order_routes())
        .nest("/payments", payment_routes())
}
