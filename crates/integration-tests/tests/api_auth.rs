//! Integration tests for account registration and sessions.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The API server running (cargo run -p sugarloaf-api)
//!
//! Run with: cargo test -p sugarloaf-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::json;

use sugarloaf_integration_tests::{TEST_PASSWORD, TestContext, unique_email};

#[tokio::test]
#[ignore = "Requires running API server"]
async fn register_login_logout_roundtrip() {
    let ctx = TestContext::new();
    let email = unique_email();

    let resp = ctx
        .client
        .post(ctx.url("/auth/register"))
        .json(&json!({"email": email, "password": TEST_PASSWORD}))
        .send()
        .await
        .expect("register request failed");
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Session cookie from registration should let us read the cart
    let resp = ctx
        .client
        .get(ctx.url("/cart"))
        .send()
        .await
        .expect("cart request failed");
    assert_ne!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = ctx
        .client
        .post(ctx.url("/auth/logout"))
        .send()
        .await
        .expect("logout request failed");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // After logout the cart is no longer reachable
    let resp = ctx
        .client
        .get(ctx.url("/cart"))
        .send()
        .await
        .expect("cart request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = ctx
        .client
        .post(ctx.url("/auth/login"))
        .json(&json!({"email": email, "password": TEST_PASSWORD}))
        .send()
        .await
        .expect("login request failed");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn duplicate_registration_conflicts() {
    let ctx = TestContext::new();
    let email = ctx.register_unique().await;

    let resp = ctx
        .client
        .post(ctx.url("/auth/register"))
        .json(&json!({"email": email, "password": TEST_PASSWORD}))
        .send()
        .await
        .expect("register request failed");
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn wrong_password_is_unauthorized() {
    let ctx = TestContext::new();
    let email = ctx.register_unique().await;

    let resp = ctx
        .client
        .post(ctx.url("/auth/login"))
        .json(&json!({"email": email, "password": "not the password"}))
        .send()
        .await
        .expect("login request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Unknown accounts get the same answer as bad passwords
    let resp = ctx
        .client
        .post(ctx.url("/auth/login"))
        .json(&json!({"email": unique_email(), "password": TEST_PASSWORD}))
        .send()
        .await
        .expect("login request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn short_password_is_rejected() {
    let ctx = TestContext::new();

    let resp = ctx
        .client
        .post(ctx.url("/auth/register"))
        .json(&json!({"email": unique_email(), "password": "short"}))
        .send()
        .await
        .expect("register request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
