//! Integration tests for the product catalog.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The API server running (cargo run -p sugarloaf-api)
//! - `SUGARLOAF_DATABASE_URL` pointing at the server's database
//!
//! Run with: cargo test -p sugarloaf-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

use sugarloaf_integration_tests::{TestContext, test_pool};

#[tokio::test]
#[ignore = "Requires running API server and database access"]
async fn admin_can_create_update_and_delete_products() {
    let ctx = TestContext::new();
    let pool = test_pool().await;
    ctx.register_admin(&pool).await;

    let title = format!("Test Widget {}", Uuid::new_v4().simple());
    let product = ctx.create_product(&title, "19.99", 10).await;
    let id = product["id"].as_i64().expect("product id");

    // Anonymous detail fetch
    let resp = reqwest::get(ctx.url(&format!("/products/{id}")))
        .await
        .expect("get request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("parse product");
    assert_eq!(body["title"], title.as_str());
    assert_eq!(body["stock"], 10);

    let resp = ctx
        .client
        .patch(ctx.url(&format!("/products/{id}")))
        .json(&json!({"price": "24.99", "featured": true}))
        .send()
        .await
        .expect("patch request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("parse product");
    assert_eq!(body["featured"], true);

    let resp = ctx
        .client
        .delete(ctx.url(&format!("/products/{id}")))
        .send()
        .await
        .expect("delete request failed");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = reqwest::get(ctx.url(&format!("/products/{id}")))
        .await
        .expect("get request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn customers_cannot_manage_the_catalog() {
    let ctx = TestContext::new();
    ctx.register_unique().await;

    let resp = ctx
        .client
        .post(ctx.url("/products"))
        .json(&json!({
            "title": "Not Allowed",
            "description": "integration test product",
            "price": "1.00",
            "stock": 1,
            "category": "test",
        }))
        .send()
        .await
        .expect("create request failed");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running API server and database access"]
async fn search_supports_paging_and_filters() {
    let ctx = TestContext::new();
    let pool = test_pool().await;
    ctx.register_admin(&pool).await;

    let marker = Uuid::new_v4().simple().to_string();
    for i in 0..3 {
        ctx.create_product(&format!("Paging {marker} {i}"), "5.00", 5).await;
    }

    let resp = reqwest::get(ctx.url(&format!("/products?q={marker}&limit=2")))
        .await
        .expect("search request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("parse page");

    assert_eq!(body["products"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["meta"]["total"], 3);
    assert_eq!(body["meta"]["pages"], 2);

    let resp = reqwest::get(ctx.url(&format!("/products?q={marker}&limit=2&page=2")))
        .await
        .expect("search request failed");
    let body: Value = resp.json().await.expect("parse page");
    assert_eq!(body["products"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
#[ignore = "Requires running API server and database access"]
async fn invalid_product_input_is_rejected() {
    let ctx = TestContext::new();
    let pool = test_pool().await;
    ctx.register_admin(&pool).await;

    let resp = ctx
        .client
        .post(ctx.url("/products"))
        .json(&json!({
            "title": "",
            "description": "integration test product",
            "price": "1.00",
            "stock": 1,
            "category": "test",
        }))
        .send()
        .await
        .expect("create request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = ctx
        .client
        .post(ctx.url("/products"))
        .json(&json!({
            "title": "Negative",
            "description": "integration test product",
            "price": "-1.00",
            "stock": 1,
            "category": "test",
        }))
        .send()
        .await
        .expect("create request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
