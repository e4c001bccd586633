//! Integration tests for Sugarloaf.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and run migrations
//! sl-cli migrate
//!
//! # Start the API server
//! cargo run -p sugarloaf-api
//!
//! # Run integration tests
//! cargo test -p sugarloaf-integration-tests -- --ignored
//! ```
//!
//! All tests are `#[ignore]`d by default because they need a running
//! server and database. Admin-only flows promote a freshly registered
//! user to the admin role directly in the database, so tests also need
//! `SUGARLOAF_DATABASE_URL` (or `DATABASE_URL`) pointing at the same
//! database the server uses.

use reqwest::Client;
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

/// Shared context for driving the API from tests.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
}

impl TestContext {
    /// Create a context with a cookie-holding HTTP client.
    #[must_use]
    pub fn new() -> Self {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            base_url: api_base_url(),
        }
    }

    /// Build a full URL for an API path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Register a fresh account and leave its session on the client.
    ///
    /// Returns the generated email address.
    pub async fn register_unique(&self) -> String {
        let email = unique_email();
        let resp = self
            .client
            .post(self.url("/auth/register"))
            .json(&json!({"email": email, "password": TEST_PASSWORD}))
            .send()
            .await
            .expect("Failed to register");
        assert_eq!(resp.status(), 201, "registration failed for {email}");
        email
    }

    /// Register a fresh account, promote it to admin in the database,
    /// and log back in so the session carries the admin role.
    pub async fn register_admin(&self, pool: &PgPool) -> String {
        let email = self.register_unique().await;
        promote_to_admin(pool, &email).await;

        // Role is captured in the session at login time
        let resp = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({"email": email, "password": TEST_PASSWORD}))
            .send()
            .await
            .expect("Failed to log back in");
        assert_eq!(resp.status(), 200);
        email
    }

    /// Create a product as the currently logged-in admin.
    pub async fn create_product(&self, title: &str, price: &str, stock: i32) -> Value {
        let resp = self
            .client
            .post(self.url("/products"))
            .json(&json!({
                "title": title,
                "description": "integration test product",
                "price": price,
                "stock": stock,
                "category": "test",
                "images": ["https://cdn.example.com/test.jpg"],
            }))
            .send()
            .await
            .expect("Failed to create product");
        assert_eq!(resp.status(), 201);
        resp.json().await.expect("Failed to parse product")
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Password used by every test account.
pub const TEST_PASSWORD: &str = "integration-test-pw";

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn api_base_url() -> String {
    std::env::var("SUGARLOAF_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

/// Generate an email address no other test run has used.
#[must_use]
pub fn unique_email() -> String {
    format!("it-{}@example.com", Uuid::new_v4().simple())
}

/// Connect to the database the server under test is using.
pub async fn test_pool() -> PgPool {
    let url = std::env::var("SUGARLOAF_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("SUGARLOAF_DATABASE_URL or DATABASE_URL must be set");
    PgPool::connect(&url).await.expect("Failed to connect to database")
}

/// Flip a registered account to the admin role.
pub async fn promote_to_admin(pool: &PgPool, email: &str) {
    sqlx::query("UPDATE shop.\"user\" SET role = 'admin' WHERE email = $1")
        .bind(email)
        .execute(pool)
        .await
        .expect("Failed to promote user to admin");
}
