//! Application state shared across request handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::services::{EmailService, PaymentGateway};

/// Shared application state, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    gateway: Arc<dyn PaymentGateway>,
    /// `None` when SMTP is not configured; notifications are skipped.
    mailer: Option<EmailService>,
}

impl AppState {
    /// Build the application state. The payment gateway is injected so
    /// tests can substitute a fake.
    #[must_use]
    pub fn new(
        config: ApiConfig,
        pool: PgPool,
        gateway: Arc<dyn PaymentGateway>,
        mailer: Option<EmailService>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, pool, gateway, mailer }),
        }
    }

    /// Application configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Payment provider gateway.
    #[must_use]
    pub fn gateway(&self) -> &Arc<dyn PaymentGateway> {
        &self.inner.gateway
    }

    /// Outbound email service, if configured.
    #[must_use]
    pub fn mailer(&self) -> Option<&EmailService> {
        self.inner.mailer.as_ref()
    }
}
