//! Email service for order and payment notifications.
//!
//! Uses SMTP via lettre. Notifications are best-effort: callers spawn
//! them after committing and log failures instead of surfacing them.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use thiserror::Error;

use sugarloaf_core::OrderId;

use crate::config::EmailConfig;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("invalid email address: {0}")]
    InvalidAddress(String),
}

/// Email service for transactional notifications.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self { mailer, from_address: config.from_address.clone() })
    }

    /// Send an order confirmation.
    ///
    /// # Errors
    ///
    /// Returns `EmailError` if the message cannot be built or sent.
    pub async fn send_order_confirmation(
        &self,
        to: &str,
        order_id: OrderId,
        total: Decimal,
    ) -> Result<(), EmailError> {
        let body = format!(
            "Thanks for your order!\n\n\
             Order number: {order_id}\n\
             Order total: {total}\n\n\
             We'll let you know as soon as it ships.\n"
        );
        self.send_plain_text(to, &format!("Order #{order_id} received"), &body)
            .await
    }

    /// Send a payment receipt.
    ///
    /// # Errors
    ///
    /// Returns `EmailError` if the message cannot be built or sent.
    pub async fn send_payment_receipt(
        &self,
        to: &str,
        order_id: OrderId,
        amount: Decimal,
    ) -> Result<(), EmailError> {
        let body = format!(
            "We received your payment of {amount} for order #{order_id}.\n\n\
             Your order is confirmed and being prepared.\n"
        );
        self.send_plain_text(to, &format!("Payment received for order #{order_id}"), &body)
            .await
    }

    async fn send_plain_text(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), EmailError> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to.parse().map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        self.mailer.send(message).await?;
        Ok(())
    }
}
