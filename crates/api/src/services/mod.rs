//! Business services: pure pricing math, the payment provider client,
//! webhook signature verification, and outbound email.

pub mod email;
pub mod pricing;
pub mod stripe;
pub mod webhook;

pub use email::EmailService;
pub use stripe::{ChargeRequest, GatewayError, PaymentGateway, StripeGateway};
