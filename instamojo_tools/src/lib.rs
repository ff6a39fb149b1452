//! Client for the Instamojo payment-request API.
//!
//! The gateway hosts the actual checkout page: we create a payment request, redirect the buyer to the returned
//! `longurl`, and learn the outcome later through a MAC-authenticated webhook (or by polling). This crate owns the
//! outbound calls and the webhook authenticity check; it holds no order state.

mod api;
mod config;
mod data_objects;
mod error;
mod mac;
mod validation;

pub use api::InstamojoApi;
pub use config::InstamojoConfig;
pub use data_objects::{NewPaymentRequest, PaymentRequest, PollStatus, WebhookPayload};
pub use error::GatewayError;
pub use mac::{callback_mac, CallbackVerifier};
pub use validation::{validate_payment_request, MIN_PAYMENT_REQUEST, MIN_PURPOSE_LEN};
