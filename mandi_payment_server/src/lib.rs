//! # Mandi payment server
//! The HTTP surface of the Mandi marketplace's payment-collection core. It is responsible for:
//! * the vendor-side checkout flow (fee computation, order + transaction creation, gateway hand-off),
//! * receiving and authenticating the gateway's payment webhooks and driving the settlement ledger,
//! * the background reconciliation sweep for payments whose webhook never arrived,
//! * draining the durable notification outbox to the delivery collaborator.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: liveness check.
//! * `/api/checkout`: vendor checkout; answers with the gateway's hosted payment URL.
//! * `/api/orders/{id}`: order detail for a party to the order.
//! * `/api/orders/{id}/abandon`: vendor abandons an unpaid checkout.
//! * `/api/orders/{id}/fulfilment`: supplier-side fulfilment progression.
//! * `/wh/payment`: the gateway's MAC-authenticated settlement callback.

pub mod auth;
pub mod checkout;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod notify;
pub mod reconciliation;
pub mod routes;
pub mod server;
pub mod webhook;

#[cfg(test)]
mod endpoint_tests;
