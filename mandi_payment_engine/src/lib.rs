//! Mandi Payment Engine
//!
//! The settlement core of the Mandi marketplace: it owns the lifecycle of orders and the transactions that
//! collect payment for them, and applies state transitions driven by checkout actions and by verified gateway
//! callbacks or polls. It is transport-agnostic; the HTTP surface lives in `mandi_payment_server`.
//!
//! The library is divided into three main sections:
//! 1. Database management ([`mod@traits`] and the SQLite backend). Business code never reaches for SQL
//!    directly; it goes through the repository traits, so the storage engine is swappable without touching
//!    the ledger logic.
//! 2. The ledger API ([`LedgerApi`]), the single authorized mutator of order/transaction state. It owns the
//!    idempotency and conflict rules that make at-least-once webhook delivery safe.
//! 3. Settlement events ([`mod@events`]). A small actor-style hook system publishes
//!    `OrderConfirmed`/`PaymentFailed` events on fresh transitions so that notification dispatch and other
//!    side effects stay out of the state machine.

pub mod db_types;
pub mod events;
mod ledger;
mod sqlite;
pub mod traits;

#[cfg(feature = "test_utils")]
pub mod test_utils;

pub use ledger::LedgerApi;
pub use sqlite::{db::run_migrations, SqliteDatabase};
