//! Persistence interfaces for the settlement ledger.
//!
//! Business logic depends on these narrow, per-entity repositories rather than on any particular storage
//! engine. [`crate::SqliteDatabase`] is the shipped implementation; swapping the engine means implementing
//! these traits and nothing else.

mod ledger_database;

pub use ledger_database::{LedgerDatabase, LedgerError, OrderRepository, TransactionRepository};
