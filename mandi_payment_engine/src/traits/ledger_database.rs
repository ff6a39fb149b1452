use std::future::Future;

use chrono::Duration;
use thiserror::Error;

use crate::db_types::{
    NewOrder,
    NewTransaction,
    Notification,
    Order,
    OrderId,
    OrderStatusType,
    OutcomeApplied,
    PaymentOutcome,
    PaymentRequestId,
    Transaction,
    TransactionStatus,
};

/// Read/write access to orders, keyed by the public order id.
pub trait OrderRepository {
    /// Stores a new order together with its first (pending) collection attempt in a single atomic unit of
    /// work. Either both rows exist afterwards or neither does.
    fn insert_order_with_transaction(
        &self,
        order: NewOrder,
        transaction: NewTransaction,
    ) -> impl Future<Output = Result<(Order, Transaction), LedgerError>> + Send;

    fn fetch_order_by_order_id(
        &self,
        order_id: &OrderId,
    ) -> impl Future<Output = Result<Option<Order>, LedgerError>> + Send;

    /// Moves an order from `from` to `to` along the supplier-driven fulfilment chain.
    ///
    /// The update only lands if the order is currently in `from` **and** its payment has settled; an unpaid
    /// order cannot leave `Pending` through this path no matter what `from`/`to` claim.
    fn update_fulfilment_status(
        &self,
        order_id: &OrderId,
        from: OrderStatusType,
        to: OrderStatusType,
    ) -> impl Future<Output = Result<Order, LedgerError>> + Send;
}

/// Read/write access to collection attempts.
pub trait TransactionRepository {
    fn fetch_transaction(
        &self,
        transaction_id: i64,
    ) -> impl Future<Output = Result<Option<Transaction>, LedgerError>> + Send;

    fn fetch_transaction_by_payment_request(
        &self,
        payment_request_id: &PaymentRequestId,
    ) -> impl Future<Output = Result<Option<Transaction>, LedgerError>> + Send;

    /// Records the gateway's assigned payment request id against a transaction that does not have one yet.
    fn attach_payment_request(
        &self,
        transaction_id: i64,
        payment_request_id: &PaymentRequestId,
    ) -> impl Future<Output = Result<Transaction, LedgerError>> + Send;

    /// Transactions that have sat in `Pending` for longer than `max_age`. Fodder for the reconciliation
    /// sweep.
    fn fetch_stale_pending_transactions(
        &self,
        max_age: Duration,
    ) -> impl Future<Output = Result<Vec<Transaction>, LedgerError>> + Send;
}

/// The full ledger backend: both repositories plus the cross-entity settlement transitions that must be
/// atomic over order, transaction and the notification outbox together.
pub trait LedgerDatabase: OrderRepository + TransactionRepository {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Applies a settlement outcome to a transaction and its order.
    ///
    /// Safe under concurrent and duplicate delivery: the transition claims the row with an optimistic
    /// "still pending" guard, so exactly one caller performs it. A replay of an outcome the transaction
    /// already terminally carries returns [`OutcomeApplied::AlreadyApplied`] without touching anything;
    /// a *different* terminal state is a [`LedgerError::StateConflict`] and must never be overwritten.
    ///
    /// On a fresh `Success`, the same atomic unit of work marks the order paid and confirmed and schedules
    /// the vendor and supplier notifications in the outbox. On a fresh `Failed`, the order is cancelled and
    /// nothing is scheduled.
    fn apply_payment_outcome(
        &self,
        transaction_id: i64,
        outcome: PaymentOutcome,
        gateway_response: Option<String>,
    ) -> impl Future<Output = Result<OutcomeApplied, LedgerError>> + Send;

    /// `Success → Refunded`, mirrored onto the order's payment status. Terminal; replays are no-ops and any
    /// other starting state is a conflict.
    fn apply_refund(&self, transaction_id: i64) -> impl Future<Output = Result<OutcomeApplied, LedgerError>> + Send;

    /// Vendor-initiated abandonment before payment settles: cancels the order and terminally fails its
    /// pending collection attempts, so a late success webhook surfaces as a conflict instead of silently
    /// flipping state. Abandoning an already-cancelled order is a no-op.
    fn cancel_unpaid_order(&self, order_id: &OrderId) -> impl Future<Output = Result<Order, LedgerError>> + Send;

    /// Outbox rows that have not been delivered yet, oldest first.
    fn unsent_notifications(
        &self,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<Notification>, LedgerError>> + Send;

    fn mark_notification_sent(
        &self,
        notification_id: i64,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;

    /// Closes the database connection.
    fn close(&mut self) -> impl Future<Output = Result<(), LedgerError>> + Send {
        async { Ok(()) }
    }
}

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("Cannot insert order, since it already exists: {0}")]
    OrderAlreadyExists(OrderId),
    #[error("Payment request {0} is already attached to a transaction")]
    PaymentRequestAlreadyAttached(PaymentRequestId),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("The requested transaction (id {0}) does not exist")]
    TransactionNotFound(i64),
    #[error("No transaction is linked to payment request {0}")]
    PaymentRequestNotFound(PaymentRequestId),
    #[error("Transaction {transaction_id} is terminally {current} and cannot become {requested}")]
    StateConflict { transaction_id: i64, current: TransactionStatus, requested: TransactionStatus },
    #[error("Operation requires a settled payment. {0}")]
    PreconditionFailed(String),
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidStatusChange { order_id: OrderId, from: OrderStatusType, to: OrderStatusType },
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}
