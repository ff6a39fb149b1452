//! `SqliteDatabase` is the concrete ledger backend.
//!
//! It implements the repository traits in the [`crate::traits`] module over a SQLite pool. The settlement
//! transitions compose the low-level [`super::db`] functions inside a single SQLite transaction each, which
//! is what makes "transaction row + order row + outbox rows" an atomic unit of work.

use std::fmt::Debug;

use chrono::Duration;
use log::*;
use sqlx::SqlitePool;

use super::db::{new_pool, notifications, orders, transactions};
use crate::{
    db_types::{
        NewOrder,
        NewTransaction,
        Notification,
        NotificationTemplate,
        Order,
        OrderId,
        OrderStatusType,
        OutcomeApplied,
        PaymentOutcome,
        PaymentRequestId,
        PaymentStatusType,
        Transaction,
        TransactionStatus,
    },
    traits::{LedgerDatabase, LedgerError, OrderRepository, TransactionRepository},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, LedgerError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl OrderRepository for SqliteDatabase {
    async fn insert_order_with_transaction(
        &self,
        order: NewOrder,
        transaction: NewTransaction,
    ) -> Result<(Order, Transaction), LedgerError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        let transaction = transactions::insert_transaction(transaction, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {} saved with pending transaction {}", order.order_id, transaction.id);
        Ok((order, transaction))
    }

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn update_fulfilment_status(
        &self,
        order_id: &OrderId,
        from: OrderStatusType,
        to: OrderStatusType,
    ) -> Result<Order, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        match orders::update_fulfilment(order_id, from, to, &mut conn).await? {
            Some(order) => Ok(order),
            // The guarded update missed. Work out which precondition failed so the caller gets a precise
            // error instead of a shrug.
            None => {
                let order = orders::fetch_order_by_order_id(order_id, &mut conn)
                    .await?
                    .ok_or_else(|| LedgerError::OrderNotFound(order_id.clone()))?;
                if order.payment_status != PaymentStatusType::Paid {
                    Err(LedgerError::PreconditionFailed(format!(
                        "Order {} has payment status {} and cannot be fulfilled",
                        order.order_id, order.payment_status
                    )))
                } else {
                    Err(LedgerError::InvalidStatusChange { order_id: order.order_id, from: order.status, to })
                }
            },
        }
    }
}

impl TransactionRepository for SqliteDatabase {
    async fn fetch_transaction(&self, transaction_id: i64) -> Result<Option<Transaction>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let transaction = transactions::fetch_transaction(transaction_id, &mut conn).await?;
        Ok(transaction)
    }

    async fn fetch_transaction_by_payment_request(
        &self,
        payment_request_id: &PaymentRequestId,
    ) -> Result<Option<Transaction>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let transaction = transactions::fetch_by_payment_request(payment_request_id, &mut conn).await?;
        Ok(transaction)
    }

    async fn attach_payment_request(
        &self,
        transaction_id: i64,
        payment_request_id: &PaymentRequestId,
    ) -> Result<Transaction, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        match transactions::attach_payment_request(transaction_id, payment_request_id, &mut conn).await? {
            Some(transaction) => Ok(transaction),
            None => {
                let existing = transactions::fetch_transaction(transaction_id, &mut conn)
                    .await?
                    .ok_or(LedgerError::TransactionNotFound(transaction_id))?;
                match existing.payment_request_id {
                    Some(id) => Err(LedgerError::PaymentRequestAlreadyAttached(id)),
                    None => Err(LedgerError::DatabaseError(format!(
                        "Could not attach payment request {payment_request_id} to transaction {transaction_id}"
                    ))),
                }
            },
        }
    }

    async fn fetch_stale_pending_transactions(&self, max_age: Duration) -> Result<Vec<Transaction>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let stale = transactions::fetch_stale_pending(max_age.num_seconds(), &mut conn).await?;
        Ok(stale)
    }
}

impl LedgerDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn apply_payment_outcome(
        &self,
        transaction_id: i64,
        outcome: PaymentOutcome,
        gateway_response: Option<String>,
    ) -> Result<OutcomeApplied, LedgerError> {
        let requested = outcome.transaction_status();
        let mut tx = self.pool.begin().await?;
        match transactions::claim_pending(transaction_id, requested, gateway_response, &mut tx).await? {
            Some(transaction) => {
                let order = orders::apply_payment_outcome(&transaction.order_id, outcome, &mut tx).await?;
                if outcome == PaymentOutcome::Success {
                    let payload = settlement_payload(&order, &transaction);
                    notifications::schedule(
                        &order.order_id,
                        &order.vendor_id,
                        NotificationTemplate::PaymentConfirmed,
                        payload.clone(),
                        &mut tx,
                    )
                    .await?;
                    notifications::schedule(
                        &order.order_id,
                        &order.supplier_id,
                        NotificationTemplate::NewPaidOrder,
                        payload,
                        &mut tx,
                    )
                    .await?;
                }
                tx.commit().await?;
                debug!("🗃️ Transaction {transaction_id} settled as {requested}; order {} updated", order.order_id);
                Ok(OutcomeApplied::Applied { order, transaction })
            },
            // The row was not pending. Either it does not exist, or it is already terminal: distinguish the
            // harmless replay from the conflict that needs a human.
            None => {
                let transaction = transactions::fetch_transaction(transaction_id, &mut tx)
                    .await?
                    .ok_or(LedgerError::TransactionNotFound(transaction_id))?;
                let order = orders::fetch_order_by_order_id(&transaction.order_id, &mut tx)
                    .await?
                    .ok_or_else(|| LedgerError::OrderNotFound(transaction.order_id.clone()))?;
                tx.commit().await?;
                if transaction.status == requested {
                    Ok(OutcomeApplied::AlreadyApplied { order, transaction })
                } else {
                    Err(LedgerError::StateConflict {
                        transaction_id,
                        current: transaction.status,
                        requested,
                    })
                }
            },
        }
    }

    async fn apply_refund(&self, transaction_id: i64) -> Result<OutcomeApplied, LedgerError> {
        let mut tx = self.pool.begin().await?;
        match transactions::claim_refund(transaction_id, &mut tx).await? {
            Some(transaction) => {
                let order = orders::apply_refund(&transaction.order_id, &mut tx).await?;
                tx.commit().await?;
                debug!("🗃️ Transaction {transaction_id} refunded; order {} updated", order.order_id);
                Ok(OutcomeApplied::Applied { order, transaction })
            },
            None => {
                let transaction = transactions::fetch_transaction(transaction_id, &mut tx)
                    .await?
                    .ok_or(LedgerError::TransactionNotFound(transaction_id))?;
                let order = orders::fetch_order_by_order_id(&transaction.order_id, &mut tx)
                    .await?
                    .ok_or_else(|| LedgerError::OrderNotFound(transaction.order_id.clone()))?;
                tx.commit().await?;
                if transaction.status == TransactionStatus::Refunded {
                    Ok(OutcomeApplied::AlreadyApplied { order, transaction })
                } else {
                    Err(LedgerError::StateConflict {
                        transaction_id,
                        current: transaction.status,
                        requested: TransactionStatus::Refunded,
                    })
                }
            },
        }
    }

    async fn cancel_unpaid_order(&self, order_id: &OrderId) -> Result<Order, LedgerError> {
        let mut tx = self.pool.begin().await?;
        match orders::cancel_unpaid(order_id, &mut tx).await? {
            Some(order) => {
                let failed = transactions::fail_pending_for_order(order_id, &mut tx).await?;
                tx.commit().await?;
                debug!("🗃️ Order {order_id} cancelled; {failed} pending transaction(s) terminally failed");
                Ok(order)
            },
            None => {
                let order = orders::fetch_order_by_order_id(order_id, &mut tx)
                    .await?
                    .ok_or_else(|| LedgerError::OrderNotFound(order_id.clone()))?;
                tx.commit().await?;
                if order.status == OrderStatusType::Cancelled {
                    // Abandoning twice is harmless
                    Ok(order)
                } else {
                    Err(LedgerError::InvalidStatusChange {
                        order_id: order.order_id.clone(),
                        from: order.status,
                        to: OrderStatusType::Cancelled,
                    })
                }
            },
        }
    }

    async fn unsent_notifications(&self, limit: i64) -> Result<Vec<Notification>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let pending = notifications::unsent(limit, &mut conn).await?;
        Ok(pending)
    }

    async fn mark_notification_sent(&self, notification_id: i64) -> Result<(), LedgerError> {
        let mut conn = self.pool.acquire().await?;
        notifications::mark_sent(notification_id, &mut conn).await
    }
}

fn settlement_payload(order: &Order, transaction: &Transaction) -> String {
    serde_json::json!({
        "order_id": order.order_id,
        "vendor_id": order.vendor_id,
        "supplier_id": order.supplier_id,
        "total": order.total_price,
        "amount_paid": transaction.amount,
        "transaction_id": transaction.id,
    })
    .to_string()
}
