use std::fmt::Debug;

use chrono::Duration;
use log::*;

use crate::{
    db_types::{
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
    },
    events::{EventProducers, OrderConfirmedEvent, PaymentFailedEvent},
    traits::{LedgerDatabase, LedgerError},
};

/// `LedgerApi` is the only authorized mutator of order and transaction state. It drives the settlement state
/// machine in response to checkout actions, verified gateway callbacks and poll results, and publishes
/// settlement events for subscribers on every *fresh* transition.
pub struct LedgerApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for LedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerApi")
    }
}

impl<B> LedgerApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> LedgerApi<B>
where B: LedgerDatabase
{
    /// Creates the order and its first pending collection attempt in one atomic unit of work.
    ///
    /// No gateway call happens here; the caller contacts the gateway *after* this returns, outside any
    /// database transaction, and then records the assigned id with [`Self::attach_payment_request`].
    pub async fn place_order(
        &self,
        order: NewOrder,
        transaction: NewTransaction,
    ) -> Result<(Order, Transaction), LedgerError> {
        let (order, transaction) = self.db.insert_order_with_transaction(order, transaction).await?;
        debug!(
            "🔄️📦️ Order {} for {} saved with pending transaction {}",
            order.order_id, order.total_price, transaction.id
        );
        Ok((order, transaction))
    }

    /// Records the gateway's payment request id against a pending transaction.
    pub async fn attach_payment_request(
        &self,
        transaction_id: i64,
        payment_request_id: &PaymentRequestId,
    ) -> Result<Transaction, LedgerError> {
        let transaction = self.db.attach_payment_request(transaction_id, payment_request_id).await?;
        debug!("🔄️📦️ Transaction {transaction_id} is now tracked by gateway request {payment_request_id}");
        Ok(transaction)
    }

    /// Applies a verified settlement outcome to a transaction.
    ///
    /// Idempotent under at-least-once delivery: replays return [`OutcomeApplied::AlreadyApplied`] and fire no
    /// events. A conflicting terminal state is logged loudly and surfaced as [`LedgerError::StateConflict`] —
    /// it means a forged-but-verified callback, a gateway inconsistency, or a cancel/settle race, and a human
    /// has to look at it.
    pub async fn apply_payment_outcome(
        &self,
        transaction_id: i64,
        outcome: PaymentOutcome,
        gateway_response: Option<String>,
    ) -> Result<OutcomeApplied, LedgerError> {
        let applied = match self.db.apply_payment_outcome(transaction_id, outcome, gateway_response).await {
            Ok(applied) => applied,
            Err(e @ LedgerError::StateConflict { .. }) => {
                error!("🔄️🚨️ Settlement conflict on transaction {transaction_id}: {e}. Manual reconciliation needed.");
                return Err(e);
            },
            Err(e) => return Err(e),
        };
        match &applied {
            OutcomeApplied::Applied { order, transaction } => match outcome {
                PaymentOutcome::Success => {
                    info!("🔄️✅️ Payment of {} settled for order {}. Order confirmed.", transaction.amount, order.order_id);
                    self.call_order_confirmed_hook(order, transaction).await;
                },
                PaymentOutcome::Failed => {
                    info!("🔄️❌️ Payment failed for order {}. Order cancelled.", order.order_id);
                    self.call_payment_failed_hook(order, transaction).await;
                },
            },
            OutcomeApplied::AlreadyApplied { transaction, .. } => {
                debug!(
                    "🔄️ Transaction {} was already {}. Treating outcome delivery as a replay.",
                    transaction.id, transaction.status
                );
            },
        }
        Ok(applied)
    }

    /// The webhook entry point: resolves the gateway's payment request id to our transaction, then applies.
    /// An unknown id is an orphan callback and is surfaced as [`LedgerError::PaymentRequestNotFound`] without
    /// touching any state.
    pub async fn apply_outcome_for_payment_request(
        &self,
        payment_request_id: &PaymentRequestId,
        outcome: PaymentOutcome,
        gateway_response: Option<String>,
    ) -> Result<OutcomeApplied, LedgerError> {
        let transaction = self
            .db
            .fetch_transaction_by_payment_request(payment_request_id)
            .await?
            .ok_or_else(|| LedgerError::PaymentRequestNotFound(payment_request_id.clone()))?;
        self.apply_payment_outcome(transaction.id, outcome, gateway_response).await
    }

    /// Vendor abandons checkout before paying. The conflict detection in
    /// [`Self::apply_payment_outcome`] is the backstop if a success webhook races this call.
    pub async fn abandon_checkout(&self, order_id: &OrderId) -> Result<Order, LedgerError> {
        let order = self.db.cancel_unpaid_order(order_id).await?;
        info!("🔄️🗑️ Order {order_id} abandoned by the vendor before payment");
        Ok(order)
    }

    /// Marks a settled transaction refunded. Terminal; detail of how money flows back is the operator's
    /// workflow, the ledger only records that it did.
    pub async fn apply_refund(&self, transaction_id: i64) -> Result<OutcomeApplied, LedgerError> {
        let applied = self.db.apply_refund(transaction_id).await?;
        if applied.is_fresh() {
            info!(
                "🔄️↩️ Transaction {} refunded; order {} marked accordingly",
                transaction_id,
                applied.order().order_id
            );
        }
        Ok(applied)
    }

    /// Supplier-driven fulfilment progression: `Confirmed → Processing → Shipped → Delivered`.
    ///
    /// Every step requires the payment to have settled; `Confirmed` itself is only ever reached through the
    /// payment path and cannot be requested here.
    pub async fn update_fulfilment(&self, order_id: &OrderId, to: OrderStatusType) -> Result<Order, LedgerError> {
        let from = match to {
            OrderStatusType::Processing => OrderStatusType::Confirmed,
            OrderStatusType::Shipped => OrderStatusType::Processing,
            OrderStatusType::Delivered => OrderStatusType::Shipped,
            other => {
                let order = self.order(order_id).await?;
                return Err(LedgerError::InvalidStatusChange { order_id: order.order_id, from: order.status, to: other });
            },
        };
        let order = self.db.update_fulfilment_status(order_id, from, to).await?;
        info!("🔄️🚚️ Order {order_id} moved to {to}");
        Ok(order)
    }

    pub async fn order(&self, order_id: &OrderId) -> Result<Order, LedgerError> {
        self.db.fetch_order_by_order_id(order_id).await?.ok_or_else(|| LedgerError::OrderNotFound(order_id.clone()))
    }

    /// Transactions that have been `Pending` for longer than `max_age`. The reconciliation sweep polls these.
    pub async fn stale_pending_transactions(&self, max_age: Duration) -> Result<Vec<Transaction>, LedgerError> {
        self.db.fetch_stale_pending_transactions(max_age).await
    }

    pub async fn unsent_notifications(&self, limit: i64) -> Result<Vec<Notification>, LedgerError> {
        self.db.unsent_notifications(limit).await
    }

    pub async fn mark_notification_sent(&self, notification_id: i64) -> Result<(), LedgerError> {
        self.db.mark_notification_sent(notification_id).await
    }

    async fn call_order_confirmed_hook(&self, order: &Order, transaction: &Transaction) {
        for emitter in &self.producers.order_confirmed_producer {
            debug!("🔄️📦️ Notifying order-confirmed subscribers for {}", order.order_id);
            let event = OrderConfirmedEvent::new(order.clone(), transaction.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_payment_failed_hook(&self, order: &Order, transaction: &Transaction) {
        for emitter in &self.producers.payment_failed_producer {
            debug!("🔄️📦️ Notifying payment-failed subscribers for {}", order.order_id);
            let event = PaymentFailedEvent::new(order.clone(), transaction.clone());
            emitter.publish_event(event).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
