use crate::db_types::{Order, Transaction};

/// A payment settled and the order moved to `Confirmed`. Fired exactly once per settlement; idempotent
/// replays of the same webhook never re-fire it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderConfirmedEvent {
    pub order: Order,
    pub transaction: Transaction,
}

impl OrderConfirmedEvent {
    pub fn new(order: Order, transaction: Transaction) -> Self {
        Self { order, transaction }
    }
}

/// A collection attempt terminally failed and the order was cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentFailedEvent {
    pub order: Order,
    pub transaction: Transaction,
}

impl PaymentFailedEvent {
    pub fn new(order: Order, transaction: Transaction) -> Self {
        Self { order, transaction }
    }
}
