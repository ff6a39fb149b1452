use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use mpg_common::{
    fees::{amount_to_charge, commission, gateway_fee, FeeError},
    Paise,
};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------        OrderId        -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    /// Mints a fresh order id. Ids are assigned server-side; clients never supply them.
    pub fn random() -> Self {
        Self(format!("MND-{:08x}", rand::random::<u32>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------    PaymentRequestId    ------------------------------------------------------
/// The gateway's identifier for a payment request. At most one transaction carries any given id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct PaymentRequestId(pub String);

impl PaymentRequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for PaymentRequestId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for PaymentRequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------   OrderStatusType     -------------------------------------------------------
/// The fulfilment state machine. An order only ever leaves `Pending` as a consequence of its payment settling
/// (to `Confirmed`) or terminally failing (to `Cancelled`); the later states are supplier-driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Confirmed => write!(f, "Confirmed"),
            OrderStatusType::Processing => write!(f, "Processing"),
            OrderStatusType::Shipped => write!(f, "Shipped"),
            OrderStatusType::Delivered => write!(f, "Delivered"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Confirmed" => Ok(Self::Confirmed),
            "Processing" => Ok(Self::Processing),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

//--------------------------------------   PaymentStatusType    ------------------------------------------------------
/// The payment axis of an order, independent of fulfilment. Mirrors the authoritative transaction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatusType {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl Display for PaymentStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatusType::Pending => write!(f, "Pending"),
            PaymentStatusType::Paid => write!(f, "Paid"),
            PaymentStatusType::Failed => write!(f, "Failed"),
            PaymentStatusType::Refunded => write!(f, "Refunded"),
        }
    }
}

impl FromStr for PaymentStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Paid" => Ok(Self::Paid),
            "Failed" => Ok(Self::Failed),
            "Refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

impl From<String> for PaymentStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid payment status: {value}. But this conversion cannot fail. Defaulting to Pending");
            PaymentStatusType::Pending
        })
    }
}

//--------------------------------------   TransactionStatus    ------------------------------------------------------
/// Lifecycle of a collection attempt: `Pending → {Success, Failed}`, `Success → Refunded`.
/// `Failed` and `Refunded` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
    Refunded,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "Pending"),
            TransactionStatus::Success => write!(f, "Success"),
            TransactionStatus::Failed => write!(f, "Failed"),
            TransactionStatus::Refunded => write!(f, "Refunded"),
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Success" => Ok(Self::Success),
            "Failed" => Ok(Self::Failed),
            "Refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid transaction status: {s}"))),
        }
    }
}

impl From<String> for TransactionStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid transaction status: {value}. But this conversion cannot fail. Defaulting to Pending");
            TransactionStatus::Pending
        })
    }
}

//--------------------------------------    PaymentOutcome      ------------------------------------------------------
/// The two settlement outcomes a verified callback or poll can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Success,
    Failed,
}

impl PaymentOutcome {
    pub fn transaction_status(self) -> TransactionStatus {
        match self {
            PaymentOutcome::Success => TransactionStatus::Success,
            PaymentOutcome::Failed => TransactionStatus::Failed,
        }
    }

    pub fn payment_status(self) -> PaymentStatusType {
        match self {
            PaymentOutcome::Success => PaymentStatusType::Paid,
            PaymentOutcome::Failed => PaymentStatusType::Failed,
        }
    }

    pub fn order_status(self) -> OrderStatusType {
        match self {
            PaymentOutcome::Success => OrderStatusType::Confirmed,
            PaymentOutcome::Failed => OrderStatusType::Cancelled,
        }
    }
}

impl Display for PaymentOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentOutcome::Success => write!(f, "Success"),
            PaymentOutcome::Failed => write!(f, "Failed"),
        }
    }
}

//--------------------------------------        Order         --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub vendor_id: String,
    pub supplier_id: String,
    pub subtotal: Paise,
    pub delivery_charge: Paise,
    /// Informational; always recomputable from `total_price` and the fee policy.
    pub commission: Paise,
    /// `subtotal + delivery_charge`. Fixed at creation.
    pub total_price: Paise,
    pub status: OrderStatusType,
    pub payment_status: PaymentStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      NewOrder        --------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: OrderId,
    /// The vendor (street-food seller) placing the order.
    pub vendor_id: String,
    /// The supplier fulfilling it. Multi-supplier carts are split upstream into one order per supplier.
    pub supplier_id: String,
    pub subtotal: Paise,
    pub delivery_charge: Paise,
    pub commission: Paise,
    pub total_price: Paise,
}

impl NewOrder {
    /// Builds an order with its derived monetary fields, minting a fresh order id.
    pub fn try_new(
        vendor_id: String,
        supplier_id: String,
        subtotal: Paise,
        delivery_charge: Paise,
    ) -> Result<Self, FeeError> {
        if subtotal.is_negative() {
            return Err(FeeError::InvalidAmount(subtotal));
        }
        if delivery_charge.is_negative() {
            return Err(FeeError::InvalidAmount(delivery_charge));
        }
        let total_price = subtotal + delivery_charge;
        Ok(Self {
            order_id: OrderId::random(),
            vendor_id,
            supplier_id,
            subtotal,
            delivery_charge,
            commission: commission(total_price)?,
            total_price,
        })
    }
}

//--------------------------------------     Transaction      --------------------------------------------------------
/// The authoritative record of one attempt to collect payment for an order through the gateway.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub order_id: OrderId,
    /// Set once the gateway accepts the payment request; absent before that.
    pub payment_request_id: Option<PaymentRequestId>,
    /// What the buyer is asked to pay: order total plus the gateway surcharge.
    pub amount: Paise,
    pub gateway_fee: Paise,
    /// Platform commission, computed from the order total (never from `amount`).
    pub commission: Paise,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_phone: String,
    pub status: TransactionStatus,
    /// Raw gateway payload that drove the last status change, kept for audit.
    pub gateway_response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------    NewTransaction    --------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub order_id: OrderId,
    pub amount: Paise,
    pub gateway_fee: Paise,
    pub commission: Paise,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_phone: String,
}

impl NewTransaction {
    /// Derives the charge figures for a collection attempt against `order`.
    pub fn try_for_order(
        order: &NewOrder,
        buyer_name: String,
        buyer_email: String,
        buyer_phone: String,
    ) -> Result<Self, FeeError> {
        Ok(Self {
            order_id: order.order_id.clone(),
            amount: amount_to_charge(order.total_price)?,
            gateway_fee: gateway_fee(order.total_price)?,
            commission: commission(order.total_price)?,
            buyer_name,
            buyer_email,
            buyer_phone,
        })
    }
}

//--------------------------------------     Notification     --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum NotificationTemplate {
    /// Tells the vendor their payment went through and the order is confirmed.
    PaymentConfirmed,
    /// Tells the supplier a paid order is waiting for them.
    NewPaidOrder,
}

impl Display for NotificationTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationTemplate::PaymentConfirmed => write!(f, "PaymentConfirmed"),
            NotificationTemplate::NewPaidOrder => write!(f, "NewPaidOrder"),
        }
    }
}

/// A scheduled (and possibly already delivered) notification from the durable outbox.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub order_id: OrderId,
    pub recipient_id: String,
    pub template: NotificationTemplate,
    pub payload: String,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

//--------------------------------------    OutcomeApplied    --------------------------------------------------------
/// The result of asking the ledger to apply a payment outcome.
///
/// `AlreadyApplied` is the idempotent no-op path: the transaction was already terminally in the requested
/// state, so nothing changed and no notifications were scheduled. Callers that publish events or count side
/// effects must only do so for `Applied`.
#[derive(Debug, Clone)]
pub enum OutcomeApplied {
    Applied { order: Order, transaction: Transaction },
    AlreadyApplied { order: Order, transaction: Transaction },
}

impl OutcomeApplied {
    pub fn order(&self) -> &Order {
        match self {
            OutcomeApplied::Applied { order, .. } | OutcomeApplied::AlreadyApplied { order, .. } => order,
        }
    }

    pub fn transaction(&self) -> &Transaction {
        match self {
            OutcomeApplied::Applied { transaction, .. } | OutcomeApplied::AlreadyApplied { transaction, .. } => {
                transaction
            },
        }
    }

    /// True when this call actually performed the transition (as opposed to replaying a settled one).
    pub fn is_fresh(&self) -> bool {
        matches!(self, OutcomeApplied::Applied { .. })
    }
}
