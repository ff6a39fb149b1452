use std::fmt::Display;

use mandi_payment_engine::db_types::{OrderId, OrderStatusType};
use mpg_common::Paise;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// A vendor-side checkout action for a single-supplier cart. Monetary fields are in paise.
/// Multi-supplier carts are split into one of these per supplier before they reach this server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub supplier_id: String,
    pub subtotal: Paise,
    #[serde(default)]
    pub delivery_charge: Paise,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub order_id: OrderId,
    pub transaction_id: i64,
    /// The order total the supplier will see.
    pub total: Paise,
    /// What the buyer will actually be charged (total plus the gateway surcharge).
    pub amount_payable: Paise,
    /// The gateway's hosted checkout page; the client redirects the vendor here.
    pub payment_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfilmentUpdate {
    pub status: OrderStatusType,
}
