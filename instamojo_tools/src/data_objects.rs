use std::fmt::Display;

use mpg_common::Paise;
use serde::{Deserialize, Serialize};

/// A payment request as we hand it to the gateway. `amount` is the full figure the buyer is asked to pay,
/// i.e. the order total with the gateway surcharge already added.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPaymentRequest {
    pub purpose: String,
    pub amount: Paise,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_phone: String,
}

/// The gateway's answer to a successful creation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// The gateway-assigned payment request id. This is the correlation key for webhooks and polling.
    pub id: String,
    /// The hosted checkout page to redirect the buyer to.
    pub longurl: String,
}

/// Settlement state as reported by a status poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    /// No payment has been attempted yet (or the gateway does not know the request yet).
    Pending,
    /// A payment against the request settled successfully.
    Credit,
    /// The buyer's payment attempt failed.
    Failed,
}

impl Display for PollStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PollStatus::Pending => write!(f, "Pending"),
            PollStatus::Credit => write!(f, "Credit"),
            PollStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// The webhook body the gateway posts when a payment settles.
///
/// All business fields are kept as the raw strings from the wire, because the `mac` is computed over exactly
/// those strings. Parse `amount`/`fees` into [`Paise`] only after verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub payment_id: String,
    pub payment_request_id: String,
    pub status: String,
    pub amount: String,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_phone: String,
    pub purpose: String,
    pub fees: String,
    pub mac: String,
}

impl WebhookPayload {
    /// "Credit" is the gateway's word for settled money; everything else is a failure.
    pub fn is_credit(&self) -> bool {
        self.status == "Credit"
    }
}
