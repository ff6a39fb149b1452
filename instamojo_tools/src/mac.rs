//! Webhook authenticity.
//!
//! The gateway signs every callback with an HMAC over the business fields, keyed with a salt that only the
//! platform and the gateway hold. The canonical input is the pipe-joined field sequence
//!
//! ```text
//!     payment_id|payment_request_id|status|amount|buyer_name|buyer_email|buyer_phone|purpose|fees
//! ```
//!
//! hex-encoded HMAC-SHA256, carried in the payload's `mac` field. A callback that fails this check must never
//! touch order or transaction state.

use hmac::{Hmac, Mac};
use mpg_common::Secret;
use sha2::Sha256;

use crate::data_objects::WebhookPayload;

type HmacSha256 = Hmac<Sha256>;

/// Recomputes the authenticity code for `payload` under `salt`.
pub fn callback_mac(payload: &WebhookPayload, salt: &str) -> String {
    let canonical = [
        payload.payment_id.as_str(),
        payload.payment_request_id.as_str(),
        payload.status.as_str(),
        payload.amount.as_str(),
        payload.buyer_name.as_str(),
        payload.buyer_email.as_str(),
        payload.buyer_phone.as_str(),
        payload.purpose.as_str(),
        payload.fees.as_str(),
    ]
    .join("|");
    let mut mac = HmacSha256::new_from_slice(salt.as_bytes()).expect("HMAC can take key of any size");
    mac.update(canonical.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// The webhook trust boundary, constructed once from configuration and shared with the webhook handler.
#[derive(Clone)]
pub struct CallbackVerifier {
    salt: Secret<String>,
}

impl CallbackVerifier {
    pub fn new(salt: Secret<String>) -> Self {
        Self { salt }
    }

    /// True only if the payload's `mac` exactly matches the recomputed code.
    pub fn verify(&self, payload: &WebhookPayload) -> bool {
        callback_mac(payload, self.salt.reveal()) == payload.mac
    }
}
