//! The gateway callback endpoint.
//!
//! The contract, in order:
//! 1. A body that does not parse is a 400 and touches nothing.
//! 2. A payload whose `mac` does not verify is a 401 and touches nothing — logged distinctly from a
//!    legitimate failed payment, because it is a possible forgery.
//! 3. A payment request id we never created is an orphan: logged loudly, nothing mutated, but answered with
//!    a 200 failure body (redelivery can never make an orphan valid, so provoking the gateway's retry loop
//!    with an error status buys nothing).
//! 4. "Credit" maps to success, anything else to failure, and the ledger applies it idempotently.
//! 5. Replays and settlement conflicts still answer 200 — the gateway retries on non-2xx, and a conflict is
//!    an operator problem, not a redelivery problem. Only transient backend failures return a 5xx, which is
//!    exactly the case where redelivery helps (the handler is safe to re-run from step 1).

use actix_web::{web, HttpResponse};
use instamojo_tools::{CallbackVerifier, WebhookPayload};
use log::*;
use mandi_payment_engine::{
    db_types::{OutcomeApplied, PaymentOutcome, PaymentRequestId},
    traits::{LedgerDatabase, LedgerError},
    LedgerApi,
};
use mpg_common::Paise;

use crate::{data_objects::JsonResponse, route};

route!(payment_webhook => Post "/payment" impl LedgerDatabase);
pub async fn payment_webhook<B: LedgerDatabase>(
    body: web::Bytes,
    api: web::Data<LedgerApi<B>>,
    verifier: web::Data<CallbackVerifier>,
) -> HttpResponse {
    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("🔔️ Discarding malformed webhook body: {e}");
            return HttpResponse::BadRequest().json(JsonResponse::failure("Malformed payload"));
        },
    };
    if !verifier.verify(&payload) {
        // Not a failed payment: a payload whose authenticity code does not check out. Could be a forgery
        // attempt or a salt misconfiguration; either way it must be visible in the logs as its own thing.
        warn!(
            "🔔️🚨️ Webhook for payment request {} failed MAC verification. Possible forged callback; rejecting \
             without touching state.",
            payload.payment_request_id
        );
        return HttpResponse::Unauthorized().json(JsonResponse::failure("Invalid authenticity code"));
    }
    let outcome = if payload.is_credit() { PaymentOutcome::Success } else { PaymentOutcome::Failed };
    debug!(
        "🔔️ Verified webhook: payment {} for request {} reports '{}' ({outcome})",
        payload.payment_id, payload.payment_request_id, payload.status
    );
    let request_id = PaymentRequestId(payload.payment_request_id.clone());
    let raw = String::from_utf8_lossy(&body).to_string();
    match api.apply_outcome_for_payment_request(&request_id, outcome, Some(raw)).await {
        Ok(applied) => {
            check_reported_amount(&payload, &applied);
            let message = if applied.is_fresh() {
                format!("Payment outcome recorded for order {}", applied.order().order_id)
            } else {
                "Payment outcome was already recorded".to_string()
            };
            HttpResponse::Ok().json(JsonResponse::success(message))
        },
        Err(LedgerError::PaymentRequestNotFound(id)) => {
            error!(
                "🔔️🚨️ Orphan webhook: no transaction is tracked by payment request {id}. Payment id was {}. \
                 Nothing was mutated.",
                payload.payment_id
            );
            HttpResponse::Ok().json(JsonResponse::failure("Unknown payment request"))
        },
        Err(e @ LedgerError::StateConflict { .. }) => {
            // Already logged at error level by the ledger. A 200 stops the gateway's retry loop; redelivery
            // cannot resolve a conflict, only an operator can.
            HttpResponse::Ok().json(JsonResponse::failure(format!("Conflict recorded for manual review: {e}")))
        },
        Err(e) => {
            warn!("🔔️ Transient failure while applying webhook for request {request_id}: {e}. Asking for redelivery.");
            HttpResponse::InternalServerError().json(JsonResponse::failure("Temporarily unable to process callback"))
        },
    }
}

/// The MAC already guarantees the figures are the gateway's own, but a mismatch against what we asked to be
/// collected is still worth an alarm: it means the buyer paid something other than the quoted amount.
fn check_reported_amount(payload: &WebhookPayload, applied: &OutcomeApplied) {
    match payload.amount.parse::<Paise>() {
        Ok(amount) if amount == applied.transaction().amount => {},
        Ok(amount) => warn!(
            "🔔️🚨️ Webhook for order {} reports {} but transaction {} expected {}.",
            applied.order().order_id,
            amount,
            applied.transaction().id,
            applied.transaction().amount
        ),
        Err(e) => warn!("🔔️ Could not parse webhook amount '{}': {e}", payload.amount),
    }
}
