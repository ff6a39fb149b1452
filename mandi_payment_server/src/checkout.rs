//! The vendor-side checkout flow.
//!
//! Order of operations matters here:
//! 1. Validate everything (fees, buyer contact fields) before touching any state.
//! 2. Insert the order and its pending transaction in one atomic unit of work.
//! 3. Only then call the gateway — outside any database transaction, so a slow gateway never blocks
//!    unrelated orders.
//! 4. Record the gateway's assigned id against the transaction.
//!
//! If step 3 fails, the pending pair stays behind on purpose: the caller sees a retryable error (and retries
//! mint a *new* order; the creation endpoint is not idempotent), while the reconciliation sweep eventually
//! fails the stranded transaction locally.

use actix_web::{web, HttpResponse};
use instamojo_tools::{InstamojoApi, NewPaymentRequest};
use log::*;
use mandi_payment_engine::{
    db_types::{NewOrder, NewTransaction, PaymentRequestId},
    traits::LedgerDatabase,
    LedgerApi,
};

use crate::{
    auth::{Principal, Role},
    data_objects::{CheckoutRequest, CheckoutResponse},
    errors::ServerError,
    route,
};

route!(checkout => Post "/checkout" impl LedgerDatabase);
pub async fn checkout<B: LedgerDatabase>(
    principal: Principal,
    body: web::Json<CheckoutRequest>,
    api: web::Data<LedgerApi<B>>,
    gateway: web::Data<InstamojoApi>,
) -> Result<HttpResponse, ServerError> {
    principal.require_role(Role::Vendor)?;
    let request = body.into_inner();
    trace!("🛒️ Checkout request from vendor {} for supplier {}", principal.user_id, request.supplier_id);
    if request.supplier_id.trim().is_empty() {
        return Err(ServerError::ValidationError("A supplier id is required".to_string()));
    }
    let order =
        NewOrder::try_new(principal.user_id.clone(), request.supplier_id, request.subtotal, request.delivery_charge)?;
    let transaction =
        NewTransaction::try_for_order(&order, request.buyer_name, request.buyer_email, request.buyer_phone)?;
    let payment_request = NewPaymentRequest {
        purpose: format!("Mandi order {}", order.order_id.as_str()),
        amount: transaction.amount,
        buyer_name: transaction.buyer_name.clone(),
        buyer_email: transaction.buyer_email.clone(),
        buyer_phone: transaction.buyer_phone.clone(),
    };
    // Fail fast on anything the gateway would reject, before an order row exists
    instamojo_tools::validate_payment_request(&payment_request)?;

    let (order, transaction) = api.place_order(order, transaction).await?;
    debug!("🛒️ Order {} placed; asking the gateway to collect {}", order.order_id, transaction.amount);

    let created = match gateway.create_payment_request(&payment_request).await {
        Ok(created) => created,
        Err(e) => {
            warn!(
                "🛒️ Gateway call failed after order {} was created locally: {e}. The reconciliation sweep will \
                 resolve the stranded transaction.",
                order.order_id
            );
            return Err(e.into());
        },
    };
    let transaction = api.attach_payment_request(transaction.id, &PaymentRequestId(created.id)).await?;
    info!("🛒️ Order {} is awaiting payment of {} at the gateway", order.order_id, transaction.amount);
    Ok(HttpResponse::Ok().json(CheckoutResponse {
        order_id: order.order_id,
        transaction_id: transaction.id,
        total: order.total_price,
        amount_payable: transaction.amount,
        payment_url: created.longurl,
    }))
}
