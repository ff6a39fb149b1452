use actix_web::{http::StatusCode, web, web::ServiceConfig};
use instamojo_tools::{InstamojoApi, InstamojoConfig};
use mandi_payment_engine::{
    db_types::{OrderStatusType, PaymentStatusType, TransactionStatus},
    events::EventProducers,
    LedgerApi,
};
use mpg_common::{Paise, Secret};

use super::{
    helpers::{post_json, principal_headers},
    mocks::{sample_order, sample_transaction, MockLedger, SUPPLIER_ID, VENDOR_ID},
};
use crate::{checkout::CheckoutRoute, data_objects::CheckoutRequest};

/// A gateway client pointed at a port nothing listens on: validation still runs for real, and any call that
/// does go out fails fast with a transport error instead of leaving the test hanging on the network.
fn unreachable_gateway() -> InstamojoApi {
    let config = InstamojoConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        api_key: Secret::new("test-key".to_string()),
        auth_token: Secret::new("test-token".to_string()),
        mac_salt: Secret::new("test-salt".to_string()),
        redirect_url: "http://localhost:3000/payment/complete".to_string(),
        webhook_url: "http://localhost:8360/wh/payment".to_string(),
        send_email: false,
        send_sms: false,
    };
    InstamojoApi::new(config).expect("client construction cannot fail on static config")
}

fn configure(mock: MockLedger) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = LedgerApi::new(mock, EventProducers::default());
        cfg.service(CheckoutRoute::<MockLedger>::new())
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(unreachable_gateway()));
    }
}

fn checkout_body() -> CheckoutRequest {
    CheckoutRequest {
        supplier_id: SUPPLIER_ID.to_string(),
        subtotal: Paise::from_rupees(950),
        delivery_charge: Paise::from_rupees(50),
        buyer_name: "Ramesh Thela".to_string(),
        buyer_email: "ramesh@example.com".to_string(),
        buyer_phone: "9876543210".to_string(),
    }
}

#[actix_web::test]
async fn checkout_without_principal_is_unauthorized() {
    let _ = env_logger::try_init().ok();
    let (status, _) = post_json("/checkout", &[], &checkout_body(), configure(MockLedger::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn suppliers_cannot_check_out() {
    let _ = env_logger::try_init().ok();
    let headers = principal_headers(SUPPLIER_ID, "supplier");
    let (status, _) = post_json("/checkout", &headers, &checkout_body(), configure(MockLedger::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn invalid_buyer_email_fails_before_any_insert() {
    let _ = env_logger::try_init().ok();
    // No mock expectations: the order must never reach the ledger
    let mut body = checkout_body();
    body.buyer_email = "not-an-email".to_string();
    let headers = principal_headers(VENDOR_ID, "vendor");
    let (status, response) = post_json("/checkout", &headers, &body, configure(MockLedger::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response.contains("not a valid email"), "unexpected body: {response}");
}

#[actix_web::test]
async fn negative_subtotal_fails_before_any_insert() {
    let _ = env_logger::try_init().ok();
    let mut body = checkout_body();
    body.subtotal = Paise::new(-100);
    let headers = principal_headers(VENDOR_ID, "vendor");
    let (status, _) = post_json("/checkout", &headers, &body, configure(MockLedger::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn unreachable_gateway_surfaces_as_retryable_503_after_local_insert() {
    let _ = env_logger::try_init().ok();
    let mut mock = MockLedger::new();
    mock.expect_insert_order_with_transaction().returning(|_, _| {
        Ok((
            sample_order(OrderStatusType::Pending, PaymentStatusType::Pending),
            sample_transaction(TransactionStatus::Pending),
        ))
    });
    // attach_payment_request must never be called: the gateway never assigned an id
    let headers = principal_headers(VENDOR_ID, "vendor");
    let (status, _) = post_json("/checkout", &headers, &checkout_body(), configure(mock)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
