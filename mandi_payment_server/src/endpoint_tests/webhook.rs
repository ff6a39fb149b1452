use actix_web::{http::StatusCode, web, web::ServiceConfig};
use instamojo_tools::{callback_mac, CallbackVerifier, WebhookPayload};
use mandi_payment_engine::{
    db_types::{OrderStatusType, OutcomeApplied, PaymentOutcome, PaymentStatusType, TransactionStatus},
    events::EventProducers,
    traits::LedgerError,
    LedgerApi,
};
use mpg_common::Secret;

use super::{
    helpers::post_json,
    mocks::{sample_order, sample_transaction, MockLedger, REQUEST_ID},
};
use crate::webhook::PaymentWebhookRoute;

const SALT: &str = "test-mac-salt";

fn signed_payload(status: &str) -> WebhookPayload {
    let mut payload = WebhookPayload {
        payment_id: "MOJO5a06005J21512197".to_string(),
        payment_request_id: REQUEST_ID.to_string(),
        status: status.to_string(),
        amount: "1023.00".to_string(),
        buyer_name: "Ramesh Thela".to_string(),
        buyer_email: "ramesh@example.com".to_string(),
        buyer_phone: "+919876543210".to_string(),
        purpose: "Mandi order MND-4f2a81c9".to_string(),
        fees: "23.00".to_string(),
        mac: String::new(),
    };
    payload.mac = callback_mac(&payload, SALT);
    payload
}

fn configure(mock: MockLedger) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = LedgerApi::new(mock, EventProducers::default());
        cfg.service(PaymentWebhookRoute::<MockLedger>::new())
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(CallbackVerifier::new(Secret::new(SALT.to_string()))));
    }
}

#[actix_web::test]
async fn verified_credit_webhook_settles_the_transaction() {
    let _ = env_logger::try_init().ok();
    let mut mock = MockLedger::new();
    mock.expect_fetch_transaction_by_payment_request()
        .withf(|id| id.as_str() == REQUEST_ID)
        .returning(|_| Ok(Some(sample_transaction(TransactionStatus::Pending))));
    mock.expect_apply_payment_outcome()
        .withf(|id, outcome, raw| *id == 7 && *outcome == PaymentOutcome::Success && raw.is_some())
        .returning(|_, _, _| {
            Ok(OutcomeApplied::Applied {
                order: sample_order(OrderStatusType::Confirmed, PaymentStatusType::Paid),
                transaction: sample_transaction(TransactionStatus::Success),
            })
        });

    let (status, body) = post_json("/payment", &[], &signed_payload("Credit"), configure(mock)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""success":true"#), "unexpected body: {body}");
}

#[actix_web::test]
async fn non_credit_status_is_applied_as_a_failure() {
    let _ = env_logger::try_init().ok();
    let mut mock = MockLedger::new();
    mock.expect_fetch_transaction_by_payment_request()
        .returning(|_| Ok(Some(sample_transaction(TransactionStatus::Pending))));
    mock.expect_apply_payment_outcome()
        .withf(|_, outcome, _| *outcome == PaymentOutcome::Failed)
        .returning(|_, _, _| {
            Ok(OutcomeApplied::Applied {
                order: sample_order(OrderStatusType::Cancelled, PaymentStatusType::Failed),
                transaction: sample_transaction(TransactionStatus::Failed),
            })
        });

    let (status, body) = post_json("/payment", &[], &signed_payload("Failed"), configure(mock)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""success":true"#), "unexpected body: {body}");
}

#[actix_web::test]
async fn replayed_webhook_still_answers_200() {
    let _ = env_logger::try_init().ok();
    let mut mock = MockLedger::new();
    mock.expect_fetch_transaction_by_payment_request()
        .returning(|_| Ok(Some(sample_transaction(TransactionStatus::Success))));
    mock.expect_apply_payment_outcome().returning(|_, _, _| {
        Ok(OutcomeApplied::AlreadyApplied {
            order: sample_order(OrderStatusType::Confirmed, PaymentStatusType::Paid),
            transaction: sample_transaction(TransactionStatus::Success),
        })
    });

    let (status, body) = post_json("/payment", &[], &signed_payload("Credit"), configure(mock)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("already recorded"), "unexpected body: {body}");
}

#[actix_web::test]
async fn tampered_payload_is_rejected_with_401_and_no_state_is_touched() {
    let _ = env_logger::try_init().ok();
    // No expectations: any ledger call would panic the test
    let mock = MockLedger::new();
    let mut payload = signed_payload("Credit");
    payload.amount = "1.00".to_string();

    let (status, _) = post_json("/payment", &[], &payload, configure(mock)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn malformed_body_is_rejected_with_400_and_no_state_is_touched() {
    let _ = env_logger::try_init().ok();
    let mock = MockLedger::new();
    let (status, _) = super::helpers::post_raw("/payment", r#"{"payment_id": 42"#, configure(mock)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn orphan_webhook_is_acknowledged_without_mutation() {
    let _ = env_logger::try_init().ok();
    let mut mock = MockLedger::new();
    mock.expect_fetch_transaction_by_payment_request().returning(|_| Ok(None));

    let (status, body) = post_json("/payment", &[], &signed_payload("Credit"), configure(mock)).await;
    // 200 so the gateway stops retrying something we can never resolve
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""success":false"#), "unexpected body: {body}");
}

#[actix_web::test]
async fn settlement_conflict_is_acknowledged_for_manual_review() {
    let _ = env_logger::try_init().ok();
    let mut mock = MockLedger::new();
    mock.expect_fetch_transaction_by_payment_request()
        .returning(|_| Ok(Some(sample_transaction(TransactionStatus::Failed))));
    mock.expect_apply_payment_outcome().returning(|_, _, _| {
        Err(LedgerError::StateConflict {
            transaction_id: 7,
            current: TransactionStatus::Failed,
            requested: TransactionStatus::Success,
        })
    });

    let (status, body) = post_json("/payment", &[], &signed_payload("Credit"), configure(mock)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Conflict recorded"), "unexpected body: {body}");
}

#[actix_web::test]
async fn transient_backend_failure_asks_the_gateway_to_redeliver() {
    let _ = env_logger::try_init().ok();
    let mut mock = MockLedger::new();
    mock.expect_fetch_transaction_by_payment_request()
        .returning(|_| Err(LedgerError::DatabaseError("database is locked".to_string())));

    let (status, _) = post_json("/payment", &[], &signed_payload("Credit"), configure(mock)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
