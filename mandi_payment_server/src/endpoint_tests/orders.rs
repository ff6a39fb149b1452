use actix_web::{http::StatusCode, web, web::ServiceConfig};
use mandi_payment_engine::{
    db_types::{OrderStatusType, PaymentStatusType},
    events::EventProducers,
    traits::LedgerError,
    LedgerApi,
};

use super::{
    helpers::{get_request, post_json, principal_headers},
    mocks::{sample_order, MockLedger, SUPPLIER_ID, VENDOR_ID},
};
use crate::{
    data_objects::FulfilmentUpdate,
    routes::{AbandonOrderRoute, OrderByIdRoute, UpdateFulfilmentRoute},
};

fn configure(mock: MockLedger) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = LedgerApi::new(mock, EventProducers::default());
        cfg.service(OrderByIdRoute::<MockLedger>::new())
            .service(AbandonOrderRoute::<MockLedger>::new())
            .service(UpdateFulfilmentRoute::<MockLedger>::new())
            .app_data(web::Data::new(api));
    }
}

#[actix_web::test]
async fn parties_to_the_order_can_read_it() {
    let _ = env_logger::try_init().ok();
    for (user, role) in [(VENDOR_ID, "vendor"), (SUPPLIER_ID, "supplier"), ("ops-1", "admin")] {
        let mut mock = MockLedger::new();
        mock.expect_fetch_order_by_order_id()
            .returning(|_| Ok(Some(sample_order(OrderStatusType::Confirmed, PaymentStatusType::Paid))));
        let headers = principal_headers(user, role);
        let (status, body) = get_request("/orders/MND-4f2a81c9", &headers, configure(mock)).await;
        assert_eq!(status, StatusCode::OK, "{role} should see the order");
        assert!(body.contains("MND-4f2a81c9"));
    }
}

#[actix_web::test]
async fn strangers_cannot_read_the_order() {
    let _ = env_logger::try_init().ok();
    let mut mock = MockLedger::new();
    mock.expect_fetch_order_by_order_id()
        .returning(|_| Ok(Some(sample_order(OrderStatusType::Confirmed, PaymentStatusType::Paid))));
    let headers = principal_headers("someone-else", "vendor");
    let (status, _) = get_request("/orders/MND-4f2a81c9", &headers, configure(mock)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn missing_order_is_a_404() {
    let _ = env_logger::try_init().ok();
    let mut mock = MockLedger::new();
    mock.expect_fetch_order_by_order_id().returning(|_| Ok(None));
    let headers = principal_headers(VENDOR_ID, "vendor");
    let (status, _) = get_request("/orders/MND-00000000", &headers, configure(mock)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn only_the_ordering_vendor_can_abandon() {
    let _ = env_logger::try_init().ok();
    let mut mock = MockLedger::new();
    mock.expect_fetch_order_by_order_id()
        .returning(|_| Ok(Some(sample_order(OrderStatusType::Pending, PaymentStatusType::Pending))));
    let headers = principal_headers(SUPPLIER_ID, "supplier");
    let (status, _) =
        post_json("/orders/MND-4f2a81c9/abandon", &headers, &serde_json::json!({}), configure(mock)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn vendor_abandons_a_pending_order() {
    let _ = env_logger::try_init().ok();
    let mut mock = MockLedger::new();
    mock.expect_fetch_order_by_order_id()
        .returning(|_| Ok(Some(sample_order(OrderStatusType::Pending, PaymentStatusType::Pending))));
    mock.expect_cancel_unpaid_order()
        .returning(|_| Ok(sample_order(OrderStatusType::Cancelled, PaymentStatusType::Failed)));
    let headers = principal_headers(VENDOR_ID, "vendor");
    let (status, body) =
        post_json("/orders/MND-4f2a81c9/abandon", &headers, &serde_json::json!({}), configure(mock)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Cancelled"), "unexpected body: {body}");
}

#[actix_web::test]
async fn fulfilment_step_on_unpaid_order_is_a_412() {
    let _ = env_logger::try_init().ok();
    let mut mock = MockLedger::new();
    mock.expect_fetch_order_by_order_id()
        .returning(|_| Ok(Some(sample_order(OrderStatusType::Pending, PaymentStatusType::Pending))));
    mock.expect_update_fulfilment_status().returning(|order_id, _, _| {
        Err(LedgerError::PreconditionFailed(format!("Order {order_id} has payment status Pending")))
    });
    let headers = principal_headers(SUPPLIER_ID, "supplier");
    let body = FulfilmentUpdate { status: OrderStatusType::Processing };
    let (status, _) = post_json("/orders/MND-4f2a81c9/fulfilment", &headers, &body, configure(mock)).await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
}

#[actix_web::test]
async fn supplier_advances_a_paid_order() {
    let _ = env_logger::try_init().ok();
    let mut mock = MockLedger::new();
    mock.expect_fetch_order_by_order_id()
        .returning(|_| Ok(Some(sample_order(OrderStatusType::Confirmed, PaymentStatusType::Paid))));
    mock.expect_update_fulfilment_status()
        .withf(|_, from, to| *from == OrderStatusType::Confirmed && *to == OrderStatusType::Processing)
        .returning(|_, _, _| Ok(sample_order(OrderStatusType::Processing, PaymentStatusType::Paid)));
    let headers = principal_headers(SUPPLIER_ID, "supplier");
    let body = FulfilmentUpdate { status: OrderStatusType::Processing };
    let (status, response) = post_json("/orders/MND-4f2a81c9/fulfilment", &headers, &body, configure(mock)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(response.contains("Processing"), "unexpected body: {response}");
}

#[actix_web::test]
async fn cancelling_via_fulfilment_is_not_a_thing() {
    let _ = env_logger::try_init().ok();
    let mut mock = MockLedger::new();
    mock.expect_fetch_order_by_order_id()
        .returning(|_| Ok(Some(sample_order(OrderStatusType::Confirmed, PaymentStatusType::Paid))));
    let headers = principal_headers(SUPPLIER_ID, "supplier");
    let body = FulfilmentUpdate { status: OrderStatusType::Cancelled };
    let (status, _) = post_json("/orders/MND-4f2a81c9/fulfilment", &headers, &body, configure(mock)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
