use chrono::{Duration, TimeZone, Utc};
use mandi_payment_engine::{
    db_types::{
        NewOrder,
        NewTransaction,
        Notification,
        Order,
        OrderId,
        OrderStatusType,
        OutcomeApplied,
        PaymentOutcome,
        PaymentRequestId,
        PaymentStatusType,
        Transaction,
        TransactionStatus,
    },
    traits::{LedgerDatabase, LedgerError, OrderRepository, TransactionRepository},
};
use mockall::mock;
use mpg_common::Paise;

mock! {
    pub Ledger {}

    impl OrderRepository for Ledger {
        async fn insert_order_with_transaction(
            &self,
            order: NewOrder,
            transaction: NewTransaction,
        ) -> Result<(Order, Transaction), LedgerError>;
        async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, LedgerError>;
        async fn update_fulfilment_status(
            &self,
            order_id: &OrderId,
            from: OrderStatusType,
            to: OrderStatusType,
        ) -> Result<Order, LedgerError>;
    }

    impl TransactionRepository for Ledger {
        async fn fetch_transaction(&self, transaction_id: i64) -> Result<Option<Transaction>, LedgerError>;
        async fn fetch_transaction_by_payment_request(
            &self,
            payment_request_id: &PaymentRequestId,
        ) -> Result<Option<Transaction>, LedgerError>;
        async fn attach_payment_request(
            &self,
            transaction_id: i64,
            payment_request_id: &PaymentRequestId,
        ) -> Result<Transaction, LedgerError>;
        async fn fetch_stale_pending_transactions(&self, max_age: Duration) -> Result<Vec<Transaction>, LedgerError>;
    }

    impl LedgerDatabase for Ledger {
        fn url(&self) -> &str;
        async fn apply_payment_outcome(
            &self,
            transaction_id: i64,
            outcome: PaymentOutcome,
            gateway_response: Option<String>,
        ) -> Result<OutcomeApplied, LedgerError>;
        async fn apply_refund(&self, transaction_id: i64) -> Result<OutcomeApplied, LedgerError>;
        async fn cancel_unpaid_order(&self, order_id: &OrderId) -> Result<Order, LedgerError>;
        async fn unsent_notifications(&self, limit: i64) -> Result<Vec<Notification>, LedgerError>;
        async fn mark_notification_sent(&self, notification_id: i64) -> Result<(), LedgerError>;
    }
}

pub const VENDOR_ID: &str = "vendor-42";
pub const SUPPLIER_ID: &str = "supplier-7";
pub const REQUEST_ID: &str = "d66cb29dd059482e8072999f995c4eef";

pub fn sample_order(status: OrderStatusType, payment_status: PaymentStatusType) -> Order {
    Order {
        id: 1,
        order_id: OrderId("MND-4f2a81c9".to_string()),
        vendor_id: VENDOR_ID.to_string(),
        supplier_id: SUPPLIER_ID.to_string(),
        subtotal: Paise::from_rupees(950),
        delivery_charge: Paise::from_rupees(50),
        commission: Paise::from_rupees(25),
        total_price: Paise::from_rupees(1000),
        status,
        payment_status,
        created_at: Utc.with_ymd_and_hms(2024, 6, 10, 9, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 6, 10, 9, 30, 0).unwrap(),
    }
}

pub fn sample_transaction(status: TransactionStatus) -> Transaction {
    Transaction {
        id: 7,
        order_id: OrderId("MND-4f2a81c9".to_string()),
        payment_request_id: Some(PaymentRequestId(REQUEST_ID.to_string())),
        amount: Paise::from_rupees(1023),
        gateway_fee: Paise::from_rupees(23),
        commission: Paise::from_rupees(25),
        buyer_name: "Ramesh Thela".to_string(),
        buyer_email: "ramesh@example.com".to_string(),
        buyer_phone: "+919876543210".to_string(),
        status,
        gateway_response: None,
        created_at: Utc.with_ymd_and_hms(2024, 6, 10, 9, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 6, 10, 9, 30, 0).unwrap(),
    }
}
