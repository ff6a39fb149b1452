use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewTransaction, OrderId, PaymentRequestId, Transaction, TransactionStatus},
    traits::LedgerError,
};

pub async fn insert_transaction(
    transaction: NewTransaction,
    conn: &mut SqliteConnection,
) -> Result<Transaction, LedgerError> {
    let transaction: Transaction = sqlx::query_as(
        r#"
            INSERT INTO transactions (
                order_id,
                amount,
                gateway_fee,
                commission,
                buyer_name,
                buyer_email,
                buyer_phone
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(transaction.order_id)
    .bind(transaction.amount)
    .bind(transaction.gateway_fee)
    .bind(transaction.commission)
    .bind(transaction.buyer_name)
    .bind(transaction.buyer_email)
    .bind(transaction.buyer_phone)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Transaction {} inserted for order {}", transaction.id, transaction.order_id);
    Ok(transaction)
}

pub async fn fetch_transaction(
    transaction_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, sqlx::Error> {
    let transaction =
        sqlx::query_as("SELECT * FROM transactions WHERE id = $1").bind(transaction_id).fetch_optional(conn).await?;
    Ok(transaction)
}

pub async fn fetch_by_payment_request(
    payment_request_id: &PaymentRequestId,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, sqlx::Error> {
    let transaction = sqlx::query_as("SELECT * FROM transactions WHERE payment_request_id = $1")
        .bind(payment_request_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(transaction)
}

/// Stores the gateway's assigned id on a transaction that does not carry one yet. The `IS NULL` guard keeps
/// the id write-once; the unique index keeps it one-transaction-per-request.
pub async fn attach_payment_request(
    transaction_id: i64,
    payment_request_id: &PaymentRequestId,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, LedgerError> {
    let result: Option<Transaction> = sqlx::query_as(
        "UPDATE transactions SET payment_request_id = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND \
         payment_request_id IS NULL RETURNING *",
    )
    .bind(payment_request_id.as_str())
    .bind(transaction_id)
    .fetch_optional(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => {
            LedgerError::PaymentRequestAlreadyAttached(payment_request_id.clone())
        },
        _ => LedgerError::from(e),
    })?;
    Ok(result)
}

/// The optimistic claim at the heart of settlement idempotency: the status write only lands while the row is
/// still `Pending`, so of any number of concurrent deliveries exactly one performs the transition and the
/// rest observe a terminal row. Returns `None` when the row was not pending (or does not exist).
pub(crate) async fn claim_pending(
    transaction_id: i64,
    to: TransactionStatus,
    gateway_response: Option<String>,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, LedgerError> {
    let result: Option<Transaction> = sqlx::query_as(
        "UPDATE transactions SET status = $1, gateway_response = COALESCE($2, gateway_response), updated_at = \
         CURRENT_TIMESTAMP WHERE id = $3 AND status = 'Pending' RETURNING *",
    )
    .bind(to.to_string())
    .bind(gateway_response)
    .bind(transaction_id)
    .fetch_optional(conn)
    .await?;
    Ok(result)
}

/// Same claim discipline for the refund transition, which starts from `Success` instead.
pub(crate) async fn claim_refund(
    transaction_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, LedgerError> {
    let result: Option<Transaction> = sqlx::query_as(
        "UPDATE transactions SET status = 'Refunded', updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND status = \
         'Success' RETURNING *",
    )
    .bind(transaction_id)
    .fetch_optional(conn)
    .await?;
    Ok(result)
}

/// Terminally fails every pending collection attempt for an order (the abandon-checkout path).
pub(crate) async fn fail_pending_for_order(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<u64, LedgerError> {
    let result = sqlx::query(
        "UPDATE transactions SET status = 'Failed', updated_at = CURRENT_TIMESTAMP WHERE order_id = $1 AND status = \
         'Pending'",
    )
    .bind(order_id.as_str())
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Pending transactions created more than `max_age_secs` seconds ago. The cutoff is computed inside SQLite
/// so it compares against `CURRENT_TIMESTAMP`-written columns in the same format.
pub async fn fetch_stale_pending(
    max_age_secs: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Transaction>, sqlx::Error> {
    let transactions = sqlx::query_as(
        "SELECT * FROM transactions WHERE status = 'Pending' AND created_at <= datetime('now', '-' || $1 || ' \
         seconds') ORDER BY created_at ASC",
    )
    .bind(max_age_secs)
    .fetch_all(conn)
    .await?;
    Ok(transactions)
}
