use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType, PaymentOutcome},
    traits::LedgerError,
};

/// Inserts a new order using the given connection. This is not atomic on its own; embed the call inside a
/// transaction and pass `&mut *tx` as the connection argument when it must commit together with other writes.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, LedgerError> {
    let order_id = order.order_id.clone();
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                vendor_id,
                supplier_id,
                subtotal,
                delivery_charge,
                commission,
                total_price
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(order.order_id)
    .bind(order.vendor_id)
    .bind(order.supplier_id)
    .bind(order.subtotal)
    .bind(order.delivery_charge)
    .bind(order.commission)
    .bind(order.total_price)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => LedgerError::OrderAlreadyExists(order_id),
        _ => LedgerError::from(e),
    })?;
    debug!("📝️ Order {} inserted with id {}", order.order_id, order.id);
    Ok(order)
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Mirrors a settlement outcome onto the order's two status axes. Callers guarantee (via the transaction
/// claim) that this runs at most once per settled transaction.
pub(crate) async fn apply_payment_outcome(
    order_id: &OrderId,
    outcome: PaymentOutcome,
    conn: &mut SqliteConnection,
) -> Result<Order, LedgerError> {
    let result: Option<Order> = sqlx::query_as(
        "UPDATE orders SET payment_status = $1, status = $2, updated_at = CURRENT_TIMESTAMP WHERE order_id = $3 \
         RETURNING *",
    )
    .bind(outcome.payment_status().to_string())
    .bind(outcome.order_status().to_string())
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    result.ok_or_else(|| LedgerError::OrderNotFound(order_id.clone()))
}

/// Records a refund on the payment axis. Fulfilment status is left alone; whatever logistics state the order
/// reached still happened.
pub(crate) async fn apply_refund(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Order, LedgerError> {
    let result: Option<Order> = sqlx::query_as(
        "UPDATE orders SET payment_status = 'Refunded', updated_at = CURRENT_TIMESTAMP WHERE order_id = $1 RETURNING *",
    )
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    result.ok_or_else(|| LedgerError::OrderNotFound(order_id.clone()))
}

/// Advances the fulfilment status, but only if the order really is in `from` and its payment has settled.
/// Returns `None` when the guard does not match; the caller diagnoses which precondition failed.
pub(crate) async fn update_fulfilment(
    order_id: &OrderId,
    from: OrderStatusType,
    to: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, LedgerError> {
    let result: Option<Order> = sqlx::query_as(
        "UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE order_id = $2 AND status = $3 AND \
         payment_status = 'Paid' RETURNING *",
    )
    .bind(to.to_string())
    .bind(order_id.as_str())
    .bind(from.to_string())
    .fetch_optional(conn)
    .await?;
    Ok(result)
}

/// Cancels an order that is still pending on both axes. Returns `None` if the guard does not match.
pub(crate) async fn cancel_unpaid(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, LedgerError> {
    let result: Option<Order> = sqlx::query_as(
        "UPDATE orders SET status = 'Cancelled', payment_status = 'Failed', updated_at = CURRENT_TIMESTAMP WHERE \
         order_id = $1 AND status = 'Pending' AND payment_status = 'Pending' RETURNING *",
    )
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(result)
}
