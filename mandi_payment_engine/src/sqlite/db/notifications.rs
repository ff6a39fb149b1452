use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Notification, NotificationTemplate, OrderId},
    traits::LedgerError,
};

/// Adds a notification to the outbox. Call inside the same transaction as the state change that warrants it,
/// so the two commit or roll back together.
pub(crate) async fn schedule(
    order_id: &OrderId,
    recipient_id: &str,
    template: NotificationTemplate,
    payload: String,
    conn: &mut SqliteConnection,
) -> Result<Notification, LedgerError> {
    let notification = sqlx::query_as(
        r#"
            INSERT INTO notifications (order_id, recipient_id, template, payload)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(recipient_id)
    .bind(template.to_string())
    .bind(payload)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Scheduled {template} notification for {recipient_id} on order {order_id}");
    Ok(notification)
}

pub async fn unsent(limit: i64, conn: &mut SqliteConnection) -> Result<Vec<Notification>, sqlx::Error> {
    let notifications = sqlx::query_as("SELECT * FROM notifications WHERE sent_at IS NULL ORDER BY id ASC LIMIT $1")
        .bind(limit)
        .fetch_all(conn)
        .await?;
    Ok(notifications)
}

pub async fn mark_sent(notification_id: i64, conn: &mut SqliteConnection) -> Result<(), LedgerError> {
    sqlx::query("UPDATE notifications SET sent_at = CURRENT_TIMESTAMP WHERE id = $1 AND sent_at IS NULL")
        .bind(notification_id)
        .execute(conn)
        .await?;
    Ok(())
}
