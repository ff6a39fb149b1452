//! Notification dispatch.
//!
//! The ledger writes notifications into a durable outbox in the same database transaction as the settlement
//! that warrants them; this module drains that outbox through the [`Notifier`] collaborator. Delivery is
//! at-least-once: a row is only marked sent after the notifier accepts it, and the periodic worker re-drains
//! anything a crash or a failed delivery left behind. The settlement event hook calls
//! [`dispatch_pending_notifications`] too, so the common case is delivered within milliseconds rather than a
//! worker tick.

use log::*;
use mandi_payment_engine::{db_types::NotificationTemplate, traits::{LedgerDatabase, LedgerError}, LedgerApi};
use thiserror::Error;
use tokio::task::JoinHandle;

const DISPATCH_BATCH: i64 = 50;

#[derive(Debug, Error)]
#[error("Notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// The delivery collaborator. How a notification becomes an email, SMS or push message is entirely the
/// implementor's business; the settlement core only says who, what kind, and with which payload.
pub trait Notifier {
    fn notify(
        &self,
        recipient_id: &str,
        template: NotificationTemplate,
        payload: &str,
    ) -> impl std::future::Future<Output = Result<(), NotifyError>> + Send;
}

/// The default binding: delivery is some other system's job, so just put the hand-off on record.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify(
        &self,
        recipient_id: &str,
        template: NotificationTemplate,
        payload: &str,
    ) -> Result<(), NotifyError> {
        info!("📨️ [{template}] → {recipient_id}: {payload}");
        Ok(())
    }
}

/// Drains up to one batch of unsent outbox rows. Failed deliveries stay queued for the next drain.
pub async fn dispatch_pending_notifications<B, N>(api: &LedgerApi<B>, notifier: &N) -> Result<usize, LedgerError>
where
    B: LedgerDatabase,
    N: Notifier,
{
    let pending = api.unsent_notifications(DISPATCH_BATCH).await?;
    let mut delivered = 0;
    for note in pending {
        match notifier.notify(&note.recipient_id, note.template, &note.payload).await {
            Ok(()) => {
                api.mark_notification_sent(note.id).await?;
                delivered += 1;
            },
            Err(e) => {
                warn!("📨️ Could not deliver notification {} for order {}: {e}. It stays queued.", note.id, note.order_id);
            },
        }
    }
    Ok(delivered)
}

/// Starts the periodic outbox drain. Do not await the returned JoinHandle, as it runs indefinitely.
pub fn start_notification_worker<B, N>(db: B, notifier: N, interval: std::time::Duration) -> JoinHandle<()>
where
    B: LedgerDatabase + Clone + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let api = LedgerApi::new(db, Default::default());
        let mut timer = tokio::time::interval(interval);
        info!("📨️ Notification dispatcher started");
        loop {
            timer.tick().await;
            match dispatch_pending_notifications(&api, &notifier).await {
                Ok(0) => trace!("📨️ Outbox is empty"),
                Ok(n) => debug!("📨️ Delivered {n} queued notification(s)"),
                Err(e) => error!("📨️ Outbox drain failed: {e}"),
            }
        }
    })
}
