//! The reconciliation sweep.
//!
//! Webhooks get lost: the gateway's delivery can fail, our process can be down, or the original gateway call
//! can die after the local order insert. Any of those leaves a transaction stuck in `Pending` with nobody
//! coming to settle it. This worker periodically picks up pending transactions older than the configured
//! timeout and resolves them: polled `Credit`/`Failed` results run through exactly the same
//! `apply_payment_outcome` path as a webhook would have, and transactions that never reached the gateway at
//! all are failed locally. Polling happens with no ledger lock held.

use chrono::Duration;
use instamojo_tools::{InstamojoApi, PollStatus};
use log::*;
use mandi_payment_engine::{
    db_types::{PaymentOutcome, Transaction},
    events::EventProducers,
    traits::{LedgerDatabase, LedgerError},
    LedgerApi,
};
use tokio::task::JoinHandle;

/// Starts the reconciliation sweep. Do not await the returned JoinHandle, as it runs indefinitely.
pub fn start_reconciliation_worker<B>(
    db: B,
    producers: EventProducers,
    gateway: InstamojoApi,
    interval: std::time::Duration,
    pending_timeout: Duration,
) -> JoinHandle<()>
where
    B: LedgerDatabase + Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let api = LedgerApi::new(db, producers);
        let mut timer = tokio::time::interval(interval);
        info!("🕰️ Payment reconciliation sweep started (pending timeout: {} min)", pending_timeout.num_minutes());
        loop {
            timer.tick().await;
            match run_sweep(&api, &gateway, pending_timeout).await {
                Ok(0) => trace!("🕰️ No stale pending transactions"),
                Ok(n) => info!("🕰️ Reconciled {n} stale pending transaction(s)"),
                Err(e) => error!("🕰️ Reconciliation sweep failed: {e}"),
            }
        }
    })
}

async fn run_sweep<B: LedgerDatabase>(
    api: &LedgerApi<B>,
    gateway: &InstamojoApi,
    pending_timeout: Duration,
) -> Result<usize, LedgerError> {
    let stale = api.stale_pending_transactions(pending_timeout).await?;
    if stale.is_empty() {
        return Ok(0);
    }
    debug!("🕰️ {} stale pending transaction(s) to reconcile", stale.len());
    let mut resolved = 0;
    for transaction in stale {
        if reconcile_one(api, gateway, &transaction).await {
            resolved += 1;
        }
    }
    Ok(resolved)
}

/// Resolves a single stale transaction if it can; one bad apple must not abort the sweep.
async fn reconcile_one<B: LedgerDatabase>(
    api: &LedgerApi<B>,
    gateway: &InstamojoApi,
    transaction: &Transaction,
) -> bool {
    let outcome = match &transaction.payment_request_id {
        Some(request_id) => match gateway.payment_status(request_id.as_str()).await {
            Ok(PollStatus::Credit) => PaymentOutcome::Success,
            Ok(PollStatus::Failed) => PaymentOutcome::Failed,
            Ok(PollStatus::Pending) => {
                trace!("🕰️ Transaction {} is still pending at the gateway; leaving it alone", transaction.id);
                return false;
            },
            Err(e) => {
                warn!("🕰️ Could not poll payment request {request_id}: {e}. Will retry next sweep.");
                return false;
            },
        },
        // The gateway call never succeeded at checkout, so no callback will ever arrive
        None => {
            info!("🕰️ Transaction {} never reached the gateway; failing it locally", transaction.id);
            PaymentOutcome::Failed
        },
    };
    let raw = format!(r#"{{"reconciled_by":"sweep","outcome":"{outcome}"}}"#);
    match api.apply_payment_outcome(transaction.id, outcome, Some(raw)).await {
        Ok(applied) if applied.is_fresh() => {
            info!("🕰️ Transaction {} reconciled as {outcome} for order {}", transaction.id, applied.order().order_id);
            true
        },
        Ok(_) => {
            debug!("🕰️ Transaction {} was settled while we were polling; nothing to do", transaction.id);
            false
        },
        Err(e) => {
            // StateConflict lands here too; the ledger has already logged it loudly
            warn!("🕰️ Could not apply {outcome} to transaction {}: {e}", transaction.id);
            false
        },
    }
}
