use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use instamojo_tools::{CallbackVerifier, InstamojoApi};
use log::*;
use mandi_payment_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    run_migrations,
    LedgerApi,
    SqliteDatabase,
};

use crate::{
    checkout::CheckoutRoute,
    config::ServerConfig,
    errors::ServerError,
    notify::{dispatch_pending_notifications, start_notification_worker, LogNotifier},
    reconciliation::start_reconciliation_worker,
    routes::{health, AbandonOrderRoute, OrderByIdRoute, UpdateFulfilmentRoute},
    webhook::PaymentWebhookRoute,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    run_migrations(db.pool()).await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = InstamojoApi::new(config.instamojo.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;

    // Settled payments drain the notification outbox immediately; the periodic dispatcher below is the
    // crash-recovery retry path for the same rows.
    let mut hooks = EventHooks::default();
    {
        let db = db.clone();
        hooks.on_order_confirmed(move |event| {
            let db = db.clone();
            Box::pin(async move {
                debug!("📨️ Order {} confirmed; draining the notification outbox", event.order.order_id);
                let api = LedgerApi::new(db, EventProducers::default());
                if let Err(e) = dispatch_pending_notifications(&api, &LogNotifier).await {
                    warn!("📨️ Outbox drain after settlement failed: {e}. The dispatcher will retry.");
                }
            })
        });
    }
    let handlers = EventHandlers::new(16, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let _reconciler = start_reconciliation_worker(
        db.clone(),
        producers.clone(),
        gateway.clone(),
        config.reconcile_interval,
        config.pending_payment_timeout,
    );
    let _dispatcher = start_notification_worker(db.clone(), LogNotifier, config.notify_interval);

    let srv = create_server_instance(config, db, producers, gateway)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
    gateway: InstamojoApi,
) -> Result<Server, ServerError> {
    let verifier = CallbackVerifier::new(config.instamojo.mac_salt.clone());
    let srv = HttpServer::new(move || {
        let ledger_api = LedgerApi::new(db.clone(), producers.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("mps::access_log"))
            .app_data(web::Data::new(ledger_api))
            .app_data(web::Data::new(gateway.clone()))
            .app_data(web::Data::new(verifier.clone()));
        // Routes for authenticated marketplace principals
        let api_scope = web::scope("/api")
            .service(CheckoutRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(AbandonOrderRoute::<SqliteDatabase>::new())
            .service(UpdateFulfilmentRoute::<SqliteDatabase>::new());
        // The gateway's callback; authenticated by MAC, not by principal headers
        let webhook_scope = web::scope("/wh").service(PaymentWebhookRoute::<SqliteDatabase>::new());
        app.service(health).service(api_scope).service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
