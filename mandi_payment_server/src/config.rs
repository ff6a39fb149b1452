use std::env;

use chrono::Duration;
use instamojo_tools::InstamojoConfig;
use log::*;

const DEFAULT_MPS_HOST: &str = "127.0.0.1";
const DEFAULT_MPS_PORT: u16 = 8360;
/// How often the reconciliation sweep wakes up.
const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 60;
/// How long a transaction may sit in `Pending` before the sweep starts polling the gateway about it.
const DEFAULT_PENDING_PAYMENT_TIMEOUT: Duration = Duration::minutes(30);
/// How often the notification dispatcher re-drains the outbox (crash-recovery path; the event hook drains
/// immediately in the common case).
const DEFAULT_NOTIFY_INTERVAL_SECS: u64 = 15;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub instamojo: InstamojoConfig,
    pub reconcile_interval: std::time::Duration,
    pub pending_payment_timeout: Duration,
    pub notify_interval: std::time::Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MPS_HOST.to_string(),
            port: DEFAULT_MPS_PORT,
            database_url: String::default(),
            instamojo: InstamojoConfig::default(),
            reconcile_interval: std::time::Duration::from_secs(DEFAULT_RECONCILE_INTERVAL_SECS),
            pending_payment_timeout: DEFAULT_PENDING_PAYMENT_TIMEOUT,
            notify_interval: std::time::Duration::from_secs(DEFAULT_NOTIFY_INTERVAL_SECS),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("MPS_HOST").ok().unwrap_or_else(|| DEFAULT_MPS_HOST.into());
        let port = env::var("MPS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for MPS_PORT. {e} Using the default, {DEFAULT_MPS_PORT}, instead."
                    );
                    DEFAULT_MPS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_MPS_PORT);
        let database_url = env::var("MPS_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ MPS_DATABASE_URL is not set. Please set it to the URL for the ledger database.");
            String::default()
        });
        let instamojo = InstamojoConfig::new_from_env_or_default();
        let reconcile_interval = std::time::Duration::from_secs(parse_secs(
            "MPS_RECONCILE_INTERVAL_SECS",
            DEFAULT_RECONCILE_INTERVAL_SECS,
        ));
        let pending_payment_timeout = Duration::seconds(parse_secs(
            "MPS_PENDING_PAYMENT_TIMEOUT_SECS",
            DEFAULT_PENDING_PAYMENT_TIMEOUT.num_seconds() as u64,
        ) as i64);
        let notify_interval =
            std::time::Duration::from_secs(parse_secs("MPS_NOTIFY_INTERVAL_SECS", DEFAULT_NOTIFY_INTERVAL_SECS));
        Self { host, port, database_url, instamojo, reconcile_interval, pending_payment_timeout, notify_interval }
    }
}

fn parse_secs(var: &str, default: u64) -> u64 {
    env::var(var)
        .map_err(|_| info!("🪛️ {var} is not set. Using the default value of {default} seconds."))
        .and_then(|s| {
            s.parse::<u64>().map_err(|e| warn!("🪛️ Invalid configuration value for {var}. {e}"))
        })
        .ok()
        .unwrap_or(default)
}
