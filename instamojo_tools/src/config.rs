use log::*;
use mpg_common::Secret;

const DEFAULT_BASE_URL: &str = "https://www.instamojo.com/api/1.1";

/// Everything the gateway client needs, injected at construction.
///
/// The webhook and redirect URLs are fixed per deployment and are always sent from here; they are never taken
/// from checkout request input, so a buyer cannot point the gateway's callback at a host of their choosing.
#[derive(Debug, Clone, Default)]
pub struct InstamojoConfig {
    pub base_url: String,
    pub api_key: Secret<String>,
    pub auth_token: Secret<String>,
    /// Shared secret for the webhook `mac` field. Known only to us and the gateway.
    pub mac_salt: Secret<String>,
    /// Where the gateway sends the buyer after a completed payment.
    pub redirect_url: String,
    /// Where the gateway posts payment outcomes.
    pub webhook_url: String,
    /// Let the gateway send its own email/SMS receipts to the buyer.
    pub send_email: bool,
    pub send_sms: bool,
}

impl InstamojoConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("MPS_INSTAMOJO_BASE_URL").unwrap_or_else(|_| {
            info!("MPS_INSTAMOJO_BASE_URL not set, using the production endpoint");
            DEFAULT_BASE_URL.to_string()
        });
        let api_key = Secret::new(std::env::var("MPS_INSTAMOJO_API_KEY").unwrap_or_else(|_| {
            error!("MPS_INSTAMOJO_API_KEY is not set. Payment request creation will be refused by the gateway.");
            String::default()
        }));
        let auth_token = Secret::new(std::env::var("MPS_INSTAMOJO_AUTH_TOKEN").unwrap_or_else(|_| {
            error!("MPS_INSTAMOJO_AUTH_TOKEN is not set. Payment request creation will be refused by the gateway.");
            String::default()
        }));
        let mac_salt = Secret::new(std::env::var("MPS_INSTAMOJO_MAC_SALT").unwrap_or_else(|_| {
            error!("MPS_INSTAMOJO_MAC_SALT is not set. Incoming webhooks cannot be authenticated without it.");
            String::default()
        }));
        let redirect_url = std::env::var("MPS_PAYMENT_REDIRECT_URL").unwrap_or_else(|_| {
            warn!("MPS_PAYMENT_REDIRECT_URL not set, using a (probably useless) default");
            "http://localhost:3000/payment/complete".to_string()
        });
        let webhook_url = std::env::var("MPS_PAYMENT_WEBHOOK_URL").unwrap_or_else(|_| {
            warn!("MPS_PAYMENT_WEBHOOK_URL not set, using a (probably useless) default");
            "http://localhost:8360/wh/payment".to_string()
        });
        let send_email = std::env::var("MPS_GATEWAY_SEND_EMAIL").map(|s| &s == "1" || &s == "true").unwrap_or(true);
        let send_sms = std::env::var("MPS_GATEWAY_SEND_SMS").map(|s| &s == "1" || &s == "true").unwrap_or(false);
        Self { base_url, api_key, auth_token, mac_salt, redirect_url, webhook_url, send_email, send_sms }
    }
}
