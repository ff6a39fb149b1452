use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::{
    config::InstamojoConfig,
    data_objects::{NewPaymentRequest, PaymentRequest, PollStatus},
    error::GatewayError,
    validation::validate_payment_request,
};

#[derive(Clone)]
pub struct InstamojoApi {
    config: InstamojoConfig,
    client: Arc<Client>,
}

impl InstamojoApi {
    pub fn new(config: InstamojoConfig) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::with_capacity(2);
        let key = HeaderValue::from_str(config.api_key.reveal().as_str())
            .map_err(|e| GatewayError::Initialization(e.to_string()))?;
        let token = HeaderValue::from_str(config.auth_token.reveal().as_str())
            .map_err(|e| GatewayError::Initialization(e.to_string()))?;
        headers.insert("X-Api-Key", key);
        headers.insert("X-Auth-Token", token);
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| GatewayError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &InstamojoConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Asks the gateway to open a payment request and returns its id plus the hosted checkout URL.
    ///
    /// This call is deliberately never retried here: the creation endpoint is not idempotent, and re-POSTing
    /// after an ambiguous transport failure could leave two live payment requests for one order. Callers that
    /// want to retry must mint a fresh transaction first.
    pub async fn create_payment_request(&self, request: &NewPaymentRequest) -> Result<PaymentRequest, GatewayError> {
        validate_payment_request(request)?;
        #[derive(Serialize)]
        struct Body<'a> {
            purpose: &'a str,
            amount: String,
            buyer_name: &'a str,
            email: &'a str,
            phone: &'a str,
            redirect_url: &'a str,
            webhook: &'a str,
            send_email: bool,
            send_sms: bool,
            allow_repeated_payments: bool,
        }
        #[derive(Deserialize)]
        struct CreateResponse {
            success: bool,
            payment_request: Option<PaymentRequest>,
            message: Option<serde_json::Value>,
        }
        let body = Body {
            purpose: &request.purpose,
            amount: request.amount.to_rupee_string(),
            buyer_name: &request.buyer_name,
            email: &request.buyer_email,
            phone: &request.buyer_phone,
            redirect_url: &self.config.redirect_url,
            webhook: &self.config.webhook_url,
            send_email: self.config.send_email,
            send_sms: self.config.send_sms,
            allow_repeated_payments: false,
        };
        debug!("💳️ Requesting gateway collection of {} for '{}'", request.amount, request.purpose);
        let response = self
            .client
            .post(self.url("/payment-requests/"))
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Unreachable(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.map_err(|e| GatewayError::Unreachable(e.to_string()))?;
            warn!("💳️ Gateway declined payment request creation. HTTP {status}. {message}");
            return Err(GatewayError::Rejected(format!("HTTP {status}. {message}")));
        }
        let payload: CreateResponse =
            response.json().await.map_err(|e| GatewayError::ResponseFormat(e.to_string()))?;
        match payload {
            CreateResponse { success: true, payment_request: Some(created), .. } => {
                info!("💳️ Payment request {} created for {}", created.id, request.amount);
                Ok(created)
            },
            CreateResponse { message, .. } => {
                let message =
                    message.map(|m| m.to_string()).unwrap_or_else(|| "Gateway gave no reason".to_string());
                warn!("💳️ Gateway declined payment request creation. {message}");
                Err(GatewayError::Rejected(message))
            },
        }
    }

    /// Polling fallback for when a webhook is suspected lost.
    ///
    /// A 404 from the gateway means the request has not settled (or not propagated) yet and is reported as
    /// [`PollStatus::Pending`] rather than an error, so the reconciliation sweep can simply try again later.
    pub async fn payment_status(&self, payment_request_id: &str) -> Result<PollStatus, GatewayError> {
        #[derive(Deserialize)]
        struct PaymentEntry {
            status: String,
        }
        #[derive(Deserialize)]
        struct RequestStatus {
            #[serde(default)]
            payments: Vec<PaymentEntry>,
        }
        #[derive(Deserialize)]
        struct StatusResponse {
            payment_request: Option<RequestStatus>,
        }
        trace!("💳️ Polling gateway for payment request {payment_request_id}");
        let response = self
            .client
            .get(self.url(&format!("/payment-requests/{payment_request_id}/")))
            .send()
            .await
            .map_err(|e| GatewayError::Unreachable(e.to_string()))?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("💳️ Gateway does not know payment request {payment_request_id} yet. Treating as pending.");
            return Ok(PollStatus::Pending);
        }
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.map_err(|e| GatewayError::Unreachable(e.to_string()))?;
            return Err(GatewayError::Rejected(format!("HTTP {status}. {message}")));
        }
        let payload: StatusResponse =
            response.json().await.map_err(|e| GatewayError::ResponseFormat(e.to_string()))?;
        let request = payload
            .payment_request
            .ok_or_else(|| GatewayError::ResponseFormat("Status response carried no payment_request".to_string()))?;
        let result = if request.payments.iter().any(|p| p.status == "Credit") {
            PollStatus::Credit
        } else if request.payments.iter().any(|p| p.status == "Failed") {
            PollStatus::Failed
        } else {
            PollStatus::Pending
        };
        trace!("💳️ Payment request {payment_request_id} polled as {result}");
        Ok(result)
    }
}
