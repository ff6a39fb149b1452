use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid payment request: {0}")]
    Validation(String),
    #[error("The gateway declined the request. {0}")]
    Rejected(String),
    #[error("Could not reach the payment gateway. {0}")]
    Unreachable(String),
    #[error("Could not make sense of the gateway response: {0}")]
    ResponseFormat(String),
}

impl GatewayError {
    /// Transport-level failures are worth re-attempting with a fresh payment request; the rest are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Unreachable(_))
    }
}
