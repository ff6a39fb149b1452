use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use instamojo_tools::GatewayError;
use mandi_payment_engine::traits::LedgerError;
use mpg_common::fees::FeeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Invalid request. {0}")]
    ValidationError(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("The gateway declined the payment request. {0}")]
    GatewayRejected(String),
    #[error("The payment gateway could not be reached. {0}")]
    GatewayUnreachable(String),
    #[error("Settlement conflict. {0}")]
    StateConflict(String),
    #[error("Precondition failed. {0}")]
    PreconditionFailed(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingPrincipal => StatusCode::UNAUTHORIZED,
                AuthError::MalformedPrincipal(_) => StatusCode::BAD_REQUEST,
            },
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::StateConflict(_) => StatusCode::CONFLICT,
            Self::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
            // 502/503 let the checkout flow tell "retry as-is" apart from "this request is wrong"
            Self::GatewayRejected(_) => StatusCode::BAD_GATEWAY,
            Self::GatewayUnreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No authenticated principal was attached to the request.")]
    MissingPrincipal,
    #[error("The principal headers could not be read. {0}")]
    MalformedPrincipal(String),
}

impl From<LedgerError> for ServerError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::OrderNotFound(_) | LedgerError::TransactionNotFound(_) | LedgerError::PaymentRequestNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
            LedgerError::StateConflict { .. } | LedgerError::InvalidStatusChange { .. } => {
                Self::StateConflict(e.to_string())
            },
            LedgerError::PreconditionFailed(_) => Self::PreconditionFailed(e.to_string()),
            LedgerError::DatabaseError(_)
            | LedgerError::OrderAlreadyExists(_)
            | LedgerError::PaymentRequestAlreadyAttached(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<GatewayError> for ServerError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Validation(m) => Self::ValidationError(m),
            GatewayError::Rejected(m) => Self::GatewayRejected(m),
            GatewayError::ResponseFormat(m) => Self::GatewayRejected(m),
            GatewayError::Unreachable(m) => Self::GatewayUnreachable(m),
            GatewayError::Initialization(m) => Self::InitializeError(m),
        }
    }
}

impl From<FeeError> for ServerError {
    fn from(e: FeeError) -> Self {
        Self::ValidationError(e.to_string())
    }
}
