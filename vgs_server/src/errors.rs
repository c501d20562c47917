use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use log::error;
use thiserror::Error;
use vgs_engine::{OrderFlowError, PricingError};

use crate::data_objects::JsonResponse;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("No such item: {0}")]
    InvalidItem(String),
    #[error("Wallet payments are currently disabled")]
    WalletDisabled,
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("An upstream provider is unavailable. {0}")]
    UpstreamError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidItem(_) => StatusCode::BAD_REQUEST,
            Self::WalletDisabled => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::UpstreamError(_) => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Builds the client-facing JSON body. Internal faults keep their detail in the server log
    /// only; the client sees a generic message.
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("💻️ Internal server error: {self}");
            return HttpResponse::build(status)
                .json(JsonResponse::failure("An internal server error occurred. Please try again later."));
        }
        HttpResponse::build(status).json(JsonResponse::failure(self))
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("An authentication token is required for this endpoint.")]
    MissingToken,
    #[error("Authentication token is invalid. {0}")]
    InvalidToken(String),
    #[error("The authorization header is not in the correct format.")]
    PoorlyFormattedHeader,
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::Pricing(PricingError::InvalidItem { game, item }) => Self::InvalidItem(format!("{game}/{item}")),
            OrderFlowError::Pricing(PricingError::Catalog(e)) => Self::UpstreamError(e.to_string()),
            OrderFlowError::WalletDisabled => Self::WalletDisabled,
            OrderFlowError::OrderNotFound(id) => Self::NoRecordFound(format!("Order {id}")),
            OrderFlowError::Forbidden => Self::InsufficientPermissions("This order belongs to another buyer".to_string()),
            OrderFlowError::Gateway(e) => Self::UpstreamError(e.to_string()),
            OrderFlowError::Store(e) => Self::BackendError(e.to_string()),
        }
    }
}
