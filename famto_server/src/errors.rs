use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use famto_engine::traits::{DispatchError, GatewayError, OrderFlowError};
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    /// The request is valid, but the order or task is not in a state that allows it
    #[error("{0}")]
    Conflict(String),
    #[error("The payment provider could not complete the request. {0}")]
    PaymentProviderError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PaymentProviderError(_) => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            error!("💻️ {self}");
        }
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
            OrderFlowError::OrderNotFound(_) | OrderFlowError::CustomerNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::InvalidStateTransition { .. } |
            OrderFlowError::TaskNotAssigned(_) |
            OrderFlowError::RefundInProgress(_) => Self::Conflict(e.to_string()),
            OrderFlowError::InvalidOrder(_) => Self::InvalidRequestBody(e.to_string()),
            OrderFlowError::PaymentGatewayFailure(g) => g.into(),
            OrderFlowError::Dispatch(d) => d.into(),
            OrderFlowError::TaskCreationError(_) | OrderFlowError::Refund(_) | OrderFlowError::Money(_) => {
                Self::BackendError(e.to_string())
            },
        }
    }
}

impl From<DispatchError> for ServerError {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
            DispatchError::OrderNotFound(_) | DispatchError::TaskNotFound(_) | DispatchError::AgentNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
            DispatchError::NoTaskRequired(_) => Self::Conflict(e.to_string()),
        }
    }
}

impl From<GatewayError> for ServerError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::NotConfigured(_) => Self::ConfigurationError(e.to_string()),
            _ => Self::PaymentProviderError(e.to_string()),
        }
    }
}
