use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use cafe_engine::{validation::FormErrors, AuthApiError, CatalogError, OrderFlowError, PaymentError};
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
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("{0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("{0}")]
    NoRecordFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    ValidationError(FormErrors),
    #[error("Payment gateway error. {0}")]
    GatewayError(String),
    #[error("The payment gateway rejected the request. {}", .0.join("; "))]
    GatewayRejected(Vec<String>),
}

impl ServerError {
    /// The structured error body every failed request returns: per-field messages for validation failures, and a
    /// single `_form` message for everything else.
    pub fn form_errors(&self) -> FormErrors {
        match self {
            Self::ValidationError(errors) => errors.clone(),
            Self::GatewayRejected(messages) => {
                messages.iter().fold(FormErrors::new(), |mut errors, m| {
                    errors.add(cafe_engine::validation::FORM_FIELD, m);
                    errors
                })
            },
            _ => FormErrors::form(self),
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
                AuthError::ExpiredToken => StatusCode::UNAUTHORIZED,
                AuthError::AccountNotFound => StatusCode::UNAUTHORIZED,
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
                AuthError::InvalidSignature => StatusCode::FORBIDDEN,
                AuthError::TokenIssueError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::GatewayError(_) => StatusCode::BAD_GATEWAY,
            Self::GatewayRejected(_) => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            error!("💻️ {self}");
        }
        let body = serde_json::to_string(&self.form_errors()).unwrap_or_else(|_| r#"{"status":"error"}"#.to_string());
        HttpResponse::build(self.status_code()).insert_header(ContentType::json()).body(body)
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("You must be logged in to do that.")]
    MissingToken,
    #[error("Session token is invalid. {0}")]
    InvalidToken(String),
    #[error("Session token has expired. Please log in again.")]
    ExpiredToken,
    #[error("User account not found.")]
    AccountNotFound,
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("The payment notification signature is invalid.")]
    InvalidSignature,
    #[error("Could not issue a session token. {0}")]
    TokenIssueError(String),
}

impl From<FormErrors> for ServerError {
    fn from(e: FormErrors) -> Self {
        Self::ValidationError(e)
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
            OrderFlowError::OrderNotFound(_) |
            OrderFlowError::OrderItemNotFound(_) |
            OrderFlowError::TableNotFound(_) |
            OrderFlowError::MenuNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::MenuNotAvailable(_) |
            OrderFlowError::TableNotAvailable(_) |
            OrderFlowError::IllegalStatusTransition(_) => Self::Conflict(e.to_string()),
            OrderFlowError::ValidationError(errors) => Self::ValidationError(errors),
        }
    }
}

impl From<CatalogError> for ServerError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
            CatalogError::MenuNotFound(_) | CatalogError::TableNotFound(_) => Self::NoRecordFound(e.to_string()),
            CatalogError::InUse(_) => Self::Conflict(e.to_string()),
            CatalogError::ValidationError(errors) => Self::ValidationError(errors),
        }
    }
}

impl From<AuthApiError> for ServerError {
    fn from(e: AuthApiError) -> Self {
        match e {
            AuthApiError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
            AuthApiError::EmailAlreadyRegistered => Self::Conflict(e.to_string()),
            AuthApiError::InvalidCredentials => Self::InvalidCredentials,
            AuthApiError::ProfileNotFound(_) => Self::NoRecordFound(e.to_string()),
            AuthApiError::ValidationError(errors) => Self::ValidationError(errors),
            AuthApiError::PasswordHashError(s) => Self::BackendError(s),
        }
    }
}

impl From<PaymentError> for ServerError {
    fn from(e: PaymentError) -> Self {
        match e {
            PaymentError::GatewayError(s) => Self::GatewayError(s),
            PaymentError::Rejected(messages) => Self::GatewayRejected(messages),
            PaymentError::InvalidSignature => Self::AuthenticationError(AuthError::InvalidSignature),
            PaymentError::NotPayable(reason) => Self::Conflict(reason),
            PaymentError::OrderFlow(e) => e.into(),
        }
    }
}
