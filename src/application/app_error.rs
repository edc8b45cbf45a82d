use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found")]
    NotFound,

    /// Non-2xx response from the payment gateway. Carries the HTTP status and
    /// the raw provider body; callers must not assume any error JSON shape.
    #[error("Payment gateway error: status {status}")]
    Gateway { status: u16, body: String },

    /// Transport failure or timeout talking to the gateway. The outcome of
    /// the remote call is unknown; no entitlement action may follow.
    #[error("Payment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether a webhook delivery that hit this error should be retried by
    /// the gateway (5xx) or acknowledged and dropped (2xx/4xx).
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Database(_) => true,
            AppError::Internal(_) => true,
            AppError::Gateway { .. } => true,
            AppError::GatewayUnavailable(_) => true,

            AppError::InvalidInput(_) => false,
            AppError::NotFound => false,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum ErrorCode {
    DatabaseError,
    InvalidInput,
    NotFound,
    GatewayError,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::GatewayError => "GATEWAY_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
