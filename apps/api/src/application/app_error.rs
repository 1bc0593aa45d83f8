use thiserror::Error;

pub use billing_types::ErrorCode;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("Too many requests. Please slow down.")]
    RateLimited,

    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(String),

    #[error("Event cannot be attributed to a subject: {0}")]
    Unattributable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("No seats available: {assigned} of {quantity} assigned")]
    InsufficientSeats { quantity: u32, assigned: u32 },

    #[error("The team owner's seat cannot be unassigned")]
    OwnerSeatProtected,

    #[error("Concurrent modification, retry the request")]
    Conflict,

    #[error("Not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::Gateway(_) => ErrorCode::GatewayError,
            AppError::RateLimited => ErrorCode::RateLimited,
            AppError::InvalidSignature(_) => ErrorCode::InvalidSignature,
            AppError::Unattributable(_) => ErrorCode::InvalidInput,
            AppError::InvalidInput(_) => ErrorCode::InvalidInput,
            AppError::ValidationError(_) => ErrorCode::ValidationError,
            AppError::Forbidden => ErrorCode::Forbidden,
            AppError::InsufficientSeats { .. } => ErrorCode::InsufficientSeats,
            AppError::OwnerSeatProtected => ErrorCode::OwnerSeatProtected,
            AppError::Conflict => ErrorCode::Conflict,
            AppError::NotFound => ErrorCode::NotFound,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("Serialization failed: {}", err))
    }
}

pub type AppResult<T> = Result<T, AppError>;
