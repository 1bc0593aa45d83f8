use serde::{Deserialize, Serialize};

/// API error codes returned by billing endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    DatabaseError,
    GatewayError,
    InvalidSignature,
    InvalidInput,
    ValidationError,
    NotFound,
    Forbidden,
    InsufficientSeats,
    OwnerSeatProtected,
    Conflict,
    RateLimited,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DatabaseError => "DATABASE_ERROR",
            Self::GatewayError => "GATEWAY_ERROR",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::InvalidInput => "INVALID_INPUT",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::InsufficientSeats => "INSUFFICIENT_SEATS",
            Self::OwnerSeatProtected => "OWNER_SEAT_PROTECTED",
            Self::Conflict => "CONFLICT",
            Self::RateLimited => "RATE_LIMITED",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
