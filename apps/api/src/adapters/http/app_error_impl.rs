use crate::app_error::{AppError, ErrorCode};
use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::warn!(error = %self, "Request rejected");
        }

        let code = self.code();
        match self {
            AppError::InvalidInput(msg) | AppError::ValidationError(msg) => {
                error_resp(status, code, Some(msg))
            }
            AppError::InvalidSignature(_) => {
                error_resp(status, code, Some("Invalid webhook signature".into()))
            }
            AppError::InsufficientSeats { .. } | AppError::OwnerSeatProtected => {
                error_resp(status, code, Some(self.to_string()))
            }
            // Upstream and storage details stay in the logs.
            _ => error_resp(status, code, None),
        }
    }
}

pub(crate) fn status_for(error: &AppError) -> StatusCode {
    match error {
        AppError::InvalidSignature(_)
        | AppError::Unattributable(_)
        | AppError::InvalidInput(_)
        | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
        AppError::Forbidden => StatusCode::FORBIDDEN,
        AppError::NotFound => StatusCode::NOT_FOUND,
        AppError::Conflict => StatusCode::CONFLICT,
        AppError::InsufficientSeats { .. } | AppError::OwnerSeatProtected => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        AppError::Gateway(_) | AppError::Database(_) | AppError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_resp(status: StatusCode, code: ErrorCode, message: Option<String>) -> Response {
    let body = match message {
        Some(msg) => serde_json::json!({ "code": code.as_str(), "message": msg }),
        None => serde_json::json!({ "code": code.as_str() }),
    };
    (status, Json(body)).into_response()
}
