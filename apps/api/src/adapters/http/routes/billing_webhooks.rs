//! Gateway webhook endpoint.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::json;
use tracing::{error, info, warn};

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    use_cases::webhook::{WebhookOutcome, is_retryable_error},
};

pub const SIGNATURE_HEADER: &str = "stripe-signature";

pub fn router() -> Router<AppState> {
    Router::new().route("/webhook", post(handle_webhook))
}

/// Returns 500 Internal Server Error so the gateway redelivers the event.
fn webhook_retryable_error(error: &AppError, event_type: &str, event_id: &str) -> Response {
    error!(
        error = %error,
        event_type,
        event_id,
        retryable = true,
        "Webhook processing failed, returning 500 for gateway retry"
    );
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "received": false })),
    )
        .into_response()
}

/// POST /api/billing/webhook
///
/// Signature and payload errors answer 400. Once the event is authentic,
/// transient failures answer 500 and everything else is acknowledged.
async fn handle_webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let event = app_state
        .webhook_use_cases
        .verify_event(&body, signature)?;

    match app_state.webhook_use_cases.handle_event(&event).await {
        Ok(WebhookOutcome::Ignored) => {}
        Ok(outcome) => {
            info!(event_id = %event.id, event_type = %event.event_type, ?outcome, "Webhook processed");
        }
        Err(e) if is_retryable_error(&e) => {
            return Ok(webhook_retryable_error(&e, &event.event_type, &event.id));
        }
        Err(e) => {
            warn!(
                error = %e,
                event_id = %event.id,
                event_type = %event.event_type,
                retryable = false,
                "Webhook event dropped"
            );
        }
    }

    Ok((StatusCode::OK, Json(json!({ "received": true }))).into_response())
}
