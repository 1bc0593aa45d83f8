//! Checkout, portal and entitlement endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
};
use billing_types::Subscription;
use serde::Deserialize;

use crate::{
    adapters::http::app_state::AppState,
    app_error::AppResult,
    use_cases::checkout::{CheckoutInput, TeamCheckoutInput},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(create_checkout))
        .route("/checkout/team", post(create_team_checkout))
        .route("/portal", post(create_portal))
        .route("/subscription/{user_id}", get(get_subscription))
        .route("/entitlement/{user_id}", get(get_entitlement))
}

fn default_true() -> bool {
    true
}

// Missing string fields deserialize as empty and are rejected with 400 by the use case.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutRequest {
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    user_email: String,
    #[serde(default)]
    price_id: String,
    success_url: Option<String>,
    cancel_url: Option<String>,
    #[serde(default = "default_true")]
    trial_enabled: bool,
    #[serde(default = "default_true")]
    require_payment_method: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TeamCheckoutRequest {
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    team_id: String,
    #[serde(default)]
    price_id: String,
    quantity: Option<u32>,
    success_url: Option<String>,
    cancel_url: Option<String>,
    #[serde(default = "default_true")]
    trial_enabled: bool,
    #[serde(default = "default_true")]
    require_payment_method: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PortalRequest {
    #[serde(default)]
    user_id: String,
    return_url: Option<String>,
}

/// POST /api/billing/checkout
async fn create_checkout(
    State(app_state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<impl IntoResponse> {
    let session = app_state
        .checkout_use_cases
        .create_checkout_session(CheckoutInput {
            user_id: payload.user_id,
            user_email: payload.user_email,
            price_id: payload.price_id,
            team_id: None,
            quantity: None,
            success_url: payload.success_url,
            cancel_url: payload.cancel_url,
            trial_enabled: payload.trial_enabled,
            require_payment_method: payload.require_payment_method,
        })
        .await?;

    Ok(Json(session))
}

/// POST /api/billing/checkout/team
async fn create_team_checkout(
    State(app_state): State<AppState>,
    Json(payload): Json<TeamCheckoutRequest>,
) -> AppResult<impl IntoResponse> {
    let session = app_state
        .checkout_use_cases
        .create_team_checkout_session(
            &payload.user_id,
            &payload.team_id,
            TeamCheckoutInput {
                price_id: payload.price_id,
                quantity: payload.quantity,
                success_url: payload.success_url,
                cancel_url: payload.cancel_url,
                trial_enabled: payload.trial_enabled,
                require_payment_method: payload.require_payment_method,
            },
        )
        .await?;

    Ok(Json(session))
}

/// POST /api/billing/portal
async fn create_portal(
    State(app_state): State<AppState>,
    Json(payload): Json<PortalRequest>,
) -> AppResult<impl IntoResponse> {
    let session = app_state
        .checkout_use_cases
        .create_portal_session(&payload.user_id, payload.return_url)
        .await?;

    Ok(Json(session))
}

/// GET /api/billing/subscription/{user_id}
///
/// The effective subscription, or `null`.
async fn get_subscription(
    State(app_state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<Option<Subscription>> {
    Json(app_state.resolver_use_cases.resolve(&user_id).await.subscription)
}

/// GET /api/billing/entitlement/{user_id}
async fn get_entitlement(
    State(app_state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    Json(app_state.resolver_use_cases.resolve(&user_id).await)
}
