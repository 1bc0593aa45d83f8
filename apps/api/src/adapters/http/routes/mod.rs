pub mod billing;
pub mod billing_webhooks;
pub mod teams;

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::adapters::http::app_state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/billing", billing::router().merge(billing_webhooks::router()))
        .nest("/teams", teams::router())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
