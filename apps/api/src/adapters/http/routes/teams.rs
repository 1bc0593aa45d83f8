//! Team membership and seat endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use billing_types::TeamRole;
use serde::Deserialize;

use crate::{
    adapters::http::app_state::AppState,
    app_error::AppResult,
    use_cases::teams::NewMemberInput,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_team))
        .route("/{team_id}/members", get(list_members).post(add_member))
        .route("/{team_id}/members/{member_id}", delete(remove_member))
        .route("/{team_id}/seats", get(seat_summary))
        .route(
            "/{team_id}/seats/{member_id}",
            post(assign_seat).delete(unassign_seat),
        )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTeamRequest {
    owner_id: String,
    owner_email: String,
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddMemberRequest {
    actor_id: String,
    user_id: String,
    email: String,
    #[serde(default = "default_role")]
    role: TeamRole,
}

fn default_role() -> TeamRole {
    TeamRole::Member
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActorRequest {
    actor_id: String,
}

/// POST /api/teams
async fn create_team(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateTeamRequest>,
) -> AppResult<impl IntoResponse> {
    let team = app_state
        .team_use_cases
        .create_team(&payload.owner_id, &payload.owner_email, &payload.name)
        .await?;

    Ok((StatusCode::CREATED, Json(team)))
}

/// GET /api/teams/{team_id}/members
async fn list_members(
    State(app_state): State<AppState>,
    Path(team_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let members = app_state.team_use_cases.list_members(&team_id).await?;
    Ok(Json(members))
}

/// POST /api/teams/{team_id}/members
async fn add_member(
    State(app_state): State<AppState>,
    Path(team_id): Path<String>,
    Json(payload): Json<AddMemberRequest>,
) -> AppResult<impl IntoResponse> {
    let member = app_state
        .team_use_cases
        .add_member(
            &team_id,
            &payload.actor_id,
            NewMemberInput {
                member_id: payload.user_id,
                email: payload.email,
                role: payload.role,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(member)))
}

/// DELETE /api/teams/{team_id}/members/{member_id}
async fn remove_member(
    State(app_state): State<AppState>,
    Path((team_id, member_id)): Path<(String, String)>,
    Json(payload): Json<ActorRequest>,
) -> AppResult<StatusCode> {
    app_state
        .team_use_cases
        .remove_member(&team_id, &payload.actor_id, &member_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/teams/{team_id}/seats
async fn seat_summary(
    State(app_state): State<AppState>,
    Path(team_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let summary = app_state.seat_use_cases.seat_summary(&team_id).await?;
    Ok(Json(summary))
}

/// POST /api/teams/{team_id}/seats/{member_id}
async fn assign_seat(
    State(app_state): State<AppState>,
    Path((team_id, member_id)): Path<(String, String)>,
    Json(payload): Json<ActorRequest>,
) -> AppResult<impl IntoResponse> {
    let member = app_state
        .seat_use_cases
        .assign_seat(&team_id, &member_id, &payload.actor_id)
        .await?;
    Ok(Json(member))
}

/// DELETE /api/teams/{team_id}/seats/{member_id}
async fn unassign_seat(
    State(app_state): State<AppState>,
    Path((team_id, member_id)): Path<(String, String)>,
    Json(payload): Json<ActorRequest>,
) -> AppResult<impl IntoResponse> {
    let member = app_state
        .seat_use_cases
        .unassign_seat(&team_id, &member_id, &payload.actor_id)
        .await?;
    Ok(Json(member))
}
