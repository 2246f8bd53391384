//! Team API handler.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tourney::Team;

use super::{ApiJson, ApiResult, AppState, error_response};

#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub name: String,
    /// Free-text member list
    pub members: Option<String>,
}

/// Create a team.
///
/// Returns `201 Created` with the team, or `409 Conflict` if the name is
/// taken.
pub async fn create_team(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateTeamRequest>,
) -> ApiResult<(StatusCode, Json<Team>)> {
    let team = state
        .manager
        .create_team(&request.name, request.members.as_deref())
        .await
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(team)))
}

/// List every team ordered by id.
pub async fn list_teams(State(state): State<AppState>) -> ApiResult<Json<Vec<Team>>> {
    state
        .manager
        .list_teams()
        .await
        .map(Json)
        .map_err(error_response)
}
