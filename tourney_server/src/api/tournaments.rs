//! Tournament API handlers.
//!
//! Registration, bracket generation and the read views of a tournament.
//!
//! # Examples
//!
//! Generate round 1 from the registered teams:
//! ```bash
//! curl -X POST http://localhost:3000/api/v1/tournaments/1/generate-bracket
//! ```
//!
//! Generate round 1 from an explicit list:
//! ```bash
//! curl -X POST http://localhost:3000/api/v1/tournaments/1/generate-bracket \
//!   -H "Content-Type: application/json" \
//!   -d '{"team_ids": [3, 4, 5, 6, 7]}'
//! ```

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tourney::bracket::models::{TeamId, TournamentId};
use tourney::{BracketSummary, BracketView, Match, Seeding, Standing, Tournament};

use super::{ApiJson, ApiResult, AppState, error_response};
use crate::{logging, metrics};
use std::time::Instant;

#[derive(Debug, Deserialize)]
pub struct CreateTournamentRequest {
    pub name: String,
    #[serde(default)]
    pub seeding: Seeding,
}

#[derive(Debug, Deserialize)]
pub struct RegisterTeamsRequest {
    pub team_ids: Vec<TeamId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterTeamsResponse {
    pub tournament_id: TournamentId,
    pub added_team_ids: Vec<TeamId>,
    pub total_teams: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateBracketRequest {
    /// Entrants; the registered teams are used when absent
    pub team_ids: Option<Vec<TeamId>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateBracketResponse {
    pub tournament_id: TournamentId,
    #[serde(flatten)]
    pub summary: BracketSummary,
}

/// Create a tournament.
///
/// Returns `201 Created` with the tournament. `seeding` is `"random"`
/// (default) or `"ranked"`.
pub async fn create_tournament(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateTournamentRequest>,
) -> ApiResult<(StatusCode, Json<Tournament>)> {
    let tournament = state
        .manager
        .create_tournament(&request.name, request.seeding)
        .await
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(tournament)))
}

/// Get a tournament, including its bracket shape once generated.
pub async fn get_tournament(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<Json<Tournament>> {
    state
        .manager
        .tournament(tournament_id)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Register teams into the tournament's leaderboard.
///
/// # Errors
///
/// - `400 Bad Request`: empty or malformed `team_ids`
/// - `404 Not Found`: unknown tournament or teams
/// - `409 Conflict`: the bracket has already been generated
pub async fn register_teams(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
    ApiJson(request): ApiJson<RegisterTeamsRequest>,
) -> ApiResult<Json<RegisterTeamsResponse>> {
    let summary = state
        .manager
        .register_teams(tournament_id, &request.team_ids)
        .await
        .map_err(error_response)?;

    Ok(Json(RegisterTeamsResponse {
        tournament_id,
        added_team_ids: summary.added_team_ids,
        total_teams: summary.total_teams,
    }))
}

/// Build round 1 of the bracket.
///
/// The body is optional. Without `team_ids` every registered team enters.
///
/// # Response
///
/// Returns `201 Created`:
/// ```json
/// {
///   "tournament_id": 1,
///   "num_teams": 5,
///   "num_rounds": 3,
///   "round1_slots": 8,
///   "round1_matches": 4,
///   "matches_created": 4,
///   "byes_advanced": 1
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: fewer than two teams or a duplicate entry
/// - `404 Not Found`: unknown tournament or teams
/// - `409 Conflict`: the bracket already exists
pub async fn generate_bracket(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
    request: Option<ApiJson<GenerateBracketRequest>>,
) -> ApiResult<(StatusCode, Json<GenerateBracketResponse>)> {
    let request = request.map(|ApiJson(r)| r).unwrap_or_default();

    let started = Instant::now();
    let summary = match request.team_ids {
        Some(team_ids) => state.manager.generate_bracket(tournament_id, &team_ids).await,
        None => state.manager.generate_for_registered(tournament_id).await,
    }
    .map_err(error_response)?;

    logging::log_performance("generate_bracket", started.elapsed().as_millis() as u64);
    metrics::brackets_generated_total(summary.num_teams);
    tracing::info!(
        tournament_id,
        num_teams = summary.num_teams,
        num_rounds = summary.num_rounds,
        byes = summary.byes_advanced,
        "Bracket generated"
    );

    Ok((
        StatusCode::CREATED,
        Json(GenerateBracketResponse {
            tournament_id,
            summary,
        }),
    ))
}

/// All matches ordered by round, then slot.
pub async fn list_matches(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<Json<Vec<Match>>> {
    state
        .manager
        .list_matches(tournament_id)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Matches grouped by round.
pub async fn get_bracket(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<Json<BracketView>> {
    state
        .manager
        .bracket_view(tournament_id)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Standings ordered by wins desc, points desc, losses asc.
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<Json<Vec<Standing>>> {
    state
        .manager
        .leaderboard(tournament_id)
        .await
        .map(Json)
        .map_err(error_response)
}
