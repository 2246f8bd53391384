//! Match result API handler.
//!
//! ```bash
//! curl -X POST http://localhost:3000/api/v1/matches/12/result \
//!   -H "Content-Type: application/json" \
//!   -d '{"winner_id": 4}'
//! ```

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tourney::Progress;
use tourney::bracket::models::{MatchId, TeamId};

use super::request_id::RequestId;
use super::{ApiJson, ApiResult, AppState, error_response};
use crate::metrics;

#[derive(Debug, Deserialize)]
pub struct SubmitResultRequest {
    pub winner_id: TeamId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResultResponse {
    pub match_id: MatchId,
    pub winner_id: TeamId,
    pub played: bool,
    pub tournament_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub champion_id: Option<TeamId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_match_id: Option<MatchId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_match_ready: Option<bool>,
}

/// Record the winner of a match.
///
/// # Response
///
/// Returns `200 OK`, either with `champion_id` once the final is decided or
/// with the match the winner moved into:
/// ```json
/// {
///   "match_id": 12,
///   "winner_id": 4,
///   "played": true,
///   "tournament_complete": false,
///   "next_match_id": 15,
///   "next_match_ready": true
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing `winner_id`, winner not in the match, match already played, or
///   still awaiting an opponent
/// - `404 Not Found`: unknown match
/// - `409 Conflict`: concurrent updates could not be serialized
pub async fn submit_result(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(match_id): Path<MatchId>,
    ApiJson(request): ApiJson<SubmitResultRequest>,
) -> ApiResult<Json<SubmitResultResponse>> {
    let outcome = state
        .manager
        .submit_result(match_id, request.winner_id)
        .await
        .map_err(|err| {
            metrics::result_rejections_total(err.kind());
            error_response(err)
        })?;

    metrics::results_submitted_total();

    let response = match outcome.progress {
        Progress::Complete { champion_id } => {
            metrics::tournaments_completed_total();
            tracing::info!(
                request_id = %request_id.as_str(),
                match_id,
                champion_id,
                "Tournament complete"
            );
            SubmitResultResponse {
                match_id,
                winner_id: outcome.winner_id,
                played: true,
                tournament_complete: true,
                champion_id: Some(champion_id),
                next_match_id: None,
                next_match_ready: None,
            }
        }
        Progress::Advanced {
            next_match_id,
            next_match_ready,
        } => SubmitResultResponse {
            match_id,
            winner_id: outcome.winner_id,
            played: true,
            tournament_complete: false,
            champion_id: None,
            next_match_id: Some(next_match_id),
            next_match_ready: Some(next_match_ready),
        },
    };

    Ok(Json(response))
}
