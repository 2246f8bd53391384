//! HTTP API for the bracket engine.
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health                                      - Health check
//! GET  /api/v1/teams                                - List teams
//! POST /api/v1/teams                                - Create a team
//! POST /api/v1/tournaments                          - Create a tournament
//! GET  /api/v1/tournaments/{id}                     - Get a tournament
//! POST /api/v1/tournaments/{id}/teams               - Register teams
//! POST /api/v1/tournaments/{id}/generate-bracket    - Build round 1
//! GET  /api/v1/tournaments/{id}/matches             - All matches
//! GET  /api/v1/tournaments/{id}/bracket             - Matches grouped by round
//! GET  /api/v1/tournaments/{id}/leaderboard         - Standings
//! POST /api/v1/matches/{id}/result                  - Submit a result
//! ```
//!
//! Errors are returned as `{"error": "..."}` with 400 for rejected input
//! (including malformed JSON bodies),
//! 404 for unknown ids, 409 for conflicts and 500 for store failures.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tourney::{BracketManager, MemoryBracketStore};
//! use tourney_server::api::{AppState, create_router};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = BracketManager::new(Arc::new(MemoryBracketStore::new()));
//! let app = create_router(AppState::new(manager));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod matches;
pub mod request_id;
pub mod teams;
pub mod tournaments;

use axum::{
    Json, Router,
    extract::{FromRequest, OptionalFromRequest, Request, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tourney::{BracketError, BracketManager, ErrorKind};
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<BracketManager>,
}

impl AppState {
    pub fn new(manager: BracketManager) -> Self {
        Self {
            manager: Arc::new(manager),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler result carrying a JSON error body on failure
pub type ApiResult<T> = Result<T, (StatusCode, Json<ErrorResponse>)>;

/// Map a bracket error onto a status code and a client-safe message
pub fn error_response(err: BracketError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match err.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!(error = %err, "Bracket operation failed");
    } else {
        tracing::debug!(error = %err, status = %status, "Request rejected");
    }

    (
        status,
        Json(ErrorResponse {
            error: err.client_message(),
        }),
    )
}

/// JSON body extractor whose rejections use the API error format.
///
/// Malformed or incomplete bodies are answered with `400 Bad Request` and an
/// `{"error": ...}` body instead of axum's plain-text `422`.
pub struct ApiJson<T>(pub T);

fn json_rejection(rejection: JsonRejection) -> (StatusCode, Json<ErrorResponse>) {
    let error = rejection.body_text();
    tracing::debug!(error = %error, "Request body rejected");
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error }))
}

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match <Json<T> as FromRequest<S>>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

/// An absent body (no JSON content type) extracts as `None`.
impl<T, S> OptionalFromRequest<S> for ApiJson<T>
where
    Json<T>: OptionalFromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        match <Json<T> as OptionalFromRequest<S>>::from_request(req, state).await {
            Ok(value) => Ok(value.map(|Json(value)| ApiJson(value))),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let root_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .merge(root_routes)
        .nest("/api/v1", create_v1_router())
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/teams", get(teams::list_teams).post(teams::create_team))
        .route("/tournaments", post(tournaments::create_tournament))
        .route("/tournaments/{tournament_id}", get(tournaments::get_tournament))
        .route(
            "/tournaments/{tournament_id}/teams",
            post(tournaments::register_teams),
        )
        .route(
            "/tournaments/{tournament_id}/generate-bracket",
            post(tournaments::generate_bracket),
        )
        .route(
            "/tournaments/{tournament_id}/matches",
            get(tournaments::list_matches),
        )
        .route(
            "/tournaments/{tournament_id}/bracket",
            get(tournaments::get_bracket),
        )
        .route(
            "/tournaments/{tournament_id}/leaderboard",
            get(tournaments::get_leaderboard),
        )
        .route("/matches/{match_id}/result", post(matches::submit_result))
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the store answers, `503 Service Unavailable`
/// otherwise.
///
/// ```bash
/// curl http://localhost:3000/health
/// # {"status":"healthy","version":"0.1.0","database":true,"timestamp":"..."}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_healthy = match state.manager.health_check().await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(error = %err, "Health check failed");
            false
        }
    };

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
