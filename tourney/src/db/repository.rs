//! Store trait definitions for the bracket engine.
//!
//! All engine state changes go through a [`BracketTx`]: a transaction opened by
//! [`BracketStore::begin`]. Dropping a transaction without calling
//! [`BracketTx::commit`] rolls it back.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::bracket::models::{
    Match, MatchId, NewMatch, Seeding, Side, Standing, Team, TeamId, Tournament, TournamentId,
};

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Serialization failure or deadlock; safe to retry the transaction
    #[error("Transient store failure: {0}")]
    Transient(String),

    /// A row the transaction relies on has disappeared
    #[error("Row not found: {0}")]
    RowNotFound(String),

    /// Operation exceeded its time budget
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    /// Any other database error
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some("23505") => {
                    return StoreError::UniqueViolation(
                        db_err
                            .constraint()
                            .map(str::to_string)
                            .unwrap_or_else(|| db_err.message().to_string()),
                    );
                }
                Some("40001") | Some("40P01") => {
                    return StoreError::Transient(db_err.message().to_string());
                }
                _ => {}
            }
        }
        StoreError::Database(err)
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Entry point to a transactional store
#[async_trait]
pub trait BracketStore: Send + Sync {
    /// Open a transaction
    async fn begin(&self) -> StoreResult<Box<dyn BracketTx>>;

    /// Check that the store is reachable
    async fn health_check(&self) -> StoreResult<()>;
}

/// Operations available inside one transaction
#[async_trait]
pub trait BracketTx: Send {
    /// Register a team (registry collaborator)
    async fn create_team(&mut self, name: &str, members: Option<&str>) -> StoreResult<Team>;

    /// Create a tournament (registry collaborator)
    async fn create_tournament(&mut self, name: &str, seeding: Seeding) -> StoreResult<Tournament>;

    /// Every team ordered by id
    async fn list_teams(&mut self) -> StoreResult<Vec<Team>>;

    /// Teams among `ids` that exist
    async fn find_teams(&mut self, ids: &[TeamId]) -> StoreResult<Vec<Team>>;

    /// Read a tournament without locking it
    async fn find_tournament(&mut self, id: TournamentId) -> StoreResult<Option<Tournament>>;

    /// Read a tournament and hold it exclusively until the transaction ends
    async fn lock_tournament(&mut self, id: TournamentId) -> StoreResult<Option<Tournament>>;

    /// Persist the bracket shape written at generation time
    async fn set_bracket_shape(
        &mut self,
        id: TournamentId,
        total_rounds: u32,
        team_count: u32,
    ) -> StoreResult<()>;

    /// Number of match rows for a tournament
    async fn count_matches(&mut self, tournament_id: TournamentId) -> StoreResult<u64>;

    /// Matches of a tournament ordered by (round, slot)
    async fn list_matches(&mut self, tournament_id: TournamentId) -> StoreResult<Vec<Match>>;

    /// Matches of one round ordered by slot
    async fn round_matches(
        &mut self,
        tournament_id: TournamentId,
        round: u32,
    ) -> StoreResult<Vec<Match>>;

    /// Insert a match; fails with `UniqueViolation` if the position is taken
    async fn insert_match(&mut self, new: &NewMatch) -> StoreResult<Match>;

    /// Read a match and hold it exclusively until the transaction ends
    async fn lock_match(&mut self, id: MatchId) -> StoreResult<Option<Match>>;

    /// Mark a match played with the given winner
    async fn record_winner(&mut self, id: MatchId, winner_id: TeamId) -> StoreResult<Match>;

    /// Atomic upsert keyed by `(tournament, round, slot)` that writes only the
    /// column for `side`. Creates the match with the other side empty if absent.
    async fn place_team(
        &mut self,
        tournament_id: TournamentId,
        round: u32,
        slot: u32,
        side: Side,
        team_id: TeamId,
    ) -> StoreResult<Match>;

    /// Leaderboard rows of a tournament, with team names
    async fn standings(&mut self, tournament_id: TournamentId) -> StoreResult<Vec<Standing>>;

    /// Insert a zeroed leaderboard row. Returns false if it already existed.
    async fn insert_standing(
        &mut self,
        tournament_id: TournamentId,
        team_id: TeamId,
    ) -> StoreResult<bool>;

    /// Whether a leaderboard row exists
    async fn has_standing(
        &mut self,
        tournament_id: TournamentId,
        team_id: TeamId,
    ) -> StoreResult<bool>;

    /// Increment wins. Returns false if there is no row.
    async fn add_win(&mut self, tournament_id: TournamentId, team_id: TeamId)
    -> StoreResult<bool>;

    /// Increment losses. Returns false if there is no row.
    async fn add_loss(
        &mut self,
        tournament_id: TournamentId,
        team_id: TeamId,
    ) -> StoreResult<bool>;

    /// Make every write in this transaction visible
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
