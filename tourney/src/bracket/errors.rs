//! Bracket error types.

use super::models::{MatchId, TeamId, TournamentId};
use crate::db::StoreError;
use thiserror::Error;

/// Rejected input. Caller-recoverable; nothing was written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Fewer than two entrants
    #[error("At least 2 teams are required to generate a bracket, got {0}")]
    TooFewTeams(usize),

    /// More entrants than round 1 can be sized for
    #[error("At most 2147483648 teams are supported in one bracket, got {0}")]
    TooManyTeams(usize),

    /// Same team listed twice
    #[error("Team {0} is listed more than once")]
    DuplicateTeam(TeamId),

    /// Blank team or tournament name
    #[error("name must not be empty")]
    EmptyName,

    /// Empty registration request
    #[error("team_ids must be a non-empty list")]
    NoTeams,

    /// Winner is on neither side of the match
    #[error("Winner team {winner_id} does not belong to match {match_id}")]
    WinnerNotInMatch { match_id: MatchId, winner_id: TeamId },

    /// Result already recorded
    #[error("Match {0} result has already been submitted")]
    AlreadyPlayed(MatchId),

    /// One side is still waiting on an earlier match
    #[error("Match {0} is awaiting an opponent")]
    AwaitingOpponent(MatchId),
}

/// Bracket errors
#[derive(Debug, Error)]
pub enum BracketError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("Teams not found: {0:?}")]
    TeamsNotFound(Vec<TeamId>),

    #[error("Bracket already generated for tournament {0}")]
    AlreadyGenerated(TournamentId),

    #[error("Conflicting update: {0}")]
    Conflict(String),

    #[error("Store error: {0}")]
    Store(StoreError),
}

/// Coarse classification used by outer layers to pick a response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Internal,
}

impl BracketError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BracketError::Validation(_) => ErrorKind::Validation,
            BracketError::TournamentNotFound(_)
            | BracketError::MatchNotFound(_)
            | BracketError::TeamsNotFound(_) => ErrorKind::NotFound,
            BracketError::AlreadyGenerated(_) | BracketError::Conflict(_) => ErrorKind::Conflict,
            BracketError::Store(_) => ErrorKind::Internal,
        }
    }

    /// Serialization failures and deadlocks; the whole transaction may be retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, BracketError::Store(StoreError::Transient(_)))
    }

    /// Get a client-safe error message that doesn't leak store internals
    pub fn client_message(&self) -> String {
        match self {
            BracketError::Store(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<StoreError> for BracketError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(detail) => BracketError::Conflict(detail),
            other => BracketError::Store(other),
        }
    }
}

/// Result type for bracket operations
pub type BracketResult<T> = Result<T, BracketError>;
