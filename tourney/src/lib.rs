//! # Tourney
//!
//! A single-elimination tournament bracket engine.
//!
//! Round 1 is built from any number of teams (two or more). When the count is
//! not a power of two the bracket is padded with byes, and a team with no
//! opponent is advanced automatically. Each submitted result marks its match
//! played, updates the standings and places the winner into the next round,
//! until the final produces a champion.
//!
//! ## Core Modules
//!
//! - [`bracket`]: layout arithmetic, seeding, builder, advancement engine,
//!   standings ledger and the [`BracketManager`] façade
//! - [`db`]: the transactional store seam with PostgreSQL and in-memory
//!   implementations
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use tourney::{BracketManager, MemoryBracketStore, Seeding};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), tourney::BracketError> {
//! let manager = BracketManager::new(Arc::new(MemoryBracketStore::new()));
//! let tournament = manager.create_tournament("Open", Seeding::Ranked).await?;
//! let a = manager.create_team("Alpha", None).await?;
//! let b = manager.create_team("Bravo", None).await?;
//!
//! manager.register_teams(tournament.id, &[a.id, b.id]).await?;
//! let summary = manager.generate_for_registered(tournament.id).await?;
//! assert_eq!(summary.num_rounds, 1);
//!
//! let final_match = &manager.list_matches(tournament.id).await?[0];
//! let outcome = manager.submit_result(final_match.id, a.id).await?;
//! assert_eq!(outcome.champion_id(), Some(a.id));
//! # Ok(())
//! # }
//! ```

/// Bracket construction and advancement.
pub mod bracket;
pub use bracket::{
    AdvanceOutcome, BracketError, BracketManager, BracketResult, BracketSummary, BracketView,
    EngineConfig, ErrorKind, Match, Progress, Seeding, Standing, Team, Tournament,
    ValidationError,
};

/// Persistence: connection pool and bracket stores.
pub mod db;
pub use db::{BracketStore, Database, DatabaseConfig, MemoryBracketStore, PgBracketStore};
