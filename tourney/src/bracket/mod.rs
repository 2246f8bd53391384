//! Single-elimination brackets.
//!
//! [`builder`] lays out round 1, [`engine`] advances winners, [`ledger`]
//! keeps the standings. [`BracketManager`] runs each of them inside one store
//! transaction.

pub mod builder;
pub mod config;
pub mod engine;
pub mod errors;
pub mod layout;
pub mod ledger;
pub mod manager;
pub mod models;
pub mod seeding;

pub use config::EngineConfig;
pub use errors::{BracketError, BracketResult, ErrorKind, ValidationError};
pub use layout::BracketLayout;
pub use manager::BracketManager;
pub use models::{
    AdvanceOutcome, BracketSummary, BracketType, BracketView, Match, MatchId, Progress,
    RegistrationSummary, Seeding, Side, Standing, Team, TeamId, Tournament, TournamentId,
};
