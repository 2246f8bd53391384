//! Bracket manager: transactional façade over the builder, engine and ledger.

use super::builder;
use super::config::EngineConfig;
use super::engine;
use super::errors::{BracketError, BracketResult, ValidationError};
use super::ledger;
use super::models::{
    AdvanceOutcome, BracketSummary, BracketView, Match, MatchId, RegistrationSummary, Seeding,
    Standing, Team, TeamId, Tournament, TournamentId,
};
use super::seeding;
use crate::db::BracketStore;
use crate::db::timeouts::with_timeout;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

/// Bracket manager
#[derive(Clone)]
pub struct BracketManager {
    store: Arc<dyn BracketStore>,
    config: EngineConfig,
}

impl BracketManager {
    /// Create a new bracket manager with default tuning
    pub fn new(store: Arc<dyn BracketStore>) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    pub fn with_config(store: Arc<dyn BracketStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Check that the underlying store answers
    pub async fn health_check(&self) -> BracketResult<()> {
        with_timeout(self.config.transaction_timeout, async {
            self.store.health_check().await?;
            Ok::<_, BracketError>(())
        })
        .await
    }

    /// Create a team. Names are unique; a clash is a conflict.
    pub async fn create_team(&self, name: &str, members: Option<&str>) -> BracketResult<Team> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        self.retrying("create_team", move || async move {
            let mut tx = self.store.begin().await?;
            let team = tx.create_team(name, members).await?;
            tx.commit().await?;
            Ok::<_, BracketError>(team)
        })
        .await
    }

    /// All teams ordered by id
    pub async fn list_teams(&self) -> BracketResult<Vec<Team>> {
        with_timeout(self.config.transaction_timeout, async {
            let mut tx = self.store.begin().await?;
            Ok::<_, BracketError>(tx.list_teams().await?)
        })
        .await
    }

    /// Create a tournament with the given seeding policy
    pub async fn create_tournament(&self, name: &str, seeding: Seeding) -> BracketResult<Tournament> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        self.retrying("create_tournament", move || async move {
            let mut tx = self.store.begin().await?;
            let tournament = tx.create_tournament(name, seeding).await?;
            tx.commit().await?;
            log::info!("Created tournament {} ({})", tournament.id, tournament.name);
            Ok::<_, BracketError>(tournament)
        })
        .await
    }

    /// Register teams into a tournament's leaderboard ahead of generation
    pub async fn register_teams(
        &self,
        tournament_id: TournamentId,
        team_ids: &[TeamId],
    ) -> BracketResult<RegistrationSummary> {
        self.retrying("register_teams", move || async move {
            let mut tx = self.store.begin().await?;
            let summary = ledger::register_teams(tx.as_mut(), tournament_id, team_ids).await?;
            tx.commit().await?;
            Ok::<_, BracketError>(summary)
        })
        .await
    }

    /// Generate round 1 for `team_ids`.
    ///
    /// Fails with [`BracketError::AlreadyGenerated`] if any match exists for
    /// the tournament. Nothing is written on failure.
    pub async fn generate_bracket(
        &self,
        tournament_id: TournamentId,
        team_ids: &[TeamId],
    ) -> BracketResult<BracketSummary> {
        self.retrying("generate_bracket", move || {
            self.generate_once(tournament_id, Some(team_ids))
        })
        .await
    }

    /// Generate round 1 from every team registered in the tournament
    pub async fn generate_for_registered(
        &self,
        tournament_id: TournamentId,
    ) -> BracketResult<BracketSummary> {
        self.retrying("generate_bracket", move || {
            self.generate_once(tournament_id, None)
        })
        .await
    }

    /// Record the winner of a match and advance them
    pub async fn submit_result(
        &self,
        match_id: MatchId,
        winner_id: TeamId,
    ) -> BracketResult<AdvanceOutcome> {
        self.retrying("submit_result", move || async move {
            let mut tx = self.store.begin().await?;
            let outcome = engine::submit_result(tx.as_mut(), match_id, winner_id).await?;
            tx.commit().await?;
            Ok::<_, BracketError>(outcome)
        })
        .await
    }

    /// Get tournament information
    pub async fn tournament(&self, tournament_id: TournamentId) -> BracketResult<Tournament> {
        with_timeout(self.config.transaction_timeout, async {
            let mut tx = self.store.begin().await?;
            tx.find_tournament(tournament_id)
                .await?
                .ok_or(BracketError::TournamentNotFound(tournament_id))
        })
        .await
    }

    /// All matches of a tournament ordered by round then slot
    pub async fn list_matches(&self, tournament_id: TournamentId) -> BracketResult<Vec<Match>> {
        with_timeout(self.config.transaction_timeout, async {
            let mut tx = self.store.begin().await?;
            tx.find_tournament(tournament_id)
                .await?
                .ok_or(BracketError::TournamentNotFound(tournament_id))?;
            Ok::<_, BracketError>(tx.list_matches(tournament_id).await?)
        })
        .await
    }

    /// Matches grouped by round
    pub async fn bracket_view(&self, tournament_id: TournamentId) -> BracketResult<BracketView> {
        with_timeout(self.config.transaction_timeout, async {
            let mut tx = self.store.begin().await?;
            let tournament = tx
                .find_tournament(tournament_id)
                .await?
                .ok_or(BracketError::TournamentNotFound(tournament_id))?;
            let matches = tx.list_matches(tournament_id).await?;
            Ok::<_, BracketError>(BracketView::new(&tournament, matches))
        })
        .await
    }

    /// Standings ordered by wins desc, points desc, losses asc
    pub async fn leaderboard(&self, tournament_id: TournamentId) -> BracketResult<Vec<Standing>> {
        with_timeout(self.config.transaction_timeout, async {
            let mut tx = self.store.begin().await?;
            tx.find_tournament(tournament_id)
                .await?
                .ok_or(BracketError::TournamentNotFound(tournament_id))?;
            let mut standings = tx.standings(tournament_id).await?;
            ledger::sort_leaderboard(&mut standings);
            Ok::<_, BracketError>(standings)
        })
        .await
    }

    async fn generate_once(
        &self,
        tournament_id: TournamentId,
        team_ids: Option<&[TeamId]>,
    ) -> BracketResult<BracketSummary> {
        let mut tx = self.store.begin().await?;

        let tournament = tx
            .lock_tournament(tournament_id)
            .await?
            .ok_or(BracketError::TournamentNotFound(tournament_id))?;

        let standings = tx.standings(tournament_id).await?;
        let entrants: Vec<TeamId> = match team_ids {
            Some(ids) => ids.to_vec(),
            None => standings.iter().map(|s| s.team_id).collect(),
        };
        builder::validate_entrants(&entrants)?;

        let found: HashSet<TeamId> = tx
            .find_teams(&entrants)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect();
        let missing: Vec<TeamId> = entrants
            .iter()
            .copied()
            .filter(|id| !found.contains(id))
            .collect();
        if !missing.is_empty() {
            return Err(BracketError::TeamsNotFound(missing));
        }

        let seeded =
            seeding::seed_teams(tournament.seeding, &entrants, &standings, &mut rand::rng());
        let summary = builder::generate(tx.as_mut(), &tournament, &seeded).await?;

        tx.commit().await?;
        Ok(summary)
    }

    /// Run one transactional attempt at a time, retrying transient store
    /// conflicts up to `max_attempts`.
    async fn retrying<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> BracketResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = BracketResult<T>>,
    {
        let mut tries = 1;
        loop {
            match with_timeout(self.config.transaction_timeout, attempt()).await {
                Err(err) if err.is_transient() => {
                    if tries >= self.config.max_attempts {
                        log::warn!("{operation} gave up after {tries} attempt(s): {err}");
                        return Err(BracketError::Conflict(format!(
                            "{operation} could not complete after {tries} attempt(s)"
                        )));
                    }
                    log::debug!("{operation} attempt {tries} hit a transient conflict: {err}");
                    tries += 1;
                }
                result => return result,
            }
        }
    }
}
