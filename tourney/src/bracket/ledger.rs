//! Standings ledger: per-tournament win/loss/point counters.

use super::errors::{BracketError, BracketResult, ValidationError};
use super::models::{RegistrationSummary, Standing, TeamId, TournamentId};
use crate::db::BracketTx;
use std::cmp::Ordering;
use std::collections::HashSet;

impl Standing {
    /// Fresh entry for a newly registered team
    pub fn new(tournament_id: TournamentId, team_id: TeamId) -> Self {
        Self {
            tournament_id,
            team_id,
            team_name: None,
            wins: 0,
            losses: 0,
            points: 0,
        }
    }

    pub fn record_win(&mut self) {
        self.wins += 1;
    }

    pub fn record_loss(&mut self) {
        self.losses += 1;
    }

    pub fn matches_played(&self) -> i32 {
        self.wins + self.losses
    }
}

/// Seeding order: wins desc, losses asc, points desc
pub fn ranking_order(a: &Standing, b: &Standing) -> Ordering {
    b.wins
        .cmp(&a.wins)
        .then(a.losses.cmp(&b.losses))
        .then(b.points.cmp(&a.points))
}

/// Leaderboard display order: wins desc, points desc, losses asc, then team id
pub fn leaderboard_order(a: &Standing, b: &Standing) -> Ordering {
    b.wins
        .cmp(&a.wins)
        .then(b.points.cmp(&a.points))
        .then(a.losses.cmp(&b.losses))
        .then(a.team_id.cmp(&b.team_id))
}

/// Create zeroed leaderboard rows for `team_ids` in `tournament_id`.
///
/// Every team must exist. Teams that already have a row are left alone.
/// Registration is closed once the bracket exists.
pub async fn register_teams(
    tx: &mut dyn BracketTx,
    tournament_id: TournamentId,
    team_ids: &[TeamId],
) -> BracketResult<RegistrationSummary> {
    if team_ids.is_empty() {
        return Err(ValidationError::NoTeams.into());
    }

    tx.lock_tournament(tournament_id)
        .await?
        .ok_or(BracketError::TournamentNotFound(tournament_id))?;

    if tx.count_matches(tournament_id).await? > 0 {
        return Err(BracketError::AlreadyGenerated(tournament_id));
    }

    let found: HashSet<TeamId> = tx
        .find_teams(team_ids)
        .await?
        .into_iter()
        .map(|t| t.id)
        .collect();
    let mut missing: Vec<TeamId> = team_ids
        .iter()
        .copied()
        .filter(|id| !found.contains(id))
        .collect();
    if !missing.is_empty() {
        missing.sort_unstable();
        missing.dedup();
        return Err(BracketError::TeamsNotFound(missing));
    }

    let mut added_team_ids = Vec::new();
    let mut seen = HashSet::new();
    for &team_id in team_ids {
        if !seen.insert(team_id) {
            continue;
        }
        if tx.insert_standing(tournament_id, team_id).await? {
            added_team_ids.push(team_id);
        }
    }

    log::info!(
        "Registered {} new team(s) into tournament {}",
        added_team_ids.len(),
        tournament_id
    );

    Ok(RegistrationSummary {
        added_team_ids,
        total_teams: team_ids.len(),
    })
}

/// Credit a bye: +1 win, skipped if the team has no row
pub(crate) async fn record_bye(
    tx: &mut dyn BracketTx,
    tournament_id: TournamentId,
    team_id: TeamId,
) -> BracketResult<()> {
    if !tx.add_win(tournament_id, team_id).await? {
        log::debug!("No leaderboard entry for team {team_id}; bye not credited");
    }
    Ok(())
}

/// Credit a played match. Both rows must exist for either counter to move.
pub(crate) async fn record_result(
    tx: &mut dyn BracketTx,
    tournament_id: TournamentId,
    winner_id: TeamId,
    loser_id: TeamId,
) -> BracketResult<bool> {
    if !tx.has_standing(tournament_id, winner_id).await?
        || !tx.has_standing(tournament_id, loser_id).await?
    {
        log::debug!(
            "Leaderboard rows missing for match {winner_id} vs {loser_id}; standings unchanged"
        );
        return Ok(false);
    }

    tx.add_win(tournament_id, winner_id).await?;
    tx.add_loss(tournament_id, loser_id).await?;
    Ok(true)
}

/// Sort a leaderboard for display
pub fn sort_leaderboard(standings: &mut [Standing]) {
    standings.sort_by(leaderboard_order);
}
