//! Advancement engine: records results and links winners forward.
//!
//! Per match the only transition is `unplayed -> played(winner)`, fired
//! either here or by bye resolution in the builder.

use super::errors::{BracketError, BracketResult, ValidationError};
use super::layout::{BracketLayout, next_position};
use super::ledger;
use super::models::{AdvanceOutcome, Match, MatchId, Progress, TeamId, Tournament};
use crate::db::{BracketTx, StoreError};

/// Validate and record the result of `match_id`.
///
/// Checks, in order: the match exists, the winner sits on one of its sides,
/// the match is not already played, and an empty side (if any) can never be
/// filled. Then marks it played, updates standings, and either reports the
/// champion or links the winner into the next round.
pub async fn submit_result(
    tx: &mut dyn BracketTx,
    match_id: MatchId,
    winner_id: TeamId,
) -> BracketResult<AdvanceOutcome> {
    let current = tx
        .lock_match(match_id)
        .await?
        .ok_or(BracketError::MatchNotFound(match_id))?;

    if !current.contains(winner_id) {
        return Err(ValidationError::WinnerNotInMatch {
            match_id,
            winner_id,
        }
        .into());
    }

    if current.played {
        return Err(ValidationError::AlreadyPlayed(match_id).into());
    }

    let tournament = tx
        .find_tournament(current.tournament_id)
        .await?
        .ok_or(BracketError::TournamentNotFound(current.tournament_id))?;
    let layout = resolve_layout(tx, &tournament).await?;

    if let Some(open) = current.open_side() {
        if !layout.feeder_is_vacant(current.round, current.slot, open) {
            return Err(ValidationError::AwaitingOpponent(match_id).into());
        }
    }

    let played = tx.record_winner(match_id, winner_id).await?;

    if let Some(loser_id) = current.opponent_of(winner_id) {
        ledger::record_result(tx, tournament.id, winner_id, loser_id).await?;
    }

    if layout.is_final(played.round) {
        log::info!(
            "Tournament {} complete: champion is team {}",
            tournament.id,
            winner_id
        );
        return Ok(AdvanceOutcome {
            match_id,
            winner_id,
            progress: Progress::Complete {
                champion_id: winner_id,
            },
        });
    }

    let next = link_winner(tx, &played, winner_id).await?;

    Ok(AdvanceOutcome {
        match_id,
        winner_id,
        progress: Progress::Advanced {
            next_match_id: next.id,
            next_match_ready: next.is_ready(),
        },
    })
}

/// Place `team_id`, the winner of `source`, into the next round's match.
///
/// The target is created if absent. Even source slots fill side A, odd ones
/// side B.
pub async fn link_winner(
    tx: &mut dyn BracketTx,
    source: &Match,
    team_id: TeamId,
) -> BracketResult<Match> {
    let (round, slot, side) = next_position(source.round, source.slot);

    let target = tx
        .place_team(source.tournament_id, round, slot, side, team_id)
        .await?;

    log::debug!(
        "Team {} advanced from round {} slot {} to round {} slot {} side {:?}",
        team_id,
        source.round,
        source.slot,
        round,
        slot,
        side
    );

    Ok(target)
}

/// Bracket shape for a tournament: the persisted one, or one rebuilt from
/// round-1 rows for brackets generated before the shape was stored.
pub async fn resolve_layout(
    tx: &mut dyn BracketTx,
    tournament: &Tournament,
) -> BracketResult<BracketLayout> {
    if let (Some(total_rounds), Some(team_count)) = (tournament.total_rounds, tournament.team_count) {
        if let Some(layout) = BracketLayout::from_shape(total_rounds, team_count) {
            return Ok(layout);
        }
    }

    let round_one = tx.round_matches(tournament.id, 1).await?;
    let team_count = round_one
        .iter()
        .map(|m| u32::from(m.team_a_id.is_some()) + u32::from(m.team_b_id.is_some()))
        .sum();

    BracketLayout::from_round_one(round_one.len() as u32, team_count).ok_or_else(|| {
        StoreError::RowNotFound(format!(
            "round 1 of tournament {} is incomplete ({} matches)",
            tournament.id,
            round_one.len()
        ))
        .into()
    })
}
