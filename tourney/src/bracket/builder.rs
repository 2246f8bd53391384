//! Bracket builder: one-shot construction of round 1.

use super::engine::link_winner;
use super::errors::{BracketError, BracketResult, ValidationError};
use super::layout::BracketLayout;
use super::ledger;
use super::models::{BracketSummary, Match, NewMatch, TeamId, Tournament};
use crate::db::BracketTx;
use std::collections::HashSet;

/// Reject entrant lists the builder cannot use. Runs before any write.
pub fn validate_entrants(team_ids: &[TeamId]) -> BracketResult<BracketLayout> {
    let layout = BracketLayout::for_team_count(team_ids.len())?;

    let mut seen = HashSet::with_capacity(team_ids.len());
    for &id in team_ids {
        if !seen.insert(id) {
            return Err(ValidationError::DuplicateTeam(id).into());
        }
    }

    Ok(layout)
}

/// Build round 1 from an already seeded team list.
///
/// The caller holds the tournament row locked. Byes are resolved in place
/// and their winners are linked into round 2 in increasing slot order. A
/// match with both sides empty is created unplayed and stays that way.
pub async fn generate(
    tx: &mut dyn BracketTx,
    tournament: &Tournament,
    seeded: &[TeamId],
) -> BracketResult<BracketSummary> {
    let layout = validate_entrants(seeded)?;

    if tx.count_matches(tournament.id).await? > 0 {
        return Err(BracketError::AlreadyGenerated(tournament.id));
    }

    let mut created: Vec<Match> = Vec::with_capacity(layout.round_one_matches() as usize);
    let mut byes: Vec<(Match, TeamId)> = Vec::new();

    for slot in 0..layout.round_one_matches() {
        let (a, b) = BracketLayout::seed_indices(slot);
        let new = NewMatch {
            tournament_id: tournament.id,
            round: 1,
            slot,
            team_a_id: seeded.get(a).copied(),
            team_b_id: seeded.get(b).copied(),
        };

        let mut inserted = tx.insert_match(&new).await.map_err(|err| {
            match BracketError::from(err) {
                BracketError::Conflict(_) => BracketError::AlreadyGenerated(tournament.id),
                other => other,
            }
        })?;

        match (inserted.team_a_id, inserted.team_b_id) {
            (Some(team_id), None) => {
                inserted = tx.record_winner(inserted.id, team_id).await?;
                ledger::record_bye(tx, tournament.id, team_id).await?;
                byes.push((inserted.clone(), team_id));
            }
            (None, None) => {
                log::debug!(
                    "Tournament {} round 1 slot {} is a double bye and stays unplayed",
                    tournament.id,
                    slot
                );
            }
            _ => {}
        }

        created.push(inserted);
    }

    if layout.total_rounds() > 1 {
        for (source, team_id) in &byes {
            link_winner(tx, source, *team_id).await?;
        }
    }

    tx.set_bracket_shape(tournament.id, layout.total_rounds(), layout.team_count())
        .await?;

    log::info!(
        "Generated bracket for tournament {}: {} teams, {} rounds, {} round-1 matches, {} byes",
        tournament.id,
        seeded.len(),
        layout.total_rounds(),
        created.len(),
        byes.len()
    );

    Ok(BracketSummary {
        num_teams: seeded.len(),
        num_rounds: layout.total_rounds(),
        round1_slots: layout.slots(),
        round1_matches: layout.round_one_matches(),
        matches_created: created.len(),
        byes_advanced: byes.len(),
    })
}
