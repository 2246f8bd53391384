//! Seeding: ordering entrants into round-1 positions.

use super::ledger::ranking_order;
use super::models::{Seeding, Standing, TeamId};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashMap;

/// Order `team_ids` according to `policy`.
///
/// Ranked seeding sorts by wins desc, losses asc, points desc; ties keep
/// input order. Teams without a standing are appended after the ranked ones,
/// in input order.
pub fn seed_teams<R: Rng + ?Sized>(
    policy: Seeding,
    team_ids: &[TeamId],
    standings: &[Standing],
    rng: &mut R,
) -> Vec<TeamId> {
    match policy {
        Seeding::Random => {
            let mut seeded = team_ids.to_vec();
            seeded.shuffle(rng);
            seeded
        }
        Seeding::Ranked => ranked(team_ids, standings),
    }
}

fn ranked(team_ids: &[TeamId], standings: &[Standing]) -> Vec<TeamId> {
    let by_team: HashMap<TeamId, &Standing> =
        standings.iter().map(|s| (s.team_id, s)).collect();

    let mut known: Vec<&Standing> = Vec::with_capacity(team_ids.len());
    let mut unknown: Vec<TeamId> = Vec::new();
    for id in team_ids {
        match by_team.get(id) {
            Some(standing) => known.push(standing),
            None => unknown.push(*id),
        }
    }

    // Stable: equal records keep their input order
    known.sort_by(|a, b| ranking_order(a, b));

    if !unknown.is_empty() {
        log::warn!(
            "{} team(s) have no leaderboard entry and are seeded last",
            unknown.len()
        );
    }

    known
        .into_iter()
        .map(|s| s.team_id)
        .chain(unknown)
        .collect()
}
