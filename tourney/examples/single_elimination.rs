//! Single Elimination Example
//!
//! Runs a five-team tournament to completion against the in-memory store,
//! including a bye, a double bye and the walkover that follows it.

use std::sync::Arc;
use tourney::{BracketManager, MemoryBracketStore, Progress, Seeding};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("=== Single Elimination Example ===\n");

    let manager = BracketManager::new(Arc::new(MemoryBracketStore::new()));
    let tournament = manager
        .create_tournament("Autumn Invitational", Seeding::Ranked)
        .await?;

    let mut team_ids = Vec::new();
    for name in ["Owls", "Foxes", "Herons", "Badgers", "Lynxes"] {
        team_ids.push(manager.create_team(name, None).await?.id);
    }
    manager.register_teams(tournament.id, &team_ids).await?;

    let summary = manager.generate_for_registered(tournament.id).await?;
    println!(
        "{} teams -> {} slots, {} rounds, {} round-1 matches, {} bye(s)\n",
        summary.num_teams,
        summary.round1_slots,
        summary.num_rounds,
        summary.round1_matches,
        summary.byes_advanced
    );

    // Play every match that can be decided, side A always winning, until the
    // final is recorded.
    'rounds: loop {
        let view = manager.bracket_view(tournament.id).await?;
        let mut progressed = false;

        for (round, matches) in &view.rounds {
            for m in matches.iter().filter(|m| !m.played) {
                let Some(winner) = m.team_a_id.or(m.team_b_id) else {
                    continue;
                };
                let outcome = match manager.submit_result(m.id, winner).await {
                    Ok(outcome) => outcome,
                    // still waiting on an earlier match
                    Err(tourney::BracketError::Validation(_)) => continue,
                    Err(err) => return Err(err.into()),
                };
                progressed = true;
                println!("Round {round} slot {}: team {winner} wins", m.slot);

                if let Progress::Complete { champion_id } = outcome.progress {
                    println!("\nChampion: team {champion_id}");
                    break 'rounds;
                }
            }
        }

        if !progressed {
            anyhow::bail!("bracket stalled before a champion was decided");
        }
    }

    println!("\nLeaderboard:");
    for standing in manager.leaderboard(tournament.id).await? {
        println!(
            "  {:<8} W{} L{}",
            standing.team_name.unwrap_or_default(),
            standing.wins,
            standing.losses
        );
    }

    Ok(())
}
