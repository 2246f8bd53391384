//! Integration tests for bracket generation and advancement.
//!
//! These run the full manager stack against the in-memory store: round-1
//! construction, byes, linking, result validation and standings.

use std::sync::Arc;
use tourney::bracket::models::{Match, TeamId, TournamentId};
use tourney::{
    BracketError, BracketManager, ErrorKind, MemoryBracketStore, Progress, Seeding,
    ValidationError,
};

/// Create a tournament with teams `T1..=Tn` registered in order.
///
/// Ranked seeding over untouched standings keeps registration order, so the
/// round-1 layout is deterministic.
async fn setup(n: usize, seeding: Seeding) -> (BracketManager, TournamentId, Vec<TeamId>) {
    let manager = BracketManager::new(Arc::new(MemoryBracketStore::new()));
    let tournament = manager
        .create_tournament("Test Cup", seeding)
        .await
        .expect("tournament");

    let mut team_ids = Vec::with_capacity(n);
    for i in 1..=n {
        let team = manager
            .create_team(&format!("T{i}"), None)
            .await
            .expect("team");
        team_ids.push(team.id);
    }
    manager
        .register_teams(tournament.id, &team_ids)
        .await
        .expect("registration");

    (manager, tournament.id, team_ids)
}

async fn round(manager: &BracketManager, tournament_id: TournamentId, round: u32) -> Vec<Match> {
    manager
        .bracket_view(tournament_id)
        .await
        .expect("bracket view")
        .round(round)
        .to_vec()
}

async fn wins_losses(
    manager: &BracketManager,
    tournament_id: TournamentId,
    team_id: TeamId,
) -> (i32, i32) {
    let standings = manager.leaderboard(tournament_id).await.expect("leaderboard");
    let standing = standings
        .iter()
        .find(|s| s.team_id == team_id)
        .expect("standing");
    (standing.wins, standing.losses)
}

#[tokio::test]
async fn test_four_team_bracket_end_to_end() {
    let (manager, tid, t) = setup(4, Seeding::Ranked).await;

    let summary = manager.generate_for_registered(tid).await.unwrap();
    assert_eq!(summary.num_teams, 4);
    assert_eq!(summary.round1_slots, 4);
    assert_eq!(summary.num_rounds, 2);
    assert_eq!(summary.round1_matches, 2);
    assert_eq!(summary.matches_created, 2);
    assert_eq!(summary.byes_advanced, 0);

    let r1 = round(&manager, tid, 1).await;
    assert_eq!((r1[0].team_a_id, r1[0].team_b_id), (Some(t[0]), Some(t[1])));
    assert_eq!((r1[1].team_a_id, r1[1].team_b_id), (Some(t[2]), Some(t[3])));

    let first = manager.submit_result(r1[0].id, t[0]).await.unwrap();
    assert!(!first.tournament_complete());
    assert!(!first.next_match_ready());

    let second = manager.submit_result(r1[1].id, t[2]).await.unwrap();
    assert!(second.next_match_ready());
    assert_eq!(second.next_match_id(), first.next_match_id());

    let r2 = round(&manager, tid, 2).await;
    assert_eq!(r2.len(), 1);
    assert_eq!((r2[0].team_a_id, r2[0].team_b_id), (Some(t[0]), Some(t[2])));

    let last = manager.submit_result(r2[0].id, t[0]).await.unwrap();
    assert_eq!(last.progress, Progress::Complete { champion_id: t[0] });
    assert_eq!(last.champion_id(), Some(t[0]));

    let leaderboard = manager.leaderboard(tid).await.unwrap();
    assert_eq!(leaderboard[0].team_id, t[0]);
    assert_eq!((leaderboard[0].wins, leaderboard[0].losses), (2, 0));
    assert_eq!(wins_losses(&manager, tid, t[2]).await, (1, 1));
    assert_eq!(wins_losses(&manager, tid, t[1]).await, (0, 1));
    assert_eq!(wins_losses(&manager, tid, t[3]).await, (0, 1));
}

#[tokio::test]
async fn test_five_teams_bye_and_double_bye() {
    let (manager, tid, t) = setup(5, Seeding::Ranked).await;

    let summary = manager.generate_for_registered(tid).await.unwrap();
    assert_eq!(summary.round1_slots, 8);
    assert_eq!(summary.round1_matches, 4);
    assert_eq!(summary.matches_created, 4);
    assert_eq!(summary.num_rounds, 3);
    assert_eq!(summary.byes_advanced, 1);

    let r1 = round(&manager, tid, 1).await;
    assert_eq!(r1.len(), 4);

    let bye = &r1[2];
    assert_eq!((bye.team_a_id, bye.team_b_id), (Some(t[4]), None));
    assert!(bye.played);
    assert_eq!(bye.winner_id, Some(t[4]));

    let double_bye = &r1[3];
    assert!(double_bye.is_empty());
    assert!(!double_bye.played);
    assert_eq!(double_bye.winner_id, None);

    let r2 = round(&manager, tid, 2).await;
    assert_eq!(r2.len(), 1);
    assert_eq!(r2[0].slot, 1);
    assert_eq!((r2[0].team_a_id, r2[0].team_b_id), (Some(t[4]), None));

    assert_eq!(wins_losses(&manager, tid, t[4]).await, (1, 0));
}

#[tokio::test]
async fn test_odd_slot_links_to_side_b() {
    let (manager, tid, t) = setup(8, Seeding::Ranked).await;
    manager.generate_for_registered(tid).await.unwrap();

    let r1 = round(&manager, tid, 1).await;
    manager.submit_result(r1[3].id, t[7]).await.unwrap();

    let r2 = round(&manager, tid, 2).await;
    assert_eq!(r2.len(), 1);
    assert_eq!(r2[0].slot, 1);
    assert_eq!((r2[0].team_a_id, r2[0].team_b_id), (None, Some(t[7])));

    manager.submit_result(r1[2].id, t[4]).await.unwrap();
    let r2 = round(&manager, tid, 2).await;
    assert_eq!(r2.len(), 1);
    assert_eq!((r2[0].team_a_id, r2[0].team_b_id), (Some(t[4]), Some(t[7])));
}

#[tokio::test]
async fn test_double_submission_is_rejected() {
    let (manager, tid, t) = setup(4, Seeding::Ranked).await;
    manager.generate_for_registered(tid).await.unwrap();
    let r1 = round(&manager, tid, 1).await;

    manager.submit_result(r1[0].id, t[0]).await.unwrap();
    let err = manager.submit_result(r1[0].id, t[1]).await.unwrap_err();

    assert!(matches!(
        err,
        BracketError::Validation(ValidationError::AlreadyPlayed(id)) if id == r1[0].id
    ));
    assert_eq!(err.kind(), ErrorKind::Validation);

    let replayed = &round(&manager, tid, 1).await[0];
    assert_eq!(replayed.winner_id, Some(t[0]));
    assert_eq!(wins_losses(&manager, tid, t[0]).await, (1, 0));
    assert_eq!(wins_losses(&manager, tid, t[1]).await, (0, 1));
}

#[tokio::test]
async fn test_wrong_winner_changes_nothing() {
    let (manager, tid, t) = setup(4, Seeding::Ranked).await;
    manager.generate_for_registered(tid).await.unwrap();
    let r1 = round(&manager, tid, 1).await;

    let err = manager.submit_result(r1[0].id, t[2]).await.unwrap_err();
    assert!(matches!(
        err,
        BracketError::Validation(ValidationError::WinnerNotInMatch { .. })
    ));

    let matches = manager.list_matches(tid).await.unwrap();
    assert_eq!(matches.len(), 2);
    assert!(matches.iter().all(|m| !m.played));
    assert_eq!(wins_losses(&manager, tid, t[2]).await, (0, 0));
}

#[tokio::test]
async fn test_unknown_match_is_not_found() {
    let (manager, _, t) = setup(2, Seeding::Ranked).await;
    let err = manager.submit_result(9_999, t[0]).await.unwrap_err();
    assert!(matches!(err, BracketError::MatchNotFound(9_999)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_generate_twice_conflicts() {
    let (manager, tid, t) = setup(4, Seeding::Random).await;
    manager.generate_bracket(tid, &t).await.unwrap();

    let err = manager.generate_bracket(tid, &t).await.unwrap_err();
    assert!(matches!(err, BracketError::AlreadyGenerated(id) if id == tid));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(manager.list_matches(tid).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_generate_rejects_bad_entrants() {
    let (manager, tid, t) = setup(3, Seeding::Random).await;

    let err = manager.generate_bracket(tid, &t[..1]).await.unwrap_err();
    assert!(matches!(
        err,
        BracketError::Validation(ValidationError::TooFewTeams(1))
    ));

    let err = manager
        .generate_bracket(tid, &[t[0], t[1], t[0]])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BracketError::Validation(ValidationError::DuplicateTeam(id)) if id == t[0]
    ));

    let err = manager
        .generate_bracket(tid, &[t[0], 4_242])
        .await
        .unwrap_err();
    assert!(matches!(err, BracketError::TeamsNotFound(ref ids) if ids == &vec![4_242]));

    let err = manager.generate_bracket(7_777, &t).await.unwrap_err();
    assert!(matches!(err, BracketError::TournamentNotFound(7_777)));

    assert!(manager.list_matches(tid).await.unwrap().is_empty());
    assert!(
        manager
            .tournament(tid)
            .await
            .unwrap()
            .total_rounds
            .is_none()
    );
}

#[tokio::test]
async fn test_generation_persists_bracket_shape() {
    let (manager, tid, _) = setup(6, Seeding::Ranked).await;
    manager.generate_for_registered(tid).await.unwrap();

    let tournament = manager.tournament(tid).await.unwrap();
    assert_eq!(tournament.total_rounds, Some(3));
    assert_eq!(tournament.team_count, Some(6));
    assert!(tournament.has_bracket_shape());
}

#[tokio::test]
async fn test_random_seeding_places_every_team_once() {
    let (manager, tid, t) = setup(6, Seeding::Random).await;
    manager.generate_for_registered(tid).await.unwrap();

    let mut placed: Vec<TeamId> = round(&manager, tid, 1)
        .await
        .iter()
        .flat_map(|m| [m.team_a_id, m.team_b_id])
        .flatten()
        .collect();
    placed.sort_unstable();

    let mut expected = t.clone();
    expected.sort_unstable();
    assert_eq!(placed, expected);
}

#[tokio::test]
async fn test_awaiting_opponent_then_walkover_to_champion() {
    let (manager, tid, t) = setup(5, Seeding::Ranked).await;
    manager.generate_for_registered(tid).await.unwrap();
    let r1 = round(&manager, tid, 1).await;

    manager.submit_result(r1[0].id, t[0]).await.unwrap();
    let r2 = round(&manager, tid, 2).await;
    let upper = r2.iter().find(|m| m.slot == 0).unwrap().clone();
    let lower = r2.iter().find(|m| m.slot == 1).unwrap().clone();

    // T1 waits for the winner of T3 vs T4
    let err = manager.submit_result(upper.id, t[0]).await.unwrap_err();
    assert!(matches!(
        err,
        BracketError::Validation(ValidationError::AwaitingOpponent(id)) if id == upper.id
    ));

    // T5's opponent branch is the double bye: a walkover is allowed
    let walkover = manager.submit_result(lower.id, t[4]).await.unwrap();
    assert!(!walkover.next_match_ready());
    assert_eq!(wins_losses(&manager, tid, t[4]).await, (1, 0));

    manager.submit_result(r1[1].id, t[2]).await.unwrap();
    let semi = manager.submit_result(upper.id, t[0]).await.unwrap();
    assert!(semi.next_match_ready());
    assert_eq!(semi.next_match_id(), walkover.next_match_id());

    let final_match = round(&manager, tid, 3).await[0].clone();
    assert_eq!(
        (final_match.team_a_id, final_match.team_b_id),
        (Some(t[0]), Some(t[4]))
    );

    let outcome = manager.submit_result(final_match.id, t[0]).await.unwrap();
    assert_eq!(outcome.champion_id(), Some(t[0]));

    assert_eq!(wins_losses(&manager, tid, t[0]).await, (3, 0));
    assert_eq!(wins_losses(&manager, tid, t[4]).await, (1, 1));

    // the double bye is never resolved
    let double_bye = &round(&manager, tid, 1).await[3];
    assert!(!double_bye.played);
}

#[tokio::test]
async fn test_two_teams_play_the_final_directly() {
    let (manager, tid, t) = setup(2, Seeding::Ranked).await;
    let summary = manager.generate_for_registered(tid).await.unwrap();
    assert_eq!(summary.num_rounds, 1);

    let only = &round(&manager, tid, 1).await[0];
    let outcome = manager.submit_result(only.id, t[1]).await.unwrap();
    assert_eq!(outcome.champion_id(), Some(t[1]));
    assert_eq!(manager.list_matches(tid).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sibling_submissions() {
    let (manager, tid, t) = setup(4, Seeding::Ranked).await;
    manager.generate_for_registered(tid).await.unwrap();
    let r1 = round(&manager, tid, 1).await;

    let left = {
        let manager = manager.clone();
        let (match_id, winner) = (r1[0].id, t[0]);
        tokio::spawn(async move { manager.submit_result(match_id, winner).await })
    };
    let right = {
        let manager = manager.clone();
        let (match_id, winner) = (r1[1].id, t[3]);
        tokio::spawn(async move { manager.submit_result(match_id, winner).await })
    };

    let (left, right) = tokio::join!(left, right);
    let left = left.unwrap().unwrap();
    let right = right.unwrap().unwrap();

    assert_eq!(left.next_match_id(), right.next_match_id());
    assert!(left.next_match_ready() != right.next_match_ready());

    let r2 = round(&manager, tid, 2).await;
    assert_eq!(r2.len(), 1);
    assert_eq!((r2[0].team_a_id, r2[0].team_b_id), (Some(t[0]), Some(t[3])));
}

#[tokio::test]
async fn test_register_teams() {
    let (manager, tid, t) = setup(3, Seeding::Ranked).await;

    let again = manager.register_teams(tid, &t).await.unwrap();
    assert!(again.added_team_ids.is_empty());
    assert_eq!(again.total_teams, 3);

    let extra = manager.create_team("T4", Some("dee, eve")).await.unwrap();
    let summary = manager.register_teams(tid, &[extra.id, extra.id]).await.unwrap();
    assert_eq!(summary.added_team_ids, vec![extra.id]);

    let err = manager.register_teams(tid, &[]).await.unwrap_err();
    assert!(matches!(err, BracketError::Validation(ValidationError::NoTeams)));

    let err = manager.register_teams(tid, &[999, 998]).await.unwrap_err();
    assert!(matches!(err, BracketError::TeamsNotFound(ref ids) if ids == &vec![998, 999]));

    let err = manager.register_teams(12_345, &t).await.unwrap_err();
    assert!(matches!(err, BracketError::TournamentNotFound(12_345)));

    manager.generate_for_registered(tid).await.unwrap();
    let late = manager.create_team("T5", None).await.unwrap();
    let err = manager.register_teams(tid, &[late.id]).await.unwrap_err();
    assert!(matches!(err, BracketError::AlreadyGenerated(id) if id == tid));

    let standings = manager.leaderboard(tid).await.unwrap();
    assert_eq!(standings.len(), 4);
    assert!(standings.iter().all(|s| s.team_name.is_some()));
}

#[tokio::test]
async fn test_generate_for_registered_needs_two_teams() {
    let manager = BracketManager::new(Arc::new(MemoryBracketStore::new()));
    let tournament = manager
        .create_tournament("Lonely Cup", Seeding::Random)
        .await
        .unwrap();

    let err = manager
        .generate_for_registered(tournament.id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BracketError::Validation(ValidationError::TooFewTeams(0))
    ));
}

#[tokio::test]
async fn test_duplicate_team_name_conflicts() {
    let manager = BracketManager::new(Arc::new(MemoryBracketStore::new()));
    manager.create_team("Alpha", None).await.unwrap();

    let err = manager.create_team("Alpha", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = manager.create_team("   ", None).await.unwrap_err();
    assert!(matches!(err, BracketError::Validation(ValidationError::EmptyName)));
}

#[tokio::test]
async fn test_read_views_of_missing_tournament() {
    let manager = BracketManager::new(Arc::new(MemoryBracketStore::new()));
    assert!(matches!(
        manager.list_matches(1).await,
        Err(BracketError::TournamentNotFound(1))
    ));
    assert!(matches!(
        manager.bracket_view(1).await,
        Err(BracketError::TournamentNotFound(1))
    ));
    assert!(matches!(
        manager.leaderboard(1).await,
        Err(BracketError::TournamentNotFound(1))
    ));
}
