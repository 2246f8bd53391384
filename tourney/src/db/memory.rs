//! In-memory bracket store.
//!
//! One mutex guards the whole state, so transactions run one at a time. A
//! transaction works on a copy of the state and writes it back on commit.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::repository::{BracketStore, BracketTx, StoreError, StoreResult};
use crate::bracket::models::{
    BracketType, Match, MatchId, NewMatch, Seeding, Side, Standing, Team, TeamId, Tournament,
    TournamentId,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    next_id: i64,
    teams: BTreeMap<TeamId, Team>,
    tournaments: BTreeMap<TournamentId, Tournament>,
    matches: BTreeMap<MatchId, Match>,
    positions: BTreeMap<(TournamentId, u32, u32), MatchId>,
    standings: BTreeMap<(TournamentId, TeamId), Standing>,
}

impl MemoryState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn match_mut(&mut self, id: MatchId) -> StoreResult<&mut Match> {
        self.matches
            .get_mut(&id)
            .ok_or_else(|| StoreError::RowNotFound(format!("match {id}")))
    }

    fn push_match(&mut self, new: &NewMatch) -> StoreResult<Match> {
        if !self.tournaments.contains_key(&new.tournament_id) {
            return Err(StoreError::RowNotFound(format!(
                "tournament {}",
                new.tournament_id
            )));
        }
        let key = (new.tournament_id, new.round, new.slot);
        if self.positions.contains_key(&key) {
            return Err(StoreError::UniqueViolation(
                "uq_match_tournament_round_slot".to_string(),
            ));
        }

        let row = Match {
            id: self.allocate_id(),
            tournament_id: new.tournament_id,
            round: new.round,
            slot: new.slot,
            team_a_id: new.team_a_id,
            team_b_id: new.team_b_id,
            winner_id: None,
            played: false,
        };
        self.positions.insert(key, row.id);
        self.matches.insert(row.id, row.clone());
        Ok(row)
    }

    fn with_team_name(&self, standing: &Standing) -> Standing {
        Standing {
            team_name: self.teams.get(&standing.team_id).map(|t| t.name.clone()),
            ..standing.clone()
        }
    }
}

/// Bracket store kept in process memory
#[derive(Clone, Default)]
pub struct MemoryBracketStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBracketStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BracketStore for MemoryBracketStore {
    async fn begin(&self) -> StoreResult<Box<dyn BracketTx>> {
        let guard = self.state.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryTx { guard, work }))
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    work: MemoryState,
}

#[async_trait]
impl BracketTx for MemoryTx {
    async fn create_team(&mut self, name: &str, members: Option<&str>) -> StoreResult<Team> {
        if self.work.teams.values().any(|t| t.name == name) {
            return Err(StoreError::UniqueViolation("teams_name_key".to_string()));
        }
        let team = Team {
            id: self.work.allocate_id(),
            name: name.to_string(),
            members: members.map(str::to_string),
            created_at: Utc::now(),
        };
        self.work.teams.insert(team.id, team.clone());
        Ok(team)
    }

    async fn create_tournament(&mut self, name: &str, seeding: Seeding) -> StoreResult<Tournament> {
        let tournament = Tournament {
            id: self.work.allocate_id(),
            name: name.to_string(),
            bracket_type: BracketType::SingleElim,
            seeding,
            total_rounds: None,
            team_count: None,
            created_at: Utc::now(),
        };
        self.work
            .tournaments
            .insert(tournament.id, tournament.clone());
        Ok(tournament)
    }

    async fn list_teams(&mut self) -> StoreResult<Vec<Team>> {
        Ok(self.work.teams.values().cloned().collect())
    }

    async fn find_teams(&mut self, ids: &[TeamId]) -> StoreResult<Vec<Team>> {
        Ok(self
            .work
            .teams
            .values()
            .filter(|t| ids.contains(&t.id))
            .cloned()
            .collect())
    }

    async fn find_tournament(&mut self, id: TournamentId) -> StoreResult<Option<Tournament>> {
        Ok(self.work.tournaments.get(&id).cloned())
    }

    async fn lock_tournament(&mut self, id: TournamentId) -> StoreResult<Option<Tournament>> {
        // The transaction already holds the store exclusively.
        self.find_tournament(id).await
    }

    async fn set_bracket_shape(
        &mut self,
        id: TournamentId,
        total_rounds: u32,
        team_count: u32,
    ) -> StoreResult<()> {
        let tournament = self
            .work
            .tournaments
            .get_mut(&id)
            .ok_or_else(|| StoreError::RowNotFound(format!("tournament {id}")))?;
        tournament.total_rounds = Some(total_rounds);
        tournament.team_count = Some(team_count);
        Ok(())
    }

    async fn count_matches(&mut self, tournament_id: TournamentId) -> StoreResult<u64> {
        Ok(self
            .work
            .positions
            .keys()
            .filter(|(t, _, _)| *t == tournament_id)
            .count() as u64)
    }

    async fn list_matches(&mut self, tournament_id: TournamentId) -> StoreResult<Vec<Match>> {
        // positions iterate in (tournament, round, slot) order
        Ok(self
            .work
            .positions
            .range((tournament_id, 0, 0)..=(tournament_id, u32::MAX, u32::MAX))
            .filter_map(|(_, id)| self.work.matches.get(id).cloned())
            .collect())
    }

    async fn round_matches(
        &mut self,
        tournament_id: TournamentId,
        round: u32,
    ) -> StoreResult<Vec<Match>> {
        Ok(self
            .work
            .positions
            .range((tournament_id, round, 0)..=(tournament_id, round, u32::MAX))
            .filter_map(|(_, id)| self.work.matches.get(id).cloned())
            .collect())
    }

    async fn insert_match(&mut self, new: &NewMatch) -> StoreResult<Match> {
        self.work.push_match(new)
    }

    async fn lock_match(&mut self, id: MatchId) -> StoreResult<Option<Match>> {
        Ok(self.work.matches.get(&id).cloned())
    }

    async fn record_winner(&mut self, id: MatchId, winner_id: TeamId) -> StoreResult<Match> {
        let row = self.work.match_mut(id)?;
        row.winner_id = Some(winner_id);
        row.played = true;
        Ok(row.clone())
    }

    async fn place_team(
        &mut self,
        tournament_id: TournamentId,
        round: u32,
        slot: u32,
        side: Side,
        team_id: TeamId,
    ) -> StoreResult<Match> {
        let existing = self.work.positions.get(&(tournament_id, round, slot)).copied();
        let id = match existing {
            Some(id) => id,
            None => {
                self.work
                    .push_match(&NewMatch {
                        tournament_id,
                        round,
                        slot,
                        team_a_id: None,
                        team_b_id: None,
                    })?
                    .id
            }
        };

        let row = self.work.match_mut(id)?;
        match side {
            Side::A => row.team_a_id = Some(team_id),
            Side::B => row.team_b_id = Some(team_id),
        }
        Ok(row.clone())
    }

    async fn standings(&mut self, tournament_id: TournamentId) -> StoreResult<Vec<Standing>> {
        Ok(self
            .work
            .standings
            .range((tournament_id, TeamId::MIN)..=(tournament_id, TeamId::MAX))
            .map(|(_, s)| self.work.with_team_name(s))
            .collect())
    }

    async fn insert_standing(
        &mut self,
        tournament_id: TournamentId,
        team_id: TeamId,
    ) -> StoreResult<bool> {
        if !self.work.tournaments.contains_key(&tournament_id) {
            return Err(StoreError::RowNotFound(format!("tournament {tournament_id}")));
        }
        if !self.work.teams.contains_key(&team_id) {
            return Err(StoreError::RowNotFound(format!("team {team_id}")));
        }
        if self.work.standings.contains_key(&(tournament_id, team_id)) {
            return Ok(false);
        }
        self.work.standings.insert(
            (tournament_id, team_id),
            Standing::new(tournament_id, team_id),
        );
        Ok(true)
    }

    async fn has_standing(
        &mut self,
        tournament_id: TournamentId,
        team_id: TeamId,
    ) -> StoreResult<bool> {
        Ok(self.work.standings.contains_key(&(tournament_id, team_id)))
    }

    async fn add_win(&mut self, tournament_id: TournamentId, team_id: TeamId) -> StoreResult<bool> {
        match self.work.standings.get_mut(&(tournament_id, team_id)) {
            Some(standing) => {
                standing.record_win();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn add_loss(
        &mut self,
        tournament_id: TournamentId,
        team_id: TeamId,
    ) -> StoreResult<bool> {
        match self.work.standings.get_mut(&(tournament_id, team_id)) {
            Some(standing) => {
                standing.record_loss();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTx { mut guard, work } = *self;
        *guard = work;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded_store() -> (MemoryBracketStore, TournamentId) {
        let store = MemoryBracketStore::new();
        let mut tx = store.begin().await.unwrap();
        let tournament = tx.create_tournament("Spring Cup", Seeding::Random).await.unwrap();
        tx.commit().await.unwrap();
        (store, tournament.id)
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let (store, tournament_id) = seeded_store().await;

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_match(&NewMatch {
                tournament_id,
                round: 1,
                slot: 0,
                team_a_id: None,
                team_b_id: None,
            })
            .await
            .unwrap();
        }

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.count_matches(tournament_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_position_is_unique_violation() {
        let (store, tournament_id) = seeded_store().await;
        let new = NewMatch {
            tournament_id,
            round: 2,
            slot: 1,
            team_a_id: None,
            team_b_id: None,
        };

        let mut tx = store.begin().await.unwrap();
        tx.insert_match(&new).await.unwrap();
        let err = tx.insert_match(&new).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn test_place_team_writes_only_its_side() {
        let (store, tournament_id) = seeded_store().await;
        let mut tx = store.begin().await.unwrap();
        let a = tx.create_team("Alpha", None).await.unwrap();
        let b = tx.create_team("Bravo", Some("ann, bo")).await.unwrap();

        let first = tx.place_team(tournament_id, 2, 0, Side::B, b.id).await.unwrap();
        assert_eq!((first.team_a_id, first.team_b_id), (None, Some(b.id)));

        let second = tx.place_team(tournament_id, 2, 0, Side::A, a.id).await.unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!((second.team_a_id, second.team_b_id), (Some(a.id), Some(b.id)));
        assert_eq!(tx.count_matches(tournament_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_team_names_are_unique() {
        let store = MemoryBracketStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.create_team("Alpha", None).await.unwrap();
        assert!(matches!(
            tx.create_team("Alpha", None).await,
            Err(StoreError::UniqueViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_list_teams_in_id_order() {
        let store = MemoryBracketStore::new();
        let mut tx = store.begin().await.unwrap();
        assert!(tx.list_teams().await.unwrap().is_empty());

        let zulu = tx.create_team("Zulu", None).await.unwrap();
        let alpha = tx.create_team("Alpha", Some("Ann")).await.unwrap();

        let names: Vec<_> = tx
            .list_teams()
            .await
            .unwrap()
            .into_iter()
            .map(|t| (t.id, t.name))
            .collect();
        assert_eq!(
            names,
            vec![(zulu.id, "Zulu".to_string()), (alpha.id, "Alpha".to_string())]
        );
    }

    #[tokio::test]
    async fn test_standings_carry_team_names() {
        let (store, tournament_id) = seeded_store().await;
        let mut tx = store.begin().await.unwrap();
        let team = tx.create_team("Alpha", None).await.unwrap();

        assert!(tx.insert_standing(tournament_id, team.id).await.unwrap());
        assert!(!tx.insert_standing(tournament_id, team.id).await.unwrap());
        assert!(tx.add_win(tournament_id, team.id).await.unwrap());
        assert!(!tx.add_loss(tournament_id, team.id + 100).await.unwrap());

        let standings = tx.standings(tournament_id).await.unwrap();
        assert_eq!(standings.len(), 1);
        assert_eq!(standings[0].team_name.as_deref(), Some("Alpha"));
        assert_eq!(standings[0].wins, 1);
    }
}
