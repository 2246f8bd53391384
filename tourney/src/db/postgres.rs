//! PostgreSQL bracket store.
//!
//! Row locks (`SELECT ... FOR UPDATE`) serialize writers on the same
//! tournament or match. Next-round matches are created with an upsert on
//! `(tournament_id, round, slot)` that only writes the placed side's column.
#![allow(clippy::needless_raw_string_hashes)]

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::sync::Arc;

use super::repository::{BracketStore, BracketTx, StoreError, StoreResult};
use crate::bracket::models::{
    Match, MatchId, NewMatch, Seeding, Side, Standing, Team, TeamId, Tournament, TournamentId,
};

const MATCH_COLUMNS: &str = "id, tournament_id, round, slot, team_a_id, team_b_id, winner_id, played";

const TOURNAMENT_COLUMNS: &str =
    "id, name, bracket_type, seeding, total_rounds, team_count, created_at";

/// Bracket store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgBracketStore {
    pool: Arc<PgPool>,
}

impl PgBracketStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BracketStore for PgBracketStore {
    async fn begin(&self) -> StoreResult<Box<dyn BracketTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}

struct PgTx {
    tx: Transaction<'static, Postgres>,
}

fn decode_error(column: &str, message: String) -> StoreError {
    StoreError::Database(sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: message.into(),
    })
}

fn to_u32(column: &str, value: i32) -> StoreResult<u32> {
    u32::try_from(value).map_err(|_| decode_error(column, format!("negative value {value}")))
}

fn match_from_row(row: &PgRow) -> StoreResult<Match> {
    Ok(Match {
        id: row.get("id"),
        tournament_id: row.get("tournament_id"),
        round: to_u32("round", row.get("round"))?,
        slot: to_u32("slot", row.get("slot"))?,
        team_a_id: row.get("team_a_id"),
        team_b_id: row.get("team_b_id"),
        winner_id: row.get("winner_id"),
        played: row.get("played"),
    })
}

fn tournament_from_row(row: &PgRow) -> StoreResult<Tournament> {
    let bracket_type: String = row.get("bracket_type");
    let seeding: String = row.get("seeding");

    Ok(Tournament {
        id: row.get("id"),
        name: row.get("name"),
        bracket_type: bracket_type
            .parse()
            .map_err(|e| decode_error("bracket_type", e))?,
        seeding: seeding.parse().map_err(|e| decode_error("seeding", e))?,
        total_rounds: row
            .get::<Option<i32>, _>("total_rounds")
            .map(|v| to_u32("total_rounds", v))
            .transpose()?,
        team_count: row
            .get::<Option<i32>, _>("team_count")
            .map(|v| to_u32("team_count", v))
            .transpose()?,
        created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
    })
}

fn team_from_row(row: &PgRow) -> Team {
    Team {
        id: row.get("id"),
        name: row.get("name"),
        members: row.get("members"),
        created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
    }
}

#[async_trait]
impl BracketTx for PgTx {
    async fn create_team(&mut self, name: &str, members: Option<&str>) -> StoreResult<Team> {
        let row = sqlx::query(
            r#"
            INSERT INTO teams (name, members)
            VALUES ($1, $2)
            RETURNING id, name, members, created_at
            "#,
        )
        .bind(name)
        .bind(members)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(team_from_row(&row))
    }

    async fn create_tournament(&mut self, name: &str, seeding: Seeding) -> StoreResult<Tournament> {
        let row = sqlx::query(&format!(
            "INSERT INTO tournaments (name, seeding) VALUES ($1, $2) RETURNING {TOURNAMENT_COLUMNS}"
        ))
        .bind(name)
        .bind(seeding.as_str())
        .fetch_one(&mut *self.tx)
        .await?;

        tournament_from_row(&row)
    }

    async fn list_teams(&mut self) -> StoreResult<Vec<Team>> {
        let rows = sqlx::query("SELECT id, name, members, created_at FROM teams ORDER BY id")
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(rows.iter().map(team_from_row).collect())
    }

    async fn find_teams(&mut self, ids: &[TeamId]) -> StoreResult<Vec<Team>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, members, created_at
            FROM teams
            WHERE id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(ids)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows.iter().map(team_from_row).collect())
    }

    async fn find_tournament(&mut self, id: TournamentId) -> StoreResult<Option<Tournament>> {
        sqlx::query(&format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?
        .as_ref()
        .map(tournament_from_row)
        .transpose()
    }

    async fn lock_tournament(&mut self, id: TournamentId) -> StoreResult<Option<Tournament>> {
        sqlx::query(&format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?
        .as_ref()
        .map(tournament_from_row)
        .transpose()
    }

    async fn set_bracket_shape(
        &mut self,
        id: TournamentId,
        total_rounds: u32,
        team_count: u32,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE tournaments SET total_rounds = $1, team_count = $2 WHERE id = $3",
        )
        .bind(total_rounds as i32)
        .bind(team_count as i32)
        .bind(id)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::RowNotFound(format!("tournament {id}")));
        }
        Ok(())
    }

    async fn count_matches(&mut self, tournament_id: TournamentId) -> StoreResult<u64> {
        let count: i64 = sqlx::query("SELECT COUNT(*) AS count FROM matches WHERE tournament_id = $1")
            .bind(tournament_id)
            .fetch_one(&mut *self.tx)
            .await?
            .get("count");

        Ok(count.max(0) as u64)
    }

    async fn list_matches(&mut self, tournament_id: TournamentId) -> StoreResult<Vec<Match>> {
        let rows = sqlx::query(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE tournament_id = $1 ORDER BY round, slot"
        ))
        .bind(tournament_id)
        .fetch_all(&mut *self.tx)
        .await?;

        rows.iter().map(match_from_row).collect()
    }

    async fn round_matches(
        &mut self,
        tournament_id: TournamentId,
        round: u32,
    ) -> StoreResult<Vec<Match>> {
        let rows = sqlx::query(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE tournament_id = $1 AND round = $2 ORDER BY slot"
        ))
        .bind(tournament_id)
        .bind(round as i32)
        .fetch_all(&mut *self.tx)
        .await?;

        rows.iter().map(match_from_row).collect()
    }

    async fn insert_match(&mut self, new: &NewMatch) -> StoreResult<Match> {
        let row = sqlx::query(&format!(
            "INSERT INTO matches (tournament_id, round, slot, team_a_id, team_b_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {MATCH_COLUMNS}"
        ))
        .bind(new.tournament_id)
        .bind(new.round as i32)
        .bind(new.slot as i32)
        .bind(new.team_a_id)
        .bind(new.team_b_id)
        .fetch_one(&mut *self.tx)
        .await?;

        match_from_row(&row)
    }

    async fn lock_match(&mut self, id: MatchId) -> StoreResult<Option<Match>> {
        sqlx::query(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?
        .as_ref()
        .map(match_from_row)
        .transpose()
    }

    async fn record_winner(&mut self, id: MatchId, winner_id: TeamId) -> StoreResult<Match> {
        let row = sqlx::query(&format!(
            "UPDATE matches SET winner_id = $1, played = TRUE WHERE id = $2 RETURNING {MATCH_COLUMNS}"
        ))
        .bind(winner_id)
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or_else(|| StoreError::RowNotFound(format!("match {id}")))?;

        match_from_row(&row)
    }

    async fn place_team(
        &mut self,
        tournament_id: TournamentId,
        round: u32,
        slot: u32,
        side: Side,
        team_id: TeamId,
    ) -> StoreResult<Match> {
        let column = match side {
            Side::A => "team_a_id",
            Side::B => "team_b_id",
        };

        // A concurrent sibling writes the other column of the same row; the
        // conflict target makes exactly one of the two inserts create it.
        let row = sqlx::query(&format!(
            "INSERT INTO matches (tournament_id, round, slot, {column})
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (tournament_id, round, slot)
             DO UPDATE SET {column} = EXCLUDED.{column}
             RETURNING {MATCH_COLUMNS}"
        ))
        .bind(tournament_id)
        .bind(round as i32)
        .bind(slot as i32)
        .bind(team_id)
        .fetch_one(&mut *self.tx)
        .await?;

        match_from_row(&row)
    }

    async fn standings(&mut self, tournament_id: TournamentId) -> StoreResult<Vec<Standing>> {
        let rows = sqlx::query(
            r#"
            SELECT l.tournament_id, l.team_id, t.name AS team_name, l.wins, l.losses, l.points
            FROM leaderboards l
            LEFT JOIN teams t ON t.id = l.team_id
            WHERE l.tournament_id = $1
            ORDER BY l.team_id
            "#,
        )
        .bind(tournament_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Standing {
                tournament_id: row.get("tournament_id"),
                team_id: row.get("team_id"),
                team_name: row.get("team_name"),
                wins: row.get("wins"),
                losses: row.get("losses"),
                points: row.get("points"),
            })
            .collect())
    }

    async fn insert_standing(
        &mut self,
        tournament_id: TournamentId,
        team_id: TeamId,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO leaderboards (tournament_id, team_id)
            VALUES ($1, $2)
            ON CONFLICT (tournament_id, team_id) DO NOTHING
            "#,
        )
        .bind(tournament_id)
        .bind(team_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn has_standing(
        &mut self,
        tournament_id: TournamentId,
        team_id: TeamId,
    ) -> StoreResult<bool> {
        let row = sqlx::query(
            "SELECT 1 AS present FROM leaderboards WHERE tournament_id = $1 AND team_id = $2",
        )
        .bind(tournament_id)
        .bind(team_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.is_some())
    }

    async fn add_win(&mut self, tournament_id: TournamentId, team_id: TeamId) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE leaderboards SET wins = wins + 1 WHERE tournament_id = $1 AND team_id = $2",
        )
        .bind(tournament_id)
        .bind(team_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_loss(
        &mut self,
        tournament_id: TournamentId,
        team_id: TeamId,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE leaderboards SET losses = losses + 1 WHERE tournament_id = $1 AND team_id = $2",
        )
        .bind(tournament_id)
        .bind(team_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
