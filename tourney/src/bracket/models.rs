//! Bracket data models: teams, tournaments, matches and standings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Team ID type
pub type TeamId = i64;

/// Tournament ID type
pub type TournamentId = i64;

/// Match ID type
pub type MatchId = i64;

/// Seeding policy applied when round 1 is generated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seeding {
    /// Uniform random permutation of the entrants
    #[default]
    Random,
    /// Ordered by current standings (wins desc, losses asc, points desc)
    Ranked,
}

impl Seeding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Seeding::Random => "random",
            Seeding::Ranked => "ranked",
        }
    }
}

impl fmt::Display for Seeding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Seeding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(Seeding::Random),
            "ranked" => Ok(Seeding::Ranked),
            other => Err(format!("unknown seeding policy: {other}")),
        }
    }
}

/// Bracket format. Only single elimination is implemented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketType {
    #[default]
    SingleElim,
}

impl BracketType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BracketType::SingleElim => "single_elim",
        }
    }
}

impl FromStr for BracketType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single_elim" => Ok(BracketType::SingleElim),
            other => Err(format!("unsupported bracket type: {other}")),
        }
    }
}

/// Position of a team inside a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    /// Even source slots feed side A of the next match, odd slots feed side B.
    pub fn for_source_slot(slot: u32) -> Self {
        if slot % 2 == 0 { Side::A } else { Side::B }
    }

    pub fn other(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    pub(crate) fn offset(self) -> u32 {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }
}

/// Registered team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    /// Unique display name
    pub name: String,
    /// Free-text member list
    pub members: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Tournament record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub bracket_type: BracketType,
    pub seeding: Seeding,
    /// Written once when the bracket is generated
    pub total_rounds: Option<u32>,
    /// Written once when the bracket is generated
    pub team_count: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl Tournament {
    pub fn has_bracket_shape(&self) -> bool {
        self.total_rounds.is_some() && self.team_count.is_some()
    }
}

/// A single match in the bracket, keyed by `(tournament_id, round, slot)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    /// 1-based round number
    pub round: u32,
    /// 0-based position within the round
    pub slot: u32,
    pub team_a_id: Option<TeamId>,
    pub team_b_id: Option<TeamId>,
    pub winner_id: Option<TeamId>,
    pub played: bool,
}

impl Match {
    pub fn team_on(&self, side: Side) -> Option<TeamId> {
        match side {
            Side::A => self.team_a_id,
            Side::B => self.team_b_id,
        }
    }

    /// Whether `team_id` occupies either side of the match
    pub fn contains(&self, team_id: TeamId) -> bool {
        self.team_a_id == Some(team_id) || self.team_b_id == Some(team_id)
    }

    pub fn opponent_of(&self, team_id: TeamId) -> Option<TeamId> {
        if self.team_a_id == Some(team_id) {
            self.team_b_id
        } else if self.team_b_id == Some(team_id) {
            self.team_a_id
        } else {
            None
        }
    }

    /// Both sides filled
    pub fn is_ready(&self) -> bool {
        self.team_a_id.is_some() && self.team_b_id.is_some()
    }

    /// The empty side when exactly one side is filled
    pub fn open_side(&self) -> Option<Side> {
        [Side::A, Side::B].into_iter().find(|side| {
            self.team_on(*side).is_none() && self.team_on(side.other()).is_some()
        })
    }

    /// Round 1 match with a lone team on side A
    pub fn is_bye(&self) -> bool {
        self.team_a_id.is_some() && self.team_b_id.is_none()
    }

    /// Match with neither side filled
    pub fn is_empty(&self) -> bool {
        self.team_a_id.is_none() && self.team_b_id.is_none()
    }
}

/// Match row to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMatch {
    pub tournament_id: TournamentId,
    pub round: u32,
    pub slot: u32,
    pub team_a_id: Option<TeamId>,
    pub team_b_id: Option<TeamId>,
}

/// Leaderboard entry for one team in one tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub tournament_id: TournamentId,
    pub team_id: TeamId,
    /// Team display name, when the team row is still present
    pub team_name: Option<String>,
    pub wins: i32,
    pub losses: i32,
    /// Reserved for external scoring extensions
    pub points: i32,
}

/// Result of round-1 generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketSummary {
    pub num_teams: usize,
    pub num_rounds: u32,
    pub round1_slots: u32,
    pub round1_matches: u32,
    pub matches_created: usize,
    pub byes_advanced: usize,
}

/// What happened after a result was recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Progress {
    /// The final was played
    Complete { champion_id: TeamId },
    /// The winner was linked into the next round
    Advanced {
        next_match_id: MatchId,
        next_match_ready: bool,
    },
}

/// Outcome of a result submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvanceOutcome {
    pub match_id: MatchId,
    pub winner_id: TeamId,
    pub progress: Progress,
}

impl AdvanceOutcome {
    pub fn tournament_complete(&self) -> bool {
        matches!(self.progress, Progress::Complete { .. })
    }

    pub fn champion_id(&self) -> Option<TeamId> {
        match self.progress {
            Progress::Complete { champion_id } => Some(champion_id),
            Progress::Advanced { .. } => None,
        }
    }

    pub fn next_match_id(&self) -> Option<MatchId> {
        match self.progress {
            Progress::Advanced { next_match_id, .. } => Some(next_match_id),
            Progress::Complete { .. } => None,
        }
    }

    pub fn next_match_ready(&self) -> bool {
        matches!(
            self.progress,
            Progress::Advanced {
                next_match_ready: true,
                ..
            }
        )
    }
}

/// Result of registering teams into a tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationSummary {
    /// Teams that did not have a leaderboard entry yet
    pub added_team_ids: Vec<TeamId>,
    /// Number of team ids in the request
    pub total_teams: usize,
}

/// Matches grouped by round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketView {
    pub tournament_id: TournamentId,
    pub tournament_name: String,
    pub rounds: BTreeMap<u32, Vec<Match>>,
}

impl BracketView {
    pub fn new(tournament: &Tournament, matches: Vec<Match>) -> Self {
        let mut rounds: BTreeMap<u32, Vec<Match>> = BTreeMap::new();
        for m in matches {
            rounds.entry(m.round).or_default().push(m);
        }
        for round in rounds.values_mut() {
            round.sort_by_key(|m| m.slot);
        }

        Self {
            tournament_id: tournament.id,
            tournament_name: tournament.name.clone(),
            rounds,
        }
    }

    pub fn round(&self, round: u32) -> &[Match] {
        self.rounds.get(&round).map(Vec::as_slice).unwrap_or(&[])
    }
}
