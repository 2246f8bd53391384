//! Round and slot arithmetic for a single-elimination bracket.
//!
//! Seeded position `i` sits in round-1 match `i / 2` on side A when `i` is
//! even and side B when odd. Seeded positions are filled as a contiguous
//! prefix `0..team_count`, so whether a branch of the tree can ever produce a
//! team is a pure function of its range of seeded positions.

use super::errors::{BracketResult, ValidationError};
use super::models::Side;

/// Largest entrant count whose round 1 fits in `u32` slots
pub const MAX_TEAMS: u32 = 1 << 31;

/// Shape of a bracket derived from its entrant count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BracketLayout {
    team_count: u32,
    slots: u32,
}

impl BracketLayout {
    /// Layout for `team_count` entrants, from 2 up to [`MAX_TEAMS`].
    pub fn for_team_count(team_count: usize) -> BracketResult<Self> {
        if team_count < 2 {
            return Err(ValidationError::TooFewTeams(team_count).into());
        }
        let count = u32::try_from(team_count)
            .ok()
            .filter(|count| *count <= MAX_TEAMS)
            .ok_or(ValidationError::TooManyTeams(team_count))?;
        let slots = count.next_power_of_two();

        Ok(Self {
            team_count: count,
            slots,
        })
    }

    /// Rebuild a layout from persisted round-1 rows when the tournament row
    /// carries no shape. `team_count` is the number of occupied round-1 sides.
    pub fn from_round_one(round_one_matches: u32, team_count: u32) -> Option<Self> {
        if round_one_matches == 0 || !round_one_matches.is_power_of_two() {
            return None;
        }
        Some(Self {
            team_count,
            slots: round_one_matches * 2,
        })
    }

    /// Rebuild from the shape persisted on the tournament row
    pub fn from_shape(total_rounds: u32, team_count: u32) -> Option<Self> {
        if total_rounds == 0 || total_rounds >= 32 {
            return None;
        }
        Some(Self {
            team_count,
            slots: 1 << total_rounds,
        })
    }

    pub fn team_count(&self) -> u32 {
        self.team_count
    }

    /// Round-1 team positions, the smallest power of two >= team count
    pub fn slots(&self) -> u32 {
        self.slots
    }

    pub fn round_one_matches(&self) -> u32 {
        self.slots / 2
    }

    pub fn total_rounds(&self) -> u32 {
        self.slots.trailing_zeros()
    }

    /// Number of matches in `round` (1-based)
    pub fn matches_in_round(&self, round: u32) -> u32 {
        if round == 0 || round > self.total_rounds() {
            0
        } else {
            self.slots >> round
        }
    }

    pub fn is_final(&self, round: u32) -> bool {
        round == self.total_rounds()
    }

    /// Seeded-list indices for the two sides of round-1 match `slot`
    pub fn seed_indices(slot: u32) -> (usize, usize) {
        let a = slot as usize * 2;
        (a, a + 1)
    }

    /// Whether no team can ever arrive on `side` of match `(round, slot)`.
    ///
    /// Side position `p = 2 * slot + side` in `round` is fed by the seeded
    /// range `[p * 2^(round-1), (p + 1) * 2^(round-1))`.
    pub fn feeder_is_vacant(&self, round: u32, slot: u32, side: Side) -> bool {
        if round == 0 {
            return true;
        }
        let position = 2 * u64::from(slot) + u64::from(side.offset());
        let first_seed = position << (round - 1);
        first_seed >= u64::from(self.team_count)
    }
}

/// Where the winner of `(round, slot)` is placed: `(round + 1, slot / 2)`,
/// side A for an even source slot, side B for an odd one.
pub fn next_position(round: u32, slot: u32) -> (u32, u32, Side) {
    (round + 1, slot / 2, Side::for_source_slot(slot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::errors::BracketError;
    use proptest::prelude::*;

    #[test]
    fn test_two_teams() {
        let layout = BracketLayout::for_team_count(2).unwrap();
        assert_eq!(layout.slots(), 2);
        assert_eq!(layout.round_one_matches(), 1);
        assert_eq!(layout.total_rounds(), 1);
        assert!(layout.is_final(1));
    }

    #[test]
    fn test_five_teams() {
        let layout = BracketLayout::for_team_count(5).unwrap();
        assert_eq!(layout.slots(), 8);
        assert_eq!(layout.round_one_matches(), 4);
        assert_eq!(layout.total_rounds(), 3);
        assert_eq!(layout.matches_in_round(1), 4);
        assert_eq!(layout.matches_in_round(2), 2);
        assert_eq!(layout.matches_in_round(3), 1);
        assert_eq!(layout.matches_in_round(4), 0);
    }

    #[test]
    fn test_too_few_teams() {
        assert!(BracketLayout::for_team_count(0).is_err());
        assert!(BracketLayout::for_team_count(1).is_err());
    }

    #[test]
    fn test_too_many_teams() {
        let err = BracketLayout::for_team_count(MAX_TEAMS as usize + 1).unwrap_err();
        assert!(matches!(
            err,
            BracketError::Validation(ValidationError::TooManyTeams(n)) if n == MAX_TEAMS as usize + 1
        ));
        assert!(err.to_string().contains("At most 2147483648 teams"));

        let largest = BracketLayout::for_team_count(MAX_TEAMS as usize).unwrap();
        assert_eq!(largest.slots(), MAX_TEAMS);
        assert_eq!(largest.total_rounds(), 31);
    }

    #[test]
    fn test_next_position() {
        assert_eq!(next_position(1, 0), (2, 0, Side::A));
        assert_eq!(next_position(1, 1), (2, 0, Side::B));
        assert_eq!(next_position(1, 2), (2, 1, Side::A));
        assert_eq!(next_position(1, 3), (2, 1, Side::B));
        assert_eq!(next_position(2, 1), (3, 0, Side::B));
    }

    #[test]
    fn test_vacancy_for_five_teams() {
        // Seeds 0..5 over 8 positions: round 1 slot 2 = {4, 5}, slot 3 = {6, 7}
        let layout = BracketLayout::for_team_count(5).unwrap();
        assert!(!layout.feeder_is_vacant(1, 2, Side::A));
        assert!(layout.feeder_is_vacant(1, 2, Side::B));
        assert!(layout.feeder_is_vacant(1, 3, Side::A));
        assert!(layout.feeder_is_vacant(1, 3, Side::B));

        // Round 2 slot 1: side A fed by r1 slot 2, side B by the double bye
        assert!(!layout.feeder_is_vacant(2, 1, Side::A));
        assert!(layout.feeder_is_vacant(2, 1, Side::B));

        // Final: both halves have teams
        assert!(!layout.feeder_is_vacant(3, 0, Side::A));
        assert!(!layout.feeder_is_vacant(3, 0, Side::B));
    }

    #[test]
    fn test_rebuild_from_persisted_shape() {
        let layout = BracketLayout::for_team_count(6).unwrap();
        assert_eq!(
            BracketLayout::from_shape(layout.total_rounds(), 6),
            Some(layout)
        );
        assert_eq!(BracketLayout::from_round_one(4, 6), Some(layout));
        assert_eq!(BracketLayout::from_round_one(3, 6), None);
        assert_eq!(BracketLayout::from_round_one(0, 0), None);
    }

    proptest! {
        #[test]
        fn prop_slot_arithmetic(n in 2usize..=512) {
            let layout = BracketLayout::for_team_count(n).unwrap();
            let slots = layout.slots() as usize;

            prop_assert!(slots.is_power_of_two());
            prop_assert!(slots >= n);
            prop_assert!(slots / 2 < n);
            prop_assert_eq!(layout.round_one_matches() as usize, slots / 2);
            prop_assert_eq!(1usize << layout.total_rounds(), slots);
        }

        #[test]
        fn prop_vacancy_matches_seed_prefix(n in 2usize..=64) {
            let layout = BracketLayout::for_team_count(n).unwrap();
            for slot in 0..layout.round_one_matches() {
                let (a, b) = BracketLayout::seed_indices(slot);
                prop_assert_eq!(layout.feeder_is_vacant(1, slot, Side::A), a >= n);
                prop_assert_eq!(layout.feeder_is_vacant(1, slot, Side::B), b >= n);
            }
        }
    }
}
