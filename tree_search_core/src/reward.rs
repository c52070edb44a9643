use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::ops::{Add, AddAssign};

use thiserror::Error;

use crate::interface::Player;

#[derive(Debug, Error, PartialEq)]
pub enum RewardMapError {
    #[error("reward maps cover different players: {left:?} vs {right:?}")]
    MismatchedPlayers {
        left: Vec<Player>,
        right: Vec<Player>,
    },
}

/// Reward attributed to each player.
///
/// All maps that are combined must cover the same players. Adding maps with
/// different key sets is a bug in the caller and panics; use
/// [`RewardMap::checked_add`] to test for it instead.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardMap {
    data: BTreeMap<Player, f64>,
}

impl RewardMap {
    /// +1 for the first player, -1 for the second.
    pub fn first_player_wins() -> Self {
        Self::from([(0, 1.0), (1, -1.0)])
    }

    /// -1 for the first player, +1 for the second.
    pub fn second_player_wins() -> Self {
        Self::from([(0, -1.0), (1, 1.0)])
    }

    /// Zero for both players.
    pub fn nobody_wins() -> Self {
        Self::from([(0, 0.0), (1, 0.0)])
    }

    /// Reward of `player`. Panics if the map does not cover `player`.
    pub fn at(&self, player: Player) -> f64 {
        match self.data.get(&player) {
            Some(reward) => *reward,
            None => panic!("no reward recorded for player {player} in {self}"),
        }
    }

    pub fn get(&self, player: Player) -> Option<f64> {
        self.data.get(&player).copied()
    }

    pub fn players(&self) -> impl Iterator<Item = Player> + '_ {
        self.data.keys().copied()
    }

    /// Element-wise sum, or an error if the two maps cover different players.
    pub fn checked_add(&self, other: &RewardMap) -> Result<RewardMap, RewardMapError> {
        if !self.data.keys().eq(other.data.keys()) {
            return Err(RewardMapError::MismatchedPlayers {
                left: self.players().collect(),
                right: other.players().collect(),
            });
        }
        let data = self
            .data
            .iter()
            .zip(other.data.values())
            .map(|((&player, a), b)| (player, a + b))
            .collect();
        Ok(RewardMap { data })
    }
}

impl<const N: usize> From<[(Player, f64); N]> for RewardMap {
    fn from(entries: [(Player, f64); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl FromIterator<(Player, f64)> for RewardMap {
    fn from_iter<I: IntoIterator<Item = (Player, f64)>>(iter: I) -> Self {
        Self {
            data: iter.into_iter().collect(),
        }
    }
}

impl AddAssign<&RewardMap> for RewardMap {
    fn add_assign(&mut self, rhs: &RewardMap) {
        match self.checked_add(rhs) {
            Ok(sum) => *self = sum,
            Err(err) => panic!("{err}"),
        }
    }
}

impl AddAssign for RewardMap {
    fn add_assign(&mut self, rhs: RewardMap) {
        *self += &rhs;
    }
}

impl Add<&RewardMap> for RewardMap {
    type Output = RewardMap;

    fn add(mut self, rhs: &RewardMap) -> RewardMap {
        self += rhs;
        self
    }
}

impl Add for RewardMap {
    type Output = RewardMap;

    fn add(self, rhs: RewardMap) -> RewardMap {
        self + &rhs
    }
}

impl Display for RewardMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (player, reward)) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{player}: {reward}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add() {
        let a = RewardMap::from([(0, 1.0), (1, 2.0)]);
        let b = RewardMap::from([(0, 4.0), (1, -2.0)]);

        let c = a + b;
        assert!((c.at(0) - 5.0).abs() < 1e-9);
        assert!(c.at(1).abs() < 1e-9);
    }

    #[test]
    fn test_add_assign_accumulates() {
        let mut total = RewardMap::nobody_wins();
        total += &RewardMap::first_player_wins();
        total += &RewardMap::first_player_wins();
        total += &RewardMap::second_player_wins();
        assert_eq!(total, RewardMap::from([(0, 1.0), (1, -1.0)]));
    }

    #[test]
    fn test_checked_add_rejects_mismatched_players() {
        let a = RewardMap::from([(0, 1.0), (1, 2.0)]);
        let b = RewardMap::from([(0, 1.0), (2, 2.0)]);
        assert_eq!(
            a.checked_add(&b),
            Err(RewardMapError::MismatchedPlayers {
                left: vec![0, 1],
                right: vec![0, 2],
            })
        );
    }

    #[test]
    #[should_panic(expected = "different players")]
    fn test_add_panics_on_mismatched_players() {
        let a = RewardMap::from([(0, 1.0), (1, 2.0)]);
        let b = RewardMap::from([(0, 1.0)]);
        let _ = a + b;
    }

    #[test]
    #[should_panic(expected = "no reward recorded for player 2")]
    fn test_at_missing_player() {
        RewardMap::nobody_wins().at(2);
    }

    #[test]
    fn test_display() {
        assert_eq!(RewardMap::first_player_wins().to_string(), "{0: 1, 1: -1}");
        assert_eq!(RewardMap::nobody_wins().get(1), Some(0.0));
        assert_eq!(RewardMap::nobody_wins().get(3), None);
    }
}
