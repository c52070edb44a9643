//! Small games with known answers for exercising the engines.

use crate::interface::{Game, Player};
use crate::reward::RewardMap;

/// Seat 0 picks one of three actions, seat 1 one of two. Seat 0 wins exactly
/// when it picked `2`; seat 1 cannot change that.
#[derive(Default)]
pub struct Duel {
    picks: Vec<u8>,
}

impl Duel {
    pub fn new() -> Self {
        Self::default()
    }

    fn reward(picks: &[u8]) -> RewardMap {
        match picks {
            [2, _] => RewardMap::first_player_wins(),
            [_, _] => RewardMap::second_player_wins(),
            _ => RewardMap::nobody_wins(),
        }
    }
}

impl Game for Duel {
    type State = Vec<u8>;
    type Action = u8;

    fn initial_state(&self) -> Vec<u8> {
        Vec::new()
    }

    fn reset(&mut self) {
        self.picks.clear();
    }

    fn simulate(&mut self, action: &u8) -> RewardMap {
        self.picks.push(*action);
        Self::reward(&self.picks)
    }

    fn simulate_dry(&self, state: &Vec<u8>, action: &u8) -> (Vec<u8>, RewardMap) {
        let mut next = state.clone();
        next.push(*action);
        let reward = Self::reward(&next);
        (next, reward)
    }

    fn valid_actions(&self) -> Vec<u8> {
        match self.picks.len() {
            0 => vec![0, 1, 2],
            1 => vec![0, 1],
            _ => Vec::new(),
        }
    }

    fn current_state(&self) -> &Vec<u8> {
        &self.picks
    }

    fn turn(&self) -> Player {
        self.picks.len() % 2
    }

    fn is_terminal(&self) -> bool {
        self.picks.len() == 2
    }

    fn render(&self) -> String {
        format!("{:?}", self.picks)
    }
}

/// Fixed-length game that pays out on every ply: the mover gains the value of
/// the action it picked and the other seat loses it.
pub struct Ladder {
    depth: usize,
    moves: Vec<u8>,
}

impl Ladder {
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            moves: Vec::new(),
        }
    }

    fn reward(mover: Player, action: u8) -> RewardMap {
        let value = action as f64;
        RewardMap::from([(mover, value), (1 - mover, -value)])
    }
}

impl Game for Ladder {
    type State = Vec<u8>;
    type Action = u8;

    fn initial_state(&self) -> Vec<u8> {
        Vec::new()
    }

    fn reset(&mut self) {
        self.moves.clear();
    }

    fn simulate(&mut self, action: &u8) -> RewardMap {
        let mover = self.turn();
        self.moves.push(*action);
        Self::reward(mover, *action)
    }

    fn simulate_dry(&self, state: &Vec<u8>, action: &u8) -> (Vec<u8>, RewardMap) {
        let mut next = state.clone();
        next.push(*action);
        (next, Self::reward(state.len() % 2, *action))
    }

    fn valid_actions(&self) -> Vec<u8> {
        if self.is_terminal() {
            Vec::new()
        } else {
            vec![0, 1, 2]
        }
    }

    fn current_state(&self) -> &Vec<u8> {
        &self.moves
    }

    fn turn(&self) -> Player {
        self.moves.len() % 2
    }

    fn is_terminal(&self) -> bool {
        self.moves.len() >= self.depth
    }

    fn render(&self) -> String {
        format!("{:?}", self.moves)
    }
}
