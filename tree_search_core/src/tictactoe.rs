use super::interface::{Game, Player};
use super::reward::RewardMap;
use std::fmt::{Debug, Display};

//   0 1 2
//   3 4 5
//   6 7 8
const LINES: [[usize; 3]; 8] = [
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    fn player(self) -> Player {
        match self {
            Mark::X => 0,
            Mark::O => 1,
        }
    }
}

/// Board plus side to move. `x` always moves first.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct State {
    pub board: [Option<Mark>; 9],
    pub x_turn: bool,
}

impl Default for State {
    fn default() -> Self {
        Self {
            board: [None; 9],
            x_turn: true,
        }
    }
}

impl State {
    pub fn player_to_move(&self) -> Mark {
        if self.x_turn {
            Mark::X
        } else {
            Mark::O
        }
    }

    pub fn turn(&self) -> Player {
        self.player_to_move().player()
    }

    pub fn has_line(&self, mark: Mark) -> bool {
        LINES
            .iter()
            .any(|line| line.iter().all(|&pos| self.board[pos] == Some(mark)))
    }

    pub fn is_full(&self) -> bool {
        self.board.iter().all(Option::is_some)
    }

    pub fn is_terminal(&self) -> bool {
        self.has_line(Mark::X) || self.has_line(Mark::O) || self.is_full()
    }

    /// Reward for whoever completed a line on this board.
    fn reward(&self) -> RewardMap {
        if self.has_line(Mark::X) {
            RewardMap::first_player_wins()
        } else if self.has_line(Mark::O) {
            RewardMap::second_player_wins()
        } else {
            RewardMap::nobody_wins()
        }
    }

    fn apply(&self, m: Move) -> State {
        assert!(
            self.board[m.0 as usize].is_none(),
            "square {} is already taken",
            m.0
        );
        let mut next = self.clone();
        next.board[m.0 as usize] = Some(self.player_to_move());
        next.x_turn = !self.x_turn;
        next
    }
}

impl Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (r, cells) in self.board.chunks(3).enumerate() {
            for (c, cell) in cells.iter().enumerate() {
                if c > 0 {
                    write!(f, ",")?;
                }
                match cell {
                    Some(Mark::X) => write!(f, "x")?,
                    Some(Mark::O) => write!(f, "o")?,
                    None => write!(f, "{}", r * 3 + c)?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// A square to play at, `0..9` in row-major order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Move(u8);

impl Move {
    pub fn new(square: usize) -> Self {
        assert!(square < 9, "square out of bounds, should be between 0..=8");
        Move(square as _)
    }

    pub fn square(&self) -> usize {
        self.0 as usize
    }
}

impl Debug for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "M({})", self.0)
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "square {}", self.0)
    }
}

#[derive(Default, Clone)]
pub struct TicTacToe {
    state: State,
}

impl TicTacToe {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Game for TicTacToe {
    type State = State;
    type Action = Move;

    fn initial_state(&self) -> State {
        State::default()
    }

    fn reset(&mut self) {
        self.state = State::default();
    }

    fn simulate(&mut self, action: &Move) -> RewardMap {
        self.state = self.state.apply(*action);
        self.state.reward()
    }

    fn simulate_dry(&self, state: &State, action: &Move) -> (State, RewardMap) {
        let next = state.apply(*action);
        let reward = next.reward();
        (next, reward)
    }

    fn valid_actions(&self) -> Vec<Move> {
        (0..9)
            .filter(|&i| self.state.board[i].is_none())
            .map(Move::new)
            .collect()
    }

    fn current_state(&self) -> &State {
        &self.state
    }

    fn turn(&self) -> Player {
        self.state.turn()
    }

    fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    fn render(&self) -> String {
        self.state.to_string()
    }
}
