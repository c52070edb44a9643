//! Playing a trained engine against an opponent without learning from it.

use thiserror::Error;
use tracing::{info, trace};

use crate::interface::{Game, Player, Policy};

#[derive(Debug, Error, PartialEq)]
pub enum EvaluationError {
    /// Outcomes are read from the final reward, which must be +1, -1 or 0.
    #[error("terminal reward {0} is not a win (+1), loss (-1) or draw (0)")]
    UnexpectedReward(f64),
}

/// Result of one evaluation game, from the engine's seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

impl Outcome {
    pub fn from_reward(reward: f64) -> Result<Self, EvaluationError> {
        if reward == 1.0 {
            Ok(Outcome::Win)
        } else if reward == -1.0 {
            Ok(Outcome::Loss)
        } else if reward == 0.0 {
            Ok(Outcome::Draw)
        } else {
            Err(EvaluationError::UnexpectedReward(reward))
        }
    }
}

/// An engine that can play greedily against an opponent.
///
/// Evaluation only reads the engine's statistics, so one trained engine can
/// be shared by many concurrent games.
pub trait Agent<G: Game> {
    /// Play one game from the initial position: the engine in seat `1` if
    /// `opponent_goes_first`, else seat `0`. The game is reset on return.
    fn evaluate(
        &self,
        game: &mut G,
        opponent: &mut dyn Policy<G>,
        opponent_goes_first: bool,
        verbose: bool,
    ) -> Result<Outcome, EvaluationError>;
}

pub(crate) fn seat(opponent_goes_first: bool) -> Player {
    if opponent_goes_first {
        1
    } else {
        0
    }
}

/// Alternate `own_move` and `opponent` until the game ends. Expects the game
/// at its initial position.
pub(crate) fn play_against<G: Game>(
    game: &mut G,
    mut own_move: impl FnMut(&G) -> G::Action,
    opponent: &mut dyn Policy<G>,
    opponent_goes_first: bool,
    verbose: bool,
) -> Result<Outcome, EvaluationError> {
    let player_num = seat(opponent_goes_first);
    let mut final_reward = 0.0;
    while !game.is_terminal() {
        let action = if game.turn() == player_num {
            own_move(&*game)
        } else {
            opponent.act(&*game)
        };
        // Unlike training, the reward is tracked on opponent turns too.
        final_reward = game.simulate(&action).at(player_num);
        if verbose {
            info!("\n{}", game.render());
        } else {
            trace!(?action, "\n{}", game.render());
        }
    }

    let outcome = Outcome::from_reward(final_reward)?;
    if verbose {
        match outcome {
            Outcome::Win => info!("search won!"),
            Outcome::Loss => info!("opponent won!"),
            Outcome::Draw => info!("it's a draw!"),
        }
    }
    Ok(outcome)
}
