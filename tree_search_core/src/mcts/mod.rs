pub mod algorithm;
pub mod flat;
pub mod history;
pub mod node;
pub(crate) mod rollout_policy;
mod utils;

#[cfg(test)]
pub(crate) mod testing;

use tracing::{info, trace};

use crate::interface::Game;

/// Exploration constant of UCB1, roughly sqrt(2).
pub const EXPLORATION: f64 = 1.41;

/// Value the flat tree assumes for states it has never seen. Higher values make
/// its greedy policy more optimistic about unexplored moves.
pub const UNEXPLORED_STATE_REWARD: f64 = 0.0;

fn log_position<G: Game>(verbose: bool, game: &G) {
    if verbose {
        info!("\n{}", game.render());
    } else {
        trace!("\n{}", game.render());
    }
}
