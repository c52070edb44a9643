//! The common structures and traits.

use std::fmt::Debug;
use std::hash::Hash;

use crate::reward::RewardMap;

/// Index of a seat at the table. Two-player games use `0` and `1`.
pub type Player = usize;

/// Defines the rules for a two-player, perfect-knowledge, turn-based game.
///
/// The game owns its current position and is mutated in place by
/// [`Game::simulate`]. Search engines borrow it for the length of a rollout
/// and always hand it back reset to the initial position.
pub trait Game {
    /// Full position, including whose turn it is. Structurally equal states
    /// must hash equally: the search collapses transpositions by this key.
    type State: Clone + Eq + Hash + Debug;
    /// A legal move. Used as the key of tree edges.
    type Action: Clone + Eq + Hash + Debug;

    /// The state `reset` returns the game to.
    fn initial_state(&self) -> Self::State;

    /// Put the game back in its initial position.
    fn reset(&mut self);

    /// Play `action` from the current position and return the reward each
    /// player receives for this transition.
    fn simulate(&mut self, action: &Self::Action) -> RewardMap;

    /// Like [`Game::simulate`], but from an arbitrary `state` and without
    /// touching the current position.
    fn simulate_dry(&self, state: &Self::State, action: &Self::Action)
        -> (Self::State, RewardMap);

    /// Legal moves from the current position. The order is significant: the
    /// engines break ties toward earlier actions.
    fn valid_actions(&self) -> Vec<Self::Action>;

    fn current_state(&self) -> &Self::State;

    /// The player to move.
    fn turn(&self) -> Player;

    fn is_terminal(&self) -> bool;

    /// Return a human-readable picture of the current position.
    fn render(&self) -> String;
}

/// Defines a method of choosing a move for the player to move.
pub trait Policy<G: Game> {
    /// Must only be called when `!game.is_terminal()` and there is at least
    /// one legal action.
    fn act(&mut self, game: &G) -> G::Action;
}

impl<G: Game, P: Policy<G> + ?Sized> Policy<G> for &mut P {
    fn act(&mut self, game: &G) -> G::Action {
        (**self).act(game)
    }
}
