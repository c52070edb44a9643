use std::collections::VecDeque;

use crate::interface::{Game, Policy};

pub use crate::mcts::rollout_policy::RandomPolicy;

/// Plays a fixed list of actions in order, regardless of the position.
///
/// Panics when the script runs out.
pub struct ScriptedPolicy<A> {
    actions: VecDeque<A>,
}

impl<A> ScriptedPolicy<A> {
    pub fn new(actions: impl IntoIterator<Item = A>) -> Self {
        Self {
            actions: actions.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.actions.len()
    }
}

impl<G: Game> Policy<G> for ScriptedPolicy<G::Action> {
    fn act(&mut self, game: &G) -> G::Action {
        assert!(!game.is_terminal(), "asked to act in a terminal state");
        match self.actions.pop_front() {
            Some(action) => action,
            None => panic!("scripted policy ran out of actions"),
        }
    }
}
