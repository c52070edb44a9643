use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::interface::{Game, Policy};

/// Uniformly random legal moves. The default simulation policy for rollouts
/// and the usual benchmark opponent.
pub struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    pub fn new() -> Self {
        Self {
            rng: ChaCha20Rng::from_entropy(),
        }
    }

    /// Reproducible sequence of choices.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: Game> Policy<G> for RandomPolicy {
    fn act(&mut self, game: &G) -> G::Action {
        assert!(!game.is_terminal(), "asked to act in a terminal state");
        let moves = game.valid_actions();
        match moves.choose(&mut self.rng) {
            Some(m) => m.clone(),
            None => panic!("asked to act with no legal actions"),
        }
    }
}
