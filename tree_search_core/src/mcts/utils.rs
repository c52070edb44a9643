use std::ops::{Deref, DerefMut};

use crate::interface::Game;

/// Borrows a game for the length of a rollout and resets it when dropped,
/// including while unwinding out of a panicking policy.
pub(super) struct ResetOnDrop<'a, G: Game>(&'a mut G);

impl<'a, G: Game> ResetOnDrop<'a, G> {
    /// Resets the game up front as well, so every rollout starts from the
    /// initial position.
    pub(super) fn new(game: &'a mut G) -> Self {
        game.reset();
        Self(game)
    }
}

impl<G: Game> Deref for ResetOnDrop<'_, G> {
    type Target = G;

    fn deref(&self) -> &G {
        self.0
    }
}

impl<G: Game> DerefMut for ResetOnDrop<'_, G> {
    fn deref_mut(&mut self) -> &mut G {
        self.0
    }
}

impl<G: Game> Drop for ResetOnDrop<'_, G> {
    fn drop(&mut self) {
        self.0.reset();
    }
}

// Find and return the highest scoring element. Elements scored `None` are
// skipped. If multiple elements share the highest score, the first one wins,
// so callers get a deterministic choice that follows the game's move order.
pub(super) fn first_best<T, F>(items: impl IntoIterator<Item = T>, mut score_fn: F) -> Option<T>
where
    F: FnMut(&T) -> Option<f64>,
{
    let mut best_score = f64::NEG_INFINITY;
    let mut best = None;
    for item in items {
        let Some(score) = score_fn(&item) else {
            continue;
        };
        debug_assert!(!score.is_nan());
        if best.is_none() || score > best_score {
            best_score = score;
            best = Some(item);
        }
    }
    best
}
