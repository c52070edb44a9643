use crate::interface::Player;

/// One ply of a rollout. A rollout's history starts with a frame for the
/// root, which has no action.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryFrame<S, A, R> {
    /// Action that produced `state`, `None` for the root.
    pub action: Option<A>,
    /// Reward for the transition into `state`.
    pub reward: R,
    /// State after taking `action`.
    pub state: S,
    /// Player who took `action`. For the root, the player to move.
    pub player: Player,
}

/// Per-call rollout settings. Never stored on an engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct RolloutConfig {
    /// Fold the rollout into the node statistics.
    pub update_weights: bool,
    /// Seat the engine plays in the flat tree. UCT plays both seats and
    /// ignores it.
    pub opponent_goes_first: bool,
    /// Log every position at `info` instead of `trace`.
    pub verbose: bool,
}

impl RolloutConfig {
    pub fn training() -> Self {
        Self {
            update_weights: true,
            ..Self::default()
        }
    }

    pub fn evaluation() -> Self {
        Self::default()
    }

    pub fn with_opponent_goes_first(mut self, opponent_goes_first: bool) -> Self {
        self.opponent_goes_first = opponent_goes_first;
        self
    }

    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Seat of the engine when it shares the table with an opponent.
    pub fn self_seat(&self) -> Player {
        if self.opponent_goes_first {
            1
        } else {
            0
        }
    }
}
