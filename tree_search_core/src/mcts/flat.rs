//! Visitation-count tree that grows only along the games it plays.
//!
//! There is no bandit rule here: the tree acts eps-greedily on its own
//! estimates and, after each training episode, credits every node on the
//! played path with the reward of the *whole* episode. That differs on purpose
//! from [`UctSearch`](super::algorithm::UctSearch), which credits each node
//! only with the reward earned from that node onward. The two rules produce
//! different statistics and must not be merged.

use std::fmt::Display;

use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tracing::{debug, info};

use super::history::{HistoryFrame, RolloutConfig};
use super::node::{Node, NodeId, NodeStore};
use super::utils::{first_best, ResetOnDrop};
use super::{log_position, UNEXPLORED_STATE_REWARD};

use crate::evaluation::{Agent, EvaluationError, Outcome};
use crate::interface::{Game, Policy};

/// Options for [`FlatTree`].
#[derive(Clone, Debug)]
pub struct FlatOptions {
    unexplored_state_reward: f64,
    // None means seed from entropy.
    seed: Option<u64>,
}

impl Default for FlatOptions {
    fn default() -> Self {
        Self {
            unexplored_state_reward: UNEXPLORED_STATE_REWARD,
            seed: None,
        }
    }
}

impl FlatOptions {
    /// Value assumed for states with no node yet. Raising it makes the
    /// greedy policy try unexplored moves before known good ones.
    pub fn with_unexplored_state_reward(mut self, reward: f64) -> Self {
        self.unexplored_state_reward = reward;
        self
    }

    /// Seed for the exploration coin flips and random moves during training.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

pub type FlatNode<G> = Node<<G as Game>::State, <G as Game>::Action, f64>;
pub type FlatStore<G> = NodeStore<<G as Game>::State, <G as Game>::Action, f64>;
pub type FlatFrame<G> = HistoryFrame<<G as Game>::State, <G as Game>::Action, f64>;

pub struct FlatTree<G: Game> {
    nodes: FlatStore<G>,
    root: NodeId,
    options: FlatOptions,
    rng: ChaCha20Rng,
}

impl<G: Game> FlatTree<G> {
    pub fn new(game: &G, options: FlatOptions) -> Self {
        let mut nodes = NodeStore::new();
        let root = nodes.get_or_insert(&game.initial_state(), || 0.0);
        let rng = match options.seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_entropy(),
        };
        Self {
            nodes,
            root,
            options,
            rng,
        }
    }

    pub fn nodes(&self) -> &FlatStore<G> {
        &self.nodes
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node_for(&self, state: &G::State) -> Option<&FlatNode<G>> {
        self.nodes.lookup(state).map(|id| self.nodes.get(id))
    }

    fn greedy(&self) -> Greedy<'_, G> {
        Greedy {
            nodes: &self.nodes,
            unexplored_state_reward: self.options.unexplored_state_reward,
        }
    }

    /// Mean episode reward of games through `state`, or the unexplored
    /// constant if the tree has never seen it.
    pub fn expected_reward(&self, state: &G::State) -> f64 {
        self.greedy().expected_reward(state)
    }

    /// The legal action leading to the state with the highest expected reward,
    /// ties going to the earliest action.
    pub fn greedy_action(&self, game: &G) -> G::Action {
        self.greedy().best_action(game)
    }

    /// Play `rollouts` training episodes against `opponent`. On its own turns
    /// the tree moves uniformly at random with probability `epsilon` and
    /// greedily otherwise.
    pub fn train(
        &mut self,
        game: &mut G,
        opponent: &mut dyn Policy<G>,
        rollouts: usize,
        epsilon: f64,
        opponent_goes_first: bool,
    ) {
        assert!(
            (0.0..=1.0).contains(&epsilon),
            "epsilon {epsilon} is not a probability"
        );
        let config = RolloutConfig::training().with_opponent_goes_first(opponent_goes_first);
        for _ in 0..rollouts {
            let history = {
                let mut me = EpsilonGreedy {
                    greedy: Greedy {
                        nodes: &self.nodes,
                        unexplored_state_reward: self.options.unexplored_state_reward,
                    },
                    epsilon,
                    rng: &mut self.rng,
                };
                play_episode(game, &mut me, opponent, &config)
            };
            self.backpropagate(&history);
        }
        info!(
            rollouts,
            epsilon,
            opponent_goes_first,
            nodes = self.nodes.len(),
            "finished flat training batch"
        );
    }

    /// Play one episode with `self_policy` in the engine's seat and
    /// `opponent` in the other, recording the engine seat's reward for every
    /// ply. With `config.update_weights`, every node on the path is credited
    /// with the sum of those rewards.
    ///
    /// The game is reset on return.
    pub fn rollout(
        &mut self,
        game: &mut G,
        self_policy: &mut dyn Policy<G>,
        opponent: &mut dyn Policy<G>,
        config: &RolloutConfig,
    ) -> Vec<FlatFrame<G>> {
        let history = play_episode(game, self_policy, opponent, config);
        if config.update_weights {
            self.backpropagate(&history);
        }
        history
    }

    // Whole-episode attribution: root and every later node get the same total.
    fn backpropagate(&mut self, history: &[FlatFrame<G>]) {
        let total_rollout_reward: f64 = history.iter().map(|frame| frame.reward).sum();
        debug!(
            frames = history.len(),
            total_rollout_reward, "backpropagating"
        );

        let mut current = self.root;
        for frame in history {
            if let Some(action) = &frame.action {
                current = self
                    .nodes
                    .get_or_create_child(current, action, &frame.state, || 0.0);
            } else {
                debug_assert_eq!(self.nodes.get(current).state, frame.state);
            }
            self.nodes.get_mut(current).record(&total_rollout_reward);
        }
    }

    /// Breadth-first dump of the tree down to `max_depth`.
    pub fn render_tree(&self, max_depth: usize) -> String
    where
        G::State: Display,
    {
        self.nodes.render(self.root, max_depth)
    }
}

impl<G: Game> Agent<G> for FlatTree<G> {
    /// One greedy episode with no exploration and no updates.
    fn evaluate(
        &self,
        game: &mut G,
        opponent: &mut dyn Policy<G>,
        opponent_goes_first: bool,
        verbose: bool,
    ) -> Result<Outcome, EvaluationError> {
        let mut config = RolloutConfig::evaluation().with_opponent_goes_first(opponent_goes_first);
        if verbose {
            config = config.verbose();
        }
        let history = play_episode(game, &mut self.greedy(), opponent, &config);
        let final_reward = history.last().map_or(0.0, |frame| frame.reward);
        let outcome = Outcome::from_reward(final_reward)?;
        if verbose {
            info!(?outcome, "flat tree evaluation finished");
        }
        Ok(outcome)
    }
}

/// Greedy on the tree's estimates, so trained trees can face each other.
impl<G: Game> Policy<G> for FlatTree<G> {
    fn act(&mut self, game: &G) -> G::Action {
        self.greedy_action(game)
    }
}

fn play_episode<G: Game>(
    game: &mut G,
    self_policy: &mut dyn Policy<G>,
    opponent: &mut dyn Policy<G>,
    config: &RolloutConfig,
) -> Vec<FlatFrame<G>> {
    let mut game = ResetOnDrop::new(game);
    let self_seat = config.self_seat();
    let mut history = vec![HistoryFrame {
        action: None,
        reward: 0.0,
        state: game.current_state().clone(),
        player: game.turn(),
    }];

    while !game.is_terminal() {
        let player = game.turn();
        let action = if player == self_seat {
            self_policy.act(&*game)
        } else {
            opponent.act(&*game)
        };
        let reward = game.simulate(&action).at(self_seat);
        log_position(config.verbose, &*game);
        history.push(HistoryFrame {
            action: Some(action),
            reward,
            state: game.current_state().clone(),
            player,
        });
    }
    history
}

/// Read-only greedy view over a tree's statistics.
struct Greedy<'a, G: Game> {
    nodes: &'a FlatStore<G>,
    unexplored_state_reward: f64,
}

impl<G: Game> Greedy<'_, G> {
    fn expected_reward(&self, state: &G::State) -> f64 {
        match self.nodes.lookup(state) {
            Some(id) => self.nodes.get(id).expected_reward(),
            None => self.unexplored_state_reward,
        }
    }

    fn best_action(&self, game: &G) -> G::Action {
        assert!(!game.is_terminal(), "asked to act in a terminal state");
        let state = game.current_state();
        let best = first_best(game.valid_actions(), |action| {
            let (next, _) = game.simulate_dry(state, action);
            Some(self.expected_reward(&next))
        });
        match best {
            Some(action) => action,
            None => panic!("no legal actions to choose from"),
        }
    }
}

impl<G: Game> Policy<G> for Greedy<'_, G> {
    fn act(&mut self, game: &G) -> G::Action {
        self.best_action(game)
    }
}

struct EpsilonGreedy<'a, G: Game> {
    greedy: Greedy<'a, G>,
    epsilon: f64,
    rng: &'a mut ChaCha20Rng,
}

impl<G: Game> Policy<G> for EpsilonGreedy<'_, G> {
    fn act(&mut self, game: &G) -> G::Action {
        if !self.rng.gen_bool(self.epsilon) {
            return self.greedy.best_action(game);
        }
        match game.valid_actions().choose(&mut *self.rng) {
            Some(action) => action.clone(),
            None => panic!("no legal actions to choose from"),
        }
    }
}
