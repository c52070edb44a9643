use std::fmt::Display;

use tracing::{debug, info, trace};

use super::history::{HistoryFrame, RolloutConfig};
use super::node::{Node, NodeId, NodeStore};
use super::utils::{first_best, ResetOnDrop};
use super::{log_position, EXPLORATION};

use crate::evaluation::{play_against, Agent, EvaluationError, Outcome};
use crate::interface::{Game, Player, Policy};
use crate::reward::RewardMap;

/// Options for [`UctSearch`].
#[derive(Clone, Debug)]
pub struct UctOptions {
    pub(super) exploration: f64,
}

impl Default for UctOptions {
    fn default() -> Self {
        Self {
            exploration: EXPLORATION,
        }
    }
}

impl UctOptions {
    /// Weight of the exploration term in UCB1. Defaults to 1.41, about
    /// sqrt(2).
    pub fn with_exploration(mut self, exploration: f64) -> Self {
        self.exploration = exploration;
        self
    }
}

pub type UctNode<G> = Node<<G as Game>::State, <G as Game>::Action, RewardMap>;
pub type UctStore<G> = NodeStore<<G as Game>::State, <G as Game>::Action, RewardMap>;
pub type UctFrame<G> = HistoryFrame<<G as Game>::State, <G as Game>::Action, RewardMap>;

/// UCB1 score of a child, from the point of view of the player choosing it.
///
/// Unvisited children score infinity, so every child gets tried once before
/// any is revisited.
pub fn ucb1(
    child_total_reward: f64,
    child_num_rollouts: u32,
    parent_num_rollouts: u32,
    exploration: f64,
) -> f64 {
    assert!(
        parent_num_rollouts > 0,
        "UCB computed for a parent with no rollouts"
    );
    if child_num_rollouts == 0 {
        return f64::INFINITY;
    }
    let child_num_rollouts = child_num_rollouts as f64;
    let expected_reward = child_total_reward / child_num_rollouts;
    let exploration_term =
        exploration * ((parent_num_rollouts as f64).ln() / child_num_rollouts).sqrt();
    expected_reward + exploration_term
}

/// Monte Carlo tree search with UCB1 selection.
///
/// Each rollout selects down the explored tree, adds one frontier node,
/// simulates to the end of the game without growing the tree, and then credits
/// every node on the path with the reward earned from that node onward.
pub struct UctSearch<G: Game> {
    nodes: UctStore<G>,
    root: NodeId,
    options: UctOptions,
}

impl<G: Game> UctSearch<G> {
    pub fn new(game: &G, options: UctOptions) -> Self {
        let mut nodes = NodeStore::new();
        let root = nodes.get_or_insert(&game.initial_state(), RewardMap::nobody_wins);
        Self {
            nodes,
            root,
            options,
        }
    }

    /// Read-only view of every node, for introspection.
    pub fn nodes(&self) -> &UctStore<G> {
        &self.nodes
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node_for(&self, state: &G::State) -> Option<&UctNode<G>> {
        self.nodes.lookup(state).map(|id| self.nodes.get(id))
    }

    /// Run `rollouts` training rollouts.
    pub fn train(&mut self, game: &mut G, simulation_policy: &mut dyn Policy<G>, rollouts: usize) {
        let config = RolloutConfig::training();
        for _ in 0..rollouts {
            self.rollout(game, simulation_policy, &config);
        }
        info!(
            rollouts,
            nodes = self.nodes.len(),
            root_rollouts = self.nodes.get(self.root).num_rollouts_involved,
            "finished UCT training batch"
        );
    }

    /// Play one game from the initial position with `simulation_policy`
    /// standing in for both players past the explored tree. Returns the
    /// recorded history; the last frame holds the reward of the expansion step
    /// plus everything simulated after it.
    ///
    /// The store is only written once the game has finished, so a panicking
    /// policy leaves it as it was. The game is reset on return.
    pub fn rollout(
        &mut self,
        game: &mut G,
        simulation_policy: &mut dyn Policy<G>,
        config: &RolloutConfig,
    ) -> Vec<UctFrame<G>> {
        let mut game = ResetOnDrop::new(game);
        let mut history = vec![HistoryFrame {
            action: None,
            reward: RewardMap::nobody_wins(),
            state: game.current_state().clone(),
            player: game.turn(),
        }];

        // 1. Selection, down to a leaf or off the explored tree.
        debug!("selection phase");
        let mut current = Some(self.root);
        while let Some(id) = current {
            if !self.nodes.get(id).has_children() || game.is_terminal() {
                break;
            }
            let action = self.select_action(&game, id);
            let player = game.turn();
            let reward = game.simulate(&action);
            let state = game.current_state().clone();
            trace!(?action, player, %reward, "selected");

            current = self.nodes.lookup(&state);
            history.push(HistoryFrame {
                action: Some(action),
                reward,
                state,
                player,
            });
        }

        // 2. Expansion. Landing on a state with no node already was the
        // expansion step; from a leaf, take one frontier step.
        if current.is_some() && !game.is_terminal() {
            let player = game.turn();
            debug!(player, "expanding leaf");
            let action = simulation_policy.act(&game);
            let reward = game.simulate(&action);
            log_position(config.verbose, &*game);
            history.push(HistoryFrame {
                action: Some(action),
                reward,
                state: game.current_state().clone(),
                player,
            });
        }

        // 3. Simulation. No tree growth; rewards go to the expansion frame.
        while !game.is_terminal() {
            let action = simulation_policy.act(&game);
            let reward = game.simulate(&action);
            log_position(config.verbose, &*game);
            if let Some(last) = history.last_mut() {
                last.reward += &reward;
            }
        }

        // 4. Backpropagation.
        if config.update_weights {
            self.backpropagate(&history);
        }
        history
    }

    // Links the played path into the tree, then credits each node with the
    // sum of its own frame's reward and every reward recorded after it.
    fn backpropagate(&mut self, history: &[UctFrame<G>]) {
        debug!(frames = history.len(), "backpropagating");
        let mut path = Vec::with_capacity(history.len());
        let mut current = self.root;
        for frame in history {
            if let Some(action) = &frame.action {
                current = self.nodes.get_or_create_child(
                    current,
                    action,
                    &frame.state,
                    RewardMap::nobody_wins,
                );
            } else {
                debug_assert_eq!(self.nodes.get(current).state, frame.state);
            }
            path.push(current);
        }

        let mut reward_from_here_for_rollout = RewardMap::nobody_wins();
        for (frame, &id) in history.iter().zip(&path).rev() {
            reward_from_here_for_rollout += &frame.reward;
            trace!(state = ?frame.state, reward = %reward_from_here_for_rollout, "update node");
            self.nodes.get_mut(id).record(&reward_from_here_for_rollout);
        }
    }

    /// The legal action with the highest UCB1 score for the player to move,
    /// ties going to the earliest action. `node` must be the node of the
    /// game's current state.
    pub fn select_action(&self, game: &G, node: NodeId) -> G::Action {
        let parent_num_rollouts = self.nodes.get(node).num_rollouts_involved;
        let player = game.turn();
        let state = game.current_state();
        let best = first_best(game.valid_actions(), |action| {
            let (next, _) = game.simulate_dry(state, action);
            let (total, visits) = match self.node_for(&next) {
                Some(child) => (
                    child.total_reward_from_here.at(player),
                    child.num_rollouts_involved,
                ),
                None => (0.0, 0),
            };
            Some(ucb1(
                total,
                visits,
                parent_num_rollouts,
                self.options.exploration,
            ))
        });
        match best {
            Some(action) => action,
            None => panic!("no legal actions to select from"),
        }
    }

    /// Best explored action for the player to move, by mean reward. Actions
    /// leading to states never visited are skipped; if none has been visited
    /// the first legal action is returned.
    pub fn act_greedily(&self, game: &G) -> G::Action {
        let player: Player = game.turn();
        let state = game.current_state();
        let actions = game.valid_actions();
        let best = first_best(actions.iter(), |action| {
            let (next, _) = game.simulate_dry(state, action);
            let child = self.node_for(&next)?;
            (child.num_rollouts_involved > 0).then(|| child.expected_reward_for(player))
        });
        match best.or(actions.first()) {
            Some(action) => action.clone(),
            None => panic!("no legal actions to choose from"),
        }
    }

    /// Breadth-first dump of the explored tree down to `max_depth`.
    pub fn render_tree(&self, max_depth: usize) -> String
    where
        G::State: Display,
    {
        self.nodes.render(self.root, max_depth)
    }
}

impl<G: Game> Agent<G> for UctSearch<G> {
    fn evaluate(
        &self,
        game: &mut G,
        opponent: &mut dyn Policy<G>,
        opponent_goes_first: bool,
        verbose: bool,
    ) -> Result<Outcome, EvaluationError> {
        let mut game = ResetOnDrop::new(game);
        play_against(
            &mut *game,
            |g: &G| self.act_greedily(g),
            opponent,
            opponent_goes_first,
            verbose,
        )
    }
}

impl<G: Game> Policy<G> for UctSearch<G> {
    fn act(&mut self, game: &G) -> G::Action {
        self.act_greedily(game)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcts::testing::{Duel, Ladder};
    use crate::policy::{RandomPolicy, ScriptedPolicy};
    use crate::tictactoe::{Move, TicTacToe};
    use std::collections::HashMap;

    fn moves(squares: &[usize]) -> Vec<Move> {
        squares.iter().copied().map(Move::new).collect()
    }

    #[test]
    fn test_ucb1() {
        assert_eq!(ucb1(5.0, 0, 3, EXPLORATION), f64::INFINITY);
        // ln(1) = 0, so only the mean remains.
        assert!((ucb1(1.0, 1, 1, EXPLORATION) - 1.0).abs() < 1e-9);
        let expected = 0.5 + 1.41 * ((4.0_f64).ln() / 2.0).sqrt();
        assert!((ucb1(1.0, 2, 4, 1.41) - expected).abs() < 1e-9);
    }

    #[test]
    #[should_panic(expected = "no rollouts")]
    fn test_ucb1_requires_parent_rollouts() {
        ucb1(0.0, 0, 0, EXPLORATION);
    }

    #[test]
    fn test_first_rollout_backprop() {
        // x wins on the top row.
        //
        //  x1, x7, x5
        //    , x3, o2
        //  o6,   , o4
        let mut policy = ScriptedPolicy::new(moves(&[0, 5, 4, 8, 2, 6, 1]));
        let mut game = TicTacToe::new();
        let mut uct = UctSearch::new(&game, UctOptions::default());

        let history = uct.rollout(&mut game, &mut policy, &RolloutConfig::training());

        // Root plus the single frontier node.
        assert_eq!(history.len(), 2);
        assert_eq!(uct.nodes().len(), 2);
        for frame in &history {
            let node = uct.node_for(&frame.state).unwrap();
            assert_eq!(node.num_rollouts_involved, 1);
            assert!((node.total_reward_from_here.at(0) - 1.0).abs() < 1e-9);
            assert!((node.total_reward_from_here.at(1) + 1.0).abs() < 1e-9);
        }
        assert_eq!(history[1].action, Some(Move::new(0)));
        assert_eq!(history[1].player, 0);
        assert_eq!(game.current_state(), &game.initial_state());
    }

    #[test]
    fn test_root_count_grows_by_one_per_rollout() {
        let mut game = TicTacToe::new();
        let mut policy = RandomPolicy::seeded(3);
        let mut uct = UctSearch::new(&game, UctOptions::default());
        for i in 1..=50 {
            uct.rollout(&mut game, &mut policy, &RolloutConfig::training());
            assert_eq!(uct.nodes().get(uct.root()).num_rollouts_involved, i);
            assert_eq!(game.current_state(), &game.initial_state());
        }
    }

    #[test]
    fn test_backprop_credits_suffix_sums() {
        let mut game = Ladder::new(5);
        let mut policy = RandomPolicy::seeded(17);
        let mut uct = UctSearch::new(&game, UctOptions::default());

        for _ in 0..40 {
            let before: HashMap<_, _> = uct
                .nodes()
                .iter()
                .map(|(_, node)| (node.state.clone(), node.total_reward_from_here.clone()))
                .collect();

            let history = uct.rollout(&mut game, &mut policy, &RolloutConfig::training());

            for (i, frame) in history.iter().enumerate() {
                let suffix = history[i..]
                    .iter()
                    .fold(RewardMap::nobody_wins(), |acc, f| acc + &f.reward);
                let now = &uct.node_for(&frame.state).unwrap().total_reward_from_here;
                let then = before
                    .get(&frame.state)
                    .cloned()
                    .unwrap_or_else(RewardMap::nobody_wins);
                for player in [0, 1] {
                    let delta = now.at(player) - then.at(player);
                    assert!(
                        (delta - suffix.at(player)).abs() < 1e-9,
                        "depth {i}: credited {delta}, suffix {}",
                        suffix.at(player)
                    );
                }
            }
        }
        // Deep enough that intermediate rewards actually differ per depth.
        let deepest = uct
            .nodes()
            .iter()
            .map(|(_, node)| node.state.len())
            .max()
            .unwrap();
        assert!(deepest >= 3);
    }

    #[test]
    fn test_selection_prefers_unvisited_child() {
        let mut game = Duel::new();
        let mut uct = UctSearch::new(&game, UctOptions::default());
        // Seat 0 plays the winning action first, so its child is worth +1.
        let mut policy = ScriptedPolicy::new([2u8, 0]);
        uct.rollout(&mut game, &mut policy, &RolloutConfig::training());

        let winning = uct.node_for(&vec![2]).unwrap();
        assert!((winning.expected_reward_for(0) - 1.0).abs() < 1e-9);
        assert_eq!(uct.select_action(&game, uct.root()), 0);
    }

    #[test]
    fn test_every_child_tried_before_revisit() {
        let mut game = Duel::new();
        let mut uct = UctSearch::new(&game, UctOptions::default());
        let mut policy = RandomPolicy::seeded(5);
        // One rollout expands the first child, the next three visit the rest.
        uct.train(&mut game, &mut policy, 4);
        for first in 0..3u8 {
            let child = uct.node_for(&vec![first]).unwrap();
            assert!(child.num_rollouts_involved >= 1, "action {first} never tried");
        }
    }

    #[test]
    fn test_read_only_rollout_leaves_store_untouched() {
        let mut game = TicTacToe::new();
        let mut policy = RandomPolicy::seeded(9);
        let mut uct = UctSearch::new(&game, UctOptions::default());
        uct.train(&mut game, &mut policy, 30);
        let nodes = uct.nodes().len();
        let root_rollouts = uct.nodes().get(uct.root()).num_rollouts_involved;

        let history = uct.rollout(&mut game, &mut policy, &RolloutConfig::evaluation());
        assert!(history.len() >= 2);
        assert_eq!(uct.nodes().len(), nodes);
        assert_eq!(uct.nodes().get(uct.root()).num_rollouts_involved, root_rollouts);
    }

    fn played(squares: &[usize]) -> Vec<UctFrame<TicTacToe>> {
        let mut game = TicTacToe::new();
        let mut history = vec![HistoryFrame {
            action: None,
            reward: RewardMap::nobody_wins(),
            state: game.current_state().clone(),
            player: game.turn(),
        }];
        for action in moves(squares) {
            let player = game.turn();
            let reward = game.simulate(&action);
            history.push(HistoryFrame {
                action: Some(action),
                reward,
                state: game.current_state().clone(),
                player,
            });
        }
        history
    }

    #[test]
    fn test_transpositions_share_nodes() {
        let game = TicTacToe::new();
        let mut uct = UctSearch::new(&game, UctOptions::default());
        let first = played(&[0, 4, 2]);
        let second = played(&[2, 4, 0]);
        uct.backpropagate(&first);
        uct.backpropagate(&second);

        let via = |squares: [usize; 3]| {
            let mut id = uct.root();
            for sq in squares {
                id = uct.nodes().get(id).children()[&Move::new(sq)];
            }
            id
        };
        assert_eq!(via([0, 4, 2]), via([2, 4, 0]));
        assert_eq!(first[3].state, second[3].state);
        assert_eq!(uct.node_for(&first[3].state).unwrap().num_rollouts_involved, 2);
        assert_eq!(uct.nodes().get(uct.root()).num_rollouts_involved, 2);
        // Root, two first moves, two replies, one shared position.
        assert_eq!(uct.nodes().len(), 6);
    }

    #[test]
    fn test_evaluate_trained_search_wins() {
        let mut game = Duel::new();
        let mut uct = UctSearch::new(&game, UctOptions::default());
        uct.train(&mut game, &mut RandomPolicy::seeded(1), 200);
        let nodes = uct.nodes().len();
        let root_rollouts = uct.nodes().get(uct.root()).num_rollouts_involved;

        let mut opponent = ScriptedPolicy::new([0u8]);
        let outcome = uct.evaluate(&mut game, &mut opponent, false, true);

        assert_eq!(outcome, Ok(Outcome::Win));
        assert_eq!(uct.nodes().len(), nodes);
        assert_eq!(uct.nodes().get(uct.root()).num_rollouts_involved, root_rollouts);
        assert_eq!(game.current_state(), &game.initial_state());
    }

    #[test]
    fn test_act_greedily_skips_unvisited_children() {
        let mut game = Duel::new();
        let mut uct = UctSearch::new(&game, UctOptions::default());
        // Only the losing action 1 has been explored.
        uct.rollout(
            &mut game,
            &mut ScriptedPolicy::new([1u8, 0]),
            &RolloutConfig::training(),
        );
        assert_eq!(uct.act_greedily(&game), 1);

        let fresh = UctSearch::new(&game, UctOptions::default());
        assert_eq!(fresh.act_greedily(&game), 0);
    }

    #[test]
    fn test_panicking_policy_leaves_search_usable() {
        let mut game = TicTacToe::new();
        let mut uct = UctSearch::new(&game, UctOptions::default());
        let mut policy = ScriptedPolicy::new(moves(&[4, 0]));
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            uct.rollout(&mut game, &mut policy, &RolloutConfig::training());
        }));
        assert!(result.is_err());
        assert_eq!(game.current_state(), &game.initial_state());
        assert_eq!(uct.nodes().len(), 1);
        assert!(!uct.nodes().get(uct.root()).has_children());

        uct.rollout(&mut game, &mut RandomPolicy::seeded(1), &RolloutConfig::training());
        assert_eq!(uct.nodes().get(uct.root()).num_rollouts_involved, 1);
        uct.train(&mut game, &mut RandomPolicy::seeded(2), 10);
        assert_eq!(uct.nodes().get(uct.root()).num_rollouts_involved, 11);
    }

    #[test]
    fn test_each_rollout_adds_at_most_one_node() {
        let mut game = Ladder::new(6);
        let mut uct = UctSearch::new(&game, UctOptions::default());
        let mut policy = RandomPolicy::seeded(4);
        for _ in 0..30 {
            let before = uct.nodes().len();
            uct.rollout(&mut game, &mut policy, &RolloutConfig::training());
            assert!(uct.nodes().len() <= before + 1);
        }
    }

    #[test]
    fn test_render_tree() {
        let mut game = TicTacToe::new();
        let mut uct = UctSearch::new(&game, UctOptions::default());
        uct.train(&mut game, &mut RandomPolicy::seeded(2), 5);
        let text = uct.render_tree(1);
        assert!(text.starts_with("depth 0"));
        assert!(text.contains("num rollouts: 5"));
    }
}
