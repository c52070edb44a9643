//! De-duplicated node storage shared by both search variants.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. A second index maps
//! each canonical state to its node, so transpositions reached through
//! different move orders land on the same node. Growing the arena never
//! invalidates ids held by parents.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::ops::AddAssign;

use crate::interface::Player;
use crate::reward::RewardMap;

/// Index into the node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

/// Aggregate statistics for one state.
#[derive(Debug, Clone)]
pub struct Node<S, A, R> {
    pub num_rollouts_involved: u32,
    /// Scalar for the flat tree, one entry per player for UCT.
    pub total_reward_from_here: R,
    children: HashMap<A, NodeId>,
    /// Kept for rendering.
    pub state: S,
}

impl<S, A, R> Node<S, A, R> {
    fn new(state: S, zero: R) -> Self {
        Node {
            num_rollouts_involved: 0,
            total_reward_from_here: zero,
            children: HashMap::new(),
            state,
        }
    }

    pub fn children(&self) -> &HashMap<A, NodeId> {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Count one more rollout through this node and credit it with `reward`.
    pub fn record<'r>(&mut self, reward: &'r R)
    where
        R: AddAssign<&'r R>,
    {
        self.num_rollouts_involved += 1;
        self.total_reward_from_here += reward;
    }

    fn assert_visited(&self) {
        assert!(
            self.num_rollouts_involved != 0,
            "expected reward read from a node with no rollouts"
        );
    }
}

impl<S, A> Node<S, A, f64> {
    pub fn expected_reward(&self) -> f64 {
        self.assert_visited();
        self.total_reward_from_here / self.num_rollouts_involved as f64
    }
}

impl<S, A> Node<S, A, RewardMap> {
    /// Mean reward of `player` over all rollouts through this node.
    pub fn expected_reward_for(&self, player: Player) -> f64 {
        self.assert_visited();
        self.total_reward_from_here.at(player) / self.num_rollouts_involved as f64
    }
}

/// Arena of nodes keyed by canonical state.
#[derive(Debug, Clone)]
pub struct NodeStore<S, A, R> {
    nodes: Vec<Node<S, A, R>>,
    index: HashMap<S, NodeId>,
}

impl<S, A, R> Default for NodeStore<S, A, R> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<S, A, R> NodeStore<S, A, R>
where
    S: Clone + Eq + Hash,
    A: Clone + Eq + Hash + Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Node for `state`, created with `zero` reward if it does not exist yet.
    pub fn get_or_insert(&mut self, state: &S, zero: impl FnOnce() -> R) -> NodeId {
        if let Some(&id) = self.index.get(state) {
            return id;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(state.clone(), zero()));
        self.index.insert(state.clone(), id);
        id
    }

    /// Node for `state` reached by playing `action` at `parent`. Creates the
    /// node and the edge as needed.
    pub fn get_or_create_child(
        &mut self,
        parent: NodeId,
        action: &A,
        state: &S,
        zero: impl FnOnce() -> R,
    ) -> NodeId {
        let child = self.get_or_insert(state, zero);
        let edges = &mut self.get_mut(parent).children;
        match edges.get(action).copied() {
            Some(existing) => assert_eq!(
                existing, child,
                "action {action:?} already leads to a different node"
            ),
            None => {
                edges.insert(action.clone(), child);
            }
        }
        child
    }

    pub fn lookup(&self, state: &S) -> Option<NodeId> {
        self.index.get(state).copied()
    }

    pub fn get(&self, id: NodeId) -> &Node<S, A, R> {
        &self.nodes[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node<S, A, R> {
        &mut self.nodes[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node<S, A, R>)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i as u32), node))
    }

    /// Nodes reachable from `root` within `max_depth` edges, breadth first.
    /// A node reachable along several paths is yielded once, at its
    /// shallowest depth.
    pub fn breadth_first(&self, root: NodeId, max_depth: usize) -> Vec<(usize, NodeId)> {
        let mut seen = HashSet::from([root]);
        let mut queue = VecDeque::from([(0, root)]);
        let mut order = Vec::new();
        while let Some((depth, id)) = queue.pop_front() {
            order.push((depth, id));
            if depth == max_depth {
                continue;
            }
            for &child in self.get(id).children.values() {
                if seen.insert(child) {
                    queue.push_back((depth + 1, child));
                }
            }
        }
        order
    }

    /// Text dump of the tree below `root`.
    pub fn render(&self, root: NodeId, max_depth: usize) -> String
    where
        S: Display,
        R: Display,
    {
        let mut out = String::new();
        for (depth, id) in self.breadth_first(root, max_depth) {
            let node = self.get(id);
            out.push_str(&format!(
                "depth {depth}\n{}num rollouts: {}\nreward: {}\n\n",
                node.state, node.num_rollouts_involved, node.total_reward_from_here
            ));
        }
        out
    }
}
