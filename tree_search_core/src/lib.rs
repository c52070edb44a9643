pub mod benchmark;
pub mod epsilon;
pub mod evaluation;
pub mod interface;
pub mod mcts;
pub mod policy;
pub mod reward;
pub mod tictactoe;

pub use benchmark::{run_benchmark, BenchmarkError, BenchmarkOptions, Record};
pub use epsilon::{DecayingEpsilon, EpsilonScheduler, FixedEpsilon};
pub use evaluation::{Agent, EvaluationError, Outcome};
pub use interface::{Game, Player, Policy};
pub use mcts::algorithm::{UctOptions, UctSearch};
pub use mcts::flat::{FlatOptions, FlatTree};
pub use mcts::history::{HistoryFrame, RolloutConfig};
pub use mcts::node::{Node, NodeId, NodeStore};
pub use policy::{RandomPolicy, ScriptedPolicy};
pub use reward::{RewardMap, RewardMapError};
pub use tictactoe::TicTacToe;
