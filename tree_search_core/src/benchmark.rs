//! Win/loss/draw rates of a trained engine over many evaluation games.
//!
//! Games are independent and only read the engine, so they run in parallel on
//! a dedicated rayon pool. Each game gets its own board and opponent from the
//! caller's factories.

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use thiserror::Error;
use tracing::info;

use crate::evaluation::{Agent, EvaluationError, Outcome};
use crate::interface::{Game, Policy};

#[derive(Debug, Error)]
pub enum BenchmarkError {
    #[error("failed to build benchmark thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

#[derive(Debug, Clone)]
pub struct BenchmarkOptions {
    pub(crate) runs: usize,
    // None means one thread per cpu.
    pub(crate) num_threads: Option<usize>,
    pub(crate) opponent_goes_first: bool,
}

impl Default for BenchmarkOptions {
    fn default() -> Self {
        Self {
            runs: 300,
            num_threads: None,
            opponent_goes_first: false,
        }
    }
}

impl BenchmarkOptions {
    pub fn with_runs(mut self, runs: usize) -> Self {
        self.runs = runs;
        self
    }

    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    pub fn with_opponent_goes_first(mut self, opponent_goes_first: bool) -> Self {
        self.opponent_goes_first = opponent_goes_first;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Record {
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
}

impl Record {
    pub fn add(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Draw => self.draws += 1,
        }
    }

    pub fn games(&self) -> usize {
        self.wins + self.losses + self.draws
    }

    pub fn win_rate(&self) -> f64 {
        self.rate(self.wins)
    }

    pub fn loss_rate(&self) -> f64 {
        self.rate(self.losses)
    }

    pub fn draw_rate(&self) -> f64 {
        self.rate(self.draws)
    }

    fn rate(&self, count: usize) -> f64 {
        match self.games() {
            0 => 0.0,
            games => count as f64 / games as f64,
        }
    }
}

impl FromIterator<Outcome> for Record {
    fn from_iter<I: IntoIterator<Item = Outcome>>(outcomes: I) -> Self {
        let mut record = Record::default();
        for outcome in outcomes {
            record.add(outcome);
        }
        record
    }
}

/// Play `options.runs` evaluation games of `agent` against opponents built by
/// `new_opponent`, which is handed the index of the game it plays.
pub fn run_benchmark<G, A, O>(
    agent: &A,
    options: &BenchmarkOptions,
    new_game: impl Fn() -> G + Sync,
    new_opponent: impl Fn(usize) -> O + Sync,
) -> Result<Record, BenchmarkError>
where
    G: Game,
    A: Agent<G> + Sync,
    O: Policy<G>,
{
    let num_threads = options.num_threads.unwrap_or_else(num_cpus::get);
    let pool = ThreadPoolBuilder::new().num_threads(num_threads).build()?;

    let outcomes = pool.install(|| {
        (0..options.runs)
            .into_par_iter()
            .map(|run| {
                let mut game = new_game();
                let mut opponent = new_opponent(run);
                agent.evaluate(&mut game, &mut opponent, options.opponent_goes_first, false)
            })
            .collect::<Result<Vec<_>, _>>()
    })?;

    let record: Record = outcomes.into_iter().collect();
    info!(
        runs = options.runs,
        num_threads,
        win_rate = record.win_rate(),
        loss_rate = record.loss_rate(),
        draw_rate = record.draw_rate(),
        "benchmark finished"
    );
    Ok(record)
}
