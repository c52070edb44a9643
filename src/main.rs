use std::io::Write;

use anyhow::{Context, Result};
use tracing::info;
use tree_search_core::{
    run_benchmark, Agent, BenchmarkOptions, DecayingEpsilon, EpsilonScheduler, FixedEpsilon,
    FlatOptions, FlatTree, Game, Policy, RandomPolicy, TicTacToe, UctOptions, UctSearch,
};

const TRAINING_ITERATIONS: usize = 20;
const ROLLOUTS_PER_ITERATION: usize = 1000;
const UCT_ROLLOUTS: usize = 4000;

fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

/// Reads moves from stdin.
struct HumanPolicy;

impl<G: Game> Policy<G> for HumanPolicy {
    fn act(&mut self, game: &G) -> G::Action {
        let actions = game.valid_actions();
        println!("{}", game.render());
        for (i, action) in actions.iter().enumerate() {
            println!("  {i}: {action:?}");
        }

        let mut input = String::new();
        loop {
            print!("enter a move index: ");
            std::io::stdout().flush().expect("Failed to flush stdout");
            input.clear();
            let read = std::io::stdin()
                .read_line(&mut input)
                .expect("Failed to read line");
            if read == 0 {
                panic!("stdin closed before the game ended");
            }
            match input.trim().parse::<usize>().ok().and_then(|i| actions.get(i)) {
                Some(action) => return action.clone(),
                None => println!("error input, re enter:"),
            }
        }
    }
}

fn train_flat(scheduler: &mut dyn EpsilonScheduler) -> Result<()> {
    let mut game = TicTacToe::new();
    let mut tree = FlatTree::new(&game, FlatOptions::default());
    let mut opponent = RandomPolicy::new();
    let benchmark = BenchmarkOptions::default();
    let name = scheduler.name();

    let mut trained = 0;
    for iteration in 0..=TRAINING_ITERATIONS {
        if iteration > 0 {
            let epsilon = scheduler.next_epsilon();
            tree.train(&mut game, &mut opponent, ROLLOUTS_PER_ITERATION, epsilon, false);
            trained += ROLLOUTS_PER_ITERATION;
        }
        let record = run_benchmark(&tree, &benchmark, TicTacToe::new, |_| RandomPolicy::new())
            .with_context(|| format!("benchmarking flat tree with {name}"))?;
        info!(
            scheduler = %name,
            rollouts = trained,
            win = record.win_rate(),
            loss = record.loss_rate(),
            draw = record.draw_rate(),
            "flat tree against random opponent"
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    init_tracing("info");

    let mut schedulers: Vec<Box<dyn EpsilonScheduler>> = vec![
        Box::new(FixedEpsilon(1.0)),
        Box::new(FixedEpsilon(0.05)),
        Box::new(DecayingEpsilon::new()),
    ];
    for scheduler in schedulers.iter_mut() {
        train_flat(scheduler.as_mut())?;
    }

    let mut game = TicTacToe::new();
    let mut search = UctSearch::new(&game, UctOptions::default());
    search.train(&mut game, &mut RandomPolicy::new(), UCT_ROLLOUTS);
    let record = run_benchmark(
        &search,
        &BenchmarkOptions::default(),
        TicTacToe::new,
        |_| RandomPolicy::new(),
    )?;
    info!(
        rollouts = UCT_ROLLOUTS,
        win = record.win_rate(),
        loss = record.loss_rate(),
        draw = record.draw_rate(),
        "uct against random opponent"
    );

    let outcome = search
        .evaluate(&mut game, &mut HumanPolicy, false, true)
        .context("playing against human")?;
    println!("{outcome:?} for the search");
    Ok(())
}
