use agent_2048::engine::Brain;
use agent_2048::expectimax::{
    Expectimax, ExpectimaxConfig, ExpectimaxMultithread, MovePolicy, DEFAULT_DEPTH,
};
use agent_2048::grid::Grid;
use anyhow::Result;
use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};

/// Let the expectimax agent play full games of 2048.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Plies searched below each candidate move
    #[arg(long, default_value_t = DEFAULT_DEPTH)]
    depth: u32,
    /// Number of games to play
    #[arg(long, default_value_t = 1)]
    games: u32,
    /// Seed for tile spawns
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Search each candidate move on its own thread
    #[arg(long)]
    threads: bool,
    /// Only print the per-game summary
    #[arg(long)]
    quiet: bool,
}

struct GameSummary {
    score: u64,
    highest_tile: u32,
    moves: u32,
    states: u64,
    peak_states: u64,
}

fn play_game(policy: &dyn MovePolicy, rng: &mut StdRng, quiet: bool) -> GameSummary {
    let mut brain = Brain::from_grid(&Grid::new(4));
    brain.add_random_tile(rng);
    brain.add_random_tile(rng);
    if !quiet {
        println!("{}", brain.grid());
    }

    let mut moves = 0;
    let mut states = 0;
    let mut peak_states = 0;
    while !brain.is_game_over() {
        let outcome = policy.search(brain.grid());
        states += outcome.nodes;
        peak_states = peak_states.max(outcome.nodes);
        let direction = match outcome.best_move {
            Some(direction) => direction,
            None => break,
        };
        brain.make_move(direction, rng);
        moves += 1;
        if !quiet {
            println!("{} (score {})\n{}", direction, brain.score(), brain.grid());
        }
    }

    GameSummary {
        score: brain.score(),
        highest_tile: brain.grid().max_tile_value(),
        moves,
        states,
        peak_states,
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = ExpectimaxConfig { depth: args.depth };
    config.validate()?;

    let policy: Box<dyn MovePolicy> = if args.threads {
        Box::new(ExpectimaxMultithread::with_config(config))
    } else {
        Box::new(Expectimax::with_config(config))
    };

    let mut rng = StdRng::seed_from_u64(args.seed);
    for game in 0..args.games {
        log::info!("starting game {} of {}", game + 1, args.games);
        let summary = play_game(policy.as_ref(), &mut rng, args.quiet);
        println!(
            "Game {}: score {}, highest tile {}, moves made: {}, states considered: {}, max states considered for a move: {}",
            game + 1,
            summary.score,
            summary.highest_tile,
            summary.moves,
            summary.states,
            summary.peak_states
        );
    }
    Ok(())
}
