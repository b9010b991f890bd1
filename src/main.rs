//! Reversi-AI command line.
//!
//! ## Usage
//!
//! - `reversi-ai` - Show a demo (same as `reversi-ai demo`)
//! - `reversi-ai play --black human --white mcts:2000` - Play one game
//! - `reversi-ai series --p1 minimax:positional:4 --p2 mcts --games 20` - Run a series
//! - `reversi-ai series --config match.json` - Run a series described in a file
//! - `reversi-ai grow --iterations 20000 --output opening.json` - Save an opening tree

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flexi_logger::Logger;
use log::info;

use reversi_ai::board::{Board, Side};
use reversi_ai::config::{MatchConfig, PlayerConfig};
use reversi_ai::eval::{Evaluator, Strategy};
use reversi_ai::game::{SeriesResult, play_game, play_game_observed, run_series};
use reversi_ai::mcts::{Mcts, MctsConfig};
use reversi_ai::minimax::Minimax;
use reversi_ai::player::{MctsPlayer, MinimaxPlayer, Player};

/// Reversi-AI: Reversi engine with Minimax and MCTS players
#[derive(Parser)]
#[command(name = "reversi-ai")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level used when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single game, printing the board after every move
    Play {
        /// Black player: human, random, minimax[:strategy[:depth]] or mcts[:iterations]
        #[arg(long, default_value = "human")]
        black: PlayerConfig,
        /// White player, same forms as --black
        #[arg(long, default_value = "minimax:positional:4")]
        white: PlayerConfig,
        /// Seed for the random players (random if omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Only print the final result
        #[arg(long)]
        quiet: bool,
    },
    /// Play a series between two players, alternating colours
    Series {
        /// First player (Black in odd games)
        #[arg(long, default_value = "minimax:positional:4")]
        p1: PlayerConfig,
        /// Second player (Black in even games)
        #[arg(long, default_value = "mcts")]
        p2: PlayerConfig,
        /// Number of games to play
        #[arg(long, default_value_t = 10)]
        games: u32,
        /// Seed for the random players (random if omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// JSON match file; overrides the player options
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Grow an MCTS tree from the opening and save it for `tree_file`
    Grow {
        /// MCTS iterations to run
        #[arg(long, default_value_t = 10_000)]
        iterations: usize,
        /// Seed for the playouts (random if omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Where to write the tree
        #[arg(long)]
        output: PathBuf,
    },
    /// Run a short demo of both engines
    Demo,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _logger = Logger::try_with_env_or_str(&cli.log_level)?
        .format(flexi_logger::colored_default_format)
        .start()?;

    match cli.command {
        Some(Commands::Play {
            black,
            white,
            seed,
            quiet,
        }) => play(&black, &white, seed, quiet),
        Some(Commands::Series {
            p1,
            p2,
            games,
            seed,
            config,
        }) => {
            let config = match config {
                Some(path) => MatchConfig::load(&path)
                    .with_context(|| format!("failed to load match file {}", path.display()))?,
                None => MatchConfig {
                    p1,
                    p2,
                    games,
                    seed,
                },
            };
            series(config)
        }
        Some(Commands::Grow {
            iterations,
            seed,
            output,
        }) => grow(iterations, seed, &output),
        Some(Commands::Demo) | None => run_demo(),
    }
}

fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| {
        let seed = fastrand::u64(..);
        info!("using seed {seed}");
        seed
    })
}

fn play(black: &PlayerConfig, white: &PlayerConfig, seed: Option<u64>, quiet: bool) -> Result<()> {
    let seed = resolve_seed(seed);
    let mut black_player = black.build(seed).context("invalid black player")?;
    let mut white_player = white
        .build(seed.wrapping_add(1))
        .context("invalid white player")?;
    let show = !quiet || black.is_human() || white.is_human();

    println!("{} (X) vs {} (O)\n", black_player.name(), white_player.name());
    let start = Board::new();
    if show {
        println!("{start}");
    }
    let record = play_game_observed(
        start,
        black_player.as_mut(),
        white_player.as_mut(),
        |board, side, mv| {
            if show {
                println!("{side} plays {mv}\n{board}");
            }
        },
    )?;

    let (b, w) = record.score;
    println!("{} ({b}-{w}) after {} plies", record.outcome, record.moves.len());
    Ok(())
}

fn series(config: MatchConfig) -> Result<()> {
    config.validate()?;
    if config.p1.is_human() || config.p2.is_human() {
        anyhow::bail!("series are for computer players only");
    }

    let seed = resolve_seed(config.seed);
    let mut p1 = config.p1.build(seed)?;
    let mut p2 = config.p2.build(seed.wrapping_add(1))?;
    println!(
        "{} (P1) vs {} (P2), {} games",
        p1.name(),
        p2.name(),
        config.games
    );

    let stats = run_series(p1.as_mut(), p2.as_mut(), config.games, |game, record, result| {
        let (b, w) = record.score;
        let winner = match result {
            SeriesResult::P1 => "P1",
            SeriesResult::P2 => "P2",
            SeriesResult::Draw => "draw",
        };
        println!("game {game:>3}: {b:>2}-{w:<2} {winner}");
    })?;

    let games = stats.games() as f64;
    println!(
        "\nP1 wins {} ({:.1}%), P2 wins {} ({:.1}%), draws {}",
        stats.p1_wins,
        stats.p1_wins as f64 / games * 100.0,
        stats.p2_wins,
        stats.p2_wins as f64 / games * 100.0,
        stats.draws
    );
    Ok(())
}

fn grow(iterations: usize, seed: Option<u64>, output: &Path) -> Result<()> {
    let engine = Mcts::new(MctsConfig::with_iterations(iterations))?;
    let mut rng = fastrand::Rng::with_seed(resolve_seed(seed));
    let tree = engine.search(&Board::new(), Side::Black, &mut rng)?;
    tree.save(output)
        .with_context(|| format!("failed to write tree to {}", output.display()))?;

    println!("{} nodes written to {}", tree.len(), output.display());
    for stats in tree.child_stats() {
        println!(
            "{}: {} visits, winrate {:.1}%",
            stats.mv,
            stats.visits,
            stats.win_rate * 100.0
        );
    }
    Ok(())
}

fn run_demo() -> Result<()> {
    println!("Reversi-AI: Minimax and MCTS Reversi engines\n");

    let board = Board::new();
    println!("{board}");

    println!("=== Minimax Demo ===");
    for strategy in Strategy::ALL {
        let result = Minimax::new(strategy, 4)?.search(&board, Side::Black)?;
        println!(
            "{:>10}: {} (score {:.1}, {} nodes)",
            strategy.name(),
            result.mv,
            result.score,
            result.nodes
        );
    }

    println!("\n=== MCTS Demo ===");
    let engine = Mcts::new(MctsConfig::with_iterations(1000))?;
    let mut rng = fastrand::Rng::with_seed(1);
    println!("Running 1000 MCTS iterations...");
    let tree = engine.search(&board, Side::Black, &mut rng)?;
    for stats in tree.child_stats() {
        println!(
            "{}: {} visits, winrate {:.1}%",
            stats.mv,
            stats.visits,
            stats.win_rate * 100.0
        );
    }
    if let Some(mv) = tree.best_move() {
        println!("Best move: {mv}");
    }

    println!("\n=== Minimax vs MCTS ===");
    let mut black = MinimaxPlayer::new(Strategy::Positional, 3)?;
    let mut white = MctsPlayer::new(MctsConfig::with_iterations(300), 1)?;
    let record = play_game(&mut black, &mut white)?;
    let (b, w) = record.score;
    println!("{} (X) vs {} (O): {} ({b}-{w})", black.name(), white.name(), record.outcome);
    println!("{}", record.final_board);
    Ok(())
}
