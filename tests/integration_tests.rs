//! Integration tests for reversi-ai
//!
//! These exercise the public API end to end: rules on real game lines, both
//! search engines on shared positions, and full games between seeded players.

use reversi_ai::board::{Board, Cell, Coord, Move, Outcome, Side};
use reversi_ai::config::{MatchConfig, PlayerConfig};
use reversi_ai::eval::{Evaluator, Greedy, Mobility, Positional, Strategy};
use reversi_ai::game::{SeriesResult, p1_side, play_game, run_series};
use reversi_ai::mcts::{self, Mcts, MctsConfig};
use reversi_ai::minimax::{self, Minimax};
use reversi_ai::player::{MctsPlayer, MinimaxPlayer, Player, RandomPlayer};

// =============================================================================
// Helper functions for setting up test positions
// =============================================================================

fn place(s: &str) -> Move {
    Move::Place(s.parse().unwrap())
}

/// Play a sequence of moves from the opening, each by the side to move.
fn setup_position(moves: &[&str]) -> Board {
    moves
        .iter()
        .fold(Board::new(), |b, mv| b.play(mv.parse().unwrap()).unwrap())
}

/// Random legal walk from the opening, stopping early at the end of the game.
fn random_walk(seed: u64, plies: usize) -> Board {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut board = Board::new();
    for _ in 0..plies {
        if board.is_terminal() {
            break;
        }
        board = board.play(reversi_ai::playout::choose_random_move(&board, &mut rng)).unwrap();
    }
    board
}

/// White has no placement; Black can still play h7 or h8.
fn forced_pass_position() -> Board {
    let rows = [
        "XXXXXXXX", "XXXXXXXX", "XXXXXXXX", "XXXXXXXX", "XXXXXXXX", "XXXXXXXX", "XXXXXXO.",
        "XXXXXXX.",
    ];
    Board::from_rows(&rows, Side::White).unwrap()
}

// =============================================================================
// Board rules
// =============================================================================

#[test]
fn test_each_opening_move_flips_one() {
    let board = Board::new();
    let opening: Vec<Move> = ["d3", "c4", "f5", "e6"].into_iter().map(place).collect();
    assert_eq!(board.legal_moves(Side::Black), opening);
    for mv in ["d3", "c4", "f5", "e6"] {
        let coord: Coord = mv.parse().unwrap();
        assert_eq!(board.flip_count(coord, Side::Black), 1);
        let next = board.apply(Move::Place(coord), Side::Black).unwrap();
        assert_eq!(next.score(), (4, 1), "after {mv}");
        assert_eq!(next.to_move(), Side::White);
        assert_eq!(next.cell(coord), Cell::Black);
    }
}

#[test]
fn test_mover_never_loses_pieces() {
    for seed in 0..10 {
        let mut rng = fastrand::Rng::with_seed(seed);
        let mut board = Board::new();
        while !board.is_terminal() {
            let side = board.to_move();
            let before = board.count(side);
            let opponent_before = board.count(side.opponent());
            let empties = board.empty_count();
            let mv = reversi_ai::playout::choose_random_move(&board, &mut rng);
            board = board.apply(mv, side).unwrap();
            match mv {
                Move::Place(_) => {
                    assert!(board.count(side) >= before + 2);
                    assert_eq!(board.empty_count(), empties - 1);
                }
                Move::Pass => assert_eq!(board.count(side), before),
            }
            assert!(board.count(side.opponent()) <= opponent_before);
            let (b, w) = board.score();
            assert_eq!(b + w + board.empty_count(), 64);
        }
        assert!(board.winner().is_some());
    }
}

#[test]
fn test_full_board_is_terminal() {
    let mut rows = ["XXXXXXXX"; 8];
    rows[0] = "OOOOOOOO";
    rows[1] = "OOOOOOOO";
    rows[2] = "OOOOOOOO";
    rows[3] = "OOOOOOOO";
    let board = Board::from_rows(&rows, Side::Black).unwrap();
    assert!(board.is_terminal());
    assert!(board.legal_moves(Side::Black).is_empty());
    assert!(board.legal_moves(Side::White).is_empty());
    assert_eq!(board.winner(), Some(Outcome::Draw));
}

#[test]
fn test_pass_rules() {
    let board = forced_pass_position();
    assert!(board.legal_moves(Side::White).is_empty());
    assert!(!board.is_terminal());
    let passed = board.apply(Move::Pass, Side::White).unwrap();
    assert_eq!(passed.to_move(), Side::Black);
    assert!(passed.apply(Move::Pass, Side::Black).is_err());
    assert!(Board::new().play(Move::Pass).is_err());
}

// =============================================================================
// Evaluation and search engines
// =============================================================================

#[test]
fn test_evaluators_are_zero_sum() {
    let evaluators: [&dyn Evaluator; 3] = [&Greedy, &Mobility, &Positional::default()];
    for seed in 0..8 {
        let board = random_walk(seed, 25);
        for eval in evaluators {
            assert_eq!(
                eval.evaluate(&board, Side::Black),
                -eval.evaluate(&board, Side::White),
                "{}",
                eval.name()
            );
        }
    }
}

#[test]
fn test_engines_agree_on_rules() {
    for seed in 0..6 {
        let board = random_walk(seed, 20);
        if board.is_terminal() {
            continue;
        }
        let side = board.to_move();
        for strategy in Strategy::ALL {
            let mv = minimax::choose_move(&board, side, 2, &strategy).unwrap();
            assert!(board.apply(mv, side).is_ok(), "{strategy} chose {mv}");
        }
        let mut rng = fastrand::Rng::with_seed(seed);
        let mv = mcts::choose_move(&board, side, 100, &mut rng).unwrap();
        assert!(board.apply(mv, side).is_ok(), "mcts chose {mv}");
    }
}

#[test]
fn test_engines_pass_when_forced() {
    let board = forced_pass_position();
    assert_eq!(minimax::choose_move(&board, Side::White, 4, &Greedy).unwrap(), Move::Pass);
    let mut rng = fastrand::Rng::with_seed(1);
    assert_eq!(mcts::choose_move(&board, Side::White, 100, &mut rng).unwrap(), Move::Pass);
}

#[test]
fn test_both_engines_find_wipeout() {
    // Black c1 brackets the lone white piece and ends the game 3-0
    let mut rows = ["........"; 8];
    rows[0] = "XO......";
    let board = Board::from_rows(&rows, Side::Black).unwrap();
    assert_eq!(minimax::choose_move(&board, Side::Black, 3, &Greedy).unwrap(), place("c1"));
    let mut rng = fastrand::Rng::with_seed(2);
    assert_eq!(mcts::choose_move(&board, Side::Black, 200, &mut rng).unwrap(), place("c1"));
}

#[test]
fn test_alpha_beta_matches_full_search_midgame() {
    let board = setup_position(&["f5", "d6", "c3", "d3", "c4"]);
    let side = board.to_move();
    for strategy in Strategy::ALL {
        let pruned = Minimax::new(strategy, 3).unwrap();
        let full = pruned.clone().without_pruning();
        let a = pruned.search(&board, side).unwrap();
        let b = full.search(&board, side).unwrap();
        assert_eq!((a.mv, a.score), (b.mv, b.score), "{strategy}");
    }
}

#[test]
fn test_mcts_statistics_cover_budget() {
    let board = setup_position(&["d3", "c5"]);
    let engine = Mcts::new(MctsConfig::with_iterations(500)).unwrap();
    let mut rng = fastrand::Rng::with_seed(3);
    let tree = engine.search(&board, Side::Black, &mut rng).unwrap();
    let stats = tree.child_stats();
    assert_eq!(stats.len(), board.legal_moves(Side::Black).len());
    assert_eq!(stats.iter().map(|s| s.visits).sum::<u32>(), 500);
    assert!(stats.iter().all(|s| (0.0..=1.0).contains(&s.win_rate)));
}

// =============================================================================
// Players, games and series
// =============================================================================

#[test]
fn test_full_game_minimax_vs_mcts() {
    let mut black = MinimaxPlayer::new(Strategy::Positional, 2).unwrap();
    let mut white = MctsPlayer::new(MctsConfig::with_iterations(50), 4)
        .unwrap()
        .with_tree_reuse(true);
    let record = play_game(&mut black, &mut white).unwrap();
    assert!(record.final_board.is_terminal());
    let (b, w) = record.score;
    match record.outcome {
        Outcome::Win(Side::Black) => assert!(b > w),
        Outcome::Win(Side::White) => assert!(w > b),
        Outcome::Draw => assert_eq!(b, w),
    }
}

#[test]
fn test_seeded_games_replay() {
    let run = || {
        let mut black = MctsPlayer::new(MctsConfig::with_iterations(30), 10).unwrap();
        let mut white = RandomPlayer::new(11);
        play_game(&mut black, &mut white).unwrap().moves
    };
    assert_eq!(run(), run());
}

#[test]
fn test_minimax_beats_random_over_series() {
    let mut p1 = MinimaxPlayer::new(Strategy::Positional, 3).unwrap();
    let mut p2 = RandomPlayer::new(21);
    let mut colours = Vec::new();
    let stats = run_series(&mut p1, &mut p2, 6, |game, _, result| {
        colours.push((p1_side(game), result))
    })
    .unwrap();
    assert_eq!(stats.games(), 6);
    assert_eq!(colours.len(), 6);
    assert!(stats.p1_wins > stats.p2_wins, "{stats:?}");
    assert_eq!(
        colours.iter().filter(|(_, r)| *r == SeriesResult::P1).count() as u32,
        stats.p1_wins
    );
}

#[test]
fn test_series_from_match_config() {
    let config = MatchConfig::from_json(
        r#"{
            "p1": { "kind": "minimax", "strategy": "mobility", "depth": 1 },
            "p2": { "kind": "random" },
            "games": 2,
            "seed": 5
        }"#,
    )
    .unwrap();
    let seed = config.seed.unwrap();
    let mut p1 = config.p1.build(seed).unwrap();
    let mut p2 = config.p2.build(seed + 1).unwrap();
    let stats = run_series(p1.as_mut(), p2.as_mut(), config.games, |_, _, _| {}).unwrap();
    assert_eq!(stats.games(), 2);
}

#[test]
fn test_compact_player_strings_build() {
    let board = setup_position(&["c4"]);
    for text in ["random", "minimax:greedy:2", "minimax:positional", "mcts:40"] {
        let config: PlayerConfig = text.parse().unwrap();
        let mut player: Box<dyn Player> = config.build(9).unwrap();
        let mv = player.select_move(&board, Side::White).unwrap();
        assert!(board.is_legal(mv, Side::White), "{text}: {mv}");
    }
}
