//! Constants for board geometry, search defaults, and evaluation weights.
//!
//! The board is a plain 8x8 grid stored row-major in a flat array, so a cell
//! index is `row * N + col`. Row 0 is rank `1` in algebraic notation and
//! column 0 is file `a`.

// =============================================================================
// Board Geometry
// =============================================================================

/// Board size (NxN).
pub const N: usize = 8;

/// Number of cells on the board.
pub const CELLS: usize = N * N;

/// The eight compass directions as (row delta, column delta).
pub const DIRECTIONS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Upper bound on the number of plies in a game: every empty cell filled,
/// plus one pass per placement.
pub const MAX_GAME_LEN: usize = (CELLS - 4) * 2;

// =============================================================================
// Minimax Parameters
// =============================================================================

/// Default search depth in plies.
pub const DEFAULT_DEPTH: u32 = 4;

// =============================================================================
// MCTS (Monte Carlo Tree Search) Parameters
// =============================================================================

/// Default number of MCTS iterations per move.
pub const DEFAULT_ITERATIONS: usize = 1000;

/// UCB1 exploration constant.
pub const UCB_C: f64 = std::f64::consts::SQRT_2;

/// Win increment credited for a drawn playout.
pub const DRAW_REWARD: f64 = 0.5;

// =============================================================================
// Positional Evaluation
// =============================================================================

/// Per-cell weights for the positional strategy.
///
/// Corners are the most valuable squares. The cells touching a corner are
/// penalised since occupying them tends to hand the corner to the opponent.
/// The table is symmetric under all eight board symmetries.
#[rustfmt::skip]
pub const POSITION_WEIGHTS: [[i32; N]; N] = [
    [10, -5,  5,  5,  5,  5, -5, 10],
    [-5, -8, -2, -2, -2, -2, -8, -5],
    [ 5, -2, -1, -1, -1, -1, -2,  5],
    [ 5, -2, -1,  0,  0, -1, -2,  5],
    [ 5, -2, -1,  0,  0, -1, -2,  5],
    [ 5, -2, -1, -1, -1, -1, -2,  5],
    [-5, -8, -2, -2, -2, -2, -8, -5],
    [10, -5,  5,  5,  5,  5, -5, 10],
];
