//! Monte Carlo playouts (random game simulation).
//!
//! A playout plays uniformly random legal moves for both sides, passing when
//! forced, until neither side can move, then reports the result. The random
//! source is always supplied by the caller so seeded searches replay exactly.

use fastrand::Rng;

use crate::board::{Board, Move, Outcome, Side};
use crate::constants::{DRAW_REWARD, MAX_GAME_LEN};
use crate::error::Result;

/// Perform a random playout from `board` and return the final outcome.
pub fn mcplayout(board: &Board, rng: &mut Rng) -> Result<Outcome> {
    let mut pos = board.clone();

    // Every placement fills a cell and passes never come in pairs, so the
    // game ends well inside the bound
    for _ in 0..MAX_GAME_LEN {
        let side = pos.to_move();
        let moves = pos.legal_moves(side);
        let mv = if moves.is_empty() {
            if !pos.has_legal_move(side.opponent()) {
                break;
            }
            Move::Pass
        } else {
            moves[rng.usize(..moves.len())]
        };
        pos = pos.apply(mv, side)?;
    }

    Ok(pos.winner().unwrap_or(Outcome::Draw))
}

/// Choose a uniformly random legal move for the side to move, or pass.
pub fn choose_random_move(board: &Board, rng: &mut Rng) -> Move {
    let moves = board.legal_moves(board.to_move());
    if moves.is_empty() {
        Move::Pass
    } else {
        moves[rng.usize(..moves.len())]
    }
}

/// Reward of `outcome` for `side`: 1 for a win, 0.5 for a draw, 0 for a loss.
#[inline]
pub fn reward(outcome: Outcome, side: Side) -> f64 {
    match outcome {
        Outcome::Win(winner) if winner == side => 1.0,
        Outcome::Win(_) => 0.0,
        Outcome::Draw => DRAW_REWARD,
    }
}
