//! Depth-limited Minimax search with alpha-beta pruning.
//!
//! The search maximises for the root side and minimises on plies where the
//! opponent is to move. Levels are decided by the side to move rather than by
//! strict alternation, so a forced pass is simply a ply with a single child.
//! Each ply, placed or passed, consumes one unit of depth.
//!
//! Children are always visited in row-major order and the root only replaces
//! its best move on a strictly greater score, so the first of several equally
//! good moves wins. Pruning never changes the chosen move, only the number of
//! nodes visited; [`Minimax::without_pruning`] exists to check exactly that.

use log::debug;

use crate::board::{Board, Move, Side};
use crate::error::{GameError, Result};
use crate::eval::Evaluator;

/// Outcome of a root search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchResult {
    /// Best move for the root side
    pub mv: Move,
    /// Backed-up evaluation of `mv` from the root side's point of view
    pub score: f64,
    /// Number of positions visited, root included
    pub nodes: u64,
}

/// A Minimax searcher bound to an evaluation function and a depth.
#[derive(Debug, Clone)]
pub struct Minimax<E> {
    evaluator: E,
    depth: u32,
    pruning: bool,
}

impl<E: Evaluator> Minimax<E> {
    /// Create a searcher. Fails if `depth` is zero.
    pub fn new(evaluator: E, depth: u32) -> Result<Self> {
        if depth == 0 {
            return Err(GameError::InvalidDepth(depth));
        }
        Ok(Self {
            evaluator,
            depth,
            pruning: true,
        })
    }

    /// Disable alpha-beta cut-offs and search the full tree.
    pub fn without_pruning(mut self) -> Self {
        self.pruning = false;
        self
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Search `board` for `side` and return the best move with its score.
    ///
    /// Returns `Move::Pass` when `side` has no placement but the game is not
    /// over. Fails with [`GameError::TerminalState`] on a finished game and
    /// with [`GameError::OutOfTurn`] if `side` is not on move.
    pub fn search(&self, board: &Board, side: Side) -> Result<SearchResult> {
        board.ensure_playable(side)?;

        let mut nodes = 1;
        let mut alpha = f64::NEG_INFINITY;
        let beta = f64::INFINITY;
        let mut best: Option<(Move, f64)> = None;

        for mv in candidates(board, side) {
            let child = board.apply(mv, side)?;
            let value = self.value(&child, self.depth - 1, alpha, beta, side, &mut nodes)?;
            if best.is_none_or(|(_, score)| value > score) {
                best = Some((mv, value));
            }
            alpha = alpha.max(value);
        }

        let (mv, score) = best.ok_or(GameError::NoLegalMove { side })?;
        debug!(
            "minimax[{} d={}] {side}: {mv} score={score:.2} nodes={nodes}",
            self.evaluator.name(),
            self.depth
        );
        Ok(SearchResult { mv, score, nodes })
    }

    /// Backed-up value of `board` for `root` with `depth` plies remaining.
    fn value(
        &self,
        board: &Board,
        depth: u32,
        mut alpha: f64,
        mut beta: f64,
        root: Side,
        nodes: &mut u64,
    ) -> Result<f64> {
        *nodes += 1;

        if depth == 0 {
            return Ok(self.evaluator.evaluate(board, root));
        }

        let to_move = board.to_move();
        let moves = candidates(board, to_move);
        if moves == [Move::Pass] && !board.has_legal_move(to_move.opponent()) {
            // Neither side can place: terminal
            return Ok(self.evaluator.evaluate(board, root));
        }

        if to_move == root {
            let mut best = f64::NEG_INFINITY;
            for mv in moves {
                let child = board.apply(mv, to_move)?;
                best = best.max(self.value(&child, depth - 1, alpha, beta, root, nodes)?);
                alpha = alpha.max(best);
                if self.pruning && beta <= alpha {
                    break;
                }
            }
            Ok(best)
        } else {
            let mut best = f64::INFINITY;
            for mv in moves {
                let child = board.apply(mv, to_move)?;
                best = best.min(self.value(&child, depth - 1, alpha, beta, root, nodes)?);
                beta = beta.min(best);
                if self.pruning && beta <= alpha {
                    break;
                }
            }
            Ok(best)
        }
    }
}

/// Legal placements in row-major order, or a lone pass when there are none.
fn candidates(board: &Board, side: Side) -> Vec<Move> {
    let moves = board.legal_moves(side);
    if moves.is_empty() {
        vec![Move::Pass]
    } else {
        moves
    }
}

/// Pick a move for `side` by searching `depth` plies with `evaluator`.
pub fn choose_move<E: Evaluator + ?Sized>(
    board: &Board,
    side: Side,
    depth: u32,
    evaluator: &E,
) -> Result<Move> {
    Ok(Minimax::new(evaluator, depth)?.search(board, side)?.mv)
}
