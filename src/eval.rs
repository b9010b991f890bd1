//! Static evaluation functions used at the leaves of the Minimax search.
//!
//! Every strategy scores a position from the point of view of one side:
//! higher is better for that side. All three built-in strategies are zero-sum,
//! so `evaluate(board, side) == -evaluate(board, side.opponent())`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::board::{Board, Coord, Side};
use crate::constants::{N, POSITION_WEIGHTS};
use crate::error::GameError;

/// The capability the Minimax engine is parameterised over.
pub trait Evaluator {
    /// Score `board` for `side`.
    fn evaluate(&self, board: &Board, side: Side) -> f64;

    /// Short human-readable name.
    fn name(&self) -> &'static str {
        "custom"
    }
}

impl<E: Evaluator + ?Sized> Evaluator for &E {
    fn evaluate(&self, board: &Board, side: Side) -> f64 {
        (**self).evaluate(board, side)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

impl<E: Evaluator + ?Sized> Evaluator for Box<E> {
    fn evaluate(&self, board: &Board, side: Side) -> f64 {
        (**self).evaluate(board, side)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Piece difference.
#[derive(Debug, Clone, Copy, Default)]
pub struct Greedy;

impl Evaluator for Greedy {
    fn evaluate(&self, board: &Board, side: Side) -> f64 {
        board.count(side) as f64 - board.count(side.opponent()) as f64
    }

    fn name(&self) -> &'static str {
        "greedy"
    }
}

/// Weighted sum of owned squares, own minus opponent.
#[derive(Debug, Clone)]
pub struct Positional {
    weights: [[i32; N]; N],
}

impl Default for Positional {
    fn default() -> Self {
        Self {
            weights: POSITION_WEIGHTS,
        }
    }
}

impl Positional {
    /// Use a custom weight table instead of [`POSITION_WEIGHTS`].
    pub fn with_weights(weights: [[i32; N]; N]) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &[[i32; N]; N] {
        &self.weights
    }
}

impl Evaluator for Positional {
    fn evaluate(&self, board: &Board, side: Side) -> f64 {
        let mut total = 0i64;
        for (row, weights) in self.weights.iter().enumerate() {
            for (col, &w) in weights.iter().enumerate() {
                let Some(coord) = Coord::new(row, col) else {
                    continue;
                };
                match board.cell(coord).side() {
                    Some(owner) if owner == side => total += i64::from(w),
                    Some(_) => total -= i64::from(w),
                    None => {}
                }
            }
        }
        total as f64
    }

    fn name(&self) -> &'static str {
        "positional"
    }
}

/// Difference in the number of legal placements.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mobility;

impl Evaluator for Mobility {
    fn evaluate(&self, board: &Board, side: Side) -> f64 {
        let own = board.legal_moves(side).len() as f64;
        let theirs = board.legal_moves(side.opponent()).len() as f64;
        own - theirs
    }

    fn name(&self) -> &'static str {
        "mobility"
    }
}

/// Selects one of the built-in strategies by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Greedy,
    #[default]
    Positional,
    Mobility,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Greedy, Strategy::Positional, Strategy::Mobility];
}

impl Evaluator for Strategy {
    fn evaluate(&self, board: &Board, side: Side) -> f64 {
        match self {
            Strategy::Greedy => Greedy.evaluate(board, side),
            Strategy::Positional => Positional::default().evaluate(board, side),
            Strategy::Mobility => Mobility.evaluate(board, side),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Strategy::Greedy => "greedy",
            Strategy::Positional => "positional",
            Strategy::Mobility => "mobility",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "greedy" => Ok(Strategy::Greedy),
            "positional" => Ok(Strategy::Positional),
            "mobility" => Ok(Strategy::Mobility),
            other => Err(GameError::InvalidConfig(format!(
                "unknown strategy '{other}' (expected greedy, positional or mobility)"
            ))),
        }
    }
}
