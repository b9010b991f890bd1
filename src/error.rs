//! Error types for the Reversi engine.

use thiserror::Error;

use crate::board::{Move, Side};

/// Errors raised by board operations, engines, and players.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GameError {
    #[error("illegal move {mv} for {side}")]
    IllegalMove { mv: Move, side: Side },

    #[error("{side} cannot pass while a legal placement exists")]
    PassNotAllowed { side: Side },

    #[error("{side} has no legal placement and must pass")]
    NoLegalMove { side: Side },

    #[error("it is {expected}'s turn, not {got}'s")]
    OutOfTurn { expected: Side, got: Side },

    #[error("the game is already over")]
    TerminalState,

    #[error("invalid search depth {0} (must be at least 1)")]
    InvalidDepth(u32),

    #[error("invalid search budget: {0}")]
    InvalidBudget(String),

    #[error("invalid coordinate '{0}' (expected a1..h8)")]
    InvalidCoord(String),

    #[error("invalid board: {0}")]
    InvalidBoard(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid search tree: {0}")]
    InvalidTree(String),

    #[error("game runner exceeded {0} plies without reaching the end of the game")]
    PlyLimitExceeded(usize),

    #[error("I/O error: {0}")]
    Input(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GameError>;
