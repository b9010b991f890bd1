//! Reversi-AI: Reversi (Othello) game engine with Minimax and MCTS players.
//!
//! This crate provides the 8x8 game rules plus two search engines and a
//! uniform player abstraction to pit them against each other.
//!
//! ## Modules
//!
//! - [`constants`] - Board dimensions and engine parameters
//! - [`board`] - Board state, legal moves, flips and scoring
//! - [`eval`] - Static evaluation functions (greedy, positional, mobility)
//! - [`minimax`] - Depth-limited Minimax with alpha-beta pruning
//! - [`playout`] - Random game simulation for MCTS
//! - [`mcts`] - Monte Carlo Tree Search with UCB1
//! - [`player`] - The `Player` trait and engine-backed players
//! - [`console`] - Interactive console player
//! - [`game`] - Game and series runners
//! - [`config`] - Player and match configuration
//! - [`error`] - Error type shared by all modules
//!
//! ## Example
//!
//! ```
//! use reversi_ai::board::{Board, Side};
//! use reversi_ai::eval::Strategy;
//! use reversi_ai::minimax;
//!
//! let board = Board::new();
//! let mv = minimax::choose_move(&board, Side::Black, 3, &Strategy::Positional).unwrap();
//! let board = board.play(mv).unwrap();
//! assert_eq!(board.to_move(), Side::White);
//! println!("{board}");
//! ```

pub mod board;
pub mod config;
pub mod console;
pub mod constants;
pub mod error;
pub mod eval;
pub mod game;
pub mod mcts;
pub mod minimax;
pub mod player;
pub mod playout;
