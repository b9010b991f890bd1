//! The uniform player capability and the engine-backed players.
//!
//! A [`Player`] owns whatever state it needs (a random source, a retained
//! search tree) and is handed an immutable board snapshot each turn. Nothing
//! is shared between players.

use fastrand::Rng;
use log::debug;

use crate::board::{Board, Move, Side};
use crate::error::Result;
use crate::eval::Evaluator;
use crate::mcts::{Mcts, MctsConfig, Tree};
use crate::minimax::Minimax;
use crate::playout::choose_random_move;

/// Anything that can pick a move for a side.
pub trait Player {
    /// Choose a move for `side`, which must be on move in a running game.
    fn select_move(&mut self, board: &Board, side: Side) -> Result<Move>;

    /// Human-readable description.
    fn name(&self) -> String;

    /// Called before the first move of every game.
    fn new_game(&mut self) {}
}

impl<P: Player + ?Sized> Player for Box<P> {
    fn select_move(&mut self, board: &Board, side: Side) -> Result<Move> {
        (**self).select_move(board, side)
    }

    fn name(&self) -> String {
        (**self).name()
    }

    fn new_game(&mut self) {
        (**self).new_game()
    }
}

/// Minimax-backed player.
#[derive(Debug, Clone)]
pub struct MinimaxPlayer<E> {
    engine: Minimax<E>,
}

impl<E: Evaluator> MinimaxPlayer<E> {
    pub fn new(evaluator: E, depth: u32) -> Result<Self> {
        Ok(Self {
            engine: Minimax::new(evaluator, depth)?,
        })
    }
}

impl<E: Evaluator> Player for MinimaxPlayer<E> {
    fn select_move(&mut self, board: &Board, side: Side) -> Result<Move> {
        Ok(self.engine.search(board, side)?.mv)
    }

    fn name(&self) -> String {
        format!(
            "minimax({}, depth {})",
            self.engine.evaluator().name(),
            self.engine.depth()
        )
    }
}

/// MCTS-backed player.
///
/// With tree reuse enabled the player keeps its tree after moving and, on the
/// next turn, continues from the node matching the new position if the
/// opponent's reply was explored. Otherwise every turn starts a fresh tree.
///
/// A tree handed over with [`MctsPlayer::with_tree`] (for example one read
/// with [`Tree::load`]) is where every game starts from. Without reuse it is
/// consulted on each turn and never modified.
#[derive(Debug, Clone)]
pub struct MctsPlayer {
    engine: Mcts,
    rng: Rng,
    reuse_tree: bool,
    initial: Option<Tree>,
    tree: Option<Tree>,
}

impl MctsPlayer {
    pub fn new(config: MctsConfig, seed: u64) -> Result<Self> {
        Ok(Self {
            engine: Mcts::new(config)?,
            rng: Rng::with_seed(seed),
            reuse_tree: false,
            initial: None,
            tree: None,
        })
    }

    /// Keep the search tree between turns.
    pub fn with_tree_reuse(mut self, reuse: bool) -> Self {
        self.reuse_tree = reuse;
        self
    }

    /// Start every game from `tree` instead of an empty one.
    pub fn with_tree(mut self, tree: Tree) -> Self {
        self.tree = Some(tree.clone());
        self.initial = Some(tree);
        self
    }

    pub fn config(&self) -> &MctsConfig {
        self.engine.config()
    }
}

impl Player for MctsPlayer {
    fn select_move(&mut self, board: &Board, side: Side) -> Result<Move> {
        board.ensure_playable(side)?;

        let held = if self.reuse_tree {
            self.tree.as_ref()
        } else {
            self.initial.as_ref()
        };
        let reused = held.and_then(|t| t.reroot(board));
        if let Some(tree) = &reused {
            debug!(
                "mcts reusing {} nodes ({} visits)",
                tree.len(),
                tree.node(tree.root()).visits
            );
        }
        let mut tree = reused.unwrap_or_else(|| Tree::new(board.clone()));

        let mv = self.engine.choose_from(&mut tree, &mut self.rng)?;
        if self.reuse_tree {
            self.tree = Some(tree);
        }
        Ok(mv)
    }

    fn name(&self) -> String {
        format!("mcts({} iterations)", self.config().iterations)
    }

    fn new_game(&mut self) {
        self.tree = self.initial.clone();
    }
}

/// Picks a uniformly random legal move.
#[derive(Debug, Clone)]
pub struct RandomPlayer {
    rng: Rng,
}

impl RandomPlayer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Rng::with_seed(seed),
        }
    }
}

impl Player for RandomPlayer {
    fn select_move(&mut self, board: &Board, side: Side) -> Result<Move> {
        board.ensure_playable(side)?;
        Ok(choose_random_move(board, &mut self.rng))
    }

    fn name(&self) -> String {
        "random".to_string()
    }
}
