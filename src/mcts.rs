//! Monte Carlo Tree Search (MCTS) with UCB1 selection.
//!
//! Each iteration runs four phases:
//! - Selection: descend from the root by maximum UCB1 until a node still has
//!   untried moves or has no children
//! - Expansion: turn the next untried move (row-major order) into a child
//! - Simulation: random playout from the new node to the end of the game
//! - Backpropagation: walk parent links back to the root updating statistics
//!
//! Nodes live in an arena (`Vec<Node>`) and refer to each other through
//! [`NodeId`] handles. Children are owned by the arena and listed by their
//! parent; the parent handle is only followed during backpropagation.
//!
//! Win statistics at a node are kept from the point of view of the side to
//! move at that node. A parent therefore scores a child by `1 - win_rate`.
//!
//! A [`Tree`] can be written to and read back from JSON so that a search grown
//! offline (for example from the opening) can seed a player later.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use fastrand::Rng;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::board::{Board, Move, Outcome, Side};
use crate::constants::{DEFAULT_ITERATIONS, UCB_C};
use crate::error::{GameError, Result};
use crate::playout::{mcplayout, reward};

/// Handle of a node inside a [`Tree`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(usize);

/// A node in the MCTS search tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// The game position at this node
    pub board: Board,
    /// Move that led here from the parent (`None` at the root)
    pub mv: Option<Move>,
    /// Parent handle, used for backpropagation only
    pub parent: Option<NodeId>,
    /// Expanded children, in expansion order
    pub children: Vec<NodeId>,
    /// Moves not yet expanded, stored reversed so `pop` yields row-major order
    untried: Vec<Move>,
    /// Number of visits
    pub visits: u32,
    /// Accumulated reward for the side to move at this node
    pub wins: f64,
}

impl Node {
    fn new(board: Board, mv: Option<Move>, parent: Option<NodeId>) -> Self {
        let side = board.to_move();
        let mut untried = board.legal_moves(side);
        if untried.is_empty() {
            if board.has_legal_move(side.opponent()) {
                untried.push(Move::Pass);
            }
        } else {
            untried.reverse();
        }
        Self {
            board,
            mv,
            parent,
            children: Vec::new(),
            untried,
            visits: 0,
            wins: 0.0,
        }
    }

    /// Average reward for the side to move here.
    ///
    /// Returns 0 for unvisited nodes.
    #[inline]
    pub fn win_rate(&self) -> f64 {
        if self.visits > 0 {
            self.wins / self.visits as f64
        } else {
            0.0
        }
    }

    /// Whether any move remains to be expanded.
    pub fn has_untried(&self) -> bool {
        !self.untried.is_empty()
    }
}

/// Statistics for one root move.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChildStats {
    pub mv: Move,
    pub visits: u32,
    /// Average reward for the side playing `mv`
    pub win_rate: f64,
}

/// Search parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct MctsConfig {
    /// Number of select/expand/simulate/backpropagate cycles
    pub iterations: usize,
    /// UCB1 exploration constant `C`
    pub exploration: f64,
    /// Optional soft deadline. When set the search stops at whichever comes
    /// first, the deadline or the iteration budget, so the iteration count is
    /// no longer reproducible. At least one iteration always runs.
    pub time_limit: Option<Duration>,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            exploration: UCB_C,
            time_limit: None,
        }
    }
}

impl MctsConfig {
    pub fn with_iterations(iterations: usize) -> Self {
        Self {
            iterations,
            ..Self::default()
        }
    }

    /// Reject budgets that would produce a meaningless search.
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(GameError::InvalidBudget(
                "iteration budget must be at least 1".to_string(),
            ));
        }
        if !self.exploration.is_finite() || self.exploration < 0.0 {
            return Err(GameError::InvalidBudget(format!(
                "exploration constant must be finite and non-negative, got {}",
                self.exploration
            )));
        }
        if self.time_limit.is_some_and(|t| t.is_zero()) {
            return Err(GameError::InvalidBudget(
                "time limit must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// UCB1 score of `child` as seen from its parent.
#[inline]
fn ucb1(child: &Node, parent_visits: u32, c: f64) -> f64 {
    let visits = child.visits as f64;
    let exploitation = 1.0 - child.win_rate();
    exploitation + c * ((parent_visits as f64).ln() / visits).sqrt()
}

/// An MCTS search tree stored as an arena of nodes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Tree {
    nodes: Vec<Node>,
}

/// Unchecked wire form of [`Tree`].
#[derive(Deserialize)]
struct TreeRepr {
    nodes: Vec<Node>,
}

impl<'de> Deserialize<'de> for Tree {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let TreeRepr { nodes } = TreeRepr::deserialize(deserializer)?;
        let tree = Tree { nodes };
        tree.check().map_err(serde::de::Error::custom)?;
        Ok(tree)
    }
}

impl Tree {
    /// Create a tree holding only the root position.
    pub fn new(board: Board) -> Self {
        Self {
            nodes: vec![Node::new(board, None, None)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Descend to the node the next iteration should work on.
    fn select(&self, c: f64) -> NodeId {
        let mut id = self.root();
        loop {
            let node = self.node(id);
            if node.has_untried() || node.children.is_empty() {
                return id;
            }
            let parent_visits = node.visits;
            let mut best = node.children[0];
            let mut best_score = f64::NEG_INFINITY;
            for &child in &node.children {
                let score = ucb1(self.node(child), parent_visits, c);
                if score > best_score {
                    best = child;
                    best_score = score;
                }
            }
            id = best;
        }
    }

    /// Expand the next untried move of `id` and return the new child.
    fn expand(&mut self, id: NodeId) -> Result<NodeId> {
        let child = NodeId(self.nodes.len());
        let parent = &mut self.nodes[id.0];
        let Some(mv) = parent.untried.pop() else {
            return Ok(id);
        };
        let board = parent.board.apply(mv, parent.board.to_move())?;
        parent.children.push(child);
        self.nodes.push(Node::new(board, Some(mv), Some(id)));
        Ok(child)
    }

    /// Credit `outcome` to `id` and all of its ancestors.
    fn backpropagate(&mut self, id: NodeId, outcome: Outcome) {
        let mut current = Some(id);
        while let Some(NodeId(i)) = current {
            let node = &mut self.nodes[i];
            node.visits += 1;
            node.wins += reward(outcome, node.board.to_move());
            current = node.parent;
        }
    }

    /// Run one full MCTS iteration.
    pub fn iterate(&mut self, c: f64, rng: &mut Rng) -> Result<()> {
        let leaf = self.select(c);
        let node = if self.node(leaf).has_untried() {
            self.expand(leaf)?
        } else {
            leaf
        };
        let outcome = mcplayout(&self.node(node).board, rng)?;
        self.backpropagate(node, outcome);
        Ok(())
    }

    /// The most visited root move; the first expanded wins ties.
    pub fn best_move(&self) -> Option<Move> {
        let root = self.node(self.root());
        let mut best: Option<&Node> = None;
        for &child in &root.children {
            let node = self.node(child);
            if best.is_none_or(|b| node.visits > b.visits) {
                best = Some(node);
            }
        }
        best.and_then(|n| n.mv)
    }

    /// Statistics of every expanded root move.
    pub fn child_stats(&self) -> Vec<ChildStats> {
        self.node(self.root())
            .children
            .iter()
            .map(|&id| {
                let node = self.node(id);
                ChildStats {
                    mv: node.mv.unwrap_or(Move::Pass),
                    visits: node.visits,
                    win_rate: 1.0 - node.win_rate(),
                }
            })
            .collect()
    }

    /// Find a node within `max_depth` plies of the root holding `board`.
    fn find(&self, board: &Board, max_depth: usize) -> Option<NodeId> {
        let mut queue = VecDeque::from([(self.root(), 0)]);
        while let Some((id, depth)) = queue.pop_front() {
            let node = self.node(id);
            if node.board == *board {
                return Some(id);
            }
            if depth < max_depth {
                queue.extend(node.children.iter().map(|&c| (c, depth + 1)));
            }
        }
        None
    }

    /// Verify the arena links: a parentless root at index 0, every child in
    /// range and pointing back at its parent, every non-root node reached by
    /// exactly one legal move.
    fn check(&self) -> std::result::Result<(), String> {
        let Some(root) = self.nodes.first() else {
            return Err("tree has no root".to_string());
        };
        if root.parent.is_some() {
            return Err("root has a parent".to_string());
        }

        let mut seen = vec![false; self.nodes.len()];
        seen[0] = true;
        for (i, node) in self.nodes.iter().enumerate() {
            for &NodeId(c) in &node.children {
                let Some(child) = self.nodes.get(c) else {
                    return Err(format!("node {i} lists missing child {c}"));
                };
                if seen[c] || child.parent != Some(NodeId(i)) {
                    return Err(format!("node {c} is not a single child of node {i}"));
                }
                seen[c] = true;
                let follows = child
                    .mv
                    .and_then(|mv| node.board.play(mv).ok())
                    .is_some_and(|board| board == child.board);
                if !follows {
                    return Err(format!("node {c} does not follow from node {i}"));
                }
            }
        }
        match seen.iter().position(|&s| !s) {
            Some(orphan) => Err(format!("node {orphan} is unreachable")),
            None => Ok(()),
        }
    }

    /// Encode the tree as JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| GameError::InvalidTree(e.to_string()))
    }

    /// Decode and verify a tree written by [`Tree::to_json`].
    pub fn from_json(text: &str) -> Result<Tree> {
        serde_json::from_str(text).map_err(|e| GameError::InvalidTree(e.to_string()))
    }

    /// Write the tree to `path` as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)
            .map_err(|e| GameError::InvalidTree(e.to_string()))?;
        writer.flush()?;
        info!("saved {} nodes to {}", self.len(), path.display());
        Ok(())
    }

    /// Read a tree written by [`Tree::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Tree> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let tree: Tree = serde_json::from_reader(reader)
            .map_err(|e| GameError::InvalidTree(e.to_string()))?;
        info!("loaded {} nodes from {}", tree.len(), path.display());
        Ok(tree)
    }

    /// Keep only the sub-tree whose root holds `board`, searching up to two
    /// plies down (our move plus the opponent's reply). Returns `None` when
    /// the position is not in the tree.
    pub fn reroot(&self, board: &Board) -> Option<Tree> {
        let target = self.find(board, 2)?;

        let mut nodes: Vec<Node> = Vec::new();
        let mut queue = VecDeque::from([(target, None)]);
        while let Some((old, parent)) = queue.pop_front() {
            let id = NodeId(nodes.len());
            let src = self.node(old);
            let mut node = Node {
                children: Vec::with_capacity(src.children.len()),
                parent,
                ..src.clone()
            };
            if parent.is_none() {
                node.mv = None;
            }
            if let Some(NodeId(p)) = parent {
                nodes[p].children.push(id);
            }
            queue.extend(src.children.iter().map(|&c| (c, Some(id))));
            nodes.push(node);
        }

        Some(Tree { nodes })
    }
}

/// MCTS engine bound to a configuration.
#[derive(Clone, Debug)]
pub struct Mcts {
    config: MctsConfig,
}

impl Mcts {
    /// Create an engine. Fails if the configuration is invalid.
    pub fn new(config: MctsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// Grow `tree` by the configured budget and return the iteration count.
    pub fn run(&self, tree: &mut Tree, rng: &mut Rng) -> Result<usize> {
        let deadline = self.config.time_limit.map(|t| Instant::now() + t);
        let mut done = 0;
        while done < self.config.iterations {
            if done > 0 && deadline.is_some_and(|d| Instant::now() >= d) {
                break;
            }
            tree.iterate(self.config.exploration, rng)?;
            done += 1;
        }
        Ok(done)
    }

    /// Build a fresh tree for `board` and search it.
    pub fn search(&self, board: &Board, side: Side, rng: &mut Rng) -> Result<Tree> {
        board.ensure_playable(side)?;
        let mut tree = Tree::new(board.clone());
        self.run(&mut tree, rng)?;
        Ok(tree)
    }

    /// Search `tree` further and pick the most visited root move.
    ///
    /// A forced pass is returned immediately without searching.
    pub fn choose_from(&self, tree: &mut Tree, rng: &mut Rng) -> Result<Move> {
        let board = tree.node(tree.root()).board.clone();
        board.ensure_playable(board.to_move())?;
        if !board.has_legal_move(board.to_move()) {
            return Ok(Move::Pass);
        }

        let iterations = self.run(tree, rng)?;
        dump_children(tree);
        let mv = tree
            .best_move()
            .ok_or(GameError::NoLegalMove { side: board.to_move() })?;
        debug!(
            "mcts {}: {mv} after {iterations} iterations ({} nodes)",
            board.to_move(),
            tree.len()
        );
        Ok(mv)
    }
}

/// Pick a move for `side` with `iteration_budget` MCTS iterations.
pub fn choose_move(
    board: &Board,
    side: Side,
    iteration_budget: usize,
    rng: &mut Rng,
) -> Result<Move> {
    let engine = Mcts::new(MctsConfig::with_iterations(iteration_budget))?;
    board.ensure_playable(side)?;
    let mut tree = Tree::new(board.clone());
    engine.choose_from(&mut tree, rng)
}

/// Log the root's children at debug level.
pub fn dump_children(tree: &Tree) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    for stats in tree.child_stats() {
        debug!(
            "move {} v={} wr={:.3}",
            stats.mv, stats.visits, stats.win_rate
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(s: &str) -> Move {
        Move::Place(s.parse().unwrap())
    }

    /// Black d1 flips every white piece and ends the game on the spot.
    fn wipeout_position() -> Board {
        let rows = [
            "XOO.....", "...OX...", "..XX....", "........", "........", "........", "........",
            "........",
        ];
        Board::from_rows(&rows, Side::Black).unwrap()
    }

    #[test]
    fn test_rejects_zero_budget() {
        let mut rng = Rng::with_seed(1);
        let err = choose_move(&Board::new(), Side::Black, 0, &mut rng).unwrap_err();
        assert!(matches!(err, GameError::InvalidBudget(_)));
    }

    #[test]
    fn test_rejects_bad_exploration() {
        let config = MctsConfig {
            exploration: f64::NAN,
            ..MctsConfig::default()
        };
        assert!(Mcts::new(config).is_err());
    }

    #[test]
    fn test_rejects_terminal_board() {
        let board = Board::from_rows(&["XXXXXXXX"; 8], Side::White).unwrap();
        let mut rng = Rng::with_seed(1);
        let err = choose_move(&board, Side::White, 10, &mut rng).unwrap_err();
        assert!(matches!(err, GameError::TerminalState));
    }

    #[test]
    fn test_forced_pass() {
        let rows = [
            "XXXXXXXX", "XXXXXXXX", "XXXXXXXX", "XXXXXXXX", "XXXXXXXX", "XXXXXXXX", "XXXXXXO.",
            "XXXXXXX.",
        ];
        let board = Board::from_rows(&rows, Side::White).unwrap();
        let mut rng = Rng::with_seed(1);
        assert_eq!(
            choose_move(&board, Side::White, 50, &mut rng).unwrap(),
            Move::Pass
        );
    }

    #[test]
    fn test_visit_accounting() {
        let engine = Mcts::new(MctsConfig::with_iterations(200)).unwrap();
        let mut rng = Rng::with_seed(11);
        let tree = engine.search(&Board::new(), Side::Black, &mut rng).unwrap();

        let root = tree.node(tree.root());
        assert_eq!(root.visits, 200);
        // The root is never simulated itself, so its visits are exactly the
        // sum over its children
        let child_visits: u32 = tree.child_stats().iter().map(|s| s.visits).sum();
        assert_eq!(child_visits, 200);
        // All four opening moves get expanded, in row-major order
        let moves: Vec<Move> = tree.child_stats().iter().map(|s| s.mv).collect();
        assert_eq!(moves, vec![place("d3"), place("c4"), place("f5"), place("e6")]);
        assert_eq!(tree.len(), 201);
    }

    #[test]
    fn test_parent_links() {
        let engine = Mcts::new(MctsConfig::with_iterations(100)).unwrap();
        let mut rng = Rng::with_seed(2);
        let tree = engine.search(&Board::new(), Side::Black, &mut rng).unwrap();
        for i in 1..tree.len() {
            let node = tree.node(NodeId(i));
            let parent = tree.node(node.parent.unwrap());
            assert!(parent.children.contains(&NodeId(i)));
            let mv = node.mv.unwrap();
            assert_eq!(parent.board.play(mv).unwrap(), node.board);
        }
    }

    #[test]
    fn test_seeded_search_is_reproducible() {
        let board = Board::new();
        let a = choose_move(&board, Side::Black, 300, &mut Rng::with_seed(42)).unwrap();
        let b = choose_move(&board, Side::Black, 300, &mut Rng::with_seed(42)).unwrap();
        assert_eq!(a, b);
        assert!(board.is_legal(a, Side::Black));
    }

    #[test]
    fn test_finds_dominant_move() {
        let board = wipeout_position();
        let runs = 20;
        let hits = (0..runs)
            .filter(|&seed| {
                let mut rng = Rng::with_seed(seed);
                choose_move(&board, Side::Black, 1000, &mut rng).unwrap() == place("d1")
            })
            .count();
        assert!(hits * 100 > runs as usize * 95, "d1 chosen {hits}/{runs} times");
    }

    #[test]
    fn test_terminal_child_stats() {
        let engine = Mcts::new(MctsConfig::with_iterations(300)).unwrap();
        let mut rng = Rng::with_seed(8);
        let tree = engine.search(&wipeout_position(), Side::Black, &mut rng).unwrap();
        let d1 = tree
            .child_stats()
            .into_iter()
            .find(|s| s.mv == place("d1"))
            .unwrap();
        assert_eq!(d1.win_rate, 1.0);
    }

    #[test]
    fn test_time_limit_runs_at_least_once() {
        let config = MctsConfig {
            iterations: usize::MAX,
            time_limit: Some(Duration::from_millis(20)),
            ..MctsConfig::default()
        };
        let engine = Mcts::new(config).unwrap();
        let mut tree = Tree::new(Board::new());
        let done = engine.run(&mut tree, &mut Rng::with_seed(4)).unwrap();
        assert!(done >= 1);
        assert_eq!(tree.node(tree.root()).visits as usize, done);
    }

    #[test]
    fn test_reroot_keeps_subtree() {
        let engine = Mcts::new(MctsConfig::with_iterations(400)).unwrap();
        let mut rng = Rng::with_seed(5);
        let tree = engine.search(&Board::new(), Side::Black, &mut rng).unwrap();

        let after = Board::new().play(place("d3")).unwrap();
        let sub = tree.reroot(&after).unwrap();
        let root = sub.node(sub.root());
        assert_eq!(root.board, after);
        assert!(root.parent.is_none());
        assert!(root.mv.is_none());

        let old = tree
            .node(tree.root())
            .children
            .iter()
            .map(|&id| tree.node(id))
            .find(|n| n.mv == Some(place("d3")))
            .unwrap();
        assert_eq!(root.visits, old.visits);
        assert!(sub.len() < tree.len());
        for i in 1..sub.len() {
            let node = sub.node(NodeId(i));
            let parent = sub.node(node.parent.unwrap());
            assert!(parent.children.contains(&NodeId(i)));
        }

        // Unrelated positions are not found
        let elsewhere = Board::from_rows(&["XXXXXXXX"; 8], Side::White).unwrap();
        assert!(tree.reroot(&elsewhere).is_none());
    }

    #[test]
    fn test_tree_json_round_trip() {
        let engine = Mcts::new(MctsConfig::with_iterations(200)).unwrap();
        let mut rng = Rng::with_seed(6);
        let tree = engine.search(&Board::new(), Side::Black, &mut rng).unwrap();

        let text = tree.to_json().unwrap();
        let loaded = Tree::from_json(&text).unwrap();
        assert_eq!(loaded, tree);
        assert_eq!(loaded.best_move(), tree.best_move());

        // Both copies keep growing identically under the same seed
        let mut a = tree.clone();
        let mut b = loaded;
        let mv_a = engine.choose_from(&mut a, &mut Rng::with_seed(9)).unwrap();
        let mv_b = engine.choose_from(&mut b, &mut Rng::with_seed(9)).unwrap();
        assert_eq!(mv_a, mv_b);
        assert_eq!(a, b);
        assert_eq!(b.node(b.root()).visits, 400);
    }

    #[test]
    fn test_tree_save_and_load() {
        let engine = Mcts::new(MctsConfig::with_iterations(50)).unwrap();
        let board = Board::new().play(place("f5")).unwrap();
        let tree = engine.search(&board, Side::White, &mut Rng::with_seed(3)).unwrap();

        let path = std::env::temp_dir().join(format!("reversi-ai-tree-{}.json", std::process::id()));
        tree.save(&path).unwrap();
        let loaded = Tree::load(&path);
        std::fs::remove_file(&path).unwrap();
        let loaded = loaded.unwrap();
        assert_eq!(loaded.node(loaded.root()).board, board);
        assert_eq!(loaded.len(), tree.len());

        let missing = std::env::temp_dir().join("reversi-ai-no-such-tree.json");
        assert!(matches!(Tree::load(&missing), Err(GameError::Input(_))));
    }

    #[test]
    fn test_rejects_corrupt_trees() {
        let engine = Mcts::new(MctsConfig::with_iterations(30)).unwrap();
        let tree = engine.search(&Board::new(), Side::Black, &mut Rng::with_seed(1)).unwrap();

        let mut dangling = tree.clone();
        dangling.nodes[0].children.push(NodeId(tree.len() + 5));
        let mut rooted = tree.clone();
        rooted.nodes[0].parent = Some(NodeId(1));
        let mut wrong_move = tree.clone();
        wrong_move.nodes[1].mv = Some(place("a1"));
        let mut orphaned = tree.clone();
        orphaned.nodes.push(Node::new(Board::new(), None, None));
        let empty = Tree { nodes: Vec::new() };

        for corrupt in [dangling, rooted, wrong_move, orphaned, empty] {
            let text = serde_json::to_string(&corrupt).unwrap();
            assert!(matches!(Tree::from_json(&text), Err(GameError::InvalidTree(_))));
        }
        assert!(matches!(Tree::from_json("[1, 2"), Err(GameError::InvalidTree(_))));
    }
}
