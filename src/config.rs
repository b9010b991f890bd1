//! Player and match configuration.
//!
//! Players can be described either as JSON (tagged by `kind`) or with the
//! compact command-line form:
//!
//! - `human`
//! - `random`
//! - `minimax[:strategy[:depth]]`, e.g. `minimax:mobility:3`
//! - `mcts[:iterations]`, e.g. `mcts:2000`
//!
//! A match file names both players plus the number of games and an optional
//! seed:
//!
//! ```json
//! {
//!   "p1": { "kind": "minimax", "strategy": "positional", "depth": 4 },
//!   "p2": { "kind": "mcts", "iterations": 2000, "reuse_tree": true, "tree_file": "opening.json" },
//!   "games": 10,
//!   "seed": 7
//! }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::console::HumanPlayer;
use crate::constants::{DEFAULT_DEPTH, DEFAULT_ITERATIONS, UCB_C};
use crate::error::{GameError, Result};
use crate::eval::Strategy;
use crate::mcts::{MctsConfig, Tree};
use crate::player::{MctsPlayer, MinimaxPlayer, Player, RandomPlayer};

fn default_depth() -> u32 {
    DEFAULT_DEPTH
}

fn default_iterations() -> usize {
    DEFAULT_ITERATIONS
}

fn default_exploration() -> f64 {
    UCB_C
}

fn default_games() -> u32 {
    10
}

/// Description of one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PlayerConfig {
    Human,
    Random,
    Minimax {
        #[serde(default)]
        strategy: Strategy,
        #[serde(default = "default_depth")]
        depth: u32,
    },
    Mcts {
        #[serde(default = "default_iterations")]
        iterations: usize,
        #[serde(default = "default_exploration")]
        exploration: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_limit_ms: Option<u64>,
        #[serde(default)]
        reuse_tree: bool,
        /// Search tree to start every game from, as written by `Tree::save`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tree_file: Option<PathBuf>,
    },
}

impl PlayerConfig {
    /// Check the parameters without building anything.
    pub fn validate(&self) -> Result<()> {
        match self {
            PlayerConfig::Human | PlayerConfig::Random => Ok(()),
            PlayerConfig::Minimax { depth, .. } => {
                if *depth == 0 {
                    Err(GameError::InvalidDepth(*depth))
                } else {
                    Ok(())
                }
            }
            PlayerConfig::Mcts { .. } => self.mcts_config().map_or(Ok(()), |c| c.validate()),
        }
    }

    fn mcts_config(&self) -> Option<MctsConfig> {
        match *self {
            PlayerConfig::Mcts {
                iterations,
                exploration,
                time_limit_ms,
                ..
            } => Some(MctsConfig {
                iterations,
                exploration,
                time_limit: time_limit_ms.map(Duration::from_millis),
            }),
            _ => None,
        }
    }

    /// Whether this player reads moves from the console.
    pub fn is_human(&self) -> bool {
        matches!(self, PlayerConfig::Human)
    }

    /// Build the player. `seed` feeds the random source of stochastic players.
    pub fn build(&self, seed: u64) -> Result<Box<dyn Player>> {
        self.validate()?;
        let player: Box<dyn Player> = match self {
            PlayerConfig::Human => Box::new(HumanPlayer::stdio()),
            PlayerConfig::Random => Box::new(RandomPlayer::new(seed)),
            PlayerConfig::Minimax { strategy, depth } => {
                Box::new(MinimaxPlayer::new(*strategy, *depth)?)
            }
            PlayerConfig::Mcts {
                reuse_tree,
                tree_file,
                ..
            } => {
                let config = self.mcts_config().unwrap_or_default();
                let mut player = MctsPlayer::new(config, seed)?.with_tree_reuse(*reuse_tree);
                if let Some(path) = tree_file {
                    player = player.with_tree(Tree::load(path)?);
                }
                Box::new(player)
            }
        };
        Ok(player)
    }
}

impl fmt::Display for PlayerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerConfig::Human => write!(f, "human"),
            PlayerConfig::Random => write!(f, "random"),
            PlayerConfig::Minimax { strategy, depth } => write!(f, "minimax:{strategy}:{depth}"),
            PlayerConfig::Mcts { iterations, .. } => write!(f, "mcts:{iterations}"),
        }
    }
}

impl FromStr for PlayerConfig {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_ascii_lowercase();
        let mut parts = lowered.split(':');
        let kind = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        let too_many = |max: usize| {
            if args.len() > max {
                Err(GameError::InvalidConfig(format!(
                    "too many parameters in player '{s}'"
                )))
            } else {
                Ok(())
            }
        };

        let config = match kind {
            "human" => {
                too_many(0)?;
                PlayerConfig::Human
            }
            "random" => {
                too_many(0)?;
                PlayerConfig::Random
            }
            "minimax" => {
                too_many(2)?;
                let strategy = match args.first() {
                    Some(name) => name.parse()?,
                    None => Strategy::default(),
                };
                let depth = match args.get(1) {
                    Some(d) => d.parse().map_err(|_| {
                        GameError::InvalidConfig(format!("invalid depth '{d}'"))
                    })?,
                    None => DEFAULT_DEPTH,
                };
                PlayerConfig::Minimax { strategy, depth }
            }
            "mcts" => {
                too_many(1)?;
                let iterations = match args.first() {
                    Some(n) => n.parse().map_err(|_| {
                        GameError::InvalidConfig(format!("invalid iteration count '{n}'"))
                    })?,
                    None => DEFAULT_ITERATIONS,
                };
                PlayerConfig::Mcts {
                    iterations,
                    exploration: UCB_C,
                    time_limit_ms: None,
                    reuse_tree: false,
                    tree_file: None,
                }
            }
            other => {
                return Err(GameError::InvalidConfig(format!(
                    "unknown player kind '{other}' (expected human, random, minimax or mcts)"
                )));
            }
        };
        config.validate()?;
        Ok(config)
    }
}

/// A series between two configured players.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    pub p1: PlayerConfig,
    pub p2: PlayerConfig,
    #[serde(default = "default_games")]
    pub games: u32,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl MatchConfig {
    /// Parse and validate a match description.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: MatchConfig =
            serde_json::from_str(text).map_err(|e| GameError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a match description from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.games == 0 {
            return Err(GameError::InvalidConfig(
                "a series needs at least one game".to_string(),
            ));
        }
        self.p1.validate()?;
        self.p2.validate()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| GameError::InvalidConfig(e.to_string()))
    }
}
