//! Reversi board representation and move execution.
//!
//! This module provides the core game rules:
//! - An 8x8 grid of cells plus the side to move
//! - Legal move generation by scanning all eight directions from each cell
//! - Atomic move application with flip resolution
//! - Terminal detection and scoring
//!
//! A [`Board`] is an immutable value: [`Board::apply`] returns a new board and
//! leaves the receiver untouched, so search trees never share a mutable grid.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{CELLS, DIRECTIONS, N};
use crate::error::{GameError, Result};

/// One of the two players.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Black,
    White,
}

impl Side {
    /// Get the opposing side.
    #[inline]
    pub fn opponent(self) -> Side {
        match self {
            Side::Black => Side::White,
            Side::White => Side::Black,
        }
    }

    /// The cell value a piece of this side occupies.
    #[inline]
    pub fn cell(self) -> Cell {
        match self {
            Side::Black => Cell::Black,
            Side::White => Cell::White,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Black => write!(f, "Black"),
            Side::White => write!(f, "White"),
        }
    }
}

/// Contents of a single square.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    Black,
    White,
}

impl Cell {
    /// The side owning this cell, if any.
    pub fn side(self) -> Option<Side> {
        match self {
            Cell::Empty => None,
            Cell::Black => Some(Side::Black),
            Cell::White => Some(Side::White),
        }
    }

    fn symbol(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Black => 'X',
            Cell::White => 'O',
        }
    }
}

/// A square on the board, addressed by grid row and column.
///
/// In algebraic notation the column is a letter `a`..`h` and the row a digit
/// `1`..`8`, so `Coord::new(3, 2)` prints as `c4`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    row: u8,
    col: u8,
}

impl Coord {
    /// Create a coordinate, or `None` if it lies off the board.
    pub fn new(row: usize, col: usize) -> Option<Coord> {
        (row < N && col < N).then_some(Coord {
            row: row as u8,
            col: col as u8,
        })
    }

    pub fn row(self) -> usize {
        self.row as usize
    }

    pub fn col(self) -> usize {
        self.col as usize
    }

    /// Row-major index into the flat cell array.
    #[inline]
    pub fn index(self) -> usize {
        self.row() * N + self.col()
    }

    #[inline]
    fn from_index(index: usize) -> Coord {
        Coord {
            row: (index / N) as u8,
            col: (index % N) as u8,
        }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = (b'a' + self.col) as char;
        write!(f, "{file}{}", self.row + 1)
    }
}

impl FromStr for Coord {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_ascii_lowercase();
        let bytes = lowered.as_bytes();
        if bytes.len() != 2 {
            return Err(GameError::InvalidCoord(s.to_string()));
        }
        let col = bytes[0].wrapping_sub(b'a') as usize;
        let row = bytes[1].wrapping_sub(b'1') as usize;
        Coord::new(row, col).ok_or_else(|| GameError::InvalidCoord(s.to_string()))
    }
}

/// A move: a placement at a coordinate, or a pass when no placement is legal.
///
/// Serialized as its algebraic text (`"d3"`, `"pass"`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Move {
    Place(Coord),
    Pass,
}

impl Move {
    /// The placed coordinate, or `None` for a pass.
    pub fn coord(self) -> Option<Coord> {
        match self {
            Move::Place(c) => Some(c),
            Move::Pass => None,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Place(c) => write!(f, "{c}"),
            Move::Pass => write!(f, "pass"),
        }
    }
}

impl FromStr for Move {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("pass") {
            Ok(Move::Pass)
        } else {
            s.parse().map(Move::Place)
        }
    }
}

impl From<Move> for String {
    fn from(mv: Move) -> String {
        mv.to_string()
    }
}

impl TryFrom<String> for Move {
    type Error = GameError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// Result of a finished game.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Win(Side),
    Draw,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Win(side) => write!(f, "{side} wins"),
            Outcome::Draw => write!(f, "Draw"),
        }
    }
}

/// A Reversi position: the grid plus the side to move.
///
/// Serializes as the same row diagrams [`Board::from_rows`] reads.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "BoardRepr", try_from = "BoardRepr")]
pub struct Board {
    cells: [Cell; CELLS],
    to_move: Side,
}

#[derive(Serialize, Deserialize)]
struct BoardRepr {
    rows: Vec<String>,
    to_move: Side,
}

impl From<Board> for BoardRepr {
    fn from(board: Board) -> Self {
        let rows = board
            .cells
            .chunks(N)
            .map(|row| row.iter().map(|c| c.symbol()).collect())
            .collect();
        BoardRepr {
            rows,
            to_move: board.to_move,
        }
    }
}

impl TryFrom<BoardRepr> for Board {
    type Error = GameError;

    fn try_from(repr: BoardRepr) -> Result<Self> {
        let rows: Vec<&str> = repr.rows.iter().map(String::as_str).collect();
        Board::from_rows(&rows, repr.to_move)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create the standard starting position with Black to move.
    ///
    /// - d4 and e5 are White
    /// - e4 and d5 are Black
    pub fn new() -> Self {
        let mut cells = [Cell::Empty; CELLS];
        cells[3 * N + 3] = Cell::White;
        cells[3 * N + 4] = Cell::Black;
        cells[4 * N + 3] = Cell::Black;
        cells[4 * N + 4] = Cell::White;
        Board {
            cells,
            to_move: Side::Black,
        }
    }

    /// Build a position from a text diagram, one string per row starting at row 1.
    ///
    /// `X`/`B` mark Black, `O`/`W` mark White, and `.`, `_` or `-` mark empty
    /// cells. Whitespace inside a row is ignored.
    pub fn from_rows(rows: &[&str], to_move: Side) -> Result<Board> {
        if rows.len() != N {
            return Err(GameError::InvalidBoard(format!(
                "expected {N} rows, got {}",
                rows.len()
            )));
        }

        let mut cells = [Cell::Empty; CELLS];
        for (row, line) in rows.iter().enumerate() {
            let symbols: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
            if symbols.len() != N {
                return Err(GameError::InvalidBoard(format!(
                    "row {} has {} cells, expected {N}",
                    row + 1,
                    symbols.len()
                )));
            }
            for (col, ch) in symbols.into_iter().enumerate() {
                cells[row * N + col] = match ch.to_ascii_uppercase() {
                    'X' | 'B' => Cell::Black,
                    'O' | 'W' => Cell::White,
                    '.' | '_' | '-' => Cell::Empty,
                    other => {
                        return Err(GameError::InvalidBoard(format!(
                            "unexpected character '{other}' in row {}",
                            row + 1
                        )));
                    }
                };
            }
        }

        Ok(Board { cells, to_move })
    }

    /// The side whose turn it is.
    #[inline]
    pub fn to_move(&self) -> Side {
        self.to_move
    }

    /// Contents of one square.
    #[inline]
    pub fn cell(&self, coord: Coord) -> Cell {
        self.cells[coord.index()]
    }

    /// Snapshot of the grid as rows of cells.
    pub fn grid(&self) -> [[Cell; N]; N] {
        let mut grid = [[Cell::Empty; N]; N];
        for (i, cell) in self.cells.iter().enumerate() {
            grid[i / N][i % N] = *cell;
        }
        grid
    }

    /// Bitmask (bit = cell index) of the opponent pieces a placement at
    /// `index` by `side` would flip. Zero means the placement is illegal.
    fn flip_mask(&self, index: usize, side: Side) -> u64 {
        if self.cells[index] != Cell::Empty {
            return 0;
        }

        let own = side.cell();
        let opp = side.opponent().cell();
        let row = (index / N) as isize;
        let col = (index % N) as isize;
        let mut mask = 0u64;

        for (dr, dc) in DIRECTIONS {
            let mut run = 0u64;
            let mut r = row + dr;
            let mut c = col + dc;
            while (0..N as isize).contains(&r) && (0..N as isize).contains(&c) {
                let i = r as usize * N + c as usize;
                let cell = self.cells[i];
                if cell == opp {
                    run |= 1 << i;
                } else {
                    if cell == own {
                        mask |= run;
                    }
                    break;
                }
                r += dr;
                c += dc;
            }
        }

        mask
    }

    /// Number of pieces a placement at `coord` by `side` would flip.
    pub fn flip_count(&self, coord: Coord, side: Side) -> u32 {
        self.flip_mask(coord.index(), side).count_ones()
    }

    /// Whether `mv` is a legal placement for `side`. A pass is never reported
    /// as legal here; see [`Board::apply`] for pass handling.
    pub fn is_legal(&self, mv: Move, side: Side) -> bool {
        match mv {
            Move::Place(c) => self.flip_mask(c.index(), side) != 0,
            Move::Pass => false,
        }
    }

    /// All legal placements for `side`, in row-major order.
    ///
    /// An empty result means `side` must pass.
    pub fn legal_moves(&self, side: Side) -> Vec<Move> {
        (0..CELLS)
            .filter(|&i| self.flip_mask(i, side) != 0)
            .map(|i| Move::Place(Coord::from_index(i)))
            .collect()
    }

    /// Whether `side` has at least one legal placement.
    pub fn has_legal_move(&self, side: Side) -> bool {
        (0..CELLS).any(|i| self.flip_mask(i, side) != 0)
    }

    /// Apply `mv` for `side` and return the resulting position.
    ///
    /// A placement flips every bracketed opponent run and hands the turn to the
    /// opponent. `Move::Pass` is accepted only when `side` has no placement.
    /// On error `self` is untouched.
    pub fn apply(&self, mv: Move, side: Side) -> Result<Board> {
        if side != self.to_move {
            return Err(GameError::OutOfTurn {
                expected: self.to_move,
                got: side,
            });
        }

        let mut next = self.clone();
        match mv {
            Move::Pass => {
                if self.has_legal_move(side) {
                    return Err(GameError::PassNotAllowed { side });
                }
            }
            Move::Place(coord) => {
                let mask = self.flip_mask(coord.index(), side);
                if mask == 0 {
                    return Err(GameError::IllegalMove { mv, side });
                }
                let own = side.cell();
                for (i, cell) in next.cells.iter_mut().enumerate() {
                    if mask & (1 << i) != 0 {
                        *cell = own;
                    }
                }
                next.cells[coord.index()] = own;
            }
        }
        next.to_move = side.opponent();
        Ok(next)
    }

    /// Apply `mv` for the side to move.
    pub fn play(&self, mv: Move) -> Result<Board> {
        self.apply(mv, self.to_move)
    }

    /// True when neither side has a legal placement.
    pub fn is_terminal(&self) -> bool {
        !self.has_legal_move(Side::Black) && !self.has_legal_move(Side::White)
    }

    /// Fail unless `side` may be asked for a move: the game is still running
    /// and it is `side`'s turn.
    pub fn ensure_playable(&self, side: Side) -> Result<()> {
        if self.is_terminal() {
            return Err(GameError::TerminalState);
        }
        if side != self.to_move {
            return Err(GameError::OutOfTurn {
                expected: self.to_move,
                got: side,
            });
        }
        Ok(())
    }

    /// Number of pieces owned by `side`.
    pub fn count(&self, side: Side) -> u32 {
        let cell = side.cell();
        self.cells.iter().filter(|&&c| c == cell).count() as u32
    }

    /// Number of empty cells.
    pub fn empty_count(&self) -> u32 {
        self.cells.iter().filter(|&&c| c == Cell::Empty).count() as u32
    }

    /// Piece counts as (Black, White).
    pub fn score(&self) -> (u32, u32) {
        (self.count(Side::Black), self.count(Side::White))
    }

    /// The result of the game, or `None` while it is still in progress.
    pub fn winner(&self) -> Option<Outcome> {
        if !self.is_terminal() {
            return None;
        }
        let (black, white) = self.score();
        Some(match black.cmp(&white) {
            std::cmp::Ordering::Greater => Outcome::Win(Side::Black),
            std::cmp::Ordering::Less => Outcome::Win(Side::White),
            std::cmp::Ordering::Equal => Outcome::Draw,
        })
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, " ")?;
        for col in 0..N {
            write!(f, " {}", (b'a' + col as u8) as char)?;
        }
        writeln!(f)?;
        for row in 0..N {
            write!(f, "{}", row + 1)?;
            for col in 0..N {
                write!(f, " {}", self.cells[row * N + col].symbol())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
