//! Interactive console player.
//!
//! Reads moves in algebraic notation (`d3`, `F5`) or `pass` from a line-based
//! input. Blank lines and lines starting with `#` are ignored. Invalid or
//! illegal input is reported and the prompt repeats; a pass is only accepted
//! when no placement exists, and in that case the pass is made automatically.

use std::io::{self, BufRead, Stdin, Stdout, Write};

use crate::board::{Board, Move, Side};
use crate::error::{GameError, Result};
use crate::player::Player;

/// Line-oriented move input.
pub trait LineSource {
    /// Append the next line to `buf`, returning the bytes read (0 at EOF).
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize>;
}

impl<R: BufRead> LineSource for R {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        BufRead::read_line(self, buf)
    }
}

/// Standard input, locked only for the duration of each read so that any
/// number of console players can share it.
#[derive(Debug)]
pub struct StdinLines(Stdin);

impl LineSource for StdinLines {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        self.0.read_line(buf)
    }
}

/// A human entering moves on a text stream.
pub struct HumanPlayer<R, W> {
    input: R,
    output: W,
}

impl HumanPlayer<StdinLines, Stdout> {
    /// Read from standard input and prompt on standard output.
    pub fn stdio() -> Self {
        Self::new(StdinLines(io::stdin()), io::stdout())
    }
}

impl<R: LineSource, W: Write> HumanPlayer<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Consume the player and return its output stream.
    pub fn into_output(self) -> W {
        self.output
    }

    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(GameError::Input(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed while waiting for a move",
            )));
        }
        Ok(line)
    }
}

impl<R: LineSource, W: Write> Player for HumanPlayer<R, W> {
    fn select_move(&mut self, board: &Board, side: Side) -> Result<Move> {
        board.ensure_playable(side)?;

        let legal = board.legal_moves(side);
        if legal.is_empty() {
            writeln!(self.output, "{side} has no legal move and passes")?;
            return Ok(Move::Pass);
        }
        let listing = legal
            .iter()
            .map(|mv| mv.to_string())
            .collect::<Vec<_>>()
            .join(" ");

        loop {
            write!(self.output, "{side} to move [{listing}]: ")?;
            self.output.flush()?;

            let line = self.read_line()?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match line.parse::<Move>() {
                Ok(mv) if board.is_legal(mv, side) => return Ok(mv),
                Ok(Move::Pass) => {
                    writeln!(self.output, "cannot pass while a placement is available")?
                }
                Ok(mv) => writeln!(self.output, "illegal move {mv}")?,
                Err(err) => writeln!(self.output, "{err}")?,
            }
        }
    }

    fn name(&self) -> String {
        "human".to_string()
    }
}
