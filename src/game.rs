//! Game and series runners.
//!
//! [`play_game`] drives two players from the opening to the end, asking the
//! side to move for a move each ply and validating it against the rules. A
//! side with no placement passes without being asked. [`run_series`] plays a
//! number of games between the same two players, alternating colours.

use log::{info, trace};

use crate::board::{Board, Move, Outcome, Side};
use crate::constants::MAX_GAME_LEN;
use crate::error::{GameError, Result};
use crate::player::Player;

/// Full record of a finished game.
#[derive(Debug, Clone)]
pub struct GameRecord {
    /// Every ply in order, passes included
    pub moves: Vec<(Side, Move)>,
    pub outcome: Outcome,
    /// Final piece counts as (Black, White)
    pub score: (u32, u32),
    pub final_board: Board,
}

/// Play one game from the standard opening.
pub fn play_game(black: &mut dyn Player, white: &mut dyn Player) -> Result<GameRecord> {
    play_game_observed(Board::new(), black, white, |_, _, _| {})
}

/// Play one game from `start`, calling `observe` after every ply with the
/// resulting board, the side that moved and its move.
pub fn play_game_observed<F>(
    start: Board,
    black: &mut dyn Player,
    white: &mut dyn Player,
    mut observe: F,
) -> Result<GameRecord>
where
    F: FnMut(&Board, Side, Move),
{
    black.new_game();
    white.new_game();

    let mut board = start;
    let mut moves = Vec::new();

    while !board.is_terminal() {
        if moves.len() >= MAX_GAME_LEN {
            return Err(GameError::PlyLimitExceeded(MAX_GAME_LEN));
        }

        let side = board.to_move();
        let mv = if board.has_legal_move(side) {
            let player: &mut dyn Player = match side {
                Side::Black => &mut *black,
                Side::White => &mut *white,
            };
            player.select_move(&board, side)?
        } else {
            Move::Pass
        };

        board = board.apply(mv, side)?;
        trace!("{side} plays {mv}");
        observe(&board, side, mv);
        moves.push((side, mv));
    }

    let outcome = board.winner().unwrap_or(Outcome::Draw);
    let score = board.score();
    Ok(GameRecord {
        moves,
        outcome,
        score,
        final_board: board,
    })
}

/// Which of the two series players won a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesResult {
    P1,
    P2,
    Draw,
}

/// Running totals of a series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeriesStats {
    pub p1_wins: u32,
    pub p2_wins: u32,
    pub draws: u32,
}

impl SeriesStats {
    pub fn games(&self) -> u32 {
        self.p1_wins + self.p2_wins + self.draws
    }

    pub fn record(&mut self, result: SeriesResult) {
        match result {
            SeriesResult::P1 => self.p1_wins += 1,
            SeriesResult::P2 => self.p2_wins += 1,
            SeriesResult::Draw => self.draws += 1,
        }
    }
}

/// The colour player 1 takes in game `game` (1-based): Black on odd games,
/// White on even ones.
pub fn p1_side(game: u32) -> Side {
    if game % 2 == 1 { Side::Black } else { Side::White }
}

/// Play `games` games between `p1` and `p2`, alternating colours, and call
/// `on_game` after each with the game number and its record.
pub fn run_series<F>(
    p1: &mut dyn Player,
    p2: &mut dyn Player,
    games: u32,
    mut on_game: F,
) -> Result<SeriesStats>
where
    F: FnMut(u32, &GameRecord, SeriesResult),
{
    let mut stats = SeriesStats::default();

    for game in 1..=games {
        let p1_colour = p1_side(game);
        let record = match p1_colour {
            Side::Black => play_game(&mut *p1, &mut *p2)?,
            Side::White => play_game(&mut *p2, &mut *p1)?,
        };
        let result = match record.outcome {
            Outcome::Win(side) if side == p1_colour => SeriesResult::P1,
            Outcome::Win(_) => SeriesResult::P2,
            Outcome::Draw => SeriesResult::Draw,
        };
        stats.record(result);

        let (b, w) = record.score;
        info!(
            "game {game}/{games}: {} as {p1_colour}, {} ({b}-{w}), P1 {} P2 {} draws {}",
            p1.name(),
            record.outcome,
            stats.p1_wins,
            stats.p2_wins,
            stats.draws
        );
        on_game(game, &record, result);
    }

    Ok(stats)
}
