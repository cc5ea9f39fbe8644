//! Textual output: a machine-readable dump and a human-oriented rendering.

use crate::board::{ActivePlayer, LevelState, Position, Tile};
use crate::generator::GeneratedLevel;
use std::fmt;
use std::fmt::Write as _;

/// Machine dump of a state with the player token placed.
///
/// One `"{x},{y},{code}"` line per cell, rows outer and columns inner, white
/// grid first, then the black grid, the player cell with a white-active flag,
/// and the exit, each section separated by a blank line.
///
/// # Panics
///
/// Panics if no player token is on the active grid.
pub fn dump_state(state: &LevelState) -> String {
    let mut out = String::new();
    for tag in [ActivePlayer::White, ActivePlayer::Black] {
        for y in 0..state.height() {
            for x in 0..state.width() {
                let code = state.tile_on(tag, Position::new(x, y)).code();
                let _ = writeln!(out, "{x},{y},{code}");
            }
        }
        out.push('\n');
    }

    let player = state.player_pos();
    let white = (state.active_player() == ActivePlayer::White) as u8;
    let _ = writeln!(out, "{},{},{}", player.x, player.y, white);
    out.push('\n');

    let exit = state.exit_pos();
    let _ = writeln!(out, "{},{}", exit.x, exit.y);
    out
}

/// Machine dump of a generated level's initial state.
pub fn dump_level(level: &GeneratedLevel) -> String {
    dump_state(&level.state)
}

fn write_grid(f: &mut fmt::Formatter<'_>, state: &LevelState, tag: ActivePlayer) -> fmt::Result {
    for y in 0..state.height() {
        for x in 0..state.width() {
            write!(f, "{}", state.tile_on(tag, Position::new(x, y)).glyph())?;
        }
        writeln!(f)?;
    }
    Ok(())
}

impl fmt::Display for LevelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "white:")?;
        write_grid(f, self, ActivePlayer::White)?;
        writeln!(f, "black:")?;
        write_grid(f, self, ActivePlayer::Black)?;
        writeln!(f, "active: {}", match self.active_player() {
            ActivePlayer::White => "white",
            ActivePlayer::Black => "black",
        })?;
        writeln!(f, "outcome: {}", self.outcome())?;
        writeln!(f, "exit: {}", self.exit_pos())
    }
}

/// Human rendering of a generated level: both grids, the start cell and the
/// move list as a glyph string.
pub fn render_level(level: &GeneratedLevel) -> String {
    let moves: String = level.moves.iter().map(|mv| mv.glyph()).collect();
    format!("{}start: {}\nmoves: {}\n", level.state, level.start, moves)
}
