//! Core engine for ShadeChange, a sliding-token puzzle played across two
//! parallel grids.
//!
//! The player token slides until something stops it; a swap move flips
//! which of the two grids is live. This crate models the boards, applies
//! moves, solves levels by iterative deepening, and generates levels
//! backwards from the exit, validating each candidate with the solver so
//! the shortest solution has exactly the requested length.

pub mod board;
mod engine;
pub mod error;
pub mod generator;
pub mod render;
pub mod solver;

pub use board::{ActivePlayer, LevelState, Move, MoveOutcome, Position, Tile};
pub use error::GenerateError;
pub use generator::{movement_count, GeneratedLevel, Generator, GeneratorConfig};
pub use solver::{Solver, MAX_SOLVE_DEPTH};
