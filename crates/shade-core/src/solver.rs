//! Shortest-solution search.
//!
//! Iterative deepening depth-first search over the five moves. Shallower
//! depth bounds are exhausted before deeper ones are tried, so the first
//! sequence found is always of minimum length.

use crate::board::{LevelState, Move, MoveOutcome};

/// Depth-bound ceiling for the default entry point. Generated levels are
/// far shallower than this; exhausting it means a caller broke the
/// "only hand the solver solvable states" contract.
pub const MAX_SOLVE_DEPTH: usize = 24;

/// Stateless solver; all state is per-call.
pub struct Solver;

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver {
    pub fn new() -> Self {
        Self
    }

    /// Shortest winning move sequence for a state with the player placed.
    ///
    /// # Panics
    ///
    /// Panics if no solution exists within [`MAX_SOLVE_DEPTH`] moves;
    /// callers must never present an unsolvable state.
    pub fn solve(&self, state: &LevelState) -> Vec<Move> {
        self.solve_within(state, MAX_SOLVE_DEPTH).unwrap_or_else(|| {
            panic!("state believed solvable has no solution within {MAX_SOLVE_DEPTH} moves")
        })
    }

    /// Shortest winning move sequence of at most `max_depth` moves, or
    /// `None` if there is none. Validation passes use this with a tight cap,
    /// where "nothing within the cap" is an expected answer.
    pub fn solve_within(&self, state: &LevelState, max_depth: usize) -> Option<Vec<Move>> {
        for bound in 1..=max_depth {
            let mut path = Vec::with_capacity(bound);
            if self.bounded_dfs(state, bound, &mut path) {
                return Some(path);
            }
        }
        None
    }

    /// Depth-first search trying every move in enumeration order.
    fn bounded_dfs(&self, state: &LevelState, remaining: usize, path: &mut Vec<Move>) -> bool {
        for mv in Move::ALL {
            let next = state.apply(mv);
            match next.outcome() {
                MoveOutcome::PlayerWon => {
                    path.push(mv);
                    return true;
                }
                outcome if outcome.is_ending() => continue,
                // A move that changed nothing cannot be on a shortest path.
                MoveOutcome::Nothing => continue,
                _ => {
                    if remaining > 1 {
                        path.push(mv);
                        if self.bounded_dfs(&next, remaining - 1, path) {
                            return true;
                        }
                        path.pop();
                    }
                }
            }
        }
        false
    }
}
