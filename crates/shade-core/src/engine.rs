//! State transition engine.
//!
//! `LevelState::apply` is the single entry point: it copies the state,
//! resolves one move against the copy and records the outcome on it.

use crate::board::{LevelState, Move, MoveOutcome, Position, Tile};

/// What a single one-cell step attempt did for one entity.
enum StepResult {
    /// The whole move is over with this outcome.
    Ended(MoveOutcome),
    /// The entity advanced one cell and may advance again next round.
    Moved(Position),
    /// The entity is pinned for the rest of this move.
    Stopped,
}

impl LevelState {
    /// Apply one move, returning the derived state. The receiver is never
    /// mutated; the returned state's `outcome` reports what happened.
    ///
    /// # Panics
    ///
    /// Panics if no player token is on the active grid.
    pub fn apply(&self, mv: Move) -> LevelState {
        let mut next = self.clone();
        let outcome = match mv {
            Move::Up => next.apply_direction(0, -1),
            Move::Down => next.apply_direction(0, 1),
            Move::Left => next.apply_direction(-1, 0),
            Move::Right => next.apply_direction(1, 0),
            Move::Change => next.apply_change(),
        };
        next.set_outcome(outcome);
        next
    }

    /// Slide every entity on the active grid one step at a time until no
    /// entity can advance. All entities step once per round; an entity that
    /// is stopped drops out of the remaining rounds of this move.
    fn apply_direction(&mut self, dx: i32, dy: i32) -> MoveOutcome {
        let mut entities: Vec<Position> = Vec::new();
        for x in 0..self.width() {
            for y in 0..self.height() {
                let pos = Position::new(x, y);
                if matches!(self.tile(pos), Tile::Player | Tile::Enemy) {
                    entities.push(pos);
                }
            }
        }
        assert!(
            entities.iter().any(|&p| self.tile(p) == Tile::Player),
            "no player token on the active grid"
        );

        let mut any_moved = false;
        while !entities.is_empty() {
            let mut still_sliding = Vec::with_capacity(entities.len());
            for &pos in &entities {
                match self.step_entity(pos, dx, dy) {
                    StepResult::Ended(outcome) => return outcome,
                    StepResult::Moved(next) => {
                        any_moved = true;
                        still_sliding.push(next);
                    }
                    StepResult::Stopped => {}
                }
            }
            entities = still_sliding;
        }

        if any_moved {
            MoveOutcome::Moved
        } else {
            MoveOutcome::Nothing
        }
    }

    /// Attempt a single one-cell step for the entity at `pos`.
    fn step_entity(&mut self, pos: Position, dx: i32, dy: i32) -> StepResult {
        let tile = self.tile(pos);
        debug_assert!(matches!(tile, Tile::Player | Tile::Enemy));
        let is_player = tile == Tile::Player;
        let next = pos.offset(dx, dy);

        // Ending conditions take precedence and leave the board untouched.
        if is_player && next == self.exit_pos() {
            return StepResult::Ended(MoveOutcome::PlayerWon);
        }
        if is_player && self.is_killing(next) {
            return StepResult::Ended(MoveOutcome::PlayerKilled);
        }
        if !is_player && self.tile(next) == Tile::Player {
            return StepResult::Ended(MoveOutcome::PlayerKilled);
        }
        if !is_player && next == self.exit_pos() {
            return StepResult::Ended(MoveOutcome::EnemyWon);
        }

        if self.is_stopping(next) {
            return StepResult::Stopped;
        }

        self.set_tile(next, tile);
        self.set_tile(pos, Tile::Blank);
        StepResult::Moved(next)
    }

    /// Swap the active grid, keeping the player's coordinates. The player
    /// lands on whatever the other grid holds at that cell.
    fn apply_change(&mut self) -> MoveOutcome {
        let pos = self.player_pos();
        self.set_tile(pos, Tile::Blank);
        self.toggle_active_player();

        if self.is_stopping(pos) {
            return MoveOutcome::PlayerCrushed;
        }
        if self.is_killing(pos) {
            return MoveOutcome::PlayerKilled;
        }

        self.set_tile(pos, Tile::Player);
        MoveOutcome::Changed
    }
}

#[cfg(test)]
mod tests {
    use crate::board::{ActivePlayer, LevelState, Move, MoveOutcome, Position, Tile};

    fn base(exit: Position) -> LevelState {
        LevelState::new(4, 4, exit)
    }

    #[test]
    fn sliding_into_the_exit_wins() {
        let mut state = base(Position::new(0, -1));
        state.set_tile(Position::new(0, 3), Tile::Player);
        let next = state.apply(Move::Up);
        assert_eq!(next.outcome(), MoveOutcome::PlayerWon);
    }

    #[test]
    fn sliding_against_the_edge_does_nothing() {
        let mut state = base(Position::new(0, -1));
        state.set_tile(Position::new(0, 0), Tile::Player);
        let next = state.apply(Move::Left);
        assert_eq!(next.outcome(), MoveOutcome::Nothing);
        assert_eq!(next.tile(Position::new(0, 0)), Tile::Player);
    }

    #[test]
    fn a_block_pins_the_slide_one_cell_short() {
        let mut state = base(Position::new(0, -1));
        state.set_tile(Position::new(0, 0), Tile::Player);
        state.set_tile(Position::new(2, 0), Tile::Block);

        let next = state.apply(Move::Right);
        assert_eq!(next.outcome(), MoveOutcome::Moved);
        assert_eq!(next.tile(Position::new(1, 0)), Tile::Player);

        let again = next.apply(Move::Right);
        assert_eq!(again.outcome(), MoveOutcome::Nothing);
        assert_eq!(again.tile(Position::new(1, 0)), Tile::Player);
    }

    #[test]
    fn swapping_onto_a_block_crushes_the_player() {
        let mut state = base(Position::new(0, -1));
        state.set_tile(Position::new(0, 0), Tile::Player);
        state.set_tile(Position::new(3, 0), Tile::Block);
        state.set_tile_on(ActivePlayer::Black, Position::new(2, 0), Tile::Block);

        let next = state.apply(Move::Right);
        assert_eq!(next.outcome(), MoveOutcome::Moved);
        assert_eq!(next.tile(Position::new(2, 0)), Tile::Player);

        let swapped = next.apply(Move::Change);
        assert_eq!(swapped.outcome(), MoveOutcome::PlayerCrushed);
    }

    #[test]
    fn enemies_slide_in_the_same_resolution() {
        let mut state = base(Position::new(0, -1));
        state.set_tile(Position::new(0, 0), Tile::Player);
        state.set_tile(Position::new(2, 0), Tile::Enemy);

        let next = state.apply(Move::Right);
        assert_eq!(next.outcome(), MoveOutcome::PlayerKilled);
        assert_eq!(next.tile(Position::new(3, 0)), Tile::Enemy);
    }

    #[test]
    fn an_enemy_reaching_the_exit_wins_for_the_enemy() {
        let mut state = base(Position::new(0, -1));
        state.set_tile(Position::new(1, 1), Tile::Player);
        state.set_tile(Position::new(0, 0), Tile::Enemy);

        let next = state.apply(Move::Up);
        assert_eq!(next.outcome(), MoveOutcome::EnemyWon);
    }

    #[test]
    fn swapping_twice_round_trips_the_tag_but_not_the_grid() {
        let mut state = base(Position::new(0, -1));
        state.set_tile(Position::new(1, 2), Tile::Player);
        state.set_tile_on(ActivePlayer::Black, Position::new(3, 3), Tile::Block);

        let once = state.apply(Move::Change);
        assert_eq!(once.outcome(), MoveOutcome::Changed);
        assert_eq!(once.active_player(), ActivePlayer::Black);

        let twice = once.apply(Move::Change);
        assert_eq!(twice.outcome(), MoveOutcome::Changed);
        assert_eq!(twice.active_player(), ActivePlayer::White);
        // The black grid keeps its own contents; only the tag round-trips.
        assert_eq!(
            twice.tile_on(ActivePlayer::Black, Position::new(3, 3)),
            Tile::Block
        );
    }

    #[test]
    fn apply_never_mutates_its_input() {
        let mut state = base(Position::new(0, -1));
        state.set_tile(Position::new(0, 3), Tile::Player);
        let before = state.clone();
        let _ = state.apply(Move::Right);
        assert_eq!(state, before);
    }

    #[test]
    fn swapping_onto_a_hazard_kills_the_player() {
        let mut state = base(Position::new(0, -1));
        state.set_tile(Position::new(1, 2), Tile::Player);
        state.set_tile_on(ActivePlayer::Black, Position::new(1, 2), Tile::Spiral);
        let next = state.apply(Move::Change);
        assert_eq!(next.outcome(), MoveOutcome::PlayerKilled);
    }
}
