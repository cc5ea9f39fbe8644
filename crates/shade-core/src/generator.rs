//! Level construction.
//!
//! The generator builds a level backwards from the exit: each movement
//! action picks a source cell whose slide would stop exactly at the current
//! anchor, turning the cell just past the anchor solid so that arrival
//! point is unique. Swaps and tile placements interleave with movements in
//! a depth-first backtracking search over reversible actions. A candidate
//! is only accepted once a replay of the assembled move list wins and the
//! solver confirms the shortest solution has exactly the requested number
//! of directional moves.

use crate::board::{ActivePlayer, LevelState, Move, MoveOutcome, Position, Tile};
use crate::error::GenerateError;
use crate::solver::Solver;
use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parameters for one generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub width: i32,
    pub height: i32,
    /// Directional moves the shortest solution must have.
    pub steps: usize,
    /// Board swaps the constructed move list contains.
    pub swaps: usize,
    /// Free blocks placed beyond the slide stoppers.
    pub blocks: usize,
    /// Place one enemy entity.
    pub enable_enemy: bool,
    /// Place spiral hazards, including the decorative ones.
    pub enable_spiral: bool,
    /// Whole-level retries before giving up.
    pub max_attempts: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            width: 4,
            height: 4,
            steps: 3,
            swaps: 0,
            blocks: 0,
            enable_enemy: false,
            enable_spiral: false,
            max_attempts: 50,
        }
    }
}

/// A finished level: the state with the player token placed at `start`,
/// and the move list the level was built around.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedLevel {
    pub state: LevelState,
    pub start: Position,
    pub moves: Vec<Move>,
}

/// Number of directional moves in a sequence; board swaps do not count.
pub fn movement_count(moves: &[Move]) -> usize {
    moves.iter().filter(|mv| !matches!(mv, Move::Change)).count()
}

/// Level generator with an explicit, seedable randomness source.
pub struct Generator {
    config: GeneratorConfig,
    rng: StdRng,
}

impl Generator {
    /// Create a generator seeded from entropy.
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a generator with a fixed seed for reproducible output.
    pub fn with_seed(config: GeneratorConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Build a level whose shortest solution has exactly `steps` directional
    /// moves, retrying with a fresh random exit up to `max_attempts` times.
    pub fn generate(&mut self) -> Result<GeneratedLevel, GenerateError> {
        if self.config.width <= 0 || self.config.height <= 0 {
            return Err(GenerateError::InvalidConfig("grid extents must be positive"));
        }
        if self.config.steps == 0 {
            return Err(GenerateError::InvalidConfig("target step count must be at least 1"));
        }
        // Swaps never repeat back to back and the final move is always a
        // slide, so at most one swap fits before each step.
        if self.config.swaps > self.config.steps {
            return Err(GenerateError::InvalidConfig(
                "swap count cannot exceed the step count",
            ));
        }

        for attempt in 1..=self.config.max_attempts {
            let exit = self.random_exit();
            debug!("attempt {attempt}: exit at {exit}");

            let mut searcher = LevelSearcher::new(&self.config, exit);
            let Some(mut level) = searcher.search(&mut self.rng) else {
                continue;
            };
            if !self.decorate(&mut level) {
                debug!("attempt {attempt}: hazard decoration ran out of cells");
                continue;
            }
            debug!(
                "attempt {attempt}: accepted level starting at {} with {} actions",
                level.start,
                level.moves.len()
            );
            return Ok(level);
        }

        Err(GenerateError::Exhausted {
            attempts: self.config.max_attempts,
        })
    }

    /// A position one cell outside a uniformly chosen edge.
    fn random_exit(&mut self) -> Position {
        let (width, height) = (self.config.width, self.config.height);
        let x = self.rng.gen_range(-1..=width);
        if x == -1 || x == width {
            Position::new(x, self.rng.gen_range(0..height))
        } else {
            let y = if self.rng.gen_bool(0.5) { -1 } else { height };
            Position::new(x, y)
        }
    }

    /// Add one decorative spiral to each board, keeping the level solvable.
    ///
    /// Solvability is re-checked per candidate; the exact-length guarantee
    /// is not, so a decorative spiral may shorten routes as long as a win
    /// still exists. Running out of candidates fails the whole attempt.
    fn decorate(&mut self, level: &mut GeneratedLevel) -> bool {
        if !self.config.enable_spiral {
            return true;
        }
        let solver = Solver::new();
        let cap = self.config.steps + self.config.swaps;

        for tag in [ActivePlayer::White, ActivePlayer::Black] {
            let mut candidates: Vec<Position> = Vec::new();
            for y in 0..level.state.height() {
                for x in 0..level.state.width() {
                    let pos = Position::new(x, y);
                    if level.state.tile_on(tag, pos) == Tile::Blank {
                        candidates.push(pos);
                    }
                }
            }
            candidates.shuffle(&mut self.rng);

            let mut placed = false;
            for pos in candidates {
                level.state.set_tile_on(tag, pos, Tile::Spiral);
                if solver.solve_within(&level.state, cap).is_some() {
                    placed = true;
                    break;
                }
                level.state.set_tile_on(tag, pos, Tile::Blank);
            }
            if !placed {
                return false;
            }
        }
        true
    }
}

/// Shrinking resource counters consumed by generator actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Budget {
    moves: usize,
    swaps: usize,
    blocks: usize,
    enemies: usize,
    spirals: usize,
}

impl Budget {
    fn from_config(config: &GeneratorConfig) -> Self {
        Self {
            moves: config.steps,
            swaps: config.swaps,
            blocks: config.blocks,
            enemies: config.enable_enemy as usize,
            spirals: config.enable_spiral as usize,
        }
    }

    fn exhausted(&self) -> bool {
        self.moves == 0
            && self.swaps == 0
            && self.blocks == 0
            && self.enemies == 0
            && self.spirals == 0
    }
}

/// One reversible construction step. Apply and undo are exact inverses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GeneratorAction {
    /// Slide carrying the player from `source` to the anchor of the moment;
    /// `stopper` is the cell turned solid to pin the arrival, `None` when
    /// the wall or an existing block already stops the slide.
    Movement {
        mv: Move,
        source: Position,
        stopper: Option<Position>,
    },
    Swap,
    PlaceBlock(Position),
    PlaceEnemy(Position),
    PlaceSpiral(Position),
}

/// A pushed action together with what undo must restore.
#[derive(Debug, Clone, Copy)]
struct AppliedAction {
    action: GeneratorAction,
    prev_anchor: Position,
}

/// Working state of one backtracking search: the boards under construction,
/// the budget, the backward anchor and the undo stack.
struct LevelSearcher {
    state: LevelState,
    budget: Budget,
    /// Where the player is at this point of play, walking backwards in time.
    /// Starts at the exit, ends at the level's start cell.
    anchor: Position,
    actions: Vec<AppliedAction>,
    /// Cells crossed by constructed slides, per grid. Placements must not
    /// touch them or the replayed slides would stop short.
    protected: HashMap<(ActivePlayer, Position), usize>,
    target_steps: usize,
    total_swaps: usize,
}

impl LevelSearcher {
    fn new(config: &GeneratorConfig, exit: Position) -> Self {
        let mut state = LevelState::new(config.width, config.height, exit);
        // The construction walks backwards from the end of play; an odd
        // number of swaps means play ends on the black grid.
        if config.swaps % 2 == 1 {
            state.set_active_player(ActivePlayer::Black);
        }
        Self {
            state,
            budget: Budget::from_config(config),
            anchor: exit,
            actions: Vec::new(),
            protected: HashMap::new(),
            target_steps: config.steps,
            total_swaps: config.swaps,
        }
    }

    /// Depth-first backtracking over the action set. Every action consumes
    /// one budget unit, so the depth is bounded by the budget sum.
    fn search(&mut self, rng: &mut StdRng) -> Option<GeneratedLevel> {
        if self.budget.exhausted() {
            return self.finalize();
        }

        let mut candidates = Vec::new();
        if self.budget.moves > 0 {
            self.movement_candidates(&mut candidates);
        }
        if self.state.in_bounds(self.anchor) {
            self.swap_candidate(&mut candidates);
            self.placement_candidates(&mut candidates);
        }
        candidates.shuffle(rng);

        for action in candidates {
            self.apply(action);
            if let Some(level) = self.search(rng) {
                return Some(level);
            }
            self.undo();
        }
        None
    }

    /// Check a fully budgeted action sequence and assemble the level.
    fn finalize(&self) -> Option<GeneratedLevel> {
        let start = self.anchor;
        if !self.state.in_bounds(start) {
            return None;
        }
        assert_eq!(
            self.state.active_player(),
            ActivePlayer::White,
            "construction must finish on the white grid"
        );

        let mut state = self.state.clone();
        state.set_tile(start, Tile::Player);
        let moves = self.forward_moves();

        if !replay_wins(&state, &moves) {
            return None;
        }

        // The decisive check: the shortest solution must spend exactly the
        // target number of directional moves, or the level has an
        // unintended shortcut.
        let cap = self.target_steps + self.total_swaps;
        let solution = Solver::new().solve_within(&state, cap)?;
        if movement_count(&solution) != self.target_steps {
            return None;
        }

        Some(GeneratedLevel { state, start, moves })
    }

    /// The move list in play order. Actions were applied backwards, so the
    /// stack is reversed; placements contribute no move.
    fn forward_moves(&self) -> Vec<Move> {
        self.actions
            .iter()
            .rev()
            .filter_map(|applied| match applied.action {
                GeneratorAction::Movement { mv, .. } => Some(mv),
                GeneratorAction::Swap => Some(Move::Change),
                _ => None,
            })
            .collect()
    }

    /// Movement actions whose forward slide stops exactly at the anchor.
    fn movement_candidates(&self, out: &mut Vec<GeneratorAction>) {
        let anchor = self.anchor;

        if !self.state.in_bounds(anchor) {
            // Rooted at the exit: the forward-final slide leaves the grid,
            // so no stopper is ever needed.
            let (mv, entry) = self.exit_entry();
            let (dx, dy) = mv.delta().expect("exit entry move is directional");
            let mut source = entry;
            while self.state.in_bounds(source) && self.state.tile(source) == Tile::Blank {
                out.push(GeneratorAction::Movement {
                    mv,
                    source,
                    stopper: None,
                });
                source = source.offset(-dx, -dy);
            }
            return;
        }

        debug_assert_eq!(self.state.tile(anchor), Tile::Blank);
        for mv in Move::DIRECTIONS {
            let (dx, dy) = mv.delta().expect("directional move has a delta");

            let past = anchor.offset(dx, dy);
            // A slide stopping here would instead escape through the exit.
            if past == self.state.exit_pos() {
                continue;
            }
            let stopper = match self.state.tile(past) {
                Tile::OutOfBounds | Tile::Block => None,
                Tile::Blank if !self.is_protected(self.state.active_player(), past) => Some(past),
                _ => continue,
            };

            let mut source = anchor.offset(-dx, -dy);
            while self.state.in_bounds(source) && self.state.tile(source) == Tile::Blank {
                out.push(GeneratorAction::Movement { mv, source, stopper });
                source = source.offset(-dx, -dy);
            }
        }
    }

    /// The board swap, offered when the mirrored cell on the other grid is
    /// free. Back-to-back swaps cancel out and are never offered.
    fn swap_candidate(&self, out: &mut Vec<GeneratorAction>) {
        if self.budget.swaps == 0 {
            return;
        }
        if matches!(
            self.actions.last(),
            Some(AppliedAction {
                action: GeneratorAction::Swap,
                ..
            })
        ) {
            return;
        }
        let other = self.state.active_player().toggled();
        if self.state.tile_on(other, self.anchor) == Tile::Blank {
            out.push(GeneratorAction::Swap);
        }
    }

    /// Block and hazard placements on blank cells sharing neither row nor
    /// column with the anchor, and off every constructed slide path.
    fn placement_candidates(&self, out: &mut Vec<GeneratorAction>) {
        if self.budget.blocks == 0 && self.budget.enemies == 0 && self.budget.spirals == 0 {
            return;
        }
        let tag = self.state.active_player();
        for y in 0..self.state.height() {
            for x in 0..self.state.width() {
                let pos = Position::new(x, y);
                if pos.x == self.anchor.x || pos.y == self.anchor.y {
                    continue;
                }
                if self.state.tile(pos) != Tile::Blank || self.is_protected(tag, pos) {
                    continue;
                }
                if self.budget.blocks > 0 {
                    out.push(GeneratorAction::PlaceBlock(pos));
                }
                if self.budget.enemies > 0 {
                    out.push(GeneratorAction::PlaceEnemy(pos));
                }
                if self.budget.spirals > 0 {
                    out.push(GeneratorAction::PlaceSpiral(pos));
                }
            }
        }
    }

    /// The move entering the exit and the boundary cell it is taken from.
    fn exit_entry(&self) -> (Move, Position) {
        let exit = self.state.exit_pos();
        if exit.x == -1 {
            (Move::Left, Position::new(0, exit.y))
        } else if exit.x == self.state.width() {
            (Move::Right, Position::new(self.state.width() - 1, exit.y))
        } else if exit.y == -1 {
            (Move::Up, Position::new(exit.x, 0))
        } else {
            (Move::Down, Position::new(exit.x, self.state.height() - 1))
        }
    }

    fn apply(&mut self, action: GeneratorAction) {
        let prev_anchor = self.anchor;
        match action {
            GeneratorAction::Movement { mv, source, stopper } => {
                assert!(self.budget.moves > 0, "movement with an exhausted counter");
                if let Some(pos) = stopper {
                    self.state.set_tile(pos, Tile::Block);
                }
                self.mark_path(mv, source, prev_anchor, true);
                self.anchor = source;
                self.budget.moves -= 1;
            }
            GeneratorAction::Swap => {
                assert!(self.budget.swaps > 0, "swap with an exhausted counter");
                // The player rests on this cell on both grids across the
                // swap, so shield it on both.
                let tag = self.state.active_player();
                self.mark(tag, prev_anchor, true);
                self.mark(tag.toggled(), prev_anchor, true);
                self.state.toggle_active_player();
                self.budget.swaps -= 1;
            }
            GeneratorAction::PlaceBlock(pos) => {
                assert!(self.budget.blocks > 0, "block placement with an exhausted counter");
                self.state.set_tile(pos, Tile::Block);
                self.budget.blocks -= 1;
            }
            GeneratorAction::PlaceEnemy(pos) => {
                assert!(self.budget.enemies > 0, "enemy placement with an exhausted counter");
                self.state.set_tile(pos, Tile::Enemy);
                self.budget.enemies -= 1;
            }
            GeneratorAction::PlaceSpiral(pos) => {
                assert!(self.budget.spirals > 0, "spiral placement with an exhausted counter");
                self.state.set_tile(pos, Tile::Spiral);
                self.budget.spirals -= 1;
            }
        }
        self.actions.push(AppliedAction { action, prev_anchor });
    }

    fn undo(&mut self) {
        let AppliedAction { action, prev_anchor } = self
            .actions
            .pop()
            .expect("undo on an empty action stack");
        match action {
            GeneratorAction::Movement { mv, source, stopper } => {
                self.mark_path(mv, source, prev_anchor, false);
                if let Some(pos) = stopper {
                    self.state.set_tile(pos, Tile::Blank);
                }
                self.budget.moves += 1;
            }
            GeneratorAction::Swap => {
                self.state.toggle_active_player();
                let tag = self.state.active_player();
                self.mark(tag, prev_anchor, false);
                self.mark(tag.toggled(), prev_anchor, false);
                self.budget.swaps += 1;
            }
            GeneratorAction::PlaceBlock(pos) => {
                self.state.set_tile(pos, Tile::Blank);
                self.budget.blocks += 1;
            }
            GeneratorAction::PlaceEnemy(pos) => {
                self.state.set_tile(pos, Tile::Blank);
                self.budget.enemies += 1;
            }
            GeneratorAction::PlaceSpiral(pos) => {
                self.state.set_tile(pos, Tile::Blank);
                self.budget.spirals += 1;
            }
        }
        self.anchor = prev_anchor;
    }

    /// Shield (or release) every cell of a slide on the current grid, from
    /// the source up to the anchor or the grid edge.
    fn mark_path(&mut self, mv: Move, source: Position, anchor: Position, shield: bool) {
        let (dx, dy) = mv.delta().expect("directional move has a delta");
        let tag = self.state.active_player();
        let mut pos = source;
        loop {
            self.mark(tag, pos, shield);
            if pos == anchor {
                break;
            }
            pos = pos.offset(dx, dy);
            if !self.state.in_bounds(pos) {
                break;
            }
        }
    }

    fn mark(&mut self, tag: ActivePlayer, pos: Position, shield: bool) {
        let key = (tag, pos);
        if shield {
            *self.protected.entry(key).or_insert(0) += 1;
        } else {
            let count = self
                .protected
                .get_mut(&key)
                .expect("releasing a cell that was never shielded");
            *count -= 1;
            if *count == 0 {
                self.protected.remove(&key);
            }
        }
    }

    fn is_protected(&self, tag: ActivePlayer, pos: Position) -> bool {
        self.protected.contains_key(&(tag, pos))
    }
}

/// Replay a move list from its initial state: every intermediate outcome
/// must keep the game alive and actually do something, and the final move
/// must win.
fn replay_wins(initial: &LevelState, moves: &[Move]) -> bool {
    let mut state = initial.clone();
    for (i, &mv) in moves.iter().enumerate() {
        state = state.apply(mv);
        let last = i + 1 == moves.len();
        match state.outcome() {
            MoveOutcome::PlayerWon => return last,
            MoveOutcome::Nothing => return false,
            outcome if outcome.is_ending() => return false,
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_config(steps: usize) -> GeneratorConfig {
        GeneratorConfig {
            steps,
            ..GeneratorConfig::default()
        }
    }

    fn assert_replay_wins(level: &GeneratedLevel) {
        let mut state = level.state.clone();
        for (i, &mv) in level.moves.iter().enumerate() {
            state = state.apply(mv);
            if i + 1 == level.moves.len() {
                assert_eq!(state.outcome(), MoveOutcome::PlayerWon);
            } else {
                assert!(!state.outcome().is_ending(), "level died mid-replay");
            }
        }
    }

    #[test]
    fn shortest_solution_matches_the_target_exactly() {
        let mut generator = Generator::with_seed(plain_config(3), 42);
        let level = generator.generate().expect("generation should succeed");

        assert_eq!(movement_count(&level.moves), 3);
        let solution = Solver::new()
            .solve_within(&level.state, 3)
            .expect("generated level must be solvable");
        assert_eq!(movement_count(&solution), 3);
        // No shorter solution may exist.
        assert_eq!(Solver::new().solve_within(&level.state, 2), None);
    }

    #[test]
    fn the_constructed_move_list_replays_to_a_win() {
        let mut generator = Generator::with_seed(plain_config(4), 7);
        let level = generator.generate().expect("generation should succeed");
        assert_replay_wins(&level);
    }

    #[test]
    fn free_blocks_are_all_placed() {
        let config = GeneratorConfig {
            steps: 3,
            blocks: 1,
            ..GeneratorConfig::default()
        };
        let mut generator = Generator::with_seed(config, 11);
        let level = generator.generate().expect("generation should succeed");

        assert_replay_wins(&level);
        // At least the free block must be on the boards; stoppers may add more.
        let mut blocks = 0;
        for tag in [ActivePlayer::White, ActivePlayer::Black] {
            for y in 0..level.state.height() {
                for x in 0..level.state.width() {
                    if level.state.tile_on(tag, Position::new(x, y)) == Tile::Block {
                        blocks += 1;
                    }
                }
            }
        }
        assert!(blocks >= 1);
    }

    #[test]
    fn a_requested_swap_appears_in_the_move_list() {
        let config = GeneratorConfig {
            steps: 2,
            swaps: 1,
            ..GeneratorConfig::default()
        };
        let mut generator = Generator::with_seed(config, 3);
        let level = generator.generate().expect("generation should succeed");

        let swaps = level.moves.iter().filter(|m| **m == Move::Change).count();
        assert_eq!(swaps, 1);
        assert_eq!(movement_count(&level.moves), 2);
        // Play starts on the white grid even though it ends on the black one.
        assert_eq!(level.state.active_player(), ActivePlayer::White);
        assert_replay_wins(&level);
    }

    #[test]
    fn hazards_are_placed_when_enabled() {
        let config = GeneratorConfig {
            steps: 1,
            enable_enemy: true,
            enable_spiral: true,
            max_attempts: 100,
            ..GeneratorConfig::default()
        };
        let mut generator = Generator::with_seed(config, 5);
        let level = generator.generate().expect("generation should succeed");

        let count = |tag: ActivePlayer, tile: Tile| {
            let mut n = 0;
            for y in 0..level.state.height() {
                for x in 0..level.state.width() {
                    if level.state.tile_on(tag, Position::new(x, y)) == tile {
                        n += 1;
                    }
                }
            }
            n
        };
        assert_eq!(count(ActivePlayer::White, Tile::Enemy), 1);
        // One spiral from the budget plus one decorative spiral per board.
        assert!(count(ActivePlayer::White, Tile::Spiral) >= 1);
        assert!(count(ActivePlayer::Black, Tile::Spiral) >= 1);
        assert_replay_wins(&level);
    }

    #[test]
    fn the_same_seed_reproduces_the_same_level() {
        let config = GeneratorConfig {
            steps: 3,
            blocks: 1,
            ..GeneratorConfig::default()
        };
        let a = Generator::with_seed(config.clone(), 99).generate().unwrap();
        let b = Generator::with_seed(config, 99).generate().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn impossible_parameters_surface_exhaustion() {
        let config = GeneratorConfig {
            width: 1,
            height: 1,
            steps: 2,
            max_attempts: 3,
            ..GeneratorConfig::default()
        };
        let mut generator = Generator::with_seed(config, 1);
        assert_eq!(
            generator.generate(),
            Err(GenerateError::Exhausted { attempts: 3 })
        );
    }

    #[test]
    fn zero_steps_is_rejected_up_front() {
        let config = GeneratorConfig {
            steps: 0,
            ..GeneratorConfig::default()
        };
        let mut generator = Generator::with_seed(config, 1);
        assert!(matches!(
            generator.generate(),
            Err(GenerateError::InvalidConfig(_))
        ));
    }

    #[test]
    fn more_swaps_than_steps_is_rejected_up_front() {
        let config = GeneratorConfig {
            steps: 1,
            swaps: 2,
            ..GeneratorConfig::default()
        };
        let mut generator = Generator::with_seed(config, 1);
        assert_eq!(
            generator.generate(),
            Err(GenerateError::InvalidConfig(
                "swap count cannot exceed the step count"
            ))
        );
    }

    #[test]
    fn a_level_survives_json_serialization() {
        let mut generator = Generator::with_seed(plain_config(2), 21);
        let level = generator.generate().expect("generation should succeed");
        let json = serde_json::to_string(&level).unwrap();
        let back: GeneratedLevel = serde_json::from_str(&json).unwrap();
        assert_eq!(level, back);
    }

    #[test]
    fn start_and_exit_are_consistent_with_the_state() {
        let mut generator = Generator::with_seed(plain_config(2), 13);
        let level = generator.generate().expect("generation should succeed");

        assert!(level.state.in_bounds(level.start));
        assert_eq!(level.state.tile(level.start), Tile::Player);
        assert_eq!(level.state.active_player(), ActivePlayer::White);
        assert!(!level.state.in_bounds(level.state.exit_pos()));
    }
}
