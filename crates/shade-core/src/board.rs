//! Board model: tiles, moves, outcomes and the dual-grid level state.
//!
//! A level is two independent grids ("white" and "black") sharing one
//! coordinate space. Only the active grid governs play; the `Change` move
//! toggles which grid that is.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An integer grid coordinate. May be out of bounds; the exit always is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The position one step away in the given offset.
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Contents of a single cell.
///
/// `OutOfBounds` is synthetic: it is returned for queries outside the grid
/// extents but never stored in a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tile {
    OutOfBounds,
    Blank,
    Block,
    Spiral,
    Enemy,
    Player,
}

impl Tile {
    /// Numeric code used by the machine dump format.
    pub fn code(self) -> u8 {
        match self {
            Tile::OutOfBounds => 0,
            Tile::Blank => 1,
            Tile::Block => 2,
            Tile::Spiral => 3,
            Tile::Enemy => 4,
            Tile::Player => 5,
        }
    }

    /// Single-character glyph used by the human rendering.
    pub fn glyph(self) -> char {
        match self {
            Tile::OutOfBounds => '?',
            Tile::Blank => '.',
            Tile::Block => '#',
            Tile::Spiral => '@',
            Tile::Enemy => '!',
            Tile::Player => 'p',
        }
    }

    /// Whether a sliding entity halts in front of this tile.
    pub fn is_stopping(self) -> bool {
        matches!(self, Tile::OutOfBounds | Tile::Block)
    }

    /// Whether entering this tile ends the game for the player.
    pub fn is_killing(self) -> bool {
        matches!(self, Tile::Spiral | Tile::Enemy)
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.glyph())
    }
}

/// A player input: four slide directions plus the board swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
    Change,
}

impl Move {
    /// All moves, in solver enumeration order.
    pub const ALL: [Move; 5] = [Move::Up, Move::Down, Move::Left, Move::Right, Move::Change];

    /// The four directional moves.
    pub const DIRECTIONS: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    /// Unit offset of a directional move; `None` for `Change`.
    pub fn delta(self) -> Option<(i32, i32)> {
        match self {
            Move::Up => Some((0, -1)),
            Move::Down => Some((0, 1)),
            Move::Left => Some((-1, 0)),
            Move::Right => Some((1, 0)),
            Move::Change => None,
        }
    }

    /// Glyph used when listing a move sequence.
    pub fn glyph(self) -> char {
        match self {
            Move::Up => '↑',
            Move::Down => '↓',
            Move::Left => '←',
            Move::Right => '→',
            Move::Change => '⇄',
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.glyph())
    }
}

/// What applying a single move did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveOutcome {
    /// No move has been applied to this state yet.
    Undetermined,
    /// Nothing on the board changed.
    Nothing,
    /// At least one entity slid.
    Moved,
    /// The active grid was swapped.
    Changed,
    PlayerWon,
    EnemyWon,
    PlayerCrushed,
    PlayerKilled,
}

impl MoveOutcome {
    /// Whether this outcome ends the game.
    pub fn is_ending(self) -> bool {
        matches!(
            self,
            MoveOutcome::PlayerWon
                | MoveOutcome::PlayerKilled
                | MoveOutcome::PlayerCrushed
                | MoveOutcome::EnemyWon
        )
    }
}

impl fmt::Display for MoveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MoveOutcome::Undetermined => "undetermined",
            MoveOutcome::Nothing => "nothing",
            MoveOutcome::Moved => "moved",
            MoveOutcome::Changed => "changed",
            MoveOutcome::PlayerWon => "player won",
            MoveOutcome::EnemyWon => "enemy won",
            MoveOutcome::PlayerCrushed => "player crushed",
            MoveOutcome::PlayerKilled => "player killed",
        };
        f.write_str(name)
    }
}

/// Tag selecting which of the two grids is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivePlayer {
    White,
    Black,
}

impl ActivePlayer {
    /// The other tag.
    pub fn toggled(self) -> Self {
        match self {
            ActivePlayer::White => ActivePlayer::Black,
            ActivePlayer::Black => ActivePlayer::White,
        }
    }
}

/// The full simulation state: two grids, the active tag, the last outcome
/// and the fixed exit position.
///
/// Value semantics: `apply` never mutates its receiver, it returns a derived
/// copy. The exit never changes after construction, and each grid holds at
/// most one player token at any time during play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelState {
    width: i32,
    height: i32,
    white: Vec<Tile>,
    black: Vec<Tile>,
    active_player: ActivePlayer,
    outcome: MoveOutcome,
    exit_pos: Position,
}

impl LevelState {
    /// Create an empty level with the given extents and exit.
    ///
    /// # Panics
    ///
    /// Panics if the extents are not positive or if the exit does not lie
    /// exactly one cell outside one edge of the grid.
    pub fn new(width: i32, height: i32, exit_pos: Position) -> Self {
        assert!(width > 0 && height > 0, "grid extents must be positive");
        let beside = (exit_pos.x == -1 || exit_pos.x == width)
            && (0..height).contains(&exit_pos.y);
        let above_or_below = (exit_pos.y == -1 || exit_pos.y == height)
            && (0..width).contains(&exit_pos.x);
        assert!(
            beside || above_or_below,
            "exit {exit_pos} must sit exactly one cell outside one edge of a {width}x{height} grid",
        );

        let cells = (width * height) as usize;
        Self {
            width,
            height,
            white: vec![Tile::Blank; cells],
            black: vec![Tile::Blank; cells],
            active_player: ActivePlayer::White,
            outcome: MoveOutcome::Undetermined,
            exit_pos,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn exit_pos(&self) -> Position {
        self.exit_pos
    }

    pub fn active_player(&self) -> ActivePlayer {
        self.active_player
    }

    /// Outcome of the move that produced this state.
    pub fn outcome(&self) -> MoveOutcome {
        self.outcome
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        (0..self.width).contains(&pos.x) && (0..self.height).contains(&pos.y)
    }

    fn idx(&self, pos: Position) -> usize {
        (pos.y * self.width + pos.x) as usize
    }

    fn field(&self, player: ActivePlayer) -> &[Tile] {
        match player {
            ActivePlayer::White => &self.white,
            ActivePlayer::Black => &self.black,
        }
    }

    /// Tile at `pos` on the chosen grid; `OutOfBounds` outside the extents.
    pub fn tile_on(&self, player: ActivePlayer, pos: Position) -> Tile {
        if !self.in_bounds(pos) {
            return Tile::OutOfBounds;
        }
        self.field(player)[self.idx(pos)]
    }

    /// Tile at `pos` on the active grid.
    pub fn tile(&self, pos: Position) -> Tile {
        self.tile_on(self.active_player, pos)
    }

    /// Write a tile on the chosen grid.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is out of bounds.
    pub fn set_tile_on(&mut self, player: ActivePlayer, pos: Position, tile: Tile) {
        assert!(self.in_bounds(pos), "cannot write tile outside the grid: {pos}");
        let idx = self.idx(pos);
        match player {
            ActivePlayer::White => self.white[idx] = tile,
            ActivePlayer::Black => self.black[idx] = tile,
        }
    }

    /// Write a tile on the active grid.
    pub fn set_tile(&mut self, pos: Position, tile: Tile) {
        self.set_tile_on(self.active_player, pos, tile);
    }

    /// Whether a slide halts in front of `pos` on the active grid.
    pub fn is_stopping(&self, pos: Position) -> bool {
        self.tile(pos).is_stopping()
    }

    /// Whether entering `pos` on the active grid kills the player.
    pub fn is_killing(&self, pos: Position) -> bool {
        self.tile(pos).is_killing()
    }

    /// The player position on the active grid, if the token is placed.
    pub fn find_player(&self) -> Option<Position> {
        let field = self.field(self.active_player);
        for x in 0..self.width {
            for y in 0..self.height {
                let pos = Position::new(x, y);
                if field[self.idx(pos)] == Tile::Player {
                    return Some(pos);
                }
            }
        }
        None
    }

    /// The player position on the active grid.
    ///
    /// # Panics
    ///
    /// Panics if no player token is on the active grid; callers must
    /// guarantee exactly one prior player placement.
    pub fn player_pos(&self) -> Position {
        self.find_player()
            .unwrap_or_else(|| panic!("no player token on the active grid"))
    }

    pub(crate) fn set_outcome(&mut self, outcome: MoveOutcome) {
        self.outcome = outcome;
    }

    pub(crate) fn set_active_player(&mut self, player: ActivePlayer) {
        self.active_player = player;
    }

    pub(crate) fn toggle_active_player(&mut self) {
        self.active_player = self.active_player.toggled();
    }
}
