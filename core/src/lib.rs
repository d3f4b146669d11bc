#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Maze Quest engine.
//!
//! This crate defines the message surface that connects adapters, the maze
//! world, the entity store and the gameplay systems. Adapters submit
//! [`Command`] values describing per-frame input and edits, the game session
//! executes those commands via its `apply` entry point, and then reports
//! [`Event`] values (including audio cues) back to the adapter. Drawing state
//! crosses the boundary as [`SpriteDraw`] records sorted by z-order.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Maze Quest!";

/// Cardinal movement directions available to players and mobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// Every direction in clockwise order starting at north.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Parses an adapter-provided direction token.
    ///
    /// Accepts browser key names (`ArrowUp`), compass names (`north`) and
    /// short forms (`up`, `u`). Unknown tokens yield `None`, which callers
    /// treat as "no movement".
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "arrowup" | "up" | "u" | "north" | "n" => Some(Self::North),
            "arrowright" | "right" | "r" | "east" | "e" => Some(Self::East),
            "arrowdown" | "down" | "d" | "south" | "s" => Some(Self::South),
            "arrowleft" | "left" | "l" | "west" | "w" => Some(Self::West),
            _ => None,
        }
    }

    /// Direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Row and column deltas of a single step in this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (-1, 0),
            Self::East => (0, 1),
            Self::South => (1, 0),
            Self::West => (0, -1),
        }
    }

    /// Direction of a single step from `from` to `to`, if they are adjacent.
    #[must_use]
    pub fn between(from: CellCoord, to: CellCoord) -> Option<Self> {
        if from.manhattan_distance(to) != 1 {
            return None;
        }

        if to.row() < from.row() {
            Some(Self::North)
        } else if to.row() > from.row() {
            Some(Self::South)
        } else if to.column() > from.column() {
            Some(Self::East)
        } else {
            Some(Self::West)
        }
    }
}

/// Location of a single maze cell expressed as row `i` and column `j`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    row: u32,
    column: u32,
}

impl CellCoord {
    /// Creates a new cell coordinate from its row and column.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.row.abs_diff(other.row) + self.column.abs_diff(other.column)
    }

    /// Adjacent cell in `direction`, or `None` when it would underflow.
    ///
    /// Upper bounds are not checked; the maze owns its dimensions.
    #[must_use]
    pub fn neighbor(self, direction: Direction) -> Option<CellCoord> {
        match direction {
            Direction::North => self.row.checked_sub(1).map(|row| Self::new(row, self.column)),
            Direction::South => self.row.checked_add(1).map(|row| Self::new(row, self.column)),
            Direction::West => self
                .column
                .checked_sub(1)
                .map(|column| Self::new(self.row, column)),
            Direction::East => self
                .column
                .checked_add(1)
                .map(|column| Self::new(self.row, column)),
        }
    }
}

/// Token held by a player during a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputToken {
    /// Request to move one cell in the given direction.
    Move(Direction),
    /// Request to fight the faced cell (also used as confirm).
    Fight,
}

impl InputToken {
    /// Parses an adapter-provided token, returning `None` for unknown input.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "fight" | "f" | "space" | " " | "enter" | "confirm" => Some(Self::Fight),
            other => Direction::from_token(other).map(Self::Move),
        }
    }
}

/// Ordered set of tokens a player currently holds.
///
/// Order of insertion is preserved: the movement system honours the first
/// legal direction, mirroring the order in which keys went down.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PressedKeys {
    tokens: Vec<InputToken>,
}

impl PressedKeys {
    /// Creates an empty key set.
    #[must_use]
    pub const fn new() -> Self {
        Self { tokens: Vec::new() }
    }

    /// Builds a key set from tokens, dropping duplicates.
    #[must_use]
    pub fn from_tokens<I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = InputToken>,
    {
        let mut keys = Self::new();
        for token in tokens {
            keys.press(token);
        }
        keys
    }

    /// Records that a token went down. Pressing a held token is a no-op.
    pub fn press(&mut self, token: InputToken) {
        if !self.tokens.contains(&token) {
            self.tokens.push(token);
        }
    }

    /// Records that a token was released.
    pub fn release(&mut self, token: InputToken) {
        self.tokens.retain(|held| *held != token);
    }

    /// Releases every held token.
    pub fn clear(&mut self) {
        self.tokens.clear();
    }

    /// Reports whether no token is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Reports whether the fight token is held.
    #[must_use]
    pub fn fight(&self) -> bool {
        self.tokens.contains(&InputToken::Fight)
    }

    /// Held directions in press order.
    pub fn directions(&self) -> impl Iterator<Item = Direction> + '_ {
        self.tokens.iter().filter_map(|token| match token {
            InputToken::Move(direction) => Some(*direction),
            InputToken::Fight => None,
        })
    }

    /// Held tokens in press order.
    pub fn iter(&self) -> impl Iterator<Item = &InputToken> {
        self.tokens.iter()
    }
}

/// Identifier of a player slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(u8);

impl PlayerId {
    /// Creates a new player identifier.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the zero-based slot index.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Slot index usable for indexing per-player tables.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Selects how many players take part in a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerSelection {
    /// A single player.
    #[default]
    Single,
    /// Two cooperating players sharing the treasure goal.
    Cooperative,
}

impl PlayerSelection {
    /// Number of player entities created for the selection.
    #[must_use]
    pub const fn player_count(self) -> u8 {
        match self {
            Self::Single => 1,
            Self::Cooperative => 2,
        }
    }
}

/// Kinds of entities the generator and the editor can place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// A player avatar.
    Player,
    /// Collectible treasure.
    Treasure,
    /// Collectible pot, counted like treasure.
    Pot,
    /// Sleeping skeleton that wakes, wanders and can be fought.
    Skeleton,
    /// Sleeping ghost that turns into treasure once woken.
    Ghost,
}

impl EntityKind {
    /// Reports whether a freshly created entity of this kind blocks movement.
    #[must_use]
    pub const fn blocks(self) -> bool {
        matches!(self, Self::Player | Self::Skeleton | Self::Ghost)
    }

    /// Reports whether the entity counts toward the treasure total at creation.
    #[must_use]
    pub const fn counts_as_treasure(self) -> bool {
        matches!(self, Self::Treasure | Self::Pot | Self::Ghost)
    }
}

/// Discrete audio triggers emitted by the gameplay systems.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioCue {
    /// Start the background music loop.
    BackgroundLoopStart,
    /// Stop the background music loop.
    BackgroundLoopStop,
    /// A treasure was picked up.
    TreasurePickup,
    /// A skeleton woke up.
    SkeletonWake,
    /// A ghost woke up.
    GhostWake,
    /// A skeleton was struck down.
    SkeletonDeath,
    /// The last treasure was collected.
    Win,
}

/// Opaque handle naming one animation strip known to the rendering adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpriteKey {
    /// Player walking in a direction.
    PlayerWalk(PlayerId, Direction),
    /// Player standing still.
    PlayerIdle(PlayerId),
    /// Player swinging a weapon.
    PlayerFight(PlayerId),
    /// Player cheering after the win.
    PlayerCheer(PlayerId),
    /// Treasure on the floor.
    Treasure,
    /// Pot on the floor.
    Pot,
    /// Skeleton lying asleep.
    SkeletonSleep,
    /// Skeleton getting up.
    SkeletonWake,
    /// Skeleton walking in a direction.
    SkeletonWalk(Direction),
    /// Skeleton falling apart.
    SkeletonDie,
    /// Skeleton remains.
    SkeletonCorpse,
    /// Ghost asleep.
    GhostSleep,
    /// Ghost waking.
    GhostWake,
    /// Ghost awake and collectible.
    GhostAwake,
}

/// Animation strip: a sprite key and the number of frames it holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpriteSet {
    key: SpriteKey,
    frames: u8,
}

impl SpriteSet {
    /// Creates a strip; zero frames are clamped to one.
    #[must_use]
    pub const fn new(key: SpriteKey, frames: u8) -> Self {
        let frames = if frames == 0 { 1 } else { frames };
        Self { key, frames }
    }

    /// Sprite key of the strip.
    #[must_use]
    pub const fn key(&self) -> SpriteKey {
        self.key
    }

    /// Number of frames in the strip, at least one.
    #[must_use]
    pub const fn frames(&self) -> u8 {
        self.frames
    }

    /// Selects a frame, wrapping out-of-range indices.
    #[must_use]
    pub const fn frame(&self, index: u32) -> SpriteFrame {
        SpriteFrame {
            key: self.key,
            index: (index % self.frames as u32) as u8,
        }
    }
}

/// One frame selected from a [`SpriteSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpriteFrame {
    /// Strip the frame belongs to.
    pub key: SpriteKey,
    /// Zero-based frame index.
    pub index: u8,
}

/// Draw instruction handed to the rendering adapter for one entity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpriteDraw {
    /// Cell the entity occupies.
    pub cell: CellCoord,
    /// Selected sprite frame.
    pub sprite: SpriteFrame,
    /// Horizontal offset from the cell origin measured in cells.
    pub offset_x: f32,
    /// Vertical offset from the cell origin measured in cells.
    pub offset_y: f32,
    /// Uniform scale applied to the sprite.
    pub scale: f32,
    /// Paint order; lower values are painted first.
    pub z_index: i32,
}

/// Durations that drive animations and mob behaviour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    /// Time needed to cross one cell.
    pub move_time: Duration,
    /// Time each walking sprite frame stays on screen.
    pub sprite_time: Duration,
    /// Length of the wake animation.
    pub wake_time: Duration,
    /// Length of the death animation.
    pub die_time: Duration,
    /// Length of a fight swing.
    pub fight_time: Duration,
    /// Shortest pause between two wandering steps.
    pub wander_min: Duration,
    /// Longest pause between two wandering steps.
    pub wander_max: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        let move_time = Duration::from_millis(500);
        Self {
            move_time,
            sprite_time: Duration::from_millis(100),
            wake_time: move_time,
            die_time: move_time,
            fight_time: move_time,
            wander_min: Duration::from_millis(1_000),
            wander_max: Duration::from_millis(2_500),
        }
    }
}

/// Session configuration read once at startup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Number of maze columns.
    pub width: u32,
    /// Number of maze rows.
    pub height: u32,
    /// Number of treasures to scatter.
    pub treasures: u32,
    /// Number of sleeping skeletons.
    pub skeletons: u32,
    /// Number of pots.
    pub pots: u32,
    /// Number of ghosts placed with loop carving.
    pub ghosts: u32,
    /// Whether edit commands are accepted.
    pub edit_mode: bool,
    /// Single player or two cooperating players.
    pub players: PlayerSelection,
    /// Seed for maze generation and mob behaviour.
    pub seed: u64,
    /// Animation and behaviour timings.
    pub timing: Timing,
}

impl GameConfig {
    /// Default number of columns.
    pub const DEFAULT_WIDTH: u32 = 13;
    /// Default number of rows.
    pub const DEFAULT_HEIGHT: u32 = 6;
    /// Default treasure density, in percent of cells.
    pub const DEFAULT_DENSITY: u32 = 10;
    /// Default seed.
    pub const DEFAULT_SEED: u64 = 0x5eed;

    /// Treasure count for a grid filled at `density` percent, rounded up.
    #[must_use]
    pub fn treasures_for_density(width: u32, height: u32, density: u32) -> u32 {
        let cells = u64::from(width) * u64::from(height);
        let scaled = cells * u64::from(density);
        u32::try_from(scaled.div_ceil(100)).unwrap_or(u32::MAX)
    }

    /// Total entities that count toward the treasure goal.
    #[must_use]
    pub fn treasure_goal(&self) -> u32 {
        self.treasures
            .saturating_add(self.pots)
            .saturating_add(self.ghosts)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: Self::DEFAULT_WIDTH,
            height: Self::DEFAULT_HEIGHT,
            treasures: Self::treasures_for_density(
                Self::DEFAULT_WIDTH,
                Self::DEFAULT_HEIGHT,
                Self::DEFAULT_DENSITY,
            ),
            skeletons: 0,
            pots: 0,
            ghosts: 0,
            edit_mode: false,
            players: PlayerSelection::Single,
            seed: Self::DEFAULT_SEED,
            timing: Timing::default(),
        }
    }
}

/// Reasons an edit command may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditError {
    /// The session was not started in edit mode.
    EditModeDisabled,
    /// The addressed cell lies outside the grid.
    OutOfBounds,
    /// Border walls are permanent.
    BorderWall,
    /// A blocking entity already occupies the cell.
    CellBlocked,
    /// The cell holds nothing that can be removed.
    NothingToRemove,
    /// The entity kind cannot be placed by the editor.
    UnsupportedKind,
}

/// Commands that express all permissible session mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Advances the simulation to `timestamp` with the tokens held per player.
    Tick {
        /// Monotonically increasing frame timestamp.
        timestamp: Duration,
        /// Held tokens, indexed by player slot. Missing slots hold nothing.
        input: Vec<PressedKeys>,
    },
    /// Regenerates the maze and every entity from scratch.
    Reset,
    /// Flips the wall on the given side of a cell (edit mode only).
    ToggleWall {
        /// Cell whose edge is toggled.
        cell: CellCoord,
        /// Side of the cell holding the edge.
        direction: Direction,
    },
    /// Places a new entity into a cell (edit mode only).
    PlaceEntity {
        /// Target cell.
        cell: CellCoord,
        /// Kind of entity to create.
        kind: EntityKind,
    },
    /// Removes the most recently placed non-player entity from a cell (edit mode only).
    RemoveEntity {
        /// Target cell.
        cell: CellCoord,
    },
}

/// Events reported by the session after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// The simulation clock advanced.
    TimeAdvanced {
        /// Timestamp of the processed frame.
        timestamp: Duration,
    },
    /// An audio cue should be played.
    Audio {
        /// Cue to play.
        cue: AudioCue,
    },
    /// A fresh maze was generated.
    MazeGenerated {
        /// Number of rows.
        height: u32,
        /// Number of columns.
        width: u32,
        /// Treasures left to collect.
        treasures: u32,
    },
    /// Regeneration failed; the previous session stays active.
    GenerationFailed {
        /// Human readable failure description.
        reason: String,
    },
    /// A player started crossing into a new cell.
    MoveStarted {
        /// Moving player.
        player: PlayerId,
        /// Cell the player left.
        from: CellCoord,
        /// Cell the player now occupies.
        to: CellCoord,
    },
    /// A player finished crossing into a cell.
    MoveFinished {
        /// Moving player.
        player: PlayerId,
        /// Cell the player arrived at.
        cell: CellCoord,
    },
    /// A player swung at the faced cell.
    FightStarted {
        /// Fighting player.
        player: PlayerId,
        /// Faced cell, or `None` when a wall is in the way.
        target: Option<CellCoord>,
    },
    /// A mob started waking up.
    MobWoke {
        /// Cell of the mob.
        cell: CellCoord,
    },
    /// A mob was struck and started dying.
    MobStruck {
        /// Cell of the mob.
        cell: CellCoord,
    },
    /// A mob finished dying.
    MobDied {
        /// Cell of the remains.
        cell: CellCoord,
    },
    /// A treasure was collected.
    TreasureCollected {
        /// Collecting player.
        player: PlayerId,
        /// Cell of the treasure.
        cell: CellCoord,
        /// Treasures left after this pickup.
        remaining: u32,
    },
    /// The last treasure was collected.
    Won {
        /// Player who collected it.
        player: PlayerId,
    },
    /// A wall was toggled by the editor.
    WallToggled {
        /// Addressed cell.
        cell: CellCoord,
        /// Side of the cell.
        direction: Direction,
        /// Whether the wall is now present.
        present: bool,
    },
    /// An entity was placed by the editor.
    EntityPlaced {
        /// Kind of the new entity.
        kind: EntityKind,
        /// Cell of the new entity.
        cell: CellCoord,
    },
    /// An entity was removed by the editor.
    EntityRemoved {
        /// Cell the entity was removed from.
        cell: CellCoord,
    },
    /// An edit command was rejected.
    EditRejected {
        /// Rejection reason.
        reason: EditError,
    },
}

#[cfg(test)]
mod tests {
    use super::{
        CellCoord, Direction, EditError, GameConfig, InputToken, PlayerSelection, PressedKeys,
        SpriteKey, SpriteSet,
    };
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn neighbor_refuses_to_underflow() {
        let corner = CellCoord::new(0, 0);
        assert_eq!(corner.neighbor(Direction::North), None);
        assert_eq!(corner.neighbor(Direction::West), None);
        assert_eq!(corner.neighbor(Direction::South), Some(CellCoord::new(1, 0)));
        assert_eq!(corner.neighbor(Direction::East), Some(CellCoord::new(0, 1)));
    }

    #[test]
    fn direction_between_adjacent_cells() {
        let cell = CellCoord::new(2, 2);
        for direction in Direction::ALL {
            let next = cell.neighbor(direction).expect("interior cell");
            assert_eq!(Direction::between(cell, next), Some(direction));
            assert_eq!(Direction::between(next, cell), Some(direction.opposite()));
        }
        assert_eq!(Direction::between(cell, CellCoord::new(3, 3)), None);
        assert_eq!(Direction::between(cell, cell), None);
    }

    #[test]
    fn tokens_parse_browser_and_short_names() {
        assert_eq!(Direction::from_token("ArrowDown"), Some(Direction::South));
        assert_eq!(Direction::from_token("left"), Some(Direction::West));
        assert_eq!(Direction::from_token("sideways"), None);
        assert_eq!(InputToken::from_token("fight"), Some(InputToken::Fight));
        assert_eq!(
            InputToken::from_token("up"),
            Some(InputToken::Move(Direction::North))
        );
        assert_eq!(InputToken::from_token("jump"), None);
    }

    #[test]
    fn pressed_keys_preserve_press_order_without_duplicates() {
        let mut keys = PressedKeys::new();
        keys.press(InputToken::Move(Direction::East));
        keys.press(InputToken::Fight);
        keys.press(InputToken::Move(Direction::South));
        keys.press(InputToken::Move(Direction::East));

        let directions: Vec<_> = keys.directions().collect();
        assert_eq!(directions, vec![Direction::East, Direction::South]);
        assert!(keys.fight());

        keys.release(InputToken::Move(Direction::East));
        let directions: Vec<_> = keys.directions().collect();
        assert_eq!(directions, vec![Direction::South]);
    }

    #[test]
    fn sprite_set_wraps_frame_indices() {
        let set = SpriteSet::new(SpriteKey::Treasure, 3);
        assert_eq!(set.frame(4).index, 1);
        let single = SpriteSet::new(SpriteKey::Pot, 0);
        assert_eq!(single.frames(), 1);
        assert_eq!(single.frame(7).index, 0);
    }

    #[test]
    fn density_rounds_up() {
        assert_eq!(GameConfig::treasures_for_density(13, 6, 10), 8);
        assert_eq!(GameConfig::treasures_for_density(2, 2, 10), 1);
        assert_eq!(GameConfig::treasures_for_density(2, 2, 0), 0);
        assert_eq!(GameConfig::default().treasures, 8);
    }

    #[test]
    fn cooperative_selection_creates_two_players() {
        assert_eq!(PlayerSelection::Single.player_count(), 1);
        assert_eq!(PlayerSelection::Cooperative.player_count(), 2);
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn game_config_round_trips_through_bincode() {
        let config = GameConfig {
            skeletons: 3,
            ghosts: 1,
            players: PlayerSelection::Cooperative,
            ..GameConfig::default()
        };
        assert_round_trip(&config);
    }

    #[test]
    fn edit_error_round_trips_through_bincode() {
        assert_round_trip(&EditError::BorderWall);
    }
}
