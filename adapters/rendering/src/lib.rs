#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Maze Quest adapters.

use anyhow::Result as AnyResult;
use glam::Vec2;
use maze_quest_core::{
    CellCoord, Command, Direction, EntityKind, PlayerId, PressedKeys, SpriteDraw, SpriteFrame,
};
use maze_quest_world::Maze;
use std::{error::Error, fmt, time::Duration};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }
}

/// Editor request issued at the cursor cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EditAction {
    /// Flip the wall on one side of the cursor cell.
    ToggleWall(Direction),
    /// Place a new entity of the given kind.
    Place(EntityKind),
    /// Remove the most recently placed entity.
    Remove,
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct FrameInput {
    /// Tokens held by each player, indexed by player slot.
    pub pressed: Vec<PressedKeys>,
    /// Whether the adapter detected a reset request on this frame.
    pub reset: bool,
    /// Cell under the editor cursor, if any.
    pub cursor_cell: Option<CellCoord>,
    /// Editor request applied at [`cursor_cell`](Self::cursor_cell).
    pub edit: Option<EditAction>,
}

impl FrameInput {
    /// Translates the snapshot into session commands for one frame.
    ///
    /// Reset goes first, then the edit request, then the tick. Edit requests
    /// without a cursor cell are dropped.
    #[must_use]
    pub fn into_commands(self, timestamp: Duration) -> Vec<Command> {
        let mut commands = Vec::with_capacity(3);
        if self.reset {
            commands.push(Command::Reset);
        }
        if let (Some(cell), Some(edit)) = (self.cursor_cell, self.edit) {
            commands.push(match edit {
                EditAction::ToggleWall(direction) => Command::ToggleWall { cell, direction },
                EditAction::Place(kind) => Command::PlaceEntity { cell, kind },
                EditAction::Remove => Command::RemoveEntity { cell },
            });
        }
        commands.push(Command::Tick {
            timestamp,
            input: self.pressed,
        });
        commands
    }
}

/// Describes the cell grid the maze is drawn on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridPresentation {
    /// Number of columns contained in the grid.
    pub columns: u32,
    /// Number of rows contained in the grid.
    pub rows: u32,
    /// Side length of a single cell expressed in world units.
    pub cell_length: f32,
    /// Color used when drawing the floor.
    pub floor_color: Color,
}

impl GridPresentation {
    /// Creates a new grid descriptor.
    ///
    /// Returns an error when the grid has no cells.
    pub fn new(
        columns: u32,
        rows: u32,
        cell_length: f32,
        floor_color: Color,
    ) -> std::result::Result<Self, RenderingError> {
        if columns == 0 || rows == 0 {
            return Err(RenderingError::EmptyGrid { columns, rows });
        }

        Ok(Self {
            columns,
            rows,
            cell_length,
            floor_color,
        })
    }
}

/// Top-left corner of a cell in cell units.
fn cell_position(cell: CellCoord) -> Vec2 {
    Vec2::new(cell.column() as f32, cell.row() as f32)
}

/// Snapshot of every wall edge of a maze.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WallGrid {
    rows: u32,
    columns: u32,
    horizontal: Vec<bool>,
    vertical: Vec<bool>,
}

impl WallGrid {
    /// Captures the walls of `maze`.
    #[must_use]
    pub fn from_maze<E>(maze: &Maze<E>) -> Self {
        let rows = maze.height();
        let columns = maze.width();
        let horizontal = (0..=rows)
            .flat_map(|row| (0..columns).map(move |column| (row, column)))
            .map(|(row, column)| maze.horizontal_wall(row, column))
            .collect();
        let vertical = (0..rows)
            .flat_map(|row| (0..=columns).map(move |column| (row, column)))
            .map(|(row, column)| maze.vertical_wall(row, column))
            .collect();
        Self {
            rows,
            columns,
            horizontal,
            vertical,
        }
    }

    /// Number of rows of the captured maze.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns of the captured maze.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Wall on the north edge of `(row, column)`; `row` may equal the row count.
    #[must_use]
    pub fn north(&self, row: u32, column: u32) -> bool {
        if row > self.rows || column >= self.columns {
            return false;
        }
        let index = row as usize * self.columns as usize + column as usize;
        self.horizontal.get(index).copied().unwrap_or(false)
    }

    /// Wall on the west edge of `(row, column)`; `column` may equal the column count.
    #[must_use]
    pub fn west(&self, row: u32, column: u32) -> bool {
        if row >= self.rows || column > self.columns {
            return false;
        }
        let index = row as usize * (self.columns as usize + 1) + column as usize;
        self.vertical.get(index).copied().unwrap_or(false)
    }
}

/// Describes how maze walls should be drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct WallPresentation {
    /// Thickness of a wall measured in world units.
    pub thickness: f32,
    /// Color used for the wall fill.
    pub color: Color,
    /// Wall edges to draw.
    pub grid: WallGrid,
}

impl WallPresentation {
    /// Creates a new wall descriptor.
    #[must_use]
    pub fn new(thickness: f32, color: Color, grid: WallGrid) -> Self {
        Self {
            thickness,
            color,
            grid,
        }
    }
}

/// Sprite placed in the scene.
///
/// Positions are expressed in cell units: the top-left corner of the cell plus
/// the interpolation offset reported by the simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpritePresentation {
    /// Frame to draw.
    pub sprite: SpriteFrame,
    /// Top-left corner in cell units.
    pub position: Vec2,
    /// Size relative to one cell.
    pub scale: f32,
    /// Paint order; higher values draw later.
    pub z_index: i32,
}

impl SpritePresentation {
    /// Creates a new sprite descriptor.
    #[must_use]
    pub const fn new(sprite: SpriteFrame, position: Vec2, scale: f32, z_index: i32) -> Self {
        Self {
            sprite,
            position,
            scale,
            z_index,
        }
    }

    /// Places a simulation draw instruction in cell space.
    #[must_use]
    pub fn from_draw(draw: &SpriteDraw) -> Self {
        let offset = Vec2::new(draw.offset_x, draw.offset_y);
        Self::new(
            draw.sprite,
            cell_position(draw.cell) + offset,
            draw.scale,
            draw.z_index,
        )
    }

    /// Cell the sprite's center currently lies in, rounding toward the nearest cell.
    #[must_use]
    pub fn nearest_cell(&self) -> CellCoord {
        let rounded = self.position.round().max(Vec2::ZERO);
        CellCoord::new(rounded.y as u32, rounded.x as u32)
    }
}

/// Progress summary shown alongside the maze.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct StatusPresentation {
    /// Treasures still to be collected.
    pub treasures_remaining: u32,
    /// Player who collected the last treasure.
    pub winner: Option<PlayerId>,
    /// Whether editor requests are honoured.
    pub edit_mode: bool,
}

/// Scene description combining the grid, the walls and the sprites.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Grid that composes the play area.
    pub grid: GridPresentation,
    /// Walls drawn between cells.
    pub walls: WallPresentation,
    /// Sprites in paint order.
    pub sprites: Vec<SpritePresentation>,
    /// Progress summary.
    pub status: StatusPresentation,
}

impl Scene {
    /// Creates a new scene descriptor.
    #[must_use]
    pub fn new(
        grid: GridPresentation,
        walls: WallPresentation,
        sprites: Vec<SpritePresentation>,
        status: StatusPresentation,
    ) -> Self {
        Self {
            grid,
            walls,
            sprites,
            status,
        }
    }

    /// Replaces the dynamic parts of the scene with the latest simulation state.
    ///
    /// The grid dimensions follow the maze so a reset to a different size
    /// is picked up.
    pub fn refresh<E>(&mut self, maze: &Maze<E>, frame: &[SpriteDraw], status: StatusPresentation) {
        self.grid.columns = maze.width();
        self.grid.rows = maze.height();
        self.walls.grid = WallGrid::from_maze(maze);
        self.sprites.clear();
        self.sprites
            .extend(frame.iter().map(SpritePresentation::from_draw));
        self.status = status;
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Maze Quest scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the simulated frame delta,
    /// per-frame input captured by the adapter, and may mutate the scene before
    /// it is rendered, allowing adapters to animate session snapshots
    /// deterministically.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq, Eq)]
pub enum RenderingError {
    /// Grids must hold at least one cell.
    EmptyGrid {
        /// Provided column count.
        columns: u32,
        /// Provided row count.
        rows: u32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGrid { columns, rows } => {
                write!(f, "grid must hold at least one cell (received {columns}x{rows})")
            }
        }
    }
}

impl Error for RenderingError {}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_quest_core::{InputToken, SpriteKey};

    fn grid(columns: u32, rows: u32) -> GridPresentation {
        GridPresentation::new(columns, rows, 32.0, Color::from_rgb_u8(0, 0, 0)).expect("valid grid")
    }

    #[test]
    fn grid_creation_rejects_empty_grids_without_panicking() {
        let error = GridPresentation::new(0, 5, 32.0, Color::from_rgb_u8(0, 0, 0))
            .expect_err("empty grid must be rejected");

        assert_eq!(error, RenderingError::EmptyGrid { columns: 0, rows: 5 });
    }

    #[test]
    fn wall_grid_mirrors_the_maze() {
        let mut maze: Maze<()> = Maze::new(2, 3);
        assert!(maze.set_wall(CellCoord::new(0, 1), Direction::South, true));
        assert!(maze.set_wall(CellCoord::new(1, 1), Direction::East, true));
        let walls = WallGrid::from_maze(&maze);

        assert!(walls.north(0, 0));
        assert!(walls.north(2, 2));
        assert!(walls.west(1, 0));
        assert!(walls.west(0, 3));
        assert!(walls.north(1, 1));
        assert!(walls.west(1, 2));
        assert!(!walls.north(1, 0));
        assert!(!walls.west(0, 1));
    }

    #[test]
    fn sprites_are_offset_within_cell_space() {
        let draw = SpriteDraw {
            cell: CellCoord::new(2, 3),
            sprite: SpriteFrame {
                key: SpriteKey::Treasure,
                index: 1,
            },
            offset_x: -0.25,
            offset_y: 0.0,
            scale: 0.5,
            z_index: 1,
        };
        let sprite = SpritePresentation::from_draw(&draw);

        assert_eq!(sprite.position, Vec2::new(2.75, 2.0));
        assert_eq!(sprite.nearest_cell(), CellCoord::new(2, 3));
    }

    #[test]
    fn frame_input_orders_reset_edit_and_tick() {
        let input = FrameInput {
            pressed: vec![PressedKeys::from_tokens([InputToken::Fight])],
            reset: true,
            cursor_cell: Some(CellCoord::new(1, 1)),
            edit: Some(EditAction::Place(EntityKind::Pot)),
        };
        let commands = input.into_commands(Duration::from_millis(16));

        assert_eq!(
            commands,
            vec![
                Command::Reset,
                Command::PlaceEntity {
                    cell: CellCoord::new(1, 1),
                    kind: EntityKind::Pot,
                },
                Command::Tick {
                    timestamp: Duration::from_millis(16),
                    input: vec![PressedKeys::from_tokens([InputToken::Fight])],
                },
            ]
        );
    }

    #[test]
    fn edits_without_a_cursor_are_dropped() {
        let input = FrameInput {
            edit: Some(EditAction::Remove),
            ..FrameInput::default()
        };
        let commands = input.into_commands(Duration::ZERO);

        assert_eq!(commands.len(), 1);
        assert!(matches!(commands[0], Command::Tick { .. }));
    }

    #[test]
    fn scene_refresh_tracks_resized_mazes() {
        let maze: Maze<()> = Maze::new(3, 5);
        let mut scene = Scene::new(
            grid(2, 2),
            WallPresentation::new(
                4.0,
                Color::from_rgb_u8(90, 90, 90),
                WallGrid::from_maze(&Maze::<()>::new(2, 2)),
            ),
            Vec::new(),
            StatusPresentation::default(),
        );
        let status = StatusPresentation {
            treasures_remaining: 3,
            winner: None,
            edit_mode: false,
        };
        scene.refresh(&maze, &[], status);

        assert_eq!((scene.grid.columns, scene.grid.rows), (5, 3));
        assert_eq!(scene.walls.grid.columns(), 5);
        assert_eq!(scene.status, status);
    }
}
