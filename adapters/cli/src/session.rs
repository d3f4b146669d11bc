//! Glue between the rendering contracts and a running game.

use std::time::Duration;

use anyhow::Result as AnyResult;
use maze_quest_core::Event;
use maze_quest_rendering::{
    Color, FrameInput, GridPresentation, Scene, SpritePresentation, StatusPresentation, WallGrid,
    WallPresentation,
};
use maze_quest_system_gameplay::{apply, query, Game};

const CELL_LENGTH: f32 = 32.0;
const WALL_THICKNESS: f32 = 4.0;
const FLOOR_COLOR: Color = Color::from_rgb_u8(40, 36, 32);
const WALL_COLOR: Color = Color::from_rgb_u8(200, 190, 170);

/// Game plus the adapter-side clock and event log.
#[derive(Debug)]
pub(crate) struct Session {
    game: Game,
    clock: Duration,
    echo_events: bool,
    events: Vec<Event>,
}

impl Session {
    pub(crate) fn new(game: Game, echo_events: bool) -> Self {
        Self {
            game,
            clock: Duration::ZERO,
            echo_events,
            events: Vec::new(),
        }
    }

    pub(crate) fn game(&self) -> &Game {
        &self.game
    }

    /// Events reported so far, excluding clock updates.
    pub(crate) fn events(&self) -> &[Event] {
        &self.events
    }

    fn status(&self) -> StatusPresentation {
        StatusPresentation {
            treasures_remaining: query::treasures_remaining(&self.game),
            winner: query::winner(&self.game),
            edit_mode: query::config(&self.game).edit_mode,
        }
    }

    /// Scene describing the current state of the game.
    pub(crate) fn scene(&self) -> AnyResult<Scene> {
        let maze = query::maze(&self.game);
        let grid = GridPresentation::new(maze.width(), maze.height(), CELL_LENGTH, FLOOR_COLOR)?;
        let walls = WallPresentation::new(WALL_THICKNESS, WALL_COLOR, WallGrid::from_maze(maze));
        let sprites = query::frame(&self.game)
            .iter()
            .map(SpritePresentation::from_draw)
            .collect();
        Ok(Scene::new(grid, walls, sprites, self.status()))
    }

    /// Advances the clock by `delta`, feeds the frame's commands to the game
    /// and refreshes `scene`.
    pub(crate) fn advance(&mut self, delta: Duration, input: FrameInput, scene: &mut Scene) {
        self.clock += delta;
        let mut events = Vec::new();
        for command in input.into_commands(self.clock) {
            apply(&mut self.game, command, &mut events);
        }
        for event in events {
            if matches!(event, Event::TimeAdvanced { .. }) {
                continue;
            }
            if self.echo_events {
                println!("[{:>6} ms] {event:?}", self.clock.as_millis());
            }
            self.events.push(event);
        }
        scene.refresh(
            query::maze(&self.game),
            query::frame(&self.game),
            self.status(),
        );
    }
}
