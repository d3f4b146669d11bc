#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Maze Quest game session: entity factories, game systems and the
//! command-driven session wrapper.
//!
//! A [`Game`] owns the maze, the entity store and the per-tick state. Adapters
//! drive it exclusively through [`apply`] and observe it through [`query`].

pub mod components;
mod factories;
mod state;
mod systems;

use std::time::Duration;

use maze_quest_core::{
    AudioCue, CellCoord, Command, Direction, EditError, EntityKind, Event, GameConfig,
    PressedKeys,
};
use maze_quest_ecs::Ecs;
use maze_quest_world::{generate, GenerationError, Maze};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
    components::{ComponentKind, Components},
    state::GameState,
};

pub use state::PlayerMove;

/// A running Maze Quest session.
#[derive(Debug)]
pub struct Game {
    config: GameConfig,
    ecs: Ecs<Components, GameState>,
    state: GameState,
    audio_started: bool,
    clock: Duration,
}

impl Game {
    /// Generates a fresh maze for `config` using its seed.
    pub fn new(config: GameConfig) -> Result<Self, GenerationError> {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let layout = generate(&config, &mut rng)?;
        Ok(Self::assemble(config, &layout, rng))
    }

    /// Starts a session on a hand-made layout instead of a generated one.
    ///
    /// Walls and entity kinds are taken from `layout`; the seed of `config`
    /// still drives mob behaviour and later resets.
    #[must_use]
    pub fn with_layout(config: GameConfig, layout: &Maze<EntityKind>) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self::assemble(config, layout, rng)
    }

    fn assemble(config: GameConfig, layout: &Maze<EntityKind>, rng: ChaCha8Rng) -> Self {
        let mut ecs = Ecs::new();
        ecs.register_component(ComponentKind::Treasure, factories::treasure_prototype());
        systems::register(&mut ecs);

        let mut maze = Maze::with_walls_of(layout);
        let mut players = 0_u8;
        let mut treasures = 0_u32;
        for cell in layout.cells() {
            for occupant in layout.occupants(cell) {
                let kind = occupant.entity;
                let spawned = factories::spawn_kind(
                    &mut ecs,
                    &mut maze,
                    kind,
                    cell,
                    &config.timing,
                    &mut players,
                );
                if spawned.is_some() && kind.counts_as_treasure() {
                    treasures = treasures.saturating_add(1);
                }
            }
        }

        let mut state = GameState::new(
            maze,
            usize::from(players),
            treasures,
            rng,
            config.timing,
        );
        state.events.push(Event::MazeGenerated {
            height: layout.height(),
            width: layout.width(),
            treasures,
        });
        tracing::info!(
            height = layout.height(),
            width = layout.width(),
            players,
            treasures,
            "session assembled"
        );

        Self {
            config,
            ecs,
            state,
            audio_started: false,
            clock: Duration::ZERO,
        }
    }

    fn tick(&mut self, timestamp: Duration, input: &[PressedKeys], out: &mut Vec<Event>) {
        let timestamp = if timestamp < self.clock {
            tracing::warn!(?timestamp, clock = ?self.clock, "timestamp went backwards");
            self.clock
        } else {
            timestamp
        };
        self.clock = timestamp;

        out.push(Event::TimeAdvanced { timestamp });
        if !self.audio_started {
            self.audio_started = true;
            out.push(Event::Audio {
                cue: AudioCue::BackgroundLoopStart,
            });
        }

        self.state.begin_tick(input);
        self.ecs.tick(timestamp, &mut self.state);
        out.append(&mut self.state.events);
    }

    fn reset(&mut self, out: &mut Vec<Event>) {
        let mut rng = self.state.rng.clone();
        match generate(&self.config, &mut rng) {
            Ok(layout) => {
                let clock = self.clock;
                *self = Self::assemble(self.config.clone(), &layout, rng);
                self.clock = clock;
                out.append(&mut self.state.events);
            }
            Err(error) => {
                tracing::warn!(%error, "reset failed, keeping the current maze");
                out.push(Event::GenerationFailed {
                    reason: error.to_string(),
                });
            }
        }
    }

    fn edit_target(&self, cell: CellCoord) -> Result<(), EditError> {
        if !self.config.edit_mode {
            return Err(EditError::EditModeDisabled);
        }
        if !self.state.maze.contains(cell) {
            return Err(EditError::OutOfBounds);
        }
        Ok(())
    }

    fn toggle_wall(&mut self, cell: CellCoord, direction: Direction) -> Result<Event, EditError> {
        self.edit_target(cell)?;
        if self.state.maze.is_border(cell, direction) {
            return Err(EditError::BorderWall);
        }
        let present = self
            .state
            .maze
            .toggle_wall(cell, direction)
            .ok_or(EditError::BorderWall)?;
        Ok(Event::WallToggled {
            cell,
            direction,
            present,
        })
    }

    fn place_entity(&mut self, cell: CellCoord, kind: EntityKind) -> Result<Event, EditError> {
        self.edit_target(cell)?;
        if kind == EntityKind::Player {
            return Err(EditError::UnsupportedKind);
        }
        if self.state.maze.is_blocked(cell) {
            return Err(EditError::CellBlocked);
        }

        let mut no_players = u8::MAX;
        let _ = factories::spawn_kind(
            &mut self.ecs,
            &mut self.state.maze,
            kind,
            cell,
            &self.config.timing,
            &mut no_players,
        )
        .ok_or(EditError::OutOfBounds)?;
        if kind.counts_as_treasure() {
            self.state.treasures = self.state.treasures.saturating_add(1);
        }
        Ok(Event::EntityPlaced { kind, cell })
    }

    fn remove_entity(&mut self, cell: CellCoord) -> Result<Event, EditError> {
        self.edit_target(cell)?;
        let entities = self.ecs.entities();
        let Some(id) = self
            .state
            .maze
            .occupants(cell)
            .iter()
            .rev()
            .map(|occupant| occupant.entity)
            .find(|id| {
                entities
                    .get(*id)
                    .is_some_and(|components| components.player.is_none())
            })
        else {
            return Err(EditError::NothingToRemove);
        };

        let _ = self.state.maze.remove(&id, cell);
        let removed = self
            .ecs
            .entities_mut()
            .despawn(id)
            .ok_or(EditError::NothingToRemove)?;
        if removed.counts_as_treasure() {
            self.state.treasures = self.state.treasures.saturating_sub(1);
        }
        Ok(Event::EntityRemoved { cell })
    }
}

/// Executes the provided command against the session, appending resulting
/// events to `out`.
pub fn apply(game: &mut Game, command: Command, out: &mut Vec<Event>) {
    out.append(&mut game.state.events);

    let edit = match command {
        Command::Tick { timestamp, input } => {
            game.tick(timestamp, &input, out);
            return;
        }
        Command::Reset => {
            game.reset(out);
            return;
        }
        Command::ToggleWall { cell, direction } => game.toggle_wall(cell, direction),
        Command::PlaceEntity { cell, kind } => game.place_entity(cell, kind),
        Command::RemoveEntity { cell } => game.remove_entity(cell),
    };

    match edit {
        Ok(event) => out.push(event),
        Err(reason) => {
            tracing::warn!(?reason, "edit rejected");
            out.push(Event::EditRejected { reason });
        }
    }
}

/// Phase of a mob's state machine as seen from outside.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MobPhase {
    /// Waiting for a player to come close.
    Asleep,
    /// Playing the wake animation.
    Waking,
    /// Awake and able to be struck down.
    Awake,
    /// Playing the death animation.
    Dying,
}

/// Read-only queries over a running session.
pub mod query {
    use maze_quest_core::{CellCoord, GameConfig, PlayerId, SpriteDraw};
    use maze_quest_ecs::EntityId;
    use maze_quest_world::Maze;

    use super::{Game, MobPhase, PlayerMove};
    use crate::components::Components;

    /// Maze walls and occupant index.
    #[must_use]
    pub fn maze(game: &Game) -> &Maze<EntityId> {
        &game.state.maze
    }

    /// Draw list of the last tick, sorted by paint order.
    #[must_use]
    pub fn frame(game: &Game) -> &[SpriteDraw] {
        &game.state.frame
    }

    /// Configuration the session was started with.
    #[must_use]
    pub fn config(game: &Game) -> &GameConfig {
        &game.config
    }

    /// Treasures still to be collected.
    #[must_use]
    pub fn treasures_remaining(game: &Game) -> u32 {
        game.state.treasures
    }

    /// Reports whether the last treasure was collected.
    #[must_use]
    pub fn is_won(game: &Game) -> bool {
        game.state.win
    }

    /// Player who collected the last treasure.
    #[must_use]
    pub fn winner(game: &Game) -> Option<PlayerId> {
        game.state.winner
    }

    /// Number of player slots in the session.
    #[must_use]
    pub fn player_count(game: &Game) -> usize {
        game.state.players.len()
    }

    /// Cell currently held by the player's avatar.
    #[must_use]
    pub fn player_cell(game: &Game, player: PlayerId) -> Option<CellCoord> {
        game.ecs.entities().iter().find_map(|(_, components)| {
            let avatar = components.player.as_ref()?;
            (avatar.id == player)
                .then_some(components.pos)
                .flatten()
                .map(|pos| pos.cell)
        })
    }

    /// What the player did during the last tick.
    #[must_use]
    pub fn player_move(game: &Game, player: PlayerId) -> Option<PlayerMove> {
        game.state
            .players
            .get(player.index())
            .map(|slot| slot.step)
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(game: &Game) -> usize {
        game.ecs.entities().len()
    }

    /// Components of a live entity.
    #[must_use]
    pub fn components(game: &Game, id: EntityId) -> Option<&Components> {
        game.ecs.entities().get(id)
    }

    /// Phase of the first mob found in `cell`.
    #[must_use]
    pub fn mob_phase(game: &Game, cell: CellCoord) -> Option<MobPhase> {
        game.state
            .maze
            .occupants(cell)
            .iter()
            .filter_map(|occupant| game.ecs.entities().get(occupant.entity))
            .find_map(phase_of)
    }

    fn phase_of(components: &Components) -> Option<MobPhase> {
        if components.die.is_some() {
            return Some(MobPhase::Dying);
        }
        if let Some(wake) = &components.wake {
            return Some(if wake.start.is_some() {
                MobPhase::Waking
            } else {
                MobPhase::Asleep
            });
        }
        components.fightable.as_ref().map(|_| MobPhase::Awake)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_quest_core::{InputToken, PlayerId};

    fn corridor_config() -> GameConfig {
        GameConfig {
            height: 1,
            width: 4,
            treasures: 1,
            ..GameConfig::default()
        }
    }

    fn corridor() -> Maze<EntityKind> {
        let mut layout = Maze::new(1, 4);
        assert!(layout.add(EntityKind::Player, CellCoord::new(0, 0), true));
        assert!(layout.add(EntityKind::Treasure, CellCoord::new(0, 3), false));
        layout
    }

    fn tick(game: &mut Game, millis: u64, tokens: &[InputToken]) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            game,
            Command::Tick {
                timestamp: Duration::from_millis(millis),
                input: vec![PressedKeys::from_tokens(tokens.iter().copied())],
            },
            &mut events,
        );
        events
    }

    #[test]
    fn first_tick_reports_layout_and_starts_music() {
        let mut game = Game::with_layout(corridor_config(), &corridor());
        let events = tick(&mut game, 0, &[]);
        assert_eq!(
            events,
            vec![
                Event::MazeGenerated {
                    height: 1,
                    width: 4,
                    treasures: 1,
                },
                Event::TimeAdvanced {
                    timestamp: Duration::ZERO,
                },
                Event::Audio {
                    cue: AudioCue::BackgroundLoopStart,
                },
            ]
        );
        assert!(!tick(&mut game, 16, &[]).contains(&Event::Audio {
            cue: AudioCue::BackgroundLoopStart,
        }));
    }

    #[test]
    fn position_moves_instantly_while_the_offset_interpolates() {
        let mut game = Game::with_layout(corridor_config(), &corridor());
        let east = [InputToken::Move(Direction::East)];
        let _ = tick(&mut game, 0, &east);
        assert_eq!(
            query::player_cell(&game, PlayerId::new(0)),
            Some(CellCoord::new(0, 1))
        );

        let _ = tick(&mut game, 250, &[]);
        let player = query::frame(&game)
            .iter()
            .find(|draw| draw.cell == CellCoord::new(0, 1))
            .copied()
            .expect("player is drawn");
        assert_eq!(player.offset_x, -0.5);
        assert_eq!(player.offset_y, 0.0);
    }

    #[test]
    fn frame_is_sorted_by_paint_order() {
        let mut game = Game::with_layout(corridor_config(), &corridor());
        let _ = tick(&mut game, 0, &[]);
        let layers: Vec<i32> = query::frame(&game).iter().map(|draw| draw.z_index).collect();
        let mut sorted = layers.clone();
        sorted.sort_unstable();
        assert_eq!(layers, sorted);
        assert_eq!(layers.len(), 2);
    }

    #[test]
    fn backwards_timestamps_are_clamped() {
        let mut game = Game::with_layout(corridor_config(), &corridor());
        let _ = tick(&mut game, 500, &[]);
        let events = tick(&mut game, 100, &[]);
        assert!(events.contains(&Event::TimeAdvanced {
            timestamp: Duration::from_millis(500),
        }));
    }
}
