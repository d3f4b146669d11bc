//! Mutable context shared by every system during a tick.

use maze_quest_core::{CellCoord, Event, PlayerId, PressedKeys, SpriteDraw, Timing};
use maze_quest_ecs::EntityId;
use maze_quest_world::Maze;
use rand_chacha::ChaCha8Rng;

/// What one player did during the current tick.
///
/// Cleared before the systems run, written by player intake and read by the
/// mob systems later in the same tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlayerMove {
    /// Target of the first pressed direction without a wall, even if occupied.
    pub attempted: Option<CellCoord>,
    /// Cell a step started toward.
    pub started: Option<CellCoord>,
    /// Cell a step finished in.
    pub finished: Option<CellCoord>,
    /// Cell a swing was aimed at.
    pub fight: Option<CellCoord>,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct PlayerSlot {
    pub(crate) pressed: PressedKeys,
    pub(crate) step: PlayerMove,
}

#[derive(Debug)]
pub(crate) struct GameState {
    pub(crate) maze: Maze<EntityId>,
    pub(crate) players: Vec<PlayerSlot>,
    pub(crate) treasures: u32,
    pub(crate) win: bool,
    pub(crate) winner: Option<PlayerId>,
    pub(crate) events: Vec<Event>,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) timing: Timing,
    pub(crate) frame: Vec<SpriteDraw>,
}

impl GameState {
    pub(crate) fn new(
        maze: Maze<EntityId>,
        players: usize,
        treasures: u32,
        rng: ChaCha8Rng,
        timing: Timing,
    ) -> Self {
        Self {
            maze,
            players: vec![PlayerSlot::default(); players],
            treasures,
            win: false,
            winner: None,
            events: Vec::new(),
            rng,
            timing,
            frame: Vec::new(),
        }
    }

    /// Clears the per-tick scratch and records the tokens held this frame.
    pub(crate) fn begin_tick(&mut self, input: &[PressedKeys]) {
        for (index, slot) in self.players.iter_mut().enumerate() {
            slot.step = PlayerMove::default();
            slot.pressed = input.get(index).cloned().unwrap_or_default();
        }
    }

    /// Player whose step of this tick ended on `cell`.
    pub(crate) fn finished_on(&self, cell: CellCoord) -> Option<PlayerId> {
        self.players
            .iter()
            .position(|slot| slot.step.finished == Some(cell))
            .and_then(player_id)
    }

    /// Reports whether any swing of this tick was aimed at `cell`.
    pub(crate) fn struck(&self, cell: CellCoord) -> bool {
        self.players.iter().any(|slot| slot.step.fight == Some(cell))
    }

    /// Cells players tried to enter or started entering this tick.
    pub(crate) fn approach_targets(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.players
            .iter()
            .flat_map(|slot| [slot.step.attempted, slot.step.started])
            .flatten()
    }
}

pub(crate) fn player_id(index: usize) -> Option<PlayerId> {
    u8::try_from(index).ok().map(PlayerId::new)
}
