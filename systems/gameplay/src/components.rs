//! Component records attached to Maze Quest entities.
//!
//! Every entity is a [`Components`] value whose optional fields name the
//! facets it currently has. Mob state machines are expressed by which fields
//! are present: a sleeping skeleton carries `wake`, an awake one carries
//! `movement`, `wander` and `fightable`, a dying one carries `die`.

use std::time::Duration;

use maze_quest_core::{AudioCue, CellCoord, Direction, PlayerId, SpriteFrame, SpriteSet};
use maze_quest_ecs::ComponentSet;

/// Cell occupied by the entity and whether it blocks others.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pos {
    /// Occupied cell, kept in sync with the maze occupant index.
    pub cell: CellCoord,
    /// Whether other entities are kept out of the cell.
    pub blocks: bool,
}

/// Walking strips, one per heading.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WalkCycle {
    /// Strip used while heading north.
    pub north: SpriteSet,
    /// Strip used while heading east.
    pub east: SpriteSet,
    /// Strip used while heading south.
    pub south: SpriteSet,
    /// Strip used while heading west.
    pub west: SpriteSet,
}

impl WalkCycle {
    /// Builds a cycle from a key constructor and a shared frame count.
    #[must_use]
    pub fn from_fn<F>(frames: u8, key: F) -> Self
    where
        F: Fn(Direction) -> maze_quest_core::SpriteKey,
    {
        Self {
            north: SpriteSet::new(key(Direction::North), frames),
            east: SpriteSet::new(key(Direction::East), frames),
            south: SpriteSet::new(key(Direction::South), frames),
            west: SpriteSet::new(key(Direction::West), frames),
        }
    }

    /// Strip for the provided heading.
    #[must_use]
    pub const fn heading(&self, direction: Direction) -> SpriteSet {
        match direction {
            Direction::North => self.north,
            Direction::East => self.east,
            Direction::South => self.south,
            Direction::West => self.west,
        }
    }
}

/// Cell-to-cell movement state shared by players and wandering mobs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Move {
    /// Heading of the current or last step; also the facing used for fights.
    pub direction: Direction,
    /// Timestamp the step in flight started at, `None` when standing.
    pub start: Option<Duration>,
    /// Fraction of the step in flight that has elapsed.
    pub progress: f32,
    /// Strips shown while walking.
    pub walk: WalkCycle,
    /// Strip shown while standing.
    pub idle: SpriteSet,
}

impl Move {
    /// Creates a standing movement record facing `direction`.
    #[must_use]
    pub const fn standing(direction: Direction, walk: WalkCycle, idle: SpriteSet) -> Self {
        Self {
            direction,
            start: None,
            progress: 0.0,
            walk,
            idle,
        }
    }
}

/// Static appearance of an entity without movement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Idle {
    /// Strip shown while idle.
    pub sprites: SpriteSet,
}

/// Marker for collectibles counted against the treasure goal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Treasure;

/// Sleeping state that turns into `on_wake` once a player comes close.
#[derive(Clone, Debug, PartialEq)]
pub struct Wake {
    /// Cue emitted when the mob starts waking.
    pub cue: AudioCue,
    /// Whether a wall between the player and the mob prevents waking.
    pub respect_walls: bool,
    /// Timestamp waking started at, `None` while asleep.
    pub start: Option<Duration>,
    /// Fraction of the wake animation that has elapsed.
    pub progress: f32,
    /// Strip played while waking.
    pub sprites: SpriteSet,
    /// Components installed once waking completes.
    pub on_wake: Box<Components>,
}

/// Timer deciding when a wandering mob takes its next step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wander {
    /// Timestamp the current pause started at, `None` until armed.
    pub start: Option<Duration>,
    /// Length of the current pause.
    pub interval: Duration,
}

/// Timed death animation that turns into `on_die` once finished.
#[derive(Clone, Debug, PartialEq)]
pub struct Die {
    /// Cue emitted when the blow lands.
    pub cue: AudioCue,
    /// Timestamp dying started at.
    pub start: Option<Duration>,
    /// Fraction of the death animation that has elapsed.
    pub progress: f32,
    /// Strip played while dying.
    pub sprites: SpriteSet,
    /// Components installed once dying completes.
    pub on_die: Box<Components>,
}

/// Draw state recomputed every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Draw {
    /// Selected frame.
    pub sprite: SpriteFrame,
    /// Uniform scale of the sprite.
    pub scale: f32,
    /// Horizontal offset from the cell origin, in cells.
    pub offset_x: f32,
    /// Vertical offset from the cell origin, in cells.
    pub offset_y: f32,
    /// Paint order.
    pub z_index: i32,
}

impl Draw {
    /// Creates a draw record showing the first frame of `sprites`.
    #[must_use]
    pub const fn new(sprites: SpriteSet, scale: f32, z_index: i32) -> Self {
        Self {
            sprite: sprites.frame(0),
            scale,
            offset_x: 0.0,
            offset_y: 0.0,
            z_index,
        }
    }
}

/// Marks a player avatar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    /// Player slot driving the avatar.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
}

/// Weapon swing in progress.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fight {
    /// Timestamp the swing started at.
    pub start: Duration,
    /// Fraction of the swing that has elapsed.
    pub progress: f32,
    /// Strip played while swinging.
    pub sprites: SpriteSet,
}

/// Marks a mob that dies when a swing lands on its cell.
#[derive(Clone, Debug, PartialEq)]
pub struct Fightable {
    /// Death animation installed when the mob is struck.
    pub death: Die,
}

/// Tag naming one field of [`Components`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// [`Pos`].
    Pos,
    /// [`Move`].
    Move,
    /// [`Idle`].
    Idle,
    /// [`Treasure`].
    Treasure,
    /// [`Wake`].
    Wake,
    /// [`Wander`].
    Wander,
    /// [`Die`].
    Die,
    /// [`Draw`].
    Draw,
    /// [`Player`].
    Player,
    /// [`Fight`].
    Fight,
    /// [`Fightable`].
    Fightable,
}

/// Every component an entity may carry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Components {
    /// Position in the maze.
    pub pos: Option<Pos>,
    /// Cell-to-cell movement.
    pub movement: Option<Move>,
    /// Static appearance.
    pub idle: Option<Idle>,
    /// Collectible marker.
    pub treasure: Option<Treasure>,
    /// Sleeping state.
    pub wake: Option<Wake>,
    /// Wandering timer.
    pub wander: Option<Wander>,
    /// Death animation.
    pub die: Option<Die>,
    /// Draw state.
    pub draw: Option<Draw>,
    /// Player marker.
    pub player: Option<Player>,
    /// Swing in progress.
    pub fight: Option<Fight>,
    /// Can be struck down.
    pub fightable: Option<Fightable>,
}

impl Components {
    /// Reports whether the entity counts toward the remaining treasure,
    /// either now or once it wakes up.
    #[must_use]
    pub fn counts_as_treasure(&self) -> bool {
        self.treasure.is_some()
            || self
                .wake
                .as_ref()
                .is_some_and(|wake| wake.on_wake.treasure.is_some())
    }
}

impl ComponentSet for Components {
    type Kind = ComponentKind;

    fn contains(&self, kind: ComponentKind) -> bool {
        match kind {
            ComponentKind::Pos => self.pos.is_some(),
            ComponentKind::Move => self.movement.is_some(),
            ComponentKind::Idle => self.idle.is_some(),
            ComponentKind::Treasure => self.treasure.is_some(),
            ComponentKind::Wake => self.wake.is_some(),
            ComponentKind::Wander => self.wander.is_some(),
            ComponentKind::Die => self.die.is_some(),
            ComponentKind::Draw => self.draw.is_some(),
            ComponentKind::Player => self.player.is_some(),
            ComponentKind::Fight => self.fight.is_some(),
            ComponentKind::Fightable => self.fightable.is_some(),
        }
    }

    fn remove(&mut self, kind: ComponentKind) -> bool {
        match kind {
            ComponentKind::Pos => self.pos.take().is_some(),
            ComponentKind::Move => self.movement.take().is_some(),
            ComponentKind::Idle => self.idle.take().is_some(),
            ComponentKind::Treasure => self.treasure.take().is_some(),
            ComponentKind::Wake => self.wake.take().is_some(),
            ComponentKind::Wander => self.wander.take().is_some(),
            ComponentKind::Die => self.die.take().is_some(),
            ComponentKind::Draw => self.draw.take().is_some(),
            ComponentKind::Player => self.player.take().is_some(),
            ComponentKind::Fight => self.fight.take().is_some(),
            ComponentKind::Fightable => self.fightable.take().is_some(),
        }
    }

    fn absorb(&mut self, other: Self) {
        let Self {
            pos,
            movement,
            idle,
            treasure,
            wake,
            wander,
            die,
            draw,
            player,
            fight,
            fightable,
        } = other;

        overwrite(&mut self.pos, pos);
        overwrite(&mut self.movement, movement);
        overwrite(&mut self.idle, idle);
        overwrite(&mut self.treasure, treasure);
        overwrite(&mut self.wake, wake);
        overwrite(&mut self.wander, wander);
        overwrite(&mut self.die, die);
        overwrite(&mut self.draw, draw);
        overwrite(&mut self.player, player);
        overwrite(&mut self.fight, fight);
        overwrite(&mut self.fightable, fightable);
    }
}

fn overwrite<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_quest_core::SpriteKey;

    fn idle(key: SpriteKey) -> Components {
        Components {
            idle: Some(Idle {
                sprites: SpriteSet::new(key, 1),
            }),
            ..Components::default()
        }
    }

    #[test]
    fn absorb_keeps_fields_missing_from_the_bundle() {
        let mut target = Components {
            pos: Some(Pos {
                cell: CellCoord::new(2, 3),
                blocks: true,
            }),
            ..idle(SpriteKey::SkeletonSleep)
        };
        target.absorb(Components {
            treasure: Some(Treasure),
            ..idle(SpriteKey::GhostAwake)
        });

        assert_eq!(target.pos.map(|pos| pos.cell), Some(CellCoord::new(2, 3)));
        assert_eq!(
            target.idle.map(|idle| idle.sprites.key()),
            Some(SpriteKey::GhostAwake)
        );
        assert!(target.contains(ComponentKind::Treasure));
    }

    #[test]
    fn sleeping_ghost_counts_as_treasure() {
        let ghost = Components {
            wake: Some(Wake {
                cue: AudioCue::GhostWake,
                respect_walls: true,
                start: None,
                progress: 0.0,
                sprites: SpriteSet::new(SpriteKey::GhostWake, 3),
                on_wake: Box::new(Components {
                    treasure: Some(Treasure),
                    ..Components::default()
                }),
            }),
            ..Components::default()
        };
        assert!(ghost.counts_as_treasure());
        assert!(!idle(SpriteKey::SkeletonCorpse).counts_as_treasure());
    }

    #[test]
    fn remove_reports_presence() {
        let mut components = idle(SpriteKey::Pot);
        assert!(components.remove(ComponentKind::Idle));
        assert!(!components.remove(ComponentKind::Idle));
        assert!(!components.contains(ComponentKind::Idle));
    }
}
