//! Entity factories: the component bundles each entity kind starts with.

use maze_quest_core::{
    AudioCue, CellCoord, Direction, EntityKind, PlayerId, SpriteKey, SpriteSet, Timing,
};
use maze_quest_ecs::{Ecs, EntityId};
use maze_quest_world::Maze;

use crate::{
    components::{
        ComponentKind, Components, Die, Draw, Fightable, Idle, Move, Pos, Treasure, Wake,
        WalkCycle, Wander,
    },
    state::GameState,
};

const PLAYER_WALK_FRAMES: u8 = 3;
const PLAYER_FIGHT_FRAMES: u8 = 3;
const PLAYER_CHEER_FRAMES: u8 = 2;
const TREASURE_FRAMES: u8 = 4;
const SKELETON_WALK_FRAMES: u8 = 4;
const SKELETON_WAKE_FRAMES: u8 = 4;
const SKELETON_DIE_FRAMES: u8 = 5;
const GHOST_FRAMES: u8 = 3;

const PLAYER_SCALE: f32 = 0.8;
const MOB_SCALE: f32 = 0.8;
const TREASURE_SCALE: f32 = 0.5;
const POT_SCALE: f32 = 0.6;

const FLOOR_Z: i32 = 1;
const MOB_Z: i32 = 2;
const PLAYER_Z: i32 = 3;

/// Prototype of the collectible marker, installed with `insert_default`.
pub(crate) fn treasure_prototype() -> Components {
    Components {
        treasure: Some(Treasure),
        ..Components::default()
    }
}

pub(crate) fn fight_sprites(player: PlayerId) -> SpriteSet {
    SpriteSet::new(SpriteKey::PlayerFight(player), PLAYER_FIGHT_FRAMES)
}

pub(crate) fn cheer_sprites(player: PlayerId) -> SpriteSet {
    SpriteSet::new(SpriteKey::PlayerCheer(player), PLAYER_CHEER_FRAMES)
}

/// Creates an entity of `kind` at `cell` and indexes it in the maze.
///
/// Player slots are handed out in creation order through `next_player`.
pub(crate) fn spawn_kind(
    ecs: &mut Ecs<Components, GameState>,
    maze: &mut Maze<EntityId>,
    kind: EntityKind,
    cell: CellCoord,
    timing: &Timing,
    next_player: &mut u8,
) -> Option<EntityId> {
    let components = match kind {
        EntityKind::Player => {
            let id = PlayerId::new(*next_player);
            *next_player = next_player.checked_add(1)?;
            player(id, cell)
        }
        EntityKind::Treasure => floor_item(cell, SpriteKey::Treasure, TREASURE_SCALE),
        EntityKind::Pot => floor_item(cell, SpriteKey::Pot, POT_SCALE),
        EntityKind::Skeleton => skeleton(cell, timing),
        EntityKind::Ghost => ghost(cell),
    };

    let id = spawn(ecs, maze, components)?;
    if matches!(kind, EntityKind::Treasure | EntityKind::Pot) {
        if let Some(mut entity) = ecs.entity_mut(id) {
            let _ = entity.insert_default(ComponentKind::Treasure);
        }
    }
    tracing::debug!(?kind, ?cell, "spawned entity");
    Some(id)
}

fn spawn(
    ecs: &mut Ecs<Components, GameState>,
    maze: &mut Maze<EntityId>,
    components: Components,
) -> Option<EntityId> {
    let pos = components.pos?;
    let id = ecs.spawn(components);
    if !maze.add(id, pos.cell, pos.blocks) {
        let _ = ecs.entities_mut().despawn(id);
        return None;
    }
    Some(id)
}

fn player(id: PlayerId, cell: CellCoord) -> Components {
    let idle = SpriteSet::new(SpriteKey::PlayerIdle(id), 1);
    let walk = WalkCycle::from_fn(PLAYER_WALK_FRAMES, |direction| {
        SpriteKey::PlayerWalk(id, direction)
    });
    Components {
        pos: Some(Pos { cell, blocks: true }),
        movement: Some(Move::standing(Direction::South, walk, idle)),
        draw: Some(Draw::new(idle, PLAYER_SCALE, PLAYER_Z)),
        player: Some(crate::components::Player {
            id,
            name: format!("Player {}", u16::from(id.get()) + 1),
        }),
        ..Components::default()
    }
}

fn floor_item(cell: CellCoord, key: SpriteKey, scale: f32) -> Components {
    let sprites = SpriteSet::new(key, TREASURE_FRAMES);
    Components {
        pos: Some(Pos {
            cell,
            blocks: false,
        }),
        idle: Some(Idle { sprites }),
        draw: Some(Draw::new(sprites, scale, FLOOR_Z)),
        ..Components::default()
    }
}

fn skeleton(cell: CellCoord, timing: &Timing) -> Components {
    let asleep = SpriteSet::new(SpriteKey::SkeletonSleep, 1);
    let walk = WalkCycle::from_fn(SKELETON_WALK_FRAMES, SpriteKey::SkeletonWalk);

    let corpse = Components {
        pos: Some(Pos {
            cell,
            blocks: false,
        }),
        idle: Some(Idle {
            sprites: SpriteSet::new(SpriteKey::SkeletonCorpse, 1),
        }),
        ..Components::default()
    };
    let death = Die {
        cue: AudioCue::SkeletonDeath,
        start: None,
        progress: 0.0,
        sprites: SpriteSet::new(SpriteKey::SkeletonDie, SKELETON_DIE_FRAMES),
        on_die: Box::new(corpse),
    };
    let awake = Components {
        movement: Some(Move::standing(Direction::South, walk, walk.south)),
        wander: Some(Wander {
            start: None,
            interval: timing.wander_min,
        }),
        fightable: Some(Fightable { death }),
        ..Components::default()
    };

    Components {
        pos: Some(Pos { cell, blocks: true }),
        idle: Some(Idle { sprites: asleep }),
        wake: Some(Wake {
            cue: AudioCue::SkeletonWake,
            respect_walls: false,
            start: None,
            progress: 0.0,
            sprites: SpriteSet::new(SpriteKey::SkeletonWake, SKELETON_WAKE_FRAMES),
            on_wake: Box::new(awake),
        }),
        draw: Some(Draw::new(asleep, MOB_SCALE, MOB_Z)),
        ..Components::default()
    }
}

fn ghost(cell: CellCoord) -> Components {
    let asleep = SpriteSet::new(SpriteKey::GhostSleep, 1);
    let awake = Components {
        pos: Some(Pos {
            cell,
            blocks: false,
        }),
        idle: Some(Idle {
            sprites: SpriteSet::new(SpriteKey::GhostAwake, GHOST_FRAMES),
        }),
        treasure: Some(Treasure),
        ..Components::default()
    };

    Components {
        pos: Some(Pos { cell, blocks: true }),
        idle: Some(Idle { sprites: asleep }),
        wake: Some(Wake {
            cue: AudioCue::GhostWake,
            respect_walls: true,
            start: None,
            progress: 0.0,
            sprites: SpriteSet::new(SpriteKey::GhostWake, GHOST_FRAMES),
            on_wake: Box::new(awake),
        }),
        draw: Some(Draw::new(asleep, MOB_SCALE, MOB_Z)),
        ..Components::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_blocks_as_declared() {
        let timing = Timing::default();
        let cell = CellCoord::new(1, 1);
        let cases = [
            (EntityKind::Treasure, floor_item(cell, SpriteKey::Treasure, TREASURE_SCALE)),
            (EntityKind::Pot, floor_item(cell, SpriteKey::Pot, POT_SCALE)),
            (EntityKind::Skeleton, skeleton(cell, &timing)),
            (EntityKind::Ghost, ghost(cell)),
            (EntityKind::Player, player(PlayerId::new(0), cell)),
        ];
        for (kind, components) in cases {
            let pos = components.pos.expect("every entity has a position");
            assert_eq!(pos.blocks, kind.blocks(), "{kind:?}");
        }
    }

    #[test]
    fn skeleton_becomes_a_non_blocking_corpse() {
        let components = skeleton(CellCoord::new(0, 3), &Timing::default());
        let wake = components.wake.expect("skeletons start asleep");
        let death = wake
            .on_wake
            .fightable
            .as_ref()
            .map(|fightable| fightable.death.clone())
            .expect("awake skeletons can be fought");
        let corpse = death.on_die;
        assert_eq!(corpse.pos.map(|pos| pos.blocks), Some(false));
        assert!(!corpse.counts_as_treasure());
    }

    #[test]
    fn player_names_start_at_one() {
        let components = player(PlayerId::new(1), CellCoord::new(0, 1));
        assert_eq!(
            components.player.map(|player| player.name),
            Some("Player 2".to_owned())
        );
    }
}
