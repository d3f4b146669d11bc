//! Game systems and their registration order.
//!
//! The order below is load-bearing: player intake writes the per-tick
//! [`PlayerMove`](crate::PlayerMove) scratch that the mob systems read later
//! in the same tick, and drawing runs last so it sees every transition.

use std::time::Duration;

use maze_quest_core::{
    AudioCue, CellCoord, Direction, Event, PressedKeys, SpriteDraw, SpriteFrame, SpriteKey,
    SpriteSet, Timing,
};
use maze_quest_ecs::{Ecs, Entities, EntityId, EntityMut};
use maze_quest_world::Maze;
use rand::{seq::SliceRandom, Rng};

use crate::{
    components::{ComponentKind, Components, Fight, Pos},
    factories,
    state::GameState,
};

type Entity<'a> = EntityMut<'a, Components>;

/// Registers every game system in run order.
pub(crate) fn register(ecs: &mut Ecs<Components, GameState>) {
    use ComponentKind as K;

    ecs.add_system("player_intake", &[K::Player, K::Pos, K::Move], player_intake);
    ecs.add_system("fight_window", &[K::Fight], fight_window);
    ecs.add_system("wake", &[K::Pos, K::Wake], wake);
    ecs.add_system("strike", &[K::Pos, K::Fightable], strike);
    ecs.add_system("dying", &[K::Pos, K::Die], dying);
    ecs.add_system("wander", &[K::Pos, K::Move, K::Wander], wander);
    ecs.add_system("collect", &[K::Pos, K::Treasure], collect);
    ecs.add_system("celebrate", &[K::Player, K::Move], celebrate);
    ecs.add_system("animate", &[K::Draw], animate);
    ecs.add_cross_entity_system("render", render);
}

/// Fraction of `span` elapsed since `start`; zero-length spans finish at once.
fn progress(now: Duration, start: Duration, span: Duration) -> f32 {
    if span.is_zero() {
        return 1.0;
    }
    now.saturating_sub(start).as_secs_f32() / span.as_secs_f32()
}

/// Moves the occupant index entry first, then the position.
fn relocate(maze: &mut Maze<EntityId>, id: EntityId, pos: &mut Pos, target: CellCoord) {
    let _ = maze.remove(&id, pos.cell);
    pos.cell = target;
    let _ = maze.add(id, target, pos.blocks);
}

#[derive(Clone, Copy, Debug, Default)]
struct StepChoice {
    attempted: Option<CellCoord>,
    step: Option<(Direction, CellCoord)>,
}

/// Picks the first pressed direction that leads into a free cell.
fn choose_step(maze: &Maze<EntityId>, cell: CellCoord, pressed: &PressedKeys) -> StepChoice {
    let mut choice = StepChoice::default();
    for direction in pressed.directions() {
        let Some(target) = maze.can_move(cell, direction, true) else {
            continue;
        };
        if choice.attempted.is_none() {
            choice.attempted = Some(target);
        }
        if !maze.is_blocked(target) {
            choice.step = Some((direction, target));
            break;
        }
    }
    choice
}

fn player_intake(entity: &mut Entity<'_>, state: &mut GameState, now: Duration) {
    let id = entity.id();
    let Some(Components {
        pos: Some(pos),
        movement: Some(movement),
        player: Some(player),
        fight,
        ..
    }) = entity.components_mut()
    else {
        return;
    };
    let player = player.id;
    let Some(slot) = state.players.get_mut(player.index()) else {
        return;
    };
    let move_time = state.timing.move_time;
    let maze = &mut state.maze;
    let events = &mut state.events;

    if let Some(start) = movement.start {
        movement.progress = progress(now, start, move_time);
        if movement.progress < 1.0 {
            return;
        }

        slot.step.finished = Some(pos.cell);
        events.push(Event::MoveFinished {
            player,
            cell: pos.cell,
        });

        let choice = if state.win {
            StepChoice::default()
        } else {
            choose_step(maze, pos.cell, &slot.pressed)
        };
        slot.step.attempted = choice.attempted;
        match choice.step {
            Some((direction, target)) => {
                let from = pos.cell;
                relocate(maze, id, pos, target);
                movement.direction = direction;
                movement.start = Some(start + move_time);
                movement.progress -= 1.0;
                slot.step.started = Some(target);
                events.push(Event::MoveStarted {
                    player,
                    from,
                    to: target,
                });
            }
            None => {
                movement.start = None;
                movement.progress = 0.0;
            }
        }
        return;
    }

    if state.win {
        return;
    }

    if slot.pressed.fight() {
        if fight.is_none() {
            let target = maze.can_move(pos.cell, movement.direction, true);
            *fight = Some(Fight {
                start: now,
                progress: 0.0,
                sprites: factories::fight_sprites(player),
            });
            slot.step.fight = target;
            events.push(Event::FightStarted { player, target });
        }
        return;
    }
    if fight.is_some() {
        return;
    }

    let choice = choose_step(maze, pos.cell, &slot.pressed);
    slot.step.attempted = choice.attempted;
    match choice.step {
        Some((direction, target)) => {
            let from = pos.cell;
            relocate(maze, id, pos, target);
            movement.direction = direction;
            movement.start = Some(now);
            movement.progress = 0.0;
            slot.step.started = Some(target);
            events.push(Event::MoveStarted {
                player,
                from,
                to: target,
            });
        }
        None => {
            if let Some(direction) = slot.pressed.directions().next() {
                movement.direction = direction;
            }
        }
    }
}

fn fight_window(entity: &mut Entity<'_>, state: &mut GameState, now: Duration) {
    let Some(fight) = entity
        .components_mut()
        .and_then(|components| components.fight.as_mut())
    else {
        return;
    };
    fight.progress = progress(now, fight.start, state.timing.fight_time);
    if fight.progress >= 1.0 {
        let _ = entity.remove_component(ComponentKind::Fight);
    }
}

/// Whether a player heading for `target` is close enough to wake a mob in `mob`.
fn within_reach(maze: &Maze<EntityId>, target: CellCoord, mob: CellCoord, respect_walls: bool) -> bool {
    let distance = target.manhattan_distance(mob);
    if !respect_walls {
        return distance <= 1;
    }
    match distance {
        0 => true,
        1 => Direction::between(target, mob).is_some_and(|direction| !maze.has_wall(target, direction)),
        _ => false,
    }
}

/// Installs `bundle` on the entity, keeping its cell and re-indexing the maze
/// when the blocking flag changes.
fn evolve(entity: &mut Entity<'_>, bundle: Components, maze: &mut Maze<EntityId>) {
    let id = entity.id();
    let before = entity.components().and_then(|components| components.pos);
    let _ = entity.insert(bundle);

    let (Some(before), Some(after)) = (
        before,
        entity
            .components_mut()
            .and_then(|components| components.pos.as_mut()),
    ) else {
        return;
    };
    after.cell = before.cell;
    if after.blocks != before.blocks {
        let _ = maze.remove(&id, before.cell);
        let _ = maze.add(id, before.cell, after.blocks);
    }
}

fn wake(entity: &mut Entity<'_>, state: &mut GameState, now: Duration) {
    let Some(Components {
        pos: Some(pos),
        wake: Some(wake),
        ..
    }) = entity.components_mut()
    else {
        return;
    };
    let cell = pos.cell;

    let Some(start) = wake.start else {
        let respect_walls = wake.respect_walls;
        let approached = state
            .approach_targets()
            .any(|target| within_reach(&state.maze, target, cell, respect_walls));
        if approached {
            wake.start = Some(now);
            state.events.push(Event::Audio { cue: wake.cue });
            state.events.push(Event::MobWoke { cell });
            tracing::debug!(?cell, "mob woke up");
        }
        return;
    };

    wake.progress = progress(now, start, state.timing.wake_time);
    if wake.progress < 1.0 {
        return;
    }
    let Some(awake) = entity
        .components_mut()
        .and_then(|components| components.wake.take())
        .map(|wake| *wake.on_wake)
    else {
        return;
    };
    let moves = awake.movement.is_some();
    evolve(entity, awake, &mut state.maze);
    if moves {
        // Moving mobs draw from their movement strips only.
        let _ = entity.remove_component(ComponentKind::Idle);
    }
}

fn strike(entity: &mut Entity<'_>, state: &mut GameState, now: Duration) {
    let Some(cell) = entity
        .components()
        .and_then(|components| components.pos)
        .map(|pos| pos.cell)
    else {
        return;
    };
    if !state.struck(cell) {
        return;
    }
    let Some(fightable) = entity
        .components_mut()
        .and_then(|components| components.fightable.take())
    else {
        return;
    };
    for kind in [ComponentKind::Move, ComponentKind::Wander, ComponentKind::Idle] {
        let _ = entity.remove_component(kind);
    }

    let mut death = fightable.death;
    death.start = Some(now);
    death.progress = 0.0;
    let cue = death.cue;
    let _ = entity.insert(Components {
        die: Some(death),
        ..Components::default()
    });

    state.events.push(Event::Audio { cue });
    state.events.push(Event::MobStruck { cell });
    tracing::debug!(?cell, "mob struck");
}

fn dying(entity: &mut Entity<'_>, state: &mut GameState, now: Duration) {
    let Some(Components {
        pos: Some(pos),
        die: Some(die),
        ..
    }) = entity.components_mut()
    else {
        return;
    };
    let cell = pos.cell;
    let Some(start) = die.start else {
        die.start = Some(now);
        return;
    };
    die.progress = progress(now, start, state.timing.die_time);
    if die.progress < 1.0 {
        return;
    }

    let Some(remains) = entity
        .components_mut()
        .and_then(|components| components.die.take())
        .map(|die| *die.on_die)
    else {
        return;
    };
    evolve(entity, remains, &mut state.maze);
    state.events.push(Event::MobDied { cell });
    tracing::debug!(?cell, "mob died");
}

fn next_interval<R: Rng + ?Sized>(rng: &mut R, timing: &Timing) -> Duration {
    if timing.wander_max <= timing.wander_min {
        return timing.wander_min;
    }
    rng.gen_range(timing.wander_min..=timing.wander_max)
}

fn wander(entity: &mut Entity<'_>, state: &mut GameState, now: Duration) {
    let id = entity.id();
    let Some(Components {
        pos: Some(pos),
        movement: Some(movement),
        wander: Some(wander),
        ..
    }) = entity.components_mut()
    else {
        return;
    };
    let timing = state.timing;

    if let Some(start) = movement.start {
        movement.progress = progress(now, start, timing.move_time);
        if movement.progress >= 1.0 {
            movement.start = None;
            movement.progress = 0.0;
            wander.start = Some(now);
        }
        return;
    }

    let Some(paused_at) = wander.start else {
        wander.start = Some(now);
        return;
    };
    if now < paused_at + wander.interval {
        return;
    }

    let mut directions = Direction::ALL;
    directions.shuffle(&mut state.rng);
    let step = directions.into_iter().find_map(|direction| {
        state
            .maze
            .can_move(pos.cell, direction, false)
            .map(|target| (direction, target))
    });

    wander.start = Some(now);
    wander.interval = next_interval(&mut state.rng, &timing);
    if let Some((direction, target)) = step {
        relocate(&mut state.maze, id, pos, target);
        movement.direction = direction;
        movement.start = Some(now);
        movement.progress = 0.0;
    }
}

fn collect(entity: &mut Entity<'_>, state: &mut GameState, _now: Duration) {
    let Some(cell) = entity
        .components()
        .and_then(|components| components.pos)
        .map(|pos| pos.cell)
    else {
        return;
    };
    let Some(player) = state.finished_on(cell) else {
        return;
    };

    let id = entity.id();
    if entity.despawn().is_none() {
        return;
    }
    let _ = state.maze.remove(&id, cell);
    state.treasures = state.treasures.saturating_sub(1);
    state.events.push(Event::Audio {
        cue: AudioCue::TreasurePickup,
    });
    state.events.push(Event::TreasureCollected {
        player,
        cell,
        remaining: state.treasures,
    });

    if state.treasures == 0 && !state.win {
        state.win = true;
        state.winner = Some(player);
        state.events.push(Event::Audio {
            cue: AudioCue::BackgroundLoopStop,
        });
        state.events.push(Event::Audio { cue: AudioCue::Win });
        state.events.push(Event::Won { player });
        tracing::info!(player = player.get(), "all treasure collected");
    }
}

fn celebrate(entity: &mut Entity<'_>, state: &mut GameState, _now: Duration) {
    let Some(winner) = state.winner else {
        return;
    };
    let Some(Components {
        movement: Some(movement),
        player: Some(player),
        ..
    }) = entity.components_mut()
    else {
        return;
    };
    if player.id == winner && movement.idle.key() != SpriteKey::PlayerCheer(winner) {
        movement.idle = factories::cheer_sprites(winner);
    }
}

/// Frame of a strip played once over `progress`.
fn timed_frame(sprites: SpriteSet, progress: f32) -> SpriteFrame {
    let frames = f32::from(sprites.frames());
    let index = (progress.clamp(0.0, 1.0) * frames) as u32;
    sprites.frame(index.min(u32::from(sprites.frames()) - 1))
}

/// Frame of a looping strip after `elapsed`, one frame per `sprite_time`.
fn looping_index(elapsed: Duration, sprite_time: Duration, frames: u8) -> u32 {
    if sprite_time.is_zero() || frames == 0 {
        return 0;
    }
    let interval = elapsed.as_nanos() / sprite_time.as_nanos();
    (interval % u128::from(frames)) as u32
}

/// Walking frame: frame zero is the standing pose, the rest loop while moving.
fn walk_frame(sprites: SpriteSet, elapsed: Duration, sprite_time: Duration) -> SpriteFrame {
    let frames = sprites.frames();
    if frames <= 1 {
        return sprites.frame(0);
    }
    sprites.frame(looping_index(elapsed, sprite_time, frames - 1) + 1)
}

/// Sprite frame and offset of an entity, by priority die > wake > fight > move > idle.
fn appearance(components: &Components, now: Duration, timing: &Timing) -> Option<(SpriteFrame, f32, f32)> {
    if let Some(die) = &components.die {
        return Some((timed_frame(die.sprites, die.progress), 0.0, 0.0));
    }
    if let Some(wake) = components.wake.as_ref().filter(|wake| wake.start.is_some()) {
        return Some((timed_frame(wake.sprites, wake.progress), 0.0, 0.0));
    }
    if let Some(fight) = &components.fight {
        return Some((timed_frame(fight.sprites, fight.progress), 0.0, 0.0));
    }
    if let Some(movement) = &components.movement {
        let Some(start) = movement.start else {
            return Some((movement.idle.frame(0), 0.0, 0.0));
        };
        let strip = movement.walk.heading(movement.direction);
        let frame = walk_frame(strip, now.saturating_sub(start), timing.sprite_time);
        let remaining = 1.0 - movement.progress.clamp(0.0, 1.0);
        let (rows, columns) = movement.direction.delta();
        return Some((
            frame,
            -(columns as f32) * remaining,
            -(rows as f32) * remaining,
        ));
    }
    let idle = components.idle.as_ref()?;
    let index = looping_index(now, timing.sprite_time, idle.sprites.frames());
    Some((idle.sprites.frame(index), 0.0, 0.0))
}

fn animate(entity: &mut Entity<'_>, state: &mut GameState, now: Duration) {
    let Some(components) = entity.components_mut() else {
        return;
    };
    let Some((sprite, offset_x, offset_y)) = appearance(components, now, &state.timing) else {
        return;
    };
    let Some(draw) = components.draw.as_mut() else {
        return;
    };
    draw.sprite = sprite;
    draw.offset_x = offset_x;
    draw.offset_y = offset_y;
}

fn render(entities: &mut Entities<Components>, state: &mut GameState, _now: Duration) {
    state.frame.clear();
    state
        .frame
        .extend(entities.iter().filter_map(|(_, components)| {
            let pos = components.pos?;
            let draw = components.draw?;
            Some(SpriteDraw {
                cell: pos.cell,
                sprite: draw.sprite,
                offset_x: draw.offset_x,
                offset_y: draw.offset_y,
                scale: draw.scale,
                z_index: draw.z_index,
            })
        }));
    state
        .frame
        .sort_by_key(|draw| (draw.z_index, draw.cell.row(), draw.cell.column()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_frames_skip_the_standing_pose() {
        let strip = SpriteSet::new(SpriteKey::Treasure, 3);
        let sprite_time = Duration::from_millis(100);
        let indices: Vec<u8> = [0, 100, 200, 300]
            .into_iter()
            .map(|millis| walk_frame(strip, Duration::from_millis(millis), sprite_time).index)
            .collect();
        assert_eq!(indices, vec![1, 2, 1, 2]);
    }

    #[test]
    fn timed_frames_stop_on_the_last_frame() {
        let strip = SpriteSet::new(SpriteKey::SkeletonDie, 5);
        assert_eq!(timed_frame(strip, 0.0).index, 0);
        assert_eq!(timed_frame(strip, 0.5).index, 2);
        assert_eq!(timed_frame(strip, 1.0).index, 4);
        assert_eq!(timed_frame(strip, 7.0).index, 4);
    }

    #[test]
    fn zero_length_spans_complete_immediately() {
        let now = Duration::from_millis(40);
        assert_eq!(progress(now, now, Duration::ZERO), 1.0);
        assert_eq!(
            progress(Duration::from_millis(250), Duration::ZERO, Duration::from_millis(500)),
            0.5
        );
    }

    #[test]
    fn walls_keep_wall_respecting_mobs_asleep() {
        let mut maze: Maze<EntityId> = Maze::new(2, 2);
        let target = CellCoord::new(0, 1);
        let mob = CellCoord::new(1, 1);
        assert!(within_reach(&maze, target, mob, true));
        assert!(maze.set_wall(target, Direction::South, true));
        assert!(!within_reach(&maze, target, mob, true));
        assert!(within_reach(&maze, target, mob, false));
        assert!(!within_reach(&maze, CellCoord::new(0, 0), mob, false));
    }
}
