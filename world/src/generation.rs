//! Procedural maze generation: entity placement, randomized depth-first
//! spanning-tree carving and loop carving around ghosts.

use maze_quest_core::{CellCoord, Direction, EntityKind, GameConfig};
use rand::Rng;
use thiserror::Error;

use crate::{flood::FloodField, Maze};

/// Minimum distance gap a carved loop must bridge before a ghost is accepted.
pub const LOOP_THRESHOLD: u32 = 3;

/// Reasons maze generation can fail.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// The grid has no cells.
    #[error("a {height}x{width} maze has no cells")]
    EmptyGrid {
        /// Requested number of rows.
        height: u32,
        /// Requested number of columns.
        width: u32,
    },
    /// More entities were requested than eligible cells exist.
    #[error("{requested} entities requested but only {available} cells are eligible")]
    Overcrowded {
        /// Number of entities requested.
        requested: u64,
        /// Number of cells able to hold them.
        available: u64,
    },
    /// The attempt budget ran out while searching for a free cell.
    #[error("no free cell found for {kind:?} after {attempts} attempts")]
    NoFreeCell {
        /// Kind of entity being placed.
        kind: EntityKind,
        /// Attempts spent.
        attempts: u32,
    },
    /// The attempt budget ran out while searching for a loop around a ghost.
    #[error("no loop could be carved around a ghost after {attempts} attempts")]
    NoLoopCandidate {
        /// Attempts spent.
        attempts: u32,
    },
}

/// Generates a maze blueprint holding the kinds of every placed entity.
///
/// Players are placed at the start corner, then treasures, pots and
/// skeletons are scattered outside the start area, the spanning tree is
/// carved, and finally each ghost is placed together with one carved loop.
pub fn generate<R>(config: &GameConfig, rng: &mut R) -> Result<Maze<EntityKind>, GenerationError>
where
    R: Rng + ?Sized,
{
    let (height, width) = (config.height, config.width);
    if height == 0 || width == 0 {
        return Err(GenerationError::EmptyGrid { height, width });
    }

    let mut maze = Maze::walled(height, width);

    let starts = start_cells(height, width);
    let player_count = usize::from(config.players.player_count());
    if player_count > starts.len() {
        return Err(GenerationError::Overcrowded {
            requested: player_count as u64,
            available: starts.len() as u64,
        });
    }
    for cell in starts.into_iter().take(player_count) {
        let _ = maze.add(EntityKind::Player, cell, EntityKind::Player.blocks());
    }

    let requested = u64::from(config.treasures)
        + u64::from(config.pots)
        + u64::from(config.skeletons)
        + u64::from(config.ghosts);
    let available = maze.cells().filter(|cell| !in_start_area(*cell)).count() as u64;
    if requested > available {
        return Err(GenerationError::Overcrowded {
            requested,
            available,
        });
    }

    let budget = attempt_budget(height, width);
    for (kind, count) in [
        (EntityKind::Treasure, config.treasures),
        (EntityKind::Pot, config.pots),
        (EntityKind::Skeleton, config.skeletons),
    ] {
        for _ in 0..count {
            let cell = find_free_cell(&maze, rng, budget)
                .ok_or(GenerationError::NoFreeCell {
                    kind,
                    attempts: budget,
                })?;
            let _ = maze.add(kind, cell, kind.blocks());
        }
    }

    carve_spanning_tree(&mut maze, rng);
    debug_assert!(maze.is_connected(), "spanning tree must reach every cell");

    for _ in 0..config.ghosts {
        place_ghost(&mut maze, rng, budget)?;
    }

    tracing::info!(
        height,
        width,
        treasures = config.treasure_goal(),
        skeletons = config.skeletons,
        "maze generated"
    );
    Ok(maze)
}

/// Carves a spanning tree into `maze` with a randomized depth-first search.
///
/// Uses an explicit stack whose frames remember the shuffled direction order
/// and a cursor, which visits cells in the same order as the recursive
/// formulation without growing the call stack.
pub fn carve_spanning_tree<E, R>(maze: &mut Maze<E>, rng: &mut R)
where
    R: Rng + ?Sized,
{
    if maze.cell_count() == 0 {
        return;
    }

    let start = random_cell(maze, rng);
    let mut visited = vec![false; maze.cell_count()];
    if let Some(index) = maze.cell_index(start) {
        visited[index] = true;
    }
    let mut stack = vec![Frame::new(start, shuffled_directions(rng))];

    while let Some(frame) = stack.last_mut() {
        let Some(&direction) = frame.order.get(frame.cursor) else {
            let _ = stack.pop();
            continue;
        };
        frame.cursor += 1;
        let cell = frame.cell;

        let Some(next) = cell.neighbor(direction).filter(|next| maze.contains(*next)) else {
            continue;
        };
        let Some(index) = maze.cell_index(next) else {
            continue;
        };
        if visited[index] {
            continue;
        }

        let _ = maze.set_wall(cell, direction, false);
        visited[index] = true;
        stack.push(Frame::new(next, shuffled_directions(rng)));
    }
}

/// Attempts to carve a loop that lets players walk around a ghost at `cell`.
///
/// The cell must have exactly two open edges leading to unblocked neighbours.
/// Returns `true` and removes one wall when a wall bridging a distance gap
/// larger than [`LOOP_THRESHOLD`] exists.
pub fn create_loop<E>(maze: &mut Maze<E>, cell: CellCoord) -> bool {
    let open: Vec<CellCoord> = maze
        .open_directions(cell)
        .filter_map(|direction| cell.neighbor(direction))
        .collect();
    let [positive, negative] = open.as_slice() else {
        return false;
    };
    if maze.is_blocked(*positive) || maze.is_blocked(*negative) {
        return false;
    }

    let field = FloodField::around(maze, cell, *positive, *negative);
    let Some(wall) = field.widest_wall(maze) else {
        return false;
    };
    if wall.gap <= LOOP_THRESHOLD {
        return false;
    }

    tracing::debug!(
        ghost = ?cell,
        wall = ?wall.cell,
        direction = ?wall.direction,
        gap = wall.gap,
        "carved loop around ghost"
    );
    maze.set_wall(wall.cell, wall.direction, false)
}

/// Reports whether a cell lies in the start area, which holds nothing but the
/// players after generation.
#[must_use]
pub fn in_start_area(cell: CellCoord) -> bool {
    cell.row().saturating_add(cell.column()) <= 1
}

fn place_ghost<R>(maze: &mut Maze<EntityKind>, rng: &mut R, budget: u32) -> Result<(), GenerationError>
where
    R: Rng + ?Sized,
{
    for _ in 0..budget {
        let cell = random_cell(maze, rng);
        if in_start_area(cell) || !maze.occupants(cell).is_empty() {
            continue;
        }
        if create_loop(maze, cell) {
            let _ = maze.add(EntityKind::Ghost, cell, EntityKind::Ghost.blocks());
            return Ok(());
        }
    }
    Err(GenerationError::NoLoopCandidate { attempts: budget })
}

/// Random unoccupied cell outside the start area.
///
/// Pots share the exclusion with treasures and mobs, so the start corner holds
/// only players and the `Overcrowded` check counts a single pool of cells.
fn find_free_cell<R>(maze: &Maze<EntityKind>, rng: &mut R, budget: u32) -> Option<CellCoord>
where
    R: Rng + ?Sized,
{
    (0..budget)
        .map(|_| random_cell(maze, rng))
        .find(|cell| !in_start_area(*cell) && maze.occupants(*cell).is_empty())
}

fn start_cells(height: u32, width: u32) -> Vec<CellCoord> {
    let mut cells = vec![CellCoord::new(0, 0)];
    if width > 1 {
        cells.push(CellCoord::new(0, 1));
    } else if height > 1 {
        cells.push(CellCoord::new(1, 0));
    }
    cells
}

fn attempt_budget(height: u32, width: u32) -> u32 {
    height
        .saturating_mul(width)
        .saturating_mul(4)
        .saturating_add(64)
}

fn random_cell<E, R>(maze: &Maze<E>, rng: &mut R) -> CellCoord
where
    R: Rng + ?Sized,
{
    let row = rng.gen_range(0..maze.height());
    let column = rng.gen_range(0..maze.width());
    CellCoord::new(row, column)
}

fn shuffled_directions<R>(rng: &mut R) -> [Direction; 4]
where
    R: Rng + ?Sized,
{
    let mut order = [
        Direction::North,
        Direction::West,
        Direction::East,
        Direction::South,
    ];
    for index in (1..order.len()).rev() {
        let swap = rng.gen_range(0..=index);
        order.swap(index, swap);
    }
    order
}

#[derive(Clone, Copy, Debug)]
struct Frame {
    cell: CellCoord,
    order: [Direction; 4],
    cursor: usize,
}

impl Frame {
    fn new(cell: CellCoord, order: [Direction; 4]) -> Self {
        Self {
            cell,
            order,
            cursor: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn config(height: u32, width: u32) -> GameConfig {
        GameConfig {
            height,
            width,
            treasures: 0,
            ..GameConfig::default()
        }
    }

    #[test]
    fn start_area_covers_corner_and_its_neighbours() {
        assert!(in_start_area(CellCoord::new(0, 0)));
        assert!(in_start_area(CellCoord::new(0, 1)));
        assert!(in_start_area(CellCoord::new(1, 0)));
        assert!(!in_start_area(CellCoord::new(1, 1)));
        assert!(!in_start_area(CellCoord::new(0, 2)));
    }

    #[test]
    fn spanning_tree_has_exactly_cells_minus_one_openings() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut maze: Maze<u8> = Maze::walled(7, 9);
        carve_spanning_tree(&mut maze, &mut rng);

        let mut openings = 0;
        for cell in maze.cells() {
            for direction in [Direction::East, Direction::South] {
                if !maze.has_wall(cell, direction) {
                    openings += 1;
                }
            }
        }
        assert_eq!(openings, 7 * 9 - 1);
        assert!(maze.is_connected());
    }

    #[test]
    fn empty_grid_is_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let error = generate(&config(0, 5), &mut rng).expect_err("empty grid");
        assert_eq!(error, GenerationError::EmptyGrid { height: 0, width: 5 });
    }

    #[test]
    fn overcrowded_request_fails_fast() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let crowded = GameConfig {
            treasures: 2,
            ..config(2, 2)
        };
        let error = generate(&crowded, &mut rng).expect_err("only one eligible cell");
        assert_eq!(
            error,
            GenerationError::Overcrowded {
                requested: 2,
                available: 1,
            }
        );
    }

    #[test]
    fn pots_stay_out_of_the_start_corner() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let potted = GameConfig {
            pots: 1,
            ..config(2, 2)
        };
        let maze = generate(&potted, &mut rng).expect("one eligible cell");
        assert_eq!(maze.occupants(CellCoord::new(1, 1)).len(), 1);
        assert_eq!(maze.occupants(CellCoord::new(1, 1))[0].entity, EntityKind::Pot);

        let crowded = GameConfig {
            pots: 2,
            ..config(2, 2)
        };
        let error = generate(&crowded, &mut rng).expect_err("start corner is not eligible");
        assert_eq!(
            error,
            GenerationError::Overcrowded {
                requested: 2,
                available: 1,
            }
        );
    }

    #[test]
    fn impossible_ghost_reports_missing_loop() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let haunted = GameConfig {
            ghosts: 1,
            ..config(2, 2)
        };
        let error = generate(&haunted, &mut rng).expect_err("2x2 cannot fit a loop");
        assert!(matches!(error, GenerationError::NoLoopCandidate { .. }));
    }

    #[test]
    fn shuffled_directions_is_a_permutation() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..32 {
            let mut order = shuffled_directions(&mut rng);
            order.sort();
            assert_eq!(
                order,
                [
                    Direction::North,
                    Direction::East,
                    Direction::South,
                    Direction::West
                ]
            );
        }
    }
}
