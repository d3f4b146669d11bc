//! Signed distance flood field used when carving loops around ghosts.

use std::collections::VecDeque;

use maze_quest_core::{CellCoord, Direction};

use crate::Maze;

/// Dense signed-distance grid grown from two seeds on either side of a barrier.
///
/// Cells reached from the positive seed hold `1, 2, 3, ...`, cells reached
/// from the negative seed hold `-1, -2, -3, ...`, and zero marks cells that
/// were never reached (the barrier itself, blocked cells, or cells cut off by
/// the barrier).
#[derive(Clone, Debug, Default)]
pub(crate) struct FloodField {
    width: u32,
    height: u32,
    distances: Vec<i32>,
}

/// Wall chosen to close a loop, with the distance gap it bridges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct LoopWall {
    pub(crate) cell: CellCoord,
    pub(crate) direction: Direction,
    pub(crate) gap: u32,
}

impl FloodField {
    /// Floods outward from `positive` and `negative`, never entering `barrier`
    /// or cells holding a blocking occupant.
    pub(crate) fn around<E>(
        maze: &Maze<E>,
        barrier: CellCoord,
        positive: CellCoord,
        negative: CellCoord,
    ) -> Self {
        let mut field = Self {
            width: maze.width(),
            height: maze.height(),
            distances: vec![0; maze.cell_count()],
        };

        field.grow(maze, barrier, positive, 1);
        field.grow(maze, barrier, negative, -1);
        field
    }

    fn grow<E>(&mut self, maze: &Maze<E>, barrier: CellCoord, seed: CellCoord, step: i32) {
        if seed == barrier || maze.is_blocked(seed) {
            return;
        }
        let Some(seed_index) = maze.cell_index(seed) else {
            return;
        };
        if self.distances[seed_index] != 0 {
            return;
        }

        self.distances[seed_index] = step;
        let mut queue = VecDeque::from([seed]);

        while let Some(cell) = queue.pop_front() {
            let Some(current_index) = maze.cell_index(cell) else {
                continue;
            };
            let next_distance = self.distances[current_index].saturating_add(step);

            for direction in Direction::ALL {
                let Some(neighbor) = maze.can_move(cell, direction, false) else {
                    continue;
                };
                if neighbor == barrier {
                    continue;
                }
                let Some(neighbor_index) = maze.cell_index(neighbor) else {
                    continue;
                };
                if self.distances[neighbor_index] != 0 {
                    continue;
                }

                self.distances[neighbor_index] = next_distance;
                queue.push_back(neighbor);
            }
        }
    }

    /// Distance captured for the provided cell, zero when unreached or outside.
    #[must_use]
    pub(crate) fn distance(&self, cell: CellCoord) -> i32 {
        if cell.row() >= self.height || cell.column() >= self.width {
            return 0;
        }
        let index = cell.row() as usize * self.width as usize + cell.column() as usize;
        self.distances.get(index).copied().unwrap_or(0)
    }

    /// Present interior wall separating a positive from a negative cell with
    /// the widest distance gap. Ties keep the first wall in row-major order,
    /// east edges before south edges.
    pub(crate) fn widest_wall<E>(&self, maze: &Maze<E>) -> Option<LoopWall> {
        let mut best: Option<LoopWall> = None;

        for cell in maze.cells() {
            let here = self.distance(cell);
            if here == 0 {
                continue;
            }
            for direction in [Direction::East, Direction::South] {
                if !maze.has_wall(cell, direction) || maze.is_border(cell, direction) {
                    continue;
                }
                let Some(neighbor) = cell.neighbor(direction) else {
                    continue;
                };
                let there = self.distance(neighbor);
                if there == 0 || here.signum() == there.signum() {
                    continue;
                }

                let gap = here.abs_diff(there);
                if best.map_or(true, |current| gap > current.gap) {
                    best = Some(LoopWall {
                        cell,
                        direction,
                        gap,
                    });
                }
            }
        }

        best
    }
}
