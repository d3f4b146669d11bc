#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative maze state for Maze Quest.
//!
//! A [`Maze`] owns the wall grid and the cell → occupant index. It is generic
//! over the occupant handle so the generator can lay out a blueprint of
//! [`maze_quest_core::EntityKind`] values while the running game indexes live
//! entity handles.

mod flood;
pub mod generation;

use std::collections::VecDeque;

use maze_quest_core::{CellCoord, Direction};

pub use generation::{generate, GenerationError, LOOP_THRESHOLD};

/// One entry of a cell's occupant list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Occupant<E> {
    /// Handle of the occupying entity.
    pub entity: E,
    /// Whether the occupant prevents other entities from entering the cell.
    pub blocks: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Edge {
    Horizontal(usize),
    Vertical(usize),
}

/// Rectangular maze with per-edge walls and a cell occupant index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Maze<E> {
    height: u32,
    width: u32,
    horizontal: Vec<bool>,
    vertical: Vec<bool>,
    items: Vec<Vec<Occupant<E>>>,
}

impl<E> Maze<E> {
    /// Creates a maze whose only walls are the permanent border walls.
    #[must_use]
    pub fn new(height: u32, width: u32) -> Self {
        let rows = usize::try_from(height).unwrap_or(0);
        let columns = usize::try_from(width).unwrap_or(0);
        let mut maze = Self {
            height,
            width,
            horizontal: vec![false; (rows + 1) * columns],
            vertical: vec![false; rows * (columns + 1)],
            items: std::iter::repeat_with(Vec::new)
                .take(rows * columns)
                .collect(),
        };

        for column in 0..columns {
            maze.horizontal[column] = true;
            maze.horizontal[rows * columns + column] = true;
        }
        for row in 0..rows {
            maze.vertical[row * (columns + 1)] = true;
            maze.vertical[row * (columns + 1) + columns] = true;
        }

        maze
    }

    /// Creates a maze with every edge walled, the starting point for carving.
    #[must_use]
    pub fn walled(height: u32, width: u32) -> Self {
        let mut maze = Self::new(height, width);
        maze.horizontal.fill(true);
        maze.vertical.fill(true);
        maze
    }

    /// Creates an empty maze sharing the walls of `other`.
    #[must_use]
    pub fn with_walls_of<F>(other: &Maze<F>) -> Self {
        Self {
            height: other.height,
            width: other.width,
            horizontal: other.horizontal.clone(),
            vertical: other.vertical.clone(),
            items: std::iter::repeat_with(Vec::new)
                .take(other.items.len())
                .collect(),
        }
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of cells in the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.items.len()
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.row() < self.height && cell.column() < self.width
    }

    /// Iterates every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let width = self.width;
        (0..self.height).flat_map(move |row| (0..width).map(move |column| CellCoord::new(row, column)))
    }

    /// Wall on the north edge of cell `(row, column)`; `row` may equal the height.
    #[must_use]
    pub fn horizontal_wall(&self, row: u32, column: u32) -> bool {
        if row > self.height || column >= self.width {
            return false;
        }
        let index = row as usize * self.width as usize + column as usize;
        self.horizontal.get(index).copied().unwrap_or(false)
    }

    /// Wall on the west edge of cell `(row, column)`; `column` may equal the width.
    #[must_use]
    pub fn vertical_wall(&self, row: u32, column: u32) -> bool {
        if row >= self.height || column > self.width {
            return false;
        }
        let index = row as usize * (self.width as usize + 1) + column as usize;
        self.vertical.get(index).copied().unwrap_or(false)
    }

    /// Reports whether the edge on `direction` of `cell` is walled.
    ///
    /// Cells outside the grid are treated as fully walled.
    #[must_use]
    pub fn has_wall(&self, cell: CellCoord, direction: Direction) -> bool {
        match self.edge(cell, direction) {
            Some(Edge::Horizontal(index)) => self.horizontal[index],
            Some(Edge::Vertical(index)) => self.vertical[index],
            None => true,
        }
    }

    /// Reports whether the edge on `direction` of `cell` belongs to the border.
    #[must_use]
    pub fn is_border(&self, cell: CellCoord, direction: Direction) -> bool {
        match direction {
            Direction::North => cell.row() == 0,
            Direction::South => cell.row().saturating_add(1) == self.height,
            Direction::West => cell.column() == 0,
            Direction::East => cell.column().saturating_add(1) == self.width,
        }
    }

    /// Sets or clears an interior wall. Border edges and cells outside the
    /// grid are refused and leave the maze untouched.
    pub fn set_wall(&mut self, cell: CellCoord, direction: Direction, present: bool) -> bool {
        if self.is_border(cell, direction) {
            return false;
        }
        match self.edge(cell, direction) {
            Some(Edge::Horizontal(index)) => self.horizontal[index] = present,
            Some(Edge::Vertical(index)) => self.vertical[index] = present,
            None => return false,
        }
        true
    }

    /// Flips an interior wall, returning its new state.
    pub fn toggle_wall(&mut self, cell: CellCoord, direction: Direction) -> Option<bool> {
        let present = !self.has_wall(cell, direction);
        self.set_wall(cell, direction, present).then_some(present)
    }

    /// Directions whose edge from `cell` is not walled.
    pub fn open_directions(&self, cell: CellCoord) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL
            .into_iter()
            .filter(move |direction| !self.has_wall(cell, *direction))
    }

    /// Target cell of a step from `cell` in `direction`, if the step is legal.
    ///
    /// A step is legal when the edge is not walled and, unless
    /// `ignore_blocking` is set, the target holds no blocking occupant.
    #[must_use]
    pub fn can_move(
        &self,
        cell: CellCoord,
        direction: Direction,
        ignore_blocking: bool,
    ) -> Option<CellCoord> {
        if self.has_wall(cell, direction) {
            return None;
        }
        let target = cell.neighbor(direction).filter(|next| self.contains(*next))?;
        if !ignore_blocking && self.is_blocked(target) {
            return None;
        }
        Some(target)
    }

    /// Reports whether the cell is outside the grid or holds a blocking occupant.
    #[must_use]
    pub fn is_blocked(&self, cell: CellCoord) -> bool {
        match self.cell_index(cell) {
            Some(index) => self.items[index].iter().any(|occupant| occupant.blocks),
            None => true,
        }
    }

    /// Occupants of the cell in insertion order.
    #[must_use]
    pub fn occupants(&self, cell: CellCoord) -> &[Occupant<E>] {
        match self.cell_index(cell) {
            Some(index) => &self.items[index],
            None => &[],
        }
    }

    /// Adds an occupant at `cell`. The caller must already have written the
    /// entity's new position. Returns `false` when the cell is outside the grid.
    pub fn add(&mut self, entity: E, cell: CellCoord, blocks: bool) -> bool {
        let Some(index) = self.cell_index(cell) else {
            return false;
        };
        self.items[index].push(Occupant { entity, blocks });
        true
    }

    /// Reports whether every cell is reachable from the top-left corner.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        let Some(start) = self.cells().next() else {
            return true;
        };
        self.reachable_from(start) == self.cell_count()
    }

    /// Number of cells reachable from `start` through open edges, ignoring occupants.
    #[must_use]
    pub fn reachable_from(&self, start: CellCoord) -> usize {
        let Some(start_index) = self.cell_index(start) else {
            return 0;
        };
        let mut visited = vec![false; self.cell_count()];
        visited[start_index] = true;
        let mut queue = VecDeque::from([start]);
        let mut count = 0;

        while let Some(cell) = queue.pop_front() {
            count += 1;
            for direction in Direction::ALL {
                let Some(next) = self.can_move(cell, direction, true) else {
                    continue;
                };
                let Some(index) = self.cell_index(next) else {
                    continue;
                };
                if !visited[index] {
                    visited[index] = true;
                    queue.push_back(next);
                }
            }
        }

        count
    }

    pub(crate) fn cell_index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.width).ok()?;
        Some(row * width + column)
    }

    fn edge(&self, cell: CellCoord, direction: Direction) -> Option<Edge> {
        if !self.contains(cell) {
            return None;
        }
        let row = cell.row() as usize;
        let column = cell.column() as usize;
        let width = self.width as usize;
        Some(match direction {
            Direction::North => Edge::Horizontal(row * width + column),
            Direction::South => Edge::Horizontal((row + 1) * width + column),
            Direction::West => Edge::Vertical(row * (width + 1) + column),
            Direction::East => Edge::Vertical(row * (width + 1) + column + 1),
        })
    }
}

impl<E: PartialEq> Maze<E> {
    /// Removes an occupant from `cell`, which must still be the entity's old
    /// position. Returns `false` when the entity was not indexed there.
    pub fn remove(&mut self, entity: &E, cell: CellCoord) -> bool {
        let Some(index) = self.cell_index(cell) else {
            return false;
        };
        let occupants = &mut self.items[index];
        match occupants.iter().position(|occupant| occupant.entity == *entity) {
            Some(position) => {
                let _ = occupants.remove(position);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(height: u32, width: u32) -> Maze<u32> {
        Maze::new(height, width)
    }

    #[test]
    fn border_edges_are_walled_on_creation() {
        let maze = open(3, 4);
        for column in 0..4 {
            assert!(maze.horizontal_wall(0, column));
            assert!(maze.horizontal_wall(3, column));
        }
        for row in 0..3 {
            assert!(maze.vertical_wall(row, 0));
            assert!(maze.vertical_wall(row, 4));
        }
        assert!(!maze.horizontal_wall(1, 1));
        assert!(!maze.vertical_wall(1, 1));
    }

    #[test]
    fn border_walls_cannot_be_removed() {
        let mut maze = open(2, 2);
        assert!(!maze.set_wall(CellCoord::new(0, 0), Direction::North, false));
        assert!(!maze.set_wall(CellCoord::new(1, 1), Direction::East, false));
        assert_eq!(maze.toggle_wall(CellCoord::new(0, 1), Direction::North), None);
        assert!(maze.has_wall(CellCoord::new(0, 0), Direction::North));
    }

    #[test]
    fn toggling_an_interior_wall_affects_both_sides() {
        let mut maze = open(2, 2);
        assert_eq!(
            maze.toggle_wall(CellCoord::new(0, 0), Direction::East),
            Some(true)
        );
        assert!(maze.has_wall(CellCoord::new(0, 1), Direction::West));
        assert_eq!(
            maze.toggle_wall(CellCoord::new(0, 1), Direction::West),
            Some(false)
        );
        assert!(!maze.has_wall(CellCoord::new(0, 0), Direction::East));
    }

    #[test]
    fn can_move_respects_walls_and_blocking() {
        let mut maze = open(2, 2);
        let origin = CellCoord::new(0, 0);
        assert_eq!(
            maze.can_move(origin, Direction::East, false),
            Some(CellCoord::new(0, 1))
        );
        assert_eq!(maze.can_move(origin, Direction::North, false), None);

        assert!(maze.add(7, CellCoord::new(0, 1), true));
        assert_eq!(maze.can_move(origin, Direction::East, false), None);
        assert_eq!(
            maze.can_move(origin, Direction::East, true),
            Some(CellCoord::new(0, 1))
        );

        assert!(maze.add(8, CellCoord::new(1, 0), false));
        assert_eq!(
            maze.can_move(origin, Direction::South, false),
            Some(CellCoord::new(1, 0))
        );

        assert!(maze.set_wall(origin, Direction::South, true));
        assert_eq!(maze.can_move(origin, Direction::South, true), None);
    }

    #[test]
    fn is_blocked_reports_out_of_bounds_cells() {
        let maze = open(2, 3);
        assert!(maze.is_blocked(CellCoord::new(2, 0)));
        assert!(maze.is_blocked(CellCoord::new(0, 3)));
        assert!(!maze.is_blocked(CellCoord::new(1, 2)));
    }

    #[test]
    fn occupants_keep_insertion_order_and_remove_by_identity() {
        let mut maze = open(1, 1);
        let cell = CellCoord::new(0, 0);
        assert!(maze.add(1, cell, false));
        assert!(maze.add(2, cell, true));
        assert!(maze.add(3, cell, false));
        assert!(maze.remove(&2, cell));
        assert!(!maze.remove(&2, cell));

        let entities: Vec<_> = maze.occupants(cell).iter().map(|o| o.entity).collect();
        assert_eq!(entities, vec![1, 3]);
        assert!(!maze.is_blocked(cell));
    }

    #[test]
    fn walled_maze_is_disconnected_until_carved() {
        let mut maze: Maze<u32> = Maze::walled(2, 2);
        assert!(!maze.is_connected());
        assert_eq!(maze.reachable_from(CellCoord::new(0, 0)), 1);

        assert!(maze.set_wall(CellCoord::new(0, 0), Direction::East, false));
        assert!(maze.set_wall(CellCoord::new(0, 0), Direction::South, false));
        assert!(maze.set_wall(CellCoord::new(1, 0), Direction::East, false));
        assert!(maze.is_connected());
    }

    #[test]
    fn with_walls_of_copies_walls_but_not_occupants() {
        let mut blueprint: Maze<u32> = Maze::walled(2, 3);
        assert!(blueprint.set_wall(CellCoord::new(1, 1), Direction::East, false));
        assert!(blueprint.add(5, CellCoord::new(1, 1), true));

        let copy: Maze<&str> = Maze::with_walls_of(&blueprint);
        assert!(!copy.has_wall(CellCoord::new(1, 1), Direction::East));
        assert!(copy.has_wall(CellCoord::new(1, 1), Direction::West));
        assert!(copy.occupants(CellCoord::new(1, 1)).is_empty());
    }
}
