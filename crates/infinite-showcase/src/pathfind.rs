//! Breadth-first grid pathfinding, one cell per step.
//!
//! The search expands cells in first-in first-out order over four-neighbour
//! moves. A cell is marked discovered when it is queued, so each cell is
//! queued at most once and its predecessor is the first cell that reached
//! it. When the goal is dequeued the path is rebuilt from predecessors.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

/// Default grid side length.
pub const GRID_SIZE: u8 = 10;

/// Default obstacle cells.
pub const OBSTACLES: [Cell; 7] = [
    Cell::new(3, 3),
    Cell::new(3, 4),
    Cell::new(4, 3),
    Cell::new(4, 4),
    Cell::new(5, 5),
    Cell::new(6, 5),
    Cell::new(5, 6),
];

/// A grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Column.
    pub x: u8,
    /// Row.
    pub y: u8,
}

impl Cell {
    /// Build a cell.
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }
}

impl core::fmt::Display for Cell {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// The result of one search step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PathStep {
    /// A cell was dequeued and its neighbours queued.
    Visited {
        /// The dequeued cell.
        cell: Cell,
    },
    /// The goal was dequeued. Carries the path from start to goal.
    Found {
        /// The path, start and goal included.
        path: Vec<Cell>,
    },
    /// The queue emptied without reaching the goal.
    Exhausted,
}

/// A breadth-first search over a square grid with obstacles.
#[derive(Debug, Clone)]
pub struct GridPathfinder {
    size: u8,
    start: Cell,
    goal: Cell,
    obstacles: BTreeSet<Cell>,
    queue: VecDeque<Cell>,
    discovered: BTreeSet<Cell>,
    came_from: BTreeMap<Cell, Cell>,
    visited: Vec<Cell>,
    outcome: Option<PathStep>,
}

impl Default for GridPathfinder {
    /// A 10x10 grid from (0,0) to (9,9) around the default obstacles.
    fn default() -> Self {
        Self::new(
            GRID_SIZE,
            Cell::new(0, 0),
            Cell::new(GRID_SIZE.saturating_sub(1), GRID_SIZE.saturating_sub(1)),
            OBSTACLES,
        )
    }
}

impl GridPathfinder {
    /// Prepare a search from `start` to `goal`.
    pub fn new(
        size: u8,
        start: Cell,
        goal: Cell,
        obstacles: impl IntoIterator<Item = Cell>,
    ) -> Self {
        Self {
            size,
            start,
            goal,
            obstacles: obstacles.into_iter().collect(),
            queue: VecDeque::from([start]),
            discovered: BTreeSet::from([start]),
            came_from: BTreeMap::new(),
            visited: Vec::new(),
            outcome: None,
        }
    }

    /// Expand one cell.
    ///
    /// Once the search has finished, every further call returns the final
    /// outcome again.
    pub fn step(&mut self) -> PathStep {
        if let Some(done) = &self.outcome {
            return done.clone();
        }

        let Some(current) = self.queue.pop_front() else {
            self.outcome = Some(PathStep::Exhausted);
            return PathStep::Exhausted;
        };
        self.visited.push(current);

        if current == self.goal {
            let found = PathStep::Found {
                path: self.reconstruct(),
            };
            self.outcome = Some(found.clone());
            return found;
        }

        for next in self.neighbours(current) {
            if self.discovered.insert(next) {
                self.came_from.insert(next, current);
                self.queue.push_back(next);
            }
        }
        PathStep::Visited { cell: current }
    }

    /// Step until the search finishes.
    pub fn run(&mut self) -> PathStep {
        loop {
            let step = self.step();
            if !matches!(step, PathStep::Visited { .. }) {
                return step;
            }
        }
    }

    fn in_bounds(&self, cell: Cell) -> bool {
        cell.x < self.size && cell.y < self.size
    }

    /// Open neighbours in expansion order: +x, -x, +y, -y.
    fn neighbours(&self, c: Cell) -> Vec<Cell> {
        [
            c.x.checked_add(1).map(|x| Cell::new(x, c.y)),
            c.x.checked_sub(1).map(|x| Cell::new(x, c.y)),
            c.y.checked_add(1).map(|y| Cell::new(c.x, y)),
            c.y.checked_sub(1).map(|y| Cell::new(c.x, y)),
        ]
        .into_iter()
        .flatten()
        .filter(|n| self.in_bounds(*n) && !self.obstacles.contains(n))
        .collect()
    }

    fn reconstruct(&self) -> Vec<Cell> {
        let mut path = vec![self.goal];
        let mut current = self.goal;
        while current != self.start {
            let Some(&previous) = self.came_from.get(&current) else {
                break;
            };
            path.push(previous);
            current = previous;
        }
        path.reverse();
        path
    }

    /// Cells dequeued so far, in order.
    pub fn visited(&self) -> &[Cell] {
        &self.visited
    }

    /// Whether `cell` is an obstacle.
    pub fn is_obstacle(&self, cell: Cell) -> bool {
        self.obstacles.contains(&cell)
    }

    /// The path, once found.
    pub fn path(&self) -> Option<&[Cell]> {
        match &self.outcome {
            Some(PathStep::Found { path }) => Some(path),
            _ => None,
        }
    }

    /// Whether the search has finished, with or without a path.
    pub const fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Grid side length.
    pub const fn size(&self) -> u8 {
        self.size
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    fn is_adjacent(a: Cell, b: Cell) -> bool {
        a.x.abs_diff(b.x) + a.y.abs_diff(b.y) == 1
    }

    #[test]
    fn default_search_reaches_the_far_corner() {
        let mut finder = GridPathfinder::default();
        let PathStep::Found { path } = finder.run() else {
            panic!("no path found");
        };
        assert_eq!(path.first(), Some(&Cell::new(0, 0)));
        assert_eq!(path.last(), Some(&Cell::new(9, 9)));
        // Breadth-first on an open grid finds a Manhattan-shortest path.
        assert_eq!(path.len(), 19);
        assert!(path.windows(2).all(|w| is_adjacent(w[0], w[1])));
        assert!(path.iter().all(|c| !finder.is_obstacle(*c)));
    }

    #[test]
    fn first_step_visits_the_start() {
        let mut finder = GridPathfinder::default();
        assert_eq!(finder.step(), PathStep::Visited { cell: Cell::new(0, 0) });
        assert_eq!(finder.visited(), &[Cell::new(0, 0)]);
        assert!(!finder.is_finished());
    }

    #[test]
    fn walled_goal_is_exhausted() {
        let walls = [Cell::new(1, 0), Cell::new(0, 1), Cell::new(1, 1)];
        let mut finder = GridPathfinder::new(3, Cell::new(0, 0), Cell::new(2, 2), walls);
        assert_eq!(finder.run(), PathStep::Exhausted);
        assert_eq!(finder.step(), PathStep::Exhausted);
        assert!(finder.path().is_none());
    }

    #[test]
    fn cells_are_visited_once() {
        let mut finder = GridPathfinder::default();
        finder.run();
        let unique: BTreeSet<_> = finder.visited().iter().collect();
        assert_eq!(unique.len(), finder.visited().len());
    }
}
