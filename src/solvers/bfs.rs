use std::collections::{HashMap, VecDeque};

use crate::{
    maze::{CellId, CellState, ChangeList, Grid},
    stepper::Stepper,
};

/// Breadth-first flood fill from `start`, one whole queue level per step.
///
/// Visited cells are `Partial`. The path is only known once `end` is dequeued, and is the one
/// with the fewest edges.
#[derive(Debug)]
pub struct Bfs {
    start: CellId,
    end: CellId,
    queue: VecDeque<CellId>,
    came_from: HashMap<CellId, CellId>,
    path: Vec<CellId>,
}

impl Bfs {
    pub fn new(grid: &Grid, start: CellId, end: CellId) -> Self {
        Bfs {
            start,
            end,
            queue: VecDeque::new(),
            came_from: HashMap::with_capacity(grid.len()),
            path: Vec::new(),
        }
    }

    pub fn path(&self) -> &[CellId] {
        &self.path
    }

    pub fn endpoints(&self) -> (CellId, CellId) {
        (self.start, self.end)
    }

    /// Follow the came-from links back from `end` and return the route from `start`.
    fn build_path(&self) -> Vec<CellId> {
        let mut path = vec![self.end];
        let mut current = self.end;
        while let Some(&parent) = self.came_from.get(&current) {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }
}

impl Stepper for Bfs {
    fn initialize(&mut self, grid: &mut Grid) -> ChangeList {
        grid.set_state(self.start, CellState::Partial);
        self.queue.push_back(self.start);
        vec![self.start]
    }

    fn advance(&mut self, grid: &mut Grid) -> (bool, ChangeList) {
        let mut changes = Vec::new();

        // Go through one queue level
        for _ in 0..self.queue.len() {
            let Some(current) = self.queue.pop_front() else {
                break;
            };

            if current == self.end {
                self.path = self.build_path();
                return (true, Vec::new());
            }

            let connections = grid.connections(current).to_vec();
            for neighbor in connections {
                if grid.state(neighbor) == CellState::Solid {
                    grid.set_state(neighbor, CellState::Partial);
                    self.queue.push_back(neighbor);
                    self.came_from.insert(neighbor, current);
                    changes.push(neighbor);
                }
            }
        }

        if self.queue.is_empty() {
            // Cannot happen on a spanning tree, where every cell is reachable
            tracing::warn!(
                start = %self.start,
                end = %self.end,
                "BFS exhausted the maze without reaching the end, returning an empty path"
            );
            self.path.clear();
            return (true, changes);
        }
        (false, changes)
    }
}
