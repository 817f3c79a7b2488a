use rand::rngs::StdRng;
use rand_set::RandSetDefault;

use super::{pick, pick_from_set};
use crate::{
    maze::{CellId, CellState, ChangeList, Grid},
    stepper::Stepper,
};

/// Wilson's algorithm.
///
/// Builds the maze out of loop-erased random walks, which samples every spanning tree of the
/// grid with the same probability. `Solid` cells are in the maze, `Partial` cells are on the
/// current walk.
///
/// See <https://en.wikipedia.org/wiki/Loop-erased_random_walk>.
pub struct Wilson {
    rng: StdRng,
    not_in_maze: RandSetDefault<CellId>,
    /// Current walk, oldest cell first. Consecutive cells are connected.
    walk: Vec<CellId>,
    /// Membership of `walk`, indexed by cell.
    in_walk: Vec<bool>,
}

impl Wilson {
    pub fn new(grid: &Grid, rng: StdRng) -> Self {
        Wilson {
            rng,
            not_in_maze: grid.ids().collect(),
            walk: Vec::new(),
            in_walk: vec![false; grid.len()],
        }
    }

    fn maze_complete(&self) -> bool {
        self.not_in_maze.is_empty()
    }

    /// Pick a random cell outside the maze and start a new walk from it.
    fn start_new_walk(&mut self, grid: &mut Grid) -> ChangeList {
        let Some(start) = pick_from_set(&self.not_in_maze, &mut self.rng) else {
            return Vec::new();
        };
        self.walk.push(start);
        self.in_walk[start.index()] = true;
        grid.set_state(start, CellState::Partial);
        vec![start]
    }

    /// Move the whole walk into the maze.
    fn add_walk_to_maze(&mut self, grid: &mut Grid) -> ChangeList {
        for &cell in &self.walk {
            self.not_in_maze.remove(&cell);
            self.in_walk[cell.index()] = false;
            grid.set_state(cell, CellState::Solid);
        }
        std::mem::take(&mut self.walk)
    }

    /// Erase the walk back to `conflict`, putting the walls of the erased part back up.
    fn erase_loop(&mut self, grid: &mut Grid, conflict: CellId) -> ChangeList {
        let mut changes = Vec::new();
        while let Some(popped) = self.walk.pop() {
            grid.set_state(popped, CellState::Empty);
            self.in_walk[popped.index()] = false;
            self.not_in_maze.insert(popped);
            changes.push(popped);

            let Some(&head) = self.walk.last() else {
                break;
            };
            grid.disconnect(head, popped);
            if head == conflict {
                break;
            }
        }
        changes
    }
}

impl Stepper for Wilson {
    /// The first cell anchors the maze on its own.
    fn initialize(&mut self, grid: &mut Grid) -> ChangeList {
        let Some(anchor) = pick_from_set(&self.not_in_maze, &mut self.rng) else {
            return Vec::new();
        };
        self.not_in_maze.remove(&anchor);
        grid.set_state(anchor, CellState::Solid);
        vec![anchor]
    }

    fn advance(&mut self, grid: &mut Grid) -> (bool, ChangeList) {
        if self.maze_complete() {
            return (true, Vec::new());
        }
        let Some(&current) = self.walk.last() else {
            return (false, self.start_new_walk(grid));
        };

        // Stepping back onto the previous cell erases the last cell like any other loop
        let Some(next) = pick(grid.neighbors(current), &mut self.rng) else {
            return (false, Vec::new());
        };

        let changes = if grid.state(next) == CellState::Solid {
            // Hit the maze: connect and keep the whole walk
            grid.link(current, next);
            self.add_walk_to_maze(grid)
        } else if self.in_walk[next.index()] {
            self.erase_loop(grid, next)
        } else {
            self.walk.push(next);
            self.in_walk[next.index()] = true;
            grid.link(current, next);
            grid.set_state(next, CellState::Partial);
            vec![next]
        };

        (self.maze_complete(), changes)
    }
}
