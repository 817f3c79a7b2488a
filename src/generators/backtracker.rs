use rand::rngs::StdRng;

use super::{pick, random_cell};
use crate::{
    maze::{CellId, CellState, ChangeList, Grid},
    stepper::Stepper,
};

/// "Recursive" backtracking, implemented iteratively with an explicit stack.
///
/// Carves into a random unvisited neighbor until it hits a dead end, then backs up.
/// `Partial` cells are on the stack, `Solid` cells are fully explored.
#[derive(Debug)]
pub struct Backtracker {
    rng: StdRng,
    stack: Vec<CellId>,
}

impl Backtracker {
    pub fn new(rng: StdRng) -> Self {
        Backtracker {
            rng,
            stack: Vec::new(),
        }
    }
}

impl Stepper for Backtracker {
    fn initialize(&mut self, grid: &mut Grid) -> ChangeList {
        if grid.is_empty() {
            return Vec::new();
        }
        let start = random_cell(grid, &mut self.rng);
        grid.set_state(start, CellState::Partial);
        self.stack.push(start);
        vec![start]
    }

    fn advance(&mut self, grid: &mut Grid) -> (bool, ChangeList) {
        let Some(&current) = self.stack.last() else {
            return (true, Vec::new());
        };

        let unvisited = grid
            .neighbors(current)
            .iter()
            .copied()
            .filter(|&n| grid.state(n) == CellState::Empty)
            .collect::<Vec<_>>();

        let changes = match pick(&unvisited, &mut self.rng) {
            Some(neighbor) => {
                // Carve towards the neighbor and keep going from there
                grid.link(current, neighbor);
                grid.set_state(neighbor, CellState::Partial);
                self.stack.push(neighbor);
                vec![neighbor]
            }
            None => {
                // Dead end: this cell is done, back up
                grid.set_state(current, CellState::Solid);
                self.stack.pop();
                vec![current]
            }
        };

        (self.stack.is_empty(), changes)
    }
}
