use rand::rngs::StdRng;
use rand_set::RandSetDefault;

use super::{pick, pick_from_set, random_cell};
use crate::{
    maze::{CellId, CellState, ChangeList, Grid},
    stepper::Stepper,
};

/// Randomized Prim's algorithm, without weights.
///
/// The maze grows from one seed cell: `Solid` cells are in the maze, `Partial` cells form the
/// frontier around it. Visually the maze spreads out in a roughly circular fashion.
pub struct Prim {
    rng: StdRng,
    frontier: RandSetDefault<CellId>,
}

impl Prim {
    pub fn new(rng: StdRng) -> Self {
        Prim {
            rng,
            frontier: std::iter::empty().collect(),
        }
    }
}

impl Stepper for Prim {
    fn initialize(&mut self, grid: &mut Grid) -> ChangeList {
        if grid.is_empty() {
            return Vec::new();
        }
        let start = random_cell(grid, &mut self.rng);
        grid.set_state(start, CellState::Solid);

        // Currently, all neighbors are empty at this point
        let neighbors = grid.neighbors(start).to_vec();
        self.frontier = neighbors.iter().copied().collect();
        neighbors
            .iter()
            .for_each(|&n| grid.set_state(n, CellState::Partial));

        let mut changes = vec![start];
        changes.extend(neighbors);
        changes
    }

    fn advance(&mut self, grid: &mut Grid) -> (bool, ChangeList) {
        // Pick a random frontier cell
        let Some(cell) = pick_from_set(&self.frontier, &mut self.rng) else {
            return (true, Vec::new());
        };
        self.frontier.remove(&cell);

        // Connect it to a random cell that is already part of the maze.
        // A frontier cell always has one, since it was added by a solid neighbor.
        let solid = grid
            .neighbors(cell)
            .iter()
            .copied()
            .filter(|&n| grid.state(n) == CellState::Solid)
            .collect::<Vec<_>>();
        if let Some(neighbor) = pick(&solid, &mut self.rng) {
            grid.link(cell, neighbor);
        }
        grid.set_state(cell, CellState::Solid);
        let mut changes = vec![cell];

        // Grow the frontier with the empty neighbors of the new maze cell
        let empty = grid
            .neighbors(cell)
            .iter()
            .copied()
            .filter(|&n| grid.state(n) == CellState::Empty)
            .collect::<Vec<_>>();
        for neighbor in empty {
            // Only mark the cell if it hasn't been added to the frontier set before
            if self.frontier.insert(neighbor) {
                grid.set_state(neighbor, CellState::Partial);
                changes.push(neighbor);
            }
        }

        (self.frontier.is_empty(), changes)
    }
}
