use rand::rngs::StdRng;

use crate::{
    generators::pick,
    maze::{CellId, CellState, ChangeList, Grid},
    stepper::Stepper,
};

/// Simplified Tremaux: a single randomized depth-first walk that backs up at dead ends.
///
/// Visited cells are `Partial` and never re-entered, so there are no per-passage marks as in
/// the classic algorithm. The path is the walk itself and is valid at every step.
#[derive(Debug)]
pub struct Tremaux {
    rng: StdRng,
    start: CellId,
    end: CellId,
    path: Vec<CellId>,
}

impl Tremaux {
    pub fn new(start: CellId, end: CellId, rng: StdRng) -> Self {
        Tremaux {
            rng,
            start,
            end,
            path: Vec::new(),
        }
    }

    pub fn path(&self) -> &[CellId] {
        &self.path
    }

    pub fn endpoints(&self) -> (CellId, CellId) {
        (self.start, self.end)
    }
}

impl Stepper for Tremaux {
    fn initialize(&mut self, grid: &mut Grid) -> ChangeList {
        self.path = vec![self.start];
        grid.set_state(self.start, CellState::Partial);
        vec![self.start]
    }

    fn advance(&mut self, grid: &mut Grid) -> (bool, ChangeList) {
        let Some(&current) = self.path.last() else {
            // Backed out of the start cell: the end is unreachable
            return (true, Vec::new());
        };
        if current == self.end {
            return (true, Vec::new());
        }

        let unvisited = grid
            .connections(current)
            .iter()
            .copied()
            .filter(|&c| grid.state(c) == CellState::Solid)
            .collect::<Vec<_>>();

        match pick(&unvisited, &mut self.rng) {
            // Nowhere to go, go back
            None => {
                self.path.pop();
                let mut changes = vec![current];
                changes.extend(self.path.last());
                (false, changes)
            }
            Some(next) => {
                grid.set_state(next, CellState::Partial);
                self.path.push(next);
                (next == self.end, vec![current, next])
            }
        }
    }
}
