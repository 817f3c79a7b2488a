mod bfs;
mod tremaux;

pub use bfs::Bfs;
pub use tremaux::Tremaux;

use crate::{
    generators::get_rng,
    maze::{CellId, CellState, ChangeList, Grid},
    stepper::Stepper,
};

/// Available maze solving algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Solver {
    Bfs,
    Tremaux,
}

impl Solver {
    pub const ALL: [Solver; 2] = [Solver::Bfs, Solver::Tremaux];

    /// Instantiate the algorithm to find a path from `start` to `end`.
    ///
    /// Solvers expect `grid` to hold a finished maze and repaint every cell `Solid`, which they
    /// read as "not visited yet".
    pub fn build(self, grid: &mut Grid, start: CellId, end: CellId, seed: Option<u64>) -> MazeSolver {
        grid.reset_states(CellState::Solid);
        match self {
            Solver::Bfs => MazeSolver::Bfs(Bfs::new(grid, start, end)),
            Solver::Tremaux => MazeSolver::Tremaux(Tremaux::new(start, end, get_rng(seed))),
        }
    }
}

impl std::fmt::Display for Solver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Solver::Bfs => write!(f, "Breadth-First Search (BFS)"),
            Solver::Tremaux => write!(f, "Tremaux (DFS with backtracking)"),
        }
    }
}

/// A running solver, dispatched by variant.
#[derive(Debug)]
pub enum MazeSolver {
    Bfs(Bfs),
    Tremaux(Tremaux),
}

impl MazeSolver {
    pub fn kind(&self) -> Solver {
        match self {
            MazeSolver::Bfs(_) => Solver::Bfs,
            MazeSolver::Tremaux(_) => Solver::Tremaux,
        }
    }

    /// Current path from start, ending at the goal once solved.
    pub fn path(&self) -> &[CellId] {
        match self {
            MazeSolver::Bfs(alg) => alg.path(),
            MazeSolver::Tremaux(alg) => alg.path(),
        }
    }

    pub fn endpoints(&self) -> (CellId, CellId) {
        match self {
            MazeSolver::Bfs(alg) => alg.endpoints(),
            MazeSolver::Tremaux(alg) => alg.endpoints(),
        }
    }
}

impl Stepper for MazeSolver {
    fn initialize(&mut self, grid: &mut Grid) -> ChangeList {
        match self {
            MazeSolver::Bfs(alg) => alg.initialize(grid),
            MazeSolver::Tremaux(alg) => alg.initialize(grid),
        }
    }

    fn advance(&mut self, grid: &mut Grid) -> (bool, ChangeList) {
        match self {
            MazeSolver::Bfs(alg) => alg.advance(grid),
            MazeSolver::Tremaux(alg) => alg.advance(grid),
        }
    }
}
