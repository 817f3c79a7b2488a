use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_set::RandSetDefault;

mod backtracker;
mod prim;
mod wilson;

pub use backtracker::Backtracker;
pub use prim::Prim;
pub use wilson::Wilson;

use crate::{
    maze::{CellId, ChangeList, Grid},
    stepper::Stepper,
};

/// Get a random number generator, optionally seeded for reproducibility.
pub(crate) fn get_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    }
}

/// Pick a uniformly random element of a slice.
pub(crate) fn pick<T: Copy>(items: &[T], rng: &mut impl Rng) -> Option<T> {
    match items.len() {
        0 => None,
        len => Some(items[rng.random_range(0..len)]),
    }
}

/// Pick a uniformly random member of a set with the caller's rng.
///
/// `RandSet::get_rand` draws from the thread rng, which would make seeded runs diverge.
pub(crate) fn pick_from_set(set: &RandSetDefault<CellId>, rng: &mut impl Rng) -> Option<CellId> {
    pick(set.iter().as_slice(), rng)
}

/// Pick a uniformly random cell of the grid.
fn random_cell(grid: &Grid, rng: &mut impl Rng) -> CellId {
    let (row, col) = (
        rng.random_range(0..grid.rows()),
        rng.random_range(0..grid.cols()),
    );
    // In bounds by construction of the ranges above
    CellId::new(row as usize * grid.cols() as usize + col as usize)
}

/// Available maze generation algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generator {
    Backtracker,
    Prim,
    Wilson,
}

impl Generator {
    pub const ALL: [Generator; 3] = [Generator::Backtracker, Generator::Prim, Generator::Wilson];

    /// Instantiate the algorithm for `grid`, optionally seeded for reproducibility.
    pub fn build(self, grid: &Grid, seed: Option<u64>) -> MazeGenerator {
        let rng = get_rng(seed);
        match self {
            Generator::Backtracker => MazeGenerator::Backtracker(Backtracker::new(rng)),
            Generator::Prim => MazeGenerator::Prim(Prim::new(rng)),
            Generator::Wilson => MazeGenerator::Wilson(Wilson::new(grid, rng)),
        }
    }
}

impl std::fmt::Display for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Generator::Backtracker => write!(f, "Recursive Backtracker"),
            Generator::Prim => write!(f, "Prim's Algorithm"),
            Generator::Wilson => write!(f, "Wilson's Algorithm"),
        }
    }
}

/// A running generator, dispatched by variant.
pub enum MazeGenerator {
    Backtracker(Backtracker),
    Prim(Prim),
    Wilson(Wilson),
}

impl Stepper for MazeGenerator {
    fn initialize(&mut self, grid: &mut Grid) -> ChangeList {
        match self {
            MazeGenerator::Backtracker(alg) => alg.initialize(grid),
            MazeGenerator::Prim(alg) => alg.initialize(grid),
            MazeGenerator::Wilson(alg) => alg.initialize(grid),
        }
    }

    fn advance(&mut self, grid: &mut Grid) -> (bool, ChangeList) {
        match self {
            MazeGenerator::Backtracker(alg) => alg.advance(grid),
            MazeGenerator::Prim(alg) => alg.advance(grid),
            MazeGenerator::Wilson(alg) => alg.advance(grid),
        }
    }
}
