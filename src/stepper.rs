//! Incremental state machine shared by every generator and solver.
//!
//! An algorithm only describes its setup ([`Stepper::initialize`]) and one unit of progress
//! ([`Stepper::advance`]); [`Stepped`] owns the lifecycle around them so that each call to
//! [`Stepped::step`] performs exactly one visible change and can be driven frame by frame.

use crate::maze::{ChangeList, Grid};

/// Algorithm-specific half of the stepping protocol.
pub trait Stepper {
    /// Sets up the algorithm's progress state. Returns the cells it touched.
    fn initialize(&mut self, grid: &mut Grid) -> ChangeList;

    /// Takes one step. Returns whether the algorithm is done and the cells it touched.
    fn advance(&mut self, grid: &mut Grid) -> (bool, ChangeList);
}

/// Lifecycle of a [`Stepped`] algorithm. `Finished` is absorbing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Uninitialized,
    Running,
    Finished,
}

/// Drives a [`Stepper`] through `Uninitialized -> Running -> Finished`.
#[derive(Debug)]
pub struct Stepped<A> {
    algorithm: A,
    phase: Phase,
}

impl<A: Stepper> Stepped<A> {
    pub fn new(algorithm: A) -> Self {
        Stepped {
            algorithm,
            phase: Phase::Uninitialized,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn algorithm(&self) -> &A {
        &self.algorithm
    }

    /// Takes a single step and returns the cells modified by it.
    ///
    /// The first call only initializes the algorithm, so nothing changes before the first step
    /// is observed. Once finished, every call returns an empty list.
    pub fn step(&mut self, grid: &mut Grid) -> ChangeList {
        match self.phase {
            Phase::Finished => Vec::new(),
            Phase::Uninitialized => {
                self.phase = Phase::Running;
                self.algorithm.initialize(grid)
            }
            Phase::Running => {
                let (is_finished, changes) = self.algorithm.advance(grid);
                if is_finished {
                    self.phase = Phase::Finished;
                }
                changes
            }
        }
    }

    /// Steps until finished, discarding the change lists.
    pub fn finish(&mut self, grid: &mut Grid) {
        while !self.is_finished() {
            self.step(grid);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::CellId;

    /// Counts calls and finishes after `steps_to_finish` advances.
    struct Countdown {
        initialized: usize,
        advanced: usize,
        steps_to_finish: usize,
    }

    impl Stepper for Countdown {
        fn initialize(&mut self, grid: &mut Grid) -> ChangeList {
            self.initialized += 1;
            grid.ids().take(1).collect()
        }

        fn advance(&mut self, grid: &mut Grid) -> (bool, ChangeList) {
            self.advanced += 1;
            let changes = grid.ids().skip(self.advanced).take(1).collect();
            (self.advanced >= self.steps_to_finish, changes)
        }
    }

    fn countdown(steps_to_finish: usize) -> Stepped<Countdown> {
        Stepped::new(Countdown {
            initialized: 0,
            advanced: 0,
            steps_to_finish,
        })
    }

    #[test]
    fn test_first_step_only_initializes() {
        let mut grid = Grid::build(2, 2);
        let mut stepped = countdown(2);
        assert_eq!(stepped.phase(), Phase::Uninitialized);
        assert_eq!(stepped.step(&mut grid), vec![CellId::new(0)]);
        assert_eq!(stepped.phase(), Phase::Running);
        assert_eq!(stepped.algorithm().initialized, 1);
        assert_eq!(stepped.algorithm().advanced, 0);
    }

    #[test]
    fn test_step_after_finish_is_empty() {
        let mut grid = Grid::build(2, 2);
        let mut stepped = countdown(2);
        stepped.step(&mut grid);
        assert_eq!(stepped.step(&mut grid), vec![CellId::new(1)]);
        assert_eq!(stepped.step(&mut grid), vec![CellId::new(2)]);
        assert!(stepped.is_finished());
        assert!(stepped.step(&mut grid).is_empty());
        assert!(stepped.is_finished());
        assert_eq!(stepped.algorithm().advanced, 2);
    }

    #[test]
    fn test_finish_runs_to_completion() {
        let mut grid = Grid::build(2, 2);
        let mut stepped = countdown(5);
        stepped.finish(&mut grid);
        assert!(stepped.is_finished());
        assert_eq!(stepped.algorithm().initialized, 1);
        assert_eq!(stepped.algorithm().advanced, 5);
    }
}
