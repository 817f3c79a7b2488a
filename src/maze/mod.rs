pub mod cell;
mod grid;

pub use cell::{Cell, CellId, CellState, Links};
pub use grid::{Grid, GridId};

/// Direction in which a solve runs across the maze.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// From the first column to the last one.
    Horizontal,
    /// From the first row to the last one.
    Vertical,
}

/// Cells touched during one step of an algorithm, i.e. the cells a renderer has to redraw.
pub type ChangeList = Vec<CellId>;
