//! Error types for maze operations.

use thiserror::Error;

use crate::maze::CellId;

/// Result type for maze operations.
pub type MazeResult<T> = Result<T, MazeError>;

/// Errors raised by the maze engine. All of them are caller precondition violations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MazeError {
    /// Tried to connect two cells that are not structural neighbors.
    #[error("cannot connect cells that are not neighbors: {a} and {b}")]
    NotNeighbors { a: CellId, b: CellId },

    /// Tried to solve before any maze was generated.
    #[error("cannot solve: no maze has been generated")]
    NoMaze,

    /// Settings rejected by [`Settings::validate`](crate::controller::Settings::validate).
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}
