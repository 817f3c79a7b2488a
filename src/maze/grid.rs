use std::{
    collections::VecDeque,
    sync::atomic::{AtomicU64, Ordering},
};

use super::cell::{Cell, CellId, CellState};
use crate::error::{MazeError, MazeResult};

/// Source of process-unique grid identities.
static NEXT_GRID_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of one built grid. Two grids built with the same dimensions still get different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridId(u64);

/// A `rows x cols` graph of cells. Cells live in a flat row-major arena and refer to each other
/// by [`CellId`], so the neighbor and connection relations carry no ownership.
#[derive(Debug, Clone)]
pub struct Grid {
    id: GridId,
    cells: Box<[Cell]>,
    rows: u16,
    cols: u16,
}

impl Grid {
    /// Builds a grid with every cell `Empty`, no connections, and the 4-adjacency neighbor
    /// relation (no diagonals, no wraparound).
    pub fn build(rows: u16, cols: u16) -> Self {
        let cells = (0..rows)
            .flat_map(|row| (0..cols).map(move |col| Cell::new(row, col)))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        let mut grid = Grid {
            id: GridId(NEXT_GRID_ID.fetch_add(1, Ordering::Relaxed)),
            cells,
            rows,
            cols,
        };
        (0..rows).for_each(|row| {
            (0..cols).for_each(|col| {
                let id = grid.ravel_index(row, col);
                // Right neighbor if not in last column
                if col + 1 < cols {
                    grid.add_neighbor(id, grid.ravel_index(row, col + 1));
                }
                // Down neighbor if not in last row
                if row + 1 < rows {
                    grid.add_neighbor(id, grid.ravel_index(row + 1, col));
                }
            })
        });
        grid
    }

    pub fn id(&self) -> GridId {
        self.id
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn ravel_index(&self, row: u16, col: u16) -> CellId {
        CellId::new(row as usize * self.cols as usize + col as usize)
    }

    /// Id of the cell at `(row, col)`, or `None` when out of bounds.
    pub fn cell_id(&self, row: u16, col: u16) -> Option<CellId> {
        (row < self.rows && col < self.cols).then(|| self.ravel_index(row, col))
    }

    /// `(row, col)` of a cell.
    pub fn coord(&self, id: CellId) -> (u16, u16) {
        let cell = &self[id];
        (cell.row(), cell.col())
    }

    /// All cell ids in row-major order.
    pub fn ids(&self) -> impl Iterator<Item = CellId> + use<> {
        (0..self.cells.len()).map(CellId::new)
    }

    pub fn state(&self, id: CellId) -> CellState {
        self.cells[id.index()].state
    }

    pub fn set_state(&mut self, id: CellId, state: CellState) {
        self.cells[id.index()].state = state;
    }

    /// Sets every cell to `state`.
    pub fn reset_states(&mut self, state: CellState) {
        self.cells.iter_mut().for_each(|cell| cell.state = state);
    }

    pub fn neighbors(&self, id: CellId) -> &[CellId] {
        self.cells[id.index()].neighbors()
    }

    pub fn connections(&self, id: CellId) -> &[CellId] {
        self.cells[id.index()].connections()
    }

    pub fn is_neighbor(&self, a: CellId, b: CellId) -> bool {
        self.cells[a.index()].neighbors.contains(b)
    }

    pub fn is_connected(&self, a: CellId, b: CellId) -> bool {
        self.cells[a.index()].connections.contains(b)
    }

    /// Makes `a` and `b` neighbors of each other. Adding an existing neighbor is a no-op.
    pub fn add_neighbor(&mut self, a: CellId, b: CellId) {
        debug_assert_ne!(a, b, "a cell cannot neighbor itself");
        self.cells[a.index()].neighbors.insert(b);
        self.cells[b.index()].neighbors.insert(a);
    }

    /// Removes the wall between `a` and `b`. Connecting already connected cells is a no-op.
    ///
    /// Fails with [`MazeError::NotNeighbors`] if `b` is not a neighbor of `a`.
    pub fn connect(&mut self, a: CellId, b: CellId) -> MazeResult<()> {
        if !self.is_neighbor(a, b) {
            return Err(MazeError::NotNeighbors { a, b });
        }
        self.cells[a.index()].connections.insert(b);
        self.cells[b.index()].connections.insert(a);
        Ok(())
    }

    /// Carves a passage between two cells the caller picked from each other's neighbor lists.
    ///
    /// Steppers cannot fail, so a non-neighbor pair is logged and leaves the grid unchanged.
    pub(crate) fn link(&mut self, a: CellId, b: CellId) {
        if let Err(e) = self.connect(a, b) {
            tracing::error!("Refusing to carve a passage: {e}");
        }
    }

    /// Puts the wall between `a` and `b` back. Disconnecting cells that are not connected is a
    /// no-op.
    pub fn disconnect(&mut self, a: CellId, b: CellId) {
        self.cells[a.index()].connections.remove(b);
        self.cells[b.index()].connections.remove(a);
    }

    /// Number of undirected connections in the grid.
    pub fn edge_count(&self) -> usize {
        self.cells
            .iter()
            .map(|cell| cell.connections.len())
            .sum::<usize>()
            / 2
    }

    /// Number of connection edges on the shortest route from `from` to `to`, or `None` when
    /// `to` cannot be reached.
    pub fn distance(&self, from: CellId, to: CellId) -> Option<usize> {
        let mut dist = vec![usize::MAX; self.len()];
        let mut queue = VecDeque::from([from]);
        dist[from.index()] = 0;
        while let Some(current) = queue.pop_front() {
            if current == to {
                return Some(dist[current.index()]);
            }
            for &next in self.connections(current) {
                if dist[next.index()] == usize::MAX {
                    dist[next.index()] = dist[current.index()] + 1;
                    queue.push_back(next);
                }
            }
        }
        None
    }

    /// Whether the connections form a spanning tree: every cell reachable from the first one,
    /// and exactly `len - 1` edges (which together with connectivity rules out cycles).
    pub fn is_spanning_tree(&self) -> bool {
        if self.is_empty() {
            return true;
        }
        if self.edge_count() != self.len() - 1 {
            return false;
        }
        let mut seen = vec![false; self.len()];
        let mut stack = vec![CellId::new(0)];
        seen[0] = true;
        let mut reached = 1;
        while let Some(current) = stack.pop() {
            for &next in self.connections(current) {
                if !seen[next.index()] {
                    seen[next.index()] = true;
                    reached += 1;
                    stack.push(next);
                }
            }
        }
        reached == self.len()
    }
}

impl std::ops::Index<CellId> for Grid {
    type Output = Cell;

    fn index(&self, index: CellId) -> &Self::Output {
        &self.cells[index.index()]
    }
}
