use std::fmt;

/// Index of a cell inside a [`Grid`](super::Grid), in row-major order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(u32);

impl CellId {
    pub(crate) fn new(index: usize) -> Self {
        CellId(index as u32)
    }

    /// Position of the cell in the grid's flat storage.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Render state of a cell. What each state means is up to the algorithm currently running:
/// generators use `Partial` for cells being carved and `Solid` for cells that belong to the maze,
/// solvers use `Solid` for unvisited cells and `Partial` for visited ones.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellState {
    #[default]
    Empty,
    Partial,
    Solid,
}

/// Fixed-capacity set of up to four cell ids. A grid cell never has more than four neighbors,
/// so the relation lists live inline in the cell instead of on the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Links {
    ids: [CellId; 4],
    len: u8,
}

impl Links {
    pub const CAPACITY: usize = 4;

    pub const fn new() -> Self {
        Links {
            ids: [CellId(0); 4],
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[CellId] {
        &self.ids[..self.len as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = CellId> + '_ {
        self.as_slice().iter().copied()
    }

    pub fn contains(&self, id: CellId) -> bool {
        self.as_slice().contains(&id)
    }

    /// Adds `id` if not already present. Returns `true` if it was added.
    ///
    /// # Panics
    /// If the set is already full, which would mean a cell got more than four neighbors.
    pub(crate) fn insert(&mut self, id: CellId) -> bool {
        if self.contains(id) {
            return false;
        }
        assert!(
            self.len() < Self::CAPACITY,
            "a grid cell cannot have more than {} links",
            Self::CAPACITY
        );
        self.ids[self.len as usize] = id;
        self.len += 1;
        true
    }

    /// Removes `id` if present, keeping the order of the remaining entries.
    /// Returns `true` if it was removed.
    pub(crate) fn remove(&mut self, id: CellId) -> bool {
        match self.as_slice().iter().position(|&c| c == id) {
            Some(pos) => {
                let len = self.len as usize;
                self.ids.copy_within(pos + 1..len, pos);
                self.len -= 1;
                true
            }
            None => false,
        }
    }
}

impl Default for Links {
    fn default() -> Self {
        Links::new()
    }
}

/// A single cell of the maze.
#[derive(Debug, Clone)]
pub struct Cell {
    row: u16,
    col: u16,
    /// Render state, see [`CellState`].
    pub state: CellState,
    /// Structurally adjacent cells, fixed once the grid is built.
    pub(crate) neighbors: Links,
    /// Neighbors with no wall in between. Always a subset of `neighbors`.
    pub(crate) connections: Links,
}

impl Cell {
    pub(crate) fn new(row: u16, col: u16) -> Self {
        Cell {
            row,
            col,
            state: CellState::Empty,
            neighbors: Links::new(),
            connections: Links::new(),
        }
    }

    pub fn row(&self) -> u16 {
        self.row
    }

    pub fn col(&self) -> u16 {
        self.col
    }

    pub fn neighbors(&self) -> &[CellId] {
        self.neighbors.as_slice()
    }

    pub fn connections(&self) -> &[CellId] {
        self.connections.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_insert_is_idempotent() {
        let mut links = Links::new();
        assert!(links.insert(CellId::new(3)));
        assert!(!links.insert(CellId::new(3)));
        assert_eq!(links.as_slice(), &[CellId::new(3)]);
    }

    #[test]
    fn test_links_remove_keeps_order() {
        let mut links = Links::new();
        (0..4).for_each(|i| {
            links.insert(CellId::new(i));
        });
        assert!(links.remove(CellId::new(1)));
        assert!(!links.remove(CellId::new(1)));
        assert_eq!(
            links.as_slice(),
            &[CellId::new(0), CellId::new(2), CellId::new(3)]
        );
    }

    #[test]
    #[should_panic]
    fn test_links_overflow_panics() {
        let mut links = Links::new();
        (0..5).for_each(|i| {
            links.insert(CellId::new(i));
        });
    }
}
