// grid.rs - Square boolean board shared by all workers of a run
//
// One AtomicBool per cell: workers committing to disjoint regions never touch
// the same storage word, so the commit phase needs no lock. Relaxed ordering
// is enough because every phase boundary goes through the barrier's mutex.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;

use crate::error::GridError;

/// Plain row-major copy of the board, indexed `[row][col]`.
pub type Cells = Vec<Vec<bool>>;

/// Cells whose state flips between two generations, in evaluation order.
pub type ChangeSet = Vec<Coord>;

/// Moore neighbourhood, row offset first.
pub const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    ( 0, -1),          ( 0, 1),
    ( 1, -1), ( 1, 0), ( 1, 1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl From<(usize, usize)> for Coord {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Result of a whole-board load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// Matrix shape differed from the board; nothing was written.
    Ignored { expected: usize, rows: usize, cols: usize },
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded)
    }
}

pub struct Grid {
    size:  usize,
    cells: Box<[AtomicBool]>,
}

impl Grid {
    /// All-dead board of `size x size` cells.
    pub fn new(size: usize) -> Self {
        let cells = (0..size * size).map(|_| AtomicBool::new(false)).collect();
        Self { size, cells }
    }

    /// Board sized and filled from a square matrix. Rejects any row whose
    /// length differs from the number of rows.
    pub fn from_matrix(matrix: &[Vec<bool>]) -> Result<Self, GridError> {
        let size = matrix.len();
        if let Some((row, values)) = matrix.iter().enumerate().find(|(_, r)| r.len() != size) {
            return Err(GridError::NotSquare { row, len: values.len(), size });
        }

        let grid = Self::new(size);
        for (row, values) in matrix.iter().enumerate() {
            for (col, &alive) in values.iter().enumerate() {
                grid.cells[row * size + col].store(alive, Ordering::Relaxed);
            }
        }
        Ok(grid)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.size && col < self.size
    }

    fn index(&self, row: usize, col: usize) -> Result<usize, GridError> {
        if self.contains(row, col) {
            Ok(row * self.size + col)
        } else {
            Err(GridError::OutOfRange { row, col, size: self.size })
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Result<bool, GridError> {
        let idx = self.index(row, col)?;
        Ok(self.cells[idx].load(Ordering::Relaxed))
    }

    pub fn set(&self, row: usize, col: usize, alive: bool) -> Result<(), GridError> {
        let idx = self.index(row, col)?;
        self.cells[idx].store(alive, Ordering::Relaxed);
        Ok(())
    }

    /// Flip one cell. Returns the new state.
    pub fn toggle(&self, coord: Coord) -> Result<bool, GridError> {
        let idx = self.index(coord.row, coord.col)?;
        Ok(!self.cells[idx].fetch_xor(true, Ordering::Relaxed))
    }

    /// Flip every listed cell; the list is validated before anything changes.
    pub fn apply(&self, changes: &[Coord]) -> Result<(), GridError> {
        for c in changes {
            self.index(c.row, c.col)?;
        }
        for &c in changes {
            self.flip(c);
        }
        Ok(())
    }

    /// Commit-phase flip. Callers only pass coordinates from their own region,
    /// which the partitioner keeps inside the board; slice indexing still
    /// bounds-checks.
    pub(crate) fn flip(&self, coord: Coord) {
        debug_assert!(self.contains(coord.row, coord.col), "flip outside board: {coord}");
        self.cells[coord.row * self.size + coord.col].fetch_xor(true, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn alive_at(&self, row: usize, col: usize) -> bool {
        self.cells[row * self.size + col].load(Ordering::Relaxed)
    }

    /// Replace the whole board when `matrix` is exactly `size x size`.
    /// Any other shape leaves the board untouched and is reported as ignored.
    pub fn load_matrix(&self, matrix: &[Vec<bool>]) -> LoadOutcome {
        let rows = matrix.len();
        let cols = matrix.first().map_or(0, Vec::len);
        let square = rows == self.size && matrix.iter().all(|r| r.len() == self.size);

        if !square {
            warn!(expected = self.size, rows, cols, "initial state has wrong dimensions, load ignored");
            return LoadOutcome::Ignored { expected: self.size, rows, cols };
        }

        for (row, values) in matrix.iter().enumerate() {
            for (col, &alive) in values.iter().enumerate() {
                self.cells[row * self.size + col].store(alive, Ordering::Relaxed);
            }
        }
        LoadOutcome::Loaded
    }

    /// Mark every listed cell alive, leaving the rest as they are.
    pub fn load_alive(&self, alive: &[Coord]) -> Result<(), GridError> {
        for c in alive {
            self.index(c.row, c.col)?;
        }
        for c in alive {
            self.cells[c.row * self.size + c.col].store(true, Ordering::Relaxed);
        }
        Ok(())
    }

    pub fn clear(&self) {
        for cell in self.cells.iter() {
            cell.store(false, Ordering::Relaxed);
        }
    }

    /// Independent copy of the board.
    pub fn snapshot(&self) -> Cells {
        (0..self.size)
            .map(|row| (0..self.size).map(|col| self.alive_at(row, col)).collect())
            .collect()
    }

    /// Live cells in row-major order.
    pub fn live_cells(&self) -> Vec<Coord> {
        let mut live = Vec::new();
        for row in 0..self.size {
            for col in 0..self.size {
                if self.alive_at(row, col) {
                    live.push(Coord::new(row, col));
                }
            }
        }
        live
    }

    pub fn live_count(&self) -> usize {
        self.cells.iter().filter(|c| c.load(Ordering::Relaxed)).count()
    }

    /// Live cells among the in-board Moore neighbours; off-board offsets are skipped, not wrapped.
    pub fn live_neighbors(&self, row: usize, col: usize) -> Result<u8, GridError> {
        self.index(row, col)?;
        Ok(self.count_live_neighbors(row, col))
    }

    pub(crate) fn count_live_neighbors(&self, row: usize, col: usize) -> u8 {
        let mut count = 0;
        for &(dr, dc) in &NEIGHBOR_OFFSETS {
            let (Some(nr), Some(nc)) = (row.checked_add_signed(dr), col.checked_add_signed(dc)) else {
                continue;
            };
            if nr < self.size && nc < self.size && self.alive_at(nr, nc) {
                count += 1;
            }
        }
        count
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("size", &self.size)
            .field("live", &self.live_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_is_rejected() {
        let grid = Grid::new(4);
        assert_eq!(grid.get(4, 0), Err(GridError::OutOfRange { row: 4, col: 0, size: 4 }));
        assert!(grid.set(0, 9, true).is_err());
        assert!(grid.toggle(Coord::new(7, 7)).is_err());
        assert_eq!(grid.live_count(), 0);
    }

    #[test]
    fn toggle_twice_restores_cell() {
        let grid = Grid::new(5);
        grid.load_alive(&[Coord::new(1, 1), Coord::new(3, 2)]).unwrap();
        let before = grid.snapshot();

        assert!(grid.toggle(Coord::new(2, 2)).unwrap());
        assert!(!grid.toggle(Coord::new(2, 2)).unwrap());
        assert_eq!(grid.snapshot(), before);

        assert!(!grid.toggle(Coord::new(1, 1)).unwrap());
        grid.toggle(Coord::new(1, 1)).unwrap();
        assert_eq!(grid.snapshot(), before);
    }

    #[test]
    fn mismatched_matrix_is_an_ignored_load() {
        let grid = Grid::new(3);
        grid.set(1, 1, true).unwrap();
        let before = grid.snapshot();

        let outcome = grid.load_matrix(&vec![vec![true; 4]; 4]);
        assert_eq!(outcome, LoadOutcome::Ignored { expected: 3, rows: 4, cols: 4 });
        assert_eq!(grid.snapshot(), before);

        let ragged = vec![vec![true; 3], vec![true; 2], vec![true; 3]];
        assert!(!grid.load_matrix(&ragged).is_loaded());
        assert_eq!(grid.snapshot(), before);
    }

    #[test]
    fn matching_matrix_replaces_board() {
        let grid = Grid::new(2);
        grid.set(0, 0, true).unwrap();
        let matrix = vec![vec![false, true], vec![true, false]];
        assert!(grid.load_matrix(&matrix).is_loaded());
        assert_eq!(grid.snapshot(), matrix);
    }

    #[test]
    fn load_alive_keeps_existing_cells_and_rejects_whole_list() {
        let grid = Grid::new(4);
        grid.set(0, 0, true).unwrap();
        grid.load_alive(&[Coord::new(2, 3)]).unwrap();
        assert_eq!(grid.live_cells(), vec![Coord::new(0, 0), Coord::new(2, 3)]);

        let bad = [Coord::new(1, 1), Coord::new(4, 0)];
        assert!(grid.load_alive(&bad).is_err());
        assert!(!grid.get(1, 1).unwrap());
    }

    #[test]
    fn snapshot_is_independent() {
        let grid = Grid::new(3);
        let snap = grid.snapshot();
        grid.set(1, 2, true).unwrap();
        assert!(!snap[1][2]);
        assert!(grid.snapshot()[1][2]);
    }

    #[test]
    fn edge_and_corner_neighbor_bounds() {
        let size = 6;
        let grid = Grid::from_matrix(&vec![vec![true; size]; size]).unwrap();
        let last = size - 1;

        for corner in [(0, 0), (0, last), (last, 0), (last, last)] {
            assert_eq!(grid.live_neighbors(corner.0, corner.1).unwrap(), 3);
        }
        for i in 1..last {
            assert_eq!(grid.live_neighbors(0, i).unwrap(), 5);
            assert_eq!(grid.live_neighbors(last, i).unwrap(), 5);
            assert_eq!(grid.live_neighbors(i, 0).unwrap(), 5);
            assert_eq!(grid.live_neighbors(i, last).unwrap(), 5);
        }
        assert_eq!(grid.live_neighbors(2, 3).unwrap(), 8);
    }

    #[test]
    fn apply_validates_before_flipping() {
        let grid = Grid::new(3);
        assert!(grid.apply(&[Coord::new(0, 0), Coord::new(3, 3)]).is_err());
        assert_eq!(grid.live_count(), 0);

        grid.apply(&[Coord::new(0, 0), Coord::new(2, 1)]).unwrap();
        assert_eq!(grid.live_cells(), vec![Coord::new(0, 0), Coord::new(2, 1)]);
    }

    #[test]
    fn ragged_matrix_builds_no_board() {
        let ragged = vec![vec![true; 3], vec![true; 2], vec![true; 3]];
        assert_eq!(
            Grid::from_matrix(&ragged).unwrap_err(),
            GridError::NotSquare { row: 1, len: 2, size: 3 }
        );

        let wide = vec![vec![false; 4]; 2];
        assert!(Grid::from_matrix(&wide).is_err());

        let grid = Grid::from_matrix(&[vec![true, false], vec![false, true]]).unwrap();
        assert_eq!(grid.live_cells(), vec![Coord::new(0, 0), Coord::new(1, 1)]);
    }

    #[test]
    fn clear_kills_every_cell() {
        let grid = Grid::from_matrix(&vec![vec![true; 4]; 4]).unwrap();
        assert_eq!(grid.live_count(), 16);
        grid.clear();
        assert_eq!(grid.live_count(), 0);
        assert_eq!(grid.snapshot(), vec![vec![false; 4]; 4]);
    }
}
