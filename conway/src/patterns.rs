// patterns.rs - Named starting patterns and seeded random boards

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::GridError;
use crate::grid::{Cells, Coord, Grid};

/// Live cells relative to the pattern's top-left corner.
pub struct Pattern {
    pub name:  &'static str,
    pub cells: &'static [(usize, usize)],
}

pub const PATTERNS: &[Pattern] = &[
    Pattern {
        name: "Glider",
        cells: &[(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)],
    },
    Pattern {
        name: "Blinker",
        cells: &[(0, 0), (0, 1), (0, 2)],
    },
    Pattern {
        name: "Block",
        cells: &[(0, 0), (0, 1), (1, 0), (1, 1)],
    },
    Pattern {
        name: "Toad",
        cells: &[(0, 1), (0, 2), (0, 3), (1, 0), (1, 1), (1, 2)],
    },
    Pattern {
        name: "Beacon",
        cells: &[(0, 0), (0, 1), (1, 0), (1, 1), (2, 2), (2, 3), (3, 2), (3, 3)],
    },
    Pattern {
        name: "Pulsar",
        cells: &[
            // Top half
            (0, 2), (0, 3), (0, 4), (0, 8), (0, 9), (0, 10),
            (2, 0), (2, 5), (2, 7), (2, 12),
            (3, 0), (3, 5), (3, 7), (3, 12),
            (4, 0), (4, 5), (4, 7), (4, 12),
            (5, 2), (5, 3), (5, 4), (5, 8), (5, 9), (5, 10),
            // Bottom half (mirrored)
            (7, 2), (7, 3), (7, 4), (7, 8), (7, 9), (7, 10),
            (8, 0), (8, 5), (8, 7), (8, 12),
            (9, 0), (9, 5), (9, 7), (9, 12),
            (10, 0), (10, 5), (10, 7), (10, 12),
            (12, 2), (12, 3), (12, 4), (12, 8), (12, 9), (12, 10),
        ],
    },
    Pattern {
        name: "R-pentomino",
        cells: &[(0, 2), (1, 1), (1, 2), (2, 0), (2, 1)],
    },
    Pattern {
        name: "Gosper Glider Gun",
        cells: &[
            (4, 0), (4, 1), (5, 0), (5, 1),
            (4, 10), (5, 10), (6, 10), (3, 11), (7, 11), (2, 12), (8, 12),
            (2, 13), (8, 13), (5, 14), (3, 15), (7, 15), (4, 16), (5, 16),
            (6, 16), (5, 17), (2, 20), (3, 20), (4, 20), (2, 21), (3, 21),
            (4, 21), (1, 22), (5, 22), (0, 24), (1, 24), (5, 24), (6, 24),
            (2, 34), (3, 34), (2, 35), (3, 35),
        ],
    },
];

impl Pattern {
    /// Case-insensitive lookup by name.
    pub fn find(name: &str) -> Option<&'static Pattern> {
        PATTERNS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Absolute coordinates with the pattern's corner at `origin`.
    pub fn cells_at(&self, origin: Coord) -> Vec<Coord> {
        self.cells
            .iter()
            .map(|&(r, c)| Coord::new(origin.row + r, origin.col + c))
            .collect()
    }

    /// Bring the pattern's cells alive on `grid`. Fails without touching the
    /// board if any cell would land outside it.
    pub fn place(&self, grid: &Grid, origin: Coord) -> Result<(), GridError> {
        grid.load_alive(&self.cells_at(origin))
    }
}

/// Reproducible board with each cell alive with probability one half.
pub fn random_matrix(size: usize, seed: u64) -> Cells {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..size)
        .map(|_| (0..size).map(|_| rng.gen_bool(0.5)).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_boards_are_reproducible() {
        assert_eq!(random_matrix(16, 5), random_matrix(16, 5));
        assert_ne!(random_matrix(16, 5), random_matrix(16, 6));
        let board = random_matrix(16, 5);
        assert!(board.iter().all(|row| row.len() == 16));
    }

    #[test]
    fn place_offsets_pattern() {
        let grid = Grid::new(10);
        Pattern::find("glider").unwrap().place(&grid, Coord::new(3, 4)).unwrap();
        assert_eq!(
            grid.live_cells(),
            vec![
                Coord::new(3, 5),
                Coord::new(4, 6),
                Coord::new(5, 4),
                Coord::new(5, 5),
                Coord::new(5, 6),
            ]
        );
    }

    #[test]
    fn oversized_placement_is_rejected() {
        let grid = Grid::new(20);
        let gun = Pattern::find("Gosper Glider Gun").unwrap();
        assert!(gun.place(&grid, Coord::new(0, 0)).is_err());
        assert_eq!(grid.live_count(), 0);
    }
}
