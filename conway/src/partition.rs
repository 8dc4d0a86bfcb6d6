// partition.rs - Splitting the board into disjoint worker regions
//
// Every strategy covers the whole board exactly once. Shares are rounded
// down and the last share along a split axis takes the remainder.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::error::PartitionError;
use crate::grid::Coord;

/// Half-open block of rows and columns owned by one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub rows: Range<usize>,
    pub cols: Range<usize>,
}

impl Region {
    pub fn new(rows: Range<usize>, cols: Range<usize>) -> Self {
        Self { rows, cols }
    }

    pub fn len(&self) -> usize {
        self.rows.len() * self.cols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, coord: Coord) -> bool {
        self.rows.contains(&coord.row) && self.cols.contains(&coord.col)
    }

    /// Cells in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        self.rows
            .clone()
            .flat_map(move |row| self.cols.clone().map(move |col| Coord::new(row, col)))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rows {}..{} cols {}..{}",
            self.rows.start, self.rows.end, self.cols.start, self.cols.end
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strategy {
    /// Contiguous full-width row bands, one per worker.
    #[default]
    RowSlice,
    /// Power-of-two tiling, halving rows then columns alternately.
    Quadrant,
    /// One worker per row.
    SingleRow,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::RowSlice, Strategy::Quadrant, Strategy::SingleRow];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::RowSlice  => "rows",
            Strategy::Quadrant  => "quadrants",
            Strategy::SingleRow => "single-row",
        }
    }

    /// Whether `workers` can tile a `size x size` board with this strategy.
    pub fn supports(self, workers: usize, size: usize) -> bool {
        match self {
            Strategy::RowSlice  => workers >= 1,
            Strategy::Quadrant  => workers.is_power_of_two(),
            Strategy::SingleRow => workers >= 1 && workers == size,
        }
    }

    /// Regions for each worker, indexed by worker id.
    pub fn regions(self, workers: usize, size: usize) -> Result<Vec<Region>, PartitionError> {
        if !self.supports(workers, size) {
            return Err(PartitionError::InvalidPartition { strategy: self, workers, size });
        }

        let regions = match self {
            Strategy::RowSlice => row_slices(workers, size),
            Strategy::SingleRow => (0..size).map(|row| Region::new(row..row + 1, 0..size)).collect(),
            Strategy::Quadrant => {
                let mut out = Vec::with_capacity(workers);
                halve(Region::new(0..size, 0..size), workers, true, &mut out);
                out
            }
        };
        Ok(regions)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rows" | "row-slice"           => Ok(Strategy::RowSlice),
            "quadrants" | "quadrant"       => Ok(Strategy::Quadrant),
            "single-row" | "row-per-worker" => Ok(Strategy::SingleRow),
            other => Err(format!("unknown partition strategy `{other}` (expected rows, quadrants or single-row)")),
        }
    }
}

fn row_slices(workers: usize, size: usize) -> Vec<Region> {
    let share = size / workers;
    (0..workers)
        .map(|i| {
            let start = i * share;
            let end = if i == workers - 1 { size } else { start + share };
            Region::new(start..end, 0..size)
        })
        .collect()
}

fn halve(region: Region, workers: usize, split_rows: bool, out: &mut Vec<Region>) {
    if workers == 1 {
        out.push(region);
        return;
    }

    let half = workers / 2;
    let Region { rows, cols } = region;
    if split_rows {
        let mid = rows.start + rows.len() / 2;
        halve(Region::new(rows.start..mid, cols.clone()), half, false, out);
        halve(Region::new(mid..rows.end, cols), half, false, out);
    } else {
        let mid = cols.start + cols.len() / 2;
        halve(Region::new(rows.clone(), cols.start..mid), half, true, out);
        halve(Region::new(rows, mid..cols.end), half, true, out);
    }
}
