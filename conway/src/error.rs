// error.rs - Error types for the grid, partitioner, barrier and runs

use thiserror::Error;

use crate::partition::Strategy;

/// Access outside the `size x size` board, or a board that is not square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("cell ({row}, {col}) is outside the {size}x{size} grid")]
    OutOfRange { row: usize, col: usize, size: usize },

    #[error("row {row} has {len} cells, a square board of {size} rows needs {size}")]
    NotSquare { row: usize, len: usize, size: usize },
}

/// The worker count cannot be tiled with the requested strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PartitionError {
    #[error("{strategy} partitioning does not support {workers} workers on a {size}x{size} grid")]
    InvalidPartition {
        strategy: Strategy,
        workers:  usize,
        size:     usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BarrierError {
    /// A party left the rendezvous for good (its worker panicked).
    #[error("barrier abandoned by a departed party")]
    Abandoned,
}

/// Why a parallel run could not start or finish.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Partition(#[from] PartitionError),

    #[error("failed to start the worker runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("worker {worker} failed: {reason}")]
    Worker { worker: usize, reason: String },
}
