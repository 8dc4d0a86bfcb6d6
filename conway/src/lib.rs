// lib.rs - Lockstep parallel Game of Life
//
// Workers each own a region of one shared board and advance it together,
// separated by a two-phase barrier, producing exactly the board a single
// thread would.

pub mod barrier;
pub mod config;
pub mod control;
pub mod engine;
pub mod error;
pub mod grid;
pub mod orchestrator;
pub mod partition;
pub mod patterns;
pub mod rule;

pub use barrier::{Barrier, BarrierPhase, BarrierWaitResult};
pub use config::RunConfig;
pub use control::{Pacing, RunHandle};
pub use engine::{WorkerReport, WorkerState, compute_changes, step_sequential};
pub use error::{BarrierError, GridError, PartitionError, RunError};
pub use grid::{Cells, ChangeSet, Coord, Grid, LoadOutcome};
pub use orchestrator::{Orchestrator, RunReport};
pub use partition::{Region, Strategy};
pub use patterns::{PATTERNS, Pattern, random_matrix};
