// engine.rs - Per-generation compute/commit protocol run by each worker
//
// A worker owns one region for the whole run. Each generation it:
//   1. computes the flips for its region from the pre-commit board
//   2. waits at phase 1 until every region is computed
//   3. applies its own flips
//   4. waits at phase 2 until every region is committed
// The party releasing phase 2 decides whether another generation follows.

use std::sync::Arc;
use std::thread;

use tracing::{debug, trace};

use crate::barrier::Barrier;
use crate::config::RunConfig;
use crate::control::RunControl;
use crate::error::BarrierError;
use crate::grid::{ChangeSet, Grid};
use crate::partition::Region;
use crate::rule;

/// Cells of `region` that flip in the next generation, row-major.
pub fn compute_changes(grid: &Grid, region: &Region) -> ChangeSet {
    let mut changes = ChangeSet::new();
    for coord in region.coords() {
        let alive = grid.alive_at(coord.row, coord.col);
        let neighbors = grid.count_live_neighbors(coord.row, coord.col);
        if rule::flips(alive, neighbors) {
            changes.push(coord);
        }
    }
    changes
}

/// Advance the whole board one generation on the calling thread.
/// Returns the number of cells flipped.
pub fn step_sequential(grid: &Grid) -> usize {
    let size = grid.size();
    let changes = compute_changes(grid, &Region::new(0..size, 0..size));
    for &coord in &changes {
        grid.flip(coord);
    }
    changes.len()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Computing,
    AwaitingAllComputed,
    Committing,
    AwaitingAllCommitted,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorkerReport {
    pub worker:      usize,
    pub generations: u64,
    pub flipped:     u64,
}

/// State shared by every worker of one run.
pub(crate) struct RunContext {
    pub grid:    Arc<Grid>,
    pub barrier: Barrier,
    pub control: Arc<RunControl>,
    pub config:  RunConfig,
}

pub(crate) struct Worker {
    id:     usize,
    region: Region,
    ctx:    Arc<RunContext>,
    state:  WorkerState,
}

// Breaks the barrier if the worker unwinds, so peers don't wait forever.
struct AbandonOnPanic<'a>(&'a Barrier);

impl Drop for AbandonOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.abandon();
        }
    }
}

impl Worker {
    pub(crate) fn new(id: usize, region: Region, ctx: Arc<RunContext>) -> Self {
        Self { id, region, ctx, state: WorkerState::Computing }
    }

    fn enter(&mut self, next: WorkerState, generation: u64) {
        trace!(worker = self.id, generation, from = ?self.state, to = ?next, "worker state");
        self.state = next;
    }

    /// Run generations until the limit is reached or a stop is observed.
    pub(crate) fn run(mut self) -> Result<WorkerReport, BarrierError> {
        let ctx = Arc::clone(&self.ctx);
        let _guard = AbandonOnPanic(&ctx.barrier);
        let mut report = WorkerReport { worker: self.id, ..WorkerReport::default() };

        debug!(worker = self.id, region = %self.region, "worker started");

        loop {
            let generation = report.generations;

            self.enter(WorkerState::Computing, generation);
            let changes = compute_changes(&ctx.grid, &self.region);

            self.enter(WorkerState::AwaitingAllComputed, generation);
            ctx.barrier.phase1()?;

            self.enter(WorkerState::Committing, generation);
            for &coord in &changes {
                debug_assert!(self.region.contains(coord));
                ctx.grid.flip(coord);
            }
            report.flipped += changes.len() as u64;
            report.generations += 1;

            self.enter(WorkerState::AwaitingAllCommitted, generation);
            let completed = report.generations;
            let proceed = ctx.barrier.phase2_with(|| {
                ctx.config.within_limit(completed) && ctx.control.admit(ctx.config.pacing)
            })?;
            if !proceed {
                break;
            }
        }

        self.enter(WorkerState::Finished, report.generations);
        debug!(worker = self.id, generations = report.generations, flipped = report.flipped, "worker finished");
        Ok(report)
    }
}
