// orchestrator.rs - Spawns the fixed worker set for a run and collects results

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinError;
use tracing::{info, warn};

use crate::barrier::Barrier;
use crate::config::RunConfig;
use crate::control::{RunControl, RunHandle};
use crate::engine::{self, RunContext, Worker, WorkerReport};
use crate::error::{BarrierError, RunError};
use crate::grid::Grid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub workers:     usize,
    pub generations: u64,
    /// Cells flipped across all generations and workers.
    pub flipped:     u64,
    pub elapsed:     Duration,
}

/// Entry point for drivers. The handle steers whichever run is in progress;
/// stop requests and unused pacing permits are dropped when a run ends.
#[derive(Debug, Default)]
pub struct Orchestrator {
    handle: RunHandle,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for stopping or stepping the current run from another thread.
    /// Requests made before `start` apply to the run that `start` begins.
    pub fn handle(&self) -> RunHandle {
        self.handle.clone()
    }

    /// Run `config.generations` generations of `grid` on `config.workers`
    /// workers, blocking until they finish or a stop is observed.
    ///
    /// The partition is validated before anything is spawned; an invalid
    /// worker count leaves the grid untouched.
    pub fn start(&self, grid: &Arc<Grid>, config: &RunConfig) -> Result<RunReport, RunError> {
        let size = grid.size();
        let regions = config.strategy.regions(config.workers, size)?;
        let control = Arc::clone(&self.handle.control);
        let _reset = ResetOnExit(&self.handle.control);
        let started = Instant::now();

        info!(
            size,
            workers = config.workers,
            strategy = %config.strategy,
            generations = ?config.generations,
            pacing = ?config.pacing,
            "starting run"
        );

        if !(config.within_limit(0) && control.admit(config.pacing)) {
            info!("nothing to run");
            return Ok(RunReport {
                workers:     config.workers,
                generations: 0,
                flipped:     0,
                elapsed:     started.elapsed(),
            });
        }

        // Only hosts the blocking pool, sized so every worker gets its own thread.
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(config.workers)
            .thread_name("conway-worker")
            .build()?;

        let ctx = Arc::new(RunContext {
            grid:    Arc::clone(grid),
            barrier: Barrier::new(config.workers),
            control,
            config:  config.clone(),
        });

        let joined = runtime.block_on(async {
            let handles: Vec<_> = regions
                .into_iter()
                .enumerate()
                .map(|(id, region)| {
                    let worker = Worker::new(id, region, Arc::clone(&ctx));
                    tokio::task::spawn_blocking(move || worker.run())
                })
                .collect();

            let mut joined = Vec::with_capacity(handles.len());
            for handle in handles {
                joined.push(handle.await);
            }
            joined
        });

        let reports = collect_reports(joined)?;
        let report = RunReport {
            workers:     config.workers,
            generations: reports.first().map_or(0, |r| r.generations),
            flipped:     reports.iter().map(|r| r.flipped).sum(),
            elapsed:     started.elapsed(),
        };

        info!(
            generations = report.generations,
            flipped = report.flipped,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "run finished"
        );
        Ok(report)
    }

    /// Single-threaded reference run used to validate parallel results.
    pub fn run_sequential(grid: &Grid, generations: u64) -> RunReport {
        let started = Instant::now();
        let mut flipped = 0u64;
        for _ in 0..generations {
            flipped += engine::step_sequential(grid) as u64;
        }
        RunReport {
            workers: 1,
            generations,
            flipped,
            elapsed: started.elapsed(),
        }
    }
}

// Run-scoped stop and pacing state ends with the run, however it ends.
struct ResetOnExit<'a>(&'a RunControl);

impl Drop for ResetOnExit<'_> {
    fn drop(&mut self) {
        self.0.reset();
    }
}

type Joined = Result<Result<WorkerReport, BarrierError>, JoinError>;

// A panicking worker is the root cause; the peers it abandoned only report that.
fn collect_reports(joined: Vec<Joined>) -> Result<Vec<WorkerReport>, RunError> {
    let mut reports = Vec::with_capacity(joined.len());
    let mut panicked = None;
    let mut abandoned = None;

    for (worker, result) in joined.into_iter().enumerate() {
        match result {
            Ok(Ok(report)) => reports.push(report),
            Ok(Err(err)) => {
                abandoned.get_or_insert(RunError::Worker { worker, reason: err.to_string() });
            }
            Err(err) => {
                warn!(worker, error = %err, "worker did not complete");
                panicked.get_or_insert(RunError::Worker { worker, reason: err.to_string() });
            }
        }
    }

    match panicked.or(abandoned) {
        Some(err) => Err(err),
        None => Ok(reports),
    }
}
