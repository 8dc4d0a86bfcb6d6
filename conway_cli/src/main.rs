// main.rs - Console driver: seed a board, advance it on lockstep workers,
// optionally replay it sequentially and compare.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use conway::{Cells, Coord, Grid, Orchestrator, PATTERNS, Pacing, Pattern, RunConfig, Strategy, random_matrix};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod render;

/// Run Conway's Game of Life on a fixed set of lockstep workers.
#[derive(Parser, Debug)]
#[command(name = "conway", version)]
struct Args {
    /// Board edge length (the board is size x size).
    #[arg(long, default_value_t = 200)]
    size: usize,

    /// Number of workers.
    #[arg(long, default_value_t = 16)]
    workers: usize,

    /// Partition strategy: rows, quadrants or single-row.
    #[arg(long, default_value_t = Strategy::Quadrant)]
    strategy: Strategy,

    /// Generations to run.
    #[arg(long, default_value_t = 100)]
    generations: u64,

    /// Seed for the random starting board.
    #[arg(long, default_value_t = 5)]
    seed: u64,

    /// Start from a named pattern instead of a random board.
    #[arg(long)]
    pattern: Option<String>,

    /// Top-left corner for --pattern, as ROW,COL.
    #[arg(long, default_value = "1,1", value_parser = parse_coord)]
    origin: Coord,

    /// Also run the sequential reference and require identical boards.
    #[arg(long)]
    compare: bool,

    /// Print the final board.
    #[arg(long)]
    print: bool,

    /// Admit generations at this many per second instead of back to back.
    #[arg(long)]
    rate: Option<f64>,

    /// Default log filter when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// List the built-in patterns and exit.
    #[arg(long)]
    list_patterns: bool,
}

fn parse_coord(s: &str) -> Result<Coord, String> {
    let (row, col) = s.split_once(',').ok_or_else(|| format!("expected ROW,COL, got `{s}`"))?;
    let row = row.trim().parse().map_err(|e| format!("bad row `{row}`: {e}"))?;
    let col = col.trim().parse().map_err(|e| format!("bad column `{col}`: {e}"))?;
    Ok(Coord::new(row, col))
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn starting_board(args: &Args) -> Result<Cells> {
    match &args.pattern {
        Some(name) => {
            let pattern = Pattern::find(name)
                .with_context(|| format!("unknown pattern `{name}` (try --list-patterns)"))?;
            let grid = Grid::new(args.size);
            pattern
                .place(&grid, args.origin)
                .with_context(|| format!("{} does not fit at {} on a {}x{} board", pattern.name, args.origin, args.size, args.size))?;
            Ok(grid.snapshot())
        }
        None => Ok(random_matrix(args.size, args.seed)),
    }
}

// Feeds one permit per tick until the run is over.
fn spawn_pacer(orchestrator: &Orchestrator, rate: f64, done: Arc<AtomicBool>) -> Result<thread::JoinHandle<()>> {
    if !(rate.is_finite() && rate > 0.0) {
        bail!("--rate must be a positive number, got {rate}");
    }
    let interval = Duration::from_secs_f64(1.0 / rate);
    let handle = orchestrator.handle();
    Ok(thread::spawn(move || {
        while !done.load(Ordering::Relaxed) {
            handle.notify_next_generation();
            thread::sleep(interval);
        }
    }))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    if args.list_patterns {
        for pattern in PATTERNS {
            println!("{:<20} {} cells", pattern.name, pattern.cells.len());
        }
        return Ok(());
    }

    let seed = starting_board(&args)?;
    let grid = Arc::new(Grid::from_matrix(&seed).context("starting board is not square")?);
    let pacing = if args.rate.is_some() { Pacing::Stepped } else { Pacing::Free };
    let config = RunConfig::new(args.workers, args.strategy, args.generations).pacing(pacing);

    let orchestrator = Orchestrator::new();
    let done = Arc::new(AtomicBool::new(false));
    let pacer = match args.rate {
        Some(rate) => Some(spawn_pacer(&orchestrator, rate, Arc::clone(&done))?),
        None => None,
    };

    let result = orchestrator.start(&grid, &config);
    done.store(true, Ordering::Relaxed);
    if let Some(pacer) = pacer {
        let _ = pacer.join();
    }
    let report = result.context("parallel run failed")?;

    println!(
        "{} workers ({}), {} generations: {} milliseconds",
        report.workers,
        args.strategy,
        report.generations,
        report.elapsed.as_millis()
    );

    if args.compare {
        let reference = Grid::from_matrix(&seed)?;
        let sequential = Orchestrator::run_sequential(&reference, report.generations);
        println!("sequential, {} generations: {} milliseconds", sequential.generations, sequential.elapsed.as_millis());

        if reference.snapshot() != grid.snapshot() {
            bail!("parallel board differs from the sequential reference");
        }
        info!("parallel and sequential boards match");
        println!("boards match");
    }

    let snapshot = grid.snapshot();
    if args.print {
        print!("{}", render::render(&snapshot));
    }
    println!("{}", render::Population::of(&snapshot));

    Ok(())
}
