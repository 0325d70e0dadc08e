//! Sandpile simulator CLI.
//!
//! Relaxes a 2-D sandpile grid to its stable configuration under a
//! selectable execution strategy.
//!
//! # Example
//!
//! ```bash
//! # Reference scenario (60x30, center 12121, fill 624), serial
//! sandsim
//!
//! # Tiled across 8 threads, render the result
//! sandsim --strategy tiled --threads 8 --image pile.ppm
//!
//! # Distributed across 9 workers, checked against the serial result
//! sandsim --strategy distributed --workers 9 --verify
//! ```

use clap::{Parser, ValueEnum};
use sandsim_engine::{Boundary, Discipline};
use sandsim_simulator::{output, SimConfig, Simulator, Strategy};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Serial,
    Tiled,
    Distributed,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Serial => Strategy::Serial,
            StrategyArg::Tiled => Strategy::Tiled,
            StrategyArg::Distributed => Strategy::Distributed,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DisciplineArg {
    InPlace,
    DoubleBuffered,
}

impl From<DisciplineArg> for Discipline {
    fn from(arg: DisciplineArg) -> Self {
        match arg {
            DisciplineArg::InPlace => Discipline::InPlace,
            DisciplineArg::DoubleBuffered => Discipline::DoubleBuffered,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BoundaryArg {
    Absorbing,
    Reflecting,
}

impl From<BoundaryArg> for Boundary {
    fn from(arg: BoundaryArg) -> Self {
        match arg {
            BoundaryArg::Absorbing => Boundary::Absorbing,
            BoundaryArg::Reflecting => Boundary::Reflecting,
        }
    }
}

/// Sandpile simulator
#[derive(Parser, Debug)]
#[command(name = "sandsim")]
#[command(version, about, long_about = None)]
struct Args {
    /// Grid rows
    #[arg(short = 'r', long, default_value = "60")]
    rows: usize,

    /// Grid columns
    #[arg(short = 'c', long, default_value = "30")]
    cols: usize,

    /// Initial value of the center cell
    #[arg(long, default_value = "12121")]
    center: u64,

    /// Initial value of every other cell
    #[arg(long, default_value = "624")]
    fill: u64,

    /// Execution strategy
    #[arg(short = 's', long, value_enum, default_value = "serial")]
    strategy: StrategyArg,

    /// Serial update discipline
    #[arg(long, value_enum, default_value = "in-place")]
    discipline: DisciplineArg,

    /// Treatment of mass reaching the global boundary
    #[arg(long, value_enum, default_value = "absorbing")]
    boundary: BoundaryArg,

    /// Worker count for the distributed strategy
    #[arg(short = 'w', long, default_value = "4")]
    workers: usize,

    /// Thread count for the tiled strategy
    #[arg(short = 't', long, default_value = "4")]
    threads: usize,

    /// Tile side for the tiled strategy
    #[arg(long, default_value = "16")]
    tile_size: usize,

    /// Write the stable grid as a plain-text PPM image
    #[arg(long)]
    image: Option<PathBuf>,

    /// Append a result record to this log file
    #[arg(long)]
    results: Option<PathBuf>,

    /// Re-run serially and compare grids cell-by-cell
    #[arg(long)]
    verify: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = SimConfig::new(args.rows, args.cols)
        .with_center_value(args.center)
        .with_fill_value(args.fill)
        .with_strategy(args.strategy.into())
        .with_discipline(args.discipline.into())
        .with_boundary(args.boundary.into())
        .with_workers(args.workers)
        .with_threads(args.threads)
        .with_tile_size(args.tile_size);

    let simulator = match Simulator::new(config.clone()) {
        Ok(simulator) => simulator,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let report = match simulator.run() {
        Ok(report) => report,
        Err(e) => {
            eprintln!("run failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    report.print_summary();

    if args.verify {
        let serial = Simulator::new(config.with_strategy(Strategy::Serial))
            .and_then(|s| s.run());
        match serial {
            Ok(reference) => {
                if report.grid.same_cells(&reference.grid) {
                    info!("verification passed: grids are identical");
                } else {
                    eprintln!("verification FAILED: grids differ");
                    return ExitCode::FAILURE;
                }
            }
            Err(e) => {
                eprintln!("verification run failed: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    // Output failures are warnings: the computation is already done.
    if let Some(path) = &args.image {
        match output::write_ppm(&report.grid, path) {
            Ok(()) => info!(path = %path.display(), "image written"),
            Err(e) => warn!(path = %path.display(), "failed to write image: {e}"),
        }
    }
    if let Some(path) = &args.results {
        match output::append_results(path, &report) {
            Ok(()) => info!(path = %path.display(), "results appended"),
            Err(e) => warn!(path = %path.display(), "failed to append results: {e}"),
        }
    }

    ExitCode::SUCCESS
}
