//! Strategy dispatch and run timing.

use crate::config::{SimConfig, SimConfigError, Strategy};
use sandsim_engine::{stabilize, EngineError, TiledEngine};
use sandsim_grid::{GridBuffer, GridError, THRESHOLD};
use sandsim_parallel::{ClusterConfig, ClusterError, ClusterSimulator};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::info;

/// Errors from a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Config(#[from] SimConfigError),

    #[error("grid error: {0}")]
    Grid(#[from] GridError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("cluster error: {0}")]
    Cluster(#[from] ClusterError),

    #[error("failed to build tokio runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Result of one simulation run.
#[derive(Debug)]
pub struct RunReport {
    /// Strategy label (e.g. `serial-inplace`, `distributed-9`).
    pub label: String,
    /// Grid rows.
    pub rows: usize,
    /// Grid columns.
    pub cols: usize,
    /// Initial center value.
    pub center_value: u64,
    /// Initial fill value.
    pub fill_value: u64,
    /// Outer iterations that toppled at least one cell.
    pub iterations: u64,
    /// Wall time of the relaxation.
    pub elapsed: Duration,
    /// The final stable grid.
    pub grid: GridBuffer,
}

impl RunReport {
    /// True when every cell of the final grid is below the threshold.
    pub fn is_stable(&self) -> bool {
        self.grid.is_stable()
    }

    /// Print a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("=== {} ===", self.label);
        println!("grid:       {}x{}", self.rows, self.cols);
        println!(
            "init:       center={} fill={}",
            self.center_value, self.fill_value
        );
        println!("iterations: {}", self.iterations);
        println!("elapsed:    {:.4}s", self.elapsed.as_secs_f64());
        println!(
            "stable:     {} (max cell {})",
            self.is_stable(),
            self.grid.max_interior()
        );
    }
}

/// Runs one simulation under the configured strategy.
pub struct Simulator {
    config: SimConfig,
}

impl Simulator {
    /// Create a simulator. Fails on an invalid configuration.
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration this simulator runs.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Run to a stable grid.
    pub fn run(&self) -> Result<RunReport, SimError> {
        let params = self.config.grid_params();
        let start = Instant::now();

        let (iterations, grid) = match self.config.strategy {
            Strategy::Serial => {
                let mut grid = GridBuffer::global(&params)?;
                let outcome = stabilize(&mut grid, self.config.discipline, self.config.boundary)?;
                (outcome.iterations, grid)
            }
            Strategy::Tiled => {
                let engine = TiledEngine::new(self.config.threads, self.config.tile_size)?;
                let mut grid = GridBuffer::global(&params)?;
                let outcome = engine.stabilize(&mut grid, self.config.boundary);
                (outcome.iterations, grid)
            }
            Strategy::Distributed => {
                let cluster_config = ClusterConfig::new(params, self.config.workers)
                    .with_discipline(self.config.discipline)
                    .with_boundary(self.config.boundary)
                    .with_threads_per_worker(self.config.threads)
                    .with_tile_size(self.config.tile_size);
                let runtime = tokio::runtime::Builder::new_multi_thread()
                    .enable_all()
                    .build()?;
                let report = runtime.block_on(ClusterSimulator::new(cluster_config).run())?;
                (report.iterations, report.grid)
            }
        };

        let elapsed = start.elapsed();
        debug_assert!(grid.max_interior() < THRESHOLD);
        info!(
            label = self.config.label(),
            iterations,
            elapsed_secs = elapsed.as_secs_f64(),
            "run complete"
        );

        Ok(RunReport {
            label: self.config.label(),
            rows: self.config.rows,
            cols: self.config.cols,
            center_value: self.config.center_value,
            fill_value: self.config.fill_value,
            iterations,
            elapsed,
            grid,
        })
    }
}
