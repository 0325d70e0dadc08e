//! Simulation run configuration.

use sandsim_engine::{Boundary, Discipline};
use sandsim_grid::GridParams;
use thiserror::Error;

/// Which execution strategy relaxes the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// One grid, one thread, serial discipline.
    #[default]
    Serial,
    /// One grid, red/black tiles across a thread pool.
    Tiled,
    /// Domain decomposition across message-passing workers.
    Distributed,
}

/// Errors from configuration validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimConfigError {
    #[error("grid dimensions must be non-zero (got {rows}x{cols})")]
    EmptyGrid { rows: usize, cols: usize },

    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("thread count must be at least 1")]
    NoThreads,
}

/// Configuration for a simulation run.
///
/// Defaults are the reference scenario: a 60x30 grid, every cell at
/// 624, the center cell at 12121.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Global grid rows.
    pub rows: usize,
    /// Global grid columns.
    pub cols: usize,
    /// Initial value of the center cell.
    pub center_value: u64,
    /// Initial value of every other cell.
    pub fill_value: u64,
    /// Execution strategy.
    pub strategy: Strategy,
    /// Serial update discipline (serial and distributed strategies).
    pub discipline: Discipline,
    /// Global boundary treatment.
    pub boundary: Boundary,
    /// Worker count for the distributed strategy.
    pub workers: usize,
    /// Thread count for the tiled strategy (and per distributed worker
    /// when above 1).
    pub threads: usize,
    /// Tile side for the tiled strategy.
    pub tile_size: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            rows: 60,
            cols: 30,
            center_value: 12121,
            fill_value: 624,
            strategy: Strategy::default(),
            discipline: Discipline::default(),
            boundary: Boundary::default(),
            workers: 4,
            threads: 4,
            tile_size: 16,
        }
    }
}

impl SimConfig {
    /// Create a configuration for a `rows x cols` grid with the default
    /// strategy.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            ..Default::default()
        }
    }

    /// Set the center cell value.
    pub fn with_center_value(mut self, value: u64) -> Self {
        self.center_value = value;
        self
    }

    /// Set the fill value for non-center cells.
    pub fn with_fill_value(mut self, value: u64) -> Self {
        self.fill_value = value;
        self
    }

    /// Set the execution strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the serial update discipline.
    pub fn with_discipline(mut self, discipline: Discipline) -> Self {
        self.discipline = discipline;
        self
    }

    /// Set the global boundary treatment.
    pub fn with_boundary(mut self, boundary: Boundary) -> Self {
        self.boundary = boundary;
        self
    }

    /// Set the distributed worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the tiled thread count.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set the tile side.
    pub fn with_tile_size(mut self, tile_size: usize) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), SimConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(SimConfigError::EmptyGrid {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.workers == 0 {
            return Err(SimConfigError::NoWorkers);
        }
        if self.threads == 0 {
            return Err(SimConfigError::NoThreads);
        }
        Ok(())
    }

    /// The grid parameters this configuration describes.
    pub fn grid_params(&self) -> GridParams {
        GridParams::new(self.rows, self.cols, self.center_value, self.fill_value)
    }

    /// Human-readable label for the strategy variant, used in the
    /// results log.
    pub fn label(&self) -> String {
        match self.strategy {
            Strategy::Serial => match self.discipline {
                Discipline::InPlace => "serial-inplace".to_string(),
                Discipline::DoubleBuffered => "serial-buffered".to_string(),
            },
            Strategy::Tiled => format!("tiled-{}", self.threads),
            Strategy::Distributed => format!("distributed-{}", self.workers),
        }
    }
}
