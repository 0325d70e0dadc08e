//! Cluster run configuration.

use sandsim_engine::{Boundary, Discipline};
use sandsim_grid::GridParams;

/// Configuration for a distributed run.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Global grid parameters.
    pub params: GridParams,

    /// Number of workers the grid is decomposed across.
    pub workers: usize,

    /// Update discipline each worker uses for its local relaxation.
    pub discipline: Discipline,

    /// Treatment of mass reaching a true global edge. Inter-worker
    /// edges always exchange.
    pub boundary: Boundary,

    /// Threads per worker. Above 1 each worker relaxes with its own
    /// red/black tile pool instead of the serial discipline.
    pub threads_per_worker: usize,

    /// Tile side for multi-threaded workers.
    pub tile_size: usize,
}

impl ClusterConfig {
    /// Create a configuration for `workers` workers over a global grid.
    pub fn new(params: GridParams, workers: usize) -> Self {
        Self {
            params,
            workers,
            discipline: Discipline::default(),
            boundary: Boundary::default(),
            threads_per_worker: 1,
            tile_size: 16,
        }
    }

    /// Set the local update discipline.
    pub fn with_discipline(mut self, discipline: Discipline) -> Self {
        self.discipline = discipline;
        self
    }

    /// Set the global boundary treatment.
    pub fn with_boundary(mut self, boundary: Boundary) -> Self {
        self.boundary = boundary;
        self
    }

    /// Set the per-worker thread count.
    pub fn with_threads_per_worker(mut self, threads: usize) -> Self {
        self.threads_per_worker = threads;
        self
    }

    /// Set the tile side used by multi-threaded workers.
    pub fn with_tile_size(mut self, tile_size: usize) -> Self {
        self.tile_size = tile_size;
        self
    }
}
