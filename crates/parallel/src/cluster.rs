//! Distributed run orchestrator.
//!
//! Decomposes the global grid, spawns the router, coordinator and worker
//! tasks, waits for global stabilization, and reassembles the final
//! grid from the workers' sub-grids.

use crate::config::ClusterConfig;
use crate::coordinator::ConvergenceCoordinator;
use crate::router::{HaloRouter, RouterStats};
use crate::worker::{LocalEngine, WorkerResult, WorkerTask};
use sandsim_engine::{EngineError, TiledEngine};
use sandsim_grid::{decompose, GridBuffer, GridError, PartitionError};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;

/// Errors from a distributed run.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("partition error: {0}")]
    Partition(#[from] PartitionError),

    #[error("grid error: {0}")]
    Grid(#[from] GridError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("worker {0} failed")]
    WorkerFailed(usize),

    #[error("halo router is gone")]
    RouterGone,

    #[error("convergence coordinator is gone")]
    CoordinatorGone,
}

/// Result of a distributed run.
#[derive(Debug)]
pub struct ClusterReport {
    /// Outer iterations that changed something, identical on every
    /// worker by construction.
    pub iterations: u64,
    /// The reassembled, globally stable grid.
    pub grid: GridBuffer,
    /// Mass lost through absorbing global edges, summed over workers.
    pub absorbed: u128,
    /// Router delivery counters.
    pub router_stats: RouterStats,
}

/// Orchestrates one distributed run.
pub struct ClusterSimulator {
    config: ClusterConfig,
}

impl ClusterSimulator {
    /// Create a simulator from a cluster configuration.
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    /// Run to global stabilization.
    ///
    /// Configuration errors (infeasible partitions, empty grids) surface
    /// here before any task is spawned. A worker task failure fails the
    /// whole run; there is no partial-progress retry.
    pub async fn run(self) -> Result<ClusterReport, ClusterError> {
        let workers = self.config.workers;
        let params = &self.config.params;

        let domains = decompose(params.rows, params.cols, workers)?;

        info!(
            workers,
            proc_rows = domains[0].process_grid.rows,
            proc_cols = domains[0].process_grid.cols,
            rows = params.rows,
            cols = params.cols,
            "starting distributed run"
        );

        let (router, mut inboxes) = HaloRouter::new(workers);
        let router_stats = router.stats_handle();
        let (router_tx, router_rx) = mpsc::unbounded_channel();
        let (coordinator, flags_tx, verdict_rx) = ConvergenceCoordinator::new(workers);

        // Build every worker before spawning anything so construction
        // errors leave no tasks behind.
        let mut tasks = Vec::with_capacity(workers);
        for (domain, inbox) in domains.iter().zip(inboxes.drain(..)) {
            let grid = GridBuffer::for_domain(params, domain)?;
            let engine = if self.config.threads_per_worker > 1 {
                LocalEngine::Tiled(TiledEngine::new(
                    self.config.threads_per_worker,
                    self.config.tile_size,
                )?)
            } else {
                LocalEngine::Serial(self.config.discipline)
            };
            tasks.push(WorkerTask::new(
                domain.clone(),
                grid,
                engine,
                self.config.boundary,
                inbox,
                router_tx.clone(),
                flags_tx.clone(),
                verdict_rx.clone(),
            ));
        }
        // The tasks now hold the only flag/router senders.
        drop(flags_tx);
        drop(router_tx);
        drop(verdict_rx);

        let router_handle = tokio::spawn(router.run(router_rx));
        let coordinator_handle = tokio::spawn(coordinator.run());
        let worker_handles: Vec<_> = tasks
            .into_iter()
            .map(|task| tokio::spawn(task.run()))
            .collect();

        let mut results: Vec<WorkerResult> = Vec::with_capacity(workers);
        for (rank, handle) in worker_handles.into_iter().enumerate() {
            let result = handle
                .await
                .map_err(|_| ClusterError::WorkerFailed(rank))??;
            results.push(result);
        }

        let iterations = coordinator_handle
            .await
            .map_err(|_| ClusterError::CoordinatorGone)?;
        // All worker senders are dropped with the tasks' results in hand,
        // so the router drains and exits.
        router_handle
            .await
            .map_err(|_| ClusterError::RouterGone)?;

        let mut grid = GridBuffer::new(params.rows, params.cols)?;
        let mut absorbed: u128 = 0;
        for result in &results {
            let domain = &domains[result.rank];
            grid.blit_interior(&result.grid, domain.start_row, domain.start_col);
            absorbed += result.absorbed;
        }

        info!(iterations, "distributed run stabilized");

        Ok(ClusterReport {
            iterations,
            grid,
            absorbed,
            router_stats: router_stats.snapshot(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandsim_engine::{stabilize, Boundary, Discipline};
    use sandsim_grid::GridParams;

    async fn run_cluster(params: GridParams, workers: usize) -> ClusterReport {
        ClusterSimulator::new(ClusterConfig::new(params, workers))
            .run()
            .await
            .unwrap()
    }

    fn serial_reference(params: &GridParams) -> (GridBuffer, u64) {
        let mut grid = GridBuffer::global(params).unwrap();
        let outcome = stabilize(&mut grid, Discipline::InPlace, Boundary::Absorbing).unwrap();
        (grid, outcome.iterations)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn single_worker_matches_serial() {
        let params = GridParams::new(12, 10, 600, 2);
        let (expected, _) = serial_reference(&params);
        let report = run_cluster(params, 1).await;
        assert!(report.grid.same_cells(&expected));
        assert_eq!(report.router_stats.delivered, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn four_workers_match_serial() {
        let params = GridParams::new(20, 12, 2500, 3);
        let (expected, _) = serial_reference(&params);
        let report = run_cluster(params, 4).await;
        assert!(report.grid.is_stable());
        assert!(report.grid.same_cells(&expected));
        assert!(report.router_stats.delivered > 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn uneven_decomposition_matches_serial() {
        // 6 workers over 13x11: remainders exercise the extent split.
        let params = GridParams::new(13, 11, 1800, 1);
        let (expected, _) = serial_reference(&params);
        let report = run_cluster(params, 6).await;
        assert!(report.grid.same_cells(&expected));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn absorbed_mass_accounts_for_the_difference() {
        let params = GridParams::new(10, 10, 5000, 0);
        let total = (params.center_value) as u128;
        let report = run_cluster(params, 4).await;
        assert_eq!(report.grid.interior_sum() + report.absorbed, total);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn infeasible_partition_fails_before_spawning() {
        let params = GridParams::new(2, 50, 100, 0);
        // 9 workers factor to 3x3; two rows cannot feed three worker rows.
        let err = ClusterSimulator::new(ClusterConfig::new(params, 9))
            .run()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClusterError::Partition(PartitionError::ZeroExtent { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn tiled_workers_match_serial() {
        let params = GridParams::new(24, 18, 3000, 2);
        let (expected, _) = serial_reference(&params);
        let config = ClusterConfig::new(params, 2)
            .with_threads_per_worker(2)
            .with_tile_size(8);
        let report = ClusterSimulator::new(config).run().await.unwrap();
        assert!(report.grid.same_cells(&expected));
    }
}
