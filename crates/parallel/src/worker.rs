//! Per-worker relaxation task.

use crate::cluster::ClusterError;
use crate::coordinator::{IterationFlag, Verdict};
use crate::messages::{HaloPayload, RoutedHalo};
use crate::router::{RouterTx, WorkerRx};
use sandsim_engine::{relax_with, Boundary, Discipline, TiledEngine};
use sandsim_grid::{Direction, DomainDescriptor, GridBuffer};
use tokio::sync::{mpsc, watch};

/// How a worker relaxes its own interior.
pub(crate) enum LocalEngine {
    Serial(Discipline),
    Tiled(TiledEngine),
}

impl LocalEngine {
    fn relax(&self, grid: &mut GridBuffer) -> Result<u64, ClusterError> {
        match self {
            LocalEngine::Serial(discipline) => Ok(relax_with(*discipline, grid)?),
            LocalEngine::Tiled(engine) => Ok(engine.relax(grid)),
        }
    }
}

/// A worker's final state, returned when the global verdict is `done`.
#[derive(Debug)]
pub struct WorkerResult {
    /// Worker rank.
    pub rank: usize,
    /// The stabilized local grid.
    pub grid: GridBuffer,
    /// Total relaxation passes across all outer iterations.
    pub passes: u64,
    /// Mass lost through this worker's absorbing global edges.
    pub absorbed: u128,
}

/// One worker of a distributed run.
///
/// Owns its sub-grid exclusively; all cross-domain traffic goes through
/// the router, all lockstep control through the coordinator channels.
pub struct WorkerTask {
    domain: DomainDescriptor,
    grid: GridBuffer,
    engine: LocalEngine,
    boundary: Boundary,
    inbox: WorkerRx,
    router_tx: RouterTx,
    flags_tx: mpsc::UnboundedSender<IterationFlag>,
    verdict_rx: watch::Receiver<Verdict>,
}

impl WorkerTask {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        domain: DomainDescriptor,
        grid: GridBuffer,
        engine: LocalEngine,
        boundary: Boundary,
        inbox: WorkerRx,
        router_tx: RouterTx,
        flags_tx: mpsc::UnboundedSender<IterationFlag>,
        verdict_rx: watch::Receiver<Verdict>,
    ) -> Self {
        Self {
            domain,
            grid,
            engine,
            boundary,
            inbox,
            router_tx,
            flags_tx,
            verdict_rx,
        }
    }

    /// Run the worker's iteration loop to global stabilization.
    pub async fn run(mut self) -> Result<WorkerResult, ClusterError> {
        let rank = self.domain.rank;
        let mut passes = 0;
        let mut absorbed: u128 = 0;
        let mut iteration: u64 = 0;

        tracing::debug!(
            rank,
            rows = self.domain.local_rows,
            cols = self.domain.local_cols,
            "worker started"
        );

        loop {
            iteration += 1;

            let local_passes = self.engine.relax(&mut self.grid)?;
            passes += local_passes;

            absorbed += self.exchange_halos(iteration).await?;

            self.flags_tx
                .send(IterationFlag {
                    worker: rank,
                    iteration,
                    changed: local_passes > 0,
                })
                .map_err(|_| ClusterError::CoordinatorGone)?;

            if self.await_verdict(iteration).await?.done {
                break;
            }
        }

        tracing::debug!(rank, iterations = iteration - 1, passes, "worker finished");
        Ok(WorkerResult {
            rank,
            grid: self.grid,
            passes,
            absorbed,
        })
    }

    /// One halo-exchange round: stage and send all outgoing edges first,
    /// then await the fixed number of incoming contributions. Sending
    /// before any receive is awaited keeps the exchange deadlock-free
    /// regardless of neighbor ordering.
    ///
    /// Returns the mass dropped at absorbing global edges.
    async fn exchange_halos(&mut self, iteration: u64) -> Result<u128, ClusterError> {
        let rank = self.domain.rank;
        let mut absorbed: u128 = 0;

        for dir in Direction::ALL {
            match self.domain.neighbor(dir) {
                Some(peer) => {
                    let values = self.grid.take_edge_halo(dir);
                    self.router_tx
                        .send(RoutedHalo {
                            from: rank,
                            to: peer,
                            payload: HaloPayload {
                                iteration,
                                side: dir.opposite(),
                                values,
                            },
                        })
                        .map_err(|_| ClusterError::RouterGone)?;
                }
                None => {
                    let values = self.grid.take_edge_halo(dir);
                    match self.boundary {
                        Boundary::Absorbing => {
                            absorbed += values.iter().map(|&v| v as u128).sum::<u128>();
                        }
                        Boundary::Reflecting => {
                            self.grid.add_to_edge_interior(dir, &values);
                        }
                    }
                }
            }
        }

        for _ in 0..self.domain.neighbor_count() {
            let payload = self.inbox.recv().await.ok_or(ClusterError::RouterGone)?;
            debug_assert_eq!(payload.iteration, iteration);
            self.grid.add_to_edge_interior(payload.side, &payload.values);
        }

        Ok(absorbed)
    }

    /// Wait for the coordinator's verdict for this iteration.
    async fn await_verdict(&mut self, iteration: u64) -> Result<Verdict, ClusterError> {
        loop {
            let verdict = *self.verdict_rx.borrow_and_update();
            if verdict.iteration >= iteration {
                debug_assert_eq!(verdict.iteration, iteration);
                return Ok(verdict);
            }
            self.verdict_rx
                .changed()
                .await
                .map_err(|_| ClusterError::CoordinatorGone)?;
        }
    }
}
