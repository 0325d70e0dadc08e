//! Global convergence decision.

use tokio::sync::{mpsc, watch};

/// One worker's report for one outer iteration, sent after its halo
/// exchange has been applied.
#[derive(Debug, Clone, Copy)]
pub struct IterationFlag {
    /// Reporting worker rank.
    pub worker: usize,
    /// Outer iteration the flag belongs to.
    pub iteration: u64,
    /// Whether any cell of the worker's interior toppled.
    pub changed: bool,
}

/// The coordinator's broadcast decision for one outer iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    /// Iteration the verdict concludes. Zero for the initial placeholder
    /// value of the watch channel.
    pub iteration: u64,
    /// True when no worker changed anything: the grid is globally
    /// stable and workers should exit.
    pub done: bool,
}

impl Verdict {
    /// Placeholder seeded into the watch channel before iteration 1.
    pub fn initial() -> Self {
        Self {
            iteration: 0,
            done: false,
        }
    }
}

/// Reduces per-worker `changed` flags into the single global
/// continuation decision.
///
/// Runs strictly after each worker's halo exchange: workers report only
/// once their received contributions are folded in, so a `done` verdict
/// means no pending exchange can re-destabilize anything.
pub struct ConvergenceCoordinator {
    workers: usize,
    flags_rx: mpsc::UnboundedReceiver<IterationFlag>,
    verdict_tx: watch::Sender<Verdict>,
}

impl ConvergenceCoordinator {
    /// Create a coordinator for `workers` workers.
    ///
    /// Returns the coordinator, the flag sender to clone into each
    /// worker, and the verdict receiver to clone into each worker.
    pub fn new(
        workers: usize,
    ) -> (
        Self,
        mpsc::UnboundedSender<IterationFlag>,
        watch::Receiver<Verdict>,
    ) {
        let (flags_tx, flags_rx) = mpsc::unbounded_channel();
        let (verdict_tx, verdict_rx) = watch::channel(Verdict::initial());
        (
            Self {
                workers,
                flags_rx,
                verdict_tx,
            },
            flags_tx,
            verdict_rx,
        )
    }

    /// Run the reduction loop until the global OR of `changed` flags is
    /// false. Returns the number of outer iterations that changed
    /// something.
    pub async fn run(mut self) -> u64 {
        let mut iteration: u64 = 0;
        loop {
            iteration += 1;
            let mut any_changed = false;
            for _ in 0..self.workers {
                match self.flags_rx.recv().await {
                    Some(flag) => {
                        debug_assert_eq!(
                            flag.iteration, iteration,
                            "worker {} reported out of lockstep",
                            flag.worker
                        );
                        any_changed |= flag.changed;
                    }
                    // All workers gone; treat as converged.
                    None => return iteration.saturating_sub(1),
                }
            }
            let done = !any_changed;
            // Send error means every worker already dropped its receiver.
            let _ = self.verdict_tx.send(Verdict { iteration, done });
            if done {
                tracing::debug!(iterations = iteration - 1, "global stabilization reached");
                return iteration - 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn coordinator_ors_flags_and_stops_on_all_stable() {
        let (coordinator, flags_tx, mut verdict_rx) = ConvergenceCoordinator::new(2);
        let handle = tokio::spawn(coordinator.run());

        // Iteration 1: one worker still active.
        for (worker, changed) in [(0, true), (1, false)] {
            flags_tx
                .send(IterationFlag {
                    worker,
                    iteration: 1,
                    changed,
                })
                .unwrap();
        }
        verdict_rx.changed().await.unwrap();
        assert_eq!(
            *verdict_rx.borrow(),
            Verdict {
                iteration: 1,
                done: false
            }
        );

        // Iteration 2: everyone stable.
        for worker in [0, 1] {
            flags_tx
                .send(IterationFlag {
                    worker,
                    iteration: 2,
                    changed: false,
                })
                .unwrap();
        }
        verdict_rx.changed().await.unwrap();
        assert_eq!(
            *verdict_rx.borrow(),
            Verdict {
                iteration: 2,
                done: true
            }
        );

        assert_eq!(handle.await.unwrap(), 1);
    }

    #[tokio::test]
    async fn coordinator_handles_vanishing_workers() {
        let (coordinator, flags_tx, _verdict_rx) = ConvergenceCoordinator::new(3);
        let handle = tokio::spawn(coordinator.run());
        drop(flags_tx);
        assert_eq!(handle.await.unwrap(), 0);
    }
}
