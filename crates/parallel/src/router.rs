//! Halo message routing between workers.
//!
//! Workers never hold channels to each other; every edge contribution
//! goes through the router, which owns one inbox sender per worker.
//! Channels are unbounded: a worker sends at most four payloads per
//! iteration and blocks on the convergence gate, so there is no
//! unbounded producer to apply backpressure to.

use crate::messages::{HaloPayload, RoutedHalo};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Handle for sending routed halos to the router.
pub type RouterTx = mpsc::UnboundedSender<RoutedHalo>;

/// Handle for receiving halo payloads at a worker.
pub type WorkerRx = mpsc::UnboundedReceiver<HaloPayload>;

/// Statistics from the router.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterStats {
    /// Payloads delivered to a worker inbox.
    pub delivered: u64,
    /// Total mass carried by delivered payloads.
    pub mass_routed: u64,
}

/// Routes halo payloads between workers.
pub struct HaloRouter {
    /// Inbox senders, indexed by worker rank.
    worker_senders: Vec<mpsc::UnboundedSender<HaloPayload>>,
    delivered: Arc<AtomicU64>,
    mass_routed: Arc<AtomicU64>,
}

impl HaloRouter {
    /// Create a router for `workers` workers.
    ///
    /// Returns the router and one inbox receiver per worker, in rank
    /// order.
    pub fn new(workers: usize) -> (Self, Vec<WorkerRx>) {
        let mut worker_senders = Vec::with_capacity(workers);
        let mut worker_receivers = Vec::with_capacity(workers);
        for _ in 0..workers {
            let (tx, rx) = mpsc::unbounded_channel();
            worker_senders.push(tx);
            worker_receivers.push(rx);
        }
        let router = Self {
            worker_senders,
            delivered: Arc::new(AtomicU64::new(0)),
            mass_routed: Arc::new(AtomicU64::new(0)),
        };
        (router, worker_receivers)
    }

    /// Get a handle for reading router stats after the router task has
    /// been spawned.
    pub fn stats_handle(&self) -> RouterStatsHandle {
        RouterStatsHandle {
            delivered: Arc::clone(&self.delivered),
            mass_routed: Arc::clone(&self.mass_routed),
        }
    }

    /// Run the router's main loop.
    ///
    /// Delivers each routed halo to its destination worker. Exits when
    /// the inbound channel closes (all worker senders dropped).
    pub async fn run(self, mut inbound: mpsc::UnboundedReceiver<RoutedHalo>) {
        while let Some(msg) = inbound.recv().await {
            tracing::trace!(
                from = msg.from,
                to = msg.to,
                iteration = msg.payload.iteration,
                "routing halo"
            );
            let mass = msg.payload.mass() as u64;
            if let Some(tx) = self.worker_senders.get(msg.to) {
                // A send error means the worker already exited (shutdown).
                if tx.send(msg.payload).is_ok() {
                    self.delivered.fetch_add(1, Ordering::Relaxed);
                    self.mass_routed.fetch_add(mass, Ordering::Relaxed);
                }
            }
        }
        tracing::debug!("halo router shutdown complete");
    }
}

/// Handle for reading router statistics; the router itself is consumed
/// by [`HaloRouter::run`].
#[derive(Clone)]
pub struct RouterStatsHandle {
    delivered: Arc<AtomicU64>,
    mass_routed: Arc<AtomicU64>,
}

impl RouterStatsHandle {
    /// Snapshot of the router counters.
    pub fn snapshot(&self) -> RouterStats {
        RouterStats {
            delivered: self.delivered.load(Ordering::Relaxed),
            mass_routed: self.mass_routed.load(Ordering::Relaxed),
        }
    }
}
