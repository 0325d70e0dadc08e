//! Distributed multi-worker relaxation with halo exchange.
//!
//! Each worker owns one disjoint sub-rectangle of the global grid and
//! runs as an independent tokio task. Workers share no memory; boundary
//! mass crosses domains only as explicit messages routed between
//! iterations.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                       ClusterSimulator                         │
//! │                  (orchestrator - main task)                    │
//! ├────────────────────────────────────────────────────────────────┤
//! │                                                                │
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐           │
//! │   │  Worker 0  │    │  Worker 1  │    │  Worker 2  │  ...      │
//! │   │  (task)    │    │  (task)    │    │  (task)    │           │
//! │   │ GridBuffer │    │ GridBuffer │    │ GridBuffer │           │
//! │   │ + engine   │    │ + engine   │    │ + engine   │           │
//! │   └─────┬──────┘    └─────┬──────┘    └─────┬──────┘           │
//! │         │ halos           │                 │                  │
//! │         └─────────────────┼─────────────────┘                  │
//! │                  ┌────────▼────────┐                           │
//! │                  │   HaloRouter    │                           │
//! │                  └─────────────────┘                           │
//! │         ┌─────────────────┼─────────────────┐                  │
//! │         │ changed flags   │  Continue/Stop  │                  │
//! │                ┌──────────▼──────────┐                         │
//! │                │ ConvergenceCoord.   │                         │
//! │                └─────────────────────┘                         │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Per outer iteration every worker relaxes its interior to a local
//! fixpoint, exchanges staged halo mass with its four neighbors, then
//! reports a `changed` flag. The coordinator ORs the flags and
//! broadcasts the verdict; no worker enters iteration `k + 1` before
//! every worker has finished iteration `k`'s exchange, so all workers
//! run the same number of iterations.

mod cluster;
mod config;
mod coordinator;
mod messages;
mod router;
mod worker;

pub use cluster::{ClusterError, ClusterReport, ClusterSimulator};
pub use config::ClusterConfig;
pub use coordinator::{ConvergenceCoordinator, IterationFlag, Verdict};
pub use messages::{HaloPayload, RoutedHalo};
pub use router::{HaloRouter, RouterStats, RouterStatsHandle, RouterTx, WorkerRx};
pub use worker::{WorkerResult, WorkerTask};
