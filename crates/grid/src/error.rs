//! Error types for grid construction and partitioning.

use thiserror::Error;

/// Errors from grid buffer construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("grid interior must be non-empty (got {rows}x{cols})")]
    EmptyGrid { rows: usize, cols: usize },
}

/// Errors from domain decomposition.
///
/// These are configuration errors: they are reported before any
/// relaxation begins.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PartitionError {
    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error(
        "worker {rank} would own a zero-sized extent \
         ({workers} workers cannot tile a {global_rows}x{global_cols} grid)"
    )]
    ZeroExtent {
        rank: usize,
        workers: usize,
        global_rows: usize,
        global_cols: usize,
    },
}
