//! Engine error types.

use sandsim_grid::GridError;
use thiserror::Error;

/// Errors from the relaxation engines.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("grid shapes differ: {a_rows}x{a_cols} vs {b_rows}x{b_cols}")]
    ShapeMismatch {
        a_rows: usize,
        a_cols: usize,
        b_rows: usize,
        b_cols: usize,
    },

    #[error("grid error: {0}")]
    Grid(#[from] GridError),

    #[error("failed to build tile thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
