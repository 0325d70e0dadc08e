//! Relaxation engines for the sandpile simulator.
//!
//! A cell holding at least [`sandsim_grid::THRESHOLD`] grains topples:
//! it keeps `value mod 4` and sends `value div 4` to each of its four
//! orthogonal neighbors. This crate drives that rule to a fixpoint in
//! three ways that all reach the same stable grid:
//!
//! - [`relax`] / [`relax_with`]: serial, in-place or double-buffered
//! - [`TiledEngine`]: red/black tiles relaxed concurrently on a rayon
//!   thread pool, with atomic cell updates across tile edges
//!
//! What happens to mass that reaches the halo ring is a [`Boundary`]
//! choice shared by every engine: absorbing drops it, reflecting folds
//! it back.

mod atomic;
mod error;
mod relax;
mod tiled;
mod tiles;

pub use atomic::AtomicGrid;
pub use error::EngineError;
pub use relax::{
    relax, relax_with, stabilize, topple_pass, topple_pass_synchronous, Boundary, Discipline,
    StabilizeOutcome,
};
pub use tiled::TiledEngine;
pub use tiles::{Tile, TileColor, TileMap, MAX_TILE_SIZE, MIN_TILE_SIZE};
