//! Grid storage and domain decomposition for the sandpile simulator.
//!
//! This crate provides the foundational types shared by every execution
//! strategy:
//!
//! - [`GridBuffer`]: a rectangular block of cell values with a one-cell
//!   halo ring, stored as one flat row-major buffer
//! - [`DomainDescriptor`]: one worker's sub-rectangle of the global grid
//!   plus its neighbor ranks
//! - [`decompose`]: splits a global grid across a near-square process grid
//!
//! No I/O and no concurrency live here; the relaxation engines and the
//! distributed layer build on these types.

mod buffer;
mod error;
mod partition;

pub use buffer::{Direction, GridBuffer, GridParams};
pub use error::{GridError, PartitionError};
pub use partition::{decompose, DomainDescriptor, ProcessGrid};

/// A cell topples when it holds at least this many grains.
pub const THRESHOLD: u64 = 4;
