//! Sandpile simulator front end.
//!
//! Ties the execution strategies together behind one configuration:
//!
//! - [`SimConfig`]: grid parameters plus strategy selection
//! - [`Simulator`]: dispatches a run and times it
//! - [`output`]: PPM rendering and the results log
//!
//! The same initial parameters produce the identical stable grid under
//! every [`Strategy`]; the `--verify` CLI flag and the integration tests
//! lean on that.

mod config;
pub mod output;
mod runner;

pub use config::{SimConfig, SimConfigError, Strategy};
pub use runner::{RunReport, SimError, Simulator};
