//! Messages exchanged between workers and the router.

use sandsim_grid::Direction;

/// One edge's worth of boundary mass, sent to the neighbor that owns
/// the cells it spilled onto.
#[derive(Debug, Clone)]
pub struct HaloPayload {
    /// Outer iteration this contribution belongs to. The convergence
    /// gate makes cross-iteration mixing impossible; receivers assert
    /// the tag to enforce that.
    pub iteration: u64,
    /// The side of the *receiving* worker this contribution lands on.
    pub side: Direction,
    /// Per-cell contributions along the edge, corners excluded.
    pub values: Vec<u64>,
}

impl HaloPayload {
    /// Total mass carried by this payload.
    pub fn mass(&self) -> u128 {
        self.values.iter().map(|&v| v as u128).sum()
    }
}

/// A halo payload with routing information, handed to the router.
#[derive(Debug)]
pub struct RoutedHalo {
    /// Sending worker rank.
    pub from: usize,
    /// Receiving worker rank.
    pub to: usize,
    /// The edge contribution.
    pub payload: HaloPayload,
}
