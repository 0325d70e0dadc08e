//! Red/black tiled relaxation on a rayon thread pool.

use crate::atomic::AtomicGrid;
use crate::error::EngineError;
use crate::relax::{Boundary, StabilizeOutcome};
use crate::tiles::{Tile, TileMap};
use rayon::prelude::*;
use sandsim_grid::{GridBuffer, THRESHOLD};

/// Multi-threaded relaxation engine.
///
/// A pass relaxes every red tile to its tile-local fixpoint in parallel,
/// waits for all of them, then does the same for the black tiles. Tiles
/// of one color never share an edge, but diagonal same-colored tiles
/// still touch common edge cells of the tile between them, so all cell
/// updates go through an [`AtomicGrid`] view.
pub struct TiledEngine {
    pool: rayon::ThreadPool,
    tile_size: usize,
}

impl TiledEngine {
    /// Build an engine with its own pool of `threads` workers.
    pub fn new(threads: usize, tile_size: usize) -> Result<Self, EngineError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("sandsim-tile-{i}"))
            .build()?;
        Ok(Self { pool, tile_size })
    }

    /// Number of pool threads.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Relax the interior to its local fixpoint. Returns the number of
    /// red+black passes that toppled at least one cell.
    pub fn relax(&self, grid: &mut GridBuffer) -> u64 {
        let map = TileMap::new(grid.rows(), grid.cols(), self.tile_size);
        let cells = AtomicGrid::new(grid);
        let mut passes = 0;
        self.pool.install(|| loop {
            // par_iter returns only once every tile of the color is done,
            // which is the red/black barrier.
            let red = sweep(&cells, map.red());
            let black = sweep(&cells, map.black());
            if !(red || black) {
                break;
            }
            passes += 1;
        });
        passes
    }

    /// Drive a single-domain grid to its stable configuration, boundary
    /// treatment included. Matches the serial [`crate::stabilize`] loop.
    pub fn stabilize(&self, grid: &mut GridBuffer, boundary: Boundary) -> StabilizeOutcome {
        let mut outcome = StabilizeOutcome {
            iterations: 0,
            passes: 0,
        };
        loop {
            let passes = self.relax(grid);
            match boundary {
                Boundary::Absorbing => grid.clear_halo(),
                Boundary::Reflecting => grid.reflect_halo(),
            }
            if passes == 0 {
                break;
            }
            outcome.iterations += 1;
            outcome.passes += passes;
        }
        tracing::debug!(
            iterations = outcome.iterations,
            passes = outcome.passes,
            threads = self.threads(),
            "tiled grid stabilized"
        );
        outcome
    }
}

/// Relax every tile of one color in parallel; OR of per-tile changes.
fn sweep(cells: &AtomicGrid<'_>, tiles: &[Tile]) -> bool {
    tiles
        .par_iter()
        .map(|tile| relax_tile(cells, tile))
        .reduce(|| false, |a, b| a | b)
}

/// True when any cell of the tile is at or above threshold.
fn needs_processing(cells: &AtomicGrid<'_>, tile: &Tile) -> bool {
    for r in tile.start_row..tile.end_row {
        for c in tile.start_col..tile.end_col {
            if cells.load(r, c) >= THRESHOLD {
                return true;
            }
        }
    }
    false
}

/// Relax one tile to its tile-local fixpoint.
fn relax_tile(cells: &AtomicGrid<'_>, tile: &Tile) -> bool {
    if !needs_processing(cells, tile) {
        return false;
    }
    let mut again = true;
    while again {
        again = false;
        for r in tile.start_row..tile.end_row {
            for c in tile.start_col..tile.end_col {
                let v = cells.load(r, c);
                if v >= THRESHOLD {
                    let q = v >> 2;
                    // Subtract, never store: deposits racing in from an
                    // adjacent tile must survive.
                    cells.fetch_sub(r, c, q << 2);
                    cells.fetch_add(r - 1, c, q);
                    cells.fetch_add(r + 1, c, q);
                    cells.fetch_add(r, c - 1, q);
                    cells.fetch_add(r, c + 1, q);
                    again = true;
                }
            }
        }
    }
    true
}
