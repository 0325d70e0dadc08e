//! Red/black tiling of a grid interior.
//!
//! Tiles are stateless descriptors recomputed from the grid shape and a
//! target tile size; nothing here touches cell data.

/// Smallest allowed tile side. Below this the per-tile bookkeeping
/// dominates the work.
pub const MIN_TILE_SIZE: usize = 8;

/// Largest allowed tile side, keeping a tile's working set cache-friendly.
pub const MAX_TILE_SIZE: usize = 32;

/// Checkerboard color of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileColor {
    /// `(tile_row + tile_col)` even.
    Red,
    /// `(tile_row + tile_col)` odd.
    Black,
}

/// A rectangular sub-range of a grid interior, in padded coordinates.
///
/// Row and column ranges are half-open: `start_row..end_row`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub start_row: usize,
    pub end_row: usize,
    pub start_col: usize,
    pub end_col: usize,
    pub color: TileColor,
}

/// Checkerboard partition of a `rows x cols` interior into square tiles.
///
/// No two tiles of the same color share an edge, so same-colored tiles
/// can be relaxed concurrently; only their diagonal corner contacts need
/// atomic cell updates.
#[derive(Debug, Clone)]
pub struct TileMap {
    tile_size: usize,
    red: Vec<Tile>,
    black: Vec<Tile>,
}

impl TileMap {
    /// Partition a `rows x cols` interior. `tile_size` is clamped to
    /// `[MIN_TILE_SIZE, MAX_TILE_SIZE]`.
    pub fn new(rows: usize, cols: usize, tile_size: usize) -> Self {
        let tile_size = tile_size.clamp(MIN_TILE_SIZE, MAX_TILE_SIZE);
        let tile_rows = rows.div_ceil(tile_size);
        let tile_cols = cols.div_ceil(tile_size);

        let mut red = Vec::new();
        let mut black = Vec::new();
        for tr in 0..tile_rows {
            for tc in 0..tile_cols {
                let start_row = tr * tile_size + 1;
                let start_col = tc * tile_size + 1;
                let tile = Tile {
                    start_row,
                    end_row: (start_row + tile_size).min(rows + 1),
                    start_col,
                    end_col: (start_col + tile_size).min(cols + 1),
                    color: if (tr + tc) % 2 == 0 {
                        TileColor::Red
                    } else {
                        TileColor::Black
                    },
                };
                match tile.color {
                    TileColor::Red => red.push(tile),
                    TileColor::Black => black.push(tile),
                }
            }
        }
        Self {
            tile_size,
            red,
            black,
        }
    }

    /// Effective (clamped) tile side.
    pub fn tile_size(&self) -> usize {
        self.tile_size
    }

    /// Tiles with `(tile_row + tile_col)` even.
    pub fn red(&self) -> &[Tile] {
        &self.red
    }

    /// Tiles with `(tile_row + tile_col)` odd.
    pub fn black(&self) -> &[Tile] {
        &self.black
    }

    /// Total tile count.
    pub fn len(&self) -> usize {
        self.red.len() + self.black.len()
    }

    /// True for a degenerate empty map; never the case for a non-empty
    /// interior.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_size_is_clamped() {
        assert_eq!(TileMap::new(100, 100, 1).tile_size(), MIN_TILE_SIZE);
        assert_eq!(TileMap::new(100, 100, 1000).tile_size(), MAX_TILE_SIZE);
        assert_eq!(TileMap::new(100, 100, 16).tile_size(), 16);
    }

    #[test]
    fn tiles_cover_the_interior_exactly_once() {
        let map = TileMap::new(60, 30, 16);
        let mut covered = vec![0u32; 62 * 32];
        for tile in map.red().iter().chain(map.black()) {
            for r in tile.start_row..tile.end_row {
                for c in tile.start_col..tile.end_col {
                    covered[r * 32 + c] += 1;
                }
            }
        }
        for r in 0..62 {
            for c in 0..32 {
                let interior = (1..=60).contains(&r) && (1..=30).contains(&c);
                assert_eq!(covered[r * 32 + c], u32::from(interior), "at ({r},{c})");
            }
        }
    }

    #[test]
    fn same_colored_tiles_never_share_an_edge() {
        let map = TileMap::new(50, 50, 8);
        for set in [map.red(), map.black()] {
            for a in set {
                for b in set {
                    if a == b {
                        continue;
                    }
                    let row_adjacent = a.end_row == b.start_row || b.end_row == a.start_row;
                    let col_overlap = a.start_col < b.end_col && b.start_col < a.end_col;
                    let col_adjacent = a.end_col == b.start_col || b.end_col == a.start_col;
                    let row_overlap = a.start_row < b.end_row && b.start_row < a.end_row;
                    assert!(
                        !(row_adjacent && col_overlap) && !(col_adjacent && row_overlap),
                        "{a:?} and {b:?} share an edge"
                    );
                }
            }
        }
    }

    #[test]
    fn small_interior_is_one_red_tile() {
        let map = TileMap::new(5, 5, 16);
        assert_eq!(map.len(), 1);
        assert_eq!(map.red().len(), 1);
        let tile = map.red()[0];
        assert_eq!((tile.start_row, tile.end_row), (1, 6));
        assert_eq!((tile.start_col, tile.end_col), (1, 6));
    }
}
