//! Flat row-major grid storage with a one-cell halo ring.

use crate::error::GridError;
use crate::partition::DomainDescriptor;
use crate::THRESHOLD;

/// One of the four orthogonal sides of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    West,
    East,
}

impl Direction {
    /// All four directions, in the order halo exchanges iterate them.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// The side a neighbor sees this edge from.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::East => Direction::West,
        }
    }
}

/// Initial-condition parameters for a global grid.
///
/// Every interior cell starts at `fill_value` except the center cell
/// `(rows / 2, cols / 2)`, which starts at `center_value`.
#[derive(Debug, Clone)]
pub struct GridParams {
    /// Global interior rows.
    pub rows: usize,
    /// Global interior columns.
    pub cols: usize,
    /// Value of the center cell.
    pub center_value: u64,
    /// Value of every other interior cell.
    pub fill_value: u64,
}

impl GridParams {
    /// Create parameters for a `rows x cols` grid.
    pub fn new(rows: usize, cols: usize, center_value: u64, fill_value: u64) -> Self {
        Self {
            rows,
            cols,
            center_value,
            fill_value,
        }
    }

    /// Global coordinates of the center cell (0-based, interior).
    pub fn center(&self) -> (usize, usize) {
        (self.rows / 2, self.cols / 2)
    }
}

/// A rectangular block of cell values plus a one-cell halo ring.
///
/// Storage is a single contiguous row-major buffer of
/// `(rows + 2) * (cols + 2)` cells. All indexing is in *padded*
/// coordinates: interior cell `(r, c)` with `0 <= r < rows` lives at
/// padded `(r + 1, c + 1)`; padded row 0 and column 0 are halo.
///
/// Halo cells hold mass only transiently, between a toppling pass that
/// spilled into them and the next boundary treatment (exchange, reflect
/// or clear). The four corner cells of the ring are unreachable by
/// orthogonal toppling and stay zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridBuffer {
    rows: usize,
    cols: usize,
    stride: usize,
    cells: Vec<u64>,
}

impl GridBuffer {
    /// Create an all-zero buffer with a `rows x cols` interior.
    pub fn new(rows: usize, cols: usize) -> Result<Self, GridError> {
        if rows == 0 || cols == 0 {
            return Err(GridError::EmptyGrid { rows, cols });
        }
        let stride = cols + 2;
        Ok(Self {
            rows,
            cols,
            stride,
            cells: vec![0; (rows + 2) * stride],
        })
    }

    /// Create the full global grid described by `params`.
    pub fn global(params: &GridParams) -> Result<Self, GridError> {
        let mut grid = Self::new(params.rows, params.cols)?;
        grid.fill_interior(params.fill_value);
        let (cr, cc) = params.center();
        grid.set(cr + 1, cc + 1, params.center_value);
        Ok(grid)
    }

    /// Create one worker's local grid for a domain of the global grid.
    ///
    /// The interior is filled with `fill_value`; the global center cell
    /// is placed only if it falls inside this domain.
    pub fn for_domain(params: &GridParams, domain: &DomainDescriptor) -> Result<Self, GridError> {
        let mut grid = Self::new(domain.local_rows, domain.local_cols)?;
        grid.fill_interior(params.fill_value);
        let (cr, cc) = params.center();
        if domain.contains_global(cr, cc) {
            let (lr, lc) = domain.to_local_padded(cr, cc);
            grid.set(lr, lc, params.center_value);
        }
        Ok(grid)
    }

    /// Interior row count.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Interior column count.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Width of one padded storage row.
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    fn idx(&self, r: usize, c: usize) -> usize {
        debug_assert!(r <= self.rows + 1 && c <= self.cols + 1);
        r * self.stride + c
    }

    /// Read a cell by padded coordinates.
    #[inline]
    pub fn get(&self, r: usize, c: usize) -> u64 {
        self.cells[self.idx(r, c)]
    }

    /// Write a cell by padded coordinates.
    #[inline]
    pub fn set(&mut self, r: usize, c: usize, value: u64) {
        let i = self.idx(r, c);
        self.cells[i] = value;
    }

    /// Add to a cell by padded coordinates.
    #[inline]
    pub fn add(&mut self, r: usize, c: usize, value: u64) {
        let i = self.idx(r, c);
        self.cells[i] += value;
    }

    /// The flat padded storage. Exposed for the atomic tile view.
    pub fn as_flat(&self) -> &[u64] {
        &self.cells
    }

    /// Mutable flat padded storage. Exposed for the atomic tile view.
    pub fn as_flat_mut(&mut self) -> &mut [u64] {
        &mut self.cells
    }

    fn fill_interior(&mut self, value: u64) {
        for r in 1..=self.rows {
            let start = self.idx(r, 1);
            self.cells[start..start + self.cols].fill(value);
        }
    }

    /// Sum of all interior cells. Uses a u128 accumulator so transient
    /// spikes cannot overflow the total.
    pub fn interior_sum(&self) -> u128 {
        let mut sum: u128 = 0;
        for r in 1..=self.rows {
            let start = self.idx(r, 1);
            sum += self.cells[start..start + self.cols]
                .iter()
                .map(|&v| v as u128)
                .sum::<u128>();
        }
        sum
    }

    /// Sum of all halo cells.
    pub fn halo_sum(&self) -> u128 {
        let mut sum: u128 = 0;
        for dir in Direction::ALL {
            sum += self.edge_halo(dir).iter().map(|&v| v as u128).sum::<u128>();
        }
        sum
    }

    /// Largest interior cell value.
    pub fn max_interior(&self) -> u64 {
        let mut max = 0;
        for r in 1..=self.rows {
            let start = self.idx(r, 1);
            for &v in &self.cells[start..start + self.cols] {
                max = max.max(v);
            }
        }
        max
    }

    /// True when no interior cell is at or above the toppling threshold.
    pub fn is_stable(&self) -> bool {
        self.max_interior() < THRESHOLD
    }

    /// Zero the entire halo ring.
    pub fn clear_halo(&mut self) {
        let last_row = self.rows + 1;
        let last_col = self.cols + 1;
        for c in 0..=last_col {
            self.set(0, c, 0);
            self.set(last_row, c, 0);
        }
        for r in 1..=self.rows {
            self.set(r, 0, 0);
            self.set(r, last_col, 0);
        }
    }

    /// Padded coordinates of the i-th halo cell along one side, corners
    /// excluded.
    #[inline]
    fn halo_coord(&self, dir: Direction, i: usize) -> (usize, usize) {
        match dir {
            Direction::North => (0, i + 1),
            Direction::South => (self.rows + 1, i + 1),
            Direction::West => (i + 1, 0),
            Direction::East => (i + 1, self.cols + 1),
        }
    }

    /// Padded coordinates of the interior cell adjacent to the i-th halo
    /// cell of one side.
    #[inline]
    fn edge_interior_coord(&self, dir: Direction, i: usize) -> (usize, usize) {
        match dir {
            Direction::North => (1, i + 1),
            Direction::South => (self.rows, i + 1),
            Direction::West => (i + 1, 1),
            Direction::East => (i + 1, self.cols),
        }
    }

    /// Number of halo cells along one side (corners excluded).
    pub fn edge_len(&self, dir: Direction) -> usize {
        match dir {
            Direction::North | Direction::South => self.cols,
            Direction::West | Direction::East => self.rows,
        }
    }

    /// Copy the halo cells along one side.
    pub fn edge_halo(&self, dir: Direction) -> Vec<u64> {
        (0..self.edge_len(dir))
            .map(|i| {
                let (r, c) = self.halo_coord(dir, i);
                self.get(r, c)
            })
            .collect()
    }

    /// Copy and zero the halo cells along one side.
    pub fn take_edge_halo(&mut self, dir: Direction) -> Vec<u64> {
        let mut values = Vec::with_capacity(self.edge_len(dir));
        for i in 0..self.edge_len(dir) {
            let (r, c) = self.halo_coord(dir, i);
            values.push(self.get(r, c));
            self.set(r, c, 0);
        }
        values
    }

    /// Add a received edge contribution into the interior row or column
    /// one step inside from that side.
    ///
    /// `values.len()` must equal [`Self::edge_len`] for the side; this
    /// is guaranteed by construction for matched domains.
    pub fn add_to_edge_interior(&mut self, dir: Direction, values: &[u64]) {
        debug_assert_eq!(values.len(), self.edge_len(dir));
        for (i, &v) in values.iter().enumerate() {
            let (r, c) = self.edge_interior_coord(dir, i);
            self.add(r, c, v);
        }
    }

    /// Fold every halo edge back into its adjacent interior line, then
    /// clear the ring. This is the reflecting boundary treatment.
    pub fn reflect_halo(&mut self) {
        for dir in Direction::ALL {
            let values = self.take_edge_halo(dir);
            self.add_to_edge_interior(dir, &values);
        }
    }

    /// Copy another buffer's interior into this one at an offset given
    /// in global interior coordinates. Used to reassemble a global grid
    /// from worker sub-grids.
    pub fn blit_interior(&mut self, src: &GridBuffer, start_row: usize, start_col: usize) {
        debug_assert!(start_row + src.rows <= self.rows);
        debug_assert!(start_col + src.cols <= self.cols);
        for r in 0..src.rows {
            for c in 0..src.cols {
                self.set(start_row + r + 1, start_col + c + 1, src.get(r + 1, c + 1));
            }
        }
    }

    /// Cell-by-cell interior equality. A dimension mismatch is an
    /// inequality, not an error.
    pub fn same_cells(&self, other: &GridBuffer) -> bool {
        if self.rows != other.rows || self.cols != other.cols {
            return false;
        }
        for r in 1..=self.rows {
            for c in 1..=self.cols {
                if self.get(r, c) != other.get(r, c) {
                    return false;
                }
            }
        }
        true
    }
}
