//! Domain decomposition of a global grid across workers.
//!
//! Given a global grid shape and a worker count, [`decompose`] computes a
//! near-square 2-D process grid, each worker's sub-rectangle, and its four
//! orthogonal neighbor ranks. The descriptors tile the global grid exactly:
//! no gaps, no overlaps.

use crate::buffer::Direction;
use crate::error::PartitionError;

/// Shape of the 2-D process grid.
///
/// Ranks are assigned row-major: `rank = proc_row * cols + proc_col`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessGrid {
    pub rows: usize,
    pub cols: usize,
}

impl ProcessGrid {
    /// Pick the factorization `rows * cols == workers` with minimal
    /// `|rows - cols|`, favoring `rows <= cols`.
    pub fn for_workers(workers: usize) -> Result<Self, PartitionError> {
        if workers == 0 {
            return Err(PartitionError::NoWorkers);
        }
        // The largest divisor not exceeding sqrt(workers) gives the most
        // balanced pair.
        let mut rows = 1;
        let mut d = 1;
        while d * d <= workers {
            if workers % d == 0 {
                rows = d;
            }
            d += 1;
        }
        Ok(Self {
            rows,
            cols: workers / rows,
        })
    }

    /// Total worker count.
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// True when the grid holds no workers. Never true for a grid built
    /// by [`ProcessGrid::for_workers`].
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Process-grid coordinates of a rank.
    pub fn coords(&self, rank: usize) -> (usize, usize) {
        (rank / self.cols, rank % self.cols)
    }

    /// Rank at process-grid coordinates.
    pub fn rank(&self, proc_row: usize, proc_col: usize) -> usize {
        proc_row * self.cols + proc_col
    }
}

/// One worker's share of the global grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainDescriptor {
    /// Worker rank, row-major over the process grid.
    pub rank: usize,
    /// Process-grid row of this worker.
    pub proc_row: usize,
    /// Process-grid column of this worker.
    pub proc_col: usize,
    /// Shape of the whole process grid.
    pub process_grid: ProcessGrid,
    /// Interior rows owned by this worker.
    pub local_rows: usize,
    /// Interior columns owned by this worker.
    pub local_cols: usize,
    /// Global row of this worker's first interior row.
    pub start_row: usize,
    /// Global column of this worker's first interior column.
    pub start_col: usize,
    /// Neighbor rank to the north, if any.
    pub north: Option<usize>,
    /// Neighbor rank to the south, if any.
    pub south: Option<usize>,
    /// Neighbor rank to the west, if any.
    pub west: Option<usize>,
    /// Neighbor rank to the east, if any.
    pub east: Option<usize>,
}

impl DomainDescriptor {
    /// Neighbor rank on one side, `None` at a true global edge.
    pub fn neighbor(&self, dir: Direction) -> Option<usize> {
        match dir {
            Direction::North => self.north,
            Direction::South => self.south,
            Direction::West => self.west,
            Direction::East => self.east,
        }
    }

    /// Number of sides with a real neighbor.
    pub fn neighbor_count(&self) -> usize {
        Direction::ALL
            .iter()
            .filter(|&&d| self.neighbor(d).is_some())
            .count()
    }

    /// Whether a global interior coordinate falls inside this domain.
    pub fn contains_global(&self, row: usize, col: usize) -> bool {
        row >= self.start_row
            && row < self.start_row + self.local_rows
            && col >= self.start_col
            && col < self.start_col + self.local_cols
    }

    /// Convert a global interior coordinate inside this domain to local
    /// padded coordinates.
    pub fn to_local_padded(&self, row: usize, col: usize) -> (usize, usize) {
        debug_assert!(self.contains_global(row, col));
        (row - self.start_row + 1, col - self.start_col + 1)
    }
}

/// Extent and offset of index `i` when `global` units are split across
/// `parts`: the first `global % parts` indices get one extra unit.
fn split_axis(global: usize, parts: usize, i: usize) -> (usize, usize) {
    let base = global / parts;
    let extra = global % parts;
    if i < extra {
        (base + 1, i * (base + 1))
    } else {
        (base, extra * (base + 1) + (i - extra) * base)
    }
}

/// Split a `global_rows x global_cols` grid across `workers` workers.
///
/// Returns one descriptor per rank, in rank order. Fails when any worker
/// would own a zero-sized extent, i.e. the process grid outnumbers one of
/// the grid's dimensions.
pub fn decompose(
    global_rows: usize,
    global_cols: usize,
    workers: usize,
) -> Result<Vec<DomainDescriptor>, PartitionError> {
    let process_grid = ProcessGrid::for_workers(workers)?;

    let mut descriptors = Vec::with_capacity(workers);
    for rank in 0..workers {
        let (proc_row, proc_col) = process_grid.coords(rank);
        let (local_rows, start_row) = split_axis(global_rows, process_grid.rows, proc_row);
        let (local_cols, start_col) = split_axis(global_cols, process_grid.cols, proc_col);

        if local_rows == 0 || local_cols == 0 {
            return Err(PartitionError::ZeroExtent {
                rank,
                workers,
                global_rows,
                global_cols,
            });
        }

        let north = (proc_row > 0).then(|| process_grid.rank(proc_row - 1, proc_col));
        let south =
            (proc_row + 1 < process_grid.rows).then(|| process_grid.rank(proc_row + 1, proc_col));
        let west = (proc_col > 0).then(|| process_grid.rank(proc_row, proc_col - 1));
        let east =
            (proc_col + 1 < process_grid.cols).then(|| process_grid.rank(proc_row, proc_col + 1));

        descriptors.push(DomainDescriptor {
            rank,
            proc_row,
            proc_col,
            process_grid,
            local_rows,
            local_cols,
            start_row,
            start_col,
            north,
            south,
            west,
            east,
        });
    }
    Ok(descriptors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_grid_is_near_square() {
        assert_eq!(ProcessGrid::for_workers(1).unwrap(), ProcessGrid { rows: 1, cols: 1 });
        assert_eq!(ProcessGrid::for_workers(4).unwrap(), ProcessGrid { rows: 2, cols: 2 });
        assert_eq!(ProcessGrid::for_workers(6).unwrap(), ProcessGrid { rows: 2, cols: 3 });
        assert_eq!(ProcessGrid::for_workers(9).unwrap(), ProcessGrid { rows: 3, cols: 3 });
        assert_eq!(ProcessGrid::for_workers(12).unwrap(), ProcessGrid { rows: 3, cols: 4 });
        // Primes degenerate to a single row.
        assert_eq!(ProcessGrid::for_workers(7).unwrap(), ProcessGrid { rows: 1, cols: 7 });
        assert_eq!(ProcessGrid::for_workers(0), Err(PartitionError::NoWorkers));
    }

    #[test]
    fn remainder_goes_to_lowest_indices() {
        // 10 rows over 3 worker rows: 4, 3, 3.
        assert_eq!(split_axis(10, 3, 0), (4, 0));
        assert_eq!(split_axis(10, 3, 1), (3, 4));
        assert_eq!(split_axis(10, 3, 2), (3, 7));
    }

    /// Every global cell must be owned by exactly one descriptor.
    fn assert_exact_tiling(rows: usize, cols: usize, workers: usize) {
        let descriptors = decompose(rows, cols, workers).unwrap();
        let mut owners = vec![0u32; rows * cols];
        for d in &descriptors {
            for r in d.start_row..d.start_row + d.local_rows {
                for c in d.start_col..d.start_col + d.local_cols {
                    owners[r * cols + c] += 1;
                }
            }
        }
        assert!(
            owners.iter().all(|&n| n == 1),
            "{}x{} over {} workers does not tile exactly",
            rows,
            cols,
            workers
        );
    }

    #[test]
    fn decomposition_tiles_exactly() {
        for workers in [1, 2, 3, 4, 6, 7, 9, 12] {
            assert_exact_tiling(60, 30, workers);
            assert_exact_tiling(13, 17, workers);
        }
        assert_exact_tiling(9, 9, 9);
    }

    #[test]
    fn zero_extent_is_a_configuration_error() {
        // 3x3 process grid cannot tile two rows.
        assert!(matches!(
            decompose(2, 10, 9),
            Err(PartitionError::ZeroExtent { .. })
        ));
        // But nine workers fit a 3x3 grid exactly.
        assert!(decompose(3, 3, 9).is_ok());
    }

    #[test]
    fn neighbors_are_symmetric() {
        let descriptors = decompose(12, 12, 6).unwrap();
        for d in &descriptors {
            for dir in Direction::ALL {
                if let Some(peer) = d.neighbor(dir) {
                    assert_eq!(descriptors[peer].neighbor(dir.opposite()), Some(d.rank));
                }
            }
        }
        // Corner worker of a 2x3 process grid has exactly two neighbors.
        assert_eq!(descriptors[0].neighbor_count(), 2);
        assert_eq!(descriptors[0].north, None);
        assert_eq!(descriptors[0].west, None);
        assert_eq!(descriptors[0].east, Some(1));
        assert_eq!(descriptors[0].south, Some(3));
    }

    #[test]
    fn center_lookup_maps_to_padded_local() {
        let descriptors = decompose(60, 30, 4).unwrap();
        let owners: Vec<_> = descriptors
            .iter()
            .filter(|d| d.contains_global(30, 15))
            .collect();
        assert_eq!(owners.len(), 1);
        let d = owners[0];
        let (lr, lc) = d.to_local_padded(30, 15);
        assert_eq!(lr, 30 - d.start_row + 1);
        assert_eq!(lc, 15 - d.start_col + 1);
    }
}
