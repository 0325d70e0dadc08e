//! Atomic view over a grid's flat storage.

use sandsim_grid::GridBuffer;
use std::sync::atomic::{AtomicU64, Ordering};

/// Reinterprets a grid's flat `u64` storage as `AtomicU64` cells so that
/// threads relaxing adjacent tiles can update shared edge cells without
/// losing increments.
///
/// The exclusive borrow of the underlying [`GridBuffer`] guarantees no
/// plain (non-atomic) access aliases the view for its lifetime.
pub struct AtomicGrid<'a> {
    cells: &'a [AtomicU64],
    stride: usize,
}

impl<'a> AtomicGrid<'a> {
    /// Build the view. All access goes through atomics until the view is
    /// dropped and the `&mut` borrow ends.
    pub fn new(grid: &'a mut GridBuffer) -> Self {
        let stride = grid.stride();
        let flat = grid.as_flat_mut();
        let len = flat.len();
        let ptr = flat.as_mut_ptr() as *const AtomicU64;
        // SAFETY: AtomicU64 has the same size and alignment as u64, and
        // the exclusive borrow of `grid` outlives the view, so no
        // non-atomic access can alias these cells.
        let cells = unsafe { std::slice::from_raw_parts(ptr, len) };
        Self { cells, stride }
    }

    #[inline]
    fn cell(&self, r: usize, c: usize) -> &AtomicU64 {
        &self.cells[r * self.stride + c]
    }

    /// Read a cell by padded coordinates.
    #[inline]
    pub fn load(&self, r: usize, c: usize) -> u64 {
        self.cell(r, c).load(Ordering::Relaxed)
    }

    /// Deposit into a cell by padded coordinates.
    #[inline]
    pub fn fetch_add(&self, r: usize, c: usize, value: u64) {
        self.cell(r, c).fetch_add(value, Ordering::Relaxed);
    }

    /// Drain from a cell by padded coordinates.
    ///
    /// Draining must subtract rather than store a remainder: a deposit
    /// racing in from a neighboring tile between the load and the write
    /// would otherwise be lost.
    #[inline]
    pub fn fetch_sub(&self, r: usize, c: usize, value: u64) {
        self.cell(r, c).fetch_sub(value, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_reads_and_writes_the_grid() {
        let mut grid = GridBuffer::new(3, 3).unwrap();
        grid.set(2, 2, 7);
        {
            let view = AtomicGrid::new(&mut grid);
            assert_eq!(view.load(2, 2), 7);
            view.fetch_add(1, 2, 5);
            view.fetch_sub(2, 2, 4);
        }
        assert_eq!(grid.get(1, 2), 5);
        assert_eq!(grid.get(2, 2), 3);
    }
}
