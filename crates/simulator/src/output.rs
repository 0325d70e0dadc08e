//! Output artifacts: PPM rendering and the results log.
//!
//! Failures here are reported to the caller; the CLI logs them as
//! warnings and keeps the computed result.

use crate::runner::RunReport;
use sandsim_grid::GridBuffer;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Errors from writing output artifacts.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("cell ({row}, {col}) holds {value}, which has no color: grid is not stable")]
    UnstableCell {
        row: usize,
        col: usize,
        value: u64,
    },
}

/// RGB triplets for the four stable cell values.
const COLORS: [&str; 4] = [
    "0 0 0",     // 0: black
    "0 255 0",   // 1: green
    "0 0 255",   // 2: blue
    "255 0 0",   // 3: red
];

/// Render a stable grid as a plain-text (P3) PPM image, one pixel per
/// interior cell.
pub fn write_ppm(grid: &GridBuffer, path: &Path) -> Result<(), OutputError> {
    let mut file = BufWriter::new(File::create(path)?);
    writeln!(file, "P3")?;
    writeln!(file, "{} {}", grid.cols(), grid.rows())?;
    writeln!(file, "255")?;

    for r in 1..=grid.rows() {
        for c in 1..=grid.cols() {
            let value = grid.get(r, c);
            let color = COLORS
                .get(value as usize)
                .ok_or(OutputError::UnstableCell {
                    row: r - 1,
                    col: c - 1,
                    value,
                })?;
            write!(file, "{color} ")?;
        }
        writeln!(file)?;
    }
    file.flush()?;
    Ok(())
}

/// Append a human-readable result record to the results log.
pub fn append_results(path: &Path, report: &RunReport) -> Result<(), OutputError> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "Variant: {}", report.label)?;
    writeln!(file, "Rows: {}", report.rows)?;
    writeln!(file, "Cols: {}", report.cols)?;
    writeln!(file, "Centre: {}", report.center_value)?;
    writeln!(file, "Fill: {}", report.fill_value)?;
    writeln!(file, "Iterations: {}", report.iterations)?;
    writeln!(file, "Elapsed: {:.6} seconds", report.elapsed.as_secs_f64())?;
    writeln!(file, "Stable: {}", report.is_stable())?;
    writeln!(file, "----------------------------------------")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unstable_grids_have_no_image() {
        let mut grid = GridBuffer::new(2, 2).unwrap();
        grid.set(1, 1, 7);
        let dir = tempfile::tempdir().unwrap();
        let err = write_ppm(&grid, &dir.path().join("bad.ppm")).unwrap_err();
        assert!(matches!(
            err,
            OutputError::UnstableCell {
                row: 0,
                col: 0,
                value: 7
            }
        ));
    }

    #[test]
    fn ppm_has_header_and_one_pixel_per_cell() {
        let mut grid = GridBuffer::new(2, 3).unwrap();
        for (i, (r, c)) in [(1, 1), (1, 2), (1, 3), (2, 1), (2, 2), (2, 3)]
            .iter()
            .enumerate()
        {
            grid.set(*r, *c, (i % 4) as u64);
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.ppm");
        write_ppm(&grid, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("P3"));
        assert_eq!(lines.next(), Some("3 2"));
        assert_eq!(lines.next(), Some("255"));
        let pixels: Vec<&str> = text.split_whitespace().skip(4).collect();
        assert_eq!(pixels.len(), 6 * 3);
    }
}
