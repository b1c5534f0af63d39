// grid.rs

use std::collections::BTreeMap;
use std::fmt;

/// Sentinel printed in place of a non-finite statistic, alongside the flag.
pub const NON_FINITE_SENTINEL: f64 = 0.001;

/// A single cell value.
///
/// `Flagged` carries the sentinel written for a non-finite statistic together
/// with a marker downstream consumers can detect programmatically (the original
/// convention used a red font for this).
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Flagged(f64),
}

impl Cell {
    pub fn text<S: Into<String>>(s: S) -> Self {
        Cell::Text(s.into())
    }

    /// Numeric view of the cell, if it has one. `Flagged` cells expose their
    /// sentinel value.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) | Cell::Flagged(v) => Some(*v),
            Cell::Text(_) => None,
        }
    }

    pub fn is_flagged(&self) -> bool {
        matches!(self, Cell::Flagged(_))
    }

    /// Parses one TSV field. Empty fields are handled by the caller (no cell);
    /// a `!`-prefixed numeric field is a flagged value.
    fn from_field(field: &str) -> Self {
        if let Some(rest) = field.strip_prefix('!') {
            if let Ok(v) = rest.trim().parse::<f64>() {
                return Cell::Flagged(v);
            }
        }
        match field.trim().parse::<f64>() {
            Ok(v) => Cell::Number(v),
            Err(_) => Cell::Text(field.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Number(v) => write!(f, "{}", v),
            Cell::Flagged(v) => write!(f, "!{}", v),
        }
    }
}

/// A sparse, 1-indexed, two-dimensional cell grid. This is the whole contract
/// the pipeline has with the host spreadsheet: read and write by (row, col).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseGrid {
    cells: BTreeMap<(usize, usize), Cell>,
    rows: usize,
    cols: usize,
}

impl SparseGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        debug_assert!(row >= 1 && col >= 1, "grid coordinates are 1-indexed");
        self.cells.get(&(row, col))
    }

    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        debug_assert!(row >= 1 && col >= 1, "grid coordinates are 1-indexed");
        self.rows = self.rows.max(row);
        self.cols = self.cols.max(col);
        self.cells.insert((row, col), cell);
    }

    pub fn number_at(&self, row: usize, col: usize) -> Option<f64> {
        self.get(row, col).and_then(Cell::as_number)
    }

    pub fn text_at(&self, row: usize, col: usize) -> Option<String> {
        self.get(row, col).map(|c| c.to_string())
    }

    /// Highest row index written so far (the grid's used range).
    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn col_count(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Loads a grid from tab-separated text. Empty fields leave the cell unset.
    pub fn from_tsv(input: &str) -> Self {
        let mut grid = SparseGrid::new();
        for (row_idx, line) in input.lines().enumerate() {
            for (col_idx, field) in line.split('\t').enumerate() {
                if field.is_empty() {
                    continue;
                }
                grid.set(row_idx + 1, col_idx + 1, Cell::from_field(field));
            }
        }
        grid
    }

    /// Renders the used range as tab-separated text. Trailing empty cells on a
    /// row are trimmed so sparse grids stay readable.
    pub fn to_tsv(&self) -> String {
        let mut out = String::new();
        for row in 1..=self.rows {
            let last_col = (1..=self.cols)
                .rev()
                .find(|&c| self.cells.contains_key(&(row, c)))
                .unwrap_or(0);
            for col in 1..=last_col {
                if col > 1 {
                    out.push('\t');
                }
                if let Some(cell) = self.cells.get(&(row, col)) {
                    out.push_str(&cell.to_string());
                }
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_tracks_used_range() {
        let mut grid = SparseGrid::new();
        grid.set(3, 7, Cell::Number(1.5));
        assert_eq!(grid.row_count(), 3);
        assert_eq!(grid.col_count(), 7);
        assert_eq!(grid.number_at(3, 7), Some(1.5));
        assert!(grid.get(1, 1).is_none());
    }

    #[test]
    fn tsv_round_trip_preserves_cell_types() {
        let mut grid = SparseGrid::new();
        grid.set(1, 1, Cell::text("control : bl"));
        grid.set(1, 2, Cell::Number(42.25));
        grid.set(2, 2, Cell::Flagged(0.001));
        let reloaded = SparseGrid::from_tsv(&grid.to_tsv());
        assert_eq!(reloaded, grid);
        assert!(reloaded.get(2, 2).unwrap().is_flagged());
    }

    #[test]
    fn from_tsv_skips_empty_fields() {
        let grid = SparseGrid::from_tsv("a\t\tb\n\t1.0\n");
        assert!(grid.get(1, 2).is_none());
        assert_eq!(grid.text_at(1, 3).as_deref(), Some("b"));
        assert_eq!(grid.number_at(2, 2), Some(1.0));
    }

    #[test]
    fn non_numeric_text_is_not_a_number() {
        let grid = SparseGrid::from_tsv("Error\n");
        assert!(grid.number_at(1, 1).is_none());
    }
}
