use crate::error::{BreakdownError, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A single source cell. Dates are kept as their spreadsheet serial number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
}

impl RawCell {
    pub fn text(value: impl Into<String>) -> Self {
        RawCell::Text(value.into())
    }

    /// Blank text counts as empty, matching how spreadsheet readers treat it.
    pub fn is_empty(&self) -> bool {
        match self {
            RawCell::Empty => true,
            RawCell::Text(s) => s.trim().is_empty(),
            RawCell::Number(_) => false,
        }
    }

    /// String form used for length checks and number-valued labels.
    pub fn display(&self) -> Option<String> {
        match self {
            RawCell::Empty => None,
            RawCell::Text(s) => Some(s.clone()),
            RawCell::Number(n) => Some(n.to_string()),
        }
    }
}

impl From<&str> for RawCell {
    fn from(value: &str) -> Self {
        RawCell::Text(value.to_string())
    }
}

impl From<f64> for RawCell {
    fn from(value: f64) -> Self {
        RawCell::Number(value)
    }
}

/// Positional grid of cells, no header inference. Row 0 / column 0 is cell A1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawGrid {
    rows: Vec<Vec<RawCell>>,
}

impl RawGrid {
    pub fn from_rows(rows: Vec<Vec<RawCell>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<RawCell>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Widest row in the grid.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn get(&self, row: usize, col: usize) -> &RawCell {
        static EMPTY: RawCell = RawCell::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }
}

/// Reads the first worksheet of any workbook format calamine understands.
pub fn load_grid(path: impl AsRef<Path>) -> Result<RawGrid> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path)?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| BreakdownError::EmptyWorkbook(path.display().to_string()))??;

    let grid = grid_from_range(&range);
    debug!(
        "Loaded {} rows x {} columns from {}",
        grid.height(),
        grid.width(),
        path.display()
    );
    Ok(grid)
}

/// Calamine ranges start at the first used cell; pad so indices stay absolute.
pub fn grid_from_range(range: &Range<Data>) -> RawGrid {
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut rows: Vec<Vec<RawCell>> = vec![Vec::new(); row_offset];
    for source_row in range.rows() {
        let mut row = vec![RawCell::Empty; col_offset];
        row.extend(source_row.iter().map(convert_cell));
        rows.push(row);
    }

    RawGrid::from_rows(rows)
}

fn convert_cell(data: &Data) -> RawCell {
    match data {
        Data::Empty | Data::Error(_) => RawCell::Empty,
        Data::String(s) => RawCell::Text(s.clone()),
        Data::Float(f) => RawCell::Number(*f),
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Bool(b) => RawCell::Text(b.to_string()),
        Data::DateTime(dt) => RawCell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::Text(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_get_out_of_bounds_is_empty() {
        let grid = RawGrid::from_rows(vec![vec![RawCell::from("a"), RawCell::from(1.0)]]);
        assert_eq!(grid.get(0, 0), &RawCell::text("a"));
        assert_eq!(grid.get(0, 1), &RawCell::Number(1.0));
        assert_eq!(grid.get(0, 9), &RawCell::Empty);
        assert_eq!(grid.get(5, 0), &RawCell::Empty);
    }

    #[test]
    fn test_width_uses_widest_row() {
        let grid = RawGrid::from_rows(vec![
            vec![RawCell::Empty],
            vec![RawCell::Empty, RawCell::Empty, RawCell::from("x")],
        ]);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 2);
    }

    #[test]
    fn test_blank_text_is_empty() {
        assert!(RawCell::text("   ").is_empty());
        assert!(!RawCell::Number(0.0).is_empty());
        assert_eq!(RawCell::Number(1500.0).display().as_deref(), Some("1500"));
    }

    #[test]
    fn test_grid_from_offset_range_keeps_absolute_columns() {
        let mut range: Range<Data> = Range::new((2, 1), (3, 9));
        range.set_value((2, 1), Data::String("Name: Jane Doe".to_string()));
        range.set_value((3, 9), Data::Float(90000.0));
        range.set_value((3, 2), Data::Int(7));

        let grid = grid_from_range(&range);
        assert_eq!(grid.get(2, 1), &RawCell::text("Name: Jane Doe"));
        assert_eq!(grid.get(3, 9), &RawCell::Number(90000.0));
        assert_eq!(grid.get(3, 2), &RawCell::Number(7.0));
        assert_eq!(grid.get(0, 0), &RawCell::Empty);
        assert_eq!(grid.width(), 10);
    }
}
