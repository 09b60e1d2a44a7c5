use crate::config::StatementColumns;
use crate::error::{BreakdownError, Result};
use crate::formula::column_name;
use crate::loader::{RawCell, RawGrid};
use log::debug;
use serde::{Deserialize, Serialize};

/// One qualifying statement row. Records keep source order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementRecord {
    pub label: String,
    pub amount: Option<f64>,
}

impl StatementRecord {
    pub fn new(label: impl Into<String>, amount: Option<f64>) -> Self {
        Self {
            label: label.into(),
            amount,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.label.is_empty() && self.amount.is_none()
    }
}

/// Turns a raw statement grid into ordered (label, amount) records.
///
/// Labels come from the label column, falling back to the sub-total label
/// column when it is empty. Rows with neither label nor amount are dropped,
/// as are rows where either field stringifies to more than
/// `verbose_threshold` characters.
pub fn normalize(
    grid: &RawGrid,
    columns: &StatementColumns,
    verbose_threshold: usize,
) -> Result<Vec<StatementRecord>> {
    let required = columns.required_width();
    if grid.width() < required {
        return Err(BreakdownError::Structure(format!(
            "expected at least {} columns (label {}, subtotal label {}, amount {}), found {}",
            required,
            column_name(columns.label),
            column_name(columns.subtotal_label),
            column_name(columns.amount),
            grid.width()
        )));
    }

    let mut records = Vec::new();
    let mut dropped_verbose = 0usize;

    for row in 0..grid.height() {
        let primary = grid.get(row, columns.label);
        let label_cell = if primary.is_empty() {
            grid.get(row, columns.subtotal_label)
        } else {
            primary
        };
        let amount_cell = grid.get(row, columns.amount);

        if label_cell.is_empty() && amount_cell.is_empty() {
            continue;
        }

        let label_text = if label_cell.is_empty() {
            None
        } else {
            label_cell.display()
        };
        let amount_text = amount_cell.display();

        let too_long = |field: &Option<String>| {
            field
                .as_ref()
                .is_some_and(|s| s.chars().count() > verbose_threshold)
        };
        if too_long(&label_text) || too_long(&amount_text) {
            dropped_verbose += 1;
            continue;
        }

        records.push(StatementRecord {
            label: label_text.map(|s| canonicalize_label(&s)).unwrap_or_default(),
            amount: parse_amount(amount_cell),
        });
    }

    debug!(
        "Normalized {} records ({} verbose rows dropped)",
        records.len(),
        dropped_verbose
    );
    Ok(records)
}

/// Lowercase, drop ':' and '-', trim surrounding whitespace.
pub fn canonicalize_label(label: &str) -> String {
    label
        .to_lowercase()
        .chars()
        .filter(|c| *c != ':' && *c != '-')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Numbers pass through; text such as "$1,234.50" or "(500.00)" is parsed.
pub fn parse_amount(cell: &RawCell) -> Option<f64> {
    match cell {
        RawCell::Empty => None,
        RawCell::Number(n) => Some(*n),
        RawCell::Text(s) => parse_amount_text(s),
    }
}

fn parse_amount_text(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let (negative, body) = match trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let cleaned: String = body
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let value: f64 = cleaned.parse().ok()?;
    Some(if negative { -value } else { value })
}
