//! # Closeout Breakdown
//!
//! Reads a legal-settlement closeout statement spreadsheet, extracts its
//! financial facts, and generates a breakdown workbook whose cells are
//! formulas wired to those facts.
//!
//! ## Core Concepts
//!
//! - **Statement records**: the statement grid reduced to ordered (label, amount) rows
//! - **Sections**: settlement, expenses and medical/lien blocks, each closed by a subtotal row
//! - **Fuzzy lookup**: labels are located by approximate substring match with an edit budget
//! - **Layout**: every coordinate of the breakdown, derived from the medical item count
//! - **Formulas**: generated as text from symbolic cells, evaluated by the spreadsheet application
//!
//! ## Example
//!
//! ```rust,ignore
//! use closeout_breakdown::*;
//!
//! let pipeline = BreakdownPipeline::new(BreakdownConfig::default(), "out");
//! let processed = pipeline.process(&StatementJob::new("closeout.xlsx", false))?;
//! println!("{} -> {}", processed.facts().client_name, processed.output.display());
//! ```

pub mod config;
pub mod error;
pub mod facts;
pub mod formula;
pub mod fuzzy;
pub mod generator;
pub mod layout;
pub mod loader;
pub mod normalizer;
pub mod pipeline;
pub mod protect;
pub mod sections;
pub mod writer;

pub use config::{BreakdownConfig, FieldPhrases, MatchBudgets, StatementColumns};
pub use error::{BreakdownError, Result};
pub use facts::{
    extract_facts, extract_with_selections, FactField, FieldSelection, MedicalItem,
    StatementExtraction, StatementFacts,
};
pub use formula::{CellRange, CellRef, Expr};
pub use fuzzy::{approximate_distance, find, find_unique, is_match, MatchSelection};
pub use generator::{
    attorney_fee_factor, generate, BreakdownGenerator, CellContent, CellStyle, OutputCell,
    OutputWorkbook,
};
pub use layout::{
    ComputedLine, Layout, ManualLine, MedicalColumn, PayoutAccount, RateLine, Slot, StatementLine,
};
pub use loader::{load_grid, RawCell, RawGrid};
pub use normalizer::{canonicalize_label, normalize, StatementRecord};
pub use pipeline::{
    output_file_name, BatchOutcome, BatchReport, BreakdownPipeline, ProcessedStatement,
    ProtectionStatus, StatementJob,
};
pub use protect::{CommandProtector, WorkbookProtector};
pub use sections::{split, SectionKind, StatementSections};
pub use writer::render_xlsx;

use chrono::NaiveDate;
use log::debug;

/// Grid to facts, using the configured columns, phrases and budgets.
pub fn extract_statement(grid: &RawGrid, config: &BreakdownConfig) -> Result<StatementFacts> {
    let records = normalize(grid, &config.columns, config.verbose_threshold)?;
    debug!("Extracting facts from {} statement records", records.len());
    extract_facts(&records, config)
}

/// Facts to breakdown workbook, planning the layout from the item count.
pub fn build_breakdown(
    facts: &StatementFacts,
    is_litigation: bool,
    prepared_on: NaiveDate,
) -> Result<OutputWorkbook> {
    let layout = Layout::plan(facts.medical_items.len());
    generate(facts, is_litigation, &layout, prepared_on)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(label: &str, amount: Option<f64>) -> Vec<RawCell> {
        let mut cells = vec![RawCell::Empty; 10];
        cells[1] = RawCell::text(label);
        if let Some(a) = amount {
            cells[9] = RawCell::Number(a);
        }
        cells
    }

    fn subtotal(amount: f64) -> Vec<RawCell> {
        let mut cells = vec![RawCell::Empty; 10];
        cells[2] = RawCell::text("Subtotal:");
        cells[9] = RawCell::Number(amount);
        cells
    }

    #[test]
    fn test_end_to_end_processing() {
        let grid = RawGrid::from_rows(vec![
            row("Name: Jane Doe", None),
            row("Amount of Settlement:", Some(90_000.0)),
            row("Net to Client:", Some(50_000.0)),
            subtotal(90_000.0),
            row("Filing Fee", Some(-4_000.0)),
            row("Total Expenses:", Some(-4_000.0)),
            subtotal(86_000.0),
            row("Medical / Liens", None),
            row("City Hospital", Some(-1_000.0)),
            row("Radiology Associates", Some(-2_000.0)),
            row("Total Medical:", Some(-3_000.0)),
            row("Total Medical Reductions:", Some(0.0)),
            subtotal(-3_000.0),
        ]);

        let facts = extract_statement(&grid, &BreakdownConfig::default()).unwrap();
        assert_eq!(facts.client_name, "jane doe");
        assert_eq!(facts.total_medical_amount, 3_000.0);
        assert_eq!(facts.medical_items.len(), 2);

        let prepared = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let book = build_breakdown(&facts, false, prepared).unwrap();
        let layout = Layout::plan(2);
        assert_eq!(book.text_at(layout.resolve(Slot::ClientName)), Some("Jane Doe"));
        assert_eq!(
            book.formula_at(layout.resolve(Slot::MedicalTotal(MedicalColumn::Billed))),
            Some("=SUM(B10:B11)")
        );
    }
}
