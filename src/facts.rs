use crate::config::BreakdownConfig;
use crate::error::{BreakdownError, Result};
use crate::fuzzy::{find_unique, MatchSelection};
use crate::normalizer::StatementRecord;
use crate::sections::split;
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalItem {
    pub provider: String,
    /// Always non-negative; statements list liens as either sign.
    pub billed_amount: f64,
}

/// Financial facts read off one closeout statement. Expense and medical
/// totals are stored as absolute values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementFacts {
    pub client_name: String,
    pub settlement_amount: f64,
    pub net_to_client_amount: f64,
    pub total_expenses_amount: f64,
    pub total_medical_amount: f64,
    pub medical_items: Vec<MedicalItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactField {
    ClientName,
    Settlement,
    NetToClient,
    TotalExpenses,
    TotalMedical,
}

/// Which row each field was read from, including every other candidate row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSelection {
    pub field: FactField,
    pub selection: MatchSelection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementExtraction {
    pub facts: StatementFacts,
    pub selections: Vec<FieldSelection>,
}

impl StatementExtraction {
    pub fn selection(&self, field: FactField) -> Option<&MatchSelection> {
        self.selections
            .iter()
            .find(|s| s.field == field)
            .map(|s| &s.selection)
    }

    /// Fields whose phrase matched more than one row.
    pub fn ambiguous_fields(&self) -> Vec<FactField> {
        self.selections
            .iter()
            .filter(|s| s.selection.is_ambiguous())
            .map(|s| s.field)
            .collect()
    }
}

pub fn extract_facts(records: &[StatementRecord], config: &BreakdownConfig) -> Result<StatementFacts> {
    extract_with_selections(records, config).map(|extraction| extraction.facts)
}

/// Looks up every fact against the full record sequence; only the medical
/// items come from the medical section.
pub fn extract_with_selections(
    records: &[StatementRecord],
    config: &BreakdownConfig,
) -> Result<StatementExtraction> {
    let phrases = &config.phrases;
    let budgets = &config.budgets;

    let sections = split(records, &phrases.subtotal, budgets.subtotal)?;
    let medical_items: Vec<MedicalItem> = sections
        .medical_items()
        .into_iter()
        .map(|record| MedicalItem {
            provider: record.label.clone(),
            billed_amount: record.amount.unwrap_or(0.0).abs(),
        })
        .collect();

    let mut selections = Vec::new();
    let mut amount_of = |field: FactField, phrase: &str, max_errors: usize| -> Result<f64> {
        let selection = find_unique(records, phrase, max_errors)?;
        let record = selection.record(records);
        let amount = record.amount.ok_or_else(|| BreakdownError::MissingAmount {
            phrase: phrase.to_string(),
            label: record.label.clone(),
        })?;
        selections.push(FieldSelection { field, selection });
        Ok(amount)
    };

    let settlement_amount = amount_of(FactField::Settlement, &phrases.settlement, budgets.settlement)?;
    let net_to_client_amount =
        amount_of(FactField::NetToClient, &phrases.net_to_client, budgets.net_to_client)?;
    let total_expenses_amount =
        amount_of(FactField::TotalExpenses, &phrases.total_expenses, budgets.total_expenses)?.abs();
    let total_medical_amount =
        amount_of(FactField::TotalMedical, &phrases.total_medical, budgets.total_medical)?.abs();

    let name_selection = find_unique(records, &phrases.name, budgets.name)?;
    let client_name = parse_client_name(&name_selection.record(records).label, &phrases.name);
    selections.push(FieldSelection {
        field: FactField::ClientName,
        selection: name_selection,
    });

    info!(
        "Extracted statement for '{}': settlement {:.2}, {} medical item(s)",
        client_name,
        settlement_amount,
        medical_items.len()
    );

    Ok(StatementExtraction {
        facts: StatementFacts {
            client_name,
            settlement_amount,
            net_to_client_amount,
            total_expenses_amount,
            total_medical_amount,
            medical_items,
        },
        selections,
    })
}

/// Assumes a single "Name: <value>" row: the phrase is removed from the
/// canonical label and the remainder trimmed. A label such as
/// "client name jane doe" therefore yields "client  jane doe".
pub fn parse_client_name(label: &str, name_phrase: &str) -> String {
    label.replace(name_phrase, "").trim().to_string()
}
