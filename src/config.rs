use crate::error::{BreakdownError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Source columns of a closeout statement, zero-based (A = 0).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(default)]
pub struct StatementColumns {
    #[schemars(description = "Column holding item labels (default 1, column B)")]
    pub label: usize,

    #[schemars(
        description = "Column holding sub-total labels, used when the label column is empty (default 2, column C)"
    )]
    pub subtotal_label: usize,

    #[schemars(description = "Column holding the amount for each row (default 9, column J)")]
    pub amount: usize,
}

impl Default for StatementColumns {
    fn default() -> Self {
        Self {
            label: 1,
            subtotal_label: 2,
            amount: 9,
        }
    }
}

impl StatementColumns {
    /// Number of columns a grid must span to contain every configured column.
    pub fn required_width(&self) -> usize {
        self.label.max(self.subtotal_label).max(self.amount) + 1
    }
}

/// Maximum edit distance allowed for each fuzzy lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(default)]
pub struct MatchBudgets {
    pub subtotal: usize,
    pub settlement: usize,
    pub net_to_client: usize,
    pub total_expenses: usize,
    pub total_medical: usize,

    #[schemars(description = "Budget for the client name row (default 1)")]
    pub name: usize,
}

impl Default for MatchBudgets {
    fn default() -> Self {
        Self {
            subtotal: 2,
            settlement: 3,
            net_to_client: 3,
            total_expenses: 3,
            total_medical: 3,
            name: 1,
        }
    }
}

/// Phrases searched for in canonicalized statement labels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(default)]
pub struct FieldPhrases {
    pub subtotal: String,
    pub settlement: String,
    pub net_to_client: String,
    pub total_expenses: String,
    pub total_medical: String,
    pub name: String,
}

impl Default for FieldPhrases {
    fn default() -> Self {
        Self {
            subtotal: "subtotal".to_string(),
            settlement: "amount of settlement".to_string(),
            net_to_client: "net to client".to_string(),
            total_expenses: "total expenses".to_string(),
            total_medical: "total medical".to_string(),
            name: "name".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(default)]
pub struct BreakdownConfig {
    #[schemars(description = "Where labels and amounts live in the source statement")]
    pub columns: StatementColumns,

    #[schemars(
        description = "Rows where any field is longer than this many characters are treated as boilerplate text and dropped"
    )]
    pub verbose_threshold: usize,

    pub budgets: MatchBudgets,

    pub phrases: FieldPhrases,

    #[schemars(
        description = "Appended to the client name to form the output file name (e.g. 'Jane Doe Breakdown.xlsx')"
    )]
    pub output_suffix: String,
}

impl Default for BreakdownConfig {
    fn default() -> Self {
        Self {
            columns: StatementColumns::default(),
            verbose_threshold: 150,
            budgets: MatchBudgets::default(),
            phrases: FieldPhrases::default(),
            output_suffix: " Breakdown".to_string(),
        }
    }
}

impl BreakdownConfig {
    /// Reads a JSON config file. Missing fields fall back to their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: BreakdownConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let cols = &self.columns;
        let distinct: HashSet<usize> = [cols.label, cols.subtotal_label, cols.amount]
            .into_iter()
            .collect();
        if distinct.len() != 3 {
            return Err(BreakdownError::InvalidConfig(format!(
                "label ({}), subtotal label ({}) and amount ({}) columns must be distinct",
                cols.label, cols.subtotal_label, cols.amount
            )));
        }

        if self.verbose_threshold == 0 {
            return Err(BreakdownError::InvalidConfig(
                "verbose_threshold must be positive".to_string(),
            ));
        }

        let phrases = &self.phrases;
        for (field, phrase) in [
            ("subtotal", &phrases.subtotal),
            ("settlement", &phrases.settlement),
            ("net_to_client", &phrases.net_to_client),
            ("total_expenses", &phrases.total_expenses),
            ("total_medical", &phrases.total_medical),
            ("name", &phrases.name),
        ] {
            if phrase.trim().is_empty() {
                return Err(BreakdownError::InvalidConfig(format!(
                    "phrase for '{}' is empty",
                    field
                )));
            }
        }

        Ok(())
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(BreakdownConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_statement_layout() {
        let config = BreakdownConfig::default();
        assert_eq!(config.columns.label, 1);
        assert_eq!(config.columns.subtotal_label, 2);
        assert_eq!(config.columns.amount, 9);
        assert_eq!(config.columns.required_width(), 10);
        assert_eq!(config.verbose_threshold, 150);
        assert_eq!(config.budgets.subtotal, 2);
        assert_eq!(config.budgets.name, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: BreakdownConfig =
            serde_json::from_str(r#"{"columns": {"amount": 7}, "budgets": {"name": 0}}"#).unwrap();
        assert_eq!(config.columns.amount, 7);
        assert_eq!(config.columns.label, 1);
        assert_eq!(config.budgets.name, 0);
        assert_eq!(config.budgets.total_medical, 3);
        assert_eq!(config.output_suffix, " Breakdown");
    }

    #[test]
    fn test_validate_rejects_overlapping_columns() {
        let mut config = BreakdownConfig::default();
        config.columns.amount = 1;
        assert!(matches!(
            config.validate(),
            Err(BreakdownError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_blank_phrase() {
        let mut config = BreakdownConfig::default();
        config.phrases.name = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_schema_generation() {
        let schema_json = BreakdownConfig::schema_as_json().unwrap();
        assert!(schema_json.contains("verbose_threshold"));
        assert!(schema_json.contains("budgets"));
        assert!(schema_json.contains("subtotal_label"));
    }
}
