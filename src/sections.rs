use crate::error::{BreakdownError, Result};
use crate::fuzzy::find;
use crate::normalizer::StatementRecord;
use log::debug;

/// Medical section rows after the header that are summaries, not items:
/// total medical, total medical reductions, subtotal medical.
pub const MEDICAL_SUMMARY_ROWS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Settlement,
    Expenses,
    Medical,
}

/// The three consecutive statement sections, each ending with (and
/// including) its subtotal row. `trailing` holds any records after the
/// third subtotal and is empty for a conventional statement.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementSections<'a> {
    pub settlement: &'a [StatementRecord],
    pub expenses: &'a [StatementRecord],
    pub medical: &'a [StatementRecord],
    pub trailing: &'a [StatementRecord],
}

impl<'a> StatementSections<'a> {
    pub fn section(&self, kind: SectionKind) -> &'a [StatementRecord] {
        match kind {
            SectionKind::Settlement => self.settlement,
            SectionKind::Expenses => self.expenses,
            SectionKind::Medical => self.medical,
        }
    }

    /// Itemized medical rows: the medical section minus its header row, its
    /// trailing summary rows, and any blank rows left in between.
    pub fn medical_items(&self) -> Vec<&'a StatementRecord> {
        let end = self.medical.len().saturating_sub(MEDICAL_SUMMARY_ROWS);
        self.medical
            .get(1..end)
            .unwrap_or(&[])
            .iter()
            .filter(|record| !record.is_blank())
            .collect()
    }
}

/// Splits records at the first three rows matching `subtotal_phrase`.
pub fn split<'a>(
    records: &'a [StatementRecord],
    subtotal_phrase: &str,
    max_errors: usize,
) -> Result<StatementSections<'a>> {
    let boundaries = find(records, subtotal_phrase, max_errors);
    if boundaries.len() < 3 {
        return Err(BreakdownError::Structure(format!(
            "expected 3 '{}' rows closing the settlement, expense and medical sections, found {}",
            subtotal_phrase,
            boundaries.len()
        )));
    }

    let (s0, s1, s2) = (boundaries[0], boundaries[1], boundaries[2]);
    debug!("Section boundaries at records {}, {}, {}", s0, s1, s2);

    let medical = &records[s1 + 1..=s2];
    if medical.len() < MEDICAL_SUMMARY_ROWS + 1 {
        return Err(BreakdownError::Structure(format!(
            "medical section has {} row(s); it needs a header and {} summary rows",
            medical.len(),
            MEDICAL_SUMMARY_ROWS
        )));
    }

    Ok(StatementSections {
        settlement: &records[..=s0],
        expenses: &records[s0 + 1..=s1],
        medical,
        trailing: &records[s2 + 1..],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(label: &str, amount: f64) -> StatementRecord {
        StatementRecord::new(label, Some(amount))
    }

    fn statement(n_items: usize) -> Vec<StatementRecord> {
        let mut records = vec![
            StatementRecord::new("name jane doe", None),
            rec("amount of settlement", 100_000.0),
            rec("subtotal", 100_000.0),
            rec("filing fee", -500.0),
            rec("total expenses", -500.0),
            rec("subtotal", 99_500.0),
            StatementRecord::new("medical/lien", None),
        ];
        for i in 0..n_items {
            records.push(rec(&format!("provider {}", i), 100.0 * (i + 1) as f64));
        }
        records.push(rec("total medical", 1.0));
        records.push(rec("total medical reductions", 0.0));
        records.push(rec("subtotal medical", 1.0));
        records
    }

    #[test]
    fn test_split_reconstructs_sequence() {
        let records = statement(2);
        let sections = split(&records, "subtotal", 2).unwrap();
        assert_eq!(sections.settlement.len(), 3);
        assert_eq!(sections.expenses.len(), 3);
        assert_eq!(sections.medical.len(), 6);
        assert!(sections.trailing.is_empty());

        let rebuilt: Vec<StatementRecord> = [sections.settlement, sections.expenses, sections.medical]
            .concat();
        assert_eq!(rebuilt, records);
        assert_eq!(sections.section(SectionKind::Expenses)[0].label, "filing fee");
    }

    #[test]
    fn test_each_section_ends_with_subtotal() {
        let records = statement(1);
        let sections = split(&records, "subtotal", 2).unwrap();
        for kind in [SectionKind::Settlement, SectionKind::Expenses, SectionKind::Medical] {
            let last = sections.section(kind).last().unwrap();
            assert!(last.label.contains("subtotal"), "{:?} ends with {}", kind, last.label);
        }
    }

    #[test]
    fn test_medical_items_exclude_header_and_summaries() {
        for n in [0usize, 1, 10] {
            let records = statement(n);
            let sections = split(&records, "subtotal", 2).unwrap();
            let items = sections.medical_items();
            assert_eq!(items.len(), n, "n = {}", n);
            if n > 0 {
                assert_eq!(items[0].label, "provider 0");
                assert_eq!(items[n - 1].label, format!("provider {}", n - 1));
            }
        }
    }

    #[test]
    fn test_blank_rows_inside_medical_items_are_dropped() {
        let mut records = statement(2);
        records.insert(8, StatementRecord::new("", None));
        let sections = split(&records, "subtotal", 2).unwrap();
        assert_eq!(sections.medical_items().len(), 2);
    }

    #[test]
    fn test_records_after_third_subtotal_are_trailing() {
        let mut records = statement(1);
        records.push(rec("subtotal", 5.0));
        records.push(rec("net to client", 50_000.0));
        let sections = split(&records, "subtotal", 2).unwrap();
        assert_eq!(sections.trailing.len(), 2);
        assert_eq!(sections.medical.last().unwrap().label, "subtotal medical");
    }

    #[test]
    fn test_fewer_than_three_subtotals_is_structure_error() {
        let records = vec![rec("subtotal", 1.0), rec("sub total", 2.0), rec("total medical", 3.0)];
        let err = split(&records, "subtotal", 2).unwrap_err();
        assert!(matches!(err, BreakdownError::Structure(_)));
        assert!(err.to_string().contains("found 2"));
    }

    #[test]
    fn test_short_medical_section_is_structure_error() {
        let records = vec![
            rec("subtotal", 1.0),
            rec("subtotal", 2.0),
            rec("total medical", 3.0),
            rec("subtotal", 3.0),
        ];
        assert!(matches!(
            split(&records, "subtotal", 2),
            Err(BreakdownError::Structure(_))
        ));
    }
}
