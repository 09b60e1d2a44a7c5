use crate::error::{BreakdownError, Result};
use crate::facts::StatementFacts;
use crate::formula::{CellRange, CellRef, Expr};
use crate::layout::{
    ComputedLine, Layout, ManualLine, MedicalColumn, PayoutAccount, RateLine, Slot, StatementLine,
};
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SHEET_NAME: &str = "Breakdown";
pub const LITIGATION_FEE_RATE: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellStyle {
    Title,
    Subtitle,
    Header,
    Label,
    Text,
    Currency,
    /// Currency cell meant to be filled in by hand.
    Input,
    /// Percentage cell meant to be filled in by hand.
    InputPercent,
    Total,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellContent {
    Text(String),
    Number(f64),
    /// Formula text including the leading `=`.
    Formula(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputCell {
    pub content: CellContent,
    pub style: CellStyle,
}

/// In-memory breakdown sheet, independent of any file format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputWorkbook {
    pub sheet_name: String,
    cells: BTreeMap<CellRef, OutputCell>,
    column_widths: BTreeMap<u16, f64>,
}

impl OutputWorkbook {
    pub fn new(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            cells: BTreeMap::new(),
            column_widths: BTreeMap::new(),
        }
    }

    pub fn put(&mut self, at: CellRef, content: CellContent, style: CellStyle) {
        self.cells.insert(at, OutputCell { content, style });
    }

    pub fn put_text(&mut self, at: CellRef, text: impl Into<String>, style: CellStyle) {
        self.put(at, CellContent::Text(text.into()), style);
    }

    pub fn put_number(&mut self, at: CellRef, value: f64, style: CellStyle) {
        self.put(at, CellContent::Number(value), style);
    }

    pub fn put_formula(&mut self, at: CellRef, expr: &Expr, style: CellStyle) {
        self.put(at, CellContent::Formula(expr.to_formula()), style);
    }

    pub fn set_column_width(&mut self, col: u16, width: f64) {
        self.column_widths.insert(col, width);
    }

    pub fn get(&self, at: CellRef) -> Option<&OutputCell> {
        self.cells.get(&at)
    }

    pub fn text_at(&self, at: CellRef) -> Option<&str> {
        match &self.get(at)?.content {
            CellContent::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn number_at(&self, at: CellRef) -> Option<f64> {
        match self.get(at)?.content {
            CellContent::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn formula_at(&self, at: CellRef) -> Option<&str> {
        match &self.get(at)?.content {
            CellContent::Formula(f) => Some(f.as_str()),
            _ => None,
        }
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (&CellRef, &OutputCell)> {
        self.cells.iter()
    }

    pub fn column_widths(&self) -> impl Iterator<Item = (u16, f64)> + '_ {
        self.column_widths.iter().map(|(col, width)| (*col, *width))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Builds the breakdown sheet for one statement.
pub struct BreakdownGenerator {
    prepared_on: NaiveDate,
}

impl BreakdownGenerator {
    pub fn new(prepared_on: NaiveDate) -> Self {
        Self { prepared_on }
    }

    pub fn generate(
        &self,
        facts: &StatementFacts,
        is_litigation: bool,
        layout: &Layout,
    ) -> Result<OutputWorkbook> {
        if layout.n_items != facts.medical_items.len() {
            return Err(BreakdownError::LayoutMismatch {
                planned: layout.n_items,
                actual: facts.medical_items.len(),
            });
        }

        let mut sheet = SheetBuilder {
            book: OutputWorkbook::new(SHEET_NAME),
            layout,
        };

        sheet.title_block(facts, is_litigation, self.prepared_on);
        sheet.computed_column(is_litigation);
        sheet.medical_table(facts);
        sheet.manual_column();
        sheet.payouts();
        sheet.rates();
        sheet.column_widths();

        debug!(
            "Generated breakdown with {} cells; medical table ends at row {}",
            sheet.book.len(),
            layout.medical_table_final_row
        );
        Ok(sheet.book)
    }
}

pub fn generate(
    facts: &StatementFacts,
    is_litigation: bool,
    layout: &Layout,
    prepared_on: NaiveDate,
) -> Result<OutputWorkbook> {
    BreakdownGenerator::new(prepared_on).generate(facts, is_litigation, layout)
}

/// 0.40 under litigation, otherwise one third.
pub fn attorney_fee_factor(is_litigation: bool) -> Expr {
    if is_litigation {
        Expr::num(LITIGATION_FEE_RATE)
    } else {
        Expr::ratio(1, 3)
    }
}

pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

struct SheetBuilder<'a> {
    book: OutputWorkbook,
    layout: &'a Layout,
}

impl SheetBuilder<'_> {
    fn at(&self, slot: Slot) -> CellRef {
        self.layout.resolve(slot)
    }

    fn cell(&self, slot: Slot) -> Expr {
        Expr::cell(self.at(slot))
    }

    fn label(&mut self, slot: Slot, text: &str) {
        let at = self.at(slot).left();
        self.book.put_text(at, text, CellStyle::Label);
    }

    fn formula(&mut self, slot: Slot, expr: Expr, style: CellStyle) {
        let at = self.at(slot);
        self.book.put_formula(at, &expr, style);
    }

    fn title_block(&mut self, facts: &StatementFacts, is_litigation: bool, prepared_on: NaiveDate) {
        let (name_at, case_at, date_at) = (
            self.at(Slot::ClientName),
            self.at(Slot::CaseType),
            self.at(Slot::PreparedOn),
        );
        self.book
            .put_text(name_at, title_case(&facts.client_name), CellStyle::Title);

        let case_type = if is_litigation {
            "Settlement Breakdown - Litigation"
        } else {
            "Settlement Breakdown - Pre-Litigation"
        };
        self.book.put_text(case_at, case_type, CellStyle::Subtitle);
        self.book.put_text(
            date_at,
            format!("Prepared {}", prepared_on.format("%Y-%m-%d")),
            CellStyle::Text,
        );

        for line in StatementLine::ALL {
            let value = match line {
                StatementLine::Settlement => facts.settlement_amount,
                StatementLine::TotalExpenses => facts.total_expenses_amount,
                StatementLine::TotalMedical => facts.total_medical_amount,
                StatementLine::NetToClient => facts.net_to_client_amount,
            };
            self.label(Slot::Statement(line), line.label());
            let at = self.at(Slot::Statement(line));
            self.book.put_number(at, value, CellStyle::Currency);
        }
    }

    fn computed_column(&mut self, is_litigation: bool) {
        use ComputedLine::*;

        for line in ComputedLine::ALL {
            let slot = Slot::Computed(line);
            let expr = match line {
                Settlement => self.cell(Slot::Statement(StatementLine::Settlement)),
                AttorneyFee => self
                    .cell(Slot::Computed(Settlement))
                    .mul(attorney_fee_factor(is_litigation)),
                BusinessShare => self
                    .cell(Slot::Computed(AttorneyFee))
                    .mul(self.cell(Slot::Manual(ManualLine::FirmSplit))),
                Expenses => self.cell(Slot::Statement(StatementLine::TotalExpenses)),
                Medical => self.cell(Slot::MedicalTotal(MedicalColumn::Paid)),
                NetToClient => self
                    .cell(Slot::Computed(Settlement))
                    .sub(self.cell(Slot::Computed(AttorneyFee)))
                    .sub(self.cell(Slot::Computed(Expenses)))
                    .sub(self.cell(Slot::Computed(Medical))),
                StatementNet => self.cell(Slot::Statement(StatementLine::NetToClient)),
                Difference => self
                    .cell(Slot::Computed(NetToClient))
                    .sub(self.cell(Slot::Computed(StatementNet))),
            };
            let style = if matches!(line, NetToClient | Difference) {
                CellStyle::Total
            } else {
                CellStyle::Currency
            };
            self.label(slot, line.label());
            self.formula(slot, expr, style);
        }
    }

    fn medical_table(&mut self, facts: &StatementFacts) {
        for column in MedicalColumn::ALL {
            let at = self.at(Slot::MedicalHeader(column));
            self.book.put_text(at, column.header(), CellStyle::Header);
        }

        for (index, item) in facts.medical_items.iter().enumerate() {
            let at = |column| self.layout.resolve(Slot::MedicalItem { index, column });
            let (provider, billed, paid, comment) = (
                at(MedicalColumn::Provider),
                at(MedicalColumn::Billed),
                at(MedicalColumn::Paid),
                at(MedicalColumn::Comment),
            );
            self.book
                .put_text(provider, title_case(&item.provider), CellStyle::Text);
            self.book
                .put_number(billed, item.billed_amount.abs(), CellStyle::Currency);
            self.book.put_number(paid, 0.0, CellStyle::Input);
            self.book.put_text(comment, "-", CellStyle::Text);
        }

        let total_label = self.at(Slot::MedicalTotal(MedicalColumn::Provider));
        self.book.put_text(total_label, "Total", CellStyle::Total);
        for column in [MedicalColumn::Billed, MedicalColumn::Paid] {
            let expr = self
                .layout
                .medical_item_range(column)
                .map(Expr::sum)
                .unwrap_or_else(|| Expr::num(0.0));
            self.formula(Slot::MedicalTotal(column), expr, CellStyle::Total);
        }
    }

    fn manual_column(&mut self) {
        for line in ManualLine::ALL {
            let slot = Slot::Manual(line);
            self.label(slot, line.label());
            let style = if line.is_percentage() {
                CellStyle::InputPercent
            } else {
                CellStyle::Input
            };
            let at = self.at(slot);
            self.book.put_number(at, 0.0, style);
        }
    }

    fn payouts(&mut self) {
        let header = self.at(Slot::PayoutsHeader);
        self.book.put_text(header, "Payouts", CellStyle::Header);

        let business_share = self.cell(Slot::Computed(ComputedLine::BusinessShare));
        let fee_received = self.cell(Slot::Manual(ManualLine::FeeReceived));

        for account in PayoutAccount::ALL {
            let expr = match account {
                PayoutAccount::PartnerDraw => {
                    let first = self.at(Slot::Payout(PayoutAccount::Operating));
                    let last = self.at(Slot::Payout(PayoutAccount::TaxReserve));
                    business_share
                        .clone()
                        .sub(Expr::sum(CellRange::new(first, last)))
                }
                PayoutAccount::Referral => fee_received
                    .clone()
                    .mul(self.cell(Slot::Manual(ManualLine::ReferralSplit))),
                PayoutAccount::CoCounsel => fee_received
                    .clone()
                    .mul(self.cell(Slot::Manual(ManualLine::CoCounselSplit))),
                PayoutAccount::ClientTrust => self.cell(Slot::Computed(ComputedLine::NetToClient)),
                rated => business_share
                    .clone()
                    .mul(Expr::num(rated.business_share_rate().unwrap_or(0.0))),
            };
            let slot = Slot::Payout(account);
            self.label(slot, account.label());
            self.formula(slot, expr, CellStyle::Currency);
        }
    }

    fn rates(&mut self) {
        let header = self.at(Slot::RatesHeader);
        self.book.put_text(header, "Rates", CellStyle::Header);

        for line in RateLine::ALL {
            let slot = Slot::Rate(line);
            self.label(slot, line.label());
            let at = self.at(slot);
            self.book.put_number(at, line.default_rate(), CellStyle::InputPercent);
        }

        let check = Expr::Call(
            "IF",
            vec![
                Expr::Call("ROUND", vec![Expr::sum(self.layout.rate_range()), Expr::num(4.0)])
                    .equals(Expr::num(1.0)),
                Expr::text("OK"),
                Expr::text("CHECK RATES"),
            ],
        );
        self.label(Slot::RateCheck, "Rates Total");
        self.formula(Slot::RateCheck, check, CellStyle::Text);

        let commission = self
            .cell(Slot::Computed(ComputedLine::BusinessShare))
            .mul(self.cell(Slot::Rate(RateLine::Attorney)));
        self.label(Slot::Commission, "Commission");
        self.formula(Slot::Commission, commission, CellStyle::Total);
    }

    fn column_widths(&mut self) {
        for (col, width) in [
            (0u16, 32.0),
            (1, 16.0),
            (2, 22.0),
            (3, 16.0),
            (4, 4.0),
            (5, 20.0),
            (6, 14.0),
        ] {
            self.book.set_column_width(col, width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::MedicalItem;

    fn facts(n_items: usize) -> StatementFacts {
        StatementFacts {
            client_name: "jane doe".to_string(),
            settlement_amount: 90_000.0,
            net_to_client_amount: 50_000.0,
            total_expenses_amount: 4_000.0,
            total_medical_amount: 3_000.0,
            medical_items: (0..n_items)
                .map(|i| MedicalItem {
                    provider: format!("provider {}", i),
                    billed_amount: 1_000.0 * (i + 1) as f64,
                })
                .collect(),
        }
    }

    fn prepared() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn build(n: usize, litigation: bool) -> (OutputWorkbook, Layout) {
        let layout = Layout::plan(n);
        let book = generate(&facts(n), litigation, &layout, prepared()).unwrap();
        (book, layout)
    }

    #[test]
    fn test_title_block() {
        let (book, layout) = build(2, false);
        assert_eq!(book.text_at(layout.resolve(Slot::ClientName)), Some("Jane Doe"));
        assert_eq!(
            book.text_at(layout.resolve(Slot::CaseType)),
            Some("Settlement Breakdown - Pre-Litigation")
        );
        assert_eq!(book.text_at(layout.resolve(Slot::PreparedOn)), Some("Prepared 2024-03-01"));
        assert_eq!(
            book.number_at(layout.resolve(Slot::Statement(StatementLine::Settlement))),
            Some(90_000.0)
        );
    }

    #[test]
    fn test_fee_factor_follows_litigation_flag() {
        let (book, layout) = build(2, false);
        let fee = layout.resolve(Slot::Computed(ComputedLine::AttorneyFee));
        let settlement = layout.resolve(Slot::Computed(ComputedLine::Settlement));
        assert_eq!(book.formula_at(fee), Some(format!("={}*(1/3)", settlement).as_str()));

        let (book, _) = build(2, true);
        assert_eq!(book.formula_at(fee), Some(format!("={}*0.4", settlement).as_str()));
    }

    #[test]
    fn test_medical_totals_cover_exactly_item_rows() {
        for n in [1usize, 2, 10] {
            let (book, layout) = build(n, false);
            let total = layout.resolve(Slot::MedicalTotal(MedicalColumn::Billed));
            let expected = format!("=SUM(B10:B{})", 9 + n);
            assert_eq!(book.formula_at(total), Some(expected.as_str()), "n = {}", n);

            let paid_total = layout.resolve(Slot::MedicalTotal(MedicalColumn::Paid));
            assert_eq!(
                book.formula_at(paid_total),
                Some(format!("=SUM(C10:C{})", 9 + n).as_str())
            );

            // Row above the totals holds the last item, row below is empty.
            assert!(book.number_at(CellRef::new(total.row - 1, 1)).is_some());
            assert!(book.get(CellRef::new(total.row + 1, 1)).is_none());
            assert_eq!(book.text_at(CellRef::new(10, 0)), Some("Provider 0"));
        }
    }

    #[test]
    fn test_empty_medical_table_totals_zero() {
        let (book, layout) = build(0, false);
        let total = layout.resolve(Slot::MedicalTotal(MedicalColumn::Billed));
        assert_eq!(total.row, 10);
        assert_eq!(book.formula_at(total), Some("=0"));
    }

    #[test]
    fn test_medical_item_placeholders() {
        let (book, layout) = build(2, false);
        let paid = layout.resolve(Slot::MedicalItem { index: 1, column: MedicalColumn::Paid });
        let comment = layout.resolve(Slot::MedicalItem { index: 1, column: MedicalColumn::Comment });
        assert_eq!(book.number_at(paid), Some(0.0));
        assert_eq!(book.text_at(comment), Some("-"));
        assert_eq!(book.get(paid).unwrap().style, CellStyle::Input);
    }

    #[test]
    fn test_computed_column_is_formulas_only() {
        let (book, layout) = build(3, true);
        for line in ComputedLine::ALL {
            let at = layout.resolve(Slot::Computed(line));
            assert!(book.formula_at(at).is_some(), "{:?} should be a formula", line);
            assert_eq!(book.text_at(at.left()), Some(line.label()));
        }
        let net = layout.resolve(Slot::Computed(ComputedLine::NetToClient));
        let b = layout.bottom_section_first_row;
        assert_eq!(
            book.formula_at(net),
            Some(format!("=B{}-B{}-B{}-B{}", b, b + 1, b + 3, b + 4).as_str())
        );
        let medical = layout.resolve(Slot::Computed(ComputedLine::Medical));
        assert_eq!(
            book.formula_at(medical),
            Some(format!("=C{}", layout.medical_table_final_row).as_str())
        );
    }

    #[test]
    fn test_payout_formulas() {
        let (book, layout) = build(2, false);
        let share = layout.resolve(Slot::Computed(ComputedLine::BusinessShare));
        let operating = layout.resolve(Slot::Payout(PayoutAccount::Operating));
        assert_eq!(book.formula_at(operating), Some(format!("={}*0.2825", share).as_str()));
        let marketing = layout.resolve(Slot::Payout(PayoutAccount::Marketing));
        assert_eq!(book.formula_at(marketing), Some(format!("={}*0.13", share).as_str()));

        let draw = layout.resolve(Slot::Payout(PayoutAccount::PartnerDraw));
        let tax = layout.resolve(Slot::Payout(PayoutAccount::TaxReserve));
        assert_eq!(
            book.formula_at(draw),
            Some(format!("={}-SUM({}:{})", share, operating, tax).as_str())
        );

        let referral = layout.resolve(Slot::Payout(PayoutAccount::Referral));
        let fee_received = layout.resolve(Slot::Manual(ManualLine::FeeReceived));
        let referral_split = layout.resolve(Slot::Manual(ManualLine::ReferralSplit));
        assert_eq!(
            book.formula_at(referral),
            Some(format!("={}*{}", fee_received, referral_split).as_str())
        );

        let labels: Vec<&str> = PayoutAccount::ALL
            .iter()
            .map(|a| book.text_at(layout.resolve(Slot::Payout(*a)).left()).unwrap())
            .collect();
        assert_eq!(labels.len(), 10);
    }

    #[test]
    fn test_rates_section() {
        let (book, layout) = build(2, false);
        assert_eq!(
            book.formula_at(layout.resolve(Slot::RateCheck)),
            Some("=IF(ROUND(SUM(G35:G38),4)=1,\"OK\",\"CHECK RATES\")")
        );
        let share = layout.resolve(Slot::Computed(ComputedLine::BusinessShare));
        assert_eq!(
            book.formula_at(layout.resolve(Slot::Commission)),
            Some(format!("={}*G35", share).as_str())
        );
        assert_eq!(book.number_at(CellRef::new(35, 6)), Some(0.5));
    }

    #[test]
    fn test_layout_mismatch_is_rejected() {
        let err = generate(&facts(2), false, &Layout::plan(3), prepared()).unwrap_err();
        assert!(matches!(err, BreakdownError::LayoutMismatch { planned: 3, actual: 2 }));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("jane  doe"), "Jane Doe");
        assert_eq!(title_case(""), "");
    }
}
