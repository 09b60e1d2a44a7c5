//! Coordinates of every block in the generated breakdown.
//!
//! Everything is derived from the number of medical items and the fixed
//! offsets below, so the same item count always yields the same layout.
//! Formulas never spell out coordinates themselves; they name a [`Slot`]
//! and ask the layout where it lives.

use crate::formula::{CellRange, CellRef};
use serde::{Deserialize, Serialize};

pub const TITLE_BLOCK_ROWS: u32 = 8;
pub const MEDICAL_HEADER_ROW: u32 = TITLE_BLOCK_ROWS + 1;
pub const MEDICAL_FIRST_ITEM_ROW: u32 = MEDICAL_HEADER_ROW + 1;
/// Rows between the medical totals row and the bottom section, inclusive of the gap.
pub const BOTTOM_SECTION_GAP: u32 = 2;
pub const RATES_FIRST_ROW: u32 = 34;
/// Payouts begin this many rows below the start of the bottom section.
pub const PAYOUTS_OFFSET: u32 = 9;

pub const LABEL_COL: u16 = 0;
pub const VALUE_COL: u16 = 1;
pub const PAID_COL: u16 = 2;
pub const COMMENT_COL: u16 = 3;
pub const MANUAL_VALUE_COL: u16 = 3;
pub const RATES_VALUE_COL: u16 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MedicalColumn {
    Provider,
    Billed,
    Paid,
    Comment,
}

impl MedicalColumn {
    pub const ALL: [MedicalColumn; 4] = [
        MedicalColumn::Provider,
        MedicalColumn::Billed,
        MedicalColumn::Paid,
        MedicalColumn::Comment,
    ];

    pub fn col(self) -> u16 {
        match self {
            MedicalColumn::Provider => LABEL_COL,
            MedicalColumn::Billed => VALUE_COL,
            MedicalColumn::Paid => PAID_COL,
            MedicalColumn::Comment => COMMENT_COL,
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            MedicalColumn::Provider => "Medical Provider",
            MedicalColumn::Billed => "Billed",
            MedicalColumn::Paid => "Paid / Projected",
            MedicalColumn::Comment => "Comment",
        }
    }
}

/// Statement amounts copied into the title block as literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementLine {
    Settlement,
    TotalExpenses,
    TotalMedical,
    NetToClient,
}

impl StatementLine {
    pub const ALL: [StatementLine; 4] = [
        StatementLine::Settlement,
        StatementLine::TotalExpenses,
        StatementLine::TotalMedical,
        StatementLine::NetToClient,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StatementLine::Settlement => "Settlement (Statement)",
            StatementLine::TotalExpenses => "Total Expenses (Statement)",
            StatementLine::TotalMedical => "Total Medical (Statement)",
            StatementLine::NetToClient => "Net to Client (Statement)",
        }
    }

    fn offset(self) -> u32 {
        StatementLine::ALL.iter().position(|l| *l == self).unwrap_or(0) as u32
    }
}

/// Rows of the computed (formula) financial column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComputedLine {
    Settlement,
    AttorneyFee,
    BusinessShare,
    Expenses,
    Medical,
    NetToClient,
    StatementNet,
    Difference,
}

impl ComputedLine {
    pub const ALL: [ComputedLine; 8] = [
        ComputedLine::Settlement,
        ComputedLine::AttorneyFee,
        ComputedLine::BusinessShare,
        ComputedLine::Expenses,
        ComputedLine::Medical,
        ComputedLine::NetToClient,
        ComputedLine::StatementNet,
        ComputedLine::Difference,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ComputedLine::Settlement => "Settlement",
            ComputedLine::AttorneyFee => "Attorney Fee",
            ComputedLine::BusinessShare => "Business Share",
            ComputedLine::Expenses => "Expenses",
            ComputedLine::Medical => "Medical (Paid)",
            ComputedLine::NetToClient => "Net to Client",
            ComputedLine::StatementNet => "Net per Statement",
            ComputedLine::Difference => "Difference",
        }
    }

    fn offset(self) -> u32 {
        ComputedLine::ALL.iter().position(|l| *l == self).unwrap_or(0) as u32
    }
}

/// Rows of the manually-entered column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManualLine {
    FeeReceived,
    FirmSplit,
    ReferralSplit,
    CoCounselSplit,
}

impl ManualLine {
    pub const ALL: [ManualLine; 4] = [
        ManualLine::FeeReceived,
        ManualLine::FirmSplit,
        ManualLine::ReferralSplit,
        ManualLine::CoCounselSplit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ManualLine::FeeReceived => "Fee Received",
            ManualLine::FirmSplit => "Firm Split %",
            ManualLine::ReferralSplit => "Referral Split %",
            ManualLine::CoCounselSplit => "Co-Counsel Split %",
        }
    }

    pub fn is_percentage(self) -> bool {
        !matches!(self, ManualLine::FeeReceived)
    }

    fn offset(self) -> u32 {
        ManualLine::ALL.iter().position(|l| *l == self).unwrap_or(0) as u32
    }
}

/// The ten accounts money is paid out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayoutAccount {
    Operating,
    Marketing,
    CaseManager,
    Paralegal,
    Intake,
    TaxReserve,
    PartnerDraw,
    Referral,
    CoCounsel,
    ClientTrust,
}

impl PayoutAccount {
    pub const ALL: [PayoutAccount; 10] = [
        PayoutAccount::Operating,
        PayoutAccount::Marketing,
        PayoutAccount::CaseManager,
        PayoutAccount::Paralegal,
        PayoutAccount::Intake,
        PayoutAccount::TaxReserve,
        PayoutAccount::PartnerDraw,
        PayoutAccount::Referral,
        PayoutAccount::CoCounsel,
        PayoutAccount::ClientTrust,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PayoutAccount::Operating => "Operating",
            PayoutAccount::Marketing => "Marketing",
            PayoutAccount::CaseManager => "Case Manager",
            PayoutAccount::Paralegal => "Paralegal",
            PayoutAccount::Intake => "Intake",
            PayoutAccount::TaxReserve => "Tax Reserve",
            PayoutAccount::PartnerDraw => "Partner Draw",
            PayoutAccount::Referral => "Referral",
            PayoutAccount::CoCounsel => "Co-Counsel",
            PayoutAccount::ClientTrust => "Client Trust",
        }
    }

    /// Fixed share of the business share, for accounts paid that way.
    pub fn business_share_rate(self) -> Option<f64> {
        match self {
            PayoutAccount::Operating => Some(0.2825),
            PayoutAccount::Marketing => Some(0.13),
            PayoutAccount::CaseManager => Some(0.04),
            PayoutAccount::Paralegal => Some(0.03),
            PayoutAccount::Intake => Some(0.02),
            PayoutAccount::TaxReserve => Some(0.25),
            _ => None,
        }
    }

    fn offset(self) -> u32 {
        PayoutAccount::ALL.iter().position(|a| *a == self).unwrap_or(0) as u32
    }
}

/// Editable rate inputs; their defaults sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateLine {
    Attorney,
    CaseManager,
    Paralegal,
    Intake,
}

impl RateLine {
    pub const ALL: [RateLine; 4] = [
        RateLine::Attorney,
        RateLine::CaseManager,
        RateLine::Paralegal,
        RateLine::Intake,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RateLine::Attorney => "Attorney Rate",
            RateLine::CaseManager => "Case Manager Rate",
            RateLine::Paralegal => "Paralegal Rate",
            RateLine::Intake => "Intake Rate",
        }
    }

    pub fn default_rate(self) -> f64 {
        match self {
            RateLine::Attorney => 0.5,
            RateLine::CaseManager => 0.25,
            RateLine::Paralegal => 0.15,
            RateLine::Intake => 0.1,
        }
    }

    fn offset(self) -> u32 {
        RateLine::ALL.iter().position(|r| *r == self).unwrap_or(0) as u32
    }
}

/// Symbolic name of a value cell in the breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Slot {
    ClientName,
    CaseType,
    PreparedOn,
    Statement(StatementLine),
    MedicalHeader(MedicalColumn),
    MedicalItem { index: usize, column: MedicalColumn },
    MedicalTotal(MedicalColumn),
    Computed(ComputedLine),
    Manual(ManualLine),
    PayoutsHeader,
    Payout(PayoutAccount),
    RatesHeader,
    Rate(RateLine),
    RateCheck,
    Commission,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub n_items: usize,
    pub medical_header_row: u32,
    pub medical_first_item_row: u32,
    /// The medical totals row.
    pub medical_table_final_row: u32,
    pub bottom_section_first_row: u32,
    pub payouts_header_row: u32,
    pub rates_first_row: u32,
}

impl Layout {
    pub fn plan(n_items: usize) -> Self {
        let medical_table_final_row = MEDICAL_FIRST_ITEM_ROW + n_items as u32;
        let bottom_section_first_row = medical_table_final_row + BOTTOM_SECTION_GAP;
        Self {
            n_items,
            medical_header_row: MEDICAL_HEADER_ROW,
            medical_first_item_row: MEDICAL_FIRST_ITEM_ROW,
            medical_table_final_row,
            bottom_section_first_row,
            payouts_header_row: bottom_section_first_row + PAYOUTS_OFFSET,
            rates_first_row: RATES_FIRST_ROW,
        }
    }

    /// Last row holding item data, `None` when there are no items.
    pub fn medical_last_item_row(&self) -> Option<u32> {
        (self.n_items > 0).then(|| self.medical_first_item_row + self.n_items as u32 - 1)
    }

    /// Item rows of one medical column, `None` when there are no items.
    pub fn medical_item_range(&self, column: MedicalColumn) -> Option<CellRange> {
        self.medical_last_item_row().map(|last| {
            CellRange::new(
                CellRef::new(self.medical_first_item_row, column.col()),
                CellRef::new(last, column.col()),
            )
        })
    }

    pub fn rate_range(&self) -> CellRange {
        CellRange::new(
            self.resolve(Slot::Rate(RateLine::Attorney)),
            self.resolve(Slot::Rate(RateLine::Intake)),
        )
    }

    /// Last row used by the bottom section in columns A-D.
    pub fn last_row(&self) -> u32 {
        self.resolve(Slot::Payout(PayoutAccount::ClientTrust)).row
    }

    pub fn resolve(&self, slot: Slot) -> CellRef {
        let bottom = self.bottom_section_first_row;
        match slot {
            Slot::ClientName => CellRef::new(1, LABEL_COL),
            Slot::CaseType => CellRef::new(2, LABEL_COL),
            Slot::PreparedOn => CellRef::new(3, LABEL_COL),
            Slot::Statement(line) => CellRef::new(4 + line.offset(), VALUE_COL),
            Slot::MedicalHeader(column) => CellRef::new(self.medical_header_row, column.col()),
            Slot::MedicalItem { index, column } => {
                CellRef::new(self.medical_first_item_row + index as u32, column.col())
            }
            Slot::MedicalTotal(column) => CellRef::new(self.medical_table_final_row, column.col()),
            Slot::Computed(line) => CellRef::new(bottom + line.offset(), VALUE_COL),
            Slot::Manual(line) => CellRef::new(bottom + line.offset(), MANUAL_VALUE_COL),
            Slot::PayoutsHeader => CellRef::new(self.payouts_header_row, LABEL_COL),
            Slot::Payout(account) => {
                CellRef::new(self.payouts_header_row + 1 + account.offset(), VALUE_COL)
            }
            Slot::RatesHeader => CellRef::new(self.rates_first_row, RATES_VALUE_COL - 1),
            Slot::Rate(line) => CellRef::new(self.rates_first_row + 1 + line.offset(), RATES_VALUE_COL),
            Slot::RateCheck => {
                CellRef::new(self.rates_first_row + 1 + RateLine::ALL.len() as u32, RATES_VALUE_COL)
            }
            Slot::Commission => {
                CellRef::new(self.rates_first_row + 2 + RateLine::ALL.len() as u32, RATES_VALUE_COL)
            }
        }
    }
}
