//! Cell references and a small expression tree rendered to spreadsheet
//! formula text. Formulas are emitted for the consuming application to
//! evaluate; nothing here computes values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Spreadsheet column letter(s) for a zero-based index.
pub fn column_name(index: usize) -> String {
    let mut n = index + 1;
    let mut name = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        name.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    name.iter().rev().collect()
}

/// `row` is the 1-based sheet row as written in formulas, `col` is zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellRef {
    pub row: u32,
    pub col: u16,
}

impl CellRef {
    pub const fn new(row: u32, col: u16) -> Self {
        Self { row, col }
    }

    /// Cell one column to the left; used for the label beside a value.
    pub fn left(self) -> Self {
        Self {
            row: self.row,
            col: self.col.saturating_sub(1),
        }
    }

    /// Zero-based row index for writers that address rows from 0.
    pub fn row_index(self) -> u32 {
        self.row.saturating_sub(1)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_name(self.col as usize), self.row)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRange {
    pub start: CellRef,
    pub end: CellRef,
}

impl CellRange {
    pub fn new(start: CellRef, end: CellRef) -> Self {
        Self { start, end }
    }

    /// Rows covered, inclusive.
    pub fn rows(&self) -> std::ops::RangeInclusive<u32> {
        self.start.row..=self.end.row
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
}

impl BinaryOp {
    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "=",
        }
    }

    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Eq => 0,
            BinaryOp::Add | BinaryOp::Sub => 1,
            BinaryOp::Mul | BinaryOp::Div => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ref(CellRef),
    Range(CellRange),
    Number(f64),
    Text(String),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(&'static str, Vec<Expr>),
}

impl Expr {
    pub fn cell(cell: CellRef) -> Self {
        Expr::Ref(cell)
    }

    pub fn num(value: f64) -> Self {
        Expr::Number(value)
    }

    pub fn text(value: impl Into<String>) -> Self {
        Expr::Text(value.into())
    }

    /// `numerator/denominator` kept as a literal fraction in the formula.
    pub fn ratio(numerator: u32, denominator: u32) -> Self {
        Expr::num(numerator as f64).div(Expr::num(denominator as f64))
    }

    pub fn sum(range: CellRange) -> Self {
        Expr::Call("SUM", vec![Expr::Range(range)])
    }

    pub fn add(self, rhs: Expr) -> Self {
        Expr::Binary(BinaryOp::Add, Box::new(self), Box::new(rhs))
    }

    pub fn sub(self, rhs: Expr) -> Self {
        Expr::Binary(BinaryOp::Sub, Box::new(self), Box::new(rhs))
    }

    pub fn mul(self, rhs: Expr) -> Self {
        Expr::Binary(BinaryOp::Mul, Box::new(self), Box::new(rhs))
    }

    pub fn div(self, rhs: Expr) -> Self {
        Expr::Binary(BinaryOp::Div, Box::new(self), Box::new(rhs))
    }

    pub fn equals(self, rhs: Expr) -> Self {
        Expr::Binary(BinaryOp::Eq, Box::new(self), Box::new(rhs))
    }

    /// Formula text with the leading `=`.
    pub fn to_formula(&self) -> String {
        format!("={}", self)
    }

    /// Every cell the expression reads, ranges expanded to their corners.
    pub fn references(&self) -> Vec<CellRef> {
        let mut refs = Vec::new();
        self.collect_refs(&mut refs);
        refs
    }

    fn collect_refs(&self, out: &mut Vec<CellRef>) {
        match self {
            Expr::Ref(cell) => out.push(*cell),
            Expr::Range(range) => {
                out.push(range.start);
                out.push(range.end);
            }
            Expr::Number(_) | Expr::Text(_) => {}
            Expr::Binary(_, lhs, rhs) => {
                lhs.collect_refs(out);
                rhs.collect_refs(out);
            }
            Expr::Call(_, args) => args.iter().for_each(|a| a.collect_refs(out)),
        }
    }

    fn write_operand(&self, f: &mut fmt::Formatter<'_>, parent: BinaryOp, is_rhs: bool) -> fmt::Result {
        let needs_parens = match self {
            Expr::Binary(op, _, _) => {
                op.precedence() < parent.precedence()
                    || (is_rhs && op.precedence() == parent.precedence())
            }
            _ => false,
        };
        if needs_parens {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ref(cell) => write!(f, "{}", cell),
            Expr::Range(range) => write!(f, "{}", range),
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Text(s) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
            Expr::Binary(op, lhs, rhs) => {
                lhs.write_operand(f, *op, false)?;
                write!(f, "{}", op.symbol())?;
                rhs.write_operand(f, *op, true)
            }
            Expr::Call(name, args) => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}
