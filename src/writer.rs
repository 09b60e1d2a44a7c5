use crate::error::Result;
use crate::generator::{CellContent, CellStyle, OutputWorkbook};
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook};

const CURRENCY_FORMAT: &str = "$#,##0.00;[Red]($#,##0.00)";
const PERCENT_FORMAT: &str = "0.00%";

struct StyleSheet {
    title: Format,
    subtitle: Format,
    header: Format,
    label: Format,
    text: Format,
    currency: Format,
    input: Format,
    input_percent: Format,
    total: Format,
}

impl StyleSheet {
    fn new() -> Self {
        let input_fill = Color::RGB(0xFFF2CC);
        Self {
            title: Format::new()
                .set_bold()
                .set_font_size(16)
                .set_font_color(Color::RGB(0x1F3864)),
            subtitle: Format::new().set_italic().set_font_size(12),
            header: Format::new()
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(0x1F3864))
                .set_border(FormatBorder::Thin),
            label: Format::new().set_bold(),
            text: Format::new(),
            currency: Format::new().set_num_format(CURRENCY_FORMAT),
            input: Format::new()
                .set_num_format(CURRENCY_FORMAT)
                .set_background_color(input_fill)
                .set_border(FormatBorder::Thin),
            input_percent: Format::new()
                .set_num_format(PERCENT_FORMAT)
                .set_background_color(input_fill)
                .set_border(FormatBorder::Thin),
            total: Format::new()
                .set_bold()
                .set_num_format(CURRENCY_FORMAT)
                .set_border_top(FormatBorder::Thin)
                .set_border_bottom(FormatBorder::Double),
        }
    }

    fn format(&self, style: CellStyle) -> &Format {
        match style {
            CellStyle::Title => &self.title,
            CellStyle::Subtitle => &self.subtitle,
            CellStyle::Header => &self.header,
            CellStyle::Label => &self.label,
            CellStyle::Text => &self.text,
            CellStyle::Currency => &self.currency,
            CellStyle::Input => &self.input,
            CellStyle::InputPercent => &self.input_percent,
            CellStyle::Total => &self.total,
        }
    }
}

/// Renders the breakdown to `.xlsx` bytes. Formulas are written as text for
/// the spreadsheet application to evaluate.
pub fn render_xlsx(book: &OutputWorkbook) -> Result<Vec<u8>> {
    let styles = StyleSheet::new();
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&book.sheet_name)?;

    for (col, width) in book.column_widths() {
        worksheet.set_column_width(col, width)?;
    }

    for (at, cell) in book.cells() {
        let (row, col) = (at.row_index(), at.col);
        let format = styles.format(cell.style);
        match &cell.content {
            CellContent::Text(text) => {
                worksheet.write_string_with_format(row, col, text, format)?;
            }
            CellContent::Number(value) => {
                worksheet.write_number_with_format(row, col, *value, format)?;
            }
            CellContent::Formula(formula) => {
                worksheet.write_formula_with_format(row, col, formula.as_str(), format)?;
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{CellRef, Expr};

    #[test]
    fn test_render_produces_zip_container() {
        let mut book = OutputWorkbook::new("Breakdown");
        book.put_text(CellRef::new(1, 0), "Jane Doe", CellStyle::Title);
        book.put_number(CellRef::new(2, 1), 1000.0, CellStyle::Currency);
        book.put_formula(
            CellRef::new(3, 1),
            &Expr::cell(CellRef::new(2, 1)).mul(Expr::ratio(1, 3)),
            CellStyle::Total,
        );
        book.set_column_width(0, 30.0);

        let bytes = render_xlsx(&book).unwrap();
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[..2], b"PK");
    }
}
