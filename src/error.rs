use thiserror::Error;

#[derive(Error, Debug)]
pub enum BreakdownError {
    #[error("Malformed closeout statement: {0}")]
    Structure(String),

    #[error("No row matches '{phrase}' within {max_errors} edit(s)")]
    NotFound { phrase: String, max_errors: usize },

    #[error("Row '{label}' matched '{phrase}' but carries no amount")]
    MissingAmount { phrase: String, label: String },

    #[error("Layout was planned for {planned} medical item(s) but the statement has {actual}")]
    LayoutMismatch { planned: usize, actual: usize },

    #[error("Workbook has no worksheets: {0}")]
    EmptyWorkbook(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Password protection failed: {0}")]
    Protection(String),

    #[error("Spreadsheet read error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Workbook write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BreakdownError>;
