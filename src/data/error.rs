use thiserror::Error;

/// The uploaded file could not be turned into a [`RecordTable`](super::model::RecordTable).
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("sheet `{sheet}` not found (available: {})", available.join(", "))]
    MissingSheet {
        sheet: String,
        available: Vec<String>,
    },

    #[error("sheet `{sheet}` has no header row at row {row}")]
    MissingHeader { sheet: String, row: u32 },
}

/// The fixed predicate could not be evaluated over the table.
#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("required column `{0}` not found in data")]
    MissingColumn(String),
}

/// A display/export column was requested that the table does not have.
#[derive(Debug, Error, PartialEq)]
#[error("column `{column}` not found (available: {})", available.join(", "))]
pub struct ColumnError {
    pub column: String,
    pub available: Vec<String>,
}

/// Serialising the projected table failed.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet export failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("export buffer error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV export produced invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
