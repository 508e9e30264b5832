use thiserror::Error;

/// Errors that can occur while reading, reconciling or exporting tables
#[derive(Error, Debug)]
pub enum ConsolidaError {
    #[error("No encoding candidate could decode the file: tried {tried}")]
    DecodeFailure { tried: String },

    #[error("Unsupported file format: '{extension}'. Supported: csv, txt, tsv, xlsx, xls")]
    UnsupportedFormat { extension: String },

    #[error("{file} has a different column set: missing [{}], extra [{}]", missing.join(", "), extra.join(", "))]
    SchemaMismatch {
        file: String,
        missing: Vec<String>,
        extra: Vec<String>,
    },

    #[error("Table is empty after removing blank rows and placeholder columns")]
    EmptyAfterCleaning,

    #[error("Spreadsheet export failed: {0}")]
    ExportFailure(String),

    #[error("Not a valid {format} workbook: {detail}")]
    NotAWorkbook { format: String, detail: String },

    #[error("Sheet '{name}' not found in workbook")]
    SheetNotFound { name: String },

    #[error("Index out of bounds: row {row}, col {col} (sheet has {rows} rows, {cols} cols)")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Row index out of bounds: {index} (sheet has {count} rows)")]
    RowIndexOutOfBounds { index: usize, count: usize },

    #[error("Column index out of bounds: {index} (sheet has {count} columns)")]
    ColumnIndexOutOfBounds { index: usize, count: usize },

    #[error("Column not found: {name}")]
    ColumnNotFound { name: String },

    #[error("Columns not named: {0}")]
    ColumnsNotNamed(String),

    #[error("Data length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConsolidaError>;
