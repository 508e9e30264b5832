//! Serialization of the consolidated sheet to downloadable buffers.

use crate::csv::CsvOptions;
use crate::error::Result;
use crate::sheet::Sheet;

/// Worksheet name used in the exported workbook
pub const EXPORT_SHEET_NAME: &str = "Consolidado";

pub const XLSX_FILENAME: &str = "consolidado.xlsx";
pub const XLSX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub const CSV_FILENAME: &str = "consolidado.csv";
pub const CSV_MIME: &str = "text/csv";

/// UTF-8 byte order mark, prepended to CSV exports so spreadsheet tools
/// pick the right encoding on open.
const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Serialize the sheet into a single-worksheet xlsx buffer.
///
/// Text cells are scrubbed of control characters first: the format rejects
/// them and a single stray byte must not fail the whole export.
pub fn export_xlsx(sheet: &Sheet) -> Result<Vec<u8>> {
    let mut cleaned = sheet.clone();
    cleaned.sanitize_text_cells()?;
    cleaned.to_xlsx_buffer(EXPORT_SHEET_NAME)
}

/// Serialize the sheet into a comma-delimited UTF-8 buffer with a BOM.
pub fn export_csv(sheet: &Sheet) -> Result<Vec<u8>> {
    let mut cleaned = sheet.clone();
    cleaned.sanitize_text_cells()?;

    let mut buffer: Vec<u8> = UTF8_BOM.to_vec();
    cleaned.write_delimited(&mut buffer, &CsvOptions::default())?;
    Ok(buffer)
}
