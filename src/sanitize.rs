//! Removal of control characters that spreadsheet writers reject.
//!
//! Files coming off legacy exports occasionally carry stray control bytes
//! (BEL, vertical tab, C1 range) inside text fields. The xlsx format refuses
//! them, so every text cell is scrubbed before export.

use crate::cell::CellValue;
use crate::error::Result;
use crate::sheet::Sheet;

/// Characters stripped from text cells: C0 controls except tab/newline/CR,
/// DEL, and the C1 range.
fn is_illegal_char(c: char) -> bool {
    matches!(c,
        '\u{00}'..='\u{08}'
        | '\u{0B}'
        | '\u{0C}'
        | '\u{0E}'..='\u{1F}'
        | '\u{7F}'..='\u{9F}'
    )
}

/// Remove illegal control characters from a string. Allocates only the
/// output; legal characters pass through unchanged.
#[must_use]
pub fn strip_illegal_chars(text: &str) -> String {
    text.chars().filter(|c| !is_illegal_char(*c)).collect()
}

/// Scrub a single cell. Only string cells can carry control characters;
/// every other variant is returned as-is.
#[must_use]
pub fn sanitize_cell(cell: &CellValue) -> CellValue {
    match cell {
        CellValue::String(s) => CellValue::String(strip_illegal_chars(s)),
        other => other.clone(),
    }
}

impl Sheet {
    /// Scrub every text cell in the sheet, header row included.
    pub fn sanitize_text_cells(&mut self) -> Result<()> {
        self.map(sanitize_cell);
        // Header strings live in the column index too
        if self.column_names().is_some() && self.row_count() > 0 {
            self.name_columns_by_row(0)?;
        }
        Ok(())
    }
}
