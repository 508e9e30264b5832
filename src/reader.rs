//! Per-file format dispatch.
//!
//! A [`SourceFile`] is a filename plus raw bytes; the extension decides the
//! parse strategy. Text formats go through encoding/delimiter detection,
//! workbook formats through calamine, and `.xls` files that turn out to be
//! HTML in disguise fall back to the table scraper.

use crate::csv::CsvOptions;
use crate::detect::{decode_strict, detect_delimiter, encoding_candidates, DELIMITER_CANDIDATES, SAMPLE_BYTES};
use crate::error::{ConsolidaError, Result};
use crate::sheet::Sheet;
use crate::xlsx::{SheetSelector, WorkbookFormat};

/// One uploaded file: its name (used for dispatch and provenance) and its
/// raw bytes.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        SourceFile {
            name: name.into(),
            bytes,
        }
    }

    /// Lowercased extension, empty when the name has none
    #[must_use]
    pub fn extension(&self) -> String {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default()
    }
}

/// Parse a single file into a sheet with the first row named as header.
///
/// `.csv` and `.txt` use statistical delimiter detection; `.tsv` forces
/// tab; `.xlsx`/`.xls` read the worksheet chosen by `selector`, with an
/// HTML-table fallback when the bytes are not a real workbook.
pub fn read_source(file: &SourceFile, selector: &SheetSelector) -> Result<Sheet> {
    match file.extension().as_str() {
        "csv" | "txt" => read_delimited(file, None),
        "tsv" => read_delimited(file, Some(b'\t')),
        "xlsx" => read_workbook(file, WorkbookFormat::Xlsx, selector),
        "xls" => read_workbook(file, WorkbookFormat::Xls, selector),
        extension => Err(ConsolidaError::UnsupportedFormat {
            extension: extension.to_string(),
        }),
    }
}

fn read_delimited(file: &SourceFile, forced_delimiter: Option<u8>) -> Result<Sheet> {
    let sample = &file.bytes[..file.bytes.len().min(SAMPLE_BYTES)];
    let delimiter = forced_delimiter.unwrap_or_else(|| detect_delimiter(sample));
    let candidates = encoding_candidates(&file.bytes);

    // First text that decodes cleanly, kept for delimiter escalation
    let mut first_decoded: Option<String> = None;

    for &encoding in &candidates {
        let Some(text) = decode_strict(&file.bytes, encoding) else {
            continue;
        };

        if let Ok(sheet) = parse_text(&text, delimiter) {
            if sheet.col_count() > 1 {
                tracing::debug!(
                    file = %file.name,
                    encoding = encoding.name(),
                    delimiter = %(delimiter as char),
                    "parsed delimited file"
                );
                return Ok(sheet);
            }
        }
        if first_decoded.is_none() {
            first_decoded = Some(text);
        }
    }

    let Some(text) = first_decoded else {
        let tried = candidates
            .iter()
            .map(|e| e.name())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(ConsolidaError::DecodeFailure { tried });
    };

    // Single-column result: retry each fixed delimiter before accepting it
    for &candidate in &DELIMITER_CANDIDATES {
        if candidate == delimiter {
            continue;
        }
        if let Ok(sheet) = parse_text(&text, candidate) {
            if sheet.col_count() > 1 {
                tracing::debug!(
                    file = %file.name,
                    delimiter = %(candidate as char),
                    "delimiter escalation succeeded"
                );
                return Ok(sheet);
            }
        }
    }

    parse_text(&text, delimiter)
}

fn parse_text(text: &str, delimiter: u8) -> Result<Sheet> {
    let options = CsvOptions::default().with_delimiter(delimiter);
    let mut sheet = Sheet::from_delimited_str(text, &options)?;
    if sheet.row_count() > 0 {
        sheet.name_columns_by_row(0)?;
    }
    Ok(sheet)
}

fn read_workbook(
    file: &SourceFile,
    format: WorkbookFormat,
    selector: &SheetSelector,
) -> Result<Sheet> {
    match Sheet::from_workbook_bytes(&file.bytes, format, selector) {
        Ok(sheet) => Ok(sheet),
        Err(ConsolidaError::NotAWorkbook { .. }) => {
            tracing::warn!(file = %file.name, "not a workbook, trying HTML table fallback");
            read_html_fallback(file)
        }
        Err(e) => Err(e),
    }
}

fn read_html_fallback(file: &SourceFile) -> Result<Sheet> {
    for encoding in encoding_candidates(&file.bytes) {
        let Some(text) = decode_strict(&file.bytes, encoding) else {
            continue;
        };
        if let Ok(sheet) = Sheet::from_html_str(&text) {
            return Ok(sheet);
        }
    }
    Err(ConsolidaError::Parse(format!(
        "{} is neither a workbook nor an HTML table",
        file.name
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;

    fn csv_file(name: &str, content: &str) -> SourceFile {
        SourceFile::new(name, content.as_bytes().to_vec())
    }

    #[test]
    fn test_extension_lowercased() {
        assert_eq!(csv_file("Data.CSV", "").extension(), "csv");
        assert_eq!(csv_file("noext", "").extension(), "");
    }

    #[test]
    fn test_read_csv_with_detected_semicolon() {
        let file = csv_file("ventas.csv", "región;monto\nnorte;10\nsur;20");
        let sheet = read_source(&file, &SheetSelector::First).unwrap();

        assert_eq!(sheet.col_count(), 2);
        assert_eq!(sheet.body_row_count(), 2);
        assert_eq!(sheet.get_by_name(1, "monto").unwrap(), &CellValue::Int(10));
    }

    #[test]
    fn test_read_tsv_forces_tab() {
        // Commas inside fields must not trigger comma splitting
        let file = csv_file("data.tsv", "name\tnote\nAlice\thello, world");
        let sheet = read_source(&file, &SheetSelector::First).unwrap();

        assert_eq!(sheet.col_count(), 2);
        assert_eq!(
            sheet.get_by_name(1, "note").unwrap(),
            &CellValue::String("hello, world".to_string())
        );
    }

    #[test]
    fn test_read_latin1_bytes() {
        // "región,monto\nnorte,1" in windows-1252 (0xF3 = ó)
        let mut bytes = b"regi".to_vec();
        bytes.push(0xF3);
        bytes.extend_from_slice(b"n,monto\nnorte,1");
        let file = SourceFile::new("l1.csv", bytes);

        let sheet = read_source(&file, &SheetSelector::First).unwrap();
        assert_eq!(
            sheet.column_names(),
            Some(&vec!["región".to_string(), "monto".to_string()])
        );
    }

    #[test]
    fn test_unsupported_extension() {
        let file = csv_file("notes.pdf", "whatever");
        let result = read_source(&file, &SheetSelector::First);
        assert!(matches!(
            result,
            Err(ConsolidaError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_xls_html_fallback() {
        let html = "<html><table>\
            <tr><th>a</th><th>b</th></tr>\
            <tr><td>1</td><td>2</td></tr>\
            </table></html>";
        let file = SourceFile::new("reporte.xls", html.as_bytes().to_vec());

        let sheet = read_source(&file, &SheetSelector::First).unwrap();
        assert_eq!(sheet.col_count(), 2);
        assert_eq!(sheet.get_by_name(1, "b").unwrap(), &CellValue::Int(2));
    }

    #[test]
    fn test_workbook_roundtrip_through_reader() {
        let sheet = Sheet::from_data(vec![vec!["x", "y"], vec!["1", "2"]]);
        let bytes = sheet.to_xlsx_buffer("Hoja1").unwrap();
        let file = SourceFile::new("libro.xlsx", bytes);

        let loaded = read_source(&file, &SheetSelector::First).unwrap();
        assert_eq!(loaded.col_count(), 2);
        assert_eq!(loaded.get_by_name(1, "y").unwrap(), &CellValue::Int(2));
    }

    #[test]
    fn test_single_column_file_is_accepted() {
        let file = csv_file("uno.csv", "valor\n1\n2");
        let sheet = read_source(&file, &SheetSelector::First).unwrap();
        assert_eq!(sheet.col_count(), 1);
        assert_eq!(sheet.body_row_count(), 2);
    }
}
