use crate::cell::CellValue;
use crate::error::{ConsolidaError, Result};
use crate::sheet::Sheet;
use calamine::{Data, Reader, Xls, Xlsx};
use rust_xlsxwriter::Workbook;
use std::io::Cursor;

/// Which worksheet of a workbook to read. Applied uniformly to every
/// spreadsheet file in a batch.
#[derive(Debug, Clone, Default)]
pub enum SheetSelector {
    /// The first sheet in workbook order
    #[default]
    First,
    /// A sheet by name
    Name(String),
    /// A sheet by zero-based index
    Index(usize),
}

/// Binary workbook flavor, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbookFormat {
    Xlsx,
    Xls,
}

impl WorkbookFormat {
    fn label(self) -> &'static str {
        match self {
            WorkbookFormat::Xlsx => "xlsx",
            WorkbookFormat::Xls => "xls",
        }
    }
}

/// Convert a calamine cell to a CellValue
fn data_to_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Null,
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => CellValue::String(s.clone()),
        // Excel stores dates as serial day numbers; keep the raw number
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::String(format!("#ERROR: {e:?}")),
    }
}

fn resolve_sheet_name(names: &[String], selector: &SheetSelector) -> Result<String> {
    match selector {
        SheetSelector::First => names
            .first()
            .cloned()
            .ok_or_else(|| ConsolidaError::SheetNotFound {
                name: "index 0".to_string(),
            }),
        SheetSelector::Name(name) => {
            if names.iter().any(|n| n == name) {
                Ok(name.clone())
            } else {
                Err(ConsolidaError::SheetNotFound { name: name.clone() })
            }
        }
        SheetSelector::Index(index) => {
            names
                .get(*index)
                .cloned()
                .ok_or_else(|| ConsolidaError::SheetNotFound {
                    name: format!("index {index}"),
                })
        }
    }
}

impl Sheet {
    /// Read one worksheet from in-memory workbook bytes, forcing the first
    /// row as header.
    ///
    /// Open failures come back as [`ConsolidaError::NotAWorkbook`] so the
    /// caller can distinguish HTML-disguised files from genuine corruption.
    pub fn from_workbook_bytes(
        bytes: &[u8],
        format: WorkbookFormat,
        selector: &SheetSelector,
    ) -> Result<Self> {
        let cursor = Cursor::new(bytes);

        let (sheet_name, range) = match format {
            WorkbookFormat::Xlsx => {
                let mut workbook: Xlsx<_> =
                    Xlsx::new(cursor).map_err(|e| ConsolidaError::NotAWorkbook {
                        format: format.label().to_string(),
                        detail: e.to_string(),
                    })?;
                let names = workbook.sheet_names().to_vec();
                let target = resolve_sheet_name(&names, selector)?;
                let range = workbook
                    .worksheet_range(&target)
                    .map_err(|e| ConsolidaError::Parse(e.to_string()))?;
                (target, range)
            }
            WorkbookFormat::Xls => {
                let mut workbook: Xls<_> =
                    Xls::new(cursor).map_err(|e| ConsolidaError::NotAWorkbook {
                        format: format.label().to_string(),
                        detail: e.to_string(),
                    })?;
                let names = workbook.sheet_names().to_vec();
                let target = resolve_sheet_name(&names, selector)?;
                let range = workbook
                    .worksheet_range(&target)
                    .map_err(|e| ConsolidaError::Parse(e.to_string()))?;
                (target, range)
            }
        };

        let mut data: Vec<Vec<CellValue>> = Vec::new();
        for row in range.rows() {
            data.push(row.iter().map(data_to_cell_value).collect());
        }

        let mut sheet = Sheet::with_name(&sheet_name);
        *sheet.data_mut() = data;
        sheet.make_rectangular();

        if sheet.row_count() > 0 {
            sheet.name_columns_by_row(0)?;
        }

        Ok(sheet)
    }

    /// Serialize the sheet (header row included) into a single-worksheet
    /// xlsx byte buffer.
    pub fn to_xlsx_buffer(&self, worksheet_name: &str) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        worksheet
            .set_name(worksheet_name)
            .map_err(|e| ConsolidaError::ExportFailure(e.to_string()))?;

        for (row_idx, row) in self.data().iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                let row_num = u32::try_from(row_idx)
                    .map_err(|_| ConsolidaError::ExportFailure("Row index overflow".to_string()))?;
                let col_num = u16::try_from(col_idx).map_err(|_| {
                    ConsolidaError::ExportFailure("Column index overflow".to_string())
                })?;

                match cell {
                    CellValue::Null => {} // Leave empty
                    CellValue::Bool(b) => {
                        worksheet
                            .write_boolean(row_num, col_num, *b)
                            .map_err(|e| ConsolidaError::ExportFailure(e.to_string()))?;
                    }
                    // Excel stores all numbers as f64; integers beyond 2^53
                    // may lose precision
                    CellValue::Int(i) => {
                        worksheet
                            .write_number(row_num, col_num, *i as f64)
                            .map_err(|e| ConsolidaError::ExportFailure(e.to_string()))?;
                    }
                    CellValue::Float(f) => {
                        worksheet
                            .write_number(row_num, col_num, *f)
                            .map_err(|e| ConsolidaError::ExportFailure(e.to_string()))?;
                    }
                    CellValue::String(s) => {
                        worksheet
                            .write_string(row_num, col_num, s)
                            .map_err(|e| ConsolidaError::ExportFailure(e.to_string()))?;
                    }
                }
            }
        }

        workbook
            .save_to_buffer()
            .map_err(|e| ConsolidaError::ExportFailure(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workbook_roundtrip() {
        let sheet = Sheet::from_data(vec![
            vec!["Name", "Age", "Active"],
            vec!["Alice", "30", "true"],
            vec!["Bob", "25", "false"],
        ]);

        let bytes = sheet.to_xlsx_buffer("Datos").unwrap();
        let loaded =
            Sheet::from_workbook_bytes(&bytes, WorkbookFormat::Xlsx, &SheetSelector::First)
                .unwrap();

        assert_eq!(loaded.row_count(), 3);
        assert_eq!(loaded.col_count(), 3);
        assert_eq!(loaded.name(), "Datos");
        assert_eq!(
            loaded.column_names(),
            Some(&vec![
                "Name".to_string(),
                "Age".to_string(),
                "Active".to_string()
            ])
        );
    }

    #[test]
    fn test_workbook_types_survive() {
        let mut sheet = Sheet::new();
        *sheet.data_mut() = vec![
            vec![
                CellValue::String("text".to_string()),
                CellValue::String("number".to_string()),
                CellValue::String("flag".to_string()),
            ],
            vec![
                CellValue::String("abc".to_string()),
                CellValue::Float(1.5),
                CellValue::Bool(true),
            ],
        ];

        let bytes = sheet.to_xlsx_buffer("Hoja").unwrap();
        let loaded =
            Sheet::from_workbook_bytes(&bytes, WorkbookFormat::Xlsx, &SheetSelector::First)
                .unwrap();

        assert!(matches!(loaded.get(1, 0).unwrap(), CellValue::String(s) if s == "abc"));
        assert!(matches!(loaded.get(1, 1).unwrap(), CellValue::Float(f) if (*f - 1.5).abs() < f64::EPSILON));
        assert!(matches!(loaded.get(1, 2).unwrap(), CellValue::Bool(true)));
    }

    #[test]
    fn test_sheet_selector_by_name_missing() {
        let sheet = Sheet::from_data(vec![vec!["a"], vec!["1"]]);
        let bytes = sheet.to_xlsx_buffer("Solo").unwrap();

        let result = Sheet::from_workbook_bytes(
            &bytes,
            WorkbookFormat::Xlsx,
            &SheetSelector::Name("Otra".to_string()),
        );
        assert!(matches!(result, Err(ConsolidaError::SheetNotFound { .. })));
    }

    #[test]
    fn test_html_bytes_are_not_a_workbook() {
        let html = b"<html><body><table><tr><td>1</td></tr></table></body></html>";
        let result =
            Sheet::from_workbook_bytes(html, WorkbookFormat::Xlsx, &SheetSelector::First);
        assert!(matches!(result, Err(ConsolidaError::NotAWorkbook { .. })));
    }
}
