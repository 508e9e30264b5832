use crate::cell::CellValue;
use crate::error::{ConsolidaError, Result};
use std::collections::HashMap;

/// A sheet representing a 2D grid of cells (row-major storage).
///
/// When columns are named (via [`Sheet::name_columns_by_row`]) the header
/// row stays in `data` at index 0 and data rows follow it. Duplicate column
/// names are tolerated: lookups resolve to the first occurrence.
#[derive(Debug, Clone)]
pub struct Sheet {
    name: String,
    data: Vec<Vec<CellValue>>,
    column_names: Option<Vec<String>>,
    column_index: Option<HashMap<String, usize>>,
}

impl Sheet {
    /// Create a new empty sheet
    #[must_use]
    pub fn new() -> Self {
        Self::with_name("Sheet1")
    }

    /// Create a new empty sheet with a name
    #[must_use]
    pub fn with_name(name: &str) -> Self {
        Sheet {
            name: name.to_string(),
            data: Vec::new(),
            column_names: None,
            column_index: None,
        }
    }

    /// Create a sheet from a 2D vector of values
    #[must_use]
    pub fn from_data<T: Into<CellValue> + Clone>(data: Vec<Vec<T>>) -> Self {
        let converted: Vec<Vec<CellValue>> = data
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();

        Sheet {
            name: "Sheet1".to_string(),
            data: converted,
            column_names: None,
            column_index: None,
        }
    }

    /// Get the sheet name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the sheet name
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Get the number of rows (header row included when columns are named)
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    /// Get the number of data rows, excluding the header row if named
    #[must_use]
    pub fn body_row_count(&self) -> usize {
        self.data.len().saturating_sub(self.header_offset())
    }

    /// Get the number of columns
    #[must_use]
    pub fn col_count(&self) -> usize {
        self.data.first().map_or(0, Vec::len)
    }

    /// Check if the sheet has no rows at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row index where data starts: 1 when a header row is named, else 0
    #[must_use]
    pub fn header_offset(&self) -> usize {
        usize::from(self.column_names.is_some() && !self.data.is_empty())
    }

    // ===== Cell Access =====

    /// Get a cell value by row and column index (0-based)
    pub fn get(&self, row: usize, col: usize) -> Result<&CellValue> {
        self.data
            .get(row)
            .and_then(|r| r.get(col))
            .ok_or(ConsolidaError::IndexOutOfBounds {
                row,
                col,
                rows: self.row_count(),
                cols: self.col_count(),
            })
    }

    /// Set a cell value by row and column index (0-based)
    pub fn set<T: Into<CellValue>>(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        let rows = self.row_count();
        let cols = self.col_count();
        let cell = self
            .data
            .get_mut(row)
            .and_then(|r| r.get_mut(col))
            .ok_or(ConsolidaError::IndexOutOfBounds {
                row,
                col,
                rows,
                cols,
            })?;
        *cell = value.into();
        Ok(())
    }

    /// Get a cell value by row index and column name
    pub fn get_by_name(&self, row: usize, col_name: &str) -> Result<&CellValue> {
        let col = self.column_index_by_name(col_name)?;
        self.get(row, col)
    }

    // ===== Row Operations =====

    /// Get an entire row by index (0-based)
    pub fn row(&self, index: usize) -> Result<&Vec<CellValue>> {
        self.data
            .get(index)
            .ok_or(ConsolidaError::RowIndexOutOfBounds {
                index,
                count: self.row_count(),
            })
    }

    /// Append a row to the end of the sheet
    pub fn row_append<T: Into<CellValue>>(&mut self, data: Vec<T>) -> Result<()> {
        let row: Vec<CellValue> = data.into_iter().map(Into::into).collect();

        if !self.data.is_empty() && row.len() != self.col_count() {
            return Err(ConsolidaError::LengthMismatch {
                expected: self.col_count(),
                actual: row.len(),
            });
        }

        self.data.push(row);
        Ok(())
    }

    /// Remove rows whose every cell is missing or an empty string.
    /// The header row (if named) is kept. Returns the number removed.
    pub fn remove_blank_rows(&mut self) -> usize {
        let offset = self.header_offset();
        let before = self.data.len();

        let mut kept = Vec::with_capacity(self.data.len());
        for (i, row) in self.data.drain(..).enumerate() {
            if i < offset || !row.iter().all(CellValue::is_blank) {
                kept.push(row);
            }
        }
        self.data = kept;
        before - self.data.len()
    }

    /// Pad short rows with Null and trim overlong rows so every row matches
    /// the widest one. Readers call this before headers are interpreted.
    pub fn make_rectangular(&mut self) {
        let width = self.data.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut self.data {
            row.resize(width, CellValue::Null);
        }
    }

    // ===== Column Operations =====

    /// Get an entire column by index (0-based)
    pub fn column(&self, index: usize) -> Result<Vec<CellValue>> {
        if index >= self.col_count() {
            return Err(ConsolidaError::ColumnIndexOutOfBounds {
                index,
                count: self.col_count(),
            });
        }

        Ok(self
            .data
            .iter()
            .map(|row| row.get(index).cloned().unwrap_or(CellValue::Null))
            .collect())
    }

    /// Get an entire column by name (first occurrence on duplicates)
    pub fn column_by_name(&self, name: &str) -> Result<Vec<CellValue>> {
        let index = self.column_index_by_name(name)?;
        self.column(index)
    }

    /// Append a column with the given name and per-data-row values.
    /// The header cell is added when the sheet has named columns.
    pub fn column_append_named(&mut self, name: &str, values: Vec<CellValue>) -> Result<()> {
        if values.len() != self.body_row_count() {
            return Err(ConsolidaError::LengthMismatch {
                expected: self.body_row_count(),
                actual: values.len(),
            });
        }

        let offset = self.header_offset();
        if offset == 1 {
            self.data[0].push(CellValue::String(name.to_string()));
        }
        for (row, value) in self.data.iter_mut().skip(offset).zip(values) {
            row.push(value);
        }

        if let Some(names) = &mut self.column_names {
            names.push(name.to_string());
            self.rebuild_column_index();
        }
        Ok(())
    }

    /// Apply a function to every cell of a column, skipping the header row
    pub fn column_map<F>(&mut self, col_index: usize, f: F) -> Result<()>
    where
        F: Fn(&CellValue) -> CellValue,
    {
        if col_index >= self.col_count() {
            return Err(ConsolidaError::ColumnIndexOutOfBounds {
                index: col_index,
                count: self.col_count(),
            });
        }

        let offset = self.header_offset();
        for row in self.data.iter_mut().skip(offset) {
            if let Some(cell) = row.get_mut(col_index) {
                *cell = f(cell);
            }
        }
        Ok(())
    }

    /// Remove columns at the specified indices
    pub fn remove_columns_at(&mut self, indices: &[usize]) -> Result<()> {
        for &index in indices {
            if index >= self.col_count() {
                return Err(ConsolidaError::ColumnIndexOutOfBounds {
                    index,
                    count: self.col_count(),
                });
            }
        }

        // Descending order so positions stay valid during removal
        let mut sorted: Vec<usize> = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        sorted.reverse();

        for row in &mut self.data {
            for &index in &sorted {
                row.remove(index);
            }
        }

        if let Some(names) = &mut self.column_names {
            for &index in &sorted {
                names.remove(index);
            }
            self.rebuild_column_index();
        }
        Ok(())
    }

    /// Reorder columns to match the target name order.
    /// Every target name must exist in this sheet.
    pub fn reorder_columns(&mut self, target: &[String]) -> Result<()> {
        let indices: Vec<usize> = target
            .iter()
            .map(|name| self.column_index_by_name(name))
            .collect::<Result<Vec<_>>>()?;

        for row in &mut self.data {
            let reordered: Vec<CellValue> = indices
                .iter()
                .map(|&i| row.get(i).cloned().unwrap_or(CellValue::Null))
                .collect();
            *row = reordered;
        }

        self.column_names = Some(target.to_vec());
        self.rebuild_column_index();
        Ok(())
    }

    // ===== Named Access =====

    /// Use the specified row as column headers.
    ///
    /// Duplicate names are tolerated: the index maps each name to its first
    /// occurrence (schema comparison works on sets of names).
    pub fn name_columns_by_row(&mut self, row_index: usize) -> Result<()> {
        let header_row = self.row(row_index)?;
        let names: Vec<String> = header_row.iter().map(CellValue::as_str).collect();

        self.column_names = Some(names);
        self.rebuild_column_index();
        Ok(())
    }

    /// Rename all columns, rewriting the header row to match
    pub fn rename_columns(&mut self, names: Vec<String>) -> Result<()> {
        if names.len() != self.col_count() {
            return Err(ConsolidaError::LengthMismatch {
                expected: self.col_count(),
                actual: names.len(),
            });
        }

        if self.header_offset() == 1 {
            self.data[0] = names
                .iter()
                .map(|n| CellValue::String(n.clone()))
                .collect();
        }
        self.column_names = Some(names);
        self.rebuild_column_index();
        Ok(())
    }

    /// Get column names (if set)
    #[must_use]
    pub fn column_names(&self) -> Option<&Vec<String>> {
        self.column_names.as_ref()
    }

    /// Get the column index by name (first occurrence on duplicates)
    pub fn column_index_by_name(&self, name: &str) -> Result<usize> {
        self.column_index
            .as_ref()
            .ok_or_else(|| {
                ConsolidaError::ColumnsNotNamed("Call name_columns_by_row() first".to_string())
            })?
            .get(name)
            .copied()
            .ok_or_else(|| ConsolidaError::ColumnNotFound {
                name: name.to_string(),
            })
    }

    fn rebuild_column_index(&mut self) {
        self.column_index = self.column_names.as_ref().map(|names| {
            let mut index_map = HashMap::new();
            for (i, name) in names.iter().enumerate() {
                index_map.entry(name.clone()).or_insert(i);
            }
            index_map
        });
    }

    // ===== Transformation =====

    /// Apply a function to all cells
    pub fn map<F>(&mut self, f: F)
    where
        F: Fn(&CellValue) -> CellValue,
    {
        for row in &mut self.data {
            for cell in row {
                *cell = f(cell);
            }
        }
    }

    // ===== Conversion =====

    /// Get data rows (excluding the header row if named)
    pub fn body_rows(&self) -> impl Iterator<Item = &Vec<CellValue>> {
        self.data.iter().skip(self.header_offset())
    }

    /// Get internal data reference
    #[must_use]
    pub fn data(&self) -> &Vec<Vec<CellValue>> {
        &self.data
    }

    /// Get mutable internal data reference
    pub fn data_mut(&mut self) -> &mut Vec<Vec<CellValue>> {
        &mut self.data
    }
}

impl Default for Sheet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_data() {
        let sheet = Sheet::from_data(vec![vec![1, 2, 3], vec![4, 5, 6]]);
        assert_eq!(sheet.row_count(), 2);
        assert_eq!(sheet.col_count(), 3);
        assert_eq!(sheet.get(1, 2).unwrap(), &CellValue::Int(6));
    }

    #[test]
    fn test_name_columns_tolerates_duplicates() {
        let mut sheet = Sheet::from_data(vec![vec!["a", "b", "a"], vec!["1", "2", "3"]]);
        sheet.name_columns_by_row(0).unwrap();

        // First occurrence wins
        assert_eq!(sheet.column_index_by_name("a").unwrap(), 0);
        assert_eq!(sheet.column_index_by_name("b").unwrap(), 1);
    }

    #[test]
    fn test_body_rows_skip_header() {
        let mut sheet = Sheet::from_data(vec![vec!["x", "y"], vec!["1", "2"]]);
        sheet.name_columns_by_row(0).unwrap();

        assert_eq!(sheet.body_row_count(), 1);
        assert_eq!(sheet.body_rows().count(), 1);
    }

    #[test]
    fn test_remove_blank_rows() {
        let mut sheet = Sheet::from_data(vec![
            vec![
                CellValue::String("x".to_string()),
                CellValue::String("y".to_string()),
            ],
            vec![CellValue::Null, CellValue::String(String::new())],
            vec![CellValue::Int(1), CellValue::Null],
        ]);
        sheet.name_columns_by_row(0).unwrap();

        let removed = sheet.remove_blank_rows();
        assert_eq!(removed, 1);
        assert_eq!(sheet.body_row_count(), 1);
        assert_eq!(sheet.get_by_name(1, "x").unwrap(), &CellValue::Int(1));
    }

    #[test]
    fn test_remove_blank_rows_keeps_header() {
        let mut sheet = Sheet::from_data(vec![
            vec![CellValue::String("h".to_string())],
            vec![CellValue::Null],
        ]);
        sheet.name_columns_by_row(0).unwrap();

        sheet.remove_blank_rows();
        assert_eq!(sheet.row_count(), 1);
        assert_eq!(sheet.body_row_count(), 0);
    }

    #[test]
    fn test_make_rectangular() {
        let mut sheet = Sheet::new();
        sheet.data_mut().push(vec![CellValue::Int(1), CellValue::Int(2)]);
        sheet.data_mut().push(vec![CellValue::Int(3)]);
        sheet.make_rectangular();

        assert_eq!(sheet.col_count(), 2);
        assert_eq!(sheet.get(1, 1).unwrap(), &CellValue::Null);
    }

    #[test]
    fn test_reorder_columns() {
        let mut sheet = Sheet::from_data(vec![vec!["y", "x"], vec!["2", "1"]]);
        sheet.name_columns_by_row(0).unwrap();

        sheet
            .reorder_columns(&["x".to_string(), "y".to_string()])
            .unwrap();

        assert_eq!(
            sheet.column_names(),
            Some(&vec!["x".to_string(), "y".to_string()])
        );
        assert_eq!(sheet.get(1, 0).unwrap(), &CellValue::Int(1));
        assert_eq!(sheet.get(1, 1).unwrap(), &CellValue::Int(2));
    }

    #[test]
    fn test_remove_columns_at() {
        let mut sheet = Sheet::from_data(vec![vec!["a", "b", "c"], vec!["1", "2", "3"]]);
        sheet.name_columns_by_row(0).unwrap();

        sheet.remove_columns_at(&[1]).unwrap();
        assert_eq!(sheet.col_count(), 2);
        assert_eq!(
            sheet.column_names(),
            Some(&vec!["a".to_string(), "c".to_string()])
        );
        assert_eq!(sheet.get(1, 1).unwrap(), &CellValue::Int(3));
    }

    #[test]
    fn test_column_append_named() {
        let mut sheet = Sheet::from_data(vec![vec!["a"], vec!["1"], vec!["2"]]);
        sheet.name_columns_by_row(0).unwrap();

        sheet
            .column_append_named(
                "origen",
                vec![
                    CellValue::String("f.csv".to_string()),
                    CellValue::String("f.csv".to_string()),
                ],
            )
            .unwrap();

        assert_eq!(sheet.col_count(), 2);
        assert_eq!(
            sheet.get_by_name(1, "origen").unwrap(),
            &CellValue::String("f.csv".to_string())
        );
    }

    #[test]
    fn test_row_length_mismatch() {
        let mut sheet = Sheet::from_data(vec![vec![1, 2, 3]]);
        let result = sheet.row_append(vec![1, 2]);
        assert!(matches!(
            result,
            Err(ConsolidaError::LengthMismatch { .. })
        ));
    }
}
