//! HTML table fallback reader.
//!
//! Some upstream systems ship `.xls` attachments that are actually HTML
//! documents with a `<table>` inside. When the workbook reader rejects the
//! bytes, the pipeline reinterprets them here and takes the first table.
//!
//! `colspan`/`rowspan` are expanded by duplicating the cell value across the
//! spanned positions so the result stays rectangular.

use crate::cell::CellValue;
use crate::error::{ConsolidaError, Result};
use crate::sheet::Sheet;
use scraper::{Html, Selector};
use std::collections::HashMap;

fn parse_table_element(table: scraper::ElementRef<'_>) -> Sheet {
    let row_selector = Selector::parse("tr").unwrap();
    let cell_selector = Selector::parse("th, td").unwrap();

    // Cells claimed by a rowspan from an earlier row: (row, col) -> value
    let mut occupied: HashMap<(usize, usize), CellValue> = HashMap::new();
    let mut rows: Vec<Vec<CellValue>> = Vec::new();

    for (row_index, row) in table.select(&row_selector).enumerate() {
        let mut row_data = Vec::new();
        let mut col_index = 0;

        for cell in row.select(&cell_selector) {
            while let Some(value) = occupied.remove(&(row_index, col_index)) {
                row_data.push(value);
                col_index += 1;
            }

            let text: String = cell.text().collect::<String>().trim().to_string();
            let colspan = span_attr(&cell, "colspan");
            let rowspan = span_attr(&cell, "rowspan");

            // th cells are headers regardless of content
            let value = if cell.value().name() == "th" {
                CellValue::String(text)
            } else {
                CellValue::parse(&text)
            };

            for col_offset in 0..colspan {
                row_data.push(value.clone());
                for row_offset in 1..rowspan {
                    occupied.insert((row_index + row_offset, col_index + col_offset), value.clone());
                }
            }
            col_index += colspan;
        }

        // Trailing cells claimed by rowspans from earlier rows
        while let Some(value) = occupied.remove(&(row_index, col_index)) {
            row_data.push(value);
            col_index += 1;
        }

        if !row_data.is_empty() {
            rows.push(row_data);
        }
    }

    let mut sheet = Sheet::new();
    *sheet.data_mut() = rows;
    sheet.make_rectangular();
    sheet
}

fn span_attr(cell: &scraper::ElementRef<'_>, name: &str) -> usize {
    cell.value()
        .attr(name)
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(1)
        .max(1)
}

impl Sheet {
    /// Parse the first `<table>` found in an HTML document, forcing the
    /// first row as header.
    pub fn from_html_str(html_content: &str) -> Result<Self> {
        let document = Html::parse_document(html_content);
        let table_selector = Selector::parse("table").unwrap();

        let table = document
            .select(&table_selector)
            .next()
            .ok_or_else(|| ConsolidaError::Parse("No table found in HTML".to_string()))?;

        let mut sheet = parse_table_element(table);
        if sheet.row_count() > 0 {
            sheet.name_columns_by_row(0)?;
        }

        Ok(sheet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_table() {
        let html = r"
            <table>
                <tr><th>Name</th><th>Age</th></tr>
                <tr><td>Alice</td><td>30</td></tr>
                <tr><td>Bob</td><td>25</td></tr>
            </table>
        ";

        let sheet = Sheet::from_html_str(html).unwrap();

        assert_eq!(sheet.row_count(), 3);
        assert_eq!(sheet.col_count(), 2);
        assert_eq!(
            sheet.column_names(),
            Some(&vec!["Name".to_string(), "Age".to_string()])
        );
        assert_eq!(sheet.get(1, 1).unwrap(), &CellValue::Int(30));
    }

    #[test]
    fn test_first_table_wins() {
        let html = r"
            <table><tr><th>A</th></tr><tr><td>1</td></tr></table>
            <table><tr><th>X</th></tr><tr><td>9</td></tr></table>
        ";

        let sheet = Sheet::from_html_str(html).unwrap();
        assert_eq!(sheet.column_names(), Some(&vec!["A".to_string()]));
        assert_eq!(sheet.get(1, 0).unwrap(), &CellValue::Int(1));
    }

    #[test]
    fn test_rowspan_duplicates_value() {
        let html = r#"
            <table>
                <tr><th>Name</th><th>Role</th></tr>
                <tr><td rowspan="2">Alice</td><td>Engineer</td></tr>
                <tr><td>Senior</td></tr>
            </table>
        "#;

        let sheet = Sheet::from_html_str(html).unwrap();

        assert_eq!(sheet.row_count(), 3);
        assert_eq!(
            sheet.get(2, 0).unwrap(),
            &CellValue::String("Alice".to_string())
        );
        assert_eq!(
            sheet.get(2, 1).unwrap(),
            &CellValue::String("Senior".to_string())
        );
    }

    #[test]
    fn test_colspan_expands() {
        let html = r#"
            <table>
                <tr><th>a</th><th>b</th></tr>
                <tr><td colspan="2">wide</td></tr>
            </table>
        "#;

        let sheet = Sheet::from_html_str(html).unwrap();
        assert_eq!(sheet.col_count(), 2);
        assert_eq!(
            sheet.get(1, 1).unwrap(),
            &CellValue::String("wide".to_string())
        );
    }

    #[test]
    fn test_no_table_is_error() {
        let result = Sheet::from_html_str("<div>No table here</div>");
        assert!(matches!(result, Err(ConsolidaError::Parse(_))));
    }
}
