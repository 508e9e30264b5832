use consolida::{
    consolidate_files, detect_delimiter, export_csv, export_xlsx, CellValue, ConsolidateOptions,
    Sheet, SheetSelector, SourceFile, WorkbookFormat, EXPORT_SHEET_NAME,
};
use tempfile::tempdir;

fn csv_file(name: &str, content: &str) -> SourceFile {
    SourceFile::new(name, content.as_bytes().to_vec())
}

// ===== Delimiter Detection Tests =====

#[test]
fn test_comma_is_default() {
    assert_eq!(detect_delimiter(b"single column\nno delimiters"), b',');
}

#[test]
fn test_majority_delimiter_wins() {
    assert_eq!(detect_delimiter(b"a;b;c\n1;2;3"), b';');
    assert_eq!(detect_delimiter(b"a|b|c\n1|2|3"), b'|');
}

#[test]
fn test_detection_drives_parsing() {
    let files = vec![
        csv_file("comas.csv", "x,y\n1,2"),
        csv_file("puntoycoma.csv", "x;y\n3;4"),
        csv_file("pipes.csv", "x|y\n5|6"),
    ];

    let result = consolidate_files(&files, &ConsolidateOptions::default());

    assert_eq!(result.accepted, 3);
    assert_eq!(result.sheet.get_by_name(3, "y").unwrap(), &CellValue::Int(6));
}

// ===== Encoding Tests =====

#[test]
fn test_utf8_bom_input() {
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice("región,monto\nñandú,1".as_bytes());

    let result = consolidate_files(
        &[SourceFile::new("bom.csv", bytes)],
        &ConsolidateOptions::default(),
    );

    assert_eq!(result.accepted, 1);
    assert_eq!(
        result.sheet.get_by_name(1, "region").unwrap(),
        &CellValue::String("ñandú".to_string())
    );
}

#[test]
fn test_windows_1252_fallback() {
    // 0xD1 is Ñ in windows-1252 and invalid as a UTF-8 start of "N,"
    let mut bytes = vec![b'a', b',', b'b', b'\n', 0xD1];
    bytes.extend_from_slice(b"o,2");

    let result = consolidate_files(
        &[SourceFile::new("cp1252.csv", bytes)],
        &ConsolidateOptions::default(),
    );

    assert_eq!(result.accepted, 1);
    assert_eq!(
        result.sheet.get_by_name(1, "a").unwrap(),
        &CellValue::String("Ño".to_string())
    );
}

// ===== Export Tests =====

#[test]
fn test_xlsx_export_roundtrip() {
    let files = vec![
        csv_file("a.csv", "región,monto\nnorte,10"),
        csv_file("b.csv", "región,monto\nsur,20"),
    ];
    let result = consolidate_files(&files, &ConsolidateOptions::default());

    let bytes = export_xlsx(&result.sheet).unwrap();
    let loaded = Sheet::from_workbook_bytes(
        &bytes,
        WorkbookFormat::Xlsx,
        &SheetSelector::Name(EXPORT_SHEET_NAME.to_string()),
    )
    .unwrap();

    assert_eq!(loaded.body_row_count(), 2);
    assert_eq!(
        loaded.column_names(),
        Some(&vec![
            "archivo_origen".to_string(),
            "region".to_string(),
            "monto".to_string(),
        ])
    );
    assert_eq!(loaded.get_by_name(2, "monto").unwrap(), &CellValue::Int(20));
    assert_eq!(
        loaded.get_by_name(1, "archivo_origen").unwrap(),
        &CellValue::String("a.csv".to_string())
    );
}

#[test]
fn test_exported_file_feeds_back_into_pipeline() {
    let dir = tempdir().unwrap();

    let first = consolidate_files(
        &[csv_file("a.csv", "x\n1\n2")],
        &ConsolidateOptions::default(),
    );
    let path = dir.path().join("consolidado.xlsx");
    std::fs::write(&path, export_xlsx(&first.sheet).unwrap()).unwrap();

    // Read the export back as a new input file
    let bytes = std::fs::read(&path).unwrap();
    let second = consolidate_files(
        &[SourceFile::new("consolidado.xlsx", bytes)],
        &ConsolidateOptions::default(),
    );

    assert_eq!(second.accepted, 1);
    assert_eq!(second.sheet.body_row_count(), 2);
    // Spreadsheet numbers come back as floats
    assert_eq!(second.sheet.get_by_name(1, "x").unwrap().as_int(), Some(1));
}

#[test]
fn test_csv_export_roundtrip() {
    let files = vec![csv_file("a.csv", "región,monto\nñu,1")];
    let result = consolidate_files(&files, &ConsolidateOptions::default());

    let bytes = export_csv(&result.sheet).unwrap();
    assert!(bytes.starts_with(&[0xEF, 0xBB, 0xBF]));

    let reparsed = consolidate_files(
        &[SourceFile::new("export.csv", bytes)],
        &ConsolidateOptions::default(),
    );
    assert_eq!(reparsed.accepted, 1);
    assert_eq!(
        reparsed.sheet.get_by_name(1, "region").unwrap(),
        &CellValue::String("ñu".to_string())
    );
}

// ===== HTML Fallback Tests =====

#[test]
fn test_html_disguised_as_xls() {
    let html = "<html><body><table>\
        <tr><th>Región</th><th>Monto</th></tr>\
        <tr><td>norte</td><td>10</td></tr>\
        <tr><td>sur</td><td>20</td></tr>\
        </table></body></html>";

    let result = consolidate_files(
        &[SourceFile::new("reporte.xls", html.as_bytes().to_vec())],
        &ConsolidateOptions::default(),
    );

    assert_eq!(result.accepted, 1);
    assert_eq!(result.sheet.body_row_count(), 2);
    assert_eq!(
        result.sheet.get_by_name(2, "monto").unwrap(),
        &CellValue::Int(20)
    );
}
