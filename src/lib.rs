//! Consolidation pipeline for heterogeneous tabular files
//!
//! Takes a batch of files in mixed formats (CSV/TXT/TSV with unknown
//! encoding and delimiter, XLSX/XLS workbooks, HTML tables shipped with an
//! `.xls` extension), reconciles their schemas on canonical column names,
//! and merges them into one sheet with a provenance column recording which
//! file each row came from. The result exports to xlsx or CSV.
//!
//! # Examples
//!
//! ## Consolidating a batch
//!
//! ```
//! use consolida::{consolidate_files, ConsolidateOptions, SourceFile};
//!
//! // Different delimiters and header spellings reconcile automatically
//! let files = vec![
//!     SourceFile::new("norte.csv", b"Region,Monto\nnorte,10".to_vec()),
//!     SourceFile::new("sur.csv", b"REGION;MONTO\nsur;20".to_vec()),
//! ];
//!
//! let result = consolidate_files(&files, &ConsolidateOptions::default());
//!
//! assert_eq!(result.accepted, 2);
//! assert_eq!(result.sheet.body_row_count(), 2);
//! assert_eq!(
//!     result.sheet.column_names(),
//!     Some(&vec![
//!         "archivo_origen".to_string(),
//!         "region".to_string(),
//!         "monto".to_string(),
//!     ])
//! );
//! ```
//!
//! ## Strict schema policy
//!
//! ```
//! use consolida::{consolidate_files, ConsolidateOptions, FileStatus, SchemaPolicy, SourceFile};
//!
//! let files = vec![
//!     SourceFile::new("a.csv", b"x,y\n1,2".to_vec()),
//!     SourceFile::new("b.csv", b"x,z\n3,4".to_vec()),
//! ];
//!
//! let options = ConsolidateOptions::default().with_policy(SchemaPolicy::Strict);
//! let result = consolidate_files(&files, &options);
//!
//! assert_eq!(result.accepted, 1);
//! assert_eq!(result.log[1].status, FileStatus::Rejected);
//! ```
//!
//! ## Exporting
//!
//! ```
//! use consolida::{consolidate_files, export_xlsx, ConsolidateOptions, SourceFile};
//!
//! let files = vec![SourceFile::new("a.csv", b"x\n1".to_vec())];
//! let result = consolidate_files(&files, &ConsolidateOptions::default());
//!
//! let bytes = export_xlsx(&result.sheet).unwrap();
//! assert!(!bytes.is_empty());
//! ```

mod cell;
mod consolidate;
mod csv;
mod detect;
mod error;
mod export;
mod html;
mod normalize;
mod optimize;
mod reader;
mod sanitize;
mod sheet;
mod xlsx;

/// Re-export cell value type.
pub use cell::CellValue;
/// Re-export consolidation entry point and reporting types.
pub use consolidate::{
    consolidate_files, Consolidated, ConsolidateOptions, FileReport, FileStatus, SchemaPolicy,
    Severity, SOURCE_COLUMN,
};
/// Re-export CSV options.
pub use csv::CsvOptions;
/// Re-export detection constants and helpers.
pub use detect::{detect_delimiter, encoding_candidates, DELIMITER_CANDIDATES, SAMPLE_BYTES};
/// Re-export error types.
pub use error::{ConsolidaError, Result};
/// Re-export exporters and download metadata.
pub use export::{
    export_csv, export_xlsx, CSV_FILENAME, CSV_MIME, EXPORT_SHEET_NAME, XLSX_FILENAME, XLSX_MIME,
};
/// Re-export header normalization.
pub use normalize::{canonical_column_name, EMPTY_HEADER_TOKEN, PLACEHOLDER_HEADER_PATTERN};
/// Re-export type narrowing and profiling.
pub use optimize::{
    optimize_types, optimize_types_with_ratio, ColumnProfile, ColumnStorage,
    CATEGORY_DISTINCT_RATIO,
};
/// Re-export the per-file reader.
pub use reader::{read_source, SourceFile};
/// Re-export text scrubbing helpers.
pub use sanitize::{sanitize_cell, strip_illegal_chars};
/// Re-export sheet type.
pub use sheet::Sheet;
/// Re-export workbook read options.
pub use xlsx::{SheetSelector, WorkbookFormat};
