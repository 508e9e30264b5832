//! Schema reconciliation across a batch of files.
//!
//! Every file is read and cleaned independently, then folded into one
//! consolidated sheet in input order. The strict policy requires each file
//! to match a canonical column set (order-insensitive); the union policy
//! keeps every column ever seen and pads the gaps with nulls. A provenance
//! column records which file each row came from.

use crate::cell::CellValue;
use crate::error::{ConsolidaError, Result};
use crate::normalize::{schema_looks_misparsed, PLACEHOLDER_HEADER_PATTERN};
use crate::reader::{read_source, SourceFile};
use crate::sheet::Sheet;
use crate::xlsx::SheetSelector;
use indexmap::IndexSet;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;

/// Name of the synthetic provenance column, always placed first.
pub const SOURCE_COLUMN: &str = "archivo_origen";

/// How files with differing column sets are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaPolicy {
    /// Reject any file whose column set differs from the canonical one
    Strict,
    /// Keep the union of all columns, padding absent ones with nulls
    #[default]
    Union,
}

/// Options for a consolidation run
#[derive(Debug, Clone)]
pub struct ConsolidateOptions {
    pub policy: SchemaPolicy,
    /// Worksheet to read from every workbook file in the batch
    pub sheet_selector: SheetSelector,
    /// Name of the provenance column
    pub source_column: String,
    /// Regex for placeholder headers; matching columns are dropped
    pub placeholder_pattern: String,
}

impl Default for ConsolidateOptions {
    fn default() -> Self {
        ConsolidateOptions {
            policy: SchemaPolicy::default(),
            sheet_selector: SheetSelector::First,
            source_column: SOURCE_COLUMN.to_string(),
            placeholder_pattern: PLACEHOLDER_HEADER_PATTERN.to_string(),
        }
    }
}

impl ConsolidateOptions {
    #[must_use]
    pub fn with_policy(mut self, policy: SchemaPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_sheet_selector(mut self, selector: SheetSelector) -> Self {
        self.sheet_selector = selector;
        self
    }
}

/// Outcome category for one input file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Accepted,
    Rejected,
    SkippedEmpty,
    ReadError,
}

/// Display severity for a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

/// One reconciliation log entry, in input order
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file: String,
    pub status: FileStatus,
    pub detail: String,
}

impl FileReport {
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self.status {
            FileStatus::Accepted => Severity::Success,
            FileStatus::SkippedEmpty => Severity::Info,
            FileStatus::Rejected => Severity::Warning,
            FileStatus::ReadError => Severity::Error,
        }
    }

    #[must_use]
    pub fn message(&self) -> String {
        format!("{}: {}", self.file, self.detail)
    }
}

/// Result of a consolidation run: the merged sheet plus the per-file log
#[derive(Debug, Clone)]
pub struct Consolidated {
    pub sheet: Sheet,
    pub log: Vec<FileReport>,
    pub accepted: usize,
}

impl Consolidated {
    /// True when no file contributed any rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accepted == 0
    }
}

/// Read, clean, reconcile and merge a batch of files.
///
/// Never fails as a whole: per-file problems land in the log and the run
/// continues. An empty batch yields an empty sheet and an empty log.
#[must_use]
pub fn consolidate_files(files: &[SourceFile], options: &ConsolidateOptions) -> Consolidated {
    let placeholder = compile_placeholder(&options.placeholder_pattern);

    // Read and clean each file independently, preserving input order
    let prepared: Vec<(String, Result<Sheet>)> = files
        .iter()
        .map(|file| {
            (
                file.name.clone(),
                prepare_file(file, options, &placeholder),
            )
        })
        .collect();

    match options.policy {
        SchemaPolicy::Strict => fold_strict(prepared, options),
        SchemaPolicy::Union => fold_union(prepared, options),
    }
}

fn compile_placeholder(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "invalid placeholder pattern, using default");
        Regex::new(PLACEHOLDER_HEADER_PATTERN).expect("default pattern is valid")
    })
}

/// Read one file and apply the cleaning pipeline: normalize headers, drop
/// placeholder columns, scrub control characters, remove blank rows.
fn prepare_file(
    file: &SourceFile,
    options: &ConsolidateOptions,
    placeholder: &Regex,
) -> Result<Sheet> {
    let mut sheet = read_source(file, &options.sheet_selector)?;
    if sheet.is_empty() {
        return Err(ConsolidaError::EmptyAfterCleaning);
    }

    sheet.normalize_headers(placeholder)?;
    sheet.sanitize_text_cells()?;
    sheet.remove_blank_rows();

    // A file column colliding with the provenance name would be shadowed by
    // the synthetic value, so it is dropped up front
    let colliding: Vec<usize> = sheet
        .column_names()
        .map(|names| {
            names
                .iter()
                .enumerate()
                .filter(|(_, n)| *n == &options.source_column)
                .map(|(i, _)| i)
                .collect()
        })
        .unwrap_or_default();
    if !colliding.is_empty() {
        sheet.remove_columns_at(&colliding)?;
    }

    if sheet.col_count() == 0 || sheet.body_row_count() == 0 {
        return Err(ConsolidaError::EmptyAfterCleaning);
    }
    Ok(sheet)
}

fn schema_of(sheet: &Sheet) -> Vec<String> {
    sheet.column_names().cloned().unwrap_or_default()
}

fn fold_strict(
    prepared: Vec<(String, Result<Sheet>)>,
    options: &ConsolidateOptions,
) -> Consolidated {
    // Seed the canonical column set with the first readable file whose
    // headers do not look like a mis-parsed data row; fall back to the
    // first readable file when every schema looks numeric.
    let seed = prepared
        .iter()
        .find(|(_, outcome)| {
            outcome
                .as_ref()
                .is_ok_and(|sheet| !schema_looks_misparsed(&schema_of(sheet)))
        })
        .or_else(|| prepared.iter().find(|(_, outcome)| outcome.is_ok()));

    let canonical: Vec<String> = match seed {
        Some((_, Ok(sheet))) => schema_of(sheet),
        _ => Vec::new(),
    };
    let canonical_set: BTreeSet<&String> = canonical.iter().collect();

    let mut log = Vec::with_capacity(prepared.len());
    let mut accepted: Vec<(String, Sheet)> = Vec::new();

    for (name, outcome) in prepared {
        match outcome {
            Ok(mut sheet) => {
                let schema = schema_of(&sheet);
                let schema_set: BTreeSet<&String> = schema.iter().collect();

                let missing: Vec<String> = canonical_set
                    .difference(&schema_set)
                    .map(|s| (*s).clone())
                    .collect();
                let extra: Vec<String> = schema_set
                    .difference(&canonical_set)
                    .map(|s| (*s).clone())
                    .collect();

                if missing.is_empty() && extra.is_empty() {
                    if let Err(e) = sheet.reorder_columns(&canonical) {
                        log.push(FileReport {
                            file: name,
                            status: FileStatus::ReadError,
                            detail: e.to_string(),
                        });
                        continue;
                    }
                    log.push(accepted_report(&name, &sheet));
                    accepted.push((name, sheet));
                } else {
                    let mismatch = ConsolidaError::SchemaMismatch {
                        file: name.clone(),
                        missing,
                        extra,
                    };
                    tracing::warn!(file = %name, "{mismatch}");
                    log.push(FileReport {
                        file: name,
                        status: FileStatus::Rejected,
                        detail: mismatch.to_string(),
                    });
                }
            }
            Err(e) => log.push(failure_report(name, &e)),
        }
    }

    assemble(canonical, accepted, log, options)
}

fn fold_union(
    prepared: Vec<(String, Result<Sheet>)>,
    options: &ConsolidateOptions,
) -> Consolidated {
    // Union keeps first-appearance column order across files
    let mut columns: IndexSet<String> = IndexSet::new();
    let mut log = Vec::with_capacity(prepared.len());
    let mut accepted: Vec<(String, Sheet)> = Vec::new();

    for (name, outcome) in prepared {
        match outcome {
            Ok(sheet) => {
                for column in schema_of(&sheet) {
                    columns.insert(column);
                }
                log.push(accepted_report(&name, &sheet));
                accepted.push((name, sheet));
            }
            Err(e) => log.push(failure_report(name, &e)),
        }
    }

    assemble(columns.into_iter().collect(), accepted, log, options)
}

fn accepted_report(name: &str, sheet: &Sheet) -> FileReport {
    FileReport {
        file: name.to_string(),
        status: FileStatus::Accepted,
        detail: format!(
            "{} rows, {} columns",
            sheet.body_row_count(),
            sheet.col_count()
        ),
    }
}

fn failure_report(name: String, error: &ConsolidaError) -> FileReport {
    let status = match error {
        ConsolidaError::EmptyAfterCleaning => FileStatus::SkippedEmpty,
        _ => FileStatus::ReadError,
    };
    if status == FileStatus::ReadError {
        tracing::warn!(file = %name, "{error}");
    }
    FileReport {
        file: name,
        status,
        detail: error.to_string(),
    }
}

/// Merge accepted sheets into one, provenance column first, body rows in
/// input order. Columns a file lacks are filled with nulls.
fn assemble(
    columns: Vec<String>,
    accepted: Vec<(String, Sheet)>,
    log: Vec<FileReport>,
    options: &ConsolidateOptions,
) -> Consolidated {
    let accepted_count = accepted.len();
    let mut sheet = Sheet::with_name("consolidado");

    if accepted_count > 0 {
        let mut header: Vec<CellValue> = Vec::with_capacity(columns.len() + 1);
        header.push(CellValue::String(options.source_column.clone()));
        header.extend(columns.iter().map(|c| CellValue::String(c.clone())));
        sheet.data_mut().push(header);

        for (file_name, source) in &accepted {
            let indices: Vec<Option<usize>> = columns
                .iter()
                .map(|c| source.column_index_by_name(c).ok())
                .collect();

            for row in source.body_rows() {
                let mut merged: Vec<CellValue> = Vec::with_capacity(columns.len() + 1);
                merged.push(CellValue::String(file_name.clone()));
                for index in &indices {
                    merged.push(match index {
                        Some(i) => row.get(*i).cloned().unwrap_or(CellValue::Null),
                        None => CellValue::Null,
                    });
                }
                sheet.data_mut().push(merged);
            }
        }

        // Header naming cannot fail on a non-empty sheet
        let _ = sheet.name_columns_by_row(0);
    }

    tracing::info!(
        accepted = accepted_count,
        total = log.len(),
        rows = sheet.body_row_count(),
        "consolidation finished"
    );

    Consolidated {
        sheet,
        log,
        accepted: accepted_count,
    }
}
