//! Post-consolidation type narrowing and column profiling.
//!
//! Spreadsheet numbers arrive as floats even when every value is whole, so
//! fraction-free float columns are narrowed back to integers. Each column is
//! then profiled: the narrowest integer width that holds its range, and for
//! text columns whether the distinct-value ratio is low enough to treat the
//! column as categorical.

use crate::cell::CellValue;
use crate::error::Result;
use crate::sheet::Sheet;
use serde::Serialize;
use std::collections::HashSet;

/// Text columns whose distinct/non-missing ratio falls below this are
/// flagged categorical.
pub const CATEGORY_DISTINCT_RATIO: f64 = 0.5;

/// Narrowest storage class that holds every value of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnStorage {
    /// No non-null values
    Empty,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Float,
    Text,
    /// More than one value class present
    Mixed,
}

/// Per-column optimization report
#[derive(Debug, Clone, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub storage: ColumnStorage,
    /// Distinct / non-missing for text columns, 0.0 otherwise
    pub distinct_ratio: f64,
    pub categorical: bool,
}

/// Narrow column types in place and profile every column.
///
/// Float cells are converted to Int only when the whole column is numeric
/// and every float is fraction-free; a single fractional value keeps the
/// column as floats. The provenance column is never flagged categorical.
pub fn optimize_types(sheet: &mut Sheet, source_column: &str) -> Result<Vec<ColumnProfile>> {
    optimize_types_with_ratio(sheet, source_column, CATEGORY_DISTINCT_RATIO)
}

/// [`optimize_types`] with an explicit categorical threshold
pub fn optimize_types_with_ratio(
    sheet: &mut Sheet,
    source_column: &str,
    category_ratio: f64,
) -> Result<Vec<ColumnProfile>> {
    let names: Vec<String> = sheet.column_names().cloned().unwrap_or_default();
    let mut profiles = Vec::with_capacity(names.len());

    for (col_index, name) in names.iter().enumerate() {
        let survey = survey_column(sheet, col_index);

        if survey.convertible() {
            sheet.column_map(col_index, |cell| match cell {
                CellValue::Float(f) => CellValue::Int(*f as i64),
                other => other.clone(),
            })?;
        }

        let storage = survey.storage();
        let distinct_ratio = survey.distinct_ratio();
        let categorical = storage == ColumnStorage::Text
            && name != source_column
            && survey.count > 0
            && distinct_ratio < category_ratio;

        profiles.push(ColumnProfile {
            name: name.clone(),
            storage,
            distinct_ratio,
            categorical,
        });
    }

    Ok(profiles)
}

struct ColumnSurvey {
    count: usize,
    numeric: bool,
    fraction_free: bool,
    has_bool: bool,
    has_text: bool,
    min: i64,
    max: i64,
    distinct_text: usize,
}

impl ColumnSurvey {
    /// Whole column is numeric and every value is a whole number
    fn convertible(&self) -> bool {
        self.count > 0 && self.numeric && !self.has_bool && !self.has_text && self.fraction_free
    }

    fn storage(&self) -> ColumnStorage {
        if self.count == 0 {
            return ColumnStorage::Empty;
        }

        let classes =
            usize::from(self.numeric) + usize::from(self.has_bool) + usize::from(self.has_text);
        if classes > 1 {
            return ColumnStorage::Mixed;
        }
        if self.has_bool {
            return ColumnStorage::Bool;
        }
        if self.has_text {
            return ColumnStorage::Text;
        }
        if !self.fraction_free {
            return ColumnStorage::Float;
        }

        if self.min >= i64::from(i8::MIN) && self.max <= i64::from(i8::MAX) {
            ColumnStorage::Int8
        } else if self.min >= i64::from(i16::MIN) && self.max <= i64::from(i16::MAX) {
            ColumnStorage::Int16
        } else if self.min >= i64::from(i32::MIN) && self.max <= i64::from(i32::MAX) {
            ColumnStorage::Int32
        } else {
            ColumnStorage::Int64
        }
    }

    fn distinct_ratio(&self) -> f64 {
        if self.has_text && self.count > 0 {
            self.distinct_text as f64 / self.count as f64
        } else {
            0.0
        }
    }
}

fn survey_column(sheet: &Sheet, col_index: usize) -> ColumnSurvey {
    let mut survey = ColumnSurvey {
        count: 0,
        numeric: false,
        fraction_free: true,
        has_bool: false,
        has_text: false,
        min: i64::MAX,
        max: i64::MIN,
        distinct_text: 0,
    };
    let mut seen_text: HashSet<&str> = HashSet::new();

    for row in sheet.body_rows() {
        let Some(cell) = row.get(col_index) else {
            continue;
        };
        match cell {
            CellValue::Null => continue,
            CellValue::Int(i) => {
                survey.numeric = true;
                survey.min = survey.min.min(*i);
                survey.max = survey.max.max(*i);
            }
            CellValue::Float(f) => {
                survey.numeric = true;
                if f.is_finite() && f.fract() == 0.0 && in_i64_range(*f) {
                    let i = *f as i64;
                    survey.min = survey.min.min(i);
                    survey.max = survey.max.max(i);
                } else {
                    survey.fraction_free = false;
                }
            }
            CellValue::Bool(_) => survey.has_bool = true,
            CellValue::String(s) => {
                survey.has_text = true;
                seen_text.insert(s.as_str());
            }
        }
        survey.count += 1;
    }

    survey.distinct_text = seen_text.len();
    survey
}

// f64 can hold integers exactly up to 2^53; beyond i64 range the cast
// would saturate, so such values stay floats.
fn in_i64_range(f: f64) -> bool {
    f >= i64::MIN as f64 && f <= i64::MAX as f64
}
