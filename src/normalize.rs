//! Canonical column names.
//!
//! Headers arriving from different sources ("Región", "region ", "REGION")
//! must compare equal before schemas can be reconciled, so every header is
//! reduced to a lowercase, diacritic-free, underscore-separated identifier.
//! Normalization is a pure function and idempotent.

use crate::error::Result;
use crate::sanitize::strip_illegal_chars;
use crate::sheet::Sheet;
use regex::Regex;

/// Token substituted for a header that normalizes to nothing.
pub const EMPTY_HEADER_TOKEN: &str = "sin_nombre";

/// Token substituted for degree-sign variants (`°`, `º`), so "Temp °C"
/// and "temp deg c" land on the same canonical name.
pub const DEGREE_TOKEN: &str = "deg";

/// Canonical names that look like auto-generated positional labels rather
/// than real headers. Columns matching this are dropped. Bare-number
/// headers are handled separately: see [`schema_looks_misparsed`].
pub const PLACEHOLDER_HEADER_PATTERN: &str =
    r"^(?:unnamed|column|columna|sin_nombre)(?:_\d+)?$";

/// Map a raw header string to its canonical identifier.
///
/// Steps: strip control characters, lowercase, fold diacritics, map degree
/// signs to [`DEGREE_TOKEN`], collapse whitespace/punctuation runs to single
/// underscores, trim edge underscores, and fall back to
/// [`EMPTY_HEADER_TOKEN`] when nothing survives.
#[must_use]
pub fn canonical_column_name(raw: &str) -> String {
    let cleaned = strip_illegal_chars(raw);

    let mut folded = String::with_capacity(cleaned.len());
    for ch in cleaned.to_lowercase().chars() {
        match ch {
            '°' | 'º' => {
                folded.push(' ');
                folded.push_str(DEGREE_TOKEN);
                folded.push(' ');
            }
            _ => folded.push(fold_diacritic(ch)),
        }
    }

    let canonical = folded
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    if canonical.is_empty() {
        EMPTY_HEADER_TOKEN.to_string()
    } else {
        canonical
    }
}

/// Fold common Latin diacritics to their base letter
fn fold_diacritic(ch: char) -> char {
    match ch {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        'ñ' => 'n',
        'ç' => 'c',
        _ => ch,
    }
}

/// True when every canonical name looks like a bare number, i.e. the
/// header row was probably a data row. Such a schema never seeds the
/// canonical column set under the strict policy.
#[must_use]
pub fn schema_looks_misparsed(names: &[String]) -> bool {
    !names.is_empty()
        && names
            .iter()
            .all(|name| name.chars().all(|c| c.is_ascii_digit()))
}

impl Sheet {
    /// Normalize every header to its canonical name and drop columns whose
    /// canonical name matches the placeholder pattern.
    ///
    /// Must run right after reading, before any schema comparison.
    pub fn normalize_headers(&mut self, placeholder: &Regex) -> Result<()> {
        let Some(names) = self.column_names().cloned() else {
            return Ok(());
        };

        let canonical: Vec<String> = names.iter().map(|n| canonical_column_name(n)).collect();

        let dropped: Vec<usize> = canonical
            .iter()
            .enumerate()
            .filter(|(_, name)| placeholder.is_match(name))
            .map(|(i, _)| i)
            .collect();

        self.rename_columns(canonical)?;
        if !dropped.is_empty() {
            tracing::debug!(
                sheet = self.name(),
                count = dropped.len(),
                "dropping placeholder columns"
            );
            self.remove_columns_at(&dropped)?;
        }
        Ok(())
    }
}
