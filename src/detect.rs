//! Encoding and delimiter detection over a raw byte sample.
//!
//! Both functions are pure and total: they always return a usable answer,
//! never an error.

use encoding_rs::{Encoding, ISO_8859_15, UTF_8, WINDOWS_1252};

/// How many leading bytes of a file are sampled for detection.
pub const SAMPLE_BYTES: usize = 2048;

/// Delimiters considered, in tie-break preference order.
pub const DELIMITER_CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Fixed encoding preference order. The WHATWG latin1 label folds into
/// windows-1252, which decodes any byte sequence, so it doubles as the
/// terminal fallback.
const ENCODING_PREFERENCE: [&Encoding; 3] = [UTF_8, WINDOWS_1252, ISO_8859_15];

/// Ranked list of text encodings to try for a byte sample.
///
/// A BOM moves its encoding to the front; otherwise the fixed preference
/// order is returned as-is.
#[must_use]
pub fn encoding_candidates(sample: &[u8]) -> Vec<&'static Encoding> {
    let mut candidates: Vec<&'static Encoding> = ENCODING_PREFERENCE.to_vec();

    if let Some((bom_encoding, _)) = Encoding::for_bom(sample) {
        candidates.retain(|candidate| *candidate != bom_encoding);
        candidates.insert(0, bom_encoding);
    }

    candidates
}

/// Most probable field delimiter for a byte sample.
///
/// Counts occurrences of each candidate within the first [`SAMPLE_BYTES`]
/// bytes; the highest count wins, ties break toward the earlier candidate,
/// and all-zero counts default to comma.
#[must_use]
pub fn detect_delimiter(sample: &[u8]) -> u8 {
    let sample = &sample[..sample.len().min(SAMPLE_BYTES)];

    let mut best = DELIMITER_CANDIDATES[0];
    let mut best_count = 0usize;

    for &candidate in &DELIMITER_CANDIDATES {
        let count = sample.iter().filter(|&&byte| byte == candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }

    best
}

/// Decode bytes with the given encoding, stripping a BOM if present.
/// Returns None when the decode reported malformed sequences.
#[must_use]
pub fn decode_strict(bytes: &[u8], encoding: &'static Encoding) -> Option<String> {
    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    if had_errors {
        None
    } else {
        Some(text.into_owned())
    }
}
