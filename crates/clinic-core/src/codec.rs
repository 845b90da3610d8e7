//! Field codec for composite and free-text columns.
//!
//! Medication lists are stored flat in a single TEXT column: every entry is
//! trimmed and followed by [`MEDICATION_DELIMITER`], so `["ibuprofen",
//! "vitamin-d"]` is stored as `ibuprofen;vitamin-d;`. The delimiter is not
//! escaped; an entry that itself contains `;` will come back split in two.

/// Reserved separator between medication entries.
pub const MEDICATION_DELIMITER: char = ';';

/// Encode a medication list for storage.
///
/// Entries are trimmed; entries that are empty after trimming are dropped.
pub fn encode_medications<S: AsRef<str>>(medications: &[S]) -> String {
    let mut encoded = String::new();
    for medication in medications {
        let medication = medication.as_ref().trim();
        if medication.is_empty() {
            continue;
        }
        encoded.push_str(medication);
        encoded.push(MEDICATION_DELIMITER);
    }
    encoded
}

/// Decode a stored medication list, preserving order and skipping empty segments.
pub fn decode_medications(stored: &str) -> Vec<String> {
    stored
        .split(MEDICATION_DELIMITER)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split raw user input (`"ibuprofen; vitamin-d"`) into a medication list.
pub fn parse_medication_input(raw: &str) -> Vec<String> {
    raw.split(MEDICATION_DELIMITER)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Escape text for embedding in a single-quoted SQL literal.
///
/// The repository binds every value as a statement parameter and never
/// needs this; it exists for hosts that export records as SQL scripts.
pub fn escape_for_storage(text: &str) -> String {
    text.replace('\'', "''")
}
