//! Bill title normalization.
//!
//! Titles arrive from the bill API, the database and operators with varying
//! whitespace and Unicode composition. Every lookup or storage key goes through
//! [`normalize_title`] so that the same bill always maps to the same row.

use unicode_normalization::UnicodeNormalization;

/// Collapses whitespace runs to a single space, trims, and applies NFC.
pub fn normalize_title(title: &str) -> String {
    let collapsed = title.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.nfc().collect()
}
