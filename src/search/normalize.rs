//! Canonical search tokens.
//!
//! A token is the lowercased, accent-stripped form of a cell. Tokens that
//! look like a three-part date (`d/m/y`, `y-m-d`, ...) are rewritten to a
//! fixed `YYYYMMDD` form so the same day matches however it was typed.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::data::datatable::DataValue;

/// Normalize a raw string into its search token
pub fn normalize(value: &str) -> String {
    let folded: String = value
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();

    canonical_date(&folded).unwrap_or(folded)
}

/// Normalize the display form of a cell
pub fn normalize_value(value: &DataValue) -> String {
    match value {
        DataValue::Null => String::new(),
        DataValue::String(s) => normalize(s),
        other => normalize(&other.to_string()),
    }
}

/// `Some(YYYYMMDD)` when the token splits into three integer parts and one of
/// the outer parts is unambiguously a year
fn canonical_date(token: &str) -> Option<String> {
    let parts: Vec<&str> = token.split(['/', '-']).collect();
    if parts.len() != 3 {
        return None;
    }

    let a = leading_int(parts[0])?;
    let b = leading_int(parts[1])?;
    let c = leading_int(parts[2])?;

    if a > 31 {
        Some(format!("{:04}{:02}{:02}", a, b, c))
    } else if c > 31 {
        Some(format!("{:04}{:02}{:02}", c, b, a))
    } else {
        None
    }
}

/// Integer prefix of `part` after leading whitespace; trailing text is ignored
fn leading_int(part: &str) -> Option<u64> {
    let trimmed = part.trim_start();
    let end = trimmed
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
}
