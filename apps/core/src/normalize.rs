/// Country calling code treated as a known international prefix on
/// 12-digit numbers.
pub const DEFAULT_COUNTRY_CODE: &str = "91";

const DOMESTIC_DIGITS: usize = 10;

/// Trimmed, lowercased form of a query or label.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Best-effort phone canonicalization. Keeps digits only; ten digits are
/// treated as a domestic number, anything longer is prefixed with `+`.
/// Shorter inputs (extensions, short codes) come back as bare digits.
///
/// This is not E.164 validation: there is no length or region check.
pub fn normalize_phone_number(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    match digits.len() {
        DOMESTIC_DIGITS => digits,
        12 if digits.starts_with(DEFAULT_COUNTRY_CODE) => format!("+{digits}"),
        len if len > DOMESTIC_DIGITS => format!("+{digits}"),
        _ => digits,
    }
}

pub fn is_all_digits(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}
