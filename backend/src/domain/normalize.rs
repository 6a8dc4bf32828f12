//! Canonical forms for customer names and phone numbers.
//!
//! Duplicate detection and referrer lookup compare these derived forms, never
//! the raw input, so both functions must be deterministic and idempotent.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Derive the normalized form of a customer name.
///
/// Lowercases, applies canonical decomposition, drops the combining marks the
/// decomposition exposes, and collapses whitespace runs to single spaces
/// (trimming both ends as a consequence).
///
/// # Examples
/// ```
/// use backend::domain::normalize_name;
///
/// assert_eq!(normalize_name("JOSÉ   Pérez"), "jose perez");
/// ```
pub fn normalize_name(raw: &str) -> String {
    let folded: String = raw
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Derive the normalized form of a phone number.
///
/// Keeps ASCII digits only. A leading `57` on a result longer than ten digits
/// is treated as the Colombian country prefix and stripped; a bare ten-digit
/// local number starting with `57` is left alone.
///
/// # Examples
/// ```
/// use backend::domain::normalize_phone;
///
/// assert_eq!(normalize_phone("+57 300 1234567"), "3001234567");
/// ```
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() > 10 && digits.starts_with("57") {
        digits[2..].to_owned()
    } else {
        digits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("JOSÉ   Pérez", "jose perez")]
    #[case("  María\tÁngel  ", "maria angel")]
    #[case("Ñoño", "nono")]
    #[case("plain name", "plain name")]
    #[case("", "")]
    fn name_folds_case_marks_and_whitespace(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_name(raw), expected);
    }

    #[rstest]
    #[case("JOSÉ   Pérez")]
    #[case("  María\tÁngel  ")]
    #[case("3001234567")]
    fn name_normalization_is_idempotent(#[case] raw: &str) {
        let once = normalize_name(raw);
        assert_eq!(normalize_name(&once), once);
    }

    #[rstest]
    fn equivalent_names_share_a_normal_form() {
        assert_eq!(normalize_name("JOSÉ   Pérez"), normalize_name("jose perez"));
    }

    #[rstest]
    #[case("+57 300 1234567", "3001234567")]
    #[case("(300) 123-4567", "3001234567")]
    #[case("573001234567", "3001234567")]
    // Ten digits starting with 57 are a local number, not a prefixed one.
    #[case("5730012345", "5730012345")]
    #[case("no digits", "")]
    fn phone_keeps_digits_and_strips_country_prefix(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_phone(raw), expected);
    }

    #[rstest]
    #[case("+57 300 1234567")]
    #[case("5730012345")]
    #[case("3001234567")]
    fn phone_normalization_is_idempotent(#[case] raw: &str) {
        let once = normalize_phone(raw);
        assert_eq!(normalize_phone(&once), once);
    }
}
