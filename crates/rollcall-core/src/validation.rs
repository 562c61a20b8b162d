//! Name rules for enrollment submissions.
//!
//! A name is accepted when, after trimming, it has at least
//! [`MIN_NAME_CHARS`] characters and every character is an ASCII letter, a
//! Latin-1 letter in `U+00C0..=U+00FF`, whitespace, an apostrophe, or a
//! hyphen.

use crate::error::ValidationError;

/// Minimum number of characters in a trimmed name.
pub const MIN_NAME_CHARS: usize = 2;

/// Validate a raw submission and return the trimmed name.
pub fn validate_name(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();

    if name.chars().count() < MIN_NAME_CHARS || !name.chars().all(is_name_char) {
        return Err(ValidationError::InvalidName(name.to_string()));
    }

    Ok(name.to_string())
}

/// Key used for duplicate detection: trimmed and lower-cased.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphabetic()
        || ('\u{00C0}'..='\u{00FF}').contains(&c)
        || c.is_whitespace()
        || c == '\''
        || c == '-'
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_accepts_common_names() {
        for name in ["Al", "Ada Lovelace", "O'Brien", "Jean-Luc", "Zoë", "José Ñúñez"] {
            assert_eq!(validate_name(name).unwrap(), name);
        }
    }

    #[test]
    fn test_trims_before_checking() {
        assert_eq!(validate_name("  Grace Hopper \n").unwrap(), "Grace Hopper");
        assert!(validate_name("  A  ").is_err());
    }

    #[test]
    fn test_rejects_bad_shapes() {
        for name in ["", "A", "R2D2", "bob@example.com", "Łukasz", "名前", "a_b"] {
            assert!(
                matches!(validate_name(name), Err(ValidationError::InvalidName(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  ADA lovelace "), "ada lovelace");
        assert_eq!(normalize_name("Zoë"), normalize_name("ZOË"));
    }

    proptest! {
        #[test]
        fn test_ascii_letter_names_are_valid(name in "[A-Za-z][A-Za-z '-]{1,30}[A-Za-z]") {
            prop_assert_eq!(validate_name(&name).unwrap(), name.trim());
        }

        #[test]
        fn test_digits_are_never_valid(prefix in "[A-Za-z]{1,5}", digit in 0u8..10) {
            let name = format!("{prefix}{digit}");
            prop_assert!(validate_name(&name).is_err());
        }
    }
}
