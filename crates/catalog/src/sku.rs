//! SKU character rules.
//!
//! SKUs and SKU prefixes appear in URLs (`/v1/product/:sku`), so they are
//! restricted to ASCII letters, `-` and `_`, between 1 and 50 characters.

use storefront_core::{DomainError, DomainResult};

pub const MAX_SKU_LEN: usize = 50;

/// Separator between a root's SKU prefix and a combination's suffix, and
/// between the suffix's individual values.
pub const SKU_SEPARATOR: &str = "_";

/// Whether `s` only uses the restricted SKU character set.
pub fn is_valid_sku(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= MAX_SKU_LEN
        && s.chars().all(|c| c.is_ascii_alphabetic() || c == '-' || c == '_')
}

pub fn validate_sku(s: &str) -> DomainResult<()> {
    if is_valid_sku(s) {
        Ok(())
    } else {
        Err(DomainError::validation(format!(
            "invalid sku '{s}': must be 1-{MAX_SKU_LEN} characters of letters, '-' or '_'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_letters_dashes_underscores() {
        for sku in ["t-shirt", "T_SHIRT", "a", "t-shirt_small_red"] {
            assert!(is_valid_sku(sku), "{sku} should be valid");
        }
    }

    #[test]
    fn rejects_digits_spaces_and_empty() {
        for sku in ["", "shirt1", "t shirt", "ça", "shirt/red", "shirt.red"] {
            assert!(!is_valid_sku(sku), "{sku} should be invalid");
        }
    }

    #[test]
    fn rejects_overlong() {
        let sku = "a".repeat(MAX_SKU_LEN + 1);
        match validate_sku(&sku) {
            Err(DomainError::Validation(_)) => {}
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(validate_sku(&"a".repeat(MAX_SKU_LEN)).is_ok());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                ..ProptestConfig::default()
            })]

            #[test]
            fn restricted_alphabet_is_always_valid(s in "[a-zA-Z_-]{1,50}") {
                prop_assert!(is_valid_sku(&s));
            }

            #[test]
            fn any_digit_invalidates(prefix in "[a-z]{0,10}", digit in 0u8..10, suffix in "[a-z]{0,10}") {
                let s = format!("{prefix}{digit}{suffix}");
                prop_assert!(!is_valid_sku(&s));
            }
        }
    }
}
