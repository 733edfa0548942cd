//! # Normalization
//!
//! Canonical forms used for uniqueness, counter keys and short codes.
//!
//! ## Three Forms of the Same Text
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Input: "Áo Thun Đỏ"                                                   │
//! │                                                                         │
//! │  slugify()            → "ao-thun-do"     (diacritics gone, hyphens)    │
//! │  name_segment()       → "AOTHUNDO"       (PRODUCT_NAME, ≤ 10 chars)    │
//! │  derive_short_code()  → "AOT"            (abbreviation fallback)       │
//! │                                                                         │
//! │  Input: "AT-RED-L-001"                                                 │
//! │  normalize_sku()      → "ATREDL001"      (uniqueness + counter key)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Maximum length of the `{PRODUCT_NAME}` segment.
pub const NAME_SEGMENT_LEN: usize = 10;

/// Length of an auto-derived abbreviation.
pub const SHORT_CODE_LEN: usize = 3;

/// Short code used when a value has no usable characters at all.
pub const FALLBACK_SHORT_CODE: &str = "XXX";

/// Canonical form of a SKU: uppercase ASCII letters and digits only.
///
/// Idempotent, and insensitive to case and punctuation.
///
/// ## Example
/// ```rust
/// use skuforge_core::normalize::normalize_sku;
///
/// assert_eq!(normalize_sku("AT-RED-L-001"), "ATREDL001");
/// assert_eq!(normalize_sku("at_red_l_001"), "ATREDL001");
/// ```
pub fn normalize_sku(sku: &str) -> String {
    sku.trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Removes diacritics by NFD decomposition, dropping combining marks.
///
/// `đ`/`Đ` have no decomposition and are mapped to `d`/`D` explicitly.
pub fn strip_diacritics(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            'đ' => 'd',
            'Đ' => 'D',
            other => other,
        })
        .collect()
}

/// Lowercase ASCII slug: diacritics stripped, every other run of
/// non-alphanumeric characters becomes a single hyphen.
///
/// ## Example
/// ```rust
/// use skuforge_core::normalize::slugify;
///
/// assert_eq!(slugify("Áo Thun  Nam!"), "ao-thun-nam");
/// ```
pub fn slugify(s: &str) -> String {
    let mut slug = String::with_capacity(s.len());
    let mut pending_hyphen = false;

    for c in strip_diacritics(s).chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Compact uppercase code of a slug, with the hyphens removed.
fn compact_slug(s: &str) -> String {
    slugify(s)
        .chars()
        .filter(|c| *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Renders the `{PRODUCT_NAME}` segment.
///
/// Slug separators are dropped so a name never injects the SKU separator
/// into the rendered identifier.
pub fn name_segment(name: &str) -> String {
    compact_slug(name).chars().take(NAME_SEGMENT_LEN).collect()
}

/// Deterministic abbreviation for a value missing from the dictionary.
///
/// Pure: no randomness, nothing persisted.
///
/// ## Example
/// ```rust
/// use skuforge_core::normalize::derive_short_code;
///
/// assert_eq!(derive_short_code("Extra Large"), "EXT");
/// assert_eq!(derive_short_code("Đỏ"), "DO");
/// assert_eq!(derive_short_code("!!!"), "XXX");
/// ```
pub fn derive_short_code(value: &str) -> String {
    let code: String = compact_slug(value).chars().take(SHORT_CODE_LEN).collect();
    if code.is_empty() {
        FALLBACK_SHORT_CODE.to_string()
    } else {
        code
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_is_case_and_punctuation_insensitive() {
        assert_eq!(normalize_sku("AT-RED-L-001"), "ATREDL001");
        assert_eq!(normalize_sku("at_red_l_001"), "ATREDL001");
        assert_eq!(normalize_sku("  at red/l.001 "), "ATREDL001");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_sku("ao-thun_Nam-001");
        assert_eq!(normalize_sku(&once), once);
    }

    #[test]
    fn test_normalize_can_be_empty() {
        assert_eq!(normalize_sku("---"), "");
        assert_eq!(normalize_sku("###"), "");
    }

    #[test]
    fn test_strip_diacritics() {
        assert_eq!(strip_diacritics("Áo Thun"), "Ao Thun");
        assert_eq!(strip_diacritics("Đỏ tươi"), "Do tuoi");
        assert_eq!(strip_diacritics("Crème brûlée"), "Creme brulee");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Áo Thun"), "ao-thun");
        assert_eq!(slugify("  --Hello,   World--  "), "hello-world");
        assert_eq!(slugify("日本"), "");
    }

    #[test]
    fn test_name_segment() {
        assert_eq!(name_segment("Áo Thun"), "AOTHUN");
        assert_eq!(name_segment("Quần Jean Nam Cao Cấp"), "QUANJEANNA");
        assert_eq!(name_segment("Quần Jean Nam Cao Cấp").len(), NAME_SEGMENT_LEN);
        assert_eq!(name_segment(""), "");
    }

    #[test]
    fn test_derive_short_code() {
        assert_eq!(derive_short_code("Red"), "RED");
        assert_eq!(derive_short_code("Xanh dương"), "XAN");
        assert_eq!(derive_short_code("L"), "L");
        assert_eq!(derive_short_code(""), FALLBACK_SHORT_CODE);
        assert_eq!(derive_short_code("★★★"), FALLBACK_SHORT_CODE);
    }

    #[test]
    fn test_derive_short_code_is_deterministic() {
        let first = derive_short_code("Navy Blue");
        for _ in 0..10 {
            assert_eq!(derive_short_code("Navy Blue"), first);
        }
    }
}
