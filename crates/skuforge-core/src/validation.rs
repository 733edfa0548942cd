//! # Validation Module
//!
//! Input validation for values that enter the SKU engine from outside:
//! manually typed SKUs, pattern settings, dictionary entries.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Admin UI                                                     │
//! │  └── Basic format checks, immediate feedback                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── SKU charset/length, separator, short codes, retry bounds          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE(sku_normalized) on products and variants                   │
//! │  └── UNIQUE(key) on sku_counters                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::normalize::normalize_sku;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest SKU accepted.
pub const MAX_SKU_LEN: usize = 64;

/// Longest separator accepted.
pub const MAX_SEPARATOR_LEN: usize = 3;

/// Longest curated short code accepted.
pub const MAX_SHORT_CODE_LEN: usize = 10;

/// Upper bound for the Path 2 retry budget.
pub const MAX_GENERATION_RETRIES: u32 = 99;

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most [`MAX_SKU_LEN`] characters
/// - Only ASCII letters, digits, hyphens, underscores and dots
/// - Must keep at least one letter or digit after normalization
///
/// ## Example
/// ```rust
/// use skuforge_core::validation::validate_sku;
///
/// assert!(validate_sku("AT-AOTHUN-001").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::required("sku"));
    }

    if sku.len() > MAX_SKU_LEN {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: MAX_SKU_LEN,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(ValidationError::invalid(
            "sku",
            "must contain only letters, numbers, hyphens, underscores, and dots",
        ));
    }

    if normalize_sku(sku).is_empty() {
        return Err(ValidationError::invalid(
            "sku",
            "must contain at least one letter or number",
        ));
    }

    Ok(())
}

/// Validates a pattern separator.
///
/// Empty separators are allowed (`ATAOTHUN001`); alphanumeric ones are not,
/// since they would survive normalization and corrupt counter keys.
pub fn validate_separator(separator: &str) -> ValidationResult<()> {
    if separator.len() > MAX_SEPARATOR_LEN {
        return Err(ValidationError::TooLong {
            field: "separator".to_string(),
            max: MAX_SEPARATOR_LEN,
        });
    }

    if separator.chars().any(|c| c.is_alphanumeric() || c == '{' || c == '}') {
        return Err(ValidationError::invalid(
            "separator",
            "must not contain letters, digits, or braces",
        ));
    }

    Ok(())
}

/// Validates a curated abbreviation short code.
pub fn validate_short_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::required("short_code"));
    }

    if code.len() > MAX_SHORT_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "short_code".to_string(),
            max: MAX_SHORT_CODE_LEN,
        });
    }

    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::invalid(
            "short_code",
            "must contain only letters and numbers",
        ));
    }

    Ok(())
}

/// Validates the Path 2 retry budget.
pub fn validate_max_retries(retries: u32) -> ValidationResult<()> {
    if retries == 0 || retries > MAX_GENERATION_RETRIES {
        return Err(ValidationError::OutOfRange {
            field: "max_retries".to_string(),
            min: 1,
            max: MAX_GENERATION_RETRIES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
