//! # Error Types
//!
//! Domain-specific error types for skuforge-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  skuforge-core errors (this file)                                      │
//! │  ├── CoreError        - Pattern/attribute rule violations              │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  skuforge-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  skuforge-engine errors                                                │
//! │  └── EngineError      - What callers see (with a stable code)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → caller              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Errors raised by the pure SKU logic.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The pattern contains a `{TOKEN}` the compiler does not know.
    #[error("Unknown pattern token: {{{0}}}")]
    UnknownToken(String),

    /// The pattern has a `{` without a matching `}` (or the reverse).
    #[error("Unbalanced braces in pattern: {0}")]
    UnbalancedBraces(String),

    /// A variant attribute bag carries the same key twice.
    ///
    /// ## When This Occurs
    /// ```text
    /// [("Color", "Red"), ("color", "Blue")]
    ///        │                 │
    ///        └──── same key ───┘  (keys compare case-insensitively)
    /// ```
    #[error("Duplicate attribute key: {0}")]
    DuplicateAttributeKey(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., bad pattern, bad SKU characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., duplicate SKU).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Shorthand for [`ValidationError::InvalidFormat`].
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
