//! # Engine Error Types
//!
//! What callers of the engine see.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Engine Error Categories                           │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────────┐  │
//! │  │ VALIDATION_ERROR │  │    NOT_FOUND     │  │ GENERATION_EXHAUSTED │  │
//! │  │                  │  │                  │  │                      │  │
//! │  │ bad pattern      │  │ product, variant │  │ every candidate      │  │
//! │  │ missing token    │  │ category code    │  │ collided             │  │
//! │  │ bad manual SKU   │  │                  │  │                      │  │
//! │  └──────────────────┘  └──────────────────┘  └──────────────────────┘  │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐                            │
//! │  │PERSISTENCE_ERROR │  │   CONFIG_ERROR   │                            │
//! │  │                  │  │                  │                            │
//! │  │ SQLite failure   │  │ engine.toml      │                            │
//! │  │ UNIQUE backstop  │  │ env overrides    │                            │
//! │  └──────────────────┘  └──────────────────┘                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Generation never substitutes a guessed SKU: every failure above reaches
//! the caller. Only history logging swallows its errors.

use skuforge_core::{CoreError, ValidationError};
use skuforge_db::DbError;
use thiserror::Error;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine error type.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input rejected: malformed pattern, missing context, illegal SKU.
    #[error("Validation failed: {0}")]
    Validation(CoreError),

    /// A referenced record (or a category's code) does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Every candidate SKU collided.
    #[error("Could not generate a unique SKU from '{base_sku}' after {attempts} attempts")]
    GenerationExhausted { base_sku: String, attempts: u32 },

    /// Storage failure, including the UNIQUE index rejecting a write.
    #[error("Persistence error: {0}")]
    Persistence(DbError),

    /// Engine configuration could not be loaded, saved or validated.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EngineError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Stable machine-readable code for presenting the error.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "VALIDATION_ERROR",
            EngineError::NotFound { .. } => "NOT_FOUND",
            EngineError::GenerationExhausted { .. } => "GENERATION_EXHAUSTED",
            EngineError::Persistence(_) => "PERSISTENCE_ERROR",
            EngineError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Whether a concurrent writer claimed the SKU between check and write.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, EngineError::Persistence(e) if e.is_unique_violation())
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        EngineError::Validation(err)
    }
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Validation(CoreError::Validation(err))
    }
}

/// Repository errors keep their category: validation and not-found stay
/// what they are, everything else is a persistence failure.
impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Validation(e) => EngineError::Validation(e),
            DbError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            other => EngineError::Persistence(other),
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Config(err.to_string())
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for EngineError {
    fn from(err: toml::ser::Error) -> Self {
        EngineError::Config(err.to_string())
    }
}
