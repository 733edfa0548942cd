//! # Domain Types
//!
//! Records and value types shared by every layer of the SKU engine.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Counter      │   │  Abbreviation   │   │ PatternSetting  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  key            │   │  original_value │   │  scope_id?      │       │
//! │  │  sequence       │   │  short_code     │   │  pattern        │       │
//! │  └─────────────────┘   │  scope_id?      │   │  separator      │       │
//! │                        └─────────────────┘   │  case_type      │       │
//! │                                              └─────────────────┘       │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ SkuHistoryEntry │   │   SkuContext    │   │    SkuScope     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  old → new      │   │  category_code  │   │  Product        │       │
//! │  │  reason         │   │  product_name   │   │  Variant        │       │
//! │  │  changed_at     │   │  attributes     │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Case Type
// =============================================================================

/// Final case folding applied to a rendered SKU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum CaseType {
    #[default]
    Upper,
    Lower,
}

impl CaseType {
    /// Folds `s` according to this case type.
    pub fn apply(&self, s: &str) -> String {
        match self {
            CaseType::Upper => s.to_uppercase(),
            CaseType::Lower => s.to_lowercase(),
        }
    }
}

impl FromStr for CaseType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upper" | "uppercase" => Ok(CaseType::Upper),
            "lower" | "lowercase" => Ok(CaseType::Lower),
            _ => Err(ValidationError::NotAllowed {
                field: "case_type".to_string(),
                allowed: vec!["upper".to_string(), "lower".to_string()],
            }),
        }
    }
}

// =============================================================================
// SKU Scope
// =============================================================================

/// Which record collection a uniqueness check runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SkuScope {
    #[default]
    Product,
    Variant,
}

impl SkuScope {
    /// Maps the `is_variant` flag of the generation interface to a scope.
    pub fn from_is_variant(is_variant: bool) -> Self {
        if is_variant {
            SkuScope::Variant
        } else {
            SkuScope::Product
        }
    }
}

// =============================================================================
// Change Reason
// =============================================================================

/// Why a SKU changed. Stored verbatim in `sku_history.reason`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SkuChangeReason {
    /// The engine generated a fresh SKU for an existing record.
    Regenerate,
    /// An operator typed the SKU.
    Manual,
    /// The SKU arrived through a bulk import.
    BulkImport,
}

impl SkuChangeReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkuChangeReason::Regenerate => "regenerate",
            SkuChangeReason::Manual => "manual",
            SkuChangeReason::BulkImport => "bulk_import",
        }
    }
}

impl fmt::Display for SkuChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Abbreviation Type
// =============================================================================

/// Dictionary namespace of an abbreviation.
///
/// Only attribute values are abbreviated today; the column exists so the
/// dictionary can grow without a schema change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AbbreviationType {
    #[default]
    Attribute,
}

// =============================================================================
// Persistent Records
// =============================================================================

/// A named atomic sequence.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Counter {
    /// Counter key, normally the normalized base SKU.
    pub key: String,
    /// Last issued value. Starts at 1 on first use.
    pub sequence: i64,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A curated short code for a free-text value.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Abbreviation {
    pub id: String,
    pub abbreviation_type: AbbreviationType,
    pub original_value: String,
    pub short_code: String,
    /// `None` for dictionary-wide entries.
    pub scope_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Pattern configuration for a scope (or the global default when
/// `scope_id` is `None`).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PatternSetting {
    pub id: String,
    pub scope_id: Option<String>,
    pub pattern: String,
    pub separator: String,
    pub case_type: CaseType,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// One row of the append-only SKU audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SkuHistoryEntry {
    pub id: String,
    pub product_id: String,
    pub variant_id: Option<String>,
    /// `None` when the record had no SKU before.
    pub old_sku: Option<String>,
    pub new_sku: String,
    pub pattern_used: Option<String>,
    pub reason: SkuChangeReason,
    pub changed_by: Option<String>,
    #[ts(as = "String")]
    pub changed_at: DateTime<Utc>,
}

// =============================================================================
// SKU Owners
// =============================================================================
// Product and category CRUD live outside the engine. These carry only the
// fields SKU generation reads or writes.

/// A product category. `code` feeds `{CATEGORY_CODE}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Categories without a code cannot take part in generation.
    pub code: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A product carrying a SKU.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub category_id: Option<String>,
    pub brand_code: Option<String>,
    pub name: String,
    /// Display SKU.
    pub sku: Option<String>,
    /// Canonical SKU, unique across products.
    pub sku_normalized: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A product variant carrying its own SKU.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: String,
    pub product_id: String,
    pub attributes: crate::attributes::VariantAttributes,
    pub sku: Option<String>,
    /// Canonical SKU, unique across variants.
    pub sku_normalized: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Rendering Inputs
// =============================================================================

/// The resolved pattern configuration that generation runs with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PatternConfig {
    pub pattern: String,
    pub separator: String,
    pub case_type: CaseType,
}

impl From<PatternSetting> for PatternConfig {
    fn from(setting: PatternSetting) -> Self {
        PatternConfig {
            pattern: setting.pattern,
            separator: setting.separator,
            case_type: setting.case_type,
        }
    }
}

/// Values substituted into a pattern.
///
/// `attribute_values` must already be resolved to short codes; the compiler
/// joins them verbatim in the order given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SkuContext {
    pub category_code: Option<String>,
    pub brand_code: Option<String>,
    pub product_name: Option<String>,
    pub attribute_values: Vec<String>,
    /// Overrides the current year for `{YEAR}`.
    pub year: Option<i32>,
}

impl SkuContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category_code(mut self, code: impl Into<String>) -> Self {
        self.category_code = Some(code.into());
        self
    }

    pub fn brand_code(mut self, code: impl Into<String>) -> Self {
        self.brand_code = Some(code.into());
        self
    }

    pub fn product_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = Some(name.into());
        self
    }

    pub fn attribute(mut self, value: impl Into<String>) -> Self {
        self.attribute_values.push(value.into());
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
