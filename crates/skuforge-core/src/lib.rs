//! # skuforge-core: Pure SKU Logic
//!
//! This crate is the **heart** of the SKU engine. Everything here is a pure
//! function of its inputs: no database, no counters, no logging.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SKU Forge Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              skuforge-engine (orchestration)                    │   │
//! │  │    SkuGenerator, AbbreviationResolver, HistoryLogger, Service   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ skuforge-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  pattern  │  │ normalize │  │attributes │  │ validation│  │   │
//! │  │   │  render   │  │ slugify   │  │ AttrBag   │  │   rules   │  │   │
//! │  │   │  tokens   │  │ short code│  │ duplicates│  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO COUNTERS • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  skuforge-db (Database Layer)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Records (Counter, Abbreviation, PatternSetting, history) and inputs
//! - [`pattern`] - Pattern compiler and generation path selection
//! - [`normalize`] - SKU normalization, slugs, derived short codes
//! - [`attributes`] - Variant attribute bags and duplicate detection
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use skuforge_core::pattern::render;
//! use skuforge_core::normalize::normalize_sku;
//! use skuforge_core::{CaseType, SkuContext};
//!
//! let ctx = SkuContext::new().category_code("AT").product_name("Áo Thun");
//! let sku = render("{CATEGORY_CODE}-{PRODUCT_NAME}-{INCREMENT}", &ctx, "-", CaseType::Upper, Some(1)).unwrap();
//!
//! assert_eq!(sku, "AT-AOTHUN-001");
//! assert_eq!(normalize_sku(&sku), "ATAOTHUN001");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod attributes;
pub mod error;
pub mod normalize;
pub mod pattern;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use attributes::{AttributeBag, VariantAttributes};
pub use error::{CoreError, CoreResult, ValidationError};
pub use pattern::{CompiledPattern, GenerationPath};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Pattern used when neither a scoped nor a global setting exists.
pub const DEFAULT_PATTERN: &str = "{CATEGORY_CODE}-{PRODUCT_NAME}-{INCREMENT}";

/// Separator used when neither a scoped nor a global setting exists.
pub const DEFAULT_SEPARATOR: &str = "-";

/// Default Path 2 retry budget.
pub const DEFAULT_MAX_RETRIES: u32 = 5;
