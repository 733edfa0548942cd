//! # skuforge-db: Database Layer for SKU Forge
//!
//! SQLite storage for counters, the abbreviation dictionary, pattern
//! settings, SKU owners (products and variants) and the history trail.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SKU Forge Data Flow                              │
//! │                                                                         │
//! │  SkuService::regenerate_product_sku                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   skuforge-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ CounterRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ ProductRepo   │    │ 001_initial  │  │   │
//! │  │   │ WAL + busy    │    │ HistoryRepo   │    │              │  │   │
//! │  │   │ timeout       │    │ ...           │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   <data dir>/com.skuforge.engine/skuforge.db                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use skuforge_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/skuforge.db")).await?;
//!
//! let next = db.counters().next_value("ATAOTHUN").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::abbreviation::AbbreviationRepository;
pub use repository::category::CategoryRepository;
pub use repository::counter::CounterRepository;
pub use repository::history::SkuHistoryRepository;
pub use repository::pattern_setting::PatternSettingRepository;
pub use repository::product::ProductRepository;
pub use repository::variant::VariantRepository;
