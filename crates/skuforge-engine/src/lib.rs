//! # skuforge-engine: SKU Generation Orchestrator
//!
//! Turns a pattern plus product context into a unique SKU, assigns it to a
//! product or variant, and records the change.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     skuforge-engine (THIS CRATE)                        │
//! │                                                                         │
//! │  SkuService ───────────────► SkuGenerator                               │
//! │   (service.rs)                (generator.rs)                            │
//! │       │                            │                                    │
//! │       │                 ┌──────────┼──────────────┐                     │
//! │       │                 ▼          ▼              ▼                     │
//! │       │        AbbreviationResolver  SequenceAllocator  UniquenessGuard │
//! │       │          (resolver.rs)      (allocator.rs)      (guard.rs)      │
//! │       ▼                 │          │              │                     │
//! │  HistoryLogger          └──────────┼──────────────┘                     │
//! │   (history.rs)                     ▼                                    │
//! │       │                 Store traits (store.rs)                         │
//! │       └────────────────►  SQLite: skuforge-db repositories             │
//! │                           Memory: MemoryStore (store_memory.rs)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Generation Paths
//!
//! | Pattern contains `{INCREMENT}` | Uniqueness from                       |
//! |--------------------------------|---------------------------------------|
//! | yes (path 1)                   | atomic counter keyed by the base SKU  |
//! | no (path 2)                    | numeric suffix `-01`, `-02`, ...      |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use skuforge_engine::{EngineConfig, SkuService};
//!
//! let service = SkuService::connect(EngineConfig::load_or_default(None)).await?;
//! let product = service.regenerate_product_sku(&product_id, Some("admin")).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocator;
pub mod config;
pub mod error;
pub mod generator;
pub mod guard;
pub mod history;
pub mod resolver;
pub mod service;
pub mod store;
pub mod store_memory;

// =============================================================================
// Re-exports
// =============================================================================

pub use allocator::SequenceAllocator;
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use generator::{GenerateRequest, SkuGenerator};
pub use guard::UniquenessGuard;
pub use history::{HistoryLogger, SkuChange};
pub use resolver::AbbreviationResolver;
pub use service::{BulkRowOutcome, BulkRowStatus, BulkSkuRow, ProductSkuRequest, SkuService};
pub use store::{
    AbbreviationStore, CategoryResolver, CounterStore, HistoryStore, PatternConfigResolver,
    SettingsPatternResolver, SkuIndex,
};
pub use store_memory::MemoryStore;
