//! # Repository Module
//!
//! Database repository implementations for the SKU engine.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Who Calls What                                       │
//! │                                                                         │
//! │  SkuGenerator (skuforge-engine)                                        │
//! │       │                                                                 │
//! │       │  store traits (CounterStore, SkuIndex, ...)                    │
//! │       ▼                                                                 │
//! │  CounterRepository      next_value / current_value                     │
//! │  AbbreviationRepository find / insert / list                           │
//! │  PatternSettingRepository resolve / upsert                             │
//! │  ProductRepository      sku_exists / update_sku                        │
//! │  VariantRepository      sku_exists / update_sku                        │
//! │  SkuHistoryRepository   append / list_for_product                      │
//! │  CategoryRepository     code_for                                       │
//! │       │                                                                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod abbreviation;
pub mod category;
pub mod counter;
pub mod history;
pub mod pattern_setting;
pub mod product;
pub mod variant;
