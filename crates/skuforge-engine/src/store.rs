//! # Store Traits
//!
//! The collaborators the generator talks to, and their SQLite
//! implementations.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Trait                  SQLite implementation      Memory (store_memory)│
//! │  ─────                  ─────────────────────      ──────────────────── │
//! │  CounterStore           CounterRepository          MemoryStore          │
//! │  AbbreviationStore      AbbreviationRepository     MemoryStore          │
//! │  SkuIndex               Database (products +       MemoryStore          │
//! │                         variants)                                       │
//! │  HistoryStore           SkuHistoryRepository       MemoryStore          │
//! │  CategoryResolver       CategoryRepository         MemoryStore          │
//! │  PatternConfigResolver  SettingsPatternResolver    MemoryStore          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;

use crate::error::{EngineError, EngineResult};
use skuforge_core::{AbbreviationType, PatternConfig, SkuHistoryEntry, SkuScope};
use skuforge_db::{
    AbbreviationRepository, CategoryRepository, CounterRepository, Database,
    PatternSettingRepository, SkuHistoryRepository,
};

// =============================================================================
// Traits
// =============================================================================

/// Named sequences, strictly increasing per key, starting at 1.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically increments and returns the new value.
    async fn next_value(&self, key: &str) -> EngineResult<i64>;

    /// Last issued value, `None` before first use. Never mutates.
    async fn current_value(&self, key: &str) -> EngineResult<Option<i64>>;
}

/// The curated abbreviation dictionary.
#[async_trait]
pub trait AbbreviationStore: Send + Sync {
    /// Exact lookup; `scope_id = None` only sees dictionary-wide entries.
    async fn find(
        &self,
        abbreviation_type: AbbreviationType,
        original_value: &str,
        scope_id: Option<&str>,
    ) -> EngineResult<Option<String>>;
}

/// Existence checks over persisted canonical SKUs.
#[async_trait]
pub trait SkuIndex: Send + Sync {
    async fn exists(
        &self,
        normalized: &str,
        exclude_id: Option<&str>,
        scope: SkuScope,
    ) -> EngineResult<bool>;
}

/// Append-only history sink.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, entry: &SkuHistoryEntry) -> EngineResult<()>;
}

/// Category id to category code.
#[async_trait]
pub trait CategoryResolver: Send + Sync {
    /// Fails with `NotFound` when the category is missing or has no code.
    async fn category_code(&self, category_id: &str) -> EngineResult<String>;
}

/// Which pattern a scope generates with.
#[async_trait]
pub trait PatternConfigResolver: Send + Sync {
    /// Scoped setting, else the global setting, else the configured default.
    async fn pattern_for(&self, scope_id: Option<&str>) -> EngineResult<PatternConfig>;
}

// =============================================================================
// SQLite Implementations
// =============================================================================

#[async_trait]
impl CounterStore for CounterRepository {
    async fn next_value(&self, key: &str) -> EngineResult<i64> {
        Ok(CounterRepository::next_value(self, key).await?)
    }

    async fn current_value(&self, key: &str) -> EngineResult<Option<i64>> {
        Ok(CounterRepository::current_value(self, key).await?)
    }
}

#[async_trait]
impl AbbreviationStore for AbbreviationRepository {
    async fn find(
        &self,
        abbreviation_type: AbbreviationType,
        original_value: &str,
        scope_id: Option<&str>,
    ) -> EngineResult<Option<String>> {
        let entry = AbbreviationRepository::find(self, abbreviation_type, original_value, scope_id).await?;
        Ok(entry.map(|e| e.short_code))
    }
}

#[async_trait]
impl SkuIndex for Database {
    async fn exists(
        &self,
        normalized: &str,
        exclude_id: Option<&str>,
        scope: SkuScope,
    ) -> EngineResult<bool> {
        let exists = match scope {
            SkuScope::Product => self.products().sku_exists(normalized, exclude_id).await?,
            SkuScope::Variant => self.variants().sku_exists(normalized, exclude_id).await?,
        };
        Ok(exists)
    }
}

#[async_trait]
impl HistoryStore for SkuHistoryRepository {
    async fn append(&self, entry: &SkuHistoryEntry) -> EngineResult<()> {
        Ok(SkuHistoryRepository::append(self, entry).await?)
    }
}

#[async_trait]
impl CategoryResolver for CategoryRepository {
    async fn category_code(&self, category_id: &str) -> EngineResult<String> {
        match self.code_for(category_id).await? {
            Some(code) if !code.trim().is_empty() => Ok(code),
            _ => Err(EngineError::not_found("Category code", category_id)),
        }
    }
}

/// Pattern settings from SQLite with a configured fallback.
#[derive(Debug, Clone)]
pub struct SettingsPatternResolver {
    settings: PatternSettingRepository,
    fallback: PatternConfig,
}

impl SettingsPatternResolver {
    pub fn new(settings: PatternSettingRepository, fallback: PatternConfig) -> Self {
        SettingsPatternResolver { settings, fallback }
    }
}

#[async_trait]
impl PatternConfigResolver for SettingsPatternResolver {
    async fn pattern_for(&self, scope_id: Option<&str>) -> EngineResult<PatternConfig> {
        let config = self
            .settings
            .resolve(scope_id)
            .await?
            .map(PatternConfig::from)
            .unwrap_or_else(|| self.fallback.clone());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skuforge_core::CaseType;
    use skuforge_db::DbConfig;

    #[tokio::test]
    async fn test_sku_index_checks_the_right_table() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db.products().insert(None, None, "Shirt").await.unwrap();
        db.products().update_sku(&product.id, "SH-001").await.unwrap();

        assert!(db.exists("SH001", None, SkuScope::Product).await.unwrap());
        assert!(!db.exists("SH001", None, SkuScope::Variant).await.unwrap());
        assert!(!db
            .exists("SH001", Some(&product.id), SkuScope::Product)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_category_without_code_is_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let with_code = db.categories().insert("Shirts", Some("AT")).await.unwrap();
        let without = db.categories().insert("Misc", None).await.unwrap();

        let categories = db.categories();
        assert_eq!(categories.category_code(&with_code.id).await.unwrap(), "AT");
        assert_eq!(
            categories.category_code(&without.id).await.unwrap_err().code(),
            "NOT_FOUND"
        );
    }

    #[tokio::test]
    async fn test_pattern_resolver_falls_back_to_config() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let fallback = PatternConfig {
            pattern: "{CATEGORY_CODE}-{INCREMENT}".into(),
            separator: "-".into(),
            case_type: CaseType::Upper,
        };
        let resolver = SettingsPatternResolver::new(db.pattern_settings(), fallback.clone());

        assert_eq!(resolver.pattern_for(Some("cat")).await.unwrap(), fallback);

        db.pattern_settings()
            .upsert(Some("cat"), "{BRAND_CODE}", "_", CaseType::Lower)
            .await
            .unwrap();
        let scoped = resolver.pattern_for(Some("cat")).await.unwrap();
        assert_eq!(scoped.pattern, "{BRAND_CODE}");
        assert_eq!(resolver.pattern_for(None).await.unwrap(), fallback);
    }
}
