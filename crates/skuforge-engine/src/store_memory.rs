//! # In-Memory Store
//!
//! Every store trait over one mutex-guarded state. Used by the engine's unit
//! tests and by callers that embed the generator without SQLite.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{EngineError, EngineResult};
use crate::store::{
    AbbreviationStore, CategoryResolver, CounterStore, HistoryStore, PatternConfigResolver, SkuIndex,
};
use skuforge_core::{AbbreviationType, PatternConfig, SkuHistoryEntry, SkuScope};

#[derive(Debug, Default)]
struct State {
    counters: HashMap<String, i64>,
    abbreviations: Vec<(AbbreviationType, String, Option<String>, String)>,
    /// (scope, normalized sku) → owner id
    skus: HashMap<(SkuScope, String), String>,
    history: Vec<SkuHistoryEntry>,
    categories: HashMap<String, Option<String>>,
    patterns: HashMap<Option<String>, PatternConfig>,
}

/// In-memory implementation of every store trait.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    reject_history: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_abbreviation(&self, value: &str, short_code: &str, scope_id: Option<&str>) {
        self.state.lock().await.abbreviations.push((
            AbbreviationType::Attribute,
            value.to_string(),
            scope_id.map(str::to_string),
            short_code.to_string(),
        ));
    }

    /// Records `normalized` as owned by `owner_id`.
    pub async fn claim_sku(&self, scope: SkuScope, normalized: &str, owner_id: &str) {
        self.state
            .lock()
            .await
            .skus
            .insert((scope, normalized.to_string()), owner_id.to_string());
    }

    pub async fn add_category(&self, id: &str, code: Option<&str>) {
        self.state
            .lock()
            .await
            .categories
            .insert(id.to_string(), code.map(str::to_string));
    }

    pub async fn set_pattern(&self, scope_id: Option<&str>, config: PatternConfig) {
        self.state
            .lock()
            .await
            .patterns
            .insert(scope_id.map(str::to_string), config);
    }

    pub async fn history(&self) -> Vec<SkuHistoryEntry> {
        self.state.lock().await.history.clone()
    }

    /// Makes every following history append fail.
    pub fn reject_history(&self, reject: bool) {
        self.reject_history.store(reject, Ordering::SeqCst);
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn next_value(&self, key: &str) -> EngineResult<i64> {
        let mut state = self.state.lock().await;
        let value = state.counters.entry(key.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }

    async fn current_value(&self, key: &str) -> EngineResult<Option<i64>> {
        Ok(self.state.lock().await.counters.get(key).copied())
    }
}

#[async_trait]
impl AbbreviationStore for MemoryStore {
    async fn find(
        &self,
        abbreviation_type: AbbreviationType,
        original_value: &str,
        scope_id: Option<&str>,
    ) -> EngineResult<Option<String>> {
        let state = self.state.lock().await;
        let code = state
            .abbreviations
            .iter()
            .find(|(t, value, scope, _)| {
                *t == abbreviation_type && value == original_value && scope.as_deref() == scope_id
            })
            .map(|(_, _, _, code)| code.clone());
        Ok(code)
    }
}

#[async_trait]
impl SkuIndex for MemoryStore {
    async fn exists(
        &self,
        normalized: &str,
        exclude_id: Option<&str>,
        scope: SkuScope,
    ) -> EngineResult<bool> {
        let state = self.state.lock().await;
        let owner = state.skus.get(&(scope, normalized.to_string()));
        Ok(matches!(owner, Some(id) if Some(id.as_str()) != exclude_id))
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn append(&self, entry: &SkuHistoryEntry) -> EngineResult<()> {
        if self.reject_history.load(Ordering::SeqCst) {
            return Err(EngineError::Persistence(skuforge_db::DbError::QueryFailed(
                "history store unavailable".to_string(),
            )));
        }
        self.state.lock().await.history.push(entry.clone());
        Ok(())
    }
}

#[async_trait]
impl CategoryResolver for MemoryStore {
    async fn category_code(&self, category_id: &str) -> EngineResult<String> {
        let state = self.state.lock().await;
        match state.categories.get(category_id) {
            Some(Some(code)) if !code.trim().is_empty() => Ok(code.clone()),
            _ => Err(EngineError::not_found("Category code", category_id)),
        }
    }
}

#[async_trait]
impl PatternConfigResolver for MemoryStore {
    async fn pattern_for(&self, scope_id: Option<&str>) -> EngineResult<PatternConfig> {
        let state = self.state.lock().await;
        let scoped = scope_id.and_then(|s| state.patterns.get(&Some(s.to_string())));
        scoped
            .or_else(|| state.patterns.get(&None))
            .cloned()
            .ok_or_else(|| EngineError::not_found("Pattern setting", scope_id.unwrap_or("global")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skuforge_core::CaseType;

    #[tokio::test]
    async fn test_counters_and_index() {
        let store = MemoryStore::new();
        assert_eq!(store.current_value("K").await.unwrap(), None);
        assert_eq!(store.next_value("K").await.unwrap(), 1);
        assert_eq!(store.next_value("K").await.unwrap(), 2);

        store.claim_sku(SkuScope::Product, "AT001", "p1").await;
        assert!(store.exists("AT001", None, SkuScope::Product).await.unwrap());
        assert!(!store.exists("AT001", Some("p1"), SkuScope::Product).await.unwrap());
        assert!(!store.exists("AT001", None, SkuScope::Variant).await.unwrap());
    }

    #[tokio::test]
    async fn test_pattern_fallback() {
        let store = MemoryStore::new();
        assert!(store.pattern_for(None).await.is_err());

        let global = PatternConfig {
            pattern: "{CATEGORY_CODE}-{INCREMENT}".into(),
            separator: "-".into(),
            case_type: CaseType::Upper,
        };
        store.set_pattern(None, global.clone()).await;
        assert_eq!(store.pattern_for(Some("cat")).await.unwrap(), global);
    }
}
