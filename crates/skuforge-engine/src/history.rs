//! # History Logger
//!
//! Records SKU changes in the append-only audit trail.
//!
//! A failed write never fails the SKU assignment it describes. It is logged
//! at `error` level with every field of the lost entry and counted in
//! [`HistoryLogger::failure_count`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error};
use uuid::Uuid;

use crate::store::HistoryStore;
use skuforge_core::{SkuChangeReason, SkuHistoryEntry};

/// One SKU change to record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkuChange {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub old_sku: Option<String>,
    pub new_sku: String,
    pub reason: SkuChangeReason,
    pub pattern_used: Option<String>,
    pub changed_by: Option<String>,
}

impl SkuChange {
    pub fn new(
        product_id: impl Into<String>,
        old_sku: Option<String>,
        new_sku: impl Into<String>,
        reason: SkuChangeReason,
    ) -> Self {
        SkuChange {
            product_id: product_id.into(),
            variant_id: None,
            old_sku,
            new_sku: new_sku.into(),
            reason,
            pattern_used: None,
            changed_by: None,
        }
    }

    pub fn variant(mut self, variant_id: impl Into<String>) -> Self {
        self.variant_id = Some(variant_id.into());
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern_used = Some(pattern.into());
        self
    }

    pub fn changed_by(mut self, user: Option<&str>) -> Self {
        self.changed_by = user.map(str::to_string);
        self
    }

    fn into_entry(self) -> SkuHistoryEntry {
        SkuHistoryEntry {
            id: Uuid::new_v4().to_string(),
            product_id: self.product_id,
            variant_id: self.variant_id,
            old_sku: self.old_sku,
            new_sku: self.new_sku,
            pattern_used: self.pattern_used,
            reason: self.reason,
            changed_by: self.changed_by,
            changed_at: Utc::now(),
        }
    }
}

/// Writes [`SkuChange`]s to a [`HistoryStore`], swallowing failures.
pub struct HistoryLogger {
    store: Arc<dyn HistoryStore>,
    failures: AtomicU64,
}

impl HistoryLogger {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        HistoryLogger {
            store,
            failures: AtomicU64::new(0),
        }
    }

    /// Records `change`. Never fails.
    pub async fn log_change(&self, change: SkuChange) {
        let entry = change.into_entry();

        match self.store.append(&entry).await {
            Ok(()) => debug!(
                product_id = %entry.product_id,
                new_sku = %entry.new_sku,
                reason = %entry.reason,
                "SKU change recorded"
            ),
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                error!(
                    error = %e,
                    id = %entry.id,
                    product_id = %entry.product_id,
                    variant_id = ?entry.variant_id,
                    old_sku = ?entry.old_sku,
                    new_sku = %entry.new_sku,
                    pattern_used = ?entry.pattern_used,
                    reason = %entry.reason,
                    changed_by = ?entry.changed_by,
                    changed_at = %entry.changed_at,
                    "Failed to record SKU history"
                );
            }
        }
    }

    /// History writes lost since this logger was created.
    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store_memory::MemoryStore;

    #[tokio::test]
    async fn test_log_change_appends_entry() {
        let store = Arc::new(MemoryStore::new());
        let logger = HistoryLogger::new(store.clone());

        logger
            .log_change(
                SkuChange::new("p1", Some("AT-001".into()), "AT-002", SkuChangeReason::Regenerate)
                    .variant("v1")
                    .pattern("{CATEGORY_CODE}-{INCREMENT}")
                    .changed_by(Some("admin")),
            )
            .await;

        let history = store.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].old_sku.as_deref(), Some("AT-001"));
        assert_eq!(history[0].variant_id.as_deref(), Some("v1"));
        assert_eq!(history[0].changed_by.as_deref(), Some("admin"));
        assert_eq!(logger.failure_count(), 0);
    }

    #[tokio::test]
    async fn test_failures_are_swallowed_and_counted() {
        let store = Arc::new(MemoryStore::new());
        store.reject_history(true);
        let logger = HistoryLogger::new(store.clone());

        logger
            .log_change(SkuChange::new("p1", None, "AT-001", SkuChangeReason::Manual))
            .await;
        logger
            .log_change(SkuChange::new("p1", None, "AT-002", SkuChangeReason::Manual))
            .await;

        assert_eq!(logger.failure_count(), 2);
        assert!(store.history().await.is_empty());
    }
}
