//! # Uniqueness Guard
//!
//! Compares SKUs by canonical form, so `AT-RED-L-001` and `at_red_l_001`
//! are the same SKU.

use std::sync::Arc;

use crate::error::EngineResult;
use crate::store::SkuIndex;
use skuforge_core::normalize::normalize_sku;
use skuforge_core::SkuScope;

#[derive(Clone)]
pub struct UniquenessGuard {
    index: Arc<dyn SkuIndex>,
}

impl UniquenessGuard {
    pub fn new(index: Arc<dyn SkuIndex>) -> Self {
        UniquenessGuard { index }
    }

    /// Canonical form used for comparison and storage.
    pub fn normalize(sku: &str) -> String {
        normalize_sku(sku)
    }

    /// Whether a record other than `exclude_id` owns `canonical` in `scope`.
    pub async fn exists(
        &self,
        canonical: &str,
        exclude_id: Option<&str>,
        scope: SkuScope,
    ) -> EngineResult<bool> {
        self.index.exists(canonical, exclude_id, scope).await
    }

    /// Normalizes `sku`, then checks it.
    pub async fn is_taken(
        &self,
        sku: &str,
        exclude_id: Option<&str>,
        scope: SkuScope,
    ) -> EngineResult<bool> {
        self.exists(&Self::normalize(sku), exclude_id, scope).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store_memory::MemoryStore;

    #[test]
    fn test_normalize_is_idempotent() {
        let once = UniquenessGuard::normalize("at_red_l_001");
        assert_eq!(once, "ATREDL001");
        assert_eq!(UniquenessGuard::normalize(&once), once);
        assert_eq!(UniquenessGuard::normalize("AT-RED-L-001"), once);
    }

    #[tokio::test]
    async fn test_is_taken_compares_canonical_forms() {
        let store = Arc::new(MemoryStore::new());
        store.claim_sku(SkuScope::Variant, "ATREDL001", "v1").await;
        let guard = UniquenessGuard::new(store);

        assert!(guard.is_taken("at-red-l-001", None, SkuScope::Variant).await.unwrap());
        assert!(!guard.is_taken("AT.RED.L.001", Some("v1"), SkuScope::Variant).await.unwrap());
        assert!(!guard.is_taken("AT-RED-L-001", None, SkuScope::Product).await.unwrap());
    }
}
