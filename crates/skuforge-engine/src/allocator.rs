//! # Sequence Allocator
//!
//! Hands out per-key sequence numbers from a [`CounterStore`]. The store
//! makes each allocation a single atomic step; this module only decides
//! which key a base SKU counts under.

use std::sync::Arc;

use tracing::debug;

use crate::error::EngineResult;
use crate::store::CounterStore;
use skuforge_core::normalize::normalize_sku;
use skuforge_core::pattern::INCREMENT_TOKEN;

/// Counter key of a rendered base SKU: its canonical form, else the literal
/// base, else one shared key for patterns that render nothing but the
/// increment.
pub fn counter_key(base_sku: &str) -> String {
    let normalized = normalize_sku(base_sku);
    if !normalized.is_empty() {
        return normalized;
    }
    let literal = base_sku.trim();
    if !literal.is_empty() {
        return literal.to_string();
    }
    INCREMENT_TOKEN.to_string()
}

#[derive(Clone)]
pub struct SequenceAllocator {
    counters: Arc<dyn CounterStore>,
}

impl SequenceAllocator {
    pub fn new(counters: Arc<dyn CounterStore>) -> Self {
        SequenceAllocator { counters }
    }

    /// Allocates the next value for `key`. The value is consumed even if the
    /// caller never uses it.
    pub async fn next(&self, key: &str) -> EngineResult<i64> {
        let value = self.counters.next_value(key).await?;
        debug!(key = %key, value, "Sequence allocated");
        Ok(value)
    }

    /// Last issued value without allocating.
    pub async fn current(&self, key: &str) -> EngineResult<Option<i64>> {
        self.counters.current_value(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store_memory::MemoryStore;

    #[test]
    fn test_counter_key() {
        assert_eq!(counter_key("AT-AOTHUN"), "ATAOTHUN");
        assert_eq!(counter_key("at_aothun"), "ATAOTHUN");
        assert_eq!(counter_key("--"), "--");
        assert_eq!(counter_key(""), "{INCREMENT}");
    }

    #[tokio::test]
    async fn test_next_and_current() {
        let allocator = SequenceAllocator::new(Arc::new(MemoryStore::new()));

        assert_eq!(allocator.current("ATAOTHUN").await.unwrap(), None);
        assert_eq!(allocator.next("ATAOTHUN").await.unwrap(), 1);
        assert_eq!(allocator.next("ATAOTHUN").await.unwrap(), 2);
        assert_eq!(allocator.current("ATAOTHUN").await.unwrap(), Some(2));
    }
}
