//! # Abbreviation Resolver
//!
//! Turns free-text attribute values into short codes.
//!
//! ```text
//! resolve(Attribute, "Đỏ", Some("cat-shirts"))
//!      │
//!      ├── dictionary entry for (Đỏ, cat-shirts)?  → its code, uppercased
//!      ├── dictionary entry for (Đỏ, global)?      → its code, uppercased
//!      └── derive: slug "DO" → first 3 chars        → "DO"
//! ```
//!
//! Derived codes are never written back; the same input always derives the
//! same code.

use std::sync::Arc;

use tracing::debug;

use crate::error::EngineResult;
use crate::store::AbbreviationStore;
use skuforge_core::normalize::derive_short_code;
use skuforge_core::AbbreviationType;

#[derive(Clone)]
pub struct AbbreviationResolver {
    store: Arc<dyn AbbreviationStore>,
}

impl AbbreviationResolver {
    pub fn new(store: Arc<dyn AbbreviationStore>) -> Self {
        AbbreviationResolver { store }
    }

    /// Short code for `original_value`.
    ///
    /// The value is trimmed before the exact-match lookup, the same way
    /// `AbbreviationRepository::insert` trims it when storing. `" Đỏ "`
    /// finds the entry stored for `"Đỏ"`; case and inner spacing must match.
    pub async fn resolve(
        &self,
        abbreviation_type: AbbreviationType,
        original_value: &str,
        scope_id: Option<&str>,
    ) -> EngineResult<String> {
        let value = original_value.trim();

        if !value.is_empty() {
            if let Some(scope) = scope_id {
                if let Some(code) = self.store.find(abbreviation_type, value, Some(scope)).await? {
                    return Ok(code.to_uppercase());
                }
            }
            if let Some(code) = self.store.find(abbreviation_type, value, None).await? {
                return Ok(code.to_uppercase());
            }
        }

        let derived = derive_short_code(value);
        debug!(value = %value, code = %derived, "No abbreviation on file, derived short code");
        Ok(derived)
    }

    /// Resolves attribute values in order.
    pub async fn resolve_all(
        &self,
        values: &[String],
        scope_id: Option<&str>,
    ) -> EngineResult<Vec<String>> {
        let mut codes = Vec::with_capacity(values.len());
        for value in values {
            codes.push(self.resolve(AbbreviationType::Attribute, value, scope_id).await?);
        }
        Ok(codes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store_memory::MemoryStore;

    async fn resolver() -> AbbreviationResolver {
        let store = MemoryStore::new();
        store.add_abbreviation("Đỏ", "red", None).await;
        store.add_abbreviation("Large", "L", None).await;
        store.add_abbreviation("Large", "LG", Some("cat-shoes")).await;
        AbbreviationResolver::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_seeded_codes_are_uppercased() {
        let resolver = resolver().await;
        assert_eq!(
            resolver.resolve(AbbreviationType::Attribute, "Đỏ", None).await.unwrap(),
            "RED"
        );
    }

    #[tokio::test]
    async fn test_scope_then_global() {
        let resolver = resolver().await;
        let attr = AbbreviationType::Attribute;

        assert_eq!(resolver.resolve(attr, "Large", Some("cat-shoes")).await.unwrap(), "LG");
        assert_eq!(resolver.resolve(attr, "Large", Some("cat-hats")).await.unwrap(), "L");
        assert_eq!(resolver.resolve(attr, "Large", None).await.unwrap(), "L");
    }

    #[tokio::test]
    async fn test_unseeded_values_derive_deterministically() {
        let resolver = resolver().await;
        let attr = AbbreviationType::Attribute;

        let first = resolver.resolve(attr, "Xanh Dương", None).await.unwrap();
        let second = resolver.resolve(attr, "Xanh Dương", None).await.unwrap();
        assert_eq!(first, "XAN");
        assert_eq!(first, second);

        assert_eq!(resolver.resolve(attr, "  ", None).await.unwrap(), "XXX");
        assert_eq!(resolver.resolve(attr, "!!!", None).await.unwrap(), "XXX");
    }

    #[tokio::test]
    async fn test_lookup_trims_but_is_otherwise_exact() {
        let resolver = resolver().await;
        let attr = AbbreviationType::Attribute;

        assert_eq!(resolver.resolve(attr, "  Đỏ ", None).await.unwrap(), "RED");
        assert_eq!(resolver.resolve(attr, "large", None).await.unwrap(), "LAR");
    }

    #[tokio::test]
    async fn test_resolve_all_keeps_order() {
        let resolver = resolver().await;
        let values = vec!["Large".to_string(), "Đỏ".to_string(), "Cotton".to_string()];

        assert_eq!(
            resolver.resolve_all(&values, None).await.unwrap(),
            vec!["L", "RED", "COT"]
        );
    }
}
