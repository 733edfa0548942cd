//! # SKU Generator
//!
//! Two generation paths, picked by whether the pattern has `{INCREMENT}`.
//!
//! ## Path 1: WithIncrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  "{CATEGORY_CODE}-{PRODUCT_NAME}-{INCREMENT}"                          │
//! │       │                                                                 │
//! │       ▼ base pattern "{CATEGORY_CODE}-{PRODUCT_NAME}" → "AT-AOTHUN"    │
//! │       ▼ counter key "ATAOTHUN" → next_value → 7                        │
//! │       ▼ render with 7 → "AT-AOTHUN-007"                                │
//! │       │                                                                 │
//! │       ├── free?  → done                                                │
//! │       └── taken (manual SKU, import) → allocate once more → 8          │
//! │               ├── free?  → "AT-AOTHUN-008"                             │
//! │               └── taken  → GenerationExhausted                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! The counter upsert is atomic, so concurrent callers on the same key never
//! see the same number.
//!
//! ## Path 2: WithoutIncrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  "{CATEGORY_CODE}-{PRODUCT_NAME}"  → "AT-AOTHUN"                       │
//! │       │                                                                 │
//! │       ├── free?  → "AT-AOTHUN"                                         │
//! │       └── taken  → up to max_retries times:                            │
//! │               next_value("ATAOTHUN") → n → "AT-AOTHUN-0n"              │
//! │               first free candidate wins                                │
//! │           all taken → GenerationExhausted                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Check-then-use is not atomic here; the UNIQUE index on `sku_normalized`
//! rejects the loser of a race at write time.
//!
//! ## Preview
//! No counter is touched: Path 1 renders `###` in place of the number and
//! Path 2 returns the base unchecked.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::allocator::{counter_key, SequenceAllocator};
use crate::error::{EngineError, EngineResult};
use crate::guard::UniquenessGuard;
use crate::resolver::AbbreviationResolver;
use crate::store::{AbbreviationStore, CounterStore, SkuIndex};
use skuforge_core::normalize::normalize_sku;
use skuforge_core::pattern::{base_pattern, cleanup_separators, CompiledPattern};
use skuforge_core::validation::{validate_max_retries, validate_separator};
use skuforge_core::{
    CaseType, GenerationPath, PatternConfig, SkuContext, SkuScope, ValidationError, DEFAULT_MAX_RETRIES,
};

// =============================================================================
// Request
// =============================================================================

/// One generation call.
///
/// `context.attribute_values` holds the raw attribute values; they are
/// resolved to short codes before rendering.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub pattern: String,
    pub context: SkuContext,
    pub separator: String,
    pub case_type: CaseType,
    /// Record whose own SKU does not count as a collision.
    pub exclude_id: Option<String>,
    pub scope: SkuScope,
    pub preview: bool,
    /// Dictionary scope for attribute abbreviations.
    pub abbreviation_scope: Option<String>,
}

impl GenerateRequest {
    pub fn new(config: PatternConfig, context: SkuContext) -> Self {
        GenerateRequest {
            pattern: config.pattern,
            context,
            separator: config.separator,
            case_type: config.case_type,
            exclude_id: None,
            scope: SkuScope::Product,
            preview: false,
            abbreviation_scope: None,
        }
    }

    pub fn exclude(mut self, id: impl Into<String>) -> Self {
        self.exclude_id = Some(id.into());
        self
    }

    pub fn variant(mut self, is_variant: bool) -> Self {
        self.scope = SkuScope::from_is_variant(is_variant);
        self
    }

    pub fn preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    pub fn abbreviation_scope(mut self, scope: Option<impl Into<String>>) -> Self {
        self.abbreviation_scope = scope.map(Into::into);
        self
    }

    pub fn path(&self) -> GenerationPath {
        GenerationPath::for_pattern(&self.pattern)
    }
}

// =============================================================================
// Generator
// =============================================================================

/// Generates unique SKUs.
///
/// ## Example
/// ```rust,ignore
/// let generator = SkuGenerator::new(counters, abbreviations, index);
/// let request = GenerateRequest::new(config, SkuContext::new().category_code("AT").product_name("Áo Thun"));
/// let sku = generator.generate(&request).await?; // "AT-AOTHUN-001"
/// ```
#[derive(Clone)]
pub struct SkuGenerator {
    resolver: AbbreviationResolver,
    allocator: SequenceAllocator,
    guard: UniquenessGuard,
    max_retries: u32,
}

impl SkuGenerator {
    pub fn new(
        counters: Arc<dyn CounterStore>,
        abbreviations: Arc<dyn AbbreviationStore>,
        index: Arc<dyn SkuIndex>,
    ) -> Self {
        SkuGenerator {
            resolver: AbbreviationResolver::new(abbreviations),
            allocator: SequenceAllocator::new(counters),
            guard: UniquenessGuard::new(index),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Sets the Path 2 suffix budget (1..=99).
    pub fn with_max_retries(mut self, max_retries: u32) -> EngineResult<Self> {
        validate_max_retries(max_retries)?;
        self.max_retries = max_retries;
        Ok(self)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Generates (or previews) a SKU.
    ///
    /// ## Errors
    /// * `Validation` - bad pattern or separator, missing category code or
    ///   product name
    /// * `GenerationExhausted` - every candidate collided
    /// * `Persistence` - a store failed
    pub async fn generate(&self, request: &GenerateRequest) -> EngineResult<String> {
        let compiled = CompiledPattern::parse(&request.pattern)?;
        validate_separator(&request.separator)?;
        let context = self.resolved_context(request).await?;

        let path = request.path();
        debug!(pattern = %request.pattern, ?path, preview = request.preview, "Generating SKU");

        match path {
            GenerationPath::WithIncrement => {
                self.generate_with_increment(request, &compiled, &context).await
            }
            GenerationPath::WithoutIncrement => {
                self.generate_without_increment(request, &compiled, &context).await
            }
        }
    }

    async fn generate_with_increment(
        &self,
        request: &GenerateRequest,
        compiled: &CompiledPattern,
        context: &SkuContext,
    ) -> EngineResult<String> {
        let separator = request.separator.as_str();

        if request.preview {
            return Ok(compiled.render(context, separator, request.case_type, None)?);
        }

        let base = render_base(request, context)?;
        let key = counter_key(&base);

        let sequence = self.allocator.next(&key).await?;
        let sku = compiled.render(context, separator, request.case_type, Some(sequence))?;
        if !self.is_taken(request, &sku).await? {
            return Ok(sku);
        }

        // Only a SKU written outside the counter (manual, import) can collide.
        warn!(sku = %sku, key = %key, "Sequenced SKU already taken, allocating once more");

        let sequence = self.allocator.next(&key).await?;
        let retry = compiled.render(context, separator, request.case_type, Some(sequence))?;
        if !self.is_taken(request, &retry).await? {
            return Ok(retry);
        }

        warn!(sku = %retry, key = %key, "Retry SKU also taken");
        Err(EngineError::GenerationExhausted {
            base_sku: base,
            attempts: 2,
        })
    }

    async fn generate_without_increment(
        &self,
        request: &GenerateRequest,
        compiled: &CompiledPattern,
        context: &SkuContext,
    ) -> EngineResult<String> {
        let separator = request.separator.as_str();
        let base = compiled.render(context, separator, request.case_type, None)?;

        // Nothing for the index to hold: every token rendered empty
        if normalize_sku(&base).is_empty() {
            return Err(ValidationError::invalid(
                "pattern",
                format!("'{}' renders an empty SKU for this product", request.pattern),
            )
            .into());
        }

        if request.preview || !self.is_taken(request, &base).await? {
            return Ok(base);
        }

        let key = counter_key(&base);
        for attempt in 1..=self.max_retries {
            let suffix = self.allocator.next(&key).await?;
            let candidate = cleanup_separators(&format!("{base}{separator}{suffix:02}"), separator);

            if !self.is_taken(request, &candidate).await? {
                debug!(sku = %candidate, attempt, "Suffixed SKU is free");
                return Ok(candidate);
            }
            debug!(sku = %candidate, attempt, "Suffixed SKU taken");
        }

        warn!(base = %base, attempts = self.max_retries, "SKU generation exhausted");
        Err(EngineError::GenerationExhausted {
            base_sku: base,
            attempts: self.max_retries,
        })
    }

    /// The SKU a request renders before any sequence or suffix is added.
    ///
    /// Path 1 drops `{INCREMENT}`; Path 2 renders the whole pattern.
    pub async fn base_sku(&self, request: &GenerateRequest) -> EngineResult<String> {
        let context = self.resolved_context(request).await?;
        render_base(request, &context)
    }

    async fn resolved_context(&self, request: &GenerateRequest) -> EngineResult<SkuContext> {
        let mut context = request.context.clone();
        context.attribute_values = self
            .resolver
            .resolve_all(
                &request.context.attribute_values,
                request.abbreviation_scope.as_deref(),
            )
            .await?;
        Ok(context)
    }

    async fn is_taken(&self, request: &GenerateRequest, sku: &str) -> EngineResult<bool> {
        self.guard
            .is_taken(sku, request.exclude_id.as_deref(), request.scope)
            .await
    }

    /// Last sequence issued for a rendered base SKU.
    pub async fn current_sequence(&self, base_sku: &str) -> EngineResult<Option<i64>> {
        self.allocator.current(&counter_key(base_sku)).await
    }
}

fn render_base(request: &GenerateRequest, context: &SkuContext) -> EngineResult<String> {
    let separator = request.separator.as_str();
    let source = match request.path() {
        GenerationPath::WithIncrement => base_pattern(&request.pattern, separator),
        GenerationPath::WithoutIncrement => request.pattern.clone(),
    };
    if source.trim().is_empty() {
        return Ok(String::new());
    }
    Ok(CompiledPattern::parse(&source)?.render(context, separator, request.case_type, None)?)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store_memory::MemoryStore;
    use std::collections::HashSet;

    const WITH_INCREMENT: &str = "{CATEGORY_CODE}-{PRODUCT_NAME}-{INCREMENT}";
    const WITHOUT_INCREMENT: &str = "{CATEGORY_CODE}-{PRODUCT_NAME}";

    fn setup() -> (Arc<MemoryStore>, SkuGenerator) {
        let store = Arc::new(MemoryStore::new());
        let generator = SkuGenerator::new(store.clone(), store.clone(), store.clone());
        (store, generator)
    }

    fn request(pattern: &str) -> GenerateRequest {
        let config = PatternConfig {
            pattern: pattern.to_string(),
            separator: "-".to_string(),
            case_type: CaseType::Upper,
        };
        GenerateRequest::new(
            config,
            SkuContext::new().category_code("AT").product_name("Áo Thun"),
        )
    }

    #[tokio::test]
    async fn test_path1_sequences() {
        let (_, generator) = setup();

        assert_eq!(generator.generate(&request(WITH_INCREMENT)).await.unwrap(), "AT-AOTHUN-001");
        assert_eq!(generator.generate(&request(WITH_INCREMENT)).await.unwrap(), "AT-AOTHUN-002");
        assert_eq!(generator.current_sequence("AT-AOTHUN").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_preview_leaves_counter_untouched() {
        let (store, generator) = setup();

        let preview = generator
            .generate(&request(WITH_INCREMENT).preview(true))
            .await
            .unwrap();
        assert_eq!(preview, "AT-AOTHUN-###");
        assert_eq!(store.current_value("ATAOTHUN").await.unwrap(), None);

        store.claim_sku(SkuScope::Product, "ATAOTHUN", "p1").await;
        let preview = generator
            .generate(&request(WITHOUT_INCREMENT).preview(true))
            .await
            .unwrap();
        assert_eq!(preview, "AT-AOTHUN");
        assert_eq!(store.current_value("ATAOTHUN").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_path1_skips_collision_once() {
        let (store, generator) = setup();
        store.claim_sku(SkuScope::Product, "ATAOTHUN001", "manual").await;

        assert_eq!(generator.generate(&request(WITH_INCREMENT)).await.unwrap(), "AT-AOTHUN-002");
    }

    #[tokio::test]
    async fn test_path1_fails_when_retry_collides() {
        let (store, generator) = setup();
        store.claim_sku(SkuScope::Product, "ATAOTHUN001", "m1").await;
        store.claim_sku(SkuScope::Product, "ATAOTHUN002", "m2").await;

        let err = generator.generate(&request(WITH_INCREMENT)).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::GenerationExhausted { ref base_sku, attempts: 2 } if base_sku == "AT-AOTHUN"
        ));
    }

    #[tokio::test]
    async fn test_path1_excluded_owner_is_not_a_collision() {
        let (store, generator) = setup();
        store.claim_sku(SkuScope::Product, "ATAOTHUN001", "p1").await;

        let sku = generator
            .generate(&request(WITH_INCREMENT).exclude("p1"))
            .await
            .unwrap();
        assert_eq!(sku, "AT-AOTHUN-001");
    }

    #[tokio::test]
    async fn test_path2_free_base() {
        let (store, generator) = setup();

        assert_eq!(generator.generate(&request(WITHOUT_INCREMENT)).await.unwrap(), "AT-AOTHUN");
        assert_eq!(store.current_value("ATAOTHUN").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_path2_suffix_on_collision() {
        let (store, generator) = setup();
        store.claim_sku(SkuScope::Product, "ATAOTHUN", "p1").await;

        let sku = generator.generate(&request(WITHOUT_INCREMENT)).await.unwrap();
        assert_eq!(sku, "AT-AOTHUN-01");

        store.claim_sku(SkuScope::Product, "ATAOTHUN01", "p2").await;
        let sku = generator.generate(&request(WITHOUT_INCREMENT)).await.unwrap();
        assert_eq!(sku, "AT-AOTHUN-02");
    }

    #[tokio::test]
    async fn test_path2_exhaustion() {
        let (store, generator) = setup();
        let generator = generator.with_max_retries(3).unwrap();

        store.claim_sku(SkuScope::Product, "ATAOTHUN", "p0").await;
        for n in 1..=3 {
            store
                .claim_sku(SkuScope::Product, &format!("ATAOTHUN{n:02}"), &format!("p{n}"))
                .await;
        }

        let err = generator.generate(&request(WITHOUT_INCREMENT)).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::GenerationExhausted { attempts: 3, .. }
        ));
        assert_eq!(err.code(), "GENERATION_EXHAUSTED");
        assert_eq!(store.current_value("ATAOTHUN").await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn test_path2_rejects_empty_base() {
        let (store, generator) = setup();
        let mut brand_only = request("{BRAND_CODE}");
        brand_only.context.brand_code = None;

        let err = generator.generate(&brand_only).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        // A stray empty claim changes nothing and no counter is touched
        store.claim_sku(SkuScope::Product, "", "p1").await;
        let err = generator.generate(&brand_only).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(store.current_value("").await.unwrap(), None);

        let no_attributes = request("{ATTRIBUTE_VALUE}").variant(true);
        let err = generator.generate(&no_attributes).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_path2_suffix_never_leads_with_separator() {
        let (store, generator) = setup();
        let config = PatternConfig {
            pattern: "-{CATEGORY_CODE}".to_string(),
            separator: "-".to_string(),
            case_type: CaseType::Upper,
        };
        let request = GenerateRequest::new(config, SkuContext::new().category_code("AT"));

        assert_eq!(generator.generate(&request).await.unwrap(), "AT");

        store.claim_sku(SkuScope::Product, "AT", "p1").await;
        let sku = generator.generate(&request).await.unwrap();
        assert_eq!(sku, "AT-01");
        assert!(!sku.starts_with('-'));
    }

    #[tokio::test]
    async fn test_base_sku() {
        let (store, generator) = setup();
        store.add_abbreviation("Đỏ", "red", None).await;

        assert_eq!(generator.base_sku(&request(WITH_INCREMENT)).await.unwrap(), "AT-AOTHUN");
        assert_eq!(generator.base_sku(&request(WITHOUT_INCREMENT)).await.unwrap(), "AT-AOTHUN");

        let mut variant = request("{CATEGORY_CODE}-{ATTRIBUTE_VALUE}-{INCREMENT}");
        variant.context.attribute_values = vec!["Đỏ".to_string()];
        assert_eq!(generator.base_sku(&variant).await.unwrap(), "AT-RED");
        assert_eq!(store.current_value("ATRED").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_scope_selects_collection() {
        let (store, generator) = setup();
        store.claim_sku(SkuScope::Product, "ATAOTHUN", "p1").await;

        let sku = generator
            .generate(&request(WITHOUT_INCREMENT).variant(true))
            .await
            .unwrap();
        assert_eq!(sku, "AT-AOTHUN");
    }

    #[tokio::test]
    async fn test_attribute_values_are_abbreviated() {
        let (store, generator) = setup();
        store.add_abbreviation("Đỏ", "red", None).await;
        store.add_abbreviation("Large", "L", None).await;

        let config = PatternConfig {
            pattern: "{CATEGORY_CODE}-{ATTRIBUTE_VALUE}-{INCREMENT}".to_string(),
            separator: "-".to_string(),
            case_type: CaseType::Upper,
        };
        let context = SkuContext::new()
            .category_code("AT")
            .product_name("Áo Thun")
            .attribute("Đỏ")
            .attribute("Large");

        let sku = generator
            .generate(&GenerateRequest::new(config, context).variant(true))
            .await
            .unwrap();
        assert_eq!(sku, "AT-RED-L-001");
    }

    #[tokio::test]
    async fn test_invalid_input_is_rejected() {
        let (_, generator) = setup();

        let err = generator.generate(&request("{CATEGORY_CODE}-{SEASON}")).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let mut missing = request(WITH_INCREMENT);
        missing.context.category_code = None;
        let err = generator.generate(&missing).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let mut bad_separator = request(WITH_INCREMENT);
        bad_separator.separator = "x".to_string();
        assert!(generator.generate(&bad_separator).await.is_err());

        assert!(setup().1.with_max_retries(0).is_err());
    }

    #[tokio::test]
    async fn test_concurrent_path1_generations_are_distinct() {
        let (_, generator) = setup();
        let generator = Arc::new(generator);

        let mut handles = Vec::new();
        for _ in 0..25 {
            let generator = generator.clone();
            handles.push(tokio::spawn(async move {
                generator.generate(&request(WITH_INCREMENT)).await.unwrap()
            }));
        }

        let mut skus = HashSet::new();
        for handle in handles {
            assert!(skus.insert(handle.await.unwrap()));
        }
        assert_eq!(skus.len(), 25);
        assert!(skus.contains("AT-AOTHUN-001"));
        assert!(skus.contains("AT-AOTHUN-025"));
    }
}
