//! # SKU Service
//!
//! Product-level SKU operations on top of the generator.
//!
//! ## Assignment Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  regenerate_product_sku(product_id)                                    │
//! │       │                                                                 │
//! │       ▼ load product → category code → pattern for the category        │
//! │       ▼ SkuGenerator::generate (excluding the product itself)          │
//! │       ▼ products.update_sku                                            │
//! │       │                                                                 │
//! │       ├── Ok                     → history (regenerate) → done         │
//! │       ├── UNIQUE violation       → a concurrent writer won the race,   │
//! │       │                            generate again (assign_attempts)    │
//! │       └── other error            → propagate                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::generator::{GenerateRequest, SkuGenerator};
use crate::history::{HistoryLogger, SkuChange};
use crate::store::{CategoryResolver, HistoryStore, PatternConfigResolver, SettingsPatternResolver};
use skuforge_core::attributes::find_duplicate_variants;
use skuforge_core::normalize::normalize_sku;
use skuforge_core::validation::validate_sku;
use skuforge_core::{
    Product, ProductVariant, SkuChangeReason, SkuContext, SkuHistoryEntry, ValidationError,
};
use skuforge_db::{Database, DbConfig, DbResult};

// =============================================================================
// Requests & Outcomes
// =============================================================================

/// SKU inputs for a product (or variant) that may not be stored yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductSkuRequest {
    pub category_id: Option<String>,
    pub brand_code: Option<String>,
    pub product_name: String,
    /// Raw attribute values, in rendering order.
    #[serde(default)]
    pub attribute_values: Vec<String>,
    pub exclude_id: Option<String>,
    #[serde(default)]
    pub is_variant: bool,
    pub year: Option<i32>,
}

/// One row of a bulk import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkSkuRow {
    pub product_id: String,
    pub sku: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BulkRowStatus {
    Applied,
    Rejected { code: String, message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkRowOutcome {
    pub product_id: String,
    pub sku: String,
    #[serde(flatten)]
    pub status: BulkRowStatus,
}

// =============================================================================
// Service
// =============================================================================

/// SKU operations over a [`Database`].
pub struct SkuService {
    db: Database,
    generator: SkuGenerator,
    history: HistoryLogger,
    patterns: Arc<dyn PatternConfigResolver>,
    categories: Arc<dyn CategoryResolver>,
    assign_attempts: u32,
}

impl SkuService {
    /// Opens the configured database and builds the service on it.
    pub async fn connect(config: EngineConfig) -> EngineResult<Self> {
        let db_config = DbConfig::new(config.database.path.clone())
            .max_connections(config.database.max_connections);
        let db = Database::new(db_config).await?;
        Self::new(db, &config)
    }

    pub fn new(db: Database, config: &EngineConfig) -> EngineResult<Self> {
        let generator = SkuGenerator::new(
            Arc::new(db.counters()),
            Arc::new(db.abbreviations()),
            Arc::new(db.clone()),
        )
        .with_max_retries(config.generation.max_retries)?;

        Ok(SkuService {
            generator,
            history: HistoryLogger::new(Arc::new(db.sku_history())),
            patterns: Arc::new(SettingsPatternResolver::new(
                db.pattern_settings(),
                config.default_pattern_config(),
            )),
            categories: Arc::new(db.categories()),
            assign_attempts: config.generation.assign_attempts.max(1),
            db,
        })
    }

    /// Sends history to `store` instead of the database's history table.
    pub fn with_history_store(mut self, store: Arc<dyn HistoryStore>) -> Self {
        self.history = HistoryLogger::new(store);
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn generator(&self) -> &SkuGenerator {
        &self.generator
    }

    pub fn history_logger(&self) -> &HistoryLogger {
        &self.history
    }

    // =========================================================================
    // Generation
    // =========================================================================

    /// What the product's SKU would look like. Allocates nothing.
    pub async fn preview_for_product(&self, request: &ProductSkuRequest) -> EngineResult<String> {
        let generate = self.product_request(request).await?.preview(true);
        self.generator.generate(&generate).await
    }

    /// Generates a SKU without storing it.
    pub async fn generate_for_product(&self, request: &ProductSkuRequest) -> EngineResult<String> {
        let generate = self.product_request(request).await?;
        self.generator.generate(&generate).await
    }

    async fn product_request(&self, request: &ProductSkuRequest) -> EngineResult<GenerateRequest> {
        let mut generate = self
            .build_request(
                request.category_id.as_deref(),
                request.brand_code.as_deref(),
                &request.product_name,
                request.attribute_values.clone(),
            )
            .await?
            .variant(request.is_variant);
        generate.context.year = request.year;
        generate.exclude_id = request.exclude_id.clone();
        Ok(generate)
    }

    /// Category code and pattern come from the category; abbreviations are
    /// looked up in the category's dictionary scope first.
    async fn build_request(
        &self,
        category_id: Option<&str>,
        brand_code: Option<&str>,
        product_name: &str,
        attribute_values: Vec<String>,
    ) -> EngineResult<GenerateRequest> {
        let category_code = match category_id {
            Some(id) => Some(self.categories.category_code(id).await?),
            None => None,
        };
        let config = self.patterns.pattern_for(category_id).await?;

        let context = SkuContext {
            category_code,
            brand_code: brand_code.map(str::to_string),
            product_name: Some(product_name.to_string()),
            attribute_values,
            year: None,
        };

        Ok(GenerateRequest::new(config, context).abbreviation_scope(category_id))
    }

    // =========================================================================
    // Assignment
    // =========================================================================

    /// Generates and stores a fresh SKU for a product.
    pub async fn regenerate_product_sku(
        &self,
        product_id: &str,
        changed_by: Option<&str>,
    ) -> EngineResult<Product> {
        let product = self.load_product(product_id).await?;

        let request = self
            .build_request(
                product.category_id.as_deref(),
                product.brand_code.as_deref(),
                &product.name,
                Vec::new(),
            )
            .await?
            .exclude(product.id.clone());

        let products = self.db.products();
        let updated = self
            .assign_with_retry(&request, |sku| {
                let products = products.clone();
                let id = product.id.clone();
                async move { products.update_sku(&id, &sku).await }
            })
            .await?;

        if updated.sku != product.sku {
            if let Some(new_sku) = updated.sku.clone() {
                self.history
                    .log_change(
                        SkuChange::new(&product.id, product.sku.clone(), new_sku, SkuChangeReason::Regenerate)
                            .pattern(&request.pattern)
                            .changed_by(changed_by),
                    )
                    .await;
            }
        }

        info!(product_id = %product.id, sku = ?updated.sku, "Product SKU regenerated");
        Ok(updated)
    }

    /// Generates and stores a fresh SKU for a variant, using its attributes.
    pub async fn regenerate_variant_sku(
        &self,
        variant_id: &str,
        changed_by: Option<&str>,
    ) -> EngineResult<ProductVariant> {
        let variant = self
            .db
            .variants()
            .get_by_id(variant_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Variant", variant_id))?;
        let product = self.load_product(&variant.product_id).await?;

        let request = self
            .build_request(
                product.category_id.as_deref(),
                product.brand_code.as_deref(),
                &product.name,
                variant.attributes.values(),
            )
            .await?
            .variant(true)
            .exclude(variant.id.clone());

        let variants = self.db.variants();
        let updated = self
            .assign_with_retry(&request, |sku| {
                let variants = variants.clone();
                let id = variant.id.clone();
                async move { variants.update_sku(&id, &sku).await }
            })
            .await?;

        if updated.sku != variant.sku {
            if let Some(new_sku) = updated.sku.clone() {
                self.history
                    .log_change(
                        SkuChange::new(&product.id, variant.sku.clone(), new_sku, SkuChangeReason::Regenerate)
                            .variant(&variant.id)
                            .pattern(&request.pattern)
                            .changed_by(changed_by),
                    )
                    .await;
            }
        }

        info!(variant_id = %variant.id, sku = ?updated.sku, "Variant SKU regenerated");
        Ok(updated)
    }

    /// Generates and writes until the write is accepted, regenerating when
    /// the UNIQUE index rejects it.
    async fn assign_with_retry<T, F, Fut>(&self, request: &GenerateRequest, write: F) -> EngineResult<T>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = DbResult<T>>,
    {
        for attempt in 1..=self.assign_attempts {
            let sku = self.generator.generate(request).await?;

            match write(sku.clone()).await {
                Ok(written) => return Ok(written),
                Err(e) if e.is_unique_violation() => {
                    warn!(sku = %sku, attempt, "SKU claimed concurrently, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(EngineError::GenerationExhausted {
            base_sku: self.generator.base_sku(request).await?,
            attempts: self.assign_attempts,
        })
    }

    /// Stores an operator-supplied SKU.
    pub async fn set_manual_sku(
        &self,
        product_id: &str,
        sku: &str,
        changed_by: Option<&str>,
    ) -> EngineResult<Product> {
        self.apply_sku(product_id, sku, changed_by, SkuChangeReason::Manual)
            .await
    }

    /// Applies imported SKUs row by row. A rejected row does not stop the
    /// batch.
    pub async fn bulk_import(&self, rows: &[BulkSkuRow], changed_by: Option<&str>) -> Vec<BulkRowOutcome> {
        let mut outcomes = Vec::with_capacity(rows.len());

        for row in rows {
            let status = match self
                .apply_sku(&row.product_id, &row.sku, changed_by, SkuChangeReason::BulkImport)
                .await
            {
                Ok(_) => BulkRowStatus::Applied,
                Err(e) => {
                    debug!(product_id = %row.product_id, sku = %row.sku, error = %e, "Import row rejected");
                    BulkRowStatus::Rejected {
                        code: e.code().to_string(),
                        message: e.to_string(),
                    }
                }
            };
            outcomes.push(BulkRowOutcome {
                product_id: row.product_id.clone(),
                sku: row.sku.clone(),
                status,
            });
        }

        let applied = outcomes
            .iter()
            .filter(|o| o.status == BulkRowStatus::Applied)
            .count();
        info!(rows = rows.len(), applied, "Bulk SKU import finished");

        outcomes
    }

    async fn apply_sku(
        &self,
        product_id: &str,
        sku: &str,
        changed_by: Option<&str>,
        reason: SkuChangeReason,
    ) -> EngineResult<Product> {
        validate_sku(sku)?;
        let sku = sku.trim();
        let product = self.load_product(product_id).await?;

        let products = self.db.products();
        if products.sku_exists(&normalize_sku(sku), Some(product_id)).await? {
            return Err(ValidationError::Duplicate {
                field: "sku".to_string(),
                value: sku.to_string(),
            }
            .into());
        }

        let updated = products.update_sku(product_id, sku).await?;

        self.history
            .log_change(
                SkuChange::new(product_id, product.sku.clone(), sku, reason).changed_by(changed_by),
            )
            .await;

        Ok(updated)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn history_for_product(&self, product_id: &str) -> EngineResult<Vec<SkuHistoryEntry>> {
        Ok(self.db.sku_history().list_for_product(product_id).await?)
    }

    /// Variant id pairs of a product whose attribute sets match.
    pub async fn find_duplicate_variants(&self, product_id: &str) -> EngineResult<Vec<(String, String)>> {
        let variants = self.db.variants().list_for_product(product_id).await?;
        let attributes: Vec<_> = variants.iter().map(|v| v.attributes.clone()).collect();

        let pairs = find_duplicate_variants(&attributes)
            .into_iter()
            .map(|(a, b)| (variants[a].id.clone(), variants[b].id.clone()))
            .collect();

        Ok(pairs)
    }

    async fn load_product(&self, product_id: &str) -> EngineResult<Product> {
        self.db
            .products()
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Product", product_id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
