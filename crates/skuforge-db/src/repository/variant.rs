//! # Variant Repository
//!
//! Variants store their attributes as a JSON column. Both shapes are
//! accepted on read:
//!
//! ```text
//! {"size":"L","color":"Red"}                                  legacy
//! {"attributes":[{"key":"Material","value":"Cotton"}, ...]}   dynamic
//! ```

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use skuforge_core::normalize::normalize_sku;
use skuforge_core::{ProductVariant, VariantAttributes};

const SELECT_COLUMNS: &str = r#"
    SELECT id, product_id, attributes, sku, sku_normalized, created_at, updated_at
    FROM product_variants
"#;

#[derive(Debug, FromRow)]
struct VariantRow {
    id: String,
    product_id: String,
    attributes: String,
    sku: Option<String>,
    sku_normalized: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<VariantRow> for ProductVariant {
    type Error = DbError;

    fn try_from(row: VariantRow) -> Result<Self, Self::Error> {
        Ok(ProductVariant {
            attributes: serde_json::from_str(&row.attributes)?,
            id: row.id,
            product_id: row.product_id,
            sku: row.sku,
            sku_normalized: row.sku_normalized,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for product variants.
#[derive(Debug, Clone)]
pub struct VariantRepository {
    pool: SqlitePool,
}

impl VariantRepository {
    /// Creates a new VariantRepository.
    pub fn new(pool: SqlitePool) -> Self {
        VariantRepository { pool }
    }

    /// Inserts a variant without a SKU.
    pub async fn insert(
        &self,
        product_id: &str,
        attributes: &VariantAttributes,
    ) -> DbResult<ProductVariant> {
        let now = Utc::now();
        let variant = ProductVariant {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            attributes: attributes.clone(),
            sku: None,
            sku_normalized: None,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_string(&variant.attributes)?;
        debug!(id = %variant.id, product_id = %product_id, "Inserting variant");

        sqlx::query(
            r#"
            INSERT INTO product_variants (
                id, product_id, attributes, sku, sku_normalized, created_at, updated_at
            ) VALUES (?1, ?2, ?3, NULL, NULL, ?4, ?5)
            "#,
        )
        .bind(&variant.id)
        .bind(&variant.product_id)
        .bind(json)
        .bind(variant.created_at)
        .bind(variant.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(variant)
    }

    /// Gets a variant by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<ProductVariant>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");

        let row = sqlx::query_as::<_, VariantRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(ProductVariant::try_from).transpose()
    }

    /// All variants of a product, oldest first.
    pub async fn list_for_product(&self, product_id: &str) -> DbResult<Vec<ProductVariant>> {
        let sql = format!("{SELECT_COLUMNS} WHERE product_id = ?1 ORDER BY created_at, rowid");

        let rows = sqlx::query_as::<_, VariantRow>(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(ProductVariant::try_from).collect()
    }

    /// Stores a new SKU for the variant.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - another variant already owns the
    ///   canonical form
    /// * `DbError::NotFound` - no such variant
    pub async fn update_sku(&self, id: &str, sku: &str) -> DbResult<ProductVariant> {
        let normalized = normalize_sku(sku);

        let result = sqlx::query(
            "UPDATE product_variants SET sku = ?2, sku_normalized = ?3, updated_at = ?4 WHERE id = ?1",
        )
        .bind(id)
        .bind(sku)
        .bind(&normalized)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(normalized.as_str()))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Variant", id));
        }

        debug!(id = %id, sku = %sku, "Variant SKU updated");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Variant", id))
    }

    /// Whether any variant other than `exclude_id` owns `normalized`.
    pub async fn sku_exists(&self, normalized: &str, exclude_id: Option<&str>) -> DbResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM product_variants
                WHERE sku_normalized = ?1 AND (?2 IS NULL OR id != ?2)
            )
            "#,
        )
        .bind(normalized)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig, DbError};
    use skuforge_core::{AttributeBag, VariantAttributes};

    #[tokio::test]
    async fn test_attributes_round_trip_both_shapes() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db.products().insert(None, None, "Shirt").await.unwrap();
        let repo = db.variants();

        let legacy = VariantAttributes::legacy(Some("L"), Some("Red"));
        let bag = AttributeBag::from_pairs([("Material", "Cotton"), ("Fit", "Slim")]).unwrap();
        let dynamic = VariantAttributes::dynamic(bag);

        let v1 = repo.insert(&product.id, &legacy).await.unwrap();
        let v2 = repo.insert(&product.id, &dynamic).await.unwrap();

        let loaded = repo.get_by_id(&v1.id).await.unwrap().unwrap();
        assert_eq!(loaded.attributes.values(), vec!["Red", "L"]);

        let loaded = repo.get_by_id(&v2.id).await.unwrap().unwrap();
        assert_eq!(loaded.attributes.values(), vec!["Cotton", "Slim"]);

        let all = repo.list_for_product(&product.id).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, v1.id);
    }

    #[tokio::test]
    async fn test_variant_sku_uniqueness() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db.products().insert(None, None, "Shirt").await.unwrap();
        let repo = db.variants();

        let attrs = VariantAttributes::legacy(Some("M"), None);
        let a = repo.insert(&product.id, &attrs).await.unwrap();
        let b = repo.insert(&product.id, &attrs).await.unwrap();

        repo.update_sku(&a.id, "SH-M").await.unwrap();
        assert!(repo.sku_exists("SHM", None).await.unwrap());
        assert!(!repo.sku_exists("SHM", Some(&a.id)).await.unwrap());

        let err = repo.update_sku(&b.id, "sh.m").await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_variant_requires_product() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let result = db
            .variants()
            .insert("missing", &VariantAttributes::legacy(None, Some("Red")))
            .await;
        assert!(matches!(result, Err(DbError::ForeignKeyViolation { .. })));
    }
}
