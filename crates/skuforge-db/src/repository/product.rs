//! # Product Repository
//!
//! Products carry the display SKU and its canonical form. Uniqueness is
//! enforced on `sku_normalized`, so "AT-001" and "at_001" collide.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use skuforge_core::normalize::normalize_sku;
use skuforge_core::{Product, ValidationError};

const SELECT_COLUMNS: &str = r#"
    SELECT id, category_id, brand_code, name, sku, sku_normalized, created_at, updated_at
    FROM products
"#;

/// Repository for products.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a product without a SKU.
    pub async fn insert(
        &self,
        category_id: Option<&str>,
        brand_code: Option<&str>,
        name: &str,
    ) -> DbResult<Product> {
        if name.trim().is_empty() {
            return Err(ValidationError::required("name").into());
        }

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            category_id: category_id.map(str::to_string),
            brand_code: brand_code
                .map(str::trim)
                .filter(|b| !b.is_empty())
                .map(str::to_string),
            name: name.trim().to_string(),
            sku: None,
            sku_normalized: None,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, category_id, brand_code, name, sku, sku_normalized, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, NULL, NULL, ?5, ?6)
            "#,
        )
        .bind(&product.id)
        .bind(&product.category_id)
        .bind(&product.brand_code)
        .bind(&product.name)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Stores a new SKU for the product.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - another product already owns the
    ///   canonical form
    /// * `DbError::NotFound` - no such product
    pub async fn update_sku(&self, id: &str, sku: &str) -> DbResult<Product> {
        let normalized = normalize_sku(sku);

        let result = sqlx::query(
            "UPDATE products SET sku = ?2, sku_normalized = ?3, updated_at = ?4 WHERE id = ?1",
        )
        .bind(id)
        .bind(sku)
        .bind(&normalized)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(normalized.as_str()))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        debug!(id = %id, sku = %sku, "Product SKU updated");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Whether any product other than `exclude_id` owns `normalized`.
    pub async fn sku_exists(&self, normalized: &str, exclude_id: Option<&str>) -> DbResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM products
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

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig, DbError};

    #[tokio::test]
    async fn test_update_sku_stores_canonical_form() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let product = repo.insert(None, Some("NK"), "Áo Thun").await.unwrap();
        assert!(product.sku.is_none());

        let updated = repo.update_sku(&product.id, "AT-AOTHUN-001").await.unwrap();
        assert_eq!(updated.sku.as_deref(), Some("AT-AOTHUN-001"));
        assert_eq!(updated.sku_normalized.as_deref(), Some("ATAOTHUN001"));

        assert!(repo.sku_exists("ATAOTHUN001", None).await.unwrap());
        assert!(!repo.sku_exists("ATAOTHUN001", Some(&product.id)).await.unwrap());
        assert!(!repo.sku_exists("ATAOTHUN002", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_canonical_collision_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let a = repo.insert(None, None, "A").await.unwrap();
        let b = repo.insert(None, None, "B").await.unwrap();

        repo.update_sku(&a.id, "AT-001").await.unwrap();
        let err = repo.update_sku(&b.id, "at_001").await.unwrap_err();

        assert!(err.is_unique_violation());
        assert!(err.to_string().contains("AT001"));
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(matches!(
            db.products().update_sku("nope", "X-1").await,
            Err(DbError::NotFound { .. })
        ));
    }
}
