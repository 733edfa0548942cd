//! # Category Repository
//!
//! Categories only matter to SKU generation through their `code`.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use skuforge_core::{Category, ValidationError};

/// Repository for categories.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Inserts a category. An empty code is stored as NULL.
    pub async fn insert(&self, name: &str, code: Option<&str>) -> DbResult<Category> {
        if name.trim().is_empty() {
            return Err(ValidationError::required("name").into());
        }

        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            code: code
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_uppercase),
            created_at: Utc::now(),
        };

        debug!(id = %category.id, code = ?category.code, "Inserting category");

        sqlx::query("INSERT INTO categories (id, name, code, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&category.id)
            .bind(&category.name)
            .bind(&category.code)
            .bind(category.created_at)
            .execute(&self.pool)
            .await?;

        Ok(category)
    }

    /// Gets a category by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, code, created_at FROM categories WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// The category's code, `None` when the category has none.
    ///
    /// ## Errors
    /// `DbError::NotFound` when the category does not exist.
    pub async fn code_for(&self, id: &str) -> DbResult<Option<String>> {
        let category = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))?;

        Ok(category.code)
    }
}
