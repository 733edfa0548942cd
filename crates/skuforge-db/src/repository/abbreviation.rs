//! # Abbreviation Repository
//!
//! The curated dictionary that maps free-text attribute values ("Đỏ",
//! "Extra Large") to short codes ("RED", "XL").
//!
//! Lookups are exact on `(abbreviation_type, original_value, scope_id)`;
//! `scope_id = NULL` rows form the dictionary-wide layer. Entries are not
//! required to be unique: the oldest matching row wins.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use skuforge_core::validation::validate_short_code;
use skuforge_core::{Abbreviation, AbbreviationType, ValidationError};

const SELECT_COLUMNS: &str = r#"
    SELECT id, abbreviation_type, original_value, short_code, scope_id, created_at
    FROM sku_abbreviations
"#;

/// Repository for the abbreviation dictionary.
#[derive(Debug, Clone)]
pub struct AbbreviationRepository {
    pool: SqlitePool,
}

impl AbbreviationRepository {
    /// Creates a new AbbreviationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AbbreviationRepository { pool }
    }

    /// Adds a dictionary entry.
    ///
    /// ## Returns
    /// * `Ok(Abbreviation)` - The stored entry
    /// * `Err(DbError::Validation)` - Empty value or malformed short code
    pub async fn insert(
        &self,
        abbreviation_type: AbbreviationType,
        original_value: &str,
        short_code: &str,
        scope_id: Option<&str>,
    ) -> DbResult<Abbreviation> {
        if original_value.trim().is_empty() {
            return Err(ValidationError::required("original_value").into());
        }
        validate_short_code(short_code)?;

        let entry = Abbreviation {
            id: Uuid::new_v4().to_string(),
            abbreviation_type,
            original_value: original_value.trim().to_string(),
            short_code: short_code.trim().to_uppercase(),
            scope_id: scope_id.map(str::to_string),
            created_at: Utc::now(),
        };

        debug!(
            value = %entry.original_value,
            code = %entry.short_code,
            scope = ?entry.scope_id,
            "Inserting abbreviation"
        );

        sqlx::query(
            r#"
            INSERT INTO sku_abbreviations (
                id, abbreviation_type, original_value, short_code, scope_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&entry.id)
        .bind(entry.abbreviation_type)
        .bind(&entry.original_value)
        .bind(&entry.short_code)
        .bind(&entry.scope_id)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Finds the first entry matching exactly. `scope_id = None` only
    /// matches dictionary-wide rows.
    pub async fn find(
        &self,
        abbreviation_type: AbbreviationType,
        original_value: &str,
        scope_id: Option<&str>,
    ) -> DbResult<Option<Abbreviation>> {
        let sql = format!(
            "{SELECT_COLUMNS} WHERE abbreviation_type = ?1 AND original_value = ?2 AND scope_id IS ?3 \
             ORDER BY created_at ASC, rowid ASC LIMIT 1"
        );

        let entry = sqlx::query_as::<_, Abbreviation>(&sql)
            .bind(abbreviation_type)
            .bind(original_value)
            .bind(scope_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(entry)
    }

    /// Lists entries, optionally restricted to one scope layer.
    pub async fn list(&self, scope_id: Option<&str>) -> DbResult<Vec<Abbreviation>> {
        let sql = format!("{SELECT_COLUMNS} WHERE scope_id IS ?1 ORDER BY original_value");

        let entries = sqlx::query_as::<_, Abbreviation>(&sql)
            .bind(scope_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig, DbError};

    #[tokio::test]
    async fn test_insert_and_find() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.abbreviations();

        let stored = repo
            .insert(AbbreviationType::Attribute, "Đỏ", "red", None)
            .await
            .unwrap();
        assert_eq!(stored.short_code, "RED");

        let found = repo
            .find(AbbreviationType::Attribute, "Đỏ", None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.short_code, "RED");

        assert!(repo
            .find(AbbreviationType::Attribute, "Xanh", None)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_scope_layers_are_separate() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.abbreviations();

        repo.insert(AbbreviationType::Attribute, "Large", "L", None)
            .await
            .unwrap();
        repo.insert(AbbreviationType::Attribute, "Large", "LG", Some("cat-shoes"))
            .await
            .unwrap();

        let global = repo
            .find(AbbreviationType::Attribute, "Large", None)
            .await
            .unwrap()
            .unwrap();
        let scoped = repo
            .find(AbbreviationType::Attribute, "Large", Some("cat-shoes"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(global.short_code, "L");
        assert_eq!(scoped.short_code, "LG");

        assert!(repo
            .find(AbbreviationType::Attribute, "Large", Some("cat-hats"))
            .await
            .unwrap()
            .is_none());

        assert_eq!(repo.list(None).await.unwrap().len(), 1);
        assert_eq!(repo.list(Some("cat-shoes")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.abbreviations();

        repo.insert(AbbreviationType::Attribute, "Navy", "NVY", None)
            .await
            .unwrap();
        repo.insert(AbbreviationType::Attribute, "Navy", "NAV", None)
            .await
            .unwrap();

        let found = repo
            .find(AbbreviationType::Attribute, "Navy", None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.short_code, "NVY");
    }

    #[tokio::test]
    async fn test_insert_validates() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.abbreviations();

        assert!(matches!(
            repo.insert(AbbreviationType::Attribute, " ", "X", None).await,
            Err(DbError::Validation(_))
        ));
        assert!(matches!(
            repo.insert(AbbreviationType::Attribute, "Red", "R-D", None).await,
            Err(DbError::Validation(_))
        ));
    }
}
