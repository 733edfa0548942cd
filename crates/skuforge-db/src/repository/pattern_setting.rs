//! # Pattern Setting Repository
//!
//! Which pattern, separator and case a scope generates with.
//!
//! ## Resolution Order
//! ```text
//! resolve(Some("cat-shirts"))
//!      │
//!      ├── row with scope_id = 'cat-shirts'?  → use it
//!      ├── row with scope_id IS NULL (global)? → use it
//!      └── neither                             → None (caller applies defaults)
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbResult;
use skuforge_core::pattern::validate_pattern;
use skuforge_core::validation::validate_separator;
use skuforge_core::{CaseType, PatternSetting};

const SELECT_COLUMNS: &str = r#"
    SELECT id, scope_id, pattern, separator, case_type, updated_at
    FROM sku_pattern_settings
"#;

/// Repository for pattern settings.
#[derive(Debug, Clone)]
pub struct PatternSettingRepository {
    pool: SqlitePool,
}

impl PatternSettingRepository {
    /// Creates a new PatternSettingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PatternSettingRepository { pool }
    }

    /// The row stored for exactly this scope (`None` = the global row).
    pub async fn get_for_scope(&self, scope_id: Option<&str>) -> DbResult<Option<PatternSetting>> {
        let sql = format!("{SELECT_COLUMNS} WHERE scope_id IS ?1");

        let setting = sqlx::query_as::<_, PatternSetting>(&sql)
            .bind(scope_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(setting)
    }

    /// The scoped row if one exists, otherwise the global row.
    pub async fn resolve(&self, scope_id: Option<&str>) -> DbResult<Option<PatternSetting>> {
        if scope_id.is_some() {
            if let Some(setting) = self.get_for_scope(scope_id).await? {
                return Ok(Some(setting));
            }
        }
        self.get_for_scope(None).await
    }

    /// Creates or replaces the setting for a scope.
    ///
    /// The pattern must parse and the separator must be legal; nothing is
    /// written otherwise.
    pub async fn upsert(
        &self,
        scope_id: Option<&str>,
        pattern: &str,
        separator: &str,
        case_type: CaseType,
    ) -> DbResult<PatternSetting> {
        validate_pattern(pattern)?;
        validate_separator(separator)?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // The unique index is on COALESCE(scope_id, ''), which ON CONFLICT
        // cannot target, so update first and insert when nothing matched.
        let updated = sqlx::query(
            r#"
            UPDATE sku_pattern_settings
            SET pattern = ?2, separator = ?3, case_type = ?4, updated_at = ?5
            WHERE scope_id IS ?1
            "#,
        )
        .bind(scope_id)
        .bind(pattern)
        .bind(separator)
        .bind(case_type)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            sqlx::query(
                r#"
                INSERT INTO sku_pattern_settings (id, scope_id, pattern, separator, case_type, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(scope_id)
            .bind(pattern)
            .bind(separator)
            .bind(case_type)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        let sql = format!("{SELECT_COLUMNS} WHERE scope_id IS ?1");
        let setting = sqlx::query_as::<_, PatternSetting>(&sql)
            .bind(scope_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(scope = ?scope_id, pattern = %pattern, created = updated == 0, "Pattern setting saved");
        Ok(setting)
    }

    /// Lists all settings, global row first.
    pub async fn list(&self) -> DbResult<Vec<PatternSetting>> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY scope_id IS NOT NULL, scope_id");

        let settings = sqlx::query_as::<_, PatternSetting>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = settings.len(), "Listed pattern settings");
        Ok(settings)
    }
}
