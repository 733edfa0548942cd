//! # SKU History Repository
//!
//! Append-only audit trail of SKU changes. The schema rejects UPDATE and
//! DELETE with a trigger, so this repository only exposes inserts and reads.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use skuforge_core::SkuHistoryEntry;

const SELECT_COLUMNS: &str = r#"
    SELECT id, product_id, variant_id, old_sku, new_sku, pattern_used, reason, changed_by, changed_at
    FROM sku_history
"#;

/// Repository for SKU history.
#[derive(Debug, Clone)]
pub struct SkuHistoryRepository {
    pool: SqlitePool,
}

impl SkuHistoryRepository {
    /// Creates a new SkuHistoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SkuHistoryRepository { pool }
    }

    /// Appends one entry.
    pub async fn append(&self, entry: &SkuHistoryEntry) -> DbResult<()> {
        debug!(
            product_id = %entry.product_id,
            variant_id = ?entry.variant_id,
            new_sku = %entry.new_sku,
            reason = %entry.reason,
            "Appending SKU history"
        );

        sqlx::query(
            r#"
            INSERT INTO sku_history (
                id, product_id, variant_id, old_sku, new_sku,
                pattern_used, reason, changed_by, changed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.product_id)
        .bind(&entry.variant_id)
        .bind(&entry.old_sku)
        .bind(&entry.new_sku)
        .bind(&entry.pattern_used)
        .bind(entry.reason)
        .bind(&entry.changed_by)
        .bind(entry.changed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Every entry for a product (its variants included), oldest first.
    pub async fn list_for_product(&self, product_id: &str) -> DbResult<Vec<SkuHistoryEntry>> {
        let sql = format!("{SELECT_COLUMNS} WHERE product_id = ?1 ORDER BY changed_at, rowid");

        let entries = sqlx::query_as::<_, SkuHistoryEntry>(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    /// Counts entries (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sku_history")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::{Database, DbConfig};
    use skuforge_core::{SkuChangeReason, SkuHistoryEntry};

    fn entry(product_id: &str, old: Option<&str>, new: &str) -> SkuHistoryEntry {
        SkuHistoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            variant_id: None,
            old_sku: old.map(str::to_string),
            new_sku: new.to_string(),
            pattern_used: Some("{CATEGORY_CODE}-{INCREMENT}".to_string()),
            reason: SkuChangeReason::Regenerate,
            changed_by: Some("tester".to_string()),
            changed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_append_and_list() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sku_history();

        repo.append(&entry("p1", None, "AT-001")).await.unwrap();
        repo.append(&entry("p1", Some("AT-001"), "AT-002")).await.unwrap();
        repo.append(&entry("p2", None, "AT-003")).await.unwrap();

        let history = repo.list_for_product("p1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].new_sku, "AT-001");
        assert_eq!(history[1].old_sku.as_deref(), Some("AT-001"));
        assert_eq!(history[1].reason, SkuChangeReason::Regenerate);
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_history_is_append_only() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sku_history();
        repo.append(&entry("p1", None, "AT-001")).await.unwrap();

        let update = sqlx::query("UPDATE sku_history SET new_sku = 'HACKED'")
            .execute(db.pool())
            .await;
        assert!(update.is_err());

        let delete = sqlx::query("DELETE FROM sku_history").execute(db.pool()).await;
        assert!(delete.is_err());

        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
