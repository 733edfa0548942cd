//! # Counter Repository
//!
//! Persistent atomic sequences.
//!
//! ## One Statement, No Lost Increments
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Sequence Allocation                                  │
//! │                                                                         │
//! │  ❌ WRONG: read, then write (two callers both read 4, both write 5)    │
//! │     SELECT sequence FROM sku_counters WHERE key = ?                    │
//! │     UPDATE sku_counters SET sequence = 5 WHERE key = ?                 │
//! │                                                                         │
//! │  ✅ CORRECT: single upsert under the SQLite write lock                 │
//! │     INSERT INTO sku_counters (key, sequence, ...) VALUES (?, 1, ...)   │
//! │     ON CONFLICT(key) DO UPDATE SET sequence = sequence + 1             │
//! │     RETURNING sequence                                                 │
//! │                                                                         │
//! │  First use creates the row at 1; every later call returns +1.          │
//! │  Values consumed by abandoned generations are never handed out again.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use skuforge_core::Counter;

/// Repository for atomic counters.
#[derive(Debug, Clone)]
pub struct CounterRepository {
    pool: SqlitePool,
}

impl CounterRepository {
    /// Creates a new CounterRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CounterRepository { pool }
    }

    /// Atomically increments `key` and returns the new value (1 on first use).
    pub async fn next_value(&self, key: &str) -> DbResult<i64> {
        let now = Utc::now();

        let sequence: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO sku_counters (key, sequence, updated_at)
            VALUES (?1, 1, ?2)
            ON CONFLICT(key) DO UPDATE SET
                sequence = sku_counters.sequence + 1,
                updated_at = excluded.updated_at
            RETURNING sequence
            "#,
        )
        .bind(key)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        debug!(key = %key, sequence, "Allocated sequence");
        Ok(sequence)
    }

    /// Last issued value for `key`, or `None` if the counter was never used.
    pub async fn current_value(&self, key: &str) -> DbResult<Option<i64>> {
        let sequence: Option<i64> =
            sqlx::query_scalar("SELECT sequence FROM sku_counters WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(sequence)
    }

    /// Gets the full counter record.
    pub async fn get(&self, key: &str) -> DbResult<Option<Counter>> {
        let counter = sqlx::query_as::<_, Counter>(
            "SELECT key, sequence, updated_at FROM sku_counters WHERE key = ?1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(counter)
    }

    /// Counts counters (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sku_counters")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_lazy_creation_starts_at_one() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let counters = db.counters();

        assert_eq!(counters.current_value("ATAOTHUN").await.unwrap(), None);
        assert_eq!(counters.next_value("ATAOTHUN").await.unwrap(), 1);
        assert_eq!(counters.next_value("ATAOTHUN").await.unwrap(), 2);
        assert_eq!(counters.current_value("ATAOTHUN").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let counters = db.counters();

        assert_eq!(counters.next_value("A").await.unwrap(), 1);
        assert_eq!(counters.next_value("B").await.unwrap(), 1);
        assert_eq!(counters.next_value("A").await.unwrap(), 2);

        let a = counters.get("A").await.unwrap().unwrap();
        assert_eq!(a.sequence, 2);
        assert_eq!(counters.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_allocation_never_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("counters.db")).max_connections(8))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..32 {
            let counters = db.counters();
            handles.push(tokio::spawn(async move {
                counters.next_value("SHARED").await.unwrap()
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            assert!(seen.insert(handle.await.unwrap()));
        }

        assert_eq!(seen.len(), 32);
        assert_eq!(seen, (1..=32).collect::<HashSet<i64>>());
        assert_eq!(db.counters().current_value("SHARED").await.unwrap(), Some(32));
    }
}
