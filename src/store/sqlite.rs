use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use super::CounterStore;
use crate::error::StoreError;
use crate::models::{CounterRecord, View};

// One row per identity; views are kept as a JSON array
pub struct SqliteStore {
    pool: SqlitePool,
}

fn unavailable(e: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn is_duplicate_key(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

impl SqliteStore {
    // e.g. "sqlite:view-counter.db", the file is created when missing
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(unavailable)?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await
            .map_err(unavailable)?;

        let store = Self { pool };
        store.migrate().await?;
        info!("SQLite counter store ready");
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS counters (
                identity TEXT PRIMARY KEY NOT NULL,
                count INTEGER NOT NULL DEFAULT 0,
                unique_visitor_count INTEGER NOT NULL DEFAULT 0,
                last_reset TEXT NOT NULL,
                views TEXT NOT NULL DEFAULT '[]'
            )
        "#,
        )
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(())
    }

    fn from_row(row: &SqliteRow) -> Result<CounterRecord, StoreError> {
        let last_reset: String = row.try_get("last_reset").map_err(unavailable)?;
        let views: String = row.try_get("views").map_err(unavailable)?;
        let count: i64 = row.try_get("count").map_err(unavailable)?;
        let unique: i64 = row.try_get("unique_visitor_count").map_err(unavailable)?;

        Ok(CounterRecord {
            identity: row.try_get("identity").map_err(unavailable)?,
            count: count.max(0) as u64,
            unique_visitor_count: unique.max(0) as u64,
            last_reset: DateTime::parse_from_rfc3339(&last_reset)
                .map_err(unavailable)?
                .with_timezone(&Utc),
            views: serde_json::from_str::<Vec<View>>(&views).map_err(unavailable)?,
        })
    }

    fn columns(record: &CounterRecord) -> Result<(i64, i64, String, String), StoreError> {
        let count = i64::try_from(record.count).map_err(unavailable)?;
        let unique = i64::try_from(record.unique_visitor_count).map_err(unavailable)?;
        let views = serde_json::to_string(&record.views).map_err(unavailable)?;
        Ok((count, unique, record.last_reset.to_rfc3339(), views))
    }
}

#[async_trait]
impl CounterStore for SqliteStore {
    async fn find(&self, identity: &str) -> Result<Option<CounterRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT identity, count, unique_visitor_count, last_reset, views FROM counters WHERE identity = ?",
        )
        .bind(identity)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.as_ref().map(Self::from_row).transpose()
    }

    async fn insert(&self, record: &CounterRecord) -> Result<(), StoreError> {
        let (count, unique, last_reset, views) = Self::columns(record)?;
        sqlx::query(
            "INSERT INTO counters (identity, count, unique_visitor_count, last_reset, views) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&record.identity)
        .bind(count)
        .bind(unique)
        .bind(last_reset)
        .bind(views)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_duplicate_key(&e) {
                StoreError::Conflict(record.identity.clone())
            } else {
                unavailable(e)
            }
        })?;
        Ok(())
    }

    async fn save(&self, record: &CounterRecord) -> Result<(), StoreError> {
        let (count, unique, last_reset, views) = Self::columns(record)?;
        sqlx::query(
            r#"
            INSERT INTO counters (identity, count, unique_visitor_count, last_reset, views)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(identity) DO UPDATE SET
                count = excluded.count,
                unique_visitor_count = excluded.unique_visitor_count,
                last_reset = excluded.last_reset,
                views = excluded.views
        "#,
        )
        .bind(&record.identity)
        .bind(count)
        .bind(unique)
        .bind(last_reset)
        .bind(views)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(())
    }
}
