//! Append-only verification history.
//!
//! The durable proof of success is the event the target contract emits
//! on-chain; this store is the service-side record the reporting layer reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Row, Sqlite};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("storage error: {0}")]
    Storage(String),
}

fn storage(e: sqlx::Error) -> HistoryError {
    HistoryError::Storage(e.to_string())
}

/// One successful verification, as surfaced to the reporting layer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub record_id: String,
    pub created_at: DateTime<Utc>,
    pub verification_hash: String,
}

#[derive(Clone)]
pub struct HistoryStore {
    db: Pool<Sqlite>,
}

impl HistoryStore {
    pub async fn connect(db_url: &str) -> Result<Self, HistoryError> {
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(db_url)
            .await
            .map_err(storage)?;

        let store = Self { db };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), HistoryError> {
        sqlx::query(
            r#"
CREATE TABLE IF NOT EXISTS verifications (
  record_id TEXT NOT NULL,
  created_at TEXT NOT NULL,
  verification_hash TEXT NOT NULL
);
"#,
        )
        .execute(&self.db)
        .await
        .map_err(storage)?;

        Ok(())
    }

    /// Append one row; rows are never updated or deleted.
    pub async fn append(&self, record_id: &str, verification_hash: &str) -> Result<(), HistoryError> {
        let created_at = Utc::now().to_rfc3339();

        sqlx::query(
            r#"INSERT INTO verifications (record_id, created_at, verification_hash)
               VALUES (?, ?, ?)"#,
        )
        .bind(record_id)
        .bind(created_at)
        .bind(verification_hash)
        .execute(&self.db)
        .await
        .map_err(storage)?;

        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<VerificationRecord>, HistoryError> {
        let rows = sqlx::query(
            r#"SELECT record_id, created_at, verification_hash
               FROM verifications
               ORDER BY created_at"#,
        )
        .fetch_all(&self.db)
        .await
        .map_err(storage)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let record_id: String = row.get(0);
            let created_at: String = row.get(1);
            let verification_hash: String = row.get(2);

            let created_at = DateTime::parse_from_rfc3339(&created_at)
                .map_err(|e| HistoryError::Storage(e.to_string()))?
                .with_timezone(&Utc);

            out.push(VerificationRecord { record_id, created_at, verification_hash });
        }

        Ok(out)
    }
}
