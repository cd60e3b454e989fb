use crate::consumer::AuditEntry;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct AuditLog {
    pub id: i64,
    pub action: String,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum AuditStoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Append-only sink for audit rows. Every call inserts a new row; there is no
/// dedup key, so repeated entries produce repeated rows.
#[async_trait]
pub trait AuditLogStore: Send + Sync {
    async fn append(&self, entry: &AuditEntry) -> Result<AuditLog, AuditStoreError>;
}

#[derive(Clone)]
pub struct PgAuditLogStore {
    db: PgPool,
}

impl PgAuditLogStore {
    pub fn new(db: PgPool) -> Self { Self { db } }

    /// False when `audit_logs` is missing; user-service migrations create it.
    pub async fn table_present(&self) -> bool {
        sqlx::query(r#"SELECT 1 FROM audit_logs LIMIT 1"#).execute(&self.db).await.is_ok()
    }
}

#[async_trait]
impl AuditLogStore for PgAuditLogStore {
    async fn append(&self, entry: &AuditEntry) -> Result<AuditLog, AuditStoreError> {
        let rec = sqlx::query_as::<_, AuditLog>(
            r#"INSERT INTO audit_logs (action, details, "timestamp")
               VALUES ($1, $2, $3)
               RETURNING id, action, details, "timestamp""#,
        )
        .bind(&entry.action)
        .bind(&entry.details)
        .bind(entry.timestamp)
        .fetch_one(&self.db)
        .await?;
        Ok(rec)
    }
}

#[derive(Default)]
pub struct InMemoryAuditLogStore {
    rows: Mutex<Vec<AuditLog>>,
}

impl InMemoryAuditLogStore {
    pub fn new() -> Self { Self::default() }

    pub async fn rows(&self) -> Vec<AuditLog> { self.rows.lock().await.clone() }
}

#[async_trait]
impl AuditLogStore for InMemoryAuditLogStore {
    async fn append(&self, entry: &AuditEntry) -> Result<AuditLog, AuditStoreError> {
        let mut rows = self.rows.lock().await;
        let row = AuditLog {
            id: rows.len() as i64 + 1,
            action: entry.action.clone(),
            details: entry.details.clone(),
            timestamp: entry.timestamp,
        };
        rows.push(row.clone());
        Ok(row)
    }
}
