use crate::model::{User, UserInput};
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence for user records. The store assigns ids; `update` and `delete`
/// report a vanished row as `None` / `false` rather than an error.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, input: &UserInput) -> Result<User, StoreError>;
    async fn find(&self, id: i64) -> Result<Option<User>, StoreError>;
    async fn find_all(&self) -> Result<Vec<User>, StoreError>;
    async fn update(&self, user: &User) -> Result<Option<User>, StoreError>;
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self { Self { db } }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, input: &UserInput) -> Result<User, StoreError> {
        let rec = sqlx::query_as::<_, User>(
            r#"INSERT INTO users (name, email, mobile, address)
               VALUES ($1, $2, $3, $4)
               RETURNING id, name, email, mobile, address"#,
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.mobile)
        .bind(&input.address)
        .fetch_one(&self.db)
        .await?;
        Ok(rec)
    }

    async fn find(&self, id: i64) -> Result<Option<User>, StoreError> {
        let rec = sqlx::query_as::<_, User>("SELECT id, name, email, mobile, address FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(rec)
    }

    async fn find_all(&self) -> Result<Vec<User>, StoreError> {
        let recs = sqlx::query_as::<_, User>("SELECT id, name, email, mobile, address FROM users ORDER BY id")
            .fetch_all(&self.db)
            .await?;
        Ok(recs)
    }

    async fn update(&self, user: &User) -> Result<Option<User>, StoreError> {
        let rec = sqlx::query_as::<_, User>(
            r#"UPDATE users SET name = $2, email = $3, mobile = $4, address = $5
               WHERE id = $1
               RETURNING id, name, email, mobile, address"#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.mobile)
        .bind(&user.address)
        .fetch_optional(&self.db)
        .await?;
        Ok(rec)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Map-backed store for tests and local runs without Postgres. Ids start at 1.
pub struct InMemoryUserStore {
    next_id: AtomicI64,
    rows: RwLock<BTreeMap<i64, User>>,
    writes: AtomicUsize,
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self { next_id: AtomicI64::new(1), rows: RwLock::new(BTreeMap::new()), writes: AtomicUsize::new(0) }
    }
}

impl InMemoryUserStore {
    pub fn new() -> Self { Self::default() }

    /// Number of insert/update/delete calls that reached the store.
    pub fn write_count(&self) -> usize { self.writes.load(Ordering::SeqCst) }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, input: &UserInput) -> Result<User, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let user = input.clone().into_user(id);
        self.rows.write().await.insert(id, user.clone());
        Ok(user)
    }

    async fn find(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.rows.read().await.values().cloned().collect())
    }

    async fn update(&self, user: &User) -> Result<Option<User>, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.write().await;
        match rows.get_mut(&user.id) {
            Some(row) => {
                *row = user.clone();
                Ok(Some(row.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.write().await.remove(&id).is_some())
    }
}
