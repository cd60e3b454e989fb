use crate::model::{User, UserInput};
use crate::repo::{StoreError, UserStore};
use common_audit::{EventPublisher, UserEvent};
use common_http_errors::{ApiError, FieldViolation};
use common_observability::UserServiceMetrics;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum UserServiceError {
    #[error("validation failed: {}", violated_fields(.0))]
    Validation(Vec<FieldViolation>),
    #[error("User not found {0}")]
    NotFound(i64),
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn violated_fields(v: &[FieldViolation]) -> String {
    v.iter().map(|f| f.field.as_str()).collect::<Vec<_>>().join(", ")
}

impl UserServiceError {
    fn outcome(&self) -> &'static str {
        match self {
            UserServiceError::Validation(_) => "invalid",
            UserServiceError::NotFound(_) => "not_found",
            UserServiceError::Store(_) => "error",
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::Validation(violations) => ApiError::validation(violations),
            UserServiceError::NotFound(id) => ApiError::NotFound {
                code: "user_not_found",
                trace_id: None,
                message: Some(format!("User not found {id}")),
            },
            UserServiceError::Store(e) => ApiError::internal(e, None),
        }
    }
}

pub type UserServiceResult<T> = Result<T, UserServiceError>;

/// Create/read/update/delete for users.
///
/// Each successful mutation hands exactly one [`UserEvent`] to the publisher
/// after the store write returns. The publish is detached: its outcome never
/// reaches the caller and a failed send does not undo the write.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    events: EventPublisher,
    metrics: Option<UserServiceMetrics>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, events: EventPublisher) -> Self {
        Self { store, events, metrics: None }
    }

    pub fn with_metrics(mut self, metrics: UserServiceMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn observe<T>(&self, op: &str, res: &UserServiceResult<T>) {
        if let Some(m) = &self.metrics {
            m.operation(op, res.as_ref().map(|_| "ok").unwrap_or_else(|e| e.outcome()));
        }
    }

    async fn existing(&self, id: i64) -> UserServiceResult<User> {
        match self.store.find(id).await? {
            Some(user) => Ok(user),
            None => {
                warn!(user_id = id, "user not found");
                Err(UserServiceError::NotFound(id))
            }
        }
    }

    pub async fn create(&self, input: UserInput) -> UserServiceResult<User> {
        let res = self.create_inner(input).await;
        self.observe("create", &res);
        res
    }

    async fn create_inner(&self, input: UserInput) -> UserServiceResult<User> {
        input.validate().map_err(UserServiceError::Validation)?;
        let user = self.store.insert(&input).await?;
        info!(user_id = user.id, "user created");
        self.events.publish(UserEvent::created(user.id));
        Ok(user)
    }

    pub async fn get(&self, id: i64) -> UserServiceResult<User> {
        let res = self.existing(id).await;
        self.observe("get", &res);
        res
    }

    pub async fn list_all(&self) -> UserServiceResult<Vec<User>> {
        let res = self.store.find_all().await.map_err(UserServiceError::from);
        self.observe("list", &res);
        res
    }

    pub async fn update(&self, id: i64, input: UserInput) -> UserServiceResult<User> {
        let res = self.update_inner(id, input).await;
        self.observe("update", &res);
        res
    }

    async fn update_inner(&self, id: i64, input: UserInput) -> UserServiceResult<User> {
        let existing = self.existing(id).await?;
        // The HTTP handler has already validated; direct callers rely on this check.
        input.validate().map_err(UserServiceError::Validation)?;
        let updated = self
            .store
            .update(&input.into_user(existing.id))
            .await?
            .ok_or(UserServiceError::NotFound(id))?;
        info!(user_id = updated.id, "user updated");
        self.events.publish(UserEvent::updated(updated.id));
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> UserServiceResult<()> {
        let res = self.delete_inner(id).await;
        self.observe("delete", &res);
        res
    }

    async fn delete_inner(&self, id: i64) -> UserServiceResult<()> {
        self.existing(id).await?;
        // Row may vanish between the lookup and the delete under concurrent requests.
        if !self.store.delete(id).await? {
            return Err(UserServiceError::NotFound(id));
        }
        info!(user_id = id, "user deleted");
        self.events.publish(UserEvent::deleted(id));
        Ok(())
    }
}
