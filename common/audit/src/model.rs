use std::fmt;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Entity name that prefixes every event on the user topic.
pub const USER_ENTITY: &str = "User";

pub const DEFAULT_USER_EVENTS_TOPIC: &str = "user-events";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventVerb { Created, Updated, Deleted }

impl EventVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventVerb::Created => "created",
            EventVerb::Updated => "updated",
            EventVerb::Deleted => "deleted",
        }
    }

    pub fn from_str(s: &str) -> Option<EventVerb> {
        match s {
            "created" => Some(EventVerb::Created),
            "updated" => Some(EventVerb::Updated),
            "deleted" => Some(EventVerb::Deleted),
            _ => None,
        }
    }
}

/// A mutation notice for one user record.
///
/// On the wire this is plain text, `"User created: 42"`; there is no envelope,
/// so consumers re-derive structure from the string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserEvent {
    pub verb: EventVerb,
    pub user_id: i64,
}

impl UserEvent {
    pub fn created(user_id: i64) -> Self { Self { verb: EventVerb::Created, user_id } }
    pub fn updated(user_id: i64) -> Self { Self { verb: EventVerb::Updated, user_id } }
    pub fn deleted(user_id: i64) -> Self { Self { verb: EventVerb::Deleted, user_id } }

    /// Best-effort reverse of the `Display` format. Returns `None` for anything
    /// that is not a well formed user event; callers must still accept such text.
    pub fn parse(raw: &str) -> Option<UserEvent> {
        let (head, id) = raw.split_once(':')?;
        let (entity, verb) = head.trim_end().split_once(' ')?;
        if entity != USER_ENTITY { return None; }
        let verb = EventVerb::from_str(verb)?;
        let user_id = id.trim().parse::<i64>().ok()?;
        Some(UserEvent { verb, user_id })
    }
}

impl fmt::Display for UserEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", USER_ENTITY, self.verb.as_str(), self.user_id)
    }
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("kafka error: {0}")]
    Kafka(String),
    #[error("sink unavailable: {0}")]
    SinkUnavailable(String),
}

pub type AuditResult<T> = Result<T, AuditError>;
