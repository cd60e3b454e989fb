use crate::store::{AuditLog, AuditLogStore, AuditStoreError};
use chrono::{DateTime, Utc};
use common_audit::UserEvent;
use common_observability::AuditConsumerMetrics;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, warn};

/// An audit row before the store assigns its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub action: String,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    /// `action` is the text before the first colon with trailing whitespace
    /// trimmed, or the whole message when there is no colon. `details` is
    /// always the raw message.
    pub fn from_message(raw: &str, received_at: DateTime<Utc>) -> Self {
        let action = match raw.split_once(':') {
            Some((head, _)) => head.trim_end(),
            None => raw,
        };
        Self { action: action.to_string(), details: raw.to_string(), timestamp: received_at }
    }
}

#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("message payload missing or not UTF-8")]
    UnreadablePayload,
    #[error(transparent)]
    Store(#[from] AuditStoreError),
}

/// Turns event text into audit rows. Each delivery is handled on its own:
/// failures are logged and the message is dropped, and duplicate deliveries
/// become duplicate rows.
#[derive(Clone)]
pub struct AuditConsumer {
    store: Arc<dyn AuditLogStore>,
    metrics: Option<AuditConsumerMetrics>,
}

impl AuditConsumer {
    pub fn new(store: Arc<dyn AuditLogStore>) -> Self { Self { store, metrics: None } }

    pub fn with_metrics(mut self, metrics: AuditConsumerMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn handle(&self, raw: &str) -> Result<AuditLog, ConsumerError> {
        let entry = AuditEntry::from_message(raw, Utc::now());
        if UserEvent::parse(raw).is_none() {
            debug!(details = %raw, "message does not follow the user event format; storing as-is");
        }
        match self.store.append(&entry).await {
            Ok(row) => {
                debug!(audit_id = row.id, action = %row.action, "audit log appended");
                if let Some(m) = &self.metrics { m.ingested.inc(); }
                Ok(row)
            }
            Err(err) => {
                error!(error = %err, details = %raw, "failed to insert audit log; message dropped");
                if let Some(m) = &self.metrics { m.insert_failures.inc(); }
                Err(err.into())
            }
        }
    }

    /// Entry point for transport payloads, which may be absent or not UTF-8.
    pub async fn handle_payload(&self, payload: Option<&[u8]>) -> Result<AuditLog, ConsumerError> {
        match payload.map(std::str::from_utf8) {
            Some(Ok(text)) => self.handle(text).await,
            _ => {
                warn!("skipping message without a UTF-8 payload");
                if let Some(m) = &self.metrics { m.skipped.inc(); }
                Err(ConsumerError::UnreadablePayload)
            }
        }
    }
}

#[cfg(feature = "kafka")]
pub async fn run(consumer: rdkafka::consumer::StreamConsumer, audit: AuditConsumer) {
    use futures_util::StreamExt;
    use rdkafka::Message;

    let mut stream = consumer.stream();
    while let Some(message) = stream.next().await {
        match message {
            Ok(m) => {
                // Errors are already logged and counted; nothing is retried here.
                let _ = audit.handle_payload(m.payload()).await;
            }
            Err(e) => warn!(?e, "kafka consumer error"),
        }
    }
}
