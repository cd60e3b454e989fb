use crate::{AuditError, AuditResult, UserEvent};
use async_trait::async_trait;
use prometheus::IntCounter;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
#[cfg(any(feature = "kafka", feature = "kafka-producer"))] use rdkafka::producer::{FutureProducer, FutureRecord};

/// Destination for event text. Implementations own their timeout/retry policy;
/// callers only see whether this one attempt was accepted.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn send(&self, topic: &str, payload: &str) -> AuditResult<()>;
}

/// Used when publishing is disabled (`USER_EVENTS_ENABLED=false`).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

#[async_trait]
impl EventSink for NoopEventSink {
    async fn send(&self, _topic: &str, _payload: &str) -> AuditResult<()> { Ok(()) }
}

/// In-process sink that keeps every attempted send. With `failing()` each
/// attempt is still recorded but reported as `SinkUnavailable`.
#[derive(Default)]
pub struct RecordingEventSink {
    sent: Mutex<Vec<(String, String)>>,
    notify: Notify,
    fail: bool,
}

impl RecordingEventSink {
    pub fn new() -> Self { Self::default() }

    pub fn failing() -> Self { Self { fail: true, ..Self::default() } }

    pub async fn sent(&self) -> Vec<(String, String)> { self.sent.lock().await.clone() }

    pub async fn payloads(&self) -> Vec<String> {
        self.sent.lock().await.iter().map(|(_, p)| p.clone()).collect()
    }

    /// Waits until at least `count` sends were attempted. Returns false on timeout.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let notified = self.notify.notified();
                if self.sent.lock().await.len() >= count { return; }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }
}

#[async_trait]
impl EventSink for RecordingEventSink {
    async fn send(&self, topic: &str, payload: &str) -> AuditResult<()> {
        self.sent.lock().await.push((topic.to_string(), payload.to_string()));
        self.notify.notify_waiters();
        if self.fail { return Err(AuditError::SinkUnavailable("recording sink set to fail".into())); }
        Ok(())
    }
}

#[cfg(any(feature = "kafka", feature = "kafka-producer"))]
#[derive(Clone)]
pub struct KafkaEventSink {
    producer: FutureProducer,
    queue_timeout: Duration,
}

#[cfg(any(feature = "kafka", feature = "kafka-producer"))]
impl KafkaEventSink {
    pub fn new(producer: FutureProducer, queue_timeout: Duration) -> Self { Self { producer, queue_timeout } }

    pub fn from_bootstrap(bootstrap: &str, message_timeout_ms: u64) -> AuditResult<Self> {
        let producer: FutureProducer = rdkafka::ClientConfig::new()
            .set("bootstrap.servers", bootstrap)
            .set("message.timeout.ms", message_timeout_ms.to_string())
            .create()
            .map_err(|e| AuditError::Kafka(e.to_string()))?;
        Ok(Self::new(producer, Duration::from_millis(message_timeout_ms)))
    }
}

#[cfg(any(feature = "kafka", feature = "kafka-producer"))]
#[async_trait]
impl EventSink for KafkaEventSink {
    async fn send(&self, topic: &str, payload: &str) -> AuditResult<()> {
        // No key: the topic contract has no partition-key discipline.
        let record = FutureRecord::<(), str>::to(topic).payload(payload);
        if let Err((e, _)) = self.producer.send(record, self.queue_timeout).await {
            return Err(AuditError::Kafka(e.to_string()));
        }
        Ok(())
    }
}

#[derive(Clone)]
struct PublishCounters {
    published: IntCounter,
    failures: IntCounter,
}

/// Fire-and-forget publisher for user events.
///
/// `publish` spawns one detached task per event and returns immediately. A
/// failed send is logged and counted, never surfaced to the caller and never
/// retried; the write that triggered it stays committed.
#[derive(Clone)]
pub struct EventPublisher {
    sink: Arc<dyn EventSink>,
    topic: String,
    counters: Option<PublishCounters>,
}

impl EventPublisher {
    pub fn new(sink: Arc<dyn EventSink>, topic: impl Into<String>) -> Self {
        Self { sink, topic: topic.into(), counters: None }
    }

    pub fn with_counters(mut self, published: IntCounter, failures: IntCounter) -> Self {
        self.counters = Some(PublishCounters { published, failures });
        self
    }

    /// The handle is only for tests and shutdown hooks; dropping it detaches the task.
    pub fn publish(&self, event: UserEvent) -> JoinHandle<AuditResult<()>> {
        let sink = self.sink.clone();
        let topic = self.topic.clone();
        let counters = self.counters.clone();
        tokio::spawn(async move {
            let payload = event.to_string();
            let res = sink.send(&topic, &payload).await;
            match &res {
                Ok(()) => {
                    tracing::debug!(%topic, %payload, "user event published");
                    if let Some(c) = &counters { c.published.inc(); }
                }
                Err(err) => {
                    tracing::warn!(%topic, %payload, error = %err, "failed to publish user event; write remains committed");
                    if let Some(c) = &counters { c.failures.inc(); }
                }
            }
            res
        })
    }
}
