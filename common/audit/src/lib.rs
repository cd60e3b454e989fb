pub mod model;
pub mod producer;

pub use model::{AuditError, AuditResult, EventVerb, UserEvent, DEFAULT_USER_EVENTS_TOPIC, USER_ENTITY};
pub use producer::{EventPublisher, EventSink, NoopEventSink, RecordingEventSink};
#[cfg(any(feature = "kafka", feature = "kafka-producer"))]
pub use producer::KafkaEventSink;
