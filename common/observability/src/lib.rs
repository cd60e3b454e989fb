use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` when set, otherwise `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Text exposition of `registry` followed by the process-wide default registry
/// (where `http_errors_total` lives).
fn render_with_default(registry: &Registry) -> prometheus::Result<String> {
    let mut families = registry.gather();
    families.extend(prometheus::gather());
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[derive(Clone)]
pub struct UserServiceMetrics {
    pub registry: Registry,
    pub operations: IntCounterVec,
    pub events_published: IntCounter,
    pub event_publish_failures: IntCounter,
}

impl UserServiceMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        let operations = IntCounterVec::new(
            Opts::new("user_operations_total", "User service operations grouped by outcome"),
            &["op", "outcome"],
        )?;
        registry.register(Box::new(operations.clone()))?;
        let events_published = IntCounter::new(
            "user_events_published_total",
            "User events accepted by the event sink",
        )?;
        registry.register(Box::new(events_published.clone()))?;
        let event_publish_failures = IntCounter::new(
            "user_events_publish_failures_total",
            "User events the sink failed to accept after the write committed",
        )?;
        registry.register(Box::new(event_publish_failures.clone()))?;
        Ok(Self { registry, operations, events_published, event_publish_failures })
    }

    pub fn operation(&self, op: &str, outcome: &str) {
        self.operations.with_label_values(&[op, outcome]).inc();
    }

    pub fn render(&self) -> prometheus::Result<String> { render_with_default(&self.registry) }
}

#[derive(Clone)]
pub struct AuditConsumerMetrics {
    pub registry: Registry,
    pub ingested: IntCounter,
    pub insert_failures: IntCounter,
    pub skipped: IntCounter,
}

impl AuditConsumerMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        let ingested = IntCounter::new("audit_logs_ingested_total", "Audit log rows written")?;
        registry.register(Box::new(ingested.clone()))?;
        let insert_failures = IntCounter::new(
            "audit_log_insert_failures_total",
            "Consumed events dropped because the audit log insert failed",
        )?;
        registry.register(Box::new(insert_failures.clone()))?;
        let skipped = IntCounter::new(
            "audit_consumer_messages_skipped_total",
            "Messages without a UTF-8 payload",
        )?;
        registry.register(Box::new(skipped.clone()))?;
        Ok(Self { registry, ingested, insert_failures, skipped })
    }

    pub fn render(&self) -> prometheus::Result<String> { render_with_default(&self.registry) }
}
