use anyhow::Context;
use common_audit::{EventPublisher, EventSink, NoopEventSink};
use common_observability::{init_tracing, UserServiceMetrics};
use sqlx::PgPool;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use user_service::config::UserServiceConfig;
use user_service::{router, AppState, PgUserStore, UserService};

#[cfg(any(feature = "kafka", feature = "kafka-producer"))]
fn kafka_event_sink(config: &UserServiceConfig) -> anyhow::Result<Arc<dyn EventSink>> {
    let sink = common_audit::KafkaEventSink::from_bootstrap(&config.kafka_bootstrap, config.kafka_message_timeout_ms)
        .context("failed to create kafka producer")?;
    info!(bootstrap = %config.kafka_bootstrap, topic = %config.events_topic, "kafka event sink ready");
    Ok(Arc::new(sink))
}

#[cfg(not(any(feature = "kafka", feature = "kafka-producer")))]
fn kafka_event_sink(config: &UserServiceConfig) -> anyhow::Result<Arc<dyn EventSink>> {
    tracing::warn!(topic = %config.events_topic, "built without the kafka feature; user events are discarded");
    Ok(Arc::new(NoopEventSink))
}

fn build_event_sink(config: &UserServiceConfig) -> anyhow::Result<Arc<dyn EventSink>> {
    if !config.events_enabled {
        info!("user event publishing disabled via USER_EVENTS_ENABLED=false");
        return Ok(Arc::new(NoopEventSink));
    }
    kafka_event_sink(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = UserServiceConfig::from_env()?;

    let db = PgPool::connect(&config.database_url).await.context("failed to connect to DATABASE_URL")?;
    if config.run_migrations {
        sqlx::migrate!("./migrations").run(&db).await?;
    }

    let metrics = UserServiceMetrics::new()?;
    let publisher = EventPublisher::new(build_event_sink(&config)?, config.events_topic.clone())
        .with_counters(metrics.events_published.clone(), metrics.event_publish_failures.clone());
    let service = UserService::new(Arc::new(PgUserStore::new(db)), publisher).with_metrics(metrics.clone());
    let app = router(AppState::new(service, metrics));

    let ip: IpAddr = config.host.parse().with_context(|| format!("HOST is not an IP address: {}", config.host))?;
    let addr = SocketAddr::from((ip, config.port));
    info!(%addr, "starting user-service");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
