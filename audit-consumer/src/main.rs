use anyhow::Context;
use audit_consumer::{AuditConsumer, AuditConsumerConfig, PgAuditLogStore};
use common_observability::{init_tracing, AuditConsumerMetrics};
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

#[cfg(feature = "kafka")]
fn spawn_consumer(config: &AuditConsumerConfig, audit: AuditConsumer) -> anyhow::Result<()> {
    use rdkafka::consumer::{Consumer, StreamConsumer};
    let consumer: StreamConsumer = rdkafka::ClientConfig::new()
        .set("bootstrap.servers", &config.kafka_bootstrap)
        .set("group.id", &config.group_id)
        .set("enable.partition.eof", "false")
        .create()
        .context("failed to create kafka consumer")?;
    consumer.subscribe(&[&config.topic])?;
    info!(topic = %config.topic, group = %config.group_id, "audit consumer subscribed");
    tokio::spawn(audit_consumer::consumer::run(consumer, audit));
    Ok(())
}

#[cfg(not(feature = "kafka"))]
fn spawn_consumer(config: &AuditConsumerConfig, _audit: AuditConsumer) -> anyhow::Result<()> {
    warn!(topic = %config.topic, "built without the kafka feature; no topic subscription");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = AuditConsumerConfig::from_env()?;
    let db = PgPool::connect(&config.database_url).await.context("failed to connect to DATABASE_URL")?;

    let store = PgAuditLogStore::new(db);
    if !store.table_present().await {
        warn!("audit_logs table not found; run user-service migrations first");
    }

    let metrics = AuditConsumerMetrics::new()?;
    let audit = AuditConsumer::new(Arc::new(store)).with_metrics(metrics.clone());

    if config.enabled {
        spawn_consumer(&config, audit)?;
    } else {
        info!("audit consumer disabled via AUDIT_CONSUMER_ENABLED=false");
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "starting audit-consumer http server");
    let app = audit_consumer::http::router(metrics);
    let server = async move { axum::serve(listener, app).await };

    tokio::select! {
        res = server => {
            if let Err(e) = res { error!(?e, "http server stopped"); }
        }
        _ = tokio::signal::ctrl_c() => info!("shutdown signal received"),
    }
    Ok(())
}
