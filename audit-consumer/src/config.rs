use anyhow::{Context, Result};
use common_audit::DEFAULT_USER_EVENTS_TOPIC;
use std::env;

#[derive(Debug, Clone)]
pub struct AuditConsumerConfig {
    pub database_url: String,
    pub kafka_bootstrap: String,
    pub topic: String,
    pub group_id: String,
    pub enabled: bool,
    pub http_port: u16,
}

impl AuditConsumerConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let http_port = match env::var("AUDIT_HTTP_PORT") {
            Ok(v) => v.parse::<u16>().with_context(|| format!("AUDIT_HTTP_PORT is not a valid port: {v}"))?,
            Err(_) => 8090,
        };
        Ok(Self {
            database_url,
            kafka_bootstrap: env::var("KAFKA_BOOTSTRAP").unwrap_or_else(|_| "localhost:9092".into()),
            topic: env::var("USER_EVENTS_TOPIC").unwrap_or_else(|_| DEFAULT_USER_EVENTS_TOPIC.to_string()),
            group_id: env::var("AUDIT_CONSUMER_GROUP").unwrap_or_else(|_| "user_group".into()),
            enabled: env::var("AUDIT_CONSUMER_ENABLED").unwrap_or_else(|_| "true".into()) == "true",
            http_port,
        })
    }
}
