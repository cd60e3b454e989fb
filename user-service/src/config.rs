use anyhow::{Context, Result};
use common_audit::DEFAULT_USER_EVENTS_TOPIC;
use std::env;

#[derive(Debug, Clone)]
pub struct UserServiceConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub kafka_bootstrap: String,
    pub events_topic: String,
    pub events_enabled: bool,
    pub kafka_message_timeout_ms: u64,
    pub run_migrations: bool,
}

fn flag(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

impl UserServiceConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = match env::var("PORT") {
            Ok(v) => v.parse::<u16>().with_context(|| format!("PORT is not a valid port: {v}"))?,
            Err(_) => 8080,
        };
        let kafka_bootstrap = env::var("KAFKA_BOOTSTRAP").unwrap_or_else(|_| "localhost:9092".to_string());
        let events_topic = env::var("USER_EVENTS_TOPIC").unwrap_or_else(|_| DEFAULT_USER_EVENTS_TOPIC.to_string());
        let kafka_message_timeout_ms = env::var("KAFKA_MESSAGE_TIMEOUT_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(5000);

        Ok(Self {
            database_url,
            host,
            port,
            kafka_bootstrap,
            events_topic,
            events_enabled: flag("USER_EVENTS_ENABLED", true),
            kafka_message_timeout_ms: kafka_message_timeout_ms.max(100),
            run_migrations: flag("RUN_MIGRATIONS", true),
        })
    }
}
