pub mod config;
pub mod consumer;
pub mod http;
pub mod store;

pub use config::AuditConsumerConfig;
pub use consumer::{AuditConsumer, AuditEntry, ConsumerError};
pub use store::{AuditLog, AuditLogStore, AuditStoreError, InMemoryAuditLogStore, PgAuditLogStore};
