//! Requires `--features integration` and a database migrated by user-service.

use audit_consumer::{AuditConsumer, PgAuditLogStore};
use sqlx::PgPool;
use std::sync::Arc;

#[tokio::test]
#[cfg_attr(not(feature = "integration"), ignore = "enable with --features integration (requires Postgres)")]
async fn pg_store_appends_duplicates() -> Result<(), Box<dyn std::error::Error>> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("Skipping audit pg test because DATABASE_URL is not set.");
        return Ok(());
    };
    let pool = PgPool::connect(&database_url).await?;
    let store = PgAuditLogStore::new(pool);
    if !store.table_present().await {
        eprintln!("Skipping audit pg test because audit_logs does not exist.");
        return Ok(());
    }
    let audit = AuditConsumer::new(Arc::new(store));
    let first = audit.handle("User created: 900001").await?;
    let second = audit.handle("User created: 900001").await?;
    assert_ne!(first.id, second.id);
    assert_eq!(first.action, "User created");
    assert_eq!(second.details, "User created: 900001");
    Ok(())
}
