use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::AuditEntry,
    store::{AuditRepository, Store},
};

/// Append an entry to the audit trail of `store`.
pub async fn log_audit(
    store: &dyn Store,
    user_id: Option<&str>,
    action: &str,
    resource: Option<&str>,
    metadata: Option<Value>,
) -> AppResult<()> {
    store
        .record_audit(AuditEntry {
            user_id: user_id.map(str::to_owned),
            action: action.to_owned(),
            resource: resource.map(str::to_owned),
            metadata,
        })
        .await
}

pub(crate) async fn insert_audit_row(pool: &PgPool, entry: &AuditEntry) -> AppResult<()> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO audit_logs (id, user_id, action, resource, metadata)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(entry.user_id.as_deref())
    .bind(entry.action.as_str())
    .bind(entry.resource.as_deref())
    .bind(entry.metadata.clone())
    .execute(pool)
    .await?;

    Ok(())
}
