//! SeaORM-backed store on PostgreSQL.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, DbErr, SqlErr, prelude::DateTimeWithTimeZone};

use super::AuditRepository;
use crate::{
    audit::insert_audit_row,
    error::{AppError, AppResult},
    models::AuditEntry,
};

mod appointments;
mod cart;
mod catalog;
mod orders;
mod profiles;

#[derive(Clone)]
pub struct PgStore {
    orm: DatabaseConnection,
}

impl PgStore {
    pub fn new(orm: DatabaseConnection) -> Self {
        Self { orm }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.orm
    }
}

#[async_trait]
impl AuditRepository for PgStore {
    async fn record_audit(&self, entry: AuditEntry) -> AppResult<()> {
        insert_audit_row(self.orm.get_postgres_connection_pool(), &entry).await
    }
}

fn to_db_time(at: DateTime<Utc>) -> DateTimeWithTimeZone {
    at.into()
}

fn from_db_time(at: DateTimeWithTimeZone) -> DateTime<Utc> {
    at.with_timezone(&Utc)
}

/// Parse an enum column; a value we cannot read means the row is corrupt.
fn decode<T>(column: &str, raw: &str) -> AppResult<T>
where
    T: FromStr<Err = AppError>,
{
    raw.parse::<T>().map_err(|_| {
        AppError::Internal(anyhow::anyhow!("unexpected value `{raw}` in column {column}"))
    })
}

/// Surface unique-key clashes as validation failures instead of store outages.
fn conflict_as_validation(err: DbErr, message: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::validation(message),
        _ => AppError::RemoteOperationFailed(err),
    }
}
