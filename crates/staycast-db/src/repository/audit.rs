//! # Distribution Audit Repository
//!
//! Append-only log of channel push attempts. One row per attempt,
//! regardless of outcome — the audit trail answers "what did we push to
//! which channel, when, and how did it go".
//!
//! Failure handling is the caller's concern: the engine's `AuditSink`
//! wraps this repository and swallows write errors so a logging problem
//! never masks the primary distribution result.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use staycast_core::{Channel, SyncStatus};

// =============================================================================
// Audit Entry
// =============================================================================

/// One recorded channel push attempt.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: String,
    pub org_id: String,
    pub property_id: String,
    pub channel: Channel,
    pub status: SyncStatus,
    pub message: String,
    pub elapsed_ms: u64,
    pub created_at: DateTime<Utc>,
}

/// Flat storage shape of a distribution_audit row.
#[derive(Debug, sqlx::FromRow)]
struct AuditRow {
    id: String,
    org_id: String,
    property_id: String,
    channel: String,
    status: String,
    message: String,
    elapsed_ms: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<AuditRow> for AuditEntry {
    type Error = DbError;

    fn try_from(row: AuditRow) -> Result<Self, Self::Error> {
        let channel: Channel = row.channel.parse().map_err(|_| {
            DbError::corrupt_row("distribution_audit", format!("channel '{}'", row.channel))
        })?;
        let status = match row.status.as_str() {
            "success" => SyncStatus::Success,
            "failed" => SyncStatus::Failed,
            "skipped" => SyncStatus::Skipped,
            other => {
                return Err(DbError::corrupt_row(
                    "distribution_audit",
                    format!("status '{}'", other),
                ))
            }
        };

        Ok(AuditEntry {
            id: row.id,
            org_id: row.org_id,
            property_id: row.property_id,
            channel,
            status,
            message: row.message,
            elapsed_ms: row.elapsed_ms.max(0) as u64,
            created_at: row.created_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the distribution audit log.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: SqlitePool,
}

impl AuditRepository {
    /// Creates a new AuditRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AuditRepository { pool }
    }

    /// Appends one audit row.
    pub async fn record(
        &self,
        org_id: &str,
        property_id: &str,
        channel: Channel,
        status: SyncStatus,
        message: &str,
        elapsed_ms: u64,
    ) -> DbResult<AuditEntry> {
        let entry = AuditEntry {
            id: Uuid::new_v4().to_string(),
            org_id: org_id.to_string(),
            property_id: property_id.to_string(),
            channel,
            status,
            message: message.to_string(),
            elapsed_ms,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO distribution_audit (
                id, org_id, property_id, channel, status,
                message, elapsed_ms, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.org_id)
        .bind(&entry.property_id)
        .bind(entry.channel.as_str())
        .bind(entry.status.as_str())
        .bind(&entry.message)
        .bind(entry.elapsed_ms as i64)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Lists recent audit rows for a property, newest first.
    pub async fn list_for_property(
        &self,
        org_id: &str,
        property_id: &str,
        limit: u32,
    ) -> DbResult<Vec<AuditEntry>> {
        let rows: Vec<AuditRow> = sqlx::query_as(
            r#"
            SELECT id, org_id, property_id, channel, status,
                   message, elapsed_ms, created_at
            FROM distribution_audit
            WHERE org_id = ?1 AND property_id = ?2
            ORDER BY created_at DESC, id DESC
            LIMIT ?3
            "#,
        )
        .bind(org_id)
        .bind(property_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AuditEntry::try_from).collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
