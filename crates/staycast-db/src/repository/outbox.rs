//! # Outbox Repository
//!
//! Manages the transactional outbox queue for reliable channel distribution.
//!
//! ## The Outbox Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Outbox Pattern Implementation                        │
//! │                                                                         │
//! │  UPSTREAM OPERATION (e.g., rate change saved)                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   SINGLE TRANSACTION                            │   │
//! │  │                                                                 │   │
//! │  │  1. UPDATE rate_plans SET ... WHERE id = ?                     │   │
//! │  │                                                                 │   │
//! │  │  2. INSERT INTO outbox_events (topic, partition_key, payload)  │   │
//! │  │     VALUES ('calendar.updates', <property_id>, <JSON>)         │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ← Both succeed or both fail (atomicity guaranteed)             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            OUTBOX RELAY (async, staycast-engine)                │   │
//! │  │                                                                 │   │
//! │  │  1. SELECT * FROM outbox_events WHERE status = 'pending'       │   │
//! │  │     ORDER BY created_at LIMIT <batch>                          │   │
//! │  │                                                                 │   │
//! │  │  2. For each row:                                              │   │
//! │  │     a. Publish (topic, partition_key, payload), await ack      │   │
//! │  │     b. On ack:   UPDATE ... SET status='sent', sent_at=NOW()   │   │
//! │  │     c. On error: UPDATE ... SET status='failed',               │   │
//! │  │                  retry_count += 1, last_error = ?              │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  KEY GUARANTEES:                                                       │
//! │  • The rate change is never lost (it's committed locally)              │
//! │  • The event is never orphaned (same transaction)                      │
//! │  • Broker down? No problem - events queue up as 'pending'              │
//! │  • Broker back? Relay drains the queue in creation order               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The relay is the sole writer of `status`, `retry_count`, `sent_at` and
//! `last_error` after insertion. With more than one concurrent relay
//! poller these writes would race (SQLite has no `SELECT ... FOR UPDATE
//! SKIP LOCKED`); deployments run a single active relay instance.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use staycast_core::{OutboxEvent, OutboxStatus};

// =============================================================================
// Row Type
// =============================================================================

/// Flat storage shape of an outbox_events row.
#[derive(Debug, sqlx::FromRow)]
struct OutboxEventRow {
    id: String,
    topic: String,
    partition_key: String,
    payload: String,
    status: String,
    retry_count: i64,
    last_error: Option<String>,
    created_at: DateTime<Utc>,
    sent_at: Option<DateTime<Utc>>,
}

impl TryFrom<OutboxEventRow> for OutboxEvent {
    type Error = DbError;

    fn try_from(row: OutboxEventRow) -> Result<Self, Self::Error> {
        let status: OutboxStatus = row
            .status
            .parse()
            .map_err(|_| DbError::corrupt_row("outbox_events", format!("status '{}'", row.status)))?;

        Ok(OutboxEvent {
            id: row.id,
            topic: row.topic,
            partition_key: row.partition_key,
            payload: row.payload,
            status,
            retry_count: row.retry_count,
            last_error: row.last_error,
            created_at: row.created_at,
            sent_at: row.sent_at,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, topic, partition_key, payload, status,
           retry_count, last_error, created_at, sent_at
    FROM outbox_events
"#;

// =============================================================================
// Repository
// =============================================================================

/// Repository for outbox queue operations.
#[derive(Debug, Clone)]
pub struct OutboxRepository {
    pool: SqlitePool,
}

impl OutboxRepository {
    /// Creates a new OutboxRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OutboxRepository { pool }
    }

    /// Enqueues an event for delivery.
    ///
    /// ## Arguments
    /// * `topic` - Broker topic ("calendar.updates", ...)
    /// * `partition_key` - Ordering key (property id for calendar events)
    /// * `payload` - JSON serialization of the event body
    ///
    /// ## Example
    /// ```rust,ignore
    /// let payload = serde_json::to_string(&update)?;
    /// repo.enqueue("calendar.updates", &property_id, &payload).await?;
    /// ```
    pub async fn enqueue(
        &self,
        topic: &str,
        partition_key: &str,
        payload: &str,
    ) -> DbResult<OutboxEvent> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(%topic, %partition_key, "Enqueuing outbox event");

        let event = OutboxEvent {
            id: id.clone(),
            topic: topic.to_string(),
            partition_key: partition_key.to_string(),
            payload: payload.to_string(),
            status: OutboxStatus::Pending,
            retry_count: 0,
            last_error: None,
            created_at: now,
            sent_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO outbox_events (
                id, topic, partition_key, payload, status,
                retry_count, last_error, created_at, sent_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&event.id)
        .bind(&event.topic)
        .bind(&event.partition_key)
        .bind(&event.payload)
        .bind(event.status.as_str())
        .bind(event.retry_count)
        .bind(&event.last_error)
        .bind(event.created_at)
        .bind(event.sent_at)
        .execute(&self.pool)
        .await?;

        Ok(event)
    }

    /// Gets an event by id (diagnostics and tests).
    pub async fn find(&self, id: &str) -> DbResult<Option<OutboxEvent>> {
        let row: Option<OutboxEventRow> =
            sqlx::query_as(&format!("{} WHERE id = ?1", SELECT_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(OutboxEvent::try_from).transpose()
    }

    /// Gets pending events in creation order (oldest first).
    ///
    /// ## Arguments
    /// * `limit` - Maximum rows to return (the relay's batch size)
    pub async fn find_pending(&self, limit: u32) -> DbResult<Vec<OutboxEvent>> {
        let rows: Vec<OutboxEventRow> = sqlx::query_as(&format!(
            "{} WHERE status = 'pending' ORDER BY created_at ASC, id ASC LIMIT ?1",
            SELECT_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(OutboxEvent::try_from).collect()
    }

    /// Gets failed events that still have retry budget, oldest first.
    ///
    /// Rows at or above `max_retries` are terminal and excluded — they
    /// require operator intervention, never silent dropping.
    pub async fn find_retryable_failed(
        &self,
        max_retries: i64,
        limit: u32,
    ) -> DbResult<Vec<OutboxEvent>> {
        let rows: Vec<OutboxEventRow> = sqlx::query_as(&format!(
            "{} WHERE status = 'failed' AND retry_count < ?1 \
             ORDER BY created_at ASC, id ASC LIMIT ?2",
            SELECT_COLUMNS
        ))
        .bind(max_retries)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(OutboxEvent::try_from).collect()
    }

    /// Marks an event as successfully delivered.
    pub async fn mark_sent(&self, id: &str, at: DateTime<Utc>) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE outbox_events SET
                status = 'sent',
                sent_at = ?2,
                last_error = NULL
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Records a delivery failure: status becomes 'failed' and the retry
    /// counter increments by exactly one.
    ///
    /// The caller truncates `error` before handing it over; this method
    /// stores it verbatim.
    pub async fn mark_failed(&self, id: &str, error: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE outbox_events SET
                status = 'failed',
                retry_count = retry_count + 1,
                last_error = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deletes sent events acked before `threshold` (retention cleanup).
    ///
    /// ## Returns
    /// Number of deleted rows. Only 'sent' rows are ever deleted; failed
    /// rows stay visible until an operator resolves them.
    pub async fn delete_sent_before(&self, threshold: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM outbox_events
            WHERE status = 'sent' AND sent_at IS NOT NULL AND sent_at < ?1
            "#,
        )
        .bind(threshold)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Counts pending events.
    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM outbox_events WHERE status = 'pending'")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Counts failed events that still have retry budget.
    pub async fn count_failed_retryable(&self, max_retries: i64) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM outbox_events WHERE status = 'failed' AND retry_count < ?1",
        )
        .bind(max_retries)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Counts failed events whose retry budget is exhausted — the
    /// operator-intervention queue.
    pub async fn count_failed_exhausted(&self, max_retries: i64) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM outbox_events WHERE status = 'failed' AND retry_count >= ?1",
        )
        .bind(max_retries)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use chrono::{Duration, Utc};
    use staycast_core::OutboxStatus;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_enqueue_and_poll_pending() {
        let db = test_db().await;
        let repo = db.outbox();

        let event = repo
            .enqueue("calendar.updates", "prop-1", r#"{"x":1}"#)
            .await
            .unwrap();
        assert_eq!(event.status, OutboxStatus::Pending);
        assert_eq!(event.retry_count, 0);

        let pending = repo.find_pending(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, event.id);
        assert_eq!(pending[0].topic, "calendar.updates");
        assert_eq!(pending[0].partition_key, "prop-1");
    }

    #[tokio::test]
    async fn test_pending_ordered_by_creation() {
        let db = test_db().await;
        let repo = db.outbox();

        let first = repo.enqueue("t", "k", "1").await.unwrap();
        let second = repo.enqueue("t", "k", "2").await.unwrap();
        let third = repo.enqueue("t", "k", "3").await.unwrap();

        let pending = repo.find_pending(10).await.unwrap();
        let ids: Vec<&str> = pending.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec![&first.id, &second.id, &third.id]);
    }

    #[tokio::test]
    async fn test_mark_sent_removes_from_pending() {
        let db = test_db().await;
        let repo = db.outbox();

        let event = repo.enqueue("t", "k", "{}").await.unwrap();
        repo.mark_sent(&event.id, Utc::now()).await.unwrap();

        assert!(repo.find_pending(10).await.unwrap().is_empty());

        let stored = repo.find(&event.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OutboxStatus::Sent);
        assert!(stored.sent_at.is_some());
    }

    #[tokio::test]
    async fn test_mark_failed_increments_retry_count() {
        let db = test_db().await;
        let repo = db.outbox();

        let event = repo.enqueue("t", "k", "{}").await.unwrap();
        repo.mark_failed(&event.id, "broker unreachable").await.unwrap();

        let stored = repo.find(&event.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OutboxStatus::Failed);
        assert_eq!(stored.retry_count, 1);
        assert_eq!(stored.last_error.as_deref(), Some("broker unreachable"));

        // Failed rows leave the pending poll
        assert!(repo.find_pending(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_retry_budget_exhaustion() {
        let db = test_db().await;
        let repo = db.outbox();
        let max_retries = 5;

        let event = repo.enqueue("t", "k", "{}").await.unwrap();

        for attempt in 1..=max_retries {
            repo.mark_failed(&event.id, "timeout").await.unwrap();
            let stored = repo.find(&event.id).await.unwrap().unwrap();
            assert_eq!(stored.retry_count, attempt);
        }

        // At the cap: excluded from the retry poll, counted as exhausted
        assert!(repo
            .find_retryable_failed(max_retries, 10)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(repo.count_failed_retryable(max_retries).await.unwrap(), 0);
        assert_eq!(repo.count_failed_exhausted(max_retries).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_to_sent_transition() {
        let db = test_db().await;
        let repo = db.outbox();

        let event = repo.enqueue("t", "k", "{}").await.unwrap();
        repo.mark_failed(&event.id, "transient").await.unwrap();

        let retryable = repo.find_retryable_failed(5, 10).await.unwrap();
        assert_eq!(retryable.len(), 1);

        repo.mark_sent(&event.id, Utc::now()).await.unwrap();
        let stored = repo.find(&event.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OutboxStatus::Sent);
        assert!(stored.last_error.is_none());
        assert!(repo.find_retryable_failed(5, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_respects_retention() {
        let db = test_db().await;
        let repo = db.outbox();
        let now = Utc::now();

        let old = repo.enqueue("t", "k", "old").await.unwrap();
        let fresh = repo.enqueue("t", "k", "fresh").await.unwrap();
        let pending = repo.enqueue("t", "k", "pending").await.unwrap();

        repo.mark_sent(&old.id, now - Duration::days(8)).await.unwrap();
        repo.mark_sent(&fresh.id, now - Duration::days(1)).await.unwrap();

        let deleted = repo.delete_sent_before(now - Duration::days(7)).await.unwrap();
        assert_eq!(deleted, 1);

        // Eligible row gone, young SENT row and PENDING row untouched
        assert!(repo.find(&old.id).await.unwrap().is_none());
        assert!(repo.find(&fresh.id).await.unwrap().is_some());
        assert!(repo.find(&pending.id).await.unwrap().is_some());
    }
}
