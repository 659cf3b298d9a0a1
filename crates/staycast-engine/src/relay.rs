//! # Outbox Relay
//!
//! Delivers outbox_events rows to the message broker with at-least-once
//! semantics.
//!
//! ## Relay Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Outbox Relay Flow                                │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    outbox_events Table                          │   │
//! │  │                                                                 │   │
//! │  │  id | topic            | partition_key | status  | retry_count │   │
//! │  │  ───┼──────────────────┼───────────────┼─────────┼─────────────│   │
//! │  │  1  │ calendar.updates │ prop-001      │ pending │ 0           │   │
//! │  │  2  │ calendar.updates │ prop-002      │ failed  │ 2           │   │
//! │  └────────────────────────────┬────────────────────────────────────┘   │
//! │                               │                                         │
//! │                               ▼                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                       OutboxRelay                               │   │
//! │  │                                                                 │   │
//! │  │  relay_pending():  poll status=pending ORDER BY created_at,    │   │
//! │  │                    publish one-by-one, await ack, mark sent    │   │
//! │  │  retry_failed():   poll status=failed AND retry_count < MAX,   │   │
//! │  │                    identical publish path                      │   │
//! │  │  cleanup():        delete sent rows older than retention       │   │
//! │  │                                                                 │   │
//! │  │  Each operation runs on its own tick; every tick is a bounded  │   │
//! │  │  batch that returns (cooperative scheduling, no busy loops)    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  TIMING:                                                               │
//! │  • relay_pending tick: 5 seconds (configurable)                        │
//! │  • retry_failed tick: 60 seconds (configurable)                        │
//! │  • cleanup tick: 1 hour (configurable)                                 │
//! │  • Batch size: 100 rows (configurable) — publish is synchronous, so   │
//! │    a tick costs up to batch_size × broker_round_trip                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees and Caveats
//! - **At-least-once**: a crash between broker ack and the SENT write
//!   redelivers on the next tick; consumers must be idempotent.
//! - **Per-key ordering**: rows are fed in creation order, and when a
//!   publish for a partition key fails mid-batch, later rows for that key
//!   are left untouched for the next tick. Ordering holds only under a
//!   single active relay instance — SQLite has no `SKIP LOCKED` row
//!   claims, so multi-poller deployments are unsupported.
//! - **Fail loud**: rows that exhaust their retry budget stay FAILED and
//!   are counted in [`RelayMetrics`]; they are never silently dropped.

use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use staycast_core::OutboxEvent;
use staycast_db::Database;

use crate::broker::MessageBroker;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};

// =============================================================================
// Relay Results
// =============================================================================

/// What one relay tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Rows delivered and marked SENT.
    pub sent: usize,
    /// Rows whose publish failed and were marked FAILED.
    pub failed: usize,
    /// Rows left untouched because an earlier row with the same partition
    /// key failed in this batch.
    pub deferred: usize,
}

/// Operator-facing queue depths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayMetrics {
    /// Rows awaiting first delivery.
    pub pending: i64,
    /// Failed rows that will be retried.
    pub retryable_failed: i64,
    /// Failed rows past the retry budget — operator intervention required.
    pub exhausted_failed: i64,
}

// =============================================================================
// Outbox Relay
// =============================================================================

/// Background relay from the outbox table to the broker.
pub struct OutboxRelay {
    /// Database handle.
    db: Database,

    /// Broker seam.
    broker: Arc<dyn MessageBroker>,

    /// Engine configuration.
    config: Arc<EngineConfig>,

    /// Shutdown receiver.
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for controlling a spawned relay.
#[derive(Clone)]
pub struct OutboxRelayHandle {
    /// Shutdown sender.
    shutdown_tx: mpsc::Sender<()>,
}

impl OutboxRelayHandle {
    /// Triggers graceful shutdown.
    pub async fn shutdown(&self) -> EngineResult<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| EngineError::ChannelError("Shutdown channel closed".into()))
    }
}

impl OutboxRelay {
    /// Creates a new relay and returns a handle.
    pub fn new(
        db: Database,
        broker: Arc<dyn MessageBroker>,
        config: Arc<EngineConfig>,
    ) -> (Self, OutboxRelayHandle) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let relay = OutboxRelay {
            db,
            broker,
            config,
            shutdown_rx,
        };

        let handle = OutboxRelayHandle { shutdown_tx };

        (relay, handle)
    }

    /// Runs the relay tick loop.
    ///
    /// This should be spawned as a background task. Each operation fires
    /// on its own interval; every invocation processes one bounded batch
    /// and returns to the scheduler.
    pub async fn run(mut self) {
        info!("Outbox relay starting");

        let mut pending_tick =
            tokio::time::interval(Duration::from_secs(self.config.relay.pending_interval_secs));
        let mut retry_tick =
            tokio::time::interval(Duration::from_secs(self.config.relay.retry_interval_secs));
        let mut cleanup_tick =
            tokio::time::interval(Duration::from_secs(self.config.relay.cleanup_interval_secs));
        pending_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        retry_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        cleanup_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = pending_tick.tick() => {
                    if let Err(e) = self.relay_pending().await {
                        error!(?e, "relay_pending tick failed");
                    }
                }

                _ = retry_tick.tick() => {
                    if let Err(e) = self.retry_failed().await {
                        error!(?e, "retry_failed tick failed");
                    }
                }

                _ = cleanup_tick.tick() => {
                    if let Err(e) = self.cleanup().await {
                        error!(?e, "cleanup tick failed");
                    }
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Outbox relay shutting down");
                    break;
                }
            }
        }

        info!("Outbox relay stopped");
    }

    /// Delivers one bounded batch of PENDING rows, oldest first.
    pub async fn relay_pending(&self) -> EngineResult<RelayStats> {
        let events = self
            .db
            .outbox()
            .find_pending(self.config.relay.batch_size)
            .await?;

        if events.is_empty() {
            debug!("No pending outbox events");
            return Ok(RelayStats::default());
        }

        info!(count = events.len(), "Relaying pending outbox events");
        self.deliver_batch(events).await
    }

    /// Re-delivers one bounded batch of FAILED rows that still have retry
    /// budget. Rows at the cap are terminal and excluded by the poll.
    pub async fn retry_failed(&self) -> EngineResult<RelayStats> {
        let events = self
            .db
            .outbox()
            .find_retryable_failed(self.config.relay.max_retries, self.config.relay.batch_size)
            .await?;

        if events.is_empty() {
            debug!("No retryable failed outbox events");
            return Ok(RelayStats::default());
        }

        info!(count = events.len(), "Retrying failed outbox events");
        self.deliver_batch(events).await
    }

    /// Deletes SENT rows older than the retention window.
    ///
    /// ## Returns
    /// Number of deleted rows.
    pub async fn cleanup(&self) -> EngineResult<u64> {
        let threshold = Utc::now() - self.config.retention();
        let deleted = self.db.outbox().delete_sent_before(threshold).await?;

        if deleted > 0 {
            info!(deleted, %threshold, "Cleaned up sent outbox events");
        }

        Ok(deleted)
    }

    /// Current queue depths, with a loud warning when rows have exhausted
    /// their retry budget.
    pub async fn metrics(&self) -> EngineResult<RelayMetrics> {
        let outbox = self.db.outbox();
        let max_retries = self.config.relay.max_retries;

        let metrics = RelayMetrics {
            pending: outbox.count_pending().await?,
            retryable_failed: outbox.count_failed_retryable(max_retries).await?,
            exhausted_failed: outbox.count_failed_exhausted(max_retries).await?,
        };

        if metrics.exhausted_failed > 0 {
            warn!(
                exhausted = metrics.exhausted_failed,
                "Outbox events have exhausted their retry budget and require operator intervention"
            );
        }

        Ok(metrics)
    }

    /// Publishes a batch one event at a time, in the order given.
    ///
    /// Once a partition key fails, later events sharing it are deferred to
    /// a future tick so intra-key order survives the failure.
    async fn deliver_batch(&self, events: Vec<OutboxEvent>) -> EngineResult<RelayStats> {
        let mut stats = RelayStats::default();
        let mut failed_keys: HashSet<String> = HashSet::new();

        for event in events {
            if failed_keys.contains(&event.partition_key) {
                debug!(
                    id = %event.id,
                    partition_key = %event.partition_key,
                    "Deferring event behind a failed sibling"
                );
                stats.deferred += 1;
                continue;
            }

            match self.publish_with_timeout(&event).await {
                Ok(()) => {
                    self.db.outbox().mark_sent(&event.id, Utc::now()).await?;
                    stats.sent += 1;
                    debug!(id = %event.id, topic = %event.topic, "Outbox event sent");
                }
                Err(e) => {
                    let reason = truncate_error(&e.to_string(), self.config.relay.error_truncate_len);
                    self.db.outbox().mark_failed(&event.id, &reason).await?;
                    failed_keys.insert(event.partition_key.clone());
                    stats.failed += 1;
                    warn!(
                        id = %event.id,
                        topic = %event.topic,
                        partition_key = %event.partition_key,
                        retry_count = event.retry_count + 1,
                        error = %reason,
                        "Outbox publish failed"
                    );
                }
            }
        }

        Ok(stats)
    }

    /// One synchronous publish with the configured ack timeout.
    async fn publish_with_timeout(&self, event: &OutboxEvent) -> EngineResult<()> {
        let publish = self
            .broker
            .publish(&event.topic, &event.partition_key, &event.payload);

        match tokio::time::timeout(self.config.publish_timeout(), publish).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::PublishTimeout {
                seconds: self.config.relay.publish_timeout_secs,
            }),
        }
    }
}

/// Caps a stored error message, respecting char boundaries.
fn truncate_error(message: &str, max_len: usize) -> String {
    message.chars().take(max_len).collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::InMemoryBroker;
    use staycast_core::OutboxStatus;
    use staycast_db::DbConfig;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    async fn relay_fixture() -> (OutboxRelay, Database, Arc<InMemoryBroker>) {
        init_tracing();
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let broker = Arc::new(InMemoryBroker::new());
        let config = Arc::new(EngineConfig::default());
        let (relay, _handle) = OutboxRelay::new(db.clone(), broker.clone(), config);
        (relay, db, broker)
    }

    #[tokio::test]
    async fn test_pending_event_sent_exactly_once() {
        let (relay, db, broker) = relay_fixture().await;

        let event = db
            .outbox()
            .enqueue("calendar.updates", "prop-1", r#"{"n":1}"#)
            .await
            .unwrap();

        let stats = relay.relay_pending().await.unwrap();
        assert_eq!(stats.sent, 1);
        assert_eq!(stats.failed, 0);

        let stored = db.outbox().find(&event.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OutboxStatus::Sent);
        assert!(stored.sent_at.is_some());

        // A second tick finds nothing: the row left the pending poll
        let stats = relay.relay_pending().await.unwrap();
        assert_eq!(stats, RelayStats::default());
        assert_eq!(broker.published().await.len(), 1);
    }

    #[tokio::test]
    async fn test_publish_failure_marks_failed_once() {
        let (relay, db, broker) = relay_fixture().await;
        broker.set_failing(true).await;

        let event = db.outbox().enqueue("t", "prop-1", "{}").await.unwrap();

        let stats = relay.relay_pending().await.unwrap();
        assert_eq!(stats.failed, 1);

        let stored = db.outbox().find(&event.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OutboxStatus::Failed);
        assert_eq!(stored.retry_count, 1);
        assert!(stored.last_error.is_some());
    }

    #[tokio::test]
    async fn test_failed_event_recovers_via_retry() {
        let (relay, db, broker) = relay_fixture().await;
        broker.set_failing(true).await;

        let event = db.outbox().enqueue("t", "prop-1", "{}").await.unwrap();
        relay.relay_pending().await.unwrap();

        broker.set_failing(false).await;
        let stats = relay.retry_failed().await.unwrap();
        assert_eq!(stats.sent, 1);

        let stored = db.outbox().find(&event.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OutboxStatus::Sent);
        assert!(stored.last_error.is_none());
    }

    #[tokio::test]
    async fn test_exhausted_events_leave_the_retry_poll() {
        let (relay, db, broker) = relay_fixture().await;
        broker.set_failing(true).await;

        let event = db.outbox().enqueue("t", "prop-1", "{}").await.unwrap();
        relay.relay_pending().await.unwrap();

        // Burn the remaining retry budget (default max_retries = 5)
        for _ in 1..5 {
            let stats = relay.retry_failed().await.unwrap();
            assert_eq!(stats.failed, 1);
        }

        // Terminal: no more retries even though the broker recovered
        broker.set_failing(false).await;
        let stats = relay.retry_failed().await.unwrap();
        assert_eq!(stats, RelayStats::default());

        let stored = db.outbox().find(&event.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OutboxStatus::Failed);
        assert_eq!(stored.retry_count, 5);

        let metrics = relay.metrics().await.unwrap();
        assert_eq!(metrics.exhausted_failed, 1);
        assert_eq!(metrics.retryable_failed, 0);
        assert_eq!(metrics.pending, 0);
    }

    #[tokio::test]
    async fn test_failed_key_defers_later_siblings() {
        let (relay, db, broker) = relay_fixture().await;
        broker.set_failing(true).await;

        let first = db.outbox().enqueue("t", "prop-1", "first").await.unwrap();
        let second = db.outbox().enqueue("t", "prop-1", "second").await.unwrap();
        let other = db.outbox().enqueue("t", "prop-2", "other").await.unwrap();

        let stats = relay.relay_pending().await.unwrap();

        // prop-1 head failed; its sibling was deferred untouched, but the
        // unrelated prop-2 event was still attempted (and failed too since
        // the broker is down for everyone)
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.deferred, 1);

        assert_eq!(
            db.outbox().find(&first.id).await.unwrap().unwrap().status,
            OutboxStatus::Failed
        );
        let deferred = db.outbox().find(&second.id).await.unwrap().unwrap();
        assert_eq!(deferred.status, OutboxStatus::Pending);
        assert_eq!(deferred.retry_count, 0);
        assert_eq!(
            db.outbox().find(&other.id).await.unwrap().unwrap().status,
            OutboxStatus::Failed
        );

        // Broker recovers: the deferred sibling goes out on the next tick
        broker.set_failing(false).await;
        let stats = relay.relay_pending().await.unwrap();
        assert_eq!(stats.sent, 1);
    }

    #[tokio::test]
    async fn test_long_errors_are_truncated() {
        let (relay, db, _broker) = relay_fixture().await;

        struct VerboseFailingBroker;

        #[async_trait::async_trait]
        impl MessageBroker for VerboseFailingBroker {
            async fn publish(&self, _: &str, _: &str, _: &str) -> EngineResult<()> {
                Err(EngineError::PublishFailed("x".repeat(2000)))
            }
        }

        let config = Arc::new(EngineConfig::default());
        let (verbose_relay, _handle) =
            OutboxRelay::new(db.clone(), Arc::new(VerboseFailingBroker), config);
        drop(relay);

        let event = db.outbox().enqueue("t", "k", "{}").await.unwrap();
        verbose_relay.relay_pending().await.unwrap();

        let stored = db.outbox().find(&event.id).await.unwrap().unwrap();
        let error = stored.last_error.unwrap();
        assert_eq!(error.chars().count(), 500);
    }

    #[tokio::test]
    async fn test_cleanup_uses_configured_retention() {
        let (relay, db, _broker) = relay_fixture().await;
        let now = Utc::now();

        let old = db.outbox().enqueue("t", "k", "old").await.unwrap();
        let fresh = db.outbox().enqueue("t", "k", "fresh").await.unwrap();
        db.outbox()
            .mark_sent(&old.id, now - chrono::Duration::days(8))
            .await
            .unwrap();
        db.outbox()
            .mark_sent(&fresh.id, now - chrono::Duration::days(6))
            .await
            .unwrap();

        let deleted = relay.cleanup().await.unwrap();
        assert_eq!(deleted, 1);
        assert!(db.outbox().find(&old.id).await.unwrap().is_none());
        assert!(db.outbox().find(&fresh.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_spawned_relay_shuts_down() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let broker = Arc::new(InMemoryBroker::new());
        let config = Arc::new(EngineConfig::default());
        let (relay, handle) = OutboxRelay::new(db, broker, config);

        let task = tokio::spawn(relay.run());
        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }

    #[test]
    fn test_truncate_error_respects_char_boundaries() {
        assert_eq!(truncate_error("short", 500), "short");
        assert_eq!(truncate_error(&"é".repeat(600), 500).chars().count(), 500);
    }
}
