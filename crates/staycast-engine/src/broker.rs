//! # Message Broker Seam
//!
//! The broker is an external collaborator: StayCast only needs a
//! synchronous acked publish. Wire protocol, partitioning mechanics and
//! consumer groups all live on the other side of this trait.
//!
//! ## The Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  publish(topic, partition_key, payload) → ack                           │
//! │                                                                         │
//! │  • Returning Ok(()) MEANS the broker has durably accepted the message  │
//! │    — the relay marks the outbox row SENT on this ack and nothing else  │
//! │  • Returning Err means NOT delivered — the relay marks the row FAILED  │
//! │  • The call blocks until ack; the relay adds its own timeout on top    │
//! │  • Messages sharing a partition_key land on the same partition, so     │
//! │    per-key ordering is the broker's to keep and the relay's to feed    │
//! │    in creation order                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{EngineError, EngineResult};

// =============================================================================
// Broker Trait
// =============================================================================

/// Synchronous acked publish to a message broker.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Publishes one message and awaits the broker ack.
    ///
    /// ## Errors
    /// Any error is treated as "not delivered" by the relay; a crash
    /// between broker ack and outbox status write can still duplicate a
    /// message, so consumers must be idempotent.
    async fn publish(&self, topic: &str, partition_key: &str, payload: &str) -> EngineResult<()>;
}

// =============================================================================
// In-Memory Broker
// =============================================================================

/// A message captured by [`InMemoryBroker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: String,
    pub partition_key: String,
    pub payload: String,
}

/// In-memory broker for tests and local development.
///
/// Records every acked publish and can be switched into a failing state
/// to simulate a broker outage.
#[derive(Default)]
pub struct InMemoryBroker {
    published: Mutex<Vec<PublishedMessage>>,
    failing: Mutex<bool>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switches the broker into (or out of) a failing state.
    pub async fn set_failing(&self, failing: bool) {
        *self.failing.lock().await = failing;
    }

    /// Returns all acked messages in publish order.
    pub async fn published(&self) -> Vec<PublishedMessage> {
        self.published.lock().await.clone()
    }
}

#[async_trait]
impl MessageBroker for InMemoryBroker {
    async fn publish(&self, topic: &str, partition_key: &str, payload: &str) -> EngineResult<()> {
        if *self.failing.lock().await {
            return Err(EngineError::PublishFailed(
                "simulated broker outage".to_string(),
            ));
        }

        self.published.lock().await.push(PublishedMessage {
            topic: topic.to_string(),
            partition_key: partition_key.to_string(),
            payload: payload.to_string(),
        });

        Ok(())
    }
}
