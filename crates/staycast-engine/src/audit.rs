//! # Audit Sink
//!
//! Append-only writer over the distribution audit log that never raises
//! to its caller: a logging failure must not mask or replace the primary
//! distribution result.

use tracing::warn;

use staycast_core::{Channel, SyncStatus};
use staycast_db::AuditRepository;

// =============================================================================
// Audit Sink
// =============================================================================

/// Failure-swallowing wrapper around [`AuditRepository`].
#[derive(Debug, Clone)]
pub struct AuditSink {
    repo: AuditRepository,
}

impl AuditSink {
    /// Creates a new AuditSink.
    pub fn new(repo: AuditRepository) -> Self {
        AuditSink { repo }
    }

    /// Appends one audit row; write errors are logged and swallowed.
    pub async fn record(
        &self,
        org_id: &str,
        property_id: &str,
        channel: Channel,
        status: SyncStatus,
        message: &str,
        elapsed_ms: u64,
    ) {
        if let Err(e) = self
            .repo
            .record(org_id, property_id, channel, status, message, elapsed_ms)
            .await
        {
            warn!(
                ?e,
                %property_id,
                %channel,
                "Audit write failed; distribution result is unaffected"
            );
        }
    }
}
