//! # Rate Distribution Service
//!
//! Pushes resolved calendars to every connected sales channel and records
//! one audit outcome per attempt.
//!
//! ## Distribution Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │            distribute_rates(property, from, to, org)                    │
//! │                                                                         │
//! │  1. Load property (NotFound stops here) and active channel mappings    │
//! │  2. Resolve the calendar ONCE via PriceEngine (two batch reads)        │
//! │  3. Per mapping:                                                       │
//! │       no connector registered      → SKIPPED (config gap, no retry)    │
//! │       capability unsupported       → SKIPPED                           │
//! │       connector error or timeout   → FAILED (isolated to the channel)  │
//! │       connector ack                → SUCCESS                           │
//! │     each attempt has its own timeout and failure boundary — a hung     │
//! │     channel never blocks its siblings                                  │
//! │  4. One audit row per attempt, regardless of outcome; audit failures   │
//! │     are swallowed by the sink and never replace the primary result     │
//! │                                                                         │
//! │  INVOCATION MODES:                                                     │
//! │  • Synchronous: interactive/admin calls go straight to the logic       │
//! │  • Asynchronous: queue_distribution() writes an outbox event on topic  │
//! │    "calendar.updates" (partition key = property id); the relay         │
//! │    delivers it and the consumer feeds apply_calendar_update() — the    │
//! │    retry budget lives in the relay, not here                           │
//! │  • Bulk: every property with an active mapping, isolated per property  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use staycast_core::validation::{validate_required, validate_resolve_range};
use staycast_core::{
    Channel, ChannelMapping, ChannelSyncResult, OutboxEvent, Property, SyncStatus,
    CALENDAR_UPDATES_TOPIC,
};
use staycast_db::Database;

use crate::audit::AuditSink;
use crate::config::EngineConfig;
use crate::connector::{CalendarPush, ConnectorCapability, ConnectorRegistry};
use crate::error::{EngineError, EngineResult};
use crate::price::PriceEngine;

// =============================================================================
// Async Payload
// =============================================================================

/// Payload of a `calendar.updates` outbox event.
///
/// Producers (queue_distribution) and the consumer (apply_calendar_update)
/// share this shape; the broker sees opaque JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarUpdate {
    pub org_id: String,
    pub property_id: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

// =============================================================================
// Bulk Report
// =============================================================================

/// Outcome of a bulk distribution run.
///
/// Failures are isolated per property: a property that errored appears in
/// `errors`, every other property still appears in `properties` with its
/// per-channel results.
#[derive(Debug, Default)]
pub struct BulkDistributionReport {
    /// Per-channel results of each property that completed.
    pub properties: BTreeMap<String, BTreeMap<Channel, ChannelSyncResult>>,

    /// Error message of each property that did not complete.
    pub errors: BTreeMap<String, String>,
}

impl BulkDistributionReport {
    /// Whether every property completed (channel-level failures included —
    /// those live inside the per-channel results).
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

// =============================================================================
// Rate Distribution Service
// =============================================================================

/// Orchestrates per-channel calendar pushes for properties.
pub struct RateDistributionService {
    db: Database,
    price_engine: PriceEngine,
    registry: Arc<ConnectorRegistry>,
    audit: AuditSink,
    config: Arc<EngineConfig>,
}

impl RateDistributionService {
    /// Creates a new distribution service.
    pub fn new(db: Database, registry: Arc<ConnectorRegistry>, config: Arc<EngineConfig>) -> Self {
        let price_engine = PriceEngine::new(db.clone());
        let audit = AuditSink::new(db.audit());

        RateDistributionService {
            db,
            price_engine,
            registry,
            audit,
            config,
        }
    }

    /// Pushes the resolved calendar for `[from, to)` to every active
    /// channel mapping of one property.
    ///
    /// ## Returns
    /// One [`ChannelSyncResult`] per active mapping. Channel failures are
    /// isolated: they appear in the map as `Failed`, they are never thrown.
    pub async fn distribute_rates(
        &self,
        property_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        org_id: &str,
    ) -> EngineResult<BTreeMap<Channel, ChannelSyncResult>> {
        validate_required("org_id", org_id)?;
        validate_required("property_id", property_id)?;
        validate_resolve_range(from, to)?;

        let property = self
            .db
            .properties()
            .find(org_id, property_id)
            .await?
            .ok_or_else(|| EngineError::PropertyNotFound(property_id.to_string()))?;

        let mappings = self
            .db
            .properties()
            .find_active_channel_mappings(org_id, property_id)
            .await?;

        if mappings.is_empty() {
            debug!(%property_id, "No active channel mappings, nothing to distribute");
            return Ok(BTreeMap::new());
        }

        // Resolve the calendar once; channel markup/markdown is the
        // connector side's concern.
        let prices = self
            .price_engine
            .resolve_price_range(property_id, from, to, org_id)
            .await?;

        info!(
            %property_id,
            channels = mappings.len(),
            nights = prices.len(),
            "Distributing rates"
        );

        let mut results = BTreeMap::new();
        for mapping in mappings {
            let result = self
                .push_one_channel(&property, &mapping, from, to, &prices)
                .await;

            // One audit row per attempt, regardless of outcome.
            self.audit
                .record(
                    org_id,
                    property_id,
                    mapping.channel,
                    result.status,
                    &result.message,
                    result.elapsed_ms,
                )
                .await;

            results.insert(mapping.channel, result);
        }

        Ok(results)
    }

    /// One channel attempt inside its own timeout and failure boundary.
    /// Never returns an error — every outcome is a [`ChannelSyncResult`].
    async fn push_one_channel(
        &self,
        property: &Property,
        mapping: &ChannelMapping,
        from: NaiveDate,
        to: NaiveDate,
        prices: &BTreeMap<NaiveDate, Option<staycast_core::Money>>,
    ) -> ChannelSyncResult {
        let connector = match self.registry.get(mapping.channel) {
            Some(connector) => connector,
            None => {
                // Configuration gap, not a transient fault: not retry-eligible.
                return ChannelSyncResult::skipped(format!(
                    "no connector registered for {}",
                    mapping.channel
                ));
            }
        };

        if !connector.supports(ConnectorCapability::CalendarPush) {
            return ChannelSyncResult::skipped(format!(
                "connector for {} does not support calendar push",
                mapping.channel
            ));
        }

        let push = CalendarPush {
            org_id: mapping.org_id.clone(),
            property_id: mapping.property_id.clone(),
            external_listing_id: mapping.external_listing_id.clone(),
            currency_code: property.currency_code.clone(),
            from,
            to,
            nightly_prices: prices.clone(),
        };

        let started = Instant::now();
        let attempt = tokio::time::timeout(
            self.config.connector_timeout(),
            connector.push_calendar_update(&push),
        )
        .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match attempt {
            Ok(Ok(summary)) => ChannelSyncResult::success(summary, elapsed_ms),
            Ok(Err(e)) => {
                warn!(channel = %mapping.channel, error = %e, "Channel push failed");
                ChannelSyncResult::failed(e.to_string(), elapsed_ms)
            }
            Err(_) => {
                let seconds = self.config.distribution.connector_timeout_secs;
                warn!(channel = %mapping.channel, seconds, "Channel push timed out");
                ChannelSyncResult::failed(
                    EngineError::ConnectorTimeout {
                        channel: mapping.channel.to_string(),
                        seconds,
                    }
                    .to_string(),
                    elapsed_ms,
                )
            }
        }
    }

    /// Asynchronous invocation: enqueues a `calendar.updates` outbox event
    /// (partition key = property id) instead of pushing inline. The relay
    /// owns delivery and retries from here.
    pub async fn queue_distribution(
        &self,
        property_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        org_id: &str,
    ) -> EngineResult<OutboxEvent> {
        validate_required("org_id", org_id)?;
        validate_required("property_id", property_id)?;
        validate_resolve_range(from, to)?;

        let update = CalendarUpdate {
            org_id: org_id.to_string(),
            property_id: property_id.to_string(),
            from,
            to,
        };
        let payload = serde_json::to_string(&update)?;

        let event = self
            .db
            .outbox()
            .enqueue(CALENDAR_UPDATES_TOPIC, property_id, &payload)
            .await?;

        debug!(event_id = %event.id, %property_id, "Queued calendar distribution");
        Ok(event)
    }

    /// Consumer side of the async path: applies a delivered
    /// `calendar.updates` payload with the same logic as the sync path.
    pub async fn apply_calendar_update(
        &self,
        payload: &str,
    ) -> EngineResult<BTreeMap<Channel, ChannelSyncResult>> {
        let update: CalendarUpdate = serde_json::from_str(payload)?;

        self.distribute_rates(&update.property_id, update.from, update.to, &update.org_id)
            .await
    }

    /// Bulk mode: distributes for every active property of the org that
    /// has at least one active channel mapping.
    ///
    /// Failures are isolated per property — one property's outage never
    /// blocks another's distribution.
    pub async fn distribute_rates_for_all_properties(
        &self,
        org_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<BulkDistributionReport> {
        validate_required("org_id", org_id)?;
        validate_resolve_range(from, to)?;

        let property_ids = self
            .db
            .properties()
            .find_property_ids_with_active_mappings(org_id)
            .await?;

        info!(count = property_ids.len(), "Bulk distributing rates");

        let mut report = BulkDistributionReport::default();
        for property_id in property_ids {
            match self.distribute_rates(&property_id, from, to, org_id).await {
                Ok(results) => {
                    report.properties.insert(property_id, results);
                }
                Err(e) => {
                    warn!(%property_id, error = %e, "Property distribution failed, continuing");
                    report.errors.insert(property_id, e.to_string());
                }
            }
        }

        Ok(report)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
