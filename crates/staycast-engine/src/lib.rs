//! # staycast-engine: Rate Resolution & Distribution Engine
//!
//! This crate hosts the read-side engines (price cascade, restriction
//! validation) and the reliable delivery path (outbox relay, per-channel
//! distribution) for StayCast.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      StayCast Engine Architecture                       │
//! │                                                                         │
//! │  upstream mutation ──► outbox row (same transaction, upstream-owned)   │
//! │                               │                                         │
//! │                               ▼                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │  OutboxRelay   │  │  MessageBroker │  │  consumer (external)   │    │
//! │  │                │  │  (trait seam)  │  │                        │    │
//! │  │ tick: poll,    │─►│ publish → ack  │─►│ apply_calendar_update  │    │
//! │  │ publish, mark  │  │                │  │                        │    │
//! │  └────────────────┘  └────────────────┘  └───────────┬────────────┘    │
//! │                                                      │                 │
//! │  ┌─────────────────────────────────────────────────▼──────────────┐   │
//! │  │               RateDistributionService                           │   │
//! │  │                                                                 │   │
//! │  │  PriceEngine (2 batch reads + pure cascade)                     │   │
//! │  │       │                                                         │   │
//! │  │       ▼                                                         │   │
//! │  │  per channel mapping: ConnectorRegistry lookup → capability     │   │
//! │  │  check → timeout-bounded push → ChannelSyncResult → audit row   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  RestrictionEngine validates candidate stays on the side (pure read    │
//! │  path, structured outcomes, never exceptions for business violations)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Engine configuration (TOML file + env overrides)
//! - [`error`] - Engine error types and retryability classification
//! - [`price`] - `PriceEngine`: the nightly price cascade
//! - [`restriction`] - `RestrictionEngine`: stay validation
//! - [`broker`] - `MessageBroker` seam + in-memory test broker
//! - [`relay`] - `OutboxRelay`: at-least-once delivery from the outbox
//! - [`connector`] - `ChannelConnector` seam + registry
//! - [`audit`] - Failure-swallowing audit sink
//! - [`distribution`] - `RateDistributionService`: sync/async/bulk pushes
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use staycast_db::{Database, DbConfig};
//! use staycast_engine::{
//!     ConnectorRegistry, EngineConfig, OutboxRelay, RateDistributionService,
//! };
//!
//! let db = Database::new(DbConfig::new("./staycast.db")).await?;
//! let config = Arc::new(EngineConfig::load_or_default(None)?);
//!
//! // Background relay
//! let (relay, relay_handle) = OutboxRelay::new(db.clone(), broker, config.clone());
//! tokio::spawn(relay.run());
//!
//! // Interactive distribution
//! let mut registry = ConnectorRegistry::new();
//! registry.register(airbnb_connector);
//! let service = RateDistributionService::new(db, Arc::new(registry), config);
//! let results = service.distribute_rates(&property_id, from, to, &org_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod audit;
pub mod broker;
pub mod config;
pub mod connector;
pub mod distribution;
pub mod error;
pub mod price;
pub mod relay;
pub mod restriction;

// =============================================================================
// Re-exports
// =============================================================================

pub use audit::AuditSink;
pub use broker::{InMemoryBroker, MessageBroker, PublishedMessage};
pub use config::{DistributionSettings, EngineConfig, RelaySettings};
pub use connector::{CalendarPush, ChannelConnector, ConnectorCapability, ConnectorRegistry};
pub use distribution::{BulkDistributionReport, CalendarUpdate, RateDistributionService};
pub use error::{EngineError, EngineResult};
pub use price::PriceEngine;
pub use relay::{OutboxRelay, OutboxRelayHandle, RelayMetrics, RelayStats};
pub use restriction::RestrictionEngine;
