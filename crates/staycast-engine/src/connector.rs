//! # Channel Connector Seam
//!
//! Connectors are opaque capabilities: StayCast hands one a resolved
//! calendar and gets back an acknowledgement or an error. The wire
//! protocol of each sales channel lives entirely behind this trait.
//!
//! ## Registry Design
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      ConnectorRegistry                                  │
//! │                                                                         │
//! │  Channel::Airbnb     ──► Arc<dyn ChannelConnector>                     │
//! │  Channel::Vrbo       ──► Arc<dyn ChannelConnector>                     │
//! │  Channel::BookingCom ──► (none registered → pushes are SKIPPED)        │
//! │                                                                         │
//! │  The key is the CLOSED Channel enum: adding a channel is a source      │
//! │  change that also adds a connector. No reflection, no string keys.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::warn;

use staycast_core::{Channel, Money};

use crate::error::EngineResult;

// =============================================================================
// Capabilities
// =============================================================================

/// What a connector can do.
///
/// `supports()` gates each use: a connector that cannot push calendars
/// yields `Skipped` results on the distribution path, never `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorCapability {
    /// Push nightly prices/availability for a date range.
    CalendarPush,
    /// Pull reservations from the channel (future inbound sync).
    ReservationPull,
}

// =============================================================================
// Calendar Push
// =============================================================================

/// A resolved calendar handed to a connector.
#[derive(Debug, Clone)]
pub struct CalendarPush {
    pub org_id: String,
    pub property_id: String,

    /// The listing id on the channel's side, from the channel mapping.
    pub external_listing_id: String,

    /// Property currency; conversion is the channel's concern, not ours.
    pub currency_code: String,

    /// Half-open range `[from, to)` the prices cover.
    pub from: NaiveDate,
    pub to: NaiveDate,

    /// Resolved nightly prices. `None` marks a date with no resolvable
    /// price — connectors typically close those dates out.
    pub nightly_prices: BTreeMap<NaiveDate, Option<Money>>,
}

// =============================================================================
// Connector Trait
// =============================================================================

/// One sales channel's push capability.
#[async_trait]
pub trait ChannelConnector: Send + Sync {
    /// Which channel this connector serves.
    fn channel(&self) -> Channel;

    /// Whether the connector implements a capability.
    fn supports(&self, capability: ConnectorCapability) -> bool;

    /// Pushes a resolved calendar to the channel.
    ///
    /// ## Returns
    /// A short human-readable summary on success ("34 nights updated").
    /// Errors are transient delivery failures; the caller owns timeouts
    /// and isolation.
    async fn push_calendar_update(&self, push: &CalendarPush) -> EngineResult<String>;
}

// =============================================================================
// Registry
// =============================================================================

/// The closed set of registered connectors, keyed by [`Channel`].
#[derive(Default)]
pub struct ConnectorRegistry {
    connectors: HashMap<Channel, Arc<dyn ChannelConnector>>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connector under its own channel key.
    ///
    /// Re-registering a channel replaces the previous connector.
    pub fn register(&mut self, connector: Arc<dyn ChannelConnector>) {
        let channel = connector.channel();
        if self.connectors.insert(channel, connector).is_some() {
            warn!(%channel, "Replacing previously registered connector");
        }
    }

    /// Looks up the connector for a channel.
    pub fn get(&self, channel: Channel) -> Option<Arc<dyn ChannelConnector>> {
        self.connectors.get(&channel).cloned()
    }

    /// Number of registered connectors.
    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    /// Whether no connector is registered.
    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubConnector(Channel);

    #[async_trait]
    impl ChannelConnector for StubConnector {
        fn channel(&self) -> Channel {
            self.0
        }

        fn supports(&self, capability: ConnectorCapability) -> bool {
            capability == ConnectorCapability::CalendarPush
        }

        async fn push_calendar_update(&self, _push: &CalendarPush) -> EngineResult<String> {
            Ok("ok".to_string())
        }
    }

    #[test]
    fn test_registry_keyed_by_channel() {
        let mut registry = ConnectorRegistry::new();
        assert!(registry.is_empty());

        registry.register(Arc::new(StubConnector(Channel::Airbnb)));
        registry.register(Arc::new(StubConnector(Channel::Vrbo)));

        assert_eq!(registry.len(), 2);
        assert!(registry.get(Channel::Airbnb).is_some());
        assert!(registry.get(Channel::Expedia).is_none());
    }

    #[test]
    fn test_registering_twice_replaces() {
        let mut registry = ConnectorRegistry::new();
        registry.register(Arc::new(StubConnector(Channel::Airbnb)));
        registry.register(Arc::new(StubConnector(Channel::Airbnb)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_capability_gate() {
        let connector = StubConnector(Channel::Airbnb);
        assert!(connector.supports(ConnectorCapability::CalendarPush));
        assert!(!connector.supports(ConnectorCapability::ReservationPull));
    }
}
