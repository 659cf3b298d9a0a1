//! # Price Engine
//!
//! Resolves nightly prices through the fixed-priority cascade.
//!
//! ## Fetch-Then-Pure
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              resolve_price_range(property, from, to, org)               │
//! │                                                                         │
//! │  I/O (staycast-db):                                                    │
//! │    1. find_overrides_in_range(...)   ← batch read #1                   │
//! │    2. find_active_plans(...)         ← batch read #2                   │
//! │    Exactly two batch reads regardless of range length.                 │
//! │                                                                         │
//! │  Pure (staycast-core::pricing):                                        │
//! │    per date: override → plan tiers → NeedsFallback                     │
//! │                                                                         │
//! │  Lazy I/O:                                                             │
//! │    3. find(property) — ONLY if some date reached the fallback tier;    │
//! │       PropertyNotFound surfaces here and nowhere else                  │
//! │                                                                         │
//! │  NEVER one query per day.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Resolution is a pure function of store state at call time: no caching
//! across calls, and reads take no locks — a concurrent writer may change
//! rows mid-range, which is an accepted trade-off, not snapshot isolation.

use chrono::{Days, NaiveDate};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use staycast_core::pricing::{resolve_night, NightResolution};
use staycast_core::validation::{validate_required, validate_resolve_range};
use staycast_core::{Money, RateOverride};
use staycast_db::Database;

use crate::error::{EngineError, EngineResult};

// =============================================================================
// Price Engine
// =============================================================================

/// Resolves nightly prices for properties.
#[derive(Debug, Clone)]
pub struct PriceEngine {
    db: Database,
}

impl PriceEngine {
    /// Creates a new PriceEngine.
    pub fn new(db: Database) -> Self {
        PriceEngine { db }
    }

    /// Resolves the nightly price for a single date.
    ///
    /// ## Returns
    /// * `Ok(Some(price))` - a cascade tier produced a price
    /// * `Ok(None)` - no override, no plan, no fallback: absent. This is
    ///   a normal result, distinct from a price of zero.
    /// * `Err(PropertyNotFound)` - the fallback tier was reached and the
    ///   property does not exist
    pub async fn resolve_price(
        &self,
        property_id: &str,
        date: NaiveDate,
        org_id: &str,
    ) -> EngineResult<Option<Money>> {
        let to = date
            .checked_add_days(Days::new(1))
            .ok_or_else(|| EngineError::Internal(format!("date overflow past {}", date)))?;

        let prices = self.resolve_price_range(property_id, date, to, org_id).await?;
        Ok(prices.get(&date).copied().flatten())
    }

    /// Resolves nightly prices for every date in `[from, to)`.
    ///
    /// Exactly two batch store reads plus at most one lazy property read;
    /// see the module docs for the cascade.
    pub async fn resolve_price_range(
        &self,
        property_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        org_id: &str,
    ) -> EngineResult<BTreeMap<NaiveDate, Option<Money>>> {
        validate_required("org_id", org_id)?;
        validate_required("property_id", property_id)?;
        validate_resolve_range(from, to)?;

        // Batch read #1: all overrides in range
        let overrides = self
            .db
            .rates()
            .find_overrides_in_range(org_id, property_id, from, to)
            .await?;

        // Batch read #2: all active plans, every tier
        let plans = self.db.rates().find_active_plans(org_id, property_id).await?;

        debug!(
            %property_id,
            overrides = overrides.len(),
            plans = plans.len(),
            %from,
            %to,
            "Resolving price range"
        );

        let override_by_date: HashMap<NaiveDate, &RateOverride> =
            overrides.iter().map(|o| (o.date, o)).collect();

        // Lazy fallback: the property is read once, and only if some date
        // actually falls through to tier 3.
        let mut fallback_price: Option<Option<Money>> = None;

        let mut prices = BTreeMap::new();
        for date in from.iter_days().take_while(|d| *d < to) {
            let resolved = resolve_night(date, override_by_date.get(&date).copied(), &plans);

            let price = match resolved {
                NightResolution::NeedsFallback => match fallback_price {
                    Some(cached) => cached,
                    None => {
                        let fetched = self.load_fallback(org_id, property_id).await?;
                        fallback_price = Some(fetched);
                        fetched
                    }
                },
                other => other.price(),
            };

            prices.insert(date, price);
        }

        Ok(prices)
    }

    /// Tier 3: the property's static fallback price.
    ///
    /// This is the only place an unknown property surfaces.
    async fn load_fallback(&self, org_id: &str, property_id: &str) -> EngineResult<Option<Money>> {
        let property = self
            .db
            .properties()
            .find(org_id, property_id)
            .await?
            .ok_or_else(|| EngineError::PropertyNotFound(property_id.to_string()))?;

        Ok(property.fallback_price())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
