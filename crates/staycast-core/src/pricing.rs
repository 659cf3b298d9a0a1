//! # Price Resolution Cascade
//!
//! The pure per-date price cascade. All rows are fetched by the caller
//! (staycast-engine) up front; this module only decides.
//!
//! ## The Cascade
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              resolve_night(date, override, plans)                       │
//! │                                                                         │
//! │  1. Exact-date RateOverride?          ──► Override(price)   STOP        │
//! │  2. Plans, tier by tier:                                                │
//! │       Promotional ─► Seasonal ─► LastMinute ─► Base                    │
//! │       first tier with a matching plan ──► Plan(price)       STOP        │
//! │       (within a tier: max priority, tie → ascending plan id)           │
//! │  3. Neither matched                   ──► NeedsFallback                 │
//! │       caller substitutes the property's static fallback price,         │
//! │       or resolves the date to ABSENT if none is configured             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Absent is a normal result, distinct from a price of zero — callers must
//! never conflate the two.
//!
//! ## Determinism
//! Resolution is a pure function of the rows passed in. The tie-break
//! within a tier (highest `priority`, then ascending plan id) is stable so
//! the same store snapshot always resolves to the same prices.

use chrono::NaiveDate;

use crate::money::Money;
use crate::types::{RateOverride, RatePlan, RatePlanTier};

// =============================================================================
// Night Resolution
// =============================================================================

/// What the first two cascade tiers decided for one date.
///
/// The fallback tier needs a property read, which is I/O — so the pure
/// cascade stops at an explicit `NeedsFallback` marker instead of taking a
/// fallback price up front. This keeps the property read lazy: it happens
/// only when some date actually reaches tier 3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NightResolution {
    /// Tier 1: an exact-date override pins the price.
    Override(Money),

    /// Tier 2: a rate plan governs the date.
    Plan { price: Money, plan_id: String },

    /// Tiers 1-2 produced nothing; the caller consults the property
    /// fallback (tier 3) or resolves to absent (tier 4).
    NeedsFallback,
}

impl NightResolution {
    /// The resolved price, if tiers 1-2 produced one.
    pub fn price(&self) -> Option<Money> {
        match self {
            NightResolution::Override(price) => Some(*price),
            NightResolution::Plan { price, .. } => Some(*price),
            NightResolution::NeedsFallback => None,
        }
    }
}

// =============================================================================
// Cascade Evaluation
// =============================================================================

/// Resolves one night through cascade tiers 1 and 2.
///
/// ## Arguments
/// * `date` - the night being priced
/// * `exact_override` - the override row for exactly this date, if any
/// * `plans` - ALL active plans for the property (every tier, unfiltered)
///
/// ## Guarantees
/// - An override wins over any plan, regardless of tier or priority
/// - Tiers are consulted strictly in `RatePlanTier::CASCADE` order;
///   mutating a lower tier can never change a date resolved by a higher one
pub fn resolve_night(
    date: NaiveDate,
    exact_override: Option<&RateOverride>,
    plans: &[RatePlan],
) -> NightResolution {
    if let Some(rate_override) = exact_override {
        return NightResolution::Override(rate_override.nightly_price());
    }

    for tier in RatePlanTier::CASCADE {
        if let Some(plan) = select_plan(plans, tier, date) {
            return NightResolution::Plan {
                price: plan.nightly_price(),
                plan_id: plan.id.clone(),
            };
        }
    }

    NightResolution::NeedsFallback
}

/// Picks the governing plan of one tier for one date, if any.
///
/// Among active plans of the tier whose applicability predicate matches
/// the date: the highest `priority` wins, equal priorities break by
/// ascending plan id. Expressed as a single ordered selection over the
/// candidate list rather than a loop with breaks, so the tie-break is in
/// one place.
pub fn select_plan<'a>(
    plans: &'a [RatePlan],
    tier: RatePlanTier,
    date: NaiveDate,
) -> Option<&'a RatePlan> {
    plans
        .iter()
        .filter(|plan| plan.tier == tier && plan.is_active && plan.applies_to(date))
        // min over (priority descending, id ascending) = the winner
        .min_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DayOfWeekSet;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn override_row(on: NaiveDate, cents: i64) -> RateOverride {
        RateOverride {
            id: "ovr-1".to_string(),
            org_id: "org-1".to_string(),
            property_id: "prop-1".to_string(),
            date: on,
            nightly_price_cents: cents,
            source: "manual".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn plan(
        id: &str,
        tier: RatePlanTier,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        cents: i64,
        priority: i64,
    ) -> RatePlan {
        RatePlan {
            id: id.to_string(),
            org_id: "org-1".to_string(),
            property_id: "prop-1".to_string(),
            tier,
            name: format!("{} plan", tier),
            start_date: start,
            end_date: end,
            days_of_week: DayOfWeekSet::all(),
            nightly_price_cents: cents,
            priority,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// The spec-level acceptance scenario:
    /// override on 2025-06-01 at $120, SEASONAL over June at $100/priority 1,
    /// BASE at $80/priority 0, fallback $70.
    #[test]
    fn test_cascade_scenario() {
        let june = (Some(date(2025, 6, 1)), Some(date(2025, 6, 30)));
        let plans = vec![
            plan("seasonal-june", RatePlanTier::Seasonal, june.0, june.1, 10000, 1),
            plan("base", RatePlanTier::Base, june.0, june.1, 8000, 0),
        ];
        let pinned = override_row(date(2025, 6, 1), 12000);

        // Override wins on its date
        assert_eq!(
            resolve_night(date(2025, 6, 1), Some(&pinned), &plans),
            NightResolution::Override(Money::from_cents(12000))
        );

        // Seasonal governs the rest of June
        assert_eq!(
            resolve_night(date(2025, 6, 15), None, &plans).price(),
            Some(Money::from_cents(10000))
        );

        // July has no plan coverage: fall through to the property fallback
        assert_eq!(
            resolve_night(date(2025, 7, 1), None, &plans),
            NightResolution::NeedsFallback
        );
    }

    #[test]
    fn test_override_beats_any_plan() {
        let plans = vec![plan(
            "promo",
            RatePlanTier::Promotional,
            None,
            None,
            5000,
            99,
        )];
        let pinned = override_row(date(2025, 6, 1), 12000);

        let resolved = resolve_night(date(2025, 6, 1), Some(&pinned), &plans);
        assert_eq!(resolved, NightResolution::Override(Money::from_cents(12000)));
    }

    #[test]
    fn test_tier_order_beats_priority() {
        // A low-priority promotional plan still beats a high-priority base plan
        let plans = vec![
            plan("promo", RatePlanTier::Promotional, None, None, 9000, 0),
            plan("base", RatePlanTier::Base, None, None, 8000, 100),
        ];

        let resolved = resolve_night(date(2025, 6, 10), None, &plans);
        assert_eq!(resolved.price(), Some(Money::from_cents(9000)));
    }

    #[test]
    fn test_lower_tier_mutation_cannot_shadow_higher_tier() {
        let mut plans = vec![plan(
            "seasonal",
            RatePlanTier::Seasonal,
            None,
            None,
            10000,
            1,
        )];
        let before = resolve_night(date(2025, 6, 10), None, &plans).price();

        // Adding a base plan (lower tier) must not change the resolution
        plans.push(plan("base", RatePlanTier::Base, None, None, 100, 999));
        let after = resolve_night(date(2025, 6, 10), None, &plans).price();

        assert_eq!(before, after);
        assert_eq!(after, Some(Money::from_cents(10000)));
    }

    #[test]
    fn test_priority_within_tier() {
        let plans = vec![
            plan("low", RatePlanTier::Seasonal, None, None, 9000, 1),
            plan("high", RatePlanTier::Seasonal, None, None, 11000, 5),
        ];

        let resolved = resolve_night(date(2025, 6, 10), None, &plans);
        assert_eq!(resolved.price(), Some(Money::from_cents(11000)));
    }

    #[test]
    fn test_priority_tie_breaks_by_ascending_id() {
        let plans = vec![
            plan("plan-b", RatePlanTier::Seasonal, None, None, 9000, 5),
            plan("plan-a", RatePlanTier::Seasonal, None, None, 11000, 5),
        ];

        // Same tier, same priority: "plan-a" < "plan-b" wins
        match resolve_night(date(2025, 6, 10), None, &plans) {
            NightResolution::Plan { plan_id, price } => {
                assert_eq!(plan_id, "plan-a");
                assert_eq!(price, Money::from_cents(11000));
            }
            other => panic!("expected plan resolution, got {:?}", other),
        }
    }

    #[test]
    fn test_inactive_plans_are_invisible() {
        let mut inactive = plan("only", RatePlanTier::Base, None, None, 8000, 0);
        inactive.is_active = false;

        let resolved = resolve_night(date(2025, 6, 10), None, &[inactive]);
        assert_eq!(resolved, NightResolution::NeedsFallback);
    }

    #[test]
    fn test_non_applicable_dates_fall_through() {
        let plans = vec![plan(
            "june-only",
            RatePlanTier::Seasonal,
            Some(date(2025, 6, 1)),
            Some(date(2025, 6, 30)),
            10000,
            0,
        )];

        assert_eq!(
            resolve_night(date(2025, 7, 1), None, &plans),
            NightResolution::NeedsFallback
        );
    }
}
