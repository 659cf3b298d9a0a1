//! # Domain Types
//!
//! Core domain types used throughout StayCast.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  RateOverride   │   │    RatePlan     │   │BookingRestriction│      │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  date           │   │  tier           │   │  start/end date │       │
//! │  │  price_cents    │   │  priority       │   │  min/max stay   │       │
//! │  │  source         │   │  price_cents    │   │  priority       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  OutboxEvent    │   │    Channel      │   │ ChannelMapping  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  topic          │   │  Airbnb         │   │  channel        │       │
//! │  │  partition_key  │   │  Vrbo           │   │  external id    │       │
//! │  │  status         │   │  BookingCom     │   │  property_id    │       │
//! │  │  retry_count    │   │  Expedia        │   │                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business scope: `(org_id, property_id, ...)` - the multi-tenant key
//!   threaded explicitly through every read (never ambient state)

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Day-of-Week Set
// =============================================================================

/// A set of weekdays stored as a 7-bit mask (bit 0 = Monday ... bit 6 = Sunday).
///
/// ## Why a Bitmask?
/// Rate plans and restrictions scope themselves to weekdays ("weekend
/// pricing", "no Sunday arrivals"). A u8 mask round-trips through a single
/// INTEGER column and compares in one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayOfWeekSet(u8);

impl DayOfWeekSet {
    const ALL_BITS: u8 = 0b0111_1111;

    /// The set containing every weekday.
    #[inline]
    pub const fn all() -> Self {
        DayOfWeekSet(Self::ALL_BITS)
    }

    /// The empty set (matches no dates).
    #[inline]
    pub const fn empty() -> Self {
        DayOfWeekSet(0)
    }

    /// Builds a set from raw bits (bit 0 = Monday). Extra bits are masked off.
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        DayOfWeekSet(bits & Self::ALL_BITS)
    }

    /// Returns the raw bits (bit 0 = Monday).
    #[inline]
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Returns a new set with the given weekday added.
    pub fn with(self, day: Weekday) -> Self {
        DayOfWeekSet(self.0 | (1 << day.num_days_from_monday()))
    }

    /// Checks whether the set contains the given weekday.
    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    /// Checks whether the set contains the weekday of the given date.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.contains(date.weekday())
    }
}

/// Default is every weekday — an unscoped rule applies to all dates.
impl Default for DayOfWeekSet {
    fn default() -> Self {
        DayOfWeekSet::all()
    }
}

// =============================================================================
// Property
// =============================================================================

/// A rentable property.
///
/// Only the slice of the property relevant to rate resolution lives here:
/// the static fallback price (cascade tier 3) and the active flag. Full
/// property CRUD is owned by upstream services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Organization this property belongs to.
    pub org_id: String,

    /// Display name.
    pub name: String,

    /// Static fallback nightly price in cents, used when no override or
    /// plan matches a date. `None` means dates without plan coverage
    /// resolve to absent.
    pub fallback_price_cents: Option<i64>,

    /// ISO 4217 currency code for this property's prices.
    /// Conversion is out of scope; this is carried for channel payloads.
    pub currency_code: String,

    /// Whether the property is active (soft delete).
    pub is_active: bool,

    /// When the property was created.
    pub created_at: DateTime<Utc>,

    /// When the property was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Property {
    /// Returns the fallback price as Money, if one is configured.
    #[inline]
    pub fn fallback_price(&self) -> Option<Money> {
        self.fallback_price_cents.map(Money::from_cents)
    }
}

// =============================================================================
// Rate Override
// =============================================================================

/// An absolute per-date price pin bypassing all plan-based resolution.
///
/// At most one override exists per `(org_id, property_id, date)` — the
/// highest-priority price signal in the cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateOverride {
    pub id: String,
    pub org_id: String,
    pub property_id: String,

    /// The single date this override pins.
    pub date: NaiveDate,

    /// Pinned nightly price in cents.
    pub nightly_price_cents: i64,

    /// Where the override came from ("manual", "revenue-tool", ...).
    /// Informational only; resolution does not branch on it.
    pub source: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RateOverride {
    /// Returns the pinned price as Money.
    #[inline]
    pub fn nightly_price(&self) -> Money {
        Money::from_cents(self.nightly_price_cents)
    }
}

// =============================================================================
// Rate Plan
// =============================================================================

/// The cascade tier of a rate plan.
///
/// ## Cascade Order
/// Tiers are consulted in a FIXED order; the first tier with a matching
/// plan wins and lower tiers are never reached for that date:
/// ```text
/// Promotional → Seasonal → LastMinute → Base
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatePlanTier {
    /// Short-lived promotional pricing; beats everything but overrides.
    Promotional,
    /// Season-scoped pricing (high/low season windows).
    Seasonal,
    /// Close-to-arrival discount windows.
    LastMinute,
    /// The property's standing rate plan.
    Base,
}

impl RatePlanTier {
    /// Cascade evaluation order, highest precedence first.
    ///
    /// Resolution iterates this array; keep it the single source of truth
    /// for tier precedence.
    pub const CASCADE: [RatePlanTier; 4] = [
        RatePlanTier::Promotional,
        RatePlanTier::Seasonal,
        RatePlanTier::LastMinute,
        RatePlanTier::Base,
    ];

    /// Stable storage name for this tier.
    pub const fn as_str(&self) -> &'static str {
        match self {
            RatePlanTier::Promotional => "promotional",
            RatePlanTier::Seasonal => "seasonal",
            RatePlanTier::LastMinute => "last_minute",
            RatePlanTier::Base => "base",
        }
    }
}

impl fmt::Display for RatePlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RatePlanTier {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "promotional" => Ok(RatePlanTier::Promotional),
            "seasonal" => Ok(RatePlanTier::Seasonal),
            "last_minute" => Ok(RatePlanTier::LastMinute),
            "base" => Ok(RatePlanTier::Base),
            other => Err(ValidationError::InvalidFormat {
                field: "tier".to_string(),
                reason: format!("unknown rate plan tier '{}'", other),
            }),
        }
    }
}

/// A rate plan: a price that applies to the dates matched by its
/// applicability predicate.
///
/// ## Applicability Predicate
/// A plan applies to a date when:
/// - the date is within the optional `[start_date, end_date]` bounds
///   (an absent bound is open-ended), and
/// - the date's weekday is in `days_of_week`.
///
/// ## Tie-Breaking
/// Within a tier, the matching plan with the highest `priority` wins;
/// equal priorities break by ascending plan id. The secondary key is
/// deliberate and stable so resolution is reproducible across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatePlan {
    pub id: String,
    pub org_id: String,
    pub property_id: String,

    /// Cascade tier; fixes which stage of resolution consults this plan.
    pub tier: RatePlanTier,

    /// Display name ("Summer 2025", "Midweek special").
    pub name: String,

    /// Inclusive start of the applicability window (None = open).
    pub start_date: Option<NaiveDate>,

    /// Inclusive end of the applicability window (None = open).
    pub end_date: Option<NaiveDate>,

    /// Weekdays the plan covers.
    pub days_of_week: DayOfWeekSet,

    /// Nightly price in cents while this plan governs a date.
    pub nightly_price_cents: i64,

    /// Tie-break rank within the tier; higher wins.
    pub priority: i64,

    /// Whether the plan participates in resolution (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RatePlan {
    /// Evaluates the applicability predicate for a single date.
    pub fn applies_to(&self, date: NaiveDate) -> bool {
        if let Some(start) = self.start_date {
            if date < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if date > end {
                return false;
            }
        }
        self.days_of_week.contains_date(date)
    }

    /// Returns the plan price as Money.
    #[inline]
    pub fn nightly_price(&self) -> Money {
        Money::from_cents(self.nightly_price_cents)
    }
}

// =============================================================================
// Booking Restriction
// =============================================================================

/// A stay-level rule scoped to a date range.
///
/// Ranges may overlap; only the single highest-priority restriction whose
/// activation predicate matches the check-in date governs a stay. Lower
/// priority restrictions are never consulted, even if also violated —
/// a deliberate exclusivity invariant, not an oversight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRestriction {
    pub id: String,
    pub org_id: String,
    pub property_id: String,

    /// Inclusive start of the governed date range.
    pub start_date: NaiveDate,

    /// Inclusive end of the governed date range.
    pub end_date: NaiveDate,

    /// Minimum stay length in nights, if constrained.
    pub min_stay: Option<i64>,

    /// Maximum stay length in nights, if constrained.
    pub max_stay: Option<i64>,

    /// No stay may begin on a date this restriction governs.
    pub closed_to_arrival: bool,

    /// No stay may end on a date within this restriction's range.
    pub closed_to_departure: bool,

    /// Minimum days between booking time and check-in, if constrained.
    pub advance_notice_days: Option<i64>,

    /// Weekdays on which the restriction activates (checked against check-in).
    pub days_of_week: DayOfWeekSet,

    /// Governing rank; the highest-priority activated restriction wins.
    pub priority: i64,

    /// Whether the restriction participates in validation (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookingRestriction {
    /// Activation predicate: does this restriction govern a stay beginning
    /// on `check_in`?
    pub fn activates_on(&self, check_in: NaiveDate) -> bool {
        check_in >= self.start_date
            && check_in <= self.end_date
            && self.days_of_week.contains_date(check_in)
    }

    /// Whether the restriction's date range contains `date`.
    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

// =============================================================================
// Validation Outcome
// =============================================================================

/// The result of validating a candidate stay.
///
/// Either fully valid or invalid with at least one violation — never
/// partial. Violations are human-readable strings for UI display; business
/// violations never become errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub violations: Vec<String>,
}

impl ValidationOutcome {
    /// A fully valid outcome with no violations.
    pub fn valid() -> Self {
        ValidationOutcome {
            valid: true,
            violations: Vec::new(),
        }
    }

    /// An invalid outcome carrying the collected violations.
    pub fn invalid(violations: Vec<String>) -> Self {
        debug_assert!(!violations.is_empty());
        ValidationOutcome {
            valid: false,
            violations,
        }
    }
}

// =============================================================================
// Outbox Event
// =============================================================================

/// Delivery status of an outbox event.
///
/// ## State Machine
/// ```text
/// PENDING ──publish acked──► SENT          (terminal, swept by cleanup)
///    │
///    └──publish threw──► FAILED ──retry ok──► SENT
///                           │
///                           └── retry_count >= MAX_RETRIES: terminal,
///                               operator intervention required
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboxStatus {
    /// Inserted by an upstream mutation, not yet delivered.
    Pending,
    /// Broker acknowledged the publish.
    Sent,
    /// Publish threw; retried until the retry budget is exhausted.
    Failed,
}

impl OutboxStatus {
    /// Stable storage name for this status.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OutboxStatus::Pending => "pending",
            OutboxStatus::Sent => "sent",
            OutboxStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for OutboxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutboxStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OutboxStatus::Pending),
            "sent" => Ok(OutboxStatus::Sent),
            "failed" => Ok(OutboxStatus::Failed),
            other => Err(ValidationError::InvalidFormat {
                field: "status".to_string(),
                reason: format!("unknown outbox status '{}'", other),
            }),
        }
    }
}

/// An entry in the transactional outbox.
///
/// Rows are created by upstream mutation services in the same transaction
/// as the business write. From then on the relay is the sole writer of
/// `status`, `retry_count`, `sent_at` and `last_error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub id: String,

    /// Broker topic the payload is destined for.
    pub topic: String,

    /// Routes related events to the same broker partition. Ordering is
    /// guaranteed only among events sharing this key.
    pub partition_key: String,

    /// Opaque JSON payload.
    pub payload: String,

    pub status: OutboxStatus,

    /// Number of failed delivery attempts so far.
    pub retry_count: i64,

    /// Last delivery error, truncated at write time.
    pub last_error: Option<String>,

    pub created_at: DateTime<Utc>,

    /// When the broker acked, for SENT rows.
    pub sent_at: Option<DateTime<Utc>>,
}

/// Tagged-union view of an outbox row's delivery state.
///
/// The flat columns are the storage shape; this is the honest domain
/// shape — a SENT row always has an ack time, a FAILED row always has a
/// reason and an attempt count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryState {
    Pending,
    Sent { at: DateTime<Utc> },
    Failed { reason: String, count: i64 },
}

impl OutboxEvent {
    /// Projects the flat status columns into the tagged union.
    pub fn delivery_state(&self) -> DeliveryState {
        match self.status {
            OutboxStatus::Pending => DeliveryState::Pending,
            OutboxStatus::Sent => DeliveryState::Sent {
                // A SENT row without sent_at would be a relay bug; surface
                // the row's creation time rather than panicking on read.
                at: self.sent_at.unwrap_or(self.created_at),
            },
            OutboxStatus::Failed => DeliveryState::Failed {
                reason: self
                    .last_error
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string()),
                count: self.retry_count,
            },
        }
    }

    /// Whether this FAILED row still has retry budget left.
    pub fn is_retryable(&self, max_retries: i64) -> bool {
        self.status == OutboxStatus::Failed && self.retry_count < max_retries
    }
}

// =============================================================================
// Channels
// =============================================================================

/// A sales channel StayCast can distribute to.
///
/// A closed set: adding a channel is a source change that also registers a
/// connector, never runtime reflection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Airbnb,
    Vrbo,
    BookingCom,
    Expedia,
}

impl Channel {
    /// Stable storage name for this channel.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Channel::Airbnb => "airbnb",
            Channel::Vrbo => "vrbo",
            Channel::BookingCom => "booking_com",
            Channel::Expedia => "expedia",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "airbnb" => Ok(Channel::Airbnb),
            "vrbo" => Ok(Channel::Vrbo),
            "booking_com" => Ok(Channel::BookingCom),
            "expedia" => Ok(Channel::Expedia),
            other => Err(ValidationError::InvalidFormat {
                field: "channel".to_string(),
                reason: format!("unknown channel '{}'", other),
            }),
        }
    }
}

/// Link between a property and a listing on an external channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelMapping {
    pub id: String,
    pub org_id: String,
    pub property_id: String,
    pub channel: Channel,

    /// The listing id on the channel's side.
    pub external_listing_id: String,

    /// Whether distribution targets this mapping.
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Distribution Results
// =============================================================================

/// Outcome class of one channel push attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Connector acknowledged the calendar update.
    Success,
    /// Connector threw or timed out. Retry-eligible through the async path.
    Failed,
    /// No connector registered, or capability unsupported. Not
    /// retry-eligible — a configuration gap, not a transient fault.
    Skipped,
}

impl SyncStatus {
    /// Stable storage name for this status.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Success => "success",
            SyncStatus::Failed => "failed",
            SyncStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The recorded result of one channel push attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSyncResult {
    pub status: SyncStatus,

    /// Human-readable outcome detail, mirrored into the audit log.
    pub message: String,

    /// Wall-clock duration of the attempt.
    pub elapsed_ms: u64,
}

impl ChannelSyncResult {
    pub fn success(message: impl Into<String>, elapsed_ms: u64) -> Self {
        ChannelSyncResult {
            status: SyncStatus::Success,
            message: message.into(),
            elapsed_ms,
        }
    }

    pub fn failed(message: impl Into<String>, elapsed_ms: u64) -> Self {
        ChannelSyncResult {
            status: SyncStatus::Failed,
            message: message.into(),
            elapsed_ms,
        }
    }

    pub fn skipped(message: impl Into<String>) -> Self {
        ChannelSyncResult {
            status: SyncStatus::Skipped,
            message: message.into(),
            elapsed_ms: 0,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn plan_for_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> RatePlan {
        RatePlan {
            id: "plan-1".to_string(),
            org_id: "org-1".to_string(),
            property_id: "prop-1".to_string(),
            tier: RatePlanTier::Seasonal,
            name: "Test plan".to_string(),
            start_date: start,
            end_date: end,
            days_of_week: DayOfWeekSet::all(),
            nightly_price_cents: 10000,
            priority: 0,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_cascade_order() {
        assert_eq!(
            RatePlanTier::CASCADE,
            [
                RatePlanTier::Promotional,
                RatePlanTier::Seasonal,
                RatePlanTier::LastMinute,
                RatePlanTier::Base,
            ]
        );
    }

    #[test]
    fn test_tier_round_trip() {
        for tier in RatePlanTier::CASCADE {
            assert_eq!(tier.as_str().parse::<RatePlanTier>().unwrap(), tier);
        }
        assert!("weekly".parse::<RatePlanTier>().is_err());
    }

    #[test]
    fn test_day_of_week_set() {
        let weekends = DayOfWeekSet::empty().with(Weekday::Sat).with(Weekday::Sun);
        assert!(weekends.contains(Weekday::Sat));
        assert!(weekends.contains(Weekday::Sun));
        assert!(!weekends.contains(Weekday::Mon));

        // 2025-07-12 is a Saturday
        assert!(weekends.contains_date(date(2025, 7, 12)));
        assert!(!weekends.contains_date(date(2025, 7, 14)));

        assert_eq!(DayOfWeekSet::default(), DayOfWeekSet::all());
        assert_eq!(DayOfWeekSet::from_bits(0xFF), DayOfWeekSet::all());
    }

    #[test]
    fn test_plan_applicability_bounds() {
        let bounded = plan_for_range(Some(date(2025, 6, 1)), Some(date(2025, 6, 30)));
        assert!(bounded.applies_to(date(2025, 6, 1)));
        assert!(bounded.applies_to(date(2025, 6, 30)));
        assert!(!bounded.applies_to(date(2025, 5, 31)));
        assert!(!bounded.applies_to(date(2025, 7, 1)));

        let open = plan_for_range(None, None);
        assert!(open.applies_to(date(2020, 1, 1)));
        assert!(open.applies_to(date(2030, 12, 31)));

        let open_ended = plan_for_range(Some(date(2025, 6, 1)), None);
        assert!(!open_ended.applies_to(date(2025, 5, 31)));
        assert!(open_ended.applies_to(date(2026, 1, 1)));
    }

    #[test]
    fn test_plan_applicability_weekdays() {
        let mut plan = plan_for_range(None, None);
        plan.days_of_week = DayOfWeekSet::empty().with(Weekday::Fri).with(Weekday::Sat);

        // 2025-07-11 is a Friday, 2025-07-13 a Sunday
        assert!(plan.applies_to(date(2025, 7, 11)));
        assert!(!plan.applies_to(date(2025, 7, 13)));
    }

    #[test]
    fn test_restriction_activation() {
        let restriction = BookingRestriction {
            id: "r-1".to_string(),
            org_id: "org-1".to_string(),
            property_id: "prop-1".to_string(),
            start_date: date(2025, 7, 1),
            end_date: date(2025, 7, 31),
            min_stay: Some(3),
            max_stay: None,
            closed_to_arrival: false,
            closed_to_departure: false,
            advance_notice_days: None,
            days_of_week: DayOfWeekSet::all(),
            priority: 0,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(restriction.activates_on(date(2025, 7, 1)));
        assert!(restriction.activates_on(date(2025, 7, 31)));
        assert!(!restriction.activates_on(date(2025, 8, 1)));
        assert!(restriction.covers(date(2025, 7, 15)));
        assert!(!restriction.covers(date(2025, 6, 30)));
    }

    #[test]
    fn test_delivery_state_projection() {
        let now = Utc::now();
        let mut event = OutboxEvent {
            id: "evt-1".to_string(),
            topic: "calendar.updates".to_string(),
            partition_key: "prop-1".to_string(),
            payload: "{}".to_string(),
            status: OutboxStatus::Pending,
            retry_count: 0,
            last_error: None,
            created_at: now,
            sent_at: None,
        };
        assert_eq!(event.delivery_state(), DeliveryState::Pending);

        event.status = OutboxStatus::Sent;
        event.sent_at = Some(now);
        assert_eq!(event.delivery_state(), DeliveryState::Sent { at: now });

        event.status = OutboxStatus::Failed;
        event.retry_count = 2;
        event.last_error = Some("broker unreachable".to_string());
        assert_eq!(
            event.delivery_state(),
            DeliveryState::Failed {
                reason: "broker unreachable".to_string(),
                count: 2
            }
        );
    }

    #[test]
    fn test_retry_budget() {
        let mut event = OutboxEvent {
            id: "evt-1".to_string(),
            topic: "calendar.updates".to_string(),
            partition_key: "prop-1".to_string(),
            payload: "{}".to_string(),
            status: OutboxStatus::Failed,
            retry_count: 4,
            last_error: Some("timeout".to_string()),
            created_at: Utc::now(),
            sent_at: None,
        };
        assert!(event.is_retryable(5));

        event.retry_count = 5;
        assert!(!event.is_retryable(5));

        event.status = OutboxStatus::Pending;
        assert!(!event.is_retryable(5));
    }

    #[test]
    fn test_channel_round_trip() {
        for channel in [
            Channel::Airbnb,
            Channel::Vrbo,
            Channel::BookingCom,
            Channel::Expedia,
        ] {
            assert_eq!(channel.as_str().parse::<Channel>().unwrap(), channel);
        }
        assert!("craigslist".parse::<Channel>().is_err());
    }
}
