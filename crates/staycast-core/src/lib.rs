//! # staycast-core: Pure Business Logic for StayCast
//!
//! This crate is the **heart** of StayCast. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       StayCast Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          Upstream booking / pricing-management services         │   │
//! │  │   (entity CRUD, org/auth context, outbox row inserts)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ library calls / scheduler ticks        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    staycast-engine                              │   │
//! │  │    PriceEngine, RestrictionEngine, OutboxRelay, Distribution    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ staycast-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  pricing  │  │restrictions│ │   │
//! │  │   │ RatePlan  │  │   Money   │  │  cascade  │  │ evaluator │  │   │
//! │  │   │  Outbox   │  │  (cents)  │  │  tiers    │  │ priority  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  staycast-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (RatePlan, BookingRestriction, OutboxEvent, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - The fixed-priority price-resolution cascade
//! - [`restrictions`] - The priority-ordered restriction evaluator
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: resolution is deterministic — the same store
//!    snapshot in always yields the same prices out
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are in cents (i64)
//! 4. **Explicit Errors**: errors are typed; business violations are
//!    structured results, never exceptions
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use staycast_core::pricing::{resolve_night, NightResolution};
//!
//! let date = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
//!
//! // With no override and no plans, the night needs the property fallback
//! let resolved = resolve_night(date, None, &[]);
//! assert_eq!(resolved, NightResolution::NeedsFallback);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod restrictions;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use staycast_core::Money` instead of
// `use staycast_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum span, in days, of a single price-range resolution.
///
/// ## Business Reason
/// Channels accept at most two years of calendar; a longer request is
/// always caller error and would only inflate the batch reads.
pub const MAX_RESOLVE_RANGE_DAYS: i64 = 731;

/// Outbox topic carrying calendar distribution requests.
///
/// ## Why a constant?
/// Producers (the async distribution path) and the consumer (the event
/// handler) must agree on the topic string; keeping it in core prevents
/// drift between the two sides.
pub const CALENDAR_UPDATES_TOPIC: &str = "calendar.updates";
