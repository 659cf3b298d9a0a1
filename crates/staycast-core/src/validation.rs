//! # Validation Module
//!
//! Input validation utilities for StayCast.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Upstream services (booking/pricing management)               │
//! │  ├── Form-level checks, user feedback                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Engine entry points (Rust)                                   │
//! │  └── THIS MODULE: id/date-range sanity before any store read           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE / CHECK constraints                             │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Note the boundary: a stay violating a BookingRestriction is NOT a
//! validation error — that is a business outcome reported through
//! `ValidationOutcome`. This module rejects only malformed input.

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::restrictions::stay_nights;
use crate::MAX_RESOLVE_RANGE_DAYS;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates that a required string field is present and non-blank.
///
/// Engine entry points use this on externally-assigned ids (property, org)
/// whose format StayCast does not own; the strict UUID check below is for
/// ids this system generates.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates an entity id (property, org, plan, ...).
///
/// ## Rules
/// - Must not be empty
/// - Must be a valid UUID format
///
/// ## Example
/// ```rust
/// use staycast_core::validation::validate_entity_id;
///
/// assert!(validate_entity_id("property_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_entity_id("property_id", "not-a-uuid").is_err());
/// ```
pub fn validate_entity_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Date Range Validators
// =============================================================================

/// Validates a half-open resolution range `[from, to)`.
///
/// ## Rules
/// - `to` must be strictly after `from`
/// - The span must not exceed `MAX_RESOLVE_RANGE_DAYS`
pub fn validate_resolve_range(from: NaiveDate, to: NaiveDate) -> ValidationResult<()> {
    if to <= from {
        return Err(ValidationError::InvalidDateRange { from, to });
    }

    let span = (to - from).num_days();
    if span > MAX_RESOLVE_RANGE_DAYS {
        return Err(ValidationError::DateRangeTooLong {
            from,
            to,
            max_days: MAX_RESOLVE_RANGE_DAYS,
        });
    }

    Ok(())
}

/// Validates a candidate stay `[check_in, check_out)`.
///
/// ## Rules
/// - Must contain at least one night (`check_out > check_in`)
pub fn validate_stay_range(check_in: NaiveDate, check_out: NaiveDate) -> ValidationResult<()> {
    if stay_nights(check_in, check_out) < 1 {
        return Err(ValidationError::InvalidDateRange {
            from: check_in,
            to: check_out,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (a free night is a real price)
///
/// ## Example
/// ```rust
/// use staycast_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(11999).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
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

    #[test]
    fn test_validate_required() {
        assert!(validate_required("org_id", "org-1").is_ok());
        assert!(validate_required("org_id", "").is_err());
        assert!(validate_required("org_id", "   ").is_err());
    }

    #[test]
    fn test_validate_entity_id() {
        assert!(validate_entity_id("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_entity_id("id", "").is_err());
        assert!(validate_entity_id("id", "   ").is_err());
        assert!(validate_entity_id("id", "not-a-uuid").is_err());
    }

    #[test]
    fn test_validate_resolve_range() {
        assert!(validate_resolve_range(date(2025, 6, 1), date(2025, 6, 30)).is_ok());
        assert!(validate_resolve_range(date(2025, 6, 1), date(2025, 6, 2)).is_ok());

        // Empty and inverted ranges rejected
        assert!(validate_resolve_range(date(2025, 6, 1), date(2025, 6, 1)).is_err());
        assert!(validate_resolve_range(date(2025, 6, 2), date(2025, 6, 1)).is_err());

        // Over-long ranges rejected
        assert!(validate_resolve_range(date(2025, 1, 1), date(2028, 1, 1)).is_err());
    }

    #[test]
    fn test_validate_stay_range() {
        assert!(validate_stay_range(date(2025, 7, 10), date(2025, 7, 11)).is_ok());
        assert!(validate_stay_range(date(2025, 7, 10), date(2025, 7, 10)).is_err());
        assert!(validate_stay_range(date(2025, 7, 11), date(2025, 7, 10)).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(11999).is_ok());
        assert!(validate_price_cents(-100).is_err());
    }
}
