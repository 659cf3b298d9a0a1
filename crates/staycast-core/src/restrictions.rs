//! # Restriction Evaluation
//!
//! The pure priority-ordered restriction evaluator. The caller
//! (staycast-engine) fetches the overlapping rows; this module decides.
//!
//! ## Evaluation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │         evaluate(restrictions, check_in, check_out, today)              │
//! │                                                                         │
//! │  1. Sort candidates by priority DESCENDING (tie → ascending id)        │
//! │  2. Take the FIRST whose activation predicate matches check_in         │
//! │  3. Evaluate ALL of that one restriction's constraints:                 │
//! │       min_stay / max_stay vs nights                                    │
//! │       closed_to_arrival / closed_to_departure                          │
//! │       advance_notice_days vs (check_in - today)                        │
//! │     collecting EVERY violated constraint                               │
//! │  4. STOP. Lower-priority restrictions are never consulted, even if     │
//! │     also violated. Exclusivity is a deliberate design invariant.       │
//! │  5. No activated restriction ⇒ valid with empty violations             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;

use crate::types::{BookingRestriction, ValidationOutcome};

// =============================================================================
// Stay Math
// =============================================================================

/// Number of nights in a `[check_in, check_out)` stay.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use staycast_core::restrictions::stay_nights;
///
/// let check_in = NaiveDate::from_ymd_opt(2025, 7, 10).unwrap();
/// let check_out = NaiveDate::from_ymd_opt(2025, 7, 13).unwrap();
/// assert_eq!(stay_nights(check_in, check_out), 3);
/// ```
#[inline]
pub fn stay_nights(check_in: NaiveDate, check_out: NaiveDate) -> i64 {
    (check_out - check_in).num_days()
}

// =============================================================================
// Governing Restriction Selection
// =============================================================================

/// Finds the single restriction that governs a stay beginning on `check_in`.
///
/// Highest `priority` wins; equal priorities break by ascending id so the
/// choice is reproducible. Inactive rows never govern.
pub fn governing_restriction<'a>(
    restrictions: &'a [BookingRestriction],
    check_in: NaiveDate,
) -> Option<&'a BookingRestriction> {
    let mut candidates: Vec<&BookingRestriction> = restrictions
        .iter()
        .filter(|r| r.is_active)
        .collect();

    candidates.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));

    candidates.into_iter().find(|r| r.activates_on(check_in))
}

// =============================================================================
// Constraint Evaluation
// =============================================================================

/// Validates a candidate stay against the governing restriction.
///
/// ## Arguments
/// * `restrictions` - rows overlapping the stay range (any order)
/// * `check_in` / `check_out` - the candidate stay, `[check_in, check_out)`
/// * `today` - booking date, for the advance-notice constraint
///
/// ## Returns
/// A [`ValidationOutcome`]: fully valid, or invalid with every violated
/// constraint of the ONE governing restriction. Never partial, never an
/// error for a business violation.
pub fn evaluate(
    restrictions: &[BookingRestriction],
    check_in: NaiveDate,
    check_out: NaiveDate,
    today: NaiveDate,
) -> ValidationOutcome {
    let governing = match governing_restriction(restrictions, check_in) {
        Some(r) => r,
        None => return ValidationOutcome::valid(),
    };

    let nights = stay_nights(check_in, check_out);
    let mut violations = Vec::new();

    if let Some(min_stay) = governing.min_stay {
        if nights < min_stay {
            violations.push(format!(
                "minimum stay is {} nights (requested {})",
                min_stay, nights
            ));
        }
    }

    if let Some(max_stay) = governing.max_stay {
        if nights > max_stay {
            violations.push(format!(
                "maximum stay is {} nights (requested {})",
                max_stay, nights
            ));
        }
    }

    if governing.closed_to_arrival {
        violations.push(format!("arrival on {} is closed", check_in));
    }

    // Departure is checked against the check-out date: the governing
    // restriction constrains departures only within its own range.
    if governing.closed_to_departure && governing.covers(check_out) {
        violations.push(format!("departure on {} is closed", check_out));
    }

    if let Some(notice_days) = governing.advance_notice_days {
        let lead_days = (check_in - today).num_days();
        if lead_days < notice_days {
            violations.push(format!(
                "requires {} days advance notice ({} given)",
                notice_days, lead_days
            ));
        }
    }

    if violations.is_empty() {
        ValidationOutcome::valid()
    } else {
        ValidationOutcome::invalid(violations)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
