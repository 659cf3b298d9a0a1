//! # Restriction Engine
//!
//! Validates candidate stays against priority-ordered booking restrictions.
//!
//! Same fetch-then-pure split as the price engine: one overlap read, then
//! `staycast_core::restrictions` picks the single governing restriction
//! and evaluates all of its constraints. Business violations come back as
//! a structured [`ValidationOutcome`], never as an error.

use chrono::{NaiveDate, Utc};
use tracing::debug;

use staycast_core::restrictions::evaluate;
use staycast_core::validation::{validate_required, validate_stay_range};
use staycast_core::ValidationOutcome;
use staycast_db::Database;

use crate::error::EngineResult;

// =============================================================================
// Restriction Engine
// =============================================================================

/// Validates candidate stays for properties.
#[derive(Debug, Clone)]
pub struct RestrictionEngine {
    db: Database,
}

impl RestrictionEngine {
    /// Creates a new RestrictionEngine.
    pub fn new(db: Database) -> Self {
        RestrictionEngine { db }
    }

    /// Validates a candidate stay `[check_in, check_out)`.
    ///
    /// The advance-notice constraint is measured against today's date;
    /// use [`validate_as_of`](Self::validate_as_of) to pin the clock.
    ///
    /// ## Returns
    /// `Ok(outcome)` for any well-formed stay, violated or not. `Err` only
    /// for malformed input or store failures.
    pub async fn validate(
        &self,
        property_id: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
        org_id: &str,
    ) -> EngineResult<ValidationOutcome> {
        self.validate_as_of(property_id, check_in, check_out, org_id, Utc::now().date_naive())
            .await
    }

    /// Validates a candidate stay with an explicit "today".
    pub async fn validate_as_of(
        &self,
        property_id: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
        org_id: &str,
        today: NaiveDate,
    ) -> EngineResult<ValidationOutcome> {
        validate_required("org_id", org_id)?;
        validate_required("property_id", property_id)?;
        validate_stay_range(check_in, check_out)?;

        let restrictions = self
            .db
            .restrictions()
            .find_overlapping(org_id, property_id, check_in, check_out)
            .await?;

        debug!(
            %property_id,
            %check_in,
            %check_out,
            candidates = restrictions.len(),
            "Validating stay"
        );

        Ok(evaluate(&restrictions, check_in, check_out, today))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use chrono::Utc;
    use staycast_core::{BookingRestriction, DayOfWeekSet, Property};
    use uuid::Uuid;

    const ORG: &str = "org-1";
    const PROP: &str = "prop-1";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn seeded_db() -> Database {
        let db = Database::new(staycast_db::DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();
        db.properties()
            .insert(&Property {
                id: PROP.to_string(),
                org_id: ORG.to_string(),
                name: "Sea View Cottage".to_string(),
                fallback_price_cents: None,
                currency_code: "USD".to_string(),
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        db
    }

    fn restriction(priority: i64, min_stay: Option<i64>) -> BookingRestriction {
        let now = Utc::now();
        BookingRestriction {
            id: Uuid::new_v4().to_string(),
            org_id: ORG.to_string(),
            property_id: PROP.to_string(),
            start_date: date(2025, 7, 1),
            end_date: date(2025, 7, 31),
            min_stay,
            max_stay: None,
            closed_to_arrival: false,
            closed_to_departure: false,
            advance_notice_days: None,
            days_of_week: DayOfWeekSet::all(),
            priority,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_valid_when_no_restrictions_overlap() {
        let db = seeded_db().await;
        let engine = RestrictionEngine::new(db);

        let outcome = engine
            .validate(PROP, date(2025, 7, 10), date(2025, 7, 12), ORG)
            .await
            .unwrap();
        assert!(outcome.valid);
        assert!(outcome.violations.is_empty());
    }

    /// The spec-level acceptance scenario: A(min_stay=3, priority=5) and
    /// B(min_stay=2, priority=10) both cover July; a 1-night stay cites
    /// only "minimum stay is 2".
    #[tokio::test]
    async fn test_only_highest_priority_restriction_governs() {
        let db = seeded_db().await;
        db.restrictions().insert(&restriction(5, Some(3))).await.unwrap();
        db.restrictions().insert(&restriction(10, Some(2))).await.unwrap();

        let engine = RestrictionEngine::new(db);
        let outcome = engine
            .validate_as_of(PROP, date(2025, 7, 10), date(2025, 7, 11), ORG, date(2025, 7, 1))
            .await
            .unwrap();

        assert!(!outcome.valid);
        assert_eq!(outcome.violations.len(), 1);
        assert!(outcome.violations[0].contains("minimum stay is 2"));
    }

    #[tokio::test]
    async fn test_advance_notice_uses_pinned_clock() {
        let db = seeded_db().await;
        let mut r = restriction(10, None);
        r.advance_notice_days = Some(7);
        db.restrictions().insert(&r).await.unwrap();

        let engine = RestrictionEngine::new(db);

        // Booked 3 days out: violation
        let outcome = engine
            .validate_as_of(PROP, date(2025, 7, 10), date(2025, 7, 12), ORG, date(2025, 7, 7))
            .await
            .unwrap();
        assert!(!outcome.valid);

        // Booked 14 days out: fine
        let outcome = engine
            .validate_as_of(PROP, date(2025, 7, 10), date(2025, 7, 12), ORG, date(2025, 6, 26))
            .await
            .unwrap();
        assert!(outcome.valid);
    }

    #[tokio::test]
    async fn test_rejects_empty_stay() {
        let db = seeded_db().await;
        let engine = RestrictionEngine::new(db);

        let err = engine
            .validate(PROP, date(2025, 7, 10), date(2025, 7, 10), ORG)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}
