//! # Restriction Repository
//!
//! Read access to booking restrictions.
//!
//! Rows are owned by upstream booking-management services; the engine only
//! reads the restrictions overlapping a candidate stay and lets
//! `staycast_core::restrictions` pick the governing one.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use staycast_core::{BookingRestriction, DayOfWeekSet};

// =============================================================================
// Row Type
// =============================================================================

/// Flat storage shape of a booking_restrictions row.
#[derive(Debug, sqlx::FromRow)]
struct BookingRestrictionRow {
    id: String,
    org_id: String,
    property_id: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    min_stay: Option<i64>,
    max_stay: Option<i64>,
    closed_to_arrival: bool,
    closed_to_departure: bool,
    advance_notice_days: Option<i64>,
    days_of_week: i64,
    priority: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BookingRestrictionRow> for BookingRestriction {
    fn from(row: BookingRestrictionRow) -> Self {
        BookingRestriction {
            id: row.id,
            org_id: row.org_id,
            property_id: row.property_id,
            start_date: row.start_date,
            end_date: row.end_date,
            min_stay: row.min_stay,
            max_stay: row.max_stay,
            closed_to_arrival: row.closed_to_arrival,
            closed_to_departure: row.closed_to_departure,
            advance_notice_days: row.advance_notice_days,
            days_of_week: DayOfWeekSet::from_bits(row.days_of_week as u8),
            priority: row.priority,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for booking restriction reads.
#[derive(Debug, Clone)]
pub struct RestrictionRepository {
    pool: SqlitePool,
}

impl RestrictionRepository {
    /// Creates a new RestrictionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RestrictionRepository { pool }
    }

    /// Inserts a booking restriction.
    ///
    /// Upstream-writer surface: the engine itself never calls this.
    pub async fn insert(&self, restriction: &BookingRestriction) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO booking_restrictions (
                id, org_id, property_id, start_date, end_date,
                min_stay, max_stay, closed_to_arrival, closed_to_departure,
                advance_notice_days, days_of_week, priority, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
        )
        .bind(&restriction.id)
        .bind(&restriction.org_id)
        .bind(&restriction.property_id)
        .bind(restriction.start_date)
        .bind(restriction.end_date)
        .bind(restriction.min_stay)
        .bind(restriction.max_stay)
        .bind(restriction.closed_to_arrival)
        .bind(restriction.closed_to_departure)
        .bind(restriction.advance_notice_days)
        .bind(restriction.days_of_week.bits() as i64)
        .bind(restriction.priority)
        .bind(restriction.is_active)
        .bind(restriction.created_at)
        .bind(restriction.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Finds active restrictions whose range overlaps the stay `[from, to)`.
    ///
    /// Restriction ranges are inclusive on both ends, so overlap means
    /// `start_date < to AND end_date >= from`. The governing-restriction
    /// selection (priority order, activation predicate) is pure logic in
    /// staycast-core, not SQL.
    pub async fn find_overlapping(
        &self,
        org_id: &str,
        property_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<BookingRestriction>> {
        debug!(%org_id, %property_id, %from, %to, "Loading overlapping restrictions");

        let rows: Vec<BookingRestrictionRow> = sqlx::query_as(
            r#"
            SELECT id, org_id, property_id, start_date, end_date,
                   min_stay, max_stay, closed_to_arrival, closed_to_departure,
                   advance_notice_days, days_of_week, priority, is_active,
                   created_at, updated_at
            FROM booking_restrictions
            WHERE org_id = ?1 AND property_id = ?2
              AND is_active = 1
              AND start_date < ?4 AND end_date >= ?3
            ORDER BY priority DESC, id ASC
            "#,
        )
        .bind(org_id)
        .bind(property_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(BookingRestriction::from).collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use chrono::{NaiveDate, Utc};
    use staycast_core::{BookingRestriction, DayOfWeekSet, Property};
    use uuid::Uuid;

    const ORG: &str = "org-1";
    const PROP: &str = "prop-1";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn test_db() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
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

    fn restriction(start: NaiveDate, end: NaiveDate, priority: i64) -> BookingRestriction {
        let now = Utc::now();
        BookingRestriction {
            id: Uuid::new_v4().to_string(),
            org_id: ORG.to_string(),
            property_id: PROP.to_string(),
            start_date: start,
            end_date: end,
            min_stay: Some(2),
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
    async fn test_overlap_boundaries() {
        let db = test_db().await;
        let repo = db.restrictions();

        repo.insert(&restriction(date(2025, 7, 1), date(2025, 7, 31), 5))
            .await
            .unwrap();

        // Stay inside July overlaps
        let rows = repo
            .find_overlapping(ORG, PROP, date(2025, 7, 10), date(2025, 7, 12))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);

        // Stay starting on the inclusive end date overlaps
        let rows = repo
            .find_overlapping(ORG, PROP, date(2025, 7, 31), date(2025, 8, 2))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);

        // Stay entirely after the range does not
        let rows = repo
            .find_overlapping(ORG, PROP, date(2025, 8, 1), date(2025, 8, 3))
            .await
            .unwrap();
        assert!(rows.is_empty());

        // Half-open stay end: a restriction starting exactly at check-out
        // is not touched by the stay's nights
        repo.insert(&restriction(date(2025, 8, 3), date(2025, 8, 10), 1))
            .await
            .unwrap();
        let rows = repo
            .find_overlapping(ORG, PROP, date(2025, 8, 1), date(2025, 8, 3))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_results_sorted_by_priority() {
        let db = test_db().await;
        let repo = db.restrictions();

        repo.insert(&restriction(date(2025, 7, 1), date(2025, 7, 31), 5))
            .await
            .unwrap();
        repo.insert(&restriction(date(2025, 7, 1), date(2025, 7, 31), 10))
            .await
            .unwrap();

        let rows = repo
            .find_overlapping(ORG, PROP, date(2025, 7, 10), date(2025, 7, 12))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].priority, 10);
        assert_eq!(rows[1].priority, 5);
    }

    #[tokio::test]
    async fn test_inactive_excluded() {
        let db = test_db().await;
        let repo = db.restrictions();

        let mut retired = restriction(date(2025, 7, 1), date(2025, 7, 31), 5);
        retired.is_active = false;
        repo.insert(&retired).await.unwrap();

        let rows = repo
            .find_overlapping(ORG, PROP, date(2025, 7, 10), date(2025, 7, 12))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }
}
