//! # Rate Repository
//!
//! Read-mostly access to rate overrides and rate plans.
//!
//! ## Read Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │            PriceEngine range resolution — exactly two batch reads       │
//! │                                                                         │
//! │  resolve_price_range(property, from, to, org)                          │
//! │       │                                                                 │
//! │       ├── 1. find_overrides_in_range(...)   ← one query, whole range   │
//! │       ├── 2. find_active_plans(...)         ← one query, all tiers     │
//! │       │                                                                 │
//! │       └── pure in-memory resolution per date — NEVER one query per day │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are owned and mutated by upstream pricing-management services; the
//! engine only reads them. The insert methods below exist for those writers
//! and for test seeding. Reads take no locks — resolution accepts eventual
//! consistency with concurrent writers.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use staycast_core::{DayOfWeekSet, RateOverride, RatePlan, RatePlanTier};

// =============================================================================
// Row Types
// =============================================================================

/// Flat storage shape of a rate_overrides row.
#[derive(Debug, sqlx::FromRow)]
struct RateOverrideRow {
    id: String,
    org_id: String,
    property_id: String,
    date: NaiveDate,
    nightly_price_cents: i64,
    source: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RateOverrideRow> for RateOverride {
    fn from(row: RateOverrideRow) -> Self {
        RateOverride {
            id: row.id,
            org_id: row.org_id,
            property_id: row.property_id,
            date: row.date,
            nightly_price_cents: row.nightly_price_cents,
            source: row.source,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Flat storage shape of a rate_plans row.
#[derive(Debug, sqlx::FromRow)]
struct RatePlanRow {
    id: String,
    org_id: String,
    property_id: String,
    tier: String,
    name: String,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    days_of_week: i64,
    nightly_price_cents: i64,
    priority: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RatePlanRow> for RatePlan {
    type Error = DbError;

    fn try_from(row: RatePlanRow) -> Result<Self, Self::Error> {
        let tier: RatePlanTier = row
            .tier
            .parse()
            .map_err(|_| DbError::corrupt_row("rate_plans", format!("tier '{}'", row.tier)))?;

        Ok(RatePlan {
            id: row.id,
            org_id: row.org_id,
            property_id: row.property_id,
            tier,
            name: row.name,
            start_date: row.start_date,
            end_date: row.end_date,
            days_of_week: DayOfWeekSet::from_bits(row.days_of_week as u8),
            nightly_price_cents: row.nightly_price_cents,
            priority: row.priority,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for rate override and rate plan reads.
#[derive(Debug, Clone)]
pub struct RateRepository {
    pool: SqlitePool,
}

impl RateRepository {
    /// Creates a new RateRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RateRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Overrides
    // -------------------------------------------------------------------------

    /// Inserts a rate override.
    ///
    /// Upstream-writer surface: the engine itself never calls this.
    /// Violates the one-per-(org, property, date) constraint with
    /// `DbError::UniqueViolation` on duplicates.
    pub async fn insert_override(&self, rate_override: &RateOverride) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO rate_overrides (
                id, org_id, property_id, date, nightly_price_cents,
                source, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&rate_override.id)
        .bind(&rate_override.org_id)
        .bind(&rate_override.property_id)
        .bind(rate_override.date)
        .bind(rate_override.nightly_price_cents)
        .bind(&rate_override.source)
        .bind(rate_override.created_at)
        .bind(rate_override.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Finds the override pinning a single date, if any.
    pub async fn find_override(
        &self,
        org_id: &str,
        property_id: &str,
        date: NaiveDate,
    ) -> DbResult<Option<RateOverride>> {
        let row: Option<RateOverrideRow> = sqlx::query_as(
            r#"
            SELECT id, org_id, property_id, date, nightly_price_cents,
                   source, created_at, updated_at
            FROM rate_overrides
            WHERE org_id = ?1 AND property_id = ?2 AND date = ?3
            "#,
        )
        .bind(org_id)
        .bind(property_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(RateOverride::from))
    }

    /// Finds all overrides for a property within `[from, to)`.
    ///
    /// The batch read behind range resolution: one query regardless of
    /// range length.
    pub async fn find_overrides_in_range(
        &self,
        org_id: &str,
        property_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<RateOverride>> {
        debug!(%org_id, %property_id, %from, %to, "Loading overrides in range");

        let rows: Vec<RateOverrideRow> = sqlx::query_as(
            r#"
            SELECT id, org_id, property_id, date, nightly_price_cents,
                   source, created_at, updated_at
            FROM rate_overrides
            WHERE org_id = ?1 AND property_id = ?2 AND date >= ?3 AND date < ?4
            ORDER BY date ASC
            "#,
        )
        .bind(org_id)
        .bind(property_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(RateOverride::from).collect())
    }

    // -------------------------------------------------------------------------
    // Plans
    // -------------------------------------------------------------------------

    /// Inserts a rate plan.
    ///
    /// Upstream-writer surface: the engine itself never calls this.
    pub async fn insert_plan(&self, plan: &RatePlan) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO rate_plans (
                id, org_id, property_id, tier, name,
                start_date, end_date, days_of_week, nightly_price_cents,
                priority, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&plan.id)
        .bind(&plan.org_id)
        .bind(&plan.property_id)
        .bind(plan.tier.as_str())
        .bind(&plan.name)
        .bind(plan.start_date)
        .bind(plan.end_date)
        .bind(plan.days_of_week.bits() as i64)
        .bind(plan.nightly_price_cents)
        .bind(plan.priority)
        .bind(plan.is_active)
        .bind(plan.created_at)
        .bind(plan.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Finds all active plans for a property, every tier.
    ///
    /// The second batch read behind range resolution. Applicability
    /// filtering happens in memory so this stays a single query.
    pub async fn find_active_plans(
        &self,
        org_id: &str,
        property_id: &str,
    ) -> DbResult<Vec<RatePlan>> {
        debug!(%org_id, %property_id, "Loading active rate plans");

        let rows: Vec<RatePlanRow> = sqlx::query_as(
            r#"
            SELECT id, org_id, property_id, tier, name,
                   start_date, end_date, days_of_week, nightly_price_cents,
                   priority, is_active, created_at, updated_at
            FROM rate_plans
            WHERE org_id = ?1 AND property_id = ?2 AND is_active = 1
            ORDER BY priority DESC, id ASC
            "#,
        )
        .bind(org_id)
        .bind(property_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(RatePlan::try_from).collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
