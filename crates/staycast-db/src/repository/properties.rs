//! # Property Repository
//!
//! Reads for properties (the fallback-price slice) and their channel
//! mappings — the distribution targets.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use staycast_core::{Channel, ChannelMapping, Property};

// =============================================================================
// Row Types
// =============================================================================

/// Flat storage shape of a properties row.
#[derive(Debug, sqlx::FromRow)]
struct PropertyRow {
    id: String,
    org_id: String,
    name: String,
    fallback_price_cents: Option<i64>,
    currency_code: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PropertyRow> for Property {
    fn from(row: PropertyRow) -> Self {
        Property {
            id: row.id,
            org_id: row.org_id,
            name: row.name,
            fallback_price_cents: row.fallback_price_cents,
            currency_code: row.currency_code,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Flat storage shape of a channel_mappings row.
#[derive(Debug, sqlx::FromRow)]
struct ChannelMappingRow {
    id: String,
    org_id: String,
    property_id: String,
    channel: String,
    external_listing_id: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<ChannelMappingRow> for ChannelMapping {
    type Error = DbError;

    fn try_from(row: ChannelMappingRow) -> Result<Self, Self::Error> {
        let channel: Channel = row.channel.parse().map_err(|_| {
            DbError::corrupt_row("channel_mappings", format!("channel '{}'", row.channel))
        })?;

        Ok(ChannelMapping {
            id: row.id,
            org_id: row.org_id,
            property_id: row.property_id,
            channel,
            external_listing_id: row.external_listing_id,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for property and channel-mapping reads.
#[derive(Debug, Clone)]
pub struct PropertyRepository {
    pool: SqlitePool,
}

impl PropertyRepository {
    /// Creates a new PropertyRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PropertyRepository { pool }
    }

    /// Inserts a property.
    ///
    /// Upstream-writer surface: the engine itself never calls this.
    pub async fn insert(&self, property: &Property) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO properties (
                id, org_id, name, fallback_price_cents, currency_code,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&property.id)
        .bind(&property.org_id)
        .bind(&property.name)
        .bind(property.fallback_price_cents)
        .bind(&property.currency_code)
        .bind(property.is_active)
        .bind(property.created_at)
        .bind(property.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a property by id.
    ///
    /// ## Returns
    /// * `Ok(Some(Property))` - Property found
    /// * `Ok(None)` - Property not found (callers decide whether that is
    ///   an error; the price cascade only cares at the fallback tier)
    pub async fn find(&self, org_id: &str, property_id: &str) -> DbResult<Option<Property>> {
        let row: Option<PropertyRow> = sqlx::query_as(
            r#"
            SELECT id, org_id, name, fallback_price_cents, currency_code,
                   is_active, created_at, updated_at
            FROM properties
            WHERE org_id = ?1 AND id = ?2
            "#,
        )
        .bind(org_id)
        .bind(property_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Property::from))
    }

    /// Inserts a channel mapping.
    ///
    /// Upstream-writer surface: the engine itself never calls this.
    pub async fn insert_mapping(&self, mapping: &ChannelMapping) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO channel_mappings (
                id, org_id, property_id, channel, external_listing_id,
                is_active, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&mapping.id)
        .bind(&mapping.org_id)
        .bind(&mapping.property_id)
        .bind(mapping.channel.as_str())
        .bind(&mapping.external_listing_id)
        .bind(mapping.is_active)
        .bind(mapping.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Finds a property's active channel mappings — its distribution targets.
    pub async fn find_active_channel_mappings(
        &self,
        org_id: &str,
        property_id: &str,
    ) -> DbResult<Vec<ChannelMapping>> {
        debug!(%org_id, %property_id, "Loading active channel mappings");

        let rows: Vec<ChannelMappingRow> = sqlx::query_as(
            r#"
            SELECT id, org_id, property_id, channel, external_listing_id,
                   is_active, created_at
            FROM channel_mappings
            WHERE org_id = ?1 AND property_id = ?2 AND is_active = 1
            ORDER BY channel ASC
            "#,
        )
        .bind(org_id)
        .bind(property_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ChannelMapping::try_from).collect()
    }

    /// Finds ids of active properties that have at least one active channel
    /// mapping — the bulk-distribution work list.
    pub async fn find_property_ids_with_active_mappings(
        &self,
        org_id: &str,
    ) -> DbResult<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT p.id
            FROM properties p
            INNER JOIN channel_mappings m ON m.property_id = p.id AND m.org_id = p.org_id
            WHERE p.org_id = ?1 AND p.is_active = 1 AND m.is_active = 1
            ORDER BY p.id ASC
            "#,
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use staycast_core::{Channel, ChannelMapping, Property};
    use uuid::Uuid;

    const ORG: &str = "org-1";

    fn property(id: &str, fallback: Option<i64>) -> Property {
        let now = Utc::now();
        Property {
            id: id.to_string(),
            org_id: ORG.to_string(),
            name: format!("Property {}", id),
            fallback_price_cents: fallback,
            currency_code: "USD".to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn mapping(property_id: &str, channel: Channel, active: bool) -> ChannelMapping {
        ChannelMapping {
            id: Uuid::new_v4().to_string(),
            org_id: ORG.to_string(),
            property_id: property_id.to_string(),
            channel,
            external_listing_id: format!("ext-{}", channel),
            is_active: active,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_find_property() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.properties();

        repo.insert(&property("prop-1", Some(7000))).await.unwrap();

        let found = repo.find(ORG, "prop-1").await.unwrap().unwrap();
        assert_eq!(found.fallback_price_cents, Some(7000));

        assert!(repo.find(ORG, "prop-2").await.unwrap().is_none());
        // Wrong org never sees another tenant's property
        assert!(repo.find("org-2", "prop-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_active_channel_mappings() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.properties();

        repo.insert(&property("prop-1", None)).await.unwrap();
        repo.insert_mapping(&mapping("prop-1", Channel::Airbnb, true))
            .await
            .unwrap();
        repo.insert_mapping(&mapping("prop-1", Channel::Vrbo, false))
            .await
            .unwrap();

        let mappings = repo.find_active_channel_mappings(ORG, "prop-1").await.unwrap();
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].channel, Channel::Airbnb);
    }

    #[tokio::test]
    async fn test_bulk_work_list() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.properties();

        repo.insert(&property("prop-mapped", None)).await.unwrap();
        repo.insert(&property("prop-unmapped", None)).await.unwrap();
        repo.insert(&property("prop-inactive-mapping", None)).await.unwrap();

        repo.insert_mapping(&mapping("prop-mapped", Channel::Airbnb, true))
            .await
            .unwrap();
        repo.insert_mapping(&mapping("prop-mapped", Channel::Expedia, true))
            .await
            .unwrap();
        repo.insert_mapping(&mapping("prop-inactive-mapping", Channel::Vrbo, false))
            .await
            .unwrap();

        let ids = repo.find_property_ids_with_active_mappings(ORG).await.unwrap();
        // Distinct: two active mappings still yield one property id
        assert_eq!(ids, vec!["prop-mapped".to_string()]);
    }
}
