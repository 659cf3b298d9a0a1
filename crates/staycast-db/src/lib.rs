//! # staycast-db: Database Layer for StayCast
//!
//! This crate provides database access for the StayCast engine.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        StayCast Data Flow                               │
//! │                                                                         │
//! │  Engine call (resolve_price_range, relay tick, distribute_rates)       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    staycast-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  (rates.rs,   │    │  (embedded)  │  │   │
//! │  │   │               │    │   outbox.rs)  │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ RateRepo      │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │    │ OutboxRepo    │    │ ...          │  │   │
//! │  │   │ Management    │    │ AuditRepo     │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (WAL mode)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use staycast_db::{Database, DbConfig};
//!
//! // Create database with default config
//! let db = Database::new(DbConfig::new("path/to/staycast.db")).await?;
//!
//! // Use repositories
//! let plans = db.rates().find_active_plans(&org_id, &property_id).await?;
//! let pending = db.outbox().find_pending(100).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::audit::{AuditEntry, AuditRepository};
pub use repository::outbox::OutboxRepository;
pub use repository::properties::PropertyRepository;
pub use repository::rates::RateRepository;
pub use repository::restrictions::RestrictionRepository;
