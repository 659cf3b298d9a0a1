//! # Repository Module
//!
//! Database repository implementations for StayCast.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Engine call                                                           │
//! │       │                                                                 │
//! │       │  db.rates().find_active_plans(org, property)                   │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  RateRepository                                                        │
//! │  ├── find_override(&self, org, property, date)                         │
//! │  ├── find_overrides_in_range(&self, org, property, from, to)           │
//! │  └── find_active_plans(&self, org, property)                           │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • SQL is isolated in one place                                        │
//! │  • The engine stays testable against an in-memory database             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`rates::RateRepository`] - Rate override and plan reads
//! - [`restrictions::RestrictionRepository`] - Booking restriction reads
//! - [`properties::PropertyRepository`] - Properties and channel mappings
//! - [`outbox::OutboxRepository`] - Outbox queue management
//! - [`audit::AuditRepository`] - Distribution audit log

pub mod audit;
pub mod outbox;
pub mod properties;
pub mod rates;
pub mod restrictions;
