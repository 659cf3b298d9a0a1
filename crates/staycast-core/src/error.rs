//! # Error Types
//!
//! Domain-specific error types for staycast-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  staycast-core errors (this file)                                      │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  staycast-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  staycast-engine errors (separate crate)                               │
//! │  └── EngineError      - Resolution/relay/distribution failures         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → EngineError → Caller    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (property id, dates, etc.)
//! 3. Errors are enum variants, never String
//! 4. Business rule violations (restriction checks) are NOT errors — they
//!    come back as a structured `ValidationOutcome`

use chrono::NaiveDate;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent domain logic failures. Expected business outcomes
/// (a stay violating a restriction, a date with no resolvable price) are
/// plain results, not errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Property cannot be found.
    ///
    /// ## When This Occurs
    /// - The price cascade reached the fallback tier and the property id
    ///   does not exist for the given org
    /// - Distribution was requested for an unknown property
    #[error("Property not found: {0}")]
    PropertyNotFound(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before resolution logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// A date range is empty or inverted.
    ///
    /// ## When This Occurs
    /// - `check_out <= check_in` on a stay validation
    /// - `to <= from` on a price range resolution
    #[error("invalid date range: {from} to {to}")]
    InvalidDateRange { from: NaiveDate, to: NaiveDate },

    /// A date range exceeds the maximum resolvable span.
    #[error("date range {from} to {to} exceeds {max_days} days")]
    DateRangeTooLong {
        from: NaiveDate,
        to: NaiveDate,
        max_days: i64,
    },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
