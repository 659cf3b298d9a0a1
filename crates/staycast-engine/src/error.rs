//! # Engine Error Types
//!
//! Error types for resolution, relay and distribution operations.
//!
//! ## Error Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Engine Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  NotFound       │  │  Transient      │  │     Configuration       │ │
//! │  │                 │  │  Delivery       │  │                         │ │
//! │  │  PropertyNot-   │  │  PublishFailed  │  │  InvalidConfig          │ │
//! │  │  Found          │  │  PublishTimeout │  │  ConfigLoadFailed       │ │
//! │  │  → propagated,  │  │  Connector*     │  │  → reported as SKIPPED  │ │
//! │  │    not retried  │  │  → bounded      │  │    on the distribution  │ │
//! │  │                 │  │    retries,     │  │    path, not FAILED     │ │
//! │  │                 │  │    then FAILED  │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ValidationFailure (restriction violations) is NOT an error at all:    │
//! │  it is a structured ValidationOutcome — an expected business result.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine error type covering resolution, relay and distribution failures.
///
/// ## Design Principles
/// - Each variant includes enough context for debugging
/// - Errors are categorized for different handling strategies
/// - All errors are `Send + Sync` for async compatibility
#[derive(Debug, Error)]
pub enum EngineError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid engine configuration.
    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    // =========================================================================
    // Resolution Errors
    // =========================================================================
    /// Property does not exist.
    ///
    /// On the price path this surfaces only when the fallback tier is
    /// reached; absence of a resolvable price is a normal result, not
    /// an error.
    #[error("Property not found: {0}")]
    PropertyNotFound(String),

    /// Malformed caller input (empty ids, inverted date ranges).
    #[error("Validation error: {0}")]
    Validation(#[from] staycast_core::ValidationError),

    // =========================================================================
    // Delivery Errors
    // =========================================================================
    /// Broker rejected or failed a publish.
    #[error("Publish failed: {0}")]
    PublishFailed(String),

    /// Broker did not ack within the publish timeout.
    #[error("Publish timed out after {seconds} seconds")]
    PublishTimeout { seconds: u64 },

    /// A channel connector call failed.
    #[error("Connector for {channel} failed: {message}")]
    ConnectorFailed { channel: String, message: String },

    /// A channel connector did not answer within its timeout.
    #[error("Connector for {channel} timed out after {seconds} seconds")]
    ConnectorTimeout { channel: String, seconds: u64 },

    // =========================================================================
    // Storage Errors
    // =========================================================================
    /// Database query failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    // =========================================================================
    // Serialization Errors
    // =========================================================================
    /// Failed to (de)serialize an event payload.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Internal engine error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Relay is shutting down.
    #[error("Relay is shutting down")]
    ShuttingDown,

    /// Channel send/receive failed.
    #[error("Channel error: {0}")]
    ChannelError(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<staycast_db::DbError> for EngineError {
    fn from(err: staycast_db::DbError) -> Self {
        EngineError::DatabaseError(err.to_string())
    }
}

impl From<staycast_core::CoreError> for EngineError {
    fn from(err: staycast_core::CoreError) -> Self {
        match err {
            staycast_core::CoreError::PropertyNotFound(id) => EngineError::PropertyNotFound(id),
            staycast_core::CoreError::Validation(v) => EngineError::Validation(v),
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::SerializationFailed(err.to_string())
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::ConfigLoadFailed(err.to_string())
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::ConfigLoadFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl EngineError {
    /// Returns true if this error is a transient delivery failure: the
    /// operation may succeed on a later bounded retry.
    ///
    /// ## Retryable Errors
    /// - Broker publish failures and timeouts
    /// - Connector failures and timeouts
    ///
    /// ## Non-Retryable Errors
    /// - NotFound (missing property)
    /// - Configuration errors (wrong until an operator fixes them)
    /// - Validation errors (caller bugs)
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::PublishFailed(_)
                | EngineError::PublishTimeout { .. }
                | EngineError::ConnectorFailed { .. }
                | EngineError::ConnectorTimeout { .. }
        )
    }

    /// Returns true if this error indicates a configuration problem.
    ///
    /// On the distribution path these map to `Skipped`, not `Failed`:
    /// retrying cannot fix a missing connector.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidConfig(_) | EngineError::ConfigLoadFailed(_)
        )
    }
}
