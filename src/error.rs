//! Error types for the governance core
//!
//! Infrastructure failures (log unavailable, bad configuration) are expressed
//! through [`GovernorError`] and abort the current operation without partial
//! effect. Quota violations are deliberately *not* errors: validators return
//! accumulated lists of human-readable violation strings so one request can
//! report every violated dimension at once.

use thiserror::Error;

/// Result type alias for governance operations
pub type Result<T> = std::result::Result<T, GovernorError>;

/// Main error type for the governance core
#[derive(Error, Debug)]
pub enum GovernorError {
    /// The event log rejected or failed an append. The record was not
    /// persisted; the whole operation is safe to retry.
    #[error("log append failed: {0}")]
    Append(String),

    /// A namespace security policy carries a malformed REGEXP pattern.
    /// Raised at policy compilation time, never during per-resource
    /// evaluation.
    #[error("invalid security policy pattern '{pattern}'")]
    Policy {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A byte-size quota value does not end with a recognized unit suffix.
    #[error("invalid quota unit in '{0}': value must end with either B, Ki, Mi or Gi")]
    InvalidQuotaUnit(String),

    /// A quota value could not be parsed as a number.
    #[error("invalid quota value '{0}'")]
    InvalidQuotaValue(String),

    /// A resource fails identity-key validation (empty or illegal
    /// cluster/name).
    #[error("invalid resource: {0}")]
    InvalidResource(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
