//! Unified error types for the crate.
//!
//! All operations surface failures through [`Error`]; the API layer maps these
//! to its own status codes. The two designed "quiet" paths (presence-skipped
//! billing ticks and broadcast fan-out failures) are outcomes, not errors, and
//! never appear here.

use thiserror::Error;

/// Crate-wide error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    /// A non-positive monetary value was attempted.
    #[error("invalid amount: {amount}")]
    InvalidAmount {
        /// The offending amount in cents
        amount: i64,
    },

    /// A debit exceeded the available balance. No partial debit occurs.
    #[error("insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds {
        /// Balance in cents at the time of the attempt
        balance: i64,
        /// Amount in cents the debit required
        required: i64,
    },

    /// A state-machine operation was attempted from a disallowed state.
    #[error("invalid transition: {message}")]
    InvalidTransition {
        /// What was attempted and why it is disallowed
        message: String,
    },

    /// The actor lacks the role or relationship required for the operation.
    #[error("not authorized: {message}")]
    NotAuthorized {
        /// What the actor attempted
        message: String,
    },

    /// A referenced entity is absent.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind, e.g. `"session"`
        entity: &'static str,
        /// The identifier that failed to resolve
        id: String,
    },

    /// An overlapping appointment or availability window.
    #[error("scheduling conflict: {message}")]
    SchedulingConflict {
        /// Description of the conflicting window
        message: String,
    },

    /// Configuration loading or input validation failure.
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable cause
        message: String,
    },

    /// Database error surfaced from SeaORM.
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error (config file reads).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
