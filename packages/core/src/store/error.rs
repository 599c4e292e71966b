//! Store Error Types
//!
//! Typed failures the store collaborator can report per executed statement.
//! The engine maps `NumericOverflow` onto its own overflow classification;
//! everything else surfaces as an opaque store failure.

use thiserror::Error;

/// Failures reported by the property-graph store
#[derive(Error, Debug)]
pub enum StoreError {
    /// A store-side constraint rejected the statement
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// The store's own numeric-overflow guard rejected an arithmetic result
    ///
    /// Equivalent to the engine's `Overflow` classification; the caller
    /// re-reads and returns the unchanged stored value.
    #[error("Numeric overflow reported by store: {0}")]
    NumericOverflow(String),

    /// The statement did not complete in time
    #[error("Statement timed out after {0}ms")]
    Timeout(u64),

    /// The connection to the store was lost
    #[error("Connection to store lost: {0}")]
    ConnectionLost(String),

    /// Any other store-reported failure
    #[error("Store operation failed: {0}")]
    Other(String),
}

impl StoreError {
    /// Create a constraint violation error
    pub fn constraint_violation(msg: impl Into<String>) -> Self {
        Self::ConstraintViolation(msg.into())
    }

    /// Create a numeric overflow error
    pub fn numeric_overflow(msg: impl Into<String>) -> Self {
        Self::NumericOverflow(msg.into())
    }

    /// Create a connection lost error
    pub fn connection_lost(msg: impl Into<String>) -> Self {
        Self::ConnectionLost(msg.into())
    }

    /// Create an opaque store failure
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}
