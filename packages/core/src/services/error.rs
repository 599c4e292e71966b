//! Service Layer Error Types
//!
//! High-level errors for request orchestration, wrapping the update
//! taxonomy and store failures with the context a transport needs to build
//! a response.

use crate::models::Snapshot;
use crate::store::StoreError;
use crate::update::UpdateError;
use thiserror::Error;

/// Errors surfaced by the engine services
#[derive(Error, Debug)]
pub enum EngineError {
    /// The request names a type the schema does not declare
    #[error("Unknown type: {type_name}")]
    UnknownType { type_name: String },

    /// The addressed entity does not exist
    #[error("{type_name} with id '{id}' does not exist")]
    NotFound { type_name: String, id: String },

    /// Request validation failed; one entry per violated constraint
    #[error("Request rejected with {} validation error(s)", errors.len())]
    Rejected { errors: Vec<UpdateError> },

    /// The store's numeric-overflow guard rejected the write
    ///
    /// Carries the re-read, unchanged stored state as proof that no partial
    /// write occurred.
    #[error("Numeric overflow reported by store: {detail}")]
    Overflow {
        detail: String,
        current: Box<Snapshot>,
    },

    /// Opaque failure surfaced by the store collaborator
    #[error("Store operation failed: {0}")]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Create an unknown-type error
    pub fn unknown_type(type_name: impl Into<String>) -> Self {
        Self::UnknownType {
            type_name: type_name.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            type_name: type_name.into(),
            id: id.into(),
        }
    }

    /// Create a rejection from collected validation errors
    pub fn rejected(errors: Vec<UpdateError>) -> Self {
        Self::Rejected { errors }
    }

    /// The individual validation errors, if this is a rejection
    pub fn validation_errors(&self) -> &[UpdateError] {
        match self {
            Self::Rejected { errors } => errors,
            _ => &[],
        }
    }
}
