//! Update Error Taxonomy
//!
//! Every failure the update path can classify before (or in place of) a
//! write. All of these abort the whole request: the engine never leaves
//! stored state in an intermediate condition, and a follow-up read returns
//! the unchanged value.

use crate::models::{ScalarType, UpdateOperator};
use crate::store::StoreError;
use thiserror::Error;

/// Request validation and execution errors for field updates
///
/// A rejected request carries one error per violated constraint; errors are
/// collected across nested branches, never merged.
#[derive(Error, Debug)]
pub enum UpdateError {
    /// More than one operator (including an implicit set) targets one field
    #[error("Ambiguous update: multiple operators target field '{field}'")]
    AmbiguousUpdate { field: String },

    /// The operator is not valid for the field's declared scalar type
    #[error("Operator '{operator}' is not valid for field '{field}' of type '{scalar}'")]
    TypeOperatorMismatch {
        field: String,
        scalar: ScalarType,
        operator: UpdateOperator,
    },

    /// The arithmetic result exceeds the type's representable range
    #[error("Numeric overflow on field '{field}'")]
    Overflow { field: String },

    /// Division by a zero-valued operand
    #[error("Division by zero on field '{field}'")]
    DivisionByZero { field: String },

    /// Arithmetic requested on a field that currently holds no value
    #[error("Arithmetic on null value of field '{field}'")]
    NullOperand { field: String },

    /// The operand cannot be read as the field's declared scalar type
    #[error("Invalid operand for field '{field}': {reason}")]
    InvalidOperand { field: String, reason: String },

    /// The request names a field the type does not declare
    #[error("Type '{type_name}' has no field '{field}'")]
    UnknownField { type_name: String, field: String },

    /// The request names a type the schema does not declare
    #[error("Unknown type: {type_name}")]
    UnknownType { type_name: String },

    /// A per-implementing-type block names a type outside the interface
    #[error("Type '{type_name}' does not implement interface '{interface}'")]
    NotAnImplementer {
        type_name: String,
        interface: String,
    },

    /// Opaque failure surfaced by the store collaborator
    #[error("Store failure: {0}")]
    Store(#[from] StoreError),
}

impl UpdateError {
    /// Create an ambiguous update error
    pub fn ambiguous(field: impl Into<String>) -> Self {
        Self::AmbiguousUpdate {
            field: field.into(),
        }
    }

    /// Create a type/operator mismatch error
    pub fn mismatch(
        field: impl Into<String>,
        scalar: ScalarType,
        operator: UpdateOperator,
    ) -> Self {
        Self::TypeOperatorMismatch {
            field: field.into(),
            scalar,
            operator,
        }
    }

    /// Create an overflow error
    pub fn overflow(field: impl Into<String>) -> Self {
        Self::Overflow {
            field: field.into(),
        }
    }

    /// Create a division-by-zero error
    pub fn division_by_zero(field: impl Into<String>) -> Self {
        Self::DivisionByZero {
            field: field.into(),
        }
    }

    /// Create a null-operand error
    pub fn null_operand(field: impl Into<String>) -> Self {
        Self::NullOperand {
            field: field.into(),
        }
    }

    /// Create an invalid-operand error
    pub fn invalid_operand(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOperand {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an unknown-field error
    pub fn unknown_field(type_name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            type_name: type_name.into(),
            field: field.into(),
        }
    }

    /// Create an unknown-type error
    pub fn unknown_type(type_name: impl Into<String>) -> Self {
        Self::UnknownType {
            type_name: type_name.into(),
        }
    }

    /// Create a not-an-implementer error
    pub fn not_an_implementer(
        type_name: impl Into<String>,
        interface: impl Into<String>,
    ) -> Self {
        Self::NotAnImplementer {
            type_name: type_name.into(),
            interface: interface.into(),
        }
    }
}
