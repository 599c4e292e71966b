//! Client Update Vocabulary
//!
//! Clients address scalar field updates through suffixed keys: a bare field
//! name is a direct set, `views_INCREMENT` increments, `rating_DIVIDE`
//! divides, and so on. This module parses those keys and groups a request's
//! raw entries into per-field update instructions, rejecting ambiguity
//! before any expression is built.

use crate::models::{TypeDefinition, UpdateOperator};
use crate::update::UpdateError;
use serde_json::{Map, Value};

/// Suffix vocabulary, checked in declaration order
const OPERATOR_SUFFIXES: &[(&str, UpdateOperator)] = &[
    ("_INCREMENT", UpdateOperator::Increment),
    ("_DECREMENT", UpdateOperator::Decrement),
    ("_ADD", UpdateOperator::Add),
    ("_SUBTRACT", UpdateOperator::Subtract),
    ("_MULTIPLY", UpdateOperator::Multiply),
    ("_DIVIDE", UpdateOperator::Divide),
];

/// One field-scoped mutation instruction
#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate {
    pub field: String,
    pub operator: UpdateOperator,
    pub operand: Value,
}

/// Split a client key into the base field name and its operator
///
/// A key without a recognized suffix (or a key that is only a suffix) is a
/// direct set of the full key.
pub fn parse_field_key(key: &str) -> (&str, UpdateOperator) {
    for (suffix, operator) in OPERATOR_SUFFIXES {
        if let Some(base) = key.strip_suffix(suffix) {
            if !base.is_empty() {
                return (base, *operator);
            }
        }
    }
    (key, UpdateOperator::Set)
}

/// Group a request's scalar entries into per-field updates
///
/// Appends one error per violated constraint: an unknown base field, or more
/// than one operator targeting the same field. Fields with any violation are
/// excluded from the returned updates; the caller aborts the request when
/// `errors` is non-empty.
pub fn collect_field_updates(
    ty: &TypeDefinition,
    entries: &Map<String, Value>,
    errors: &mut Vec<UpdateError>,
) -> Vec<FieldUpdate> {
    let mut updates: Vec<FieldUpdate> = Vec::new();
    let mut rejected: Vec<String> = Vec::new();

    for (key, value) in entries {
        let (field, operator) = parse_field_key(key);

        if ty.field(field).is_none() {
            errors.push(UpdateError::unknown_field(&ty.name, field));
            continue;
        }
        if rejected.iter().any(|f| f == field) {
            continue;
        }
        if let Some(existing) = updates.iter().position(|u| u.field == field) {
            updates.remove(existing);
            rejected.push(field.to_string());
            errors.push(UpdateError::ambiguous(field));
            continue;
        }

        updates.push(FieldUpdate {
            field: field.to_string(),
            operator,
            operand: value.clone(),
        });
    }

    updates
}
