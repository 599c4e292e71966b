//! Arithmetic Operator Resolver
//!
//! Maps one field-update instruction to the expression node computing the new
//! value, or to a classified rejection. Every check runs before the compiled
//! statement is sent to the store; the only check delegated to the store is
//! the `BigInt` bound when the configured [`StoreLimits`] are wider than what
//! the store actually guards, in which case the store's own overflow
//! rejection is surfaced under the same classification by the caller.

use crate::compile::{arithmetic, assign, parameter, property, ArithmeticOp, Operation};
use crate::models::snapshot::has_value;
use crate::models::{FieldDefinition, ScalarType, Snapshot, UpdateOperator};
use crate::store::StoreLimits;
use crate::update::{FieldUpdate, UpdateError};
use serde_json::Value;

/// Resolves field updates into assignment expressions
pub struct OperatorResolver<'a> {
    limits: &'a StoreLimits,
}

impl<'a> OperatorResolver<'a> {
    pub fn new(limits: &'a StoreLimits) -> Self {
        Self { limits }
    }

    /// Resolve one update against the declared field and the pre-request
    /// snapshots of every entity bound at the target hop
    ///
    /// Returns the `SET` assignment for the field, with the operand bound as
    /// a parameter so the rendered text stays value-free. Arithmetic checks
    /// run against each snapshot: a request touching several bound entities
    /// is rejected wholesale if any of them would overflow or holds no value.
    pub fn resolve(
        &self,
        entity: &str,
        update: &FieldUpdate,
        field: &FieldDefinition,
        current: &[Snapshot],
    ) -> Result<Operation, UpdateError> {
        if !field.accepts(update.operator) {
            return Err(UpdateError::mismatch(
                &update.field,
                field.scalar,
                update.operator,
            ));
        }

        let target = property(entity, update.field.clone());
        let param_id = format!("{}.{}", entity, update.field);

        match update.operator {
            UpdateOperator::Set => {
                self.check_set_operand(update, field)?;
                Ok(assign(target, parameter(param_id, update.operand.clone())))
            }
            UpdateOperator::Increment | UpdateOperator::Decrement => {
                // A permitted-operator override never widens the type rule.
                if !matches!(field.scalar, ScalarType::Int | ScalarType::BigInt) {
                    return Err(UpdateError::mismatch(
                        &update.field,
                        field.scalar,
                        update.operator,
                    ));
                }
                let op = match update.operator {
                    UpdateOperator::Increment => ArithmeticOp::Add,
                    _ => ArithmeticOp::Sub,
                };
                let delta = self.integer_operand(update)?;
                for snapshot in current {
                    self.check_integer(update, field.scalar, snapshot, op, delta)?;
                }
                Ok(assign(
                    target,
                    arithmetic(op, property(entity, update.field.clone()), parameter(param_id, Value::from(delta))),
                ))
            }
            UpdateOperator::Add
            | UpdateOperator::Subtract
            | UpdateOperator::Multiply
            | UpdateOperator::Divide => {
                if field.scalar != ScalarType::Float {
                    return Err(UpdateError::mismatch(
                        &update.field,
                        field.scalar,
                        update.operator,
                    ));
                }
                let op = match update.operator {
                    UpdateOperator::Add => ArithmeticOp::Add,
                    UpdateOperator::Subtract => ArithmeticOp::Sub,
                    UpdateOperator::Multiply => ArithmeticOp::Mul,
                    _ => ArithmeticOp::Div,
                };
                let operand = self.float_operand(update)?;
                if op == ArithmeticOp::Div && operand == 0.0 {
                    return Err(UpdateError::division_by_zero(&update.field));
                }
                for snapshot in current {
                    self.check_float(update, snapshot, op, operand)?;
                }
                Ok(assign(
                    target,
                    arithmetic(op, property(entity, update.field.clone()), parameter(param_id, Value::from(operand))),
                ))
            }
        }
    }

    fn check_integer(
        &self,
        update: &FieldUpdate,
        scalar: ScalarType,
        snapshot: &Snapshot,
        op: ArithmeticOp,
        delta: i64,
    ) -> Result<(), UpdateError> {
        if !has_value(snapshot, &update.field) {
            return Err(UpdateError::null_operand(&update.field));
        }
        let stored = as_integer(&snapshot[&update.field]).ok_or_else(|| {
            UpdateError::invalid_operand(&update.field, "stored value is not an integer")
        })?;

        let result = match op {
            ArithmeticOp::Add => stored.checked_add(delta),
            _ => stored.checked_sub(delta),
        }
        .ok_or_else(|| UpdateError::overflow(&update.field))?;

        let in_range = match scalar {
            ScalarType::Int => i32::try_from(result).is_ok(),
            _ => self.limits.contains(result),
        };
        if !in_range {
            return Err(UpdateError::overflow(&update.field));
        }
        Ok(())
    }

    fn check_float(
        &self,
        update: &FieldUpdate,
        snapshot: &Snapshot,
        op: ArithmeticOp,
        operand: f64,
    ) -> Result<(), UpdateError> {
        if !has_value(snapshot, &update.field) {
            return Err(UpdateError::null_operand(&update.field));
        }
        let stored = as_float(&snapshot[&update.field]).ok_or_else(|| {
            UpdateError::invalid_operand(&update.field, "stored value is not a number")
        })?;

        let result = match op {
            ArithmeticOp::Add => stored + operand,
            ArithmeticOp::Sub => stored - operand,
            ArithmeticOp::Mul => stored * operand,
            ArithmeticOp::Div => stored / operand,
        };
        if !result.is_finite() {
            return Err(UpdateError::overflow(&update.field));
        }
        Ok(())
    }

    /// A direct set of a numeric field still honors the type's range
    fn check_set_operand(
        &self,
        update: &FieldUpdate,
        field: &FieldDefinition,
    ) -> Result<(), UpdateError> {
        if update.operand.is_null() {
            return Ok(());
        }
        match field.scalar {
            ScalarType::Int => {
                let value = self.integer_operand(update)?;
                if i32::try_from(value).is_err() {
                    return Err(UpdateError::overflow(&update.field));
                }
            }
            ScalarType::BigInt => {
                let value = self.integer_operand(update)?;
                if !self.limits.contains(value) {
                    return Err(UpdateError::overflow(&update.field));
                }
            }
            ScalarType::Float => {
                let value = self.float_operand(update)?;
                if !value.is_finite() {
                    return Err(UpdateError::overflow(&update.field));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn integer_operand(&self, update: &FieldUpdate) -> Result<i64, UpdateError> {
        as_integer(&update.operand).ok_or_else(|| {
            UpdateError::invalid_operand(&update.field, "operand is not an integer")
        })
    }

    fn float_operand(&self, update: &FieldUpdate) -> Result<f64, UpdateError> {
        as_float(&update.operand).ok_or_else(|| {
            UpdateError::invalid_operand(&update.field, "operand is not a number")
        })
    }
}

/// Read an integer from loosely-typed input: JSON number or decimal string
///
/// 64-bit values arrive from clients as strings when they exceed the safe
/// range of the transport's number type.
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
