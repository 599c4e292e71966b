//! Field Update Resolution and Traversal
//!
//! This module turns loosely-typed mutation input into the operation tree
//! for one request:
//!
//! - [`operators`] - client vocabulary (`f`, `f_INCREMENT`, `f_DIVIDE`, ...)
//!   and per-field grouping with ambiguity rejection
//! - [`resolver`] - operator semantics: type compatibility, overflow,
//!   division by zero, null operands
//! - [`traversal`] - depth-first walk of nested relationship and interface
//!   blocks assembling the combined statement
//! - [`error`] - the classified failure taxonomy
//!
//! All checks run before the compiled statement reaches the store; a request
//! either applies as a whole or leaves stored state untouched.

pub mod error;
pub mod operators;
pub mod resolver;
pub mod traversal;

pub use error::UpdateError;
pub use operators::{collect_field_updates, parse_field_key, FieldUpdate};
pub use resolver::OperatorResolver;
pub use traversal::{
    HopRead, ScopeSnapshots, UpdateTraversal, EDGE_SCOPE_SUFFIX, HOP_EDGE_ALIAS, HOP_TARGET_ALIAS,
};
