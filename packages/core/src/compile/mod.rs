//! Query Compilation
//!
//! This module turns operation trees into parameterized query text:
//!
//! - [`Operation`] - composable AST of boolean, comparison, arithmetic,
//!   pattern, and clause nodes
//! - [`Environment`] - per-render-pass allocation of variable names and
//!   parameter tokens
//!
//! Rendering is pure and synchronous: concurrent compilations for
//! independent requests never share state because each pass owns its
//! environment.

pub mod environment;
pub mod operation;

pub use environment::Environment;
pub use operation::{
    alias, and, arithmetic, assign, compare, node_pattern, not, or, parameter, property,
    ArithmeticOp, Comparator, Operation,
};
