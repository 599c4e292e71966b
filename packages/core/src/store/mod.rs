//! Store Boundary
//!
//! The engine never talks to a concrete database. It emits
//! (query text, parameter map) pairs as [`Statement`]s through the
//! [`GraphStore`] trait and receives either bound rows or a typed
//! [`StoreError`]. The trait is the synchronous request/response boundary
//! the core suspends on; the core never locks the store internally.

mod error;

pub use error::StoreError;

use async_trait::async_trait;
use serde_json::{Map, Value};

/// One result row: rendered return-item name -> bound value
pub type Row = Map<String, Value>;

/// A compiled statement ready for execution
///
/// Text and parameters are produced by one render pass and must be consumed
/// together; parameter tokens in the text resolve only against this map.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub text: String,
    pub params: Map<String, Value>,
}

impl Statement {
    pub fn new(text: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            text: text.into(),
            params,
        }
    }
}

/// The property-graph store collaborator
///
/// Implementations execute one statement at a time and report either a
/// result set of bound values or a typed failure. A store that computes
/// update arithmetic itself must report range violations as
/// [`StoreError::NumericOverflow`] so the engine can classify them.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn execute(&self, statement: Statement) -> Result<Vec<Row>, StoreError>;
}

/// Numeric bounds the store enforces for `BigInt` arithmetic
///
/// Some stores guard a range narrower than the declared 64-bit scalar type;
/// the boundary is configuration, not an assumption baked into the engine.
/// Defaults to the full signed 64-bit range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    pub integer_min: i64,
    pub integer_max: i64,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            integer_min: i64::MIN,
            integer_max: i64::MAX,
        }
    }
}

impl StoreLimits {
    /// Whether a computed 64-bit value is inside the store's guard
    pub fn contains(&self, value: i64) -> bool {
        value >= self.integer_min && value <= self.integer_max
    }
}
