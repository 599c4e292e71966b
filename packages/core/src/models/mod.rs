//! Data Model
//!
//! Shared data structures: injected schema metadata and entity property
//! snapshots. Everything here is plain data; behavior lives in the
//! compilation, update, and event modules.

pub mod schema;
pub mod snapshot;

pub use schema::{
    Direction, FieldDefinition, GraphSchema, RelationshipDefinition, ScalarType, TypeDefinition,
    TypeKind, UpdateOperator,
};
pub use snapshot::Snapshot;
