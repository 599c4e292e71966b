//! GraphLoom Query Compilation and Change-Event Engine
//!
//! This crate compiles schema-driven read/write requests into correct,
//! parameterized statements against a property-graph store, and derives
//! change events consumable by subscribers when writes succeed.
//!
//! # Architecture
//!
//! - **Operation Tree**: closed AST of boolean/comparison/arithmetic/pattern
//!   nodes rendered to query text through a per-pass environment
//! - **Update Semantics**: scalar operator resolution with overflow,
//!   ambiguity, and null-operand detection before any write
//! - **Change Events**: before/after snapshots classified
//!   created/updated/deleted and fanned out through per-subscriber channels
//! - **External Store**: the property-graph store is a collaborator behind
//!   the `GraphStore` trait, never an embedded dependency
//!
//! # Modules
//!
//! - [`models`] - injected schema metadata and property snapshots
//! - [`compile`] - operation tree and rendering environment
//! - [`update`] - operator resolution and nested update traversal
//! - [`events`] - change events, subscription filter, and dispatcher
//! - [`store`] - store boundary types
//! - [`services`] - request orchestration (mutations, reads, subscriptions)

pub mod compile;
pub mod events;
pub mod models;
pub mod services;
pub mod store;
pub mod update;

// Re-export commonly used types
pub use events::{ChangeDispatcher, ChangeEvent, ChangeKind, SubscriptionFilter};
pub use models::*;
pub use services::*;
pub use store::{GraphStore, Statement, StoreError, StoreLimits};
pub use update::UpdateError;
