//! Business Services
//!
//! This module contains the request orchestration services:
//!
//! - `MutationService` - create/update/delete compilation, execution, and
//!   change-event production
//! - `ReadService` - structured read compilation and execution
//! - `SubscriptionService` - registration interface for the transport
//!   collaborator
//!
//! Services coordinate between the compilation core and the store boundary,
//! implementing the all-or-nothing write discipline and event emission.

pub mod error;
pub mod mutation_service;
pub mod read_service;
pub mod subscription_service;

pub use error::EngineError;
pub use mutation_service::MutationService;
pub use read_service::{
    FilterOperator, ReadDefinition, ReadFilter, ReadService, SortConfig, SortDirection,
};
pub use subscription_service::SubscriptionService;
