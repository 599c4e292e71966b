//! Change Events and Subscription Fan-Out
//!
//! This module covers the read side of the write path:
//!
//! - [`change`] - typed before/after records classified as
//!   created/updated/deleted
//! - [`subscription`] - predicate-filtered registrations and the dispatcher
//!   delivering events to per-subscriber channels

pub mod change;
pub mod subscription;

pub use change::{ChangeEvent, ChangeKind};
pub use subscription::{ChangeDispatcher, SubscriptionFilter, SubscriptionHandle};
