//! Subscription Service
//!
//! The registration interface exposed to the transport collaborator: the
//! transport maps each returned handle to a live connection and calls
//! `unregister` on disconnect. Delivery itself is handled by the
//! [`ChangeDispatcher`]; this service only manages registration lifetime.

use crate::events::{ChangeDispatcher, ChangeEvent, SubscriptionFilter, SubscriptionHandle};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::info;
use uuid::Uuid;

/// Service managing subscriber registrations
#[derive(Clone)]
pub struct SubscriptionService {
    dispatcher: ChangeDispatcher,
}

impl SubscriptionService {
    /// Create a service over the dispatcher the mutation path publishes to
    pub fn new(dispatcher: ChangeDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Register an interest and hand back the subscriber's channel
    pub fn register(&self, filter: SubscriptionFilter) -> SubscriptionHandle {
        let handle = self.dispatcher.register(filter);
        info!(subscription = %handle.id, "subscription registered");
        handle
    }

    /// Register an interest and expose the channel as a stream
    pub fn register_stream(
        &self,
        filter: SubscriptionFilter,
    ) -> (Uuid, UnboundedReceiverStream<ChangeEvent>) {
        let handle = self.register(filter);
        (handle.id, UnboundedReceiverStream::new(handle.receiver))
    }

    /// Remove a registration; called by the transport on disconnect
    pub fn unregister(&self, id: Uuid) {
        self.dispatcher.unregister(id);
        info!(subscription = %id, "subscription removed");
    }

    /// Number of live registrations
    pub fn subscriber_count(&self) -> usize {
        self.dispatcher.subscriber_count()
    }
}
