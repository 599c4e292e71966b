//! Subscription Filter & Dispatcher
//!
//! Change events fan out to subscribers through an explicit registration
//! table plus one channel per subscriber. Publishing pushes onto an
//! in-process queue and returns immediately, so event production never
//! blocks completion of the write's response; a background task drains the
//! queue and delivers to every matching channel.
//!
//! Delivery discipline:
//!
//! - The dispatcher iterates a snapshot of the registration table per event,
//!   so adding/removing a registration never disrupts an in-flight dispatch.
//! - Channels are unbounded and sends never block, so one slow or closed
//!   subscriber cannot hold up delivery to others.
//! - Events flow through a single FIFO queue in write-completion order,
//!   which preserves per-entity ordering end to end.

use crate::events::{ChangeEvent, ChangeKind};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

/// A standing predicate-filtered interest in change events of one type
///
/// The type name is checked first; on a mismatch the predicate is never
/// evaluated. An empty kind list means every kind; an empty predicate
/// matches every event of the type.
#[derive(Debug, Clone)]
pub struct SubscriptionFilter {
    /// Entity type this subscription watches
    pub type_name: String,

    /// Event kinds of interest; empty means all
    pub kinds: Vec<ChangeKind>,

    /// Exact-match conditions over the event's relevant snapshot
    pub predicate: Map<String, Value>,

    /// Suppress events produced by this client's own requests
    pub ignore_client_id: Option<String>,
}

impl SubscriptionFilter {
    /// Subscribe to every event of one type
    pub fn for_type(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            kinds: Vec::new(),
            predicate: Map::new(),
            ignore_client_id: None,
        }
    }

    /// Restrict to the given event kinds
    pub fn with_kinds(mut self, kinds: Vec<ChangeKind>) -> Self {
        self.kinds = kinds;
        self
    }

    /// Require a field of the relevant snapshot to equal a value
    pub fn with_field(mut self, field: impl Into<String>, value: Value) -> Self {
        self.predicate.insert(field.into(), value);
        self
    }

    /// Drop events echoed back from this client's own requests
    pub fn ignoring_client(mut self, client_id: impl Into<String>) -> Self {
        self.ignore_client_id = Some(client_id.into());
        self
    }

    /// Whether the event matches this registration
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        if event.type_name != self.type_name {
            return false;
        }
        if !self.kinds.is_empty() && !self.kinds.contains(&event.kind) {
            return false;
        }
        if let (Some(ignored), Some(source)) =
            (&self.ignore_client_id, &event.source_client_id)
        {
            if ignored == source {
                return false;
            }
        }
        let snapshot = event.relevant_snapshot();
        self.predicate
            .iter()
            .all(|(field, expected)| snapshot.get(field) == Some(expected))
    }
}

/// Handle returned to the transport collaborator on registration
///
/// The receiver yields matching events in dispatch order. Dropping the
/// receiver closes the channel; the registration is pruned on the next
/// delivery attempt, or eagerly through `unregister`.
#[derive(Debug)]
pub struct SubscriptionHandle {
    pub id: Uuid,
    pub receiver: mpsc::UnboundedReceiver<ChangeEvent>,
}

struct Registration {
    filter: SubscriptionFilter,
    sender: mpsc::UnboundedSender<ChangeEvent>,
}

/// Routes published change events to matching subscriber channels
///
/// Cloneable; all clones share one registration table and one publish
/// queue. Must be created inside a tokio runtime since it spawns the
/// dispatch task. The task ends when every clone has been dropped.
#[derive(Clone)]
pub struct ChangeDispatcher {
    registrations: Arc<RwLock<HashMap<Uuid, Registration>>>,
    queue: mpsc::UnboundedSender<ChangeEvent>,
}

impl ChangeDispatcher {
    /// Create a dispatcher and spawn its delivery task
    pub fn new() -> Self {
        let registrations: Arc<RwLock<HashMap<Uuid, Registration>>> =
            Arc::new(RwLock::new(HashMap::new()));
        let (queue, mut queue_rx) = mpsc::unbounded_channel::<ChangeEvent>();

        let table = Arc::clone(&registrations);
        tokio::spawn(async move {
            while let Some(event) = queue_rx.recv().await {
                Self::dispatch(&table, event);
            }
            debug!("change dispatcher queue closed, delivery task stopping");
        });

        Self {
            registrations,
            queue,
        }
    }

    /// Register a subscriber and hand back its channel
    pub fn register(&self, filter: SubscriptionFilter) -> SubscriptionHandle {
        let id = Uuid::new_v4();
        let (sender, receiver) = mpsc::unbounded_channel();
        debug!(subscription = %id, type_name = %filter.type_name, "registering subscription");

        let mut table = self.registrations.write().expect("registration table poisoned");
        table.insert(id, Registration { filter, sender });
        drop(table);

        SubscriptionHandle { id, receiver }
    }

    /// Remove a registration; delivery already in flight to other channels
    /// is unaffected
    pub fn unregister(&self, id: Uuid) {
        let mut table = self.registrations.write().expect("registration table poisoned");
        if table.remove(&id).is_some() {
            debug!(subscription = %id, "unregistered subscription");
        }
    }

    /// Number of live registrations
    pub fn subscriber_count(&self) -> usize {
        self.registrations
            .read()
            .expect("registration table poisoned")
            .len()
    }

    /// Queue an event for delivery without blocking the caller
    pub fn publish(&self, event: ChangeEvent) {
        // Fails only when the delivery task is gone, i.e. during shutdown.
        let _ = self.queue.send(event);
    }

    /// Deliver one event to every matching channel
    fn dispatch(table: &RwLock<HashMap<Uuid, Registration>>, event: ChangeEvent) {
        // Snapshot matching senders under the read lock, then send without
        // holding it, so registration changes never wait on delivery.
        let targets: Vec<(Uuid, mpsc::UnboundedSender<ChangeEvent>)> = {
            let table = table.read().expect("registration table poisoned");
            table
                .iter()
                .filter(|(_, reg)| reg.filter.matches(&event))
                .map(|(id, reg)| (*id, reg.sender.clone()))
                .collect()
        };

        let mut closed = Vec::new();
        for (id, sender) in targets {
            if sender.send(event.clone()).is_err() {
                closed.push(id);
            }
        }

        if !closed.is_empty() {
            let mut table = table.write().expect("registration table poisoned");
            for id in closed {
                if table.remove(&id).is_some() {
                    warn!(subscription = %id, "pruned closed subscription channel");
                }
            }
        }
    }
}

impl Default for ChangeDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
