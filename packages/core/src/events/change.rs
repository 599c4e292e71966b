//! Change Events
//!
//! This module defines the events derived from successful writes. Events
//! follow the observer pattern: the mutation path produces them at the point
//! a write is observed to have succeeded, and subscribers consume them
//! through the dispatcher without coupling to the write path.
//!
//! # Event Flow
//!
//! 1. A create/update/delete statement succeeds against the store
//! 2. A change event is constructed from the before/after snapshots
//! 3. The event is published to the dispatcher queue
//! 4. Matching subscriptions receive the event asynchronously

use crate::models::Snapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classification of an entity's property transition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// Typed record of one entity's property transition
///
/// Invariants are enforced by the constructors: a created event has no
/// `old`, a deleted event has no `new`, an updated event carries both full
/// snapshots (not just the changed fields, since subscriber predicates may
/// need unchanged ones). Events are immutable once constructed and are
/// consumed once by the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    /// Event classification
    pub kind: ChangeKind,

    /// Declared type of the entity that changed
    pub type_name: String,

    /// Property snapshot before the write
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<Snapshot>,

    /// Property snapshot after the write
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new: Option<Snapshot>,

    /// When the write was observed to have succeeded
    pub occurred_at: DateTime<Utc>,

    /// Identifier of the client whose request produced the event
    ///
    /// Lets subscribers filter out their own echoes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_client_id: Option<String>,
}

impl ChangeEvent {
    /// Event for a newly created entity
    pub fn created(type_name: impl Into<String>, new: Snapshot) -> Self {
        Self {
            kind: ChangeKind::Created,
            type_name: type_name.into(),
            old: None,
            new: Some(new),
            occurred_at: Utc::now(),
            source_client_id: None,
        }
    }

    /// Event for an updated entity, carrying both full snapshots
    pub fn updated(type_name: impl Into<String>, old: Snapshot, new: Snapshot) -> Self {
        Self {
            kind: ChangeKind::Updated,
            type_name: type_name.into(),
            old: Some(old),
            new: Some(new),
            occurred_at: Utc::now(),
            source_client_id: None,
        }
    }

    /// Event for a deleted entity
    pub fn deleted(type_name: impl Into<String>, old: Snapshot) -> Self {
        Self {
            kind: ChangeKind::Deleted,
            type_name: type_name.into(),
            old: Some(old),
            new: None,
            occurred_at: Utc::now(),
            source_client_id: None,
        }
    }

    /// Tag the event with the client that produced it
    pub fn with_source(mut self, client_id: impl Into<String>) -> Self {
        self.source_client_id = Some(client_id.into());
        self
    }

    /// String label of the event kind
    pub fn event_type(&self) -> &'static str {
        match self.kind {
            ChangeKind::Created => "entity:created",
            ChangeKind::Updated => "entity:updated",
            ChangeKind::Deleted => "entity:deleted",
        }
    }

    /// The snapshot subscriber predicates evaluate against
    ///
    /// The current view for created/updated events, the final prior state
    /// for deleted ones.
    pub fn relevant_snapshot(&self) -> &Snapshot {
        match self.kind {
            ChangeKind::Created | ChangeKind::Updated => {
                self.new.as_ref().expect("created/updated carry new")
            }
            ChangeKind::Deleted => self.old.as_ref().expect("deleted carries old"),
        }
    }
}
