//! Mutation Service
//!
//! Orchestrates the write path: desugars a create/update/delete request into
//! an update traversal, compiles the operation tree through a fresh
//! environment, executes the statement against the store, and derives the
//! change event once the write is observed to have succeeded.
//!
//! Every validation failure is detected before (or in place of) the write;
//! the service never leaves stored state in an intermediate condition. When
//! the store's own numeric-overflow guard rejects a statement, the service
//! re-reads and returns the unchanged stored value as proof that no partial
//! write occurred.

use crate::compile::{
    alias, assign, compare, node_pattern, parameter, property, Comparator, Environment, Operation,
};
use crate::events::{ChangeDispatcher, ChangeEvent};
use crate::models::{snapshot, GraphSchema, Snapshot, TypeDefinition, UpdateOperator};
use crate::services::EngineError;
use crate::store::{GraphStore, Statement, StoreError, StoreLimits};
use crate::update::{
    FieldUpdate, OperatorResolver, ScopeSnapshots, UpdateError, UpdateTraversal,
    EDGE_SCOPE_SUFFIX, HOP_EDGE_ALIAS, HOP_TARGET_ALIAS,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Service for executing mutations against the store
///
/// # Examples
///
/// ```no_run
/// # use graphloom_core::services::MutationService;
/// # use graphloom_core::events::ChangeDispatcher;
/// # use graphloom_core::models::GraphSchema;
/// # use graphloom_core::store::GraphStore;
/// # use std::sync::Arc;
/// # async fn example(store: Arc<dyn GraphStore>, schema: Arc<GraphSchema>) {
/// let dispatcher = ChangeDispatcher::new();
/// let service = MutationService::new(store, schema, dispatcher);
///
/// let mut input = serde_json::Map::new();
/// input.insert("viewers_INCREMENT".to_string(), serde_json::json!(1));
/// let updated = service.update("Movie", "m-1", input).await;
/// # }
/// ```
#[derive(Clone)]
pub struct MutationService {
    /// Store collaborator for all statement execution
    store: Arc<dyn GraphStore>,

    /// Schema metadata injected by the schema collaborator
    schema: Arc<GraphSchema>,

    /// Numeric bounds the store enforces for BigInt arithmetic
    limits: StoreLimits,

    /// Dispatcher receiving the change events this service produces
    dispatcher: ChangeDispatcher,

    /// Optional client identifier for event source tracking
    ///
    /// When set, all emitted events carry this id as `source_client_id` so
    /// clients can filter out their own echoes.
    client_id: Option<String>,
}

impl MutationService {
    /// Create a new MutationService with default store limits
    pub fn new(
        store: Arc<dyn GraphStore>,
        schema: Arc<GraphSchema>,
        dispatcher: ChangeDispatcher,
    ) -> Self {
        Self {
            store,
            schema,
            limits: StoreLimits::default(),
            dispatcher,
            client_id: None,
        }
    }

    /// Override the store's numeric bounds
    pub fn with_limits(mut self, limits: StoreLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Create a scoped service tagging emitted events with a client id
    pub fn with_client(&self, client_id: impl Into<String>) -> Self {
        let mut cloned = self.clone();
        cloned.client_id = Some(client_id.into());
        cloned
    }

    /// Create a new entity and emit a created event
    ///
    /// Property keys must name declared scalar fields; an `id` is generated
    /// when the request does not supply one. Numeric values are range-checked
    /// against the declared scalar types before the statement is built.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` for an undeclared type, `Rejected` with one
    /// error per invalid property, or `Store` when execution fails.
    pub async fn create(
        &self,
        type_name: &str,
        props: Map<String, Value>,
    ) -> Result<Snapshot, EngineError> {
        let ty = self.type_def(type_name)?;
        let entity = entity_var(ty);

        let id = match props.get("id") {
            Some(Value::String(id)) => id.clone(),
            _ => Uuid::new_v4().to_string(),
        };

        let resolver = OperatorResolver::new(&self.limits);
        let mut assignments = vec![assign(
            property(entity.clone(), "id"),
            parameter(format!("{}.id", entity), json!(id)),
        )];
        let mut errors = Vec::new();
        for (key, value) in &props {
            if key == "id" {
                continue;
            }
            let Some(field) = ty.field(key) else {
                errors.push(UpdateError::unknown_field(&ty.name, key));
                continue;
            };
            let update = FieldUpdate {
                field: key.clone(),
                operator: UpdateOperator::Set,
                operand: value.clone(),
            };
            match resolver.resolve(&entity, &update, field, &[]) {
                Ok(assignment) => assignments.push(assignment),
                Err(err) => errors.push(err),
            }
        }
        if !errors.is_empty() {
            return Err(EngineError::rejected(errors));
        }

        let operation = Operation::Statement(vec![
            Operation::Create(Box::new(node_pattern(entity.clone(), Some(ty.name.clone())))),
            Operation::Set(assignments),
            Operation::Return(vec![alias(Operation::Variable(entity), "node")]),
        ]);

        let rows = self.store.execute(render(&operation)).await?;
        let new = bound_snapshot(&rows, "node").unwrap_or_else(|| {
            let mut fallback = props;
            fallback.insert("id".to_string(), json!(id));
            fallback
        });

        debug!(type_name, id = %id, "created entity");
        self.publish(ChangeEvent::created(type_name, new.clone()));
        Ok(new)
    }

    /// Apply a (possibly nested) update and emit an updated event
    ///
    /// The pre-request snapshot of the root entity and of every touched hop
    /// is read first; all operator checks run against those snapshots, so
    /// scalar updates within the request are logically simultaneous and a
    /// failure in any nested branch aborts the whole request.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the entity does not exist, `Rejected` with
    /// the collected validation errors, `Overflow` with the unchanged stored
    /// state when the store's numeric guard rejects the write, or `Store`.
    pub async fn update(
        &self,
        type_name: &str,
        id: &str,
        input: Map<String, Value>,
    ) -> Result<Snapshot, EngineError> {
        let ty = self.type_def(type_name)?;
        let old = self
            .fetch_by_id(ty, id)
            .await?
            .ok_or_else(|| EngineError::not_found(type_name, id))?;

        let traversal = UpdateTraversal::new(&self.schema, &self.limits);
        let id_value = json!(id);

        let hop_reads = traversal
            .plan_hop_reads(type_name, &id_value, &input)
            .map_err(EngineError::rejected)?;

        let mut snapshots = ScopeSnapshots::new();
        snapshots.insert(String::new(), vec![old.clone()]);
        for hop in &hop_reads {
            let rows = self.store.execute(render(&hop.operation)).await?;
            for row in &rows {
                if let Some(target) = row.get(HOP_TARGET_ALIAS).and_then(snapshot::from_value) {
                    snapshots.entry(hop.scope.clone()).or_default().push(target);
                }
                if hop.has_edge {
                    if let Some(edge) = row.get(HOP_EDGE_ALIAS).and_then(snapshot::from_value) {
                        snapshots
                            .entry(format!("{}{}", hop.scope, EDGE_SCOPE_SUFFIX))
                            .or_default()
                            .push(edge);
                    }
                }
            }
        }

        let operation = traversal
            .compile(type_name, &id_value, &input, &snapshots)
            .map_err(EngineError::rejected)?;

        let rows = match self.store.execute(render(&operation)).await {
            Ok(rows) => rows,
            Err(StoreError::NumericOverflow(detail)) => {
                // Surface the store's guard as the engine's own overflow
                // classification, with the unchanged value re-read as proof.
                let current = self.fetch_by_id(ty, id).await?.unwrap_or(old);
                return Err(EngineError::Overflow {
                    detail,
                    current: Box::new(current),
                });
            }
            Err(err) => return Err(err.into()),
        };

        let new = match bound_snapshot(&rows, "node") {
            Some(snapshot) => snapshot,
            None => self.fetch_by_id(ty, id).await?.unwrap_or_else(|| old.clone()),
        };

        debug!(type_name, id, "updated entity");
        self.publish(ChangeEvent::updated(type_name, old, new.clone()));
        Ok(new)
    }

    /// Delete an entity and emit a deleted event carrying its final state
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the entity does not exist, or `Store` when
    /// execution fails.
    pub async fn delete(&self, type_name: &str, id: &str) -> Result<Snapshot, EngineError> {
        let ty = self.type_def(type_name)?;
        let old = self
            .fetch_by_id(ty, id)
            .await?
            .ok_or_else(|| EngineError::not_found(type_name, id))?;

        let entity = entity_var(ty);
        let operation = Operation::Statement(vec![
            match_entity(&entity, &ty.name),
            Operation::Where(Box::new(id_condition(&entity, id))),
            Operation::Delete {
                entity: entity.clone(),
            },
        ]);
        self.store.execute(render(&operation)).await?;

        debug!(type_name, id, "deleted entity");
        self.publish(ChangeEvent::deleted(type_name, old.clone()));
        Ok(old)
    }

    /// Read the current snapshot of one entity
    async fn fetch_by_id(
        &self,
        ty: &TypeDefinition,
        id: &str,
    ) -> Result<Option<Snapshot>, EngineError> {
        let entity = entity_var(ty);
        let operation = Operation::Statement(vec![
            match_entity(&entity, &ty.name),
            Operation::Where(Box::new(id_condition(&entity, id))),
            Operation::Return(vec![alias(Operation::Variable(entity), "node")]),
        ]);
        let rows = self.store.execute(render(&operation)).await?;
        Ok(bound_snapshot(&rows, "node"))
    }

    fn type_def(&self, type_name: &str) -> Result<&TypeDefinition, EngineError> {
        self.schema
            .type_def(type_name)
            .ok_or_else(|| EngineError::unknown_type(type_name))
    }

    /// Queue the event; delivery proceeds asynchronously and never blocks
    /// the write's response
    fn publish(&self, event: ChangeEvent) {
        let event = match &self.client_id {
            Some(client_id) => event.with_source(client_id.clone()),
            None => event,
        };
        self.dispatcher.publish(event);
    }
}

/// Render an operation tree through a fresh environment into a statement
fn render(operation: &Operation) -> Statement {
    let mut env = Environment::new();
    let text = operation.render(&mut env);
    Statement::new(text, env.into_params())
}

fn entity_var(ty: &TypeDefinition) -> String {
    ty.name.to_lowercase()
}

fn match_entity(entity: &str, label: &str) -> Operation {
    Operation::Match {
        pattern: Box::new(node_pattern(entity, Some(label.to_string()))),
        optional: false,
    }
}

fn id_condition(entity: &str, id: &str) -> Operation {
    compare(
        Comparator::Eq,
        property(entity, "id"),
        parameter(format!("{}.id", entity), json!(id)),
    )
}

/// Extract the snapshot bound under `name` in the first row
fn bound_snapshot(rows: &[crate::store::Row], name: &str) -> Option<Snapshot> {
    rows.first()
        .and_then(|row| row.get(name))
        .and_then(snapshot::from_value)
}
