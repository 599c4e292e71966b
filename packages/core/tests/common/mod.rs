//! Shared test fixtures: a scripted store double and the film schema used
//! across the integration suites.

// Not every suite uses every helper.
#![allow(dead_code)]

use async_trait::async_trait;
use graphloom_core::models::{
    Direction, FieldDefinition, GraphSchema, RelationshipDefinition, ScalarType, TypeDefinition,
    TypeKind,
};
use graphloom_core::store::{GraphStore, Row, Statement, StoreError};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Mutex, Once};

static TRACING: Once = Once::new();

/// Install a test subscriber honoring `RUST_LOG`, once per process
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Scripted store double
///
/// Pops one pre-loaded response per executed statement (empty result set
/// once the script runs out) and records every statement for assertions.
#[derive(Default)]
pub struct MockStore {
    responses: Mutex<VecDeque<Result<Vec<Row>, StoreError>>>,
    executed: Mutex<Vec<Statement>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a result set of raw rows
    pub fn push_rows(&self, rows: Vec<Row>) {
        self.responses.lock().unwrap().push_back(Ok(rows));
    }

    /// Queue a single row binding `value` under the `node` alias
    pub fn push_node(&self, value: Value) {
        let mut row = Row::new();
        row.insert("node".to_string(), value);
        self.push_rows(vec![row]);
    }

    /// Queue an empty result set
    pub fn push_empty(&self) {
        self.push_rows(Vec::new());
    }

    /// Queue a failure
    pub fn push_error(&self, error: StoreError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Every statement executed so far, in order
    pub fn executed(&self) -> Vec<Statement> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl GraphStore for MockStore {
    async fn execute(&self, statement: Statement) -> Result<Vec<Row>, StoreError> {
        self.executed.lock().unwrap().push(statement);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// The film schema shared by the integration suites: movies, an interface
/// over the people involved, and salaried acting edges.
pub fn film_schema() -> GraphSchema {
    GraphSchema::new(vec![
        TypeDefinition {
            name: "Movie".to_string(),
            kind: TypeKind::Object,
            implements: vec![],
            fields: vec![
                FieldDefinition::new("title", ScalarType::String),
                FieldDefinition::new("length", ScalarType::Int),
                FieldDefinition::new("viewers", ScalarType::Int),
                FieldDefinition::new("views", ScalarType::BigInt),
                FieldDefinition::new("rating", ScalarType::Float),
            ],
            relationships: vec![
                RelationshipDefinition {
                    name: "actors".to_string(),
                    target: "Actor".to_string(),
                    direction: Direction::Out,
                    label: "ACTED_IN".to_string(),
                    edge_type: Some("ActedIn".to_string()),
                },
                RelationshipDefinition {
                    name: "people".to_string(),
                    target: "Person".to_string(),
                    direction: Direction::Out,
                    label: "INVOLVED_IN".to_string(),
                    edge_type: None,
                },
            ],
        },
        TypeDefinition {
            name: "Person".to_string(),
            kind: TypeKind::Interface,
            implements: vec![],
            fields: vec![
                FieldDefinition::new("name", ScalarType::String),
                FieldDefinition::new("age", ScalarType::Int),
            ],
            relationships: vec![],
        },
        TypeDefinition {
            name: "Actor".to_string(),
            kind: TypeKind::Object,
            implements: vec!["Person".to_string()],
            fields: vec![
                FieldDefinition::new("name", ScalarType::String),
                FieldDefinition::new("age", ScalarType::Int),
            ],
            relationships: vec![],
        },
        TypeDefinition {
            name: "Director".to_string(),
            kind: TypeKind::Object,
            implements: vec!["Person".to_string()],
            fields: vec![
                FieldDefinition::new("name", ScalarType::String),
                FieldDefinition::new("age", ScalarType::Int),
            ],
            relationships: vec![],
        },
        TypeDefinition {
            name: "ActedIn".to_string(),
            kind: TypeKind::Object,
            implements: vec![],
            fields: vec![
                FieldDefinition::new("pay", ScalarType::Float),
                FieldDefinition::new("screenTime", ScalarType::Int),
            ],
            relationships: vec![],
        },
    ])
}
