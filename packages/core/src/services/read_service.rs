//! Read Service - Query Execution with Tree Compilation
//!
//! Translates structured read definitions into parameterized query text
//! through the same operation tree the mutation path uses, and executes
//! against the store.
//!
//! # Query Pattern Examples
//!
//! - Type scan: `MATCH (movie:Movie) RETURN movie AS node`
//! - Filtered: `MATCH (movie:Movie) WHERE movie.rating >= $p0 RETURN movie AS node`
//! - Sorted page: `... RETURN movie AS node ORDER BY movie.title LIMIT 50`

use crate::compile::{
    alias, and, compare, node_pattern, parameter, property, Comparator, Environment, Operation,
};
use crate::models::{snapshot, GraphSchema, Snapshot};
use crate::store::{GraphStore, Statement};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Structured read definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadDefinition {
    /// Target type name
    pub target_type: String,
    /// Filter conditions, AND-combined
    pub filters: Vec<ReadFilter>,
    /// Optional sorting configuration
    pub sorting: Option<Vec<SortConfig>>,
    /// Optional result limit
    pub limit: Option<u64>,
}

/// Comparison operator for filters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    Equals,
    #[serde(rename = "ne")]
    NotEquals,
    #[serde(rename = "gt")]
    GreaterThan,
    #[serde(rename = "lt")]
    LessThan,
    #[serde(rename = "gte")]
    GreaterThanOrEqual,
    #[serde(rename = "lte")]
    LessThanOrEqual,
}

impl FilterOperator {
    fn comparator(&self) -> Comparator {
        match self {
            FilterOperator::Equals => Comparator::Eq,
            FilterOperator::NotEquals => Comparator::Ne,
            FilterOperator::GreaterThan => Comparator::Gt,
            FilterOperator::LessThan => Comparator::Lt,
            FilterOperator::GreaterThanOrEqual => Comparator::Gte,
            FilterOperator::LessThanOrEqual => Comparator::Lte,
        }
    }
}

/// Individual filter condition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadFilter {
    /// Field to compare
    pub field: String,
    /// Comparison operator
    pub operator: FilterOperator,
    /// Expected value, bound as a parameter
    pub value: Value,
}

/// Sort direction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

/// Sorting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortConfig {
    /// Field to sort by
    pub field: String,
    /// Sort direction
    pub direction: SortDirection,
}

/// Service for executing reads against the store
pub struct ReadService {
    store: Arc<dyn GraphStore>,
    schema: Arc<GraphSchema>,
}

impl ReadService {
    /// Create a new ReadService
    pub fn new(store: Arc<dyn GraphStore>, schema: Arc<GraphSchema>) -> Self {
        Self { store, schema }
    }

    /// Execute a read and return matching snapshots
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The definition references an unknown type or field
    /// - Statement execution fails
    pub async fn execute(&self, definition: &ReadDefinition) -> Result<Vec<Snapshot>> {
        let operation = self.build_query(definition)?;

        let mut env = Environment::new();
        let text = operation.render(&mut env);
        let rows = self
            .store
            .execute(Statement::new(text, env.into_params()))
            .await
            .context("Failed to execute read statement")?;

        Ok(rows
            .iter()
            .filter_map(|row| row.get("node"))
            .filter_map(snapshot::from_value)
            .collect())
    }

    /// Compile a read definition into an operation tree
    fn build_query(&self, definition: &ReadDefinition) -> Result<Operation> {
        let ty = self
            .schema
            .type_def(&definition.target_type)
            .with_context(|| format!("Unknown type: {}", definition.target_type))?;
        let entity = ty.name.to_lowercase();

        let mut clauses = vec![Operation::Match {
            pattern: Box::new(node_pattern(entity.clone(), Some(ty.name.clone()))),
            optional: false,
        }];

        let mut condition: Option<Operation> = None;
        for (index, filter) in definition.filters.iter().enumerate() {
            if ty.field(&filter.field).is_none() && filter.field != "id" {
                anyhow::bail!(
                    "Type '{}' has no field '{}'",
                    definition.target_type,
                    filter.field
                );
            }
            let comparison = compare(
                filter.operator.comparator(),
                property(entity.clone(), filter.field.clone()),
                parameter(
                    format!("{}.{}#filter{}", entity, filter.field, index),
                    filter.value.clone(),
                ),
            );
            condition = Some(match condition {
                Some(joined) => and(joined, comparison),
                None => comparison,
            });
        }
        if let Some(condition) = condition {
            clauses.push(Operation::Where(Box::new(condition)));
        }

        clauses.push(Operation::Return(vec![alias(
            Operation::Variable(entity.clone()),
            "node",
        )]));

        if let Some(sorting) = &definition.sorting {
            if !sorting.is_empty() {
                let items = sorting
                    .iter()
                    .map(|sort| {
                        if ty.field(&sort.field).is_none() && sort.field != "id" {
                            anyhow::bail!(
                                "Type '{}' has no field '{}'",
                                definition.target_type,
                                sort.field
                            );
                        }
                        Ok(Operation::Sort {
                            item: Box::new(property(entity.clone(), sort.field.clone())),
                            descending: sort.direction == SortDirection::Descending,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                clauses.push(Operation::OrderBy(items));
            }
        }

        if let Some(limit) = definition.limit {
            clauses.push(Operation::Limit(limit));
        }

        Ok(Operation::Statement(clauses))
    }
}
