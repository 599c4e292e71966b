//! Graph Schema Metadata
//!
//! This module contains the schema metadata injected by the schema collaborator.
//! The engine never parses the declarative schema language itself; it receives,
//! per declared type, the field list with scalar types and permitted update
//! operators, and the relationship list with target type, direction, and an
//! optional edge-property type.
//!
//! ## Example Type Definition
//!
//! ```json
//! {
//!   "name": "Movie",
//!   "kind": "object",
//!   "fields": [
//!     { "name": "title", "type": "string" },
//!     { "name": "views", "type": "bigint" },
//!     { "name": "rating", "type": "float" }
//!   ],
//!   "relationships": [
//!     { "name": "actors", "target": "Actor", "direction": "out",
//!       "label": "ACTED_IN", "edgeType": "ActedIn" }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Scalar types a field can be declared with
///
/// `Int` is checked against the signed 32-bit range, `BigInt` against the
/// signed 64-bit range (or a narrower store-configured bound), `Float` follows
/// IEEE-754 double semantics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Id,
    String,
    Boolean,
    Int,
    #[serde(rename = "bigint")]
    BigInt,
    Float,
}

impl ScalarType {
    /// Update operators this scalar type accepts by default
    ///
    /// Increment/Decrement apply to the integer types, Add/Subtract/Multiply/
    /// Divide to floats. Every type accepts a direct set.
    pub fn default_operators(&self) -> &'static [UpdateOperator] {
        match self {
            ScalarType::Int | ScalarType::BigInt => &[
                UpdateOperator::Set,
                UpdateOperator::Increment,
                UpdateOperator::Decrement,
            ],
            ScalarType::Float => &[
                UpdateOperator::Set,
                UpdateOperator::Add,
                UpdateOperator::Subtract,
                UpdateOperator::Multiply,
                UpdateOperator::Divide,
            ],
            ScalarType::Id | ScalarType::String | ScalarType::Boolean => &[UpdateOperator::Set],
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarType::Id => "id",
            ScalarType::String => "string",
            ScalarType::Boolean => "boolean",
            ScalarType::Int => "int",
            ScalarType::BigInt => "bigint",
            ScalarType::Float => "float",
        };
        write!(f, "{}", name)
    }
}

/// Scalar field update operators exposed to clients
///
/// Clients select an operator through the field-key suffix vocabulary
/// (`views_INCREMENT`, `rating_DIVIDE`, ...); a bare field name is a direct
/// set. At most one operator may target a field per request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UpdateOperator {
    Set,
    Increment,
    Decrement,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl UpdateOperator {
    /// Whether this operator reads the field's current value
    pub fn is_arithmetic(&self) -> bool {
        !matches!(self, UpdateOperator::Set)
    }
}

impl fmt::Display for UpdateOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpdateOperator::Set => "set",
            UpdateOperator::Increment => "increment",
            UpdateOperator::Decrement => "decrement",
            UpdateOperator::Add => "add",
            UpdateOperator::Subtract => "subtract",
            UpdateOperator::Multiply => "multiply",
            UpdateOperator::Divide => "divide",
        };
        write!(f, "{}", name)
    }
}

/// Traversal direction of a relationship, viewed from the declaring type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Out,
    In,
}

/// Definition of a single scalar field in a type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Field name (must be unique within the type)
    pub name: String,

    /// Declared scalar type
    #[serde(rename = "type")]
    pub scalar: ScalarType,

    /// Operators this field accepts; `None` means the scalar type's defaults
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operators: Option<Vec<UpdateOperator>>,
}

impl FieldDefinition {
    /// Create a field accepting its scalar type's default operators
    pub fn new(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self {
            name: name.into(),
            scalar,
            operators: None,
        }
    }

    /// Whether the given operator is permitted on this field
    pub fn accepts(&self, operator: UpdateOperator) -> bool {
        match &self.operators {
            Some(ops) => ops.contains(&operator),
            None => self.scalar.default_operators().contains(&operator),
        }
    }
}

/// Definition of a relationship from one type to another
///
/// `target` may name an object type or an interface; interface-typed
/// relationships fan out to the implementing types during update traversal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipDefinition {
    /// Relationship name as exposed to clients
    pub name: String,

    /// Target type or interface name
    pub target: String,

    /// Traversal direction from the declaring type
    pub direction: Direction,

    /// Store-level relationship label
    pub label: String,

    /// Optional edge-property type; its fields are updatable under an
    /// `edge` block nested inside the relationship update block
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<String>,
}

/// Whether a type definition describes an object type or an interface
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    #[default]
    Object,
    Interface,
}

/// Complete definition of a declared type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDefinition {
    /// Type name as exposed to clients and used as the store label
    pub name: String,

    /// Object type or interface
    #[serde(default)]
    pub kind: TypeKind,

    /// Interfaces this object type implements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implements: Vec<String>,

    /// Scalar fields
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,

    /// Relationships to other types
    #[serde(default)]
    pub relationships: Vec<RelationshipDefinition>,
}

impl TypeDefinition {
    /// Get a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Get a relationship by name
    pub fn relationship(&self, name: &str) -> Option<&RelationshipDefinition> {
        self.relationships.iter().find(|r| r.name == name)
    }
}

/// The full schema injected per request
///
/// Holds every declared type keyed by name and answers the lookups the
/// compilation core needs: type resolution, interface checks, and the set of
/// object types implementing an interface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSchema {
    types: HashMap<String, TypeDefinition>,
}

impl GraphSchema {
    /// Build a schema from a list of type definitions
    pub fn new(types: Vec<TypeDefinition>) -> Self {
        Self {
            types: types.into_iter().map(|t| (t.name.clone(), t)).collect(),
        }
    }

    /// Look up a type definition by name
    pub fn type_def(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    /// Whether the named type is an interface
    pub fn is_interface(&self, name: &str) -> bool {
        self.types
            .get(name)
            .map(|t| t.kind == TypeKind::Interface)
            .unwrap_or(false)
    }

    /// Object types implementing the named interface, sorted by name
    ///
    /// Sorted so that fan-out over implementing types is deterministic.
    pub fn implementers(&self, interface: &str) -> Vec<&TypeDefinition> {
        let mut found: Vec<&TypeDefinition> = self
            .types
            .values()
            .filter(|t| t.kind == TypeKind::Object && t.implements.iter().any(|i| i == interface))
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie_schema() -> GraphSchema {
        GraphSchema::new(vec![
            TypeDefinition {
                name: "Movie".to_string(),
                kind: TypeKind::Object,
                implements: vec![],
                fields: vec![
                    FieldDefinition::new("title", ScalarType::String),
                    FieldDefinition::new("views", ScalarType::BigInt),
                    FieldDefinition::new("rating", ScalarType::Float),
                ],
                relationships: vec![RelationshipDefinition {
                    name: "people".to_string(),
                    target: "Person".to_string(),
                    direction: Direction::Out,
                    label: "INVOLVED_IN".to_string(),
                    edge_type: None,
                }],
            },
            TypeDefinition {
                name: "Person".to_string(),
                kind: TypeKind::Interface,
                implements: vec![],
                fields: vec![FieldDefinition::new("name", ScalarType::String)],
                relationships: vec![],
            },
            TypeDefinition {
                name: "Actor".to_string(),
                kind: TypeKind::Object,
                implements: vec!["Person".to_string()],
                fields: vec![FieldDefinition::new("name", ScalarType::String)],
                relationships: vec![],
            },
            TypeDefinition {
                name: "Director".to_string(),
                kind: TypeKind::Object,
                implements: vec!["Person".to_string()],
                fields: vec![FieldDefinition::new("name", ScalarType::String)],
                relationships: vec![],
            },
        ])
    }

    #[test]
    fn test_field_and_relationship_lookup() {
        let schema = movie_schema();
        let movie = schema.type_def("Movie").unwrap();

        assert_eq!(movie.field("views").unwrap().scalar, ScalarType::BigInt);
        assert!(movie.field("nonexistent").is_none());
        assert_eq!(movie.relationship("people").unwrap().label, "INVOLVED_IN");
        assert!(movie.relationship("nonexistent").is_none());
    }

    #[test]
    fn test_default_operator_acceptance() {
        let views = FieldDefinition::new("views", ScalarType::BigInt);
        assert!(views.accepts(UpdateOperator::Set));
        assert!(views.accepts(UpdateOperator::Increment));
        assert!(!views.accepts(UpdateOperator::Divide));

        let rating = FieldDefinition::new("rating", ScalarType::Float);
        assert!(rating.accepts(UpdateOperator::Divide));
        assert!(!rating.accepts(UpdateOperator::Increment));

        let title = FieldDefinition::new("title", ScalarType::String);
        assert!(title.accepts(UpdateOperator::Set));
        assert!(!title.accepts(UpdateOperator::Add));
    }

    #[test]
    fn test_explicit_operator_restriction() {
        let field = FieldDefinition {
            name: "views".to_string(),
            scalar: ScalarType::BigInt,
            operators: Some(vec![UpdateOperator::Set, UpdateOperator::Increment]),
        };
        assert!(field.accepts(UpdateOperator::Increment));
        assert!(!field.accepts(UpdateOperator::Decrement));
    }

    #[test]
    fn test_implementers_sorted_and_filtered() {
        let schema = movie_schema();
        assert!(schema.is_interface("Person"));
        assert!(!schema.is_interface("Movie"));

        let implementers: Vec<&str> = schema
            .implementers("Person")
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(implementers, vec!["Actor", "Director"]);
        assert!(schema.implementers("Movie").is_empty());
    }

    #[test]
    fn test_deserialization() {
        let json = serde_json::json!({
            "name": "Movie",
            "fields": [
                { "name": "title", "type": "string" },
                { "name": "views", "type": "bigint" }
            ],
            "relationships": [
                { "name": "actors", "target": "Actor", "direction": "out",
                  "label": "ACTED_IN", "edgeType": "ActedIn" }
            ]
        });

        let ty: TypeDefinition = serde_json::from_value(json).unwrap();
        assert_eq!(ty.kind, TypeKind::Object);
        assert_eq!(ty.fields[1].scalar, ScalarType::BigInt);
        assert_eq!(ty.relationships[0].edge_type.as_deref(), Some("ActedIn"));
    }
}
