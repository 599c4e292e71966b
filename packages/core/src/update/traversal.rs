//! Update Traversal
//!
//! Walks a nested mutation input depth-first and assembles the single
//! operation tree for the whole request: direct scalar updates on the root
//! entity, relationship `update` blocks joining the current entity to the
//! related one, `edge` blocks updating relationship properties, and
//! interface-typed targets. A bare `update` under an interface-typed
//! relationship applies uniformly to every implementing type; a per-type
//! `on` block applies only to matching labels.
//!
//! Scalar updates within one request are logically simultaneous: every
//! arithmetic check runs against the pre-request snapshots, so no field's
//! update can feed another's inputs. A failure in any nested branch aborts
//! the entire request; errors are collected across all branches so the
//! response can carry one error per violated constraint.

use crate::compile::{alias, compare, node_pattern, parameter, property, Comparator, Operation};
use crate::models::{GraphSchema, RelationshipDefinition, Snapshot, TypeDefinition};
use crate::store::StoreLimits;
use crate::update::{collect_field_updates, OperatorResolver, UpdateError};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Reserved keys inside a relationship update block
const BLOCK_UPDATE: &str = "update";
const BLOCK_EDGE: &str = "edge";
const BLOCK_ON: &str = "on";

/// Scope-key suffix under which edge-property snapshots are stored
pub const EDGE_SCOPE_SUFFIX: &str = "#edge";

/// Return-item names used by hop-read statements
pub const HOP_TARGET_ALIAS: &str = "target";
pub const HOP_EDGE_ALIAS: &str = "edge";

/// Pre-request snapshots of every entity bound at each traversal scope
///
/// Keyed by scope path: `""` for the root entity, `"actors"` for a hop,
/// `"actors|Actor"` for a per-implementing-type branch, `"actors#edge"` for
/// a hop's edge properties. A hop bound to several related entities holds
/// one snapshot per entity.
pub type ScopeSnapshots = HashMap<String, Vec<Snapshot>>;

/// One compiled read fetching the current state of a traversal hop
///
/// The statement binds the hop's target entity as [`HOP_TARGET_ALIAS`] and,
/// when `has_edge` is set, the relationship's properties as
/// [`HOP_EDGE_ALIAS`].
#[derive(Debug, Clone)]
pub struct HopRead {
    pub scope: String,
    pub operation: Operation,
    pub has_edge: bool,
}

/// Walks mutation input and builds the combined operation tree
pub struct UpdateTraversal<'a> {
    schema: &'a GraphSchema,
    limits: &'a StoreLimits,
}

struct Walk<'w> {
    snapshots: &'w ScopeSnapshots,
    /// Root MATCH + WHERE, prefixed to every hop read
    root_clauses: Vec<Operation>,
    /// Ancestor relationship patterns on the way to the current hop
    chain: Vec<Operation>,
    matches: Vec<Operation>,
    assignments: Vec<Operation>,
    hop_reads: Vec<HopRead>,
    errors: Vec<UpdateError>,
}

impl<'a> UpdateTraversal<'a> {
    pub fn new(schema: &'a GraphSchema, limits: &'a StoreLimits) -> Self {
        Self { schema, limits }
    }

    /// Plan the reads that fetch current state for every touched hop
    ///
    /// Runs the same walk as [`compile`](Self::compile) without snapshots, so
    /// structural violations (ambiguity, unknown fields, operand problems)
    /// abort the request before any store round-trip.
    pub fn plan_hop_reads(
        &self,
        type_name: &str,
        id: &Value,
        input: &Map<String, Value>,
    ) -> Result<Vec<HopRead>, Vec<UpdateError>> {
        let snapshots = ScopeSnapshots::new();
        let (ty, mut walk) = self.start_walk(type_name, id, &snapshots)?;
        self.walk(ty, &root_entity(ty), "", input, &mut walk);

        if walk.errors.is_empty() {
            Ok(walk.hop_reads)
        } else {
            Err(walk.errors)
        }
    }

    /// Compile the whole mutation into one statement
    ///
    /// `snapshots` must hold the root entity under scope `""` plus every hop
    /// fetched through [`plan_hop_reads`](Self::plan_hop_reads); arithmetic
    /// checks run against them before the statement is produced.
    pub fn compile(
        &self,
        type_name: &str,
        id: &Value,
        input: &Map<String, Value>,
        snapshots: &ScopeSnapshots,
    ) -> Result<Operation, Vec<UpdateError>> {
        let (ty, mut walk) = self.start_walk(type_name, id, snapshots)?;
        let entity = root_entity(ty);
        self.walk(ty, &entity, "", input, &mut walk);

        if !walk.errors.is_empty() {
            return Err(walk.errors);
        }

        let mut clauses = walk.root_clauses;
        clauses.append(&mut walk.matches);
        if !walk.assignments.is_empty() {
            clauses.push(Operation::Set(walk.assignments));
        }
        clauses.push(Operation::Return(vec![alias(
            Operation::Variable(entity),
            "node",
        )]));
        Ok(Operation::Statement(clauses))
    }

    fn start_walk<'w>(
        &self,
        type_name: &str,
        id: &Value,
        snapshots: &'w ScopeSnapshots,
    ) -> Result<(&'a TypeDefinition, Walk<'w>), Vec<UpdateError>> {
        let ty = self
            .schema
            .type_def(type_name)
            .ok_or_else(|| vec![UpdateError::unknown_type(type_name)])?;
        let entity = root_entity(ty);

        let root_clauses = vec![
            Operation::Match {
                pattern: Box::new(node_pattern(entity.clone(), Some(ty.name.clone()))),
                optional: false,
            },
            Operation::Where(Box::new(compare(
                Comparator::Eq,
                property(entity.clone(), "id"),
                parameter(format!("{}.id", entity), id.clone()),
            ))),
        ];

        Ok((
            ty,
            Walk {
                snapshots,
                root_clauses,
                chain: Vec::new(),
                matches: Vec::new(),
                assignments: Vec::new(),
                hop_reads: Vec::new(),
                errors: Vec::new(),
            },
        ))
    }

    fn walk(
        &self,
        ty: &TypeDefinition,
        entity: &str,
        scope: &str,
        input: &Map<String, Value>,
        walk: &mut Walk<'_>,
    ) {
        let mut scalars = Map::new();
        let mut relationships = Vec::new();
        for (key, value) in input {
            match ty.relationship(key) {
                Some(rel) => relationships.push((rel, value)),
                None => {
                    scalars.insert(key.clone(), value.clone());
                }
            }
        }

        self.resolve_scalars(ty, entity, scope, &scalars, walk);

        for (rel, value) in relationships {
            let Some(block) = value.as_object() else {
                walk.errors.push(UpdateError::invalid_operand(
                    &rel.name,
                    "expected a relationship update block",
                ));
                continue;
            };
            for key in block.keys() {
                if !matches!(key.as_str(), BLOCK_UPDATE | BLOCK_EDGE | BLOCK_ON) {
                    walk.errors.push(UpdateError::invalid_operand(
                        &rel.name,
                        format!("unexpected entry '{}' in relationship block", key),
                    ));
                }
            }

            let Some(target) = self.schema.type_def(&rel.target) else {
                walk.errors.push(UpdateError::unknown_type(&rel.target));
                continue;
            };
            let target_is_interface = self.schema.is_interface(&rel.target);

            let child_entity = format!("{}.{}", entity, rel.name);
            let child_scope = if scope.is_empty() {
                rel.name.clone()
            } else {
                format!("{}.{}", scope, rel.name)
            };

            let update_block = block.get(BLOCK_UPDATE);
            let edge_block = block.get(BLOCK_EDGE);
            let on_block = block.get(BLOCK_ON);
            if update_block.is_none() && edge_block.is_none() && on_block.is_none() {
                walk.errors.push(UpdateError::invalid_operand(
                    &rel.name,
                    "relationship block has no update, edge, or on entry",
                ));
                continue;
            }

            // Uniform hop: carries the bare update block (applying to the
            // interface label as a whole) and any edge-property updates.
            if update_block.is_some() || edge_block.is_some() {
                let rel_var = format!("{}#rel", child_entity);
                let pattern = Operation::RelationshipPattern {
                    from: Box::new(node_pattern(entity, None)),
                    relationship: rel_var.clone(),
                    label: rel.label.clone(),
                    direction: rel.direction,
                    to: Box::new(node_pattern(child_entity.clone(), Some(target.name.clone()))),
                };
                walk.matches.push(Operation::Match {
                    pattern: Box::new(pattern.clone()),
                    optional: true,
                });
                self.push_hop_read(
                    walk,
                    &child_scope,
                    &pattern,
                    &child_entity,
                    edge_block.map(|_| rel_var.clone()),
                );

                if let Some(update_value) = update_block {
                    match update_value.as_object() {
                        Some(update_map) => {
                            walk.chain.push(pattern.clone());
                            self.walk(target, &child_entity, &child_scope, update_map, walk);
                            walk.chain.pop();
                        }
                        None => walk.errors.push(UpdateError::invalid_operand(
                            &rel.name,
                            "expected an object under 'update'",
                        )),
                    }
                }

                if let Some(edge_value) = edge_block {
                    self.resolve_edge(rel, &rel_var, &child_scope, edge_value, walk);
                }
            }

            if let Some(on_value) = on_block {
                if !target_is_interface {
                    walk.errors.push(UpdateError::invalid_operand(
                        &rel.name,
                        "per-type blocks require an interface-typed relationship",
                    ));
                    continue;
                }
                let Some(on_map) = on_value.as_object() else {
                    walk.errors.push(UpdateError::invalid_operand(
                        &rel.name,
                        "expected an object under 'on'",
                    ));
                    continue;
                };
                for (impl_name, sub_value) in on_map {
                    self.walk_on_branch(
                        rel, target, entity, &child_entity, &child_scope, impl_name, sub_value,
                        walk,
                    );
                }
            }
        }
    }

    /// One per-implementing-type branch of an interface-typed hop
    #[allow(clippy::too_many_arguments)]
    fn walk_on_branch(
        &self,
        rel: &RelationshipDefinition,
        interface: &TypeDefinition,
        entity: &str,
        child_entity: &str,
        child_scope: &str,
        impl_name: &str,
        sub_value: &Value,
        walk: &mut Walk<'_>,
    ) {
        let Some(concrete) = self.schema.type_def(impl_name) else {
            walk.errors.push(UpdateError::unknown_type(impl_name));
            return;
        };
        if !concrete.implements.iter().any(|i| i == &interface.name) {
            walk.errors
                .push(UpdateError::not_an_implementer(impl_name, &interface.name));
            return;
        }
        let Some(sub_map) = sub_value.as_object() else {
            walk.errors.push(UpdateError::invalid_operand(
                &rel.name,
                format!("expected an object under 'on.{}'", impl_name),
            ));
            return;
        };

        let branch_entity = format!("{}:{}", child_entity, impl_name);
        let branch_scope = format!("{}|{}", child_scope, impl_name);
        let pattern = Operation::RelationshipPattern {
            from: Box::new(node_pattern(entity, None)),
            relationship: format!("{}#rel", branch_entity),
            label: rel.label.clone(),
            direction: rel.direction,
            to: Box::new(node_pattern(branch_entity.clone(), Some(impl_name.to_string()))),
        };
        walk.matches.push(Operation::Match {
            pattern: Box::new(pattern.clone()),
            optional: true,
        });
        self.push_hop_read(walk, &branch_scope, &pattern, &branch_entity, None);

        walk.chain.push(pattern);
        self.walk(concrete, &branch_entity, &branch_scope, sub_map, walk);
        walk.chain.pop();
    }

    /// Resolve an `edge` block against the relationship's edge-property type
    fn resolve_edge(
        &self,
        rel: &RelationshipDefinition,
        rel_var: &str,
        child_scope: &str,
        edge_value: &Value,
        walk: &mut Walk<'_>,
    ) {
        let Some(edge_type_name) = rel.edge_type.as_deref() else {
            walk.errors.push(UpdateError::invalid_operand(
                &rel.name,
                "relationship has no edge properties",
            ));
            return;
        };
        let Some(edge_ty) = self.schema.type_def(edge_type_name) else {
            walk.errors.push(UpdateError::unknown_type(edge_type_name));
            return;
        };
        let Some(edge_map) = edge_value.as_object() else {
            walk.errors.push(UpdateError::invalid_operand(
                &rel.name,
                "expected an object under 'edge'",
            ));
            return;
        };

        let edge_scope = format!("{}{}", child_scope, EDGE_SCOPE_SUFFIX);
        self.resolve_scalars(edge_ty, rel_var, &edge_scope, edge_map, walk);
    }

    /// Resolve direct scalar entries at one scope into SET assignments
    fn resolve_scalars(
        &self,
        ty: &TypeDefinition,
        entity: &str,
        scope: &str,
        entries: &Map<String, Value>,
        walk: &mut Walk<'_>,
    ) {
        if entries.is_empty() {
            return;
        }
        let updates = collect_field_updates(ty, entries, &mut walk.errors);
        let resolver = OperatorResolver::new(self.limits);
        let empty = Vec::new();
        let current = walk.snapshots.get(scope).unwrap_or(&empty);

        for update in &updates {
            // Unknown fields were already filtered out with their own errors.
            let Some(field) = ty.field(&update.field) else {
                continue;
            };
            match resolver.resolve(entity, update, field, current) {
                Ok(assignment) => walk.assignments.push(assignment),
                Err(err) => walk.errors.push(err),
            }
        }
    }

    /// Emit the read statement fetching the current state of one hop
    fn push_hop_read(
        &self,
        walk: &mut Walk<'_>,
        scope: &str,
        pattern: &Operation,
        target_entity: &str,
        edge_var: Option<String>,
    ) {
        let mut clauses = walk.root_clauses.clone();
        for ancestor in &walk.chain {
            clauses.push(Operation::Match {
                pattern: Box::new(ancestor.clone()),
                optional: false,
            });
        }
        clauses.push(Operation::Match {
            pattern: Box::new(pattern.clone()),
            optional: false,
        });

        let mut items = vec![alias(
            Operation::Variable(target_entity.to_string()),
            HOP_TARGET_ALIAS,
        )];
        let has_edge = edge_var.is_some();
        if let Some(rel_var) = edge_var {
            items.push(alias(Operation::Variable(rel_var), HOP_EDGE_ALIAS));
        }
        clauses.push(Operation::Return(items));

        walk.hop_reads.push(HopRead {
            scope: scope.to_string(),
            operation: Operation::Statement(clauses),
            has_edge,
        });
    }
}

/// Logical identifier of the root entity variable
fn root_entity(ty: &TypeDefinition) -> String {
    ty.name.to_lowercase()
}
