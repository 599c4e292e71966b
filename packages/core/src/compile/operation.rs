//! Operation Tree
//!
//! Composable query AST compiled to parameterized query text. Nodes form a
//! closed set of tagged variants (boolean, comparison, arithmetic, value,
//! pattern, and clause nodes) dispatched through exhaustive matching in
//! `render` and `children`.
//!
//! A tree is acyclic and exclusively owned top-down: every child has exactly
//! one parent, and combinators always construct new parent nodes rather than
//! mutating operands. Reusing a sub-expression in two places requires an
//! explicit `clone`. Nodes never change after construction; rendering is a
//! pure function of the tree plus the `Environment` it renders through.

use crate::compile::Environment;
use crate::models::Direction;
use serde_json::Value;

/// Comparison operators between two value-valued children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Comparator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::Ne => "<>",
            Comparator::Lt => "<",
            Comparator::Lte => "<=",
            Comparator::Gt => ">",
            Comparator::Gte => ">=",
        }
    }
}

/// Arithmetic operators between two value-valued children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithmeticOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Sub => "-",
            ArithmeticOp::Mul => "*",
            ArithmeticOp::Div => "/",
        }
    }
}

/// One node of the query AST
///
/// Value leaves reference entities by *logical identifier*; the concrete
/// variable name is allocated by the `Environment` at render time, so one
/// tree can be rendered through independent environments without
/// interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Boolean conjunction, renders `(<left> AND <right>)`
    And(Box<Operation>, Box<Operation>),
    /// Boolean disjunction, renders `(<left> OR <right>)`
    Or(Box<Operation>, Box<Operation>),
    /// Boolean negation, always the prefix keyword form `NOT <child>`
    Not(Box<Operation>),
    /// Comparison between two value children, renders `<left> <cmp> <right>`
    Comparison {
        cmp: Comparator,
        left: Box<Operation>,
        right: Box<Operation>,
    },
    /// Arithmetic between two value children, renders `<left> <op> <right>`
    Arithmetic {
        op: ArithmeticOp,
        left: Box<Operation>,
        right: Box<Operation>,
    },
    /// Bare entity variable reference
    Variable(String),
    /// Property access on an entity variable, renders `<var>.<field>`
    Property { entity: String, field: String },
    /// Parameter reference; allocates a token and binds the value
    Parameter { logical: String, value: Value },
    /// Inline literal value
    Literal(Value),
    /// Aliased item in a RETURN clause, renders `<item> AS <name>`
    Alias { item: Box<Operation>, name: String },
    /// Node pattern, renders `(<var>:<Label>)` or `(<var>)` when unlabeled
    NodePattern {
        entity: String,
        label: Option<String>,
    },
    /// Relationship pattern joining two node patterns through an edge
    RelationshipPattern {
        from: Box<Operation>,
        relationship: String,
        label: String,
        direction: Direction,
        to: Box<Operation>,
    },
    /// MATCH clause; `optional` renders `OPTIONAL MATCH`
    Match {
        pattern: Box<Operation>,
        optional: bool,
    },
    /// WHERE clause over one boolean-valued child
    Where(Box<Operation>),
    /// Single assignment inside a SET clause, renders `<target> = <value>`
    Assign {
        target: Box<Operation>,
        value: Box<Operation>,
    },
    /// SET clause over one or more assignments
    Set(Vec<Operation>),
    /// CREATE clause over a node pattern
    Create(Box<Operation>),
    /// DETACH DELETE of a bound entity variable
    Delete { entity: String },
    /// RETURN clause
    Return(Vec<Operation>),
    /// One ORDER BY item, renders `<item>` or `<item> DESC`
    Sort {
        item: Box<Operation>,
        descending: bool,
    },
    /// ORDER BY clause
    OrderBy(Vec<Operation>),
    /// LIMIT clause
    Limit(u64),
    /// Whole statement: clauses joined in order
    Statement(Vec<Operation>),
}

impl Operation {
    /// Render this node to query text through the environment
    pub fn render(&self, env: &mut Environment) -> String {
        match self {
            Operation::And(left, right) => {
                format!("({} AND {})", left.render(env), right.render(env))
            }
            Operation::Or(left, right) => {
                format!("({} OR {})", left.render(env), right.render(env))
            }
            Operation::Not(child) => format!("NOT {}", child.render(env)),
            Operation::Comparison { cmp, left, right } => format!(
                "{} {} {}",
                left.render(env),
                cmp.symbol(),
                right.render(env)
            ),
            Operation::Arithmetic { op, left, right } => format!(
                "{} {} {}",
                left.render(env),
                op.symbol(),
                right.render(env)
            ),
            Operation::Variable(logical) => env.variable(logical),
            Operation::Property { entity, field } => {
                format!("{}.{}", env.variable(entity), field)
            }
            Operation::Parameter { logical, value } => {
                format!("${}", env.parameter(logical, value))
            }
            Operation::Literal(value) => render_literal(value),
            Operation::Alias { item, name } => format!("{} AS {}", item.render(env), name),
            Operation::NodePattern { entity, label } => match label {
                Some(label) => format!("({}:{})", env.variable(entity), label),
                None => format!("({})", env.variable(entity)),
            },
            Operation::RelationshipPattern {
                from,
                relationship,
                label,
                direction,
                to,
            } => {
                let edge = format!("[{}:{}]", env.variable(relationship), label);
                match direction {
                    Direction::Out => {
                        format!("{}-{}->{}", from.render(env), edge, to.render(env))
                    }
                    Direction::In => {
                        format!("{}<-{}-{}", from.render(env), edge, to.render(env))
                    }
                }
            }
            Operation::Match { pattern, optional } => {
                if *optional {
                    format!("OPTIONAL MATCH {}", pattern.render(env))
                } else {
                    format!("MATCH {}", pattern.render(env))
                }
            }
            Operation::Where(condition) => format!("WHERE {}", condition.render(env)),
            Operation::Assign { target, value } => {
                format!("{} = {}", target.render(env), value.render(env))
            }
            Operation::Set(assignments) => format!("SET {}", render_list(assignments, env)),
            Operation::Create(pattern) => format!("CREATE {}", pattern.render(env)),
            Operation::Delete { entity } => format!("DETACH DELETE {}", env.variable(entity)),
            Operation::Return(items) => format!("RETURN {}", render_list(items, env)),
            Operation::Sort { item, descending } => {
                if *descending {
                    format!("{} DESC", item.render(env))
                } else {
                    item.render(env)
                }
            }
            Operation::OrderBy(items) => format!("ORDER BY {}", render_list(items, env)),
            Operation::Limit(count) => format!("LIMIT {}", count),
            Operation::Statement(clauses) => clauses
                .iter()
                .map(|clause| clause.render(env))
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// Direct children in render order, for pre-render passes
    pub fn children(&self) -> Vec<&Operation> {
        match self {
            Operation::And(left, right) | Operation::Or(left, right) => vec![left, right],
            Operation::Not(child) => vec![child],
            Operation::Comparison { left, right, .. }
            | Operation::Arithmetic { left, right, .. } => vec![left, right],
            Operation::Variable(_)
            | Operation::Property { .. }
            | Operation::Parameter { .. }
            | Operation::Literal(_)
            | Operation::NodePattern { .. }
            | Operation::Delete { .. }
            | Operation::Limit(_) => vec![],
            Operation::Alias { item, .. } => vec![item],
            Operation::RelationshipPattern { from, to, .. } => vec![from, to],
            Operation::Match { pattern, .. } => vec![pattern],
            Operation::Where(condition) => vec![condition],
            Operation::Assign { target, value } => vec![target, value],
            Operation::Create(pattern) => vec![pattern],
            Operation::Sort { item, .. } => vec![item],
            Operation::Set(items)
            | Operation::Return(items)
            | Operation::OrderBy(items)
            | Operation::Statement(items) => items.iter().collect(),
        }
    }
}

fn render_list(items: &[Operation], env: &mut Environment) -> String {
    items
        .iter()
        .map(|item| item.render(env))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render an inline literal in query-text syntax
///
/// Strings are single-quoted with quote and backslash escaping; everything
/// else follows JSON syntax.
fn render_literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
        Value::Array(items) => format!(
            "[{}]",
            items.iter().map(render_literal).collect::<Vec<_>>().join(", ")
        ),
        Value::Object(fields) => format!(
            "{{{}}}",
            fields
                .iter()
                .map(|(k, v)| format!("{}: {}", k, render_literal(v)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

// ========== Combinators ==========
//
// Bottom-up constructors; each takes its operands by value and owns them.

pub fn and(left: Operation, right: Operation) -> Operation {
    Operation::And(Box::new(left), Box::new(right))
}

pub fn or(left: Operation, right: Operation) -> Operation {
    Operation::Or(Box::new(left), Box::new(right))
}

pub fn not(child: Operation) -> Operation {
    Operation::Not(Box::new(child))
}

pub fn compare(cmp: Comparator, left: Operation, right: Operation) -> Operation {
    Operation::Comparison {
        cmp,
        left: Box::new(left),
        right: Box::new(right),
    }
}

pub fn arithmetic(op: ArithmeticOp, left: Operation, right: Operation) -> Operation {
    Operation::Arithmetic {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

pub fn property(entity: impl Into<String>, field: impl Into<String>) -> Operation {
    Operation::Property {
        entity: entity.into(),
        field: field.into(),
    }
}

pub fn parameter(logical: impl Into<String>, value: Value) -> Operation {
    Operation::Parameter {
        logical: logical.into(),
        value,
    }
}

pub fn assign(target: Operation, value: Operation) -> Operation {
    Operation::Assign {
        target: Box::new(target),
        value: Box::new(value),
    }
}

pub fn alias(item: Operation, name: impl Into<String>) -> Operation {
    Operation::Alias {
        item: Box::new(item),
        name: name.into(),
    }
}

pub fn node_pattern(entity: impl Into<String>, label: Option<String>) -> Operation {
    Operation::NodePattern {
        entity: entity.into(),
        label,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_boolean_composition_rendering() {
        let tree = and(
            compare(
                Comparator::Eq,
                property("movie", "title"),
                parameter("movie.title", json!("Jaws")),
            ),
            or(
                compare(
                    Comparator::Gt,
                    property("movie", "views"),
                    parameter("movie.views", json!(100)),
                ),
                not(compare(
                    Comparator::Eq,
                    property("movie", "rating"),
                    Operation::Literal(json!(0.0)),
                )),
            ),
        );

        let mut env = Environment::new();
        let text = tree.render(&mut env);
        assert_eq!(
            text,
            "(movie.title = $p0 AND (movie.views > $p1 OR NOT movie.rating = 0.0))"
        );
        assert_eq!(env.params().get("p0"), Some(&json!("Jaws")));
        assert_eq!(env.params().get("p1"), Some(&json!(100)));
    }

    #[test]
    fn test_not_is_prefix_keyword() {
        let tree = not(compare(
            Comparator::Eq,
            property("n", "deleted"),
            Operation::Literal(json!(true)),
        ));
        let mut env = Environment::new();
        assert_eq!(tree.render(&mut env), "NOT n.deleted = true");
    }

    #[test]
    fn test_statement_rendering() {
        let statement = Operation::Statement(vec![
            Operation::Match {
                pattern: Box::new(node_pattern("movie", Some("Movie".to_string()))),
                optional: false,
            },
            Operation::Where(Box::new(compare(
                Comparator::Eq,
                property("movie", "id"),
                parameter("movie.id", json!("m-1")),
            ))),
            Operation::Set(vec![assign(
                property("movie", "views"),
                arithmetic(
                    ArithmeticOp::Add,
                    property("movie", "views"),
                    parameter("movie.views#operand", json!(1)),
                ),
            )]),
            Operation::Return(vec![alias(Operation::Variable("movie".to_string()), "node")]),
        ]);

        let mut env = Environment::new();
        let text = statement.render(&mut env);
        assert_eq!(
            text,
            "MATCH (movie:Movie) WHERE movie.id = $p0 \
             SET movie.views = movie.views + $p1 RETURN movie AS node"
        );
        assert_eq!(env.params().len(), 2);
    }

    #[test]
    fn test_relationship_pattern_directions() {
        let out = Operation::RelationshipPattern {
            from: Box::new(node_pattern("movie", None)),
            relationship: "movie.actors#rel".to_string(),
            label: "ACTED_IN".to_string(),
            direction: Direction::Out,
            to: Box::new(node_pattern("movie.actors", Some("Actor".to_string()))),
        };
        let mut env = Environment::new();
        assert_eq!(
            out.render(&mut env),
            "(movie)-[movie_actors_rel:ACTED_IN]->(movie_actors:Actor)"
        );

        let inbound = Operation::RelationshipPattern {
            from: Box::new(node_pattern("movie", None)),
            relationship: "movie.actors#rel".to_string(),
            label: "ACTED_IN".to_string(),
            direction: Direction::In,
            to: Box::new(node_pattern("movie.actors", Some("Actor".to_string()))),
        };
        let mut env = Environment::new();
        assert_eq!(
            inbound.render(&mut env),
            "(movie)<-[movie_actors_rel:ACTED_IN]-(movie_actors:Actor)"
        );
    }

    #[test]
    fn test_rerender_through_fresh_environment_is_idempotent() {
        let tree = compare(
            Comparator::Lte,
            property("n", "length"),
            parameter("n.length", json!(120)),
        );

        let mut first_env = Environment::new();
        let first = tree.render(&mut first_env);

        // Pre-allocate names in the second environment so the same tree
        // resolves to different tokens.
        let mut second_env = Environment::new();
        second_env.variable("occupied");
        second_env.parameter("occupied", &json!(0));
        let second = tree.render(&mut second_env);

        assert_eq!(first, "n.length <= $p0");
        assert_eq!(second, "n.length <= $p1");
        // Structurally identical modulo allocated token names.
        assert_eq!(
            first.replace("$p0", "$?"),
            second.replace("$p1", "$?")
        );
        assert_eq!(second_env.params().get("p1"), Some(&json!(120)));
    }

    #[test]
    fn test_children_order() {
        let left = property("n", "a");
        let right = parameter("n.a", json!(1));
        let tree = compare(Comparator::Eq, left.clone(), right.clone());

        let children = tree.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0], &left);
        assert_eq!(children[1], &right);
        assert!(children[0].children().is_empty());
    }

    #[test]
    fn test_literal_string_escaping() {
        let mut env = Environment::new();
        let lit = Operation::Literal(json!("it's a 'quote'"));
        assert_eq!(lit.render(&mut env), "'it\\'s a \\'quote\\''");
    }

    #[test]
    fn test_combinators_do_not_mutate_operands() {
        let shared = compare(
            Comparator::Eq,
            property("n", "status"),
            Operation::Literal(json!("open")),
        );
        // Each reuse wraps a fresh clone; the template survives intact.
        let a = not(shared.clone());
        let b = and(shared.clone(), Operation::Literal(json!(true)));

        let mut env = Environment::new();
        assert_eq!(shared.render(&mut env), "n.status = 'open'");
        assert_eq!(a.render(&mut env), "NOT n.status = 'open'");
        assert_eq!(b.render(&mut env), "(n.status = 'open' AND true)");
    }
}
