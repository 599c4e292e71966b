//! Rendering Environment
//!
//! One `Environment` exists per top-level render pass. It allocates the
//! textual variable names and parameter tokens an operation tree renders
//! with, and owns the parameter map handed to the store together with the
//! rendered text.
//!
//! Allocation is stable within a pass: the same logical identifier always
//! resolves to the same token, and distinct logical identifiers never
//! collide. A fresh pass over the same tree may allocate different names,
//! which is fine because text and parameters are always consumed as a pair.

use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

/// Mutable rendering context for one compilation pass
#[derive(Debug, Default)]
pub struct Environment {
    /// Logical identifier -> allocated variable name
    names: HashMap<String, String>,
    /// Every variable name handed out so far
    used_names: HashSet<String>,
    /// Logical identifier -> allocated parameter token
    tokens: HashMap<String, String>,
    /// Parameter token -> bound value, consumed with the rendered text
    params: Map<String, Value>,
    /// Scope segments for nested traversal hops
    scopes: Vec<String>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a logical identifier to its variable name, allocating on
    /// first use
    ///
    /// The name is derived from the identifier for readable query text; a
    /// numeric suffix disambiguates when two identifiers sanitize to the
    /// same candidate.
    pub fn variable(&mut self, logical: &str) -> String {
        if let Some(name) = self.names.get(logical) {
            return name.clone();
        }
        let base = sanitize(logical);
        let mut candidate = base.clone();
        let mut suffix = 1;
        while self.used_names.contains(&candidate) {
            candidate = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        self.names.insert(logical.to_string(), candidate.clone());
        self.used_names.insert(candidate.clone());
        candidate
    }

    /// Resolve a logical identifier to its parameter token, binding `value`
    /// on first use
    ///
    /// Tokens are unique across the whole pass. A logical identifier binds
    /// exactly one value per pass; later calls with the same identifier
    /// return the original token and keep the original value.
    pub fn parameter(&mut self, logical: &str, value: &Value) -> String {
        if let Some(token) = self.tokens.get(logical) {
            return token.clone();
        }
        let token = format!("p{}", self.params.len());
        self.tokens.insert(logical.to_string(), token.clone());
        self.params.insert(token.clone(), value.clone());
        token
    }

    /// Enter a nested traversal scope
    pub fn push_scope(&mut self, segment: impl Into<String>) {
        self.scopes.push(segment.into());
    }

    /// Leave the innermost scope
    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Qualify a name with the current scope path
    pub fn scoped(&self, name: &str) -> String {
        if self.scopes.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.scopes.join("."), name)
        }
    }

    /// Parameters allocated so far
    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Consume the environment, yielding the parameter map for execution
    pub fn into_params(self) -> Map<String, Value> {
        self.params
    }
}

/// Reduce a logical identifier to a bare identifier usable in query text
fn sanitize(logical: &str) -> String {
    let mut out = String::with_capacity(logical.len());
    for c in logical.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else {
            out.push('_');
        }
    }
    if out.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(true) {
        out.insert(0, 'v');
    }
    out
}
