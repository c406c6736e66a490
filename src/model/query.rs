//! Selectors and conjunctive queries.

use crate::core::error::RegistryResult;
use crate::model::label::Relation;
use serde::{Deserialize, Serialize};

/// One clause of a query: `label_key <relation> literal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    pub label_key: String,
    pub relation: Relation,
    pub literal: String,
}

impl Selector {
    pub fn new(label_key: impl Into<String>, relation: Relation, literal: impl Into<String>) -> Self {
        Self {
            label_key: label_key.into(),
            relation,
            literal: literal.into(),
        }
    }

    /// Build a selector from its wire form, e.g. `("tier", ">", "2")`.
    pub fn parse(label_key: &str, relation: &str, literal: &str) -> RegistryResult<Self> {
        Ok(Self::new(label_key, relation.parse()?, literal))
    }

    pub fn eq(label_key: impl Into<String>, literal: impl Into<String>) -> Self {
        Self::new(label_key, Relation::Eq, literal)
    }

    pub fn neq(label_key: impl Into<String>, literal: impl Into<String>) -> Self {
        Self::new(label_key, Relation::Neq, literal)
    }

    pub fn gt(label_key: impl Into<String>, literal: impl Into<String>) -> Self {
        Self::new(label_key, Relation::Gt, literal)
    }

    pub fn lt(label_key: impl Into<String>, literal: impl Into<String>) -> Self {
        Self::new(label_key, Relation::Lt, literal)
    }
}

/// Ordered AND of selectors. An empty query matches the whole scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    selectors: Vec<Selector>,
}

impl Query {
    pub fn new(selectors: Vec<Selector>) -> Self {
        Self { selectors }
    }

    /// Query matching every node in scope.
    pub fn all() -> Self {
        Self::default()
    }

    /// Add a selector.
    pub fn and(mut self, selector: Selector) -> Self {
        self.selectors.push(selector);
        self
    }

    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}

impl From<Vec<Selector>> for Query {
    fn from(selectors: Vec<Selector>) -> Self {
        Self::new(selectors)
    }
}
