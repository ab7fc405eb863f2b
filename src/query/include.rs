//! Eager-load descriptors.
//!
//! An [`Include`] names a relation to join and project alongside the primary
//! entity, optionally carrying its own filter, attribute projection, nested
//! includes, and a `required` flag (inner vs. outer join). The tree is
//! translated to joins by the data-access layer, which owns the relation
//! metadata. Recursion depth is unbounded but the relation graph is static
//! and acyclic by schema design, so no cycle guard is needed here.

use crate::query::filter::Filter;

#[derive(Debug, Clone)]
pub struct Include {
    pub relation: String,
    pub filter: Option<Filter>,
    pub attributes: Option<Vec<String>>,
    pub include: Vec<Include>,
    pub required: Option<bool>,
}

impl Include {
    pub fn new(relation: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            filter: None,
            attributes: None,
            include: Vec::new(),
            required: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn attributes(mut self, attributes: &[&str]) -> Self {
        self.attributes = Some(attributes.iter().map(|a| a.to_string()).collect());
        self
    }

    pub fn nest(mut self, include: Include) -> Self {
        self.include.push(include);
        self
    }

    /// `true` requests inner-join semantics; unset defaults to an outer join.
    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }
}
