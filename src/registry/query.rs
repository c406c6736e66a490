//! Conjunctive label queries over the index.
//!
//! Each selector scans the index entries of its label key within the scope,
//! compares every entry against the literal and keeps the ids whose relation
//! set contains the requested relation. The per-selector id sets are then
//! intersected and the survivors resolved to canonical records.
//!
//! Per-entry failures never fail the query: an entry whose value does not
//! decode, or whose label cannot be compared with the literal, is logged and
//! skipped. An id whose canonical record cannot be read is logged and
//! omitted. Only a failed scan is a hard error.

use crate::core::error::RegistryResult;
use crate::model::node::validate_segment;
use crate::model::{Label, Node, Query, Selector};
use crate::registry::keys::{node_id_from_key, Scope};
use crate::registry::store::NodeStore;
use std::collections::BTreeSet;

/// Resolves queries against one store.
pub struct QueryResolver<'a> {
    store: &'a NodeStore,
}

impl<'a> QueryResolver<'a> {
    pub fn new(store: &'a NodeStore) -> Self {
        Self { store }
    }

    /// Resolve `query` within `scope`.
    ///
    /// An empty query returns the full listing of the scope. Result order is
    /// unspecified.
    pub fn resolve(&self, query: &Query, scope: Scope<'_>) -> RegistryResult<Vec<Node>> {
        if query.is_empty() {
            return self.store.list(scope);
        }

        let mut candidates: Option<BTreeSet<String>> = None;
        for selector in query.selectors() {
            let matched = self.match_selector(selector, scope)?;
            let narrowed = match candidates {
                None => matched,
                Some(current) => current.intersection(&matched).cloned().collect(),
            };
            candidates = Some(narrowed);
        }
        let candidates = candidates.unwrap_or_default();

        let mut nodes = Vec::with_capacity(candidates.len());
        for id in &candidates {
            match self.store.get(id, scope.org()) {
                Ok(node) => nodes.push(node),
                Err(e) => {
                    tracing::warn!(
                        node_id = %id,
                        org = %scope.org(),
                        error = %e,
                        "index entry has no readable canonical record; omitting"
                    );
                }
            }
        }
        Ok(nodes)
    }

    /// Ids of nodes in `scope` whose label satisfies `selector`.
    pub fn match_selector(
        &self,
        selector: &Selector,
        scope: Scope<'_>,
    ) -> RegistryResult<BTreeSet<String>> {
        validate_segment("label key", &selector.label_key)?;

        let prefix = scope.label_prefix(&selector.label_key);
        let entries = self.store.backend().scan_prefix(&prefix)?;

        let mut matched = BTreeSet::new();
        for entry in entries {
            let Some(id) = node_id_from_key(&prefix, &entry.key) else {
                tracing::warn!(key = %entry.key, "malformed index key; skipping");
                continue;
            };

            let label: Label = match bincode::deserialize(&entry.value) {
                Ok(label) => label,
                Err(e) => {
                    tracing::warn!(key = %entry.key, error = %e, "undecodable index entry; skipping");
                    continue;
                }
            };

            match label.compare(&selector.literal) {
                Ok(relations) if relations.satisfies(selector.relation) => {
                    matched.insert(id.to_string());
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(
                        node_id = %id,
                        label_key = %selector.label_key,
                        error = %e,
                        "label not comparable with selector literal"
                    );
                }
            }
        }
        Ok(matched)
    }
}
