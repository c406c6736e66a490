//! Node store.
//!
//! The only path through which node state is created, read, mutated or
//! deleted. Each node is written twice: a canonical record keyed by scope and
//! id, and one index entry per label keyed by scope, label key and id.
//!
//! Multi-key sequences are not transactional. `put` writes the canonical
//! record first and the index entries after it; `relocate` deletes under the
//! old scope before writing under the new one. A failure in the middle leaves
//! the two views briefly inconsistent.

use crate::core::error::{RegistryError, RegistryResult};
use crate::model::node::validate_segment;
use crate::model::{Label, Node, Query};
use crate::registry::keys::{Scope, NODES_ROOT};
use crate::registry::query::QueryResolver;
use crate::storage::KvBackend;
use std::sync::Arc;

/// Dual-indexed node store over an ordered KV backend.
#[derive(Clone)]
pub struct NodeStore {
    kv: Arc<dyn KvBackend>,
}

impl std::fmt::Debug for NodeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeStore").finish_non_exhaustive()
    }
}

impl NodeStore {
    /// Create a store over the given backend.
    pub fn new(kv: Arc<dyn KvBackend>) -> Self {
        Self { kv }
    }

    pub(crate) fn backend(&self) -> &dyn KvBackend {
        self.kv.as_ref()
    }

    /// Write the canonical record, then one index entry per label.
    ///
    /// Index entries for labels the node no longer carries are not touched;
    /// remove them with [`NodeStore::delete_label`] first.
    pub fn put(&self, node: &Node) -> RegistryResult<()> {
        node.validate()?;
        let scope = Scope::of(&node.org);

        self.kv
            .put(&scope.node_key(node.id.as_str()), bincode::serialize(node)?)?;
        for label in &node.labels {
            self.kv.put(
                &scope.label_key(label.key(), node.id.as_str()),
                bincode::serialize(label)?,
            )?;
        }
        Ok(())
    }

    /// Point lookup. An empty `org` looks in the pool.
    pub fn get(&self, node_id: &str, org: &str) -> RegistryResult<Node> {
        validate_segment("node id", node_id)?;
        if !org.is_empty() {
            validate_segment("org", org)?;
        }

        let key = Scope::of(org).node_key(node_id);
        match self.kv.get(&key)? {
            Some(bytes) => decode_node(&key, &bytes),
            None => Err(RegistryError::not_found(node_id, org)),
        }
    }

    /// Remove the canonical record and the index entries of the node's
    /// current label set, under its current scope.
    ///
    /// Returns whether the canonical record was present. The canonical key
    /// goes first, so of several concurrent deletes exactly one sees `true`.
    pub fn delete(&self, node: &Node) -> RegistryResult<bool> {
        let scope = Scope::of(&node.org);
        let id = node.id.as_str();

        let existed = self.kv.delete(&scope.node_key(id))?;
        for label in &node.labels {
            self.kv.delete(&scope.label_key(label.key(), id))?;
        }
        Ok(existed)
    }

    /// Move a node to another scope: delete under the old one, then put
    /// under the new one. An empty `org` returns the node to the pool.
    ///
    /// Fails with `NotFound` and writes nothing when the node is no longer
    /// under its old scope, e.g. a concurrent claim already moved it.
    pub fn relocate(&self, node: &Node, org: &str) -> RegistryResult<Node> {
        let mut moved = node.clone();
        moved.org = org.to_string();
        moved.validate()?;

        if !self.delete(node)? {
            return Err(RegistryError::not_found(node.id.as_str(), node.org.as_str()));
        }
        self.put(&moved)?;

        tracing::debug!(
            node_id = %node.id,
            from = %node.org,
            to = %org,
            "node relocated"
        );
        Ok(moved)
    }

    /// Every node in the pool.
    pub fn list_pool(&self) -> RegistryResult<Vec<Node>> {
        self.list(Scope::Pool)
    }

    /// Every node owned by `org`.
    pub fn list_org_owned(&self, org: &str) -> RegistryResult<Vec<Node>> {
        validate_segment("org", org)?;
        self.list(Scope::Org(org))
    }

    /// Every node in every scope.
    pub fn list_all(&self) -> RegistryResult<Vec<Node>> {
        self.scan_nodes(NODES_ROOT)
    }

    /// Every node in one scope.
    pub fn list(&self, scope: Scope<'_>) -> RegistryResult<Vec<Node>> {
        self.scan_nodes(&scope.node_prefix())
    }

    /// Pool nodes matching every selector of `query`.
    pub fn query_pool(&self, query: &Query) -> RegistryResult<Vec<Node>> {
        QueryResolver::new(self).resolve(query, Scope::Pool)
    }

    /// Nodes owned by `org` matching every selector of `query`.
    pub fn query_org_owned(&self, query: &Query, org: &str) -> RegistryResult<Vec<Node>> {
        validate_segment("org", org)?;
        QueryResolver::new(self).resolve(query, Scope::Org(org))
    }

    /// Replace the label with the same key, or append it, then re-read.
    pub fn put_label(&self, node: &Node, label: Label) -> RegistryResult<Node> {
        validate_segment("label key", label.key())?;

        let mut updated = node.clone();
        updated.upsert_label(label);
        self.put(&updated)?;
        self.get(updated.id.as_str(), &updated.org)
    }

    /// Remove the label with `label_key` if present, then re-read.
    ///
    /// A missing key leaves the label set untouched and is not an error.
    pub fn delete_label(&self, node: &Node, label_key: &str) -> RegistryResult<Node> {
        let mut updated = node.clone();
        if updated.remove_label(label_key).is_some() {
            let scope = Scope::of(&updated.org);
            self.kv
                .delete(&scope.label_key(label_key, updated.id.as_str()))?;
        }
        self.put(&updated)?;
        self.get(updated.id.as_str(), &updated.org)
    }

    fn scan_nodes(&self, prefix: &str) -> RegistryResult<Vec<Node>> {
        self.kv
            .scan_prefix(prefix)?
            .iter()
            .map(|entry| decode_node(&entry.key, &entry.value))
            .collect()
    }
}

fn decode_node(key: &str, bytes: &[u8]) -> RegistryResult<Node> {
    bincode::deserialize(bytes)
        .map_err(|e| RegistryError::server_side(format!("decode node at {}: {}", key, e)))
}
