//! Common test utilities.
//!
//! This module contains shared helpers for integration tests.
//! Import with `mod common;` in test files.

#![allow(dead_code)]

use nodepool::control::{
    Authorizer, ClusterJoin, CollaboratorError, CollaboratorResult, GrantAuthorizer,
    InMemoryNamespaceManager, LoggingRegistrar, NamespaceManager, OwnershipRegistrar,
    RecordingClusterJoin, Resource,
};
use nodepool::control::{AckCallback, DefaultPolicy, Namespace, Quotas};
use nodepool::error::{RegistryError, RegistryResult};
use nodepool::registry::{ClaimOrchestrator, NodeStore};
use nodepool::services::{Collaborators, Registry};
use nodepool::storage::{KvBackend, KvEntry, MemoryKv};
use nodepool::{Label, Node, NodeId};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

// ============================================================================
// Node builders
// ============================================================================

/// Pool node with a `zone` string label and a `tier` float label.
pub fn zoned_node(id: &str, zone: &str, tier: f64) -> Node {
    Node::new(NodeId::from(id), format!("{}.internal:7000", id))
        .with_label(Label::string("zone", zone))
        .with_label(Label::float64("tier", tier))
}

/// Seed the pool with `A{zone=eu,tier=1}`, `B{zone=eu,tier=2}`, `C{zone=us,tier=1}`.
pub fn seed_abc(store: &NodeStore) {
    store.put(&zoned_node("A", "eu", 1.0)).unwrap();
    store.put(&zoned_node("B", "eu", 2.0)).unwrap();
    store.put(&zoned_node("C", "us", 1.0)).unwrap();
}

/// Sorted ids of a node list.
pub fn ids(nodes: &[Node]) -> Vec<String> {
    let mut ids: Vec<String> = nodes.iter().map(|n| n.id.as_str().to_string()).collect();
    ids.sort();
    ids
}

// ============================================================================
// Fault-injecting backend
// ============================================================================

/// In-memory backend that fails selected operations.
#[derive(Default)]
pub struct FaultyKv {
    inner: MemoryKv,
    failing_puts: Mutex<HashSet<String>>,
    /// Prefix to the number of scans still allowed to succeed.
    failing_scans: Mutex<HashMap<String, usize>>,
}

impl FaultyKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every put whose key ends with `/<node_id>`.
    pub fn fail_puts_for(&self, node_id: &str) {
        self.failing_puts.lock().insert(format!("/{}", node_id));
    }

    /// Fail every scan of exactly `prefix`.
    pub fn fail_scans_of(&self, prefix: &str) {
        self.fail_scans_of_after(prefix, 0);
    }

    /// Let `successes` scans of `prefix` through, then fail the rest.
    pub fn fail_scans_of_after(&self, prefix: &str, successes: usize) {
        self.failing_scans
            .lock()
            .insert(prefix.to_string(), successes);
    }

    pub fn heal(&self) {
        self.failing_puts.lock().clear();
        self.failing_scans.lock().clear();
    }

    pub fn inner(&self) -> &MemoryKv {
        &self.inner
    }
}

impl KvBackend for FaultyKv {
    fn get(&self, key: &str) -> RegistryResult<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn put(&self, key: &str, value: Vec<u8>) -> RegistryResult<()> {
        if self.failing_puts.lock().iter().any(|s| key.ends_with(s)) {
            return Err(RegistryError::server_side(format!(
                "injected put failure: {}",
                key
            )));
        }
        self.inner.put(key, value)
    }

    fn delete(&self, key: &str) -> RegistryResult<bool> {
        self.inner.delete(key)
    }

    fn scan_prefix(&self, prefix: &str) -> RegistryResult<Vec<KvEntry>> {
        if let Some(remaining) = self.failing_scans.lock().get_mut(prefix) {
            if *remaining == 0 {
                return Err(RegistryError::server_side(format!(
                    "injected scan failure: {}",
                    prefix
                )));
            }
            *remaining -= 1;
        }
        self.inner.scan_prefix(prefix)
    }
}

// ============================================================================
// Failing collaborators
// ============================================================================

/// Registrar that refuses every relation.
pub struct FailingRegistrar;

impl OwnershipRegistrar for FailingRegistrar {
    fn create_relation(
        &self,
        _from: &Resource,
        _to: &Resource,
        _on_ack: AckCallback,
    ) -> CollaboratorResult<()> {
        Err(CollaboratorError::Unavailable("broker down".into()))
    }
}

/// Registrar that sends but acknowledges negatively.
#[derive(Default)]
pub struct NackRegistrar {
    pub sent: Mutex<usize>,
}

impl OwnershipRegistrar for NackRegistrar {
    fn create_relation(
        &self,
        _from: &Resource,
        _to: &Resource,
        on_ack: AckCallback,
    ) -> CollaboratorResult<()> {
        *self.sent.lock() += 1;
        on_ack(Err(CollaboratorError::Rejected("nack".into())));
        Ok(())
    }
}

/// Join service that fails for selected nodes and records the rest.
#[derive(Default)]
pub struct FlakyClusterJoin {
    pub failing: HashSet<String>,
    pub joined: RecordingClusterJoin,
}

impl ClusterJoin for FlakyClusterJoin {
    fn join(&self, node_id: &NodeId, join_address: &str, cluster_id: &str) -> CollaboratorResult<()> {
        if self.failing.contains(node_id.as_str()) {
            return Err(CollaboratorError::Unavailable(format!("{} unreachable", node_id)));
        }
        self.joined.join(node_id, join_address, cluster_id)
    }
}

/// Namespace manager that is always unavailable.
pub struct DownNamespaceManager;

impl NamespaceManager for DownNamespaceManager {
    fn get_default_namespace(&self, _org: &str) -> CollaboratorResult<Namespace> {
        Err(CollaboratorError::Unavailable("namespace manager down".into()))
    }

    fn create_namespace(
        &self,
        _org: &str,
        _quotas: &Quotas,
        _policy: &DefaultPolicy,
    ) -> CollaboratorResult<()> {
        Err(CollaboratorError::Unavailable("namespace manager down".into()))
    }

    fn set_quotas(&self, _org: &str, _quotas: &Quotas) -> CollaboratorResult<()> {
        Err(CollaboratorError::Unavailable("namespace manager down".into()))
    }
}

// ============================================================================
// Harness
// ============================================================================

/// A store over a faulty backend plus recording collaborators.
pub struct Harness {
    pub kv: Arc<FaultyKv>,
    pub store: Arc<NodeStore>,
    pub authorizer: Arc<dyn Authorizer>,
    pub registrar: Arc<LoggingRegistrar>,
    pub namespaces: Arc<InMemoryNamespaceManager>,
    pub cluster: Arc<RecordingClusterJoin>,
}

impl Harness {
    /// Permissive harness.
    pub fn new() -> Self {
        Self::with_authorizer(GrantAuthorizer::permissive())
    }

    pub fn with_authorizer(authorizer: impl Authorizer + 'static) -> Self {
        let kv = Arc::new(FaultyKv::new());
        Self {
            store: Arc::new(NodeStore::new(kv.clone())),
            kv,
            authorizer: Arc::new(authorizer),
            registrar: Arc::new(LoggingRegistrar::new()),
            namespaces: Arc::new(InMemoryNamespaceManager::new()),
            cluster: Arc::new(RecordingClusterJoin::new()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            authorizer: self.authorizer.clone(),
            registrar: self.registrar.clone(),
            namespaces: self.namespaces.clone(),
            cluster: self.cluster.clone(),
        }
    }

    pub fn orchestrator(&self) -> ClaimOrchestrator {
        let c = self.collaborators();
        ClaimOrchestrator::new(
            self.store.clone(),
            c.authorizer,
            c.registrar,
            c.namespaces,
            c.cluster,
        )
    }

    pub fn registry(&self) -> Registry {
        Registry::new(self.store.clone(), self.collaborators())
    }
}

// ============================================================================
// Config files
// ============================================================================

/// Write `content` to a temporary config file.
pub fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write config");
    file
}
