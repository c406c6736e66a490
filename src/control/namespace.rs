//! Namespace and quota manager seam.
//!
//! Every org owns one `default` namespace carrying the org's aggregated
//! resource quotas and the policy applied to workloads scheduled into it.

use crate::control::{CollaboratorError, CollaboratorResult};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Name of the namespace created for every org.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Resource name to total quota.
pub type Quotas = BTreeMap<String, f64>;

/// Seccomp profile attached to a namespace policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeccompProfile {
    pub version: String,
    pub default_action: String,
    pub syscalls: Vec<String>,
}

/// Policy a freshly created namespace starts with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultPolicy {
    pub seccomp: SeccompProfile,
    /// How the profile is applied: `redefine` replaces any inherited profile.
    pub strategy: String,
    pub labels: BTreeMap<String, String>,
}

impl DefaultPolicy {
    /// Allow-all seccomp profile, no syscall rules, no labels.
    pub fn permissive() -> Self {
        Self {
            seccomp: SeccompProfile {
                version: "v1.0.0".to_string(),
                default_action: "ALLOW".to_string(),
                syscalls: Vec::new(),
            },
            strategy: "redefine".to_string(),
            labels: BTreeMap::new(),
        }
    }
}

/// A namespace as reported by the manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Namespace {
    pub org: String,
    pub name: String,
    pub quotas: Quotas,
    pub policy: DefaultPolicy,
}

/// External namespace and quota manager.
pub trait NamespaceManager: Send + Sync {
    /// The org's default namespace, or `CollaboratorError::NotFound`.
    fn get_default_namespace(&self, org: &str) -> CollaboratorResult<Namespace>;

    /// Create the org's default namespace.
    fn create_namespace(
        &self,
        org: &str,
        quotas: &Quotas,
        policy: &DefaultPolicy,
    ) -> CollaboratorResult<()>;

    /// Replace the quotas of the org's default namespace.
    fn set_quotas(&self, org: &str, quotas: &Quotas) -> CollaboratorResult<()>;
}

/// Embedded namespace manager keeping namespaces in memory.
#[derive(Debug, Default)]
pub struct InMemoryNamespaceManager {
    namespaces: RwLock<HashMap<String, Namespace>>,
}

impl InMemoryNamespaceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the org's default namespace.
    pub fn namespace(&self, org: &str) -> Option<Namespace> {
        self.namespaces.read().get(org).cloned()
    }

    pub fn len(&self) -> usize {
        self.namespaces.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NamespaceManager for InMemoryNamespaceManager {
    fn get_default_namespace(&self, org: &str) -> CollaboratorResult<Namespace> {
        self.namespace(org).ok_or_else(|| {
            CollaboratorError::NotFound(format!("namespace {}/{}", org, DEFAULT_NAMESPACE))
        })
    }

    fn create_namespace(
        &self,
        org: &str,
        quotas: &Quotas,
        policy: &DefaultPolicy,
    ) -> CollaboratorResult<()> {
        let mut namespaces = self.namespaces.write();
        if namespaces.contains_key(org) {
            return Err(CollaboratorError::Rejected(format!(
                "namespace {}/{} already exists",
                org, DEFAULT_NAMESPACE
            )));
        }
        namespaces.insert(
            org.to_string(),
            Namespace {
                org: org.to_string(),
                name: DEFAULT_NAMESPACE.to_string(),
                quotas: quotas.clone(),
                policy: policy.clone(),
            },
        );
        tracing::info!(org = %org, resources = quotas.len(), "namespace created");
        Ok(())
    }

    fn set_quotas(&self, org: &str, quotas: &Quotas) -> CollaboratorResult<()> {
        let mut namespaces = self.namespaces.write();
        let namespace = namespaces.get_mut(org).ok_or_else(|| {
            CollaboratorError::NotFound(format!("namespace {}/{}", org, DEFAULT_NAMESPACE))
        })?;
        namespace.quotas = quotas.clone();
        tracing::debug!(org = %org, resources = quotas.len(), "namespace quotas updated");
        Ok(())
    }
}
