//! Client-facing operations.
//!
//! - [`nodes`] - Node reads, listings, queries and ownership claims
//! - [`labels`] - Label put and delete
//! - [`registration`] - Asynchronous node registration channel
//!
//! [`Registry`] bundles the services over one store and one set of
//! collaborators. It is built by explicit injection; nothing here is global.

pub mod labels;
pub mod nodes;
pub mod registration;

pub use labels::LabelService;
pub use nodes::NodeService;
pub use registration::{
    registration_channel, RegisterRequest, RegistrationClient, RegistrationEnvelope,
    RegistrationListener, RegistrationService,
};

use crate::control::{Authorizer, ClusterJoin, NamespaceManager, OwnershipRegistrar};
use crate::registry::{ClaimOrchestrator, NodeStore};
use std::sync::Arc;

/// External collaborators the registry depends on.
#[derive(Clone)]
pub struct Collaborators {
    pub authorizer: Arc<dyn Authorizer>,
    pub registrar: Arc<dyn OwnershipRegistrar>,
    pub namespaces: Arc<dyn NamespaceManager>,
    pub cluster: Arc<dyn ClusterJoin>,
}

/// Every client-facing service, wired over one store.
#[derive(Clone)]
pub struct Registry {
    pub nodes: NodeService,
    pub labels: LabelService,
    pub registration: RegistrationService,
    store: Arc<NodeStore>,
}

impl Registry {
    pub fn new(store: Arc<NodeStore>, collaborators: Collaborators) -> Self {
        let claims = ClaimOrchestrator::new(
            store.clone(),
            collaborators.authorizer.clone(),
            collaborators.registrar,
            collaborators.namespaces,
            collaborators.cluster,
        );
        Self {
            nodes: NodeService::new(store.clone(), collaborators.authorizer.clone(), claims),
            labels: LabelService::new(store.clone(), collaborators.authorizer),
            registration: RegistrationService::new(store.clone()),
            store,
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<NodeStore> {
        &self.store
    }
}
