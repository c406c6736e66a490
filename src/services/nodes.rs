//! Node read, query and claim operations.

use crate::control::authz::{actions, ensure_authorized, kinds};
use crate::control::{Authorizer, SubjectContext};
use crate::core::error::RegistryResult;
use crate::model::{Node, Query};
use crate::registry::{ClaimOrchestrator, ClaimOutcome, NodeStore};
use std::sync::Arc;

/// Node operations exposed to clients.
///
/// Pool reads and listings are open to every caller. Org-scoped reads and
/// claims are authorized against the org or the node.
#[derive(Clone)]
pub struct NodeService {
    store: Arc<NodeStore>,
    authorizer: Arc<dyn Authorizer>,
    claims: ClaimOrchestrator,
}

impl NodeService {
    pub fn new(
        store: Arc<NodeStore>,
        authorizer: Arc<dyn Authorizer>,
        claims: ClaimOrchestrator,
    ) -> Self {
        Self {
            store,
            authorizer,
            claims,
        }
    }

    /// GetPoolNode.
    pub fn get_pool_node(&self, node_id: &str) -> RegistryResult<Node> {
        self.store.get(node_id, "")
    }

    /// GetOrgNode. Requires `node.get` on the node.
    pub fn get_org_node(
        &self,
        subject: &SubjectContext,
        node_id: &str,
        org: &str,
    ) -> RegistryResult<Node> {
        ensure_authorized(
            self.authorizer.as_ref(),
            subject,
            actions::NODE_GET,
            kinds::NODE,
            node_id,
        )?;
        self.store.get(node_id, org)
    }

    /// ClaimOwnership.
    pub fn claim_ownership(
        &self,
        subject: &SubjectContext,
        query: &Query,
        org: &str,
    ) -> RegistryResult<ClaimOutcome> {
        self.claims.claim(subject, query, org)
    }

    /// ListPoolNodes.
    pub fn list_pool_nodes(&self) -> RegistryResult<Vec<Node>> {
        self.store.list_pool()
    }

    /// ListOrgNodes.
    pub fn list_org_nodes(&self, org: &str) -> RegistryResult<Vec<Node>> {
        self.store.list_org_owned(org)
    }

    /// ListAllNodes.
    pub fn list_all_nodes(&self) -> RegistryResult<Vec<Node>> {
        self.store.list_all()
    }

    /// QueryPoolNodes.
    pub fn query_pool_nodes(&self, query: &Query) -> RegistryResult<Vec<Node>> {
        self.store.query_pool(query)
    }

    /// QueryOrgNodes. Requires `node.get` on the org.
    pub fn query_org_nodes(
        &self,
        subject: &SubjectContext,
        query: &Query,
        org: &str,
    ) -> RegistryResult<Vec<Node>> {
        ensure_authorized(
            self.authorizer.as_ref(),
            subject,
            actions::NODE_GET,
            kinds::ORG,
            org,
        )?;
        self.store.query_org_owned(query, org)
    }
}
