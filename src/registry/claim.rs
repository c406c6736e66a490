//! Ownership claims.
//!
//! A claim moves every pool node matching a query into an org and then runs
//! the org's cascading side effects. The workflow is linear and keeps no
//! intermediate state:
//!
//! 1. Authorize `node.put` on the org. Denial aborts with no effects.
//! 2. Snapshot the org's current members.
//! 3. Resolve pool candidates with the claim query.
//! 4. Relocate candidates one by one; a failed candidate is skipped.
//! 5. Publish an `org -> node` ownership relation per relocated node.
//! 6. Sum resource quotas over the org's current members.
//! 7. Create the org's default namespace with those quotas, or update them.
//! 8. Tell every relocated node to join the org's cluster.
//!
//! Steps 2 and 3 fail the claim. From step 4 on nothing is propagated:
//! failures are logged and counted, and the claim reports what moved.
//!
//! The join address is the bind address of a member that existed before the
//! claim. When the org had no members, the first relocated node's own address
//! is used, so that node bootstraps a one-node cluster by joining itself.

use crate::control::authz::{actions, ensure_authorized, kinds};
use crate::control::namespace::{DefaultPolicy, Quotas};
use crate::control::relations::log_ack;
use crate::control::{
    Authorizer, ClusterJoin, CollaboratorError, NamespaceManager, OwnershipRegistrar, Resource,
    SubjectContext,
};
use crate::core::error::RegistryResult;
use crate::model::node::validate_segment;
use crate::model::{Node, NodeId, Query};
use crate::registry::store::NodeStore;
use std::sync::Arc;

/// What a claim achieved.
#[derive(Debug, Clone, Default)]
pub struct ClaimOutcome {
    /// Nodes actually relocated into the org, with `org` set.
    pub nodes: Vec<Node>,
    /// Candidates whose relocation failed.
    pub skipped: Vec<NodeId>,
    /// Side-effect calls (steps 5 to 8) that failed and were swallowed.
    pub side_effect_failures: usize,
    /// Address handed to the join service, if any node moved.
    pub join_address: Option<String>,
}

impl ClaimOutcome {
    pub fn relocated(&self) -> usize {
        self.nodes.len()
    }
}

/// Runs ownership claims against a store and its collaborators.
#[derive(Clone)]
pub struct ClaimOrchestrator {
    store: Arc<NodeStore>,
    authorizer: Arc<dyn Authorizer>,
    registrar: Arc<dyn OwnershipRegistrar>,
    namespaces: Arc<dyn NamespaceManager>,
    cluster: Arc<dyn ClusterJoin>,
}

impl ClaimOrchestrator {
    pub fn new(
        store: Arc<NodeStore>,
        authorizer: Arc<dyn Authorizer>,
        registrar: Arc<dyn OwnershipRegistrar>,
        namespaces: Arc<dyn NamespaceManager>,
        cluster: Arc<dyn ClusterJoin>,
    ) -> Self {
        Self {
            store,
            authorizer,
            registrar,
            namespaces,
            cluster,
        }
    }

    /// Claim every pool node matching `query` for `org`.
    pub fn claim(
        &self,
        subject: &SubjectContext,
        query: &Query,
        org: &str,
    ) -> RegistryResult<ClaimOutcome> {
        validate_segment("org", org)?;
        ensure_authorized(
            self.authorizer.as_ref(),
            subject,
            actions::NODE_PUT,
            kinds::ORG,
            org,
        )?;

        let existing = self.store.list_org_owned(org)?;
        let candidates = self.store.query_pool(query)?;

        tracing::debug!(
            org = %org,
            existing = existing.len(),
            candidates = candidates.len(),
            "claim resolved"
        );

        let mut outcome = ClaimOutcome::default();

        for candidate in &candidates {
            match self.store.relocate(candidate, org) {
                Ok(node) => outcome.nodes.push(node),
                Err(e) => {
                    tracing::warn!(
                        node_id = %candidate.id,
                        org = %org,
                        error = %e,
                        "failed to relocate node; skipping"
                    );
                    outcome.skipped.push(candidate.id.clone());
                }
            }
        }

        for node in &outcome.nodes {
            if !self.register_relation(org, node) {
                outcome.side_effect_failures += 1;
            }
        }

        if !self.upsert_namespace(org) {
            outcome.side_effect_failures += 1;
        }

        if let Some(address) = join_address(&existing, &outcome.nodes) {
            for node in &outcome.nodes {
                if let Err(e) = self.cluster.join(&node.id, &address, org) {
                    tracing::warn!(
                        node_id = %node.id,
                        join_address = %address,
                        error = %e,
                        "join cluster failed"
                    );
                    outcome.side_effect_failures += 1;
                }
            }
            outcome.join_address = Some(address);
        }

        tracing::info!(
            org = %org,
            relocated = outcome.nodes.len(),
            skipped = outcome.skipped.len(),
            side_effect_failures = outcome.side_effect_failures,
            "claim completed"
        );
        Ok(outcome)
    }

    fn register_relation(&self, org: &str, node: &Node) -> bool {
        let from = Resource::org(org);
        let to = Resource::node(node.id.as_str());
        match self
            .registrar
            .create_relation(&from, &to, log_ack(from.clone(), to.clone()))
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(from = %from, to = %to, error = %e, "failed to publish ownership relation");
                false
            }
        }
    }

    /// Steps 6 and 7. Returns false if any part failed.
    fn upsert_namespace(&self, org: &str) -> bool {
        let members = match self.store.list_org_owned(org) {
            Ok(members) => members,
            Err(e) => {
                tracing::warn!(org = %org, error = %e, "failed to list org nodes; namespace not updated");
                return false;
            }
        };
        let quotas = aggregate_quotas(&members);

        let result = match self.namespaces.get_default_namespace(org) {
            Ok(_) => self.namespaces.set_quotas(org, &quotas),
            Err(CollaboratorError::NotFound(_)) => {
                self.namespaces
                    .create_namespace(org, &quotas, &DefaultPolicy::permissive())
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(org = %org, error = %e, "failed to upsert default namespace");
                false
            }
        }
    }
}

/// Sum every resource quota across `nodes`.
pub fn aggregate_quotas(nodes: &[Node]) -> Quotas {
    let mut quotas = Quotas::new();
    for node in nodes {
        for (name, quota) in &node.resources {
            *quotas.entry(name.clone()).or_insert(0.0) += quota;
        }
    }
    quotas
}

/// Pick the address relocated nodes join at. `None` when nothing moved.
pub fn join_address(existing: &[Node], relocated: &[Node]) -> Option<String> {
    let first = relocated.first()?;
    let anchor = existing.first().unwrap_or(first);
    Some(anchor.bind_address.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, bind: &str) -> Node {
        Node::new(NodeId::from(id), bind)
    }

    #[test]
    fn quotas_sum_per_resource() {
        let nodes = vec![
            node("a", "").with_resource("cpu", 4.0).with_resource("mem", 16.0),
            node("b", "").with_resource("cpu", 2.0),
        ];
        let quotas = aggregate_quotas(&nodes);
        assert_eq!(quotas["cpu"], 6.0);
        assert_eq!(quotas["mem"], 16.0);
        assert!(aggregate_quotas(&[]).is_empty());
    }

    #[test]
    fn join_address_prefers_existing_member() {
        let existing = vec![node("e", "10.0.0.9:7000")];
        let relocated = vec![node("n1", "10.0.0.1:7000"), node("n2", "10.0.0.2:7000")];

        assert_eq!(
            join_address(&existing, &relocated).as_deref(),
            Some("10.0.0.9:7000")
        );
        assert_eq!(join_address(&[], &relocated).as_deref(), Some("10.0.0.1:7000"));
        assert_eq!(join_address(&existing, &[]), None);
    }
}
