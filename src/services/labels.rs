//! Label mutation operations.

use crate::control::authz::{actions, ensure_authorized, kinds};
use crate::control::{Authorizer, SubjectContext};
use crate::core::error::RegistryResult;
use crate::model::{Label, Node};
use crate::registry::NodeStore;
use std::sync::Arc;

/// Label operations exposed to clients. Both are authorized against the node.
#[derive(Clone)]
pub struct LabelService {
    store: Arc<NodeStore>,
    authorizer: Arc<dyn Authorizer>,
}

impl LabelService {
    pub fn new(store: Arc<NodeStore>, authorizer: Arc<dyn Authorizer>) -> Self {
        Self { store, authorizer }
    }

    /// PutLabel: add the label, or replace the one with the same key.
    pub fn put_label(
        &self,
        subject: &SubjectContext,
        node_id: &str,
        org: &str,
        label: Label,
    ) -> RegistryResult<Node> {
        ensure_authorized(
            self.authorizer.as_ref(),
            subject,
            actions::NODE_LABEL_PUT,
            kinds::NODE,
            node_id,
        )?;
        let node = self.store.get(node_id, org)?;
        let updated = self.store.put_label(&node, label)?;
        tracing::debug!(node_id = %node_id, org = %org, "label put");
        Ok(updated)
    }

    /// DeleteLabel: remove the label with `label_key`. A missing key is a no-op.
    pub fn delete_label(
        &self,
        subject: &SubjectContext,
        node_id: &str,
        org: &str,
        label_key: &str,
    ) -> RegistryResult<Node> {
        ensure_authorized(
            self.authorizer.as_ref(),
            subject,
            actions::NODE_LABEL_DELETE,
            kinds::NODE,
            node_id,
        )?;
        let node = self.store.get(node_id, org)?;
        let updated = self.store.delete_label(&node, label_key)?;
        tracing::debug!(node_id = %node_id, org = %org, label_key = %label_key, "label deleted");
        Ok(updated)
    }
}
