//! Ownership relation registrar seam.
//!
//! Ownership edges (`org -> node`) are published to the authorization
//! engine so later checks on the node can be derived from the org. Publishing
//! is fire-and-forget: the acknowledgment arrives later through a callback
//! and is only logged.

use crate::control::authz::kinds;
use crate::control::{CollaboratorError, CollaboratorResult};
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;

/// A typed reference to an authorization resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Resource {
    pub kind: String,
    pub id: String,
}

impl Resource {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn org(org: impl Into<String>) -> Self {
        Self::new(kinds::ORG, org)
    }

    pub fn node(node_id: impl Into<String>) -> Self {
        Self::new(kinds::NODE, node_id)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// Acknowledgment callback for a published relation.
pub type AckCallback = Box<dyn FnOnce(CollaboratorResult<()>) + Send>;

/// External registrar of ownership relations.
pub trait OwnershipRegistrar: Send + Sync {
    /// Publish `from -> to`. An `Err` means the relation was never sent;
    /// the delivery outcome is reported later through `on_ack`.
    fn create_relation(
        &self,
        from: &Resource,
        to: &Resource,
        on_ack: AckCallback,
    ) -> CollaboratorResult<()>;
}

/// Embedded registrar that logs, records and acknowledges immediately.
#[derive(Debug, Default)]
pub struct LoggingRegistrar {
    relations: Mutex<Vec<(Resource, Resource)>>,
}

impl LoggingRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relations published so far, oldest first.
    pub fn relations(&self) -> Vec<(Resource, Resource)> {
        self.relations.lock().clone()
    }
}

impl OwnershipRegistrar for LoggingRegistrar {
    fn create_relation(
        &self,
        from: &Resource,
        to: &Resource,
        on_ack: AckCallback,
    ) -> CollaboratorResult<()> {
        if from.id.is_empty() || to.id.is_empty() {
            return Err(CollaboratorError::Rejected(format!(
                "relation {} -> {} has an empty endpoint",
                from, to
            )));
        }
        tracing::info!(from = %from, to = %to, "ownership relation published");
        self.relations.lock().push((from.clone(), to.clone()));
        on_ack(Ok(()));
        Ok(())
    }
}

/// Log the acknowledgment of a published relation.
pub fn log_ack(from: Resource, to: Resource) -> AckCallback {
    Box::new(move |result| match result {
        Ok(()) => tracing::debug!(from = %from, to = %to, "ownership relation acknowledged"),
        Err(e) => tracing::warn!(from = %from, to = %to, error = %e, "ownership relation not acknowledged"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn logging_registrar_records_and_acks() {
        let registrar = LoggingRegistrar::new();
        let acked = Arc::new(AtomicBool::new(false));
        let flag = acked.clone();

        registrar
            .create_relation(
                &Resource::org("acme"),
                &Resource::node("n1"),
                Box::new(move |r| flag.store(r.is_ok(), Ordering::SeqCst)),
            )
            .unwrap();

        assert!(acked.load(Ordering::SeqCst));
        assert_eq!(
            registrar.relations(),
            vec![(Resource::org("acme"), Resource::node("n1"))]
        );
        assert_eq!(Resource::node("n1").to_string(), "node/n1");
    }
}
