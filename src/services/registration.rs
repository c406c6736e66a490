//! Node registration.
//!
//! Agents register over an asynchronous request/reply channel, decoupled from
//! the synchronous read and claim surface. Each request travels in a
//! [`RegistrationEnvelope`] carrying a oneshot reply slot; the
//! [`RegistrationListener`] drains the channel, registers the node and
//! replies with the new id or the error.

use crate::core::error::{RegistryError, RegistryResult};
use crate::model::{Label, Node, NodeId};
use crate::registry::NodeStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

/// What an agent reports about itself when joining the pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub labels: Vec<Label>,
    pub resources: HashMap<String, f64>,
    pub bind_address: String,
}

/// A registration request and the slot its reply goes to.
#[derive(Debug)]
pub struct RegistrationEnvelope {
    pub request: RegisterRequest,
    pub reply: oneshot::Sender<RegistryResult<NodeId>>,
}

/// Registers new nodes into the pool.
#[derive(Clone)]
pub struct RegistrationService {
    store: Arc<NodeStore>,
}

impl RegistrationService {
    pub fn new(store: Arc<NodeStore>) -> Self {
        Self { store }
    }

    /// RegisterNode: store an unclaimed node under a fresh id.
    pub fn register(&self, request: RegisterRequest) -> RegistryResult<NodeId> {
        let mut node = Node::new(NodeId::generate(), request.bind_address);
        for label in request.labels {
            node.upsert_label(label);
        }
        node.resources = request.resources;

        self.store.put(&node)?;
        tracing::info!(
            node_id = %node.id,
            bind_address = %node.bind_address,
            labels = node.labels.len(),
            "node registered"
        );
        Ok(node.id)
    }
}

/// Agent-side handle to the registration channel.
#[derive(Debug, Clone)]
pub struct RegistrationClient {
    tx: mpsc::Sender<RegistrationEnvelope>,
}

impl RegistrationClient {
    /// Send a request and wait for the listener's reply.
    pub async fn register(&self, request: RegisterRequest) -> RegistryResult<NodeId> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(RegistrationEnvelope { request, reply })
            .await
            .map_err(|_| RegistryError::server_side("registration listener stopped"))?;
        rx.await
            .map_err(|_| RegistryError::server_side("registration reply dropped"))?
    }
}

/// Consumes registration envelopes until shutdown or until every client is gone.
pub struct RegistrationListener {
    service: RegistrationService,
    rx: mpsc::Receiver<RegistrationEnvelope>,
    shutdown: watch::Receiver<bool>,
}

/// Build a bounded registration channel.
pub fn registration_channel(
    service: RegistrationService,
    capacity: usize,
    shutdown: watch::Receiver<bool>,
) -> (RegistrationClient, RegistrationListener) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        RegistrationClient { tx },
        RegistrationListener {
            service,
            rx,
            shutdown,
        },
    )
}

impl RegistrationListener {
    /// Run until stopped. Returns the number of requests handled.
    pub async fn run(mut self) -> u64 {
        let mut handled = 0u64;
        tracing::debug!("registration listener started");

        loop {
            if *self.shutdown.borrow() {
                break;
            }
            tokio::select! {
                changed = self.shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                envelope = self.rx.recv() => match envelope {
                    Some(envelope) => {
                        self.handle(envelope);
                        handled += 1;
                    }
                    None => break,
                },
            }
        }

        tracing::info!(handled, "registration listener stopped");
        handled
    }

    fn handle(&self, envelope: RegistrationEnvelope) {
        let RegistrationEnvelope { request, reply } = envelope;
        let result = self.service.register(request);
        if let Err(e) = &result {
            tracing::error!(error = %e, "node registration failed");
        }
        if reply.send(result).is_err() {
            tracing::warn!("registration reply receiver dropped");
        }
    }
}
