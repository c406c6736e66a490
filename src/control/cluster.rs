//! Cluster-join seam.

use crate::control::CollaboratorResult;
use crate::model::NodeId;
use parking_lot::Mutex;
use serde::Serialize;

/// External service that tells a node which cluster to join and where.
pub trait ClusterJoin: Send + Sync {
    fn join(&self, node_id: &NodeId, join_address: &str, cluster_id: &str) -> CollaboratorResult<()>;
}

/// One join instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinRequest {
    pub node_id: NodeId,
    pub join_address: String,
    pub cluster_id: String,
}

/// Embedded join service that logs and records every instruction.
#[derive(Debug, Default)]
pub struct RecordingClusterJoin {
    requests: Mutex<Vec<JoinRequest>>,
}

impl RecordingClusterJoin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instructions issued so far, oldest first.
    pub fn requests(&self) -> Vec<JoinRequest> {
        self.requests.lock().clone()
    }
}

impl ClusterJoin for RecordingClusterJoin {
    fn join(&self, node_id: &NodeId, join_address: &str, cluster_id: &str) -> CollaboratorResult<()> {
        tracing::info!(
            node_id = %node_id,
            join_address = %join_address,
            cluster_id = %cluster_id,
            "join cluster"
        );
        self.requests.lock().push(JoinRequest {
            node_id: node_id.clone(),
            join_address: join_address.to_string(),
            cluster_id: cluster_id.to_string(),
        });
        Ok(())
    }
}
