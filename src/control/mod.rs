//! Collaborator seams.
//!
//! The registry consumes four external services, each behind a trait so the
//! composition root can wire real clients and tests can wire fakes:
//!
//! - [`authz`] - Authorization decisions ([`Authorizer`])
//! - [`namespace`] - Default namespace and quota upkeep ([`NamespaceManager`])
//! - [`cluster`] - Cluster-join instructions ([`ClusterJoin`])
//! - [`relations`] - Ownership relation publishing ([`OwnershipRegistrar`])
//!
//! Each module also ships an embedded implementation for single-process
//! deployments.

pub mod authz;
pub mod cluster;
pub mod namespace;
pub mod relations;

use thiserror::Error;

pub use authz::{Authorizer, Grant, GrantAuthorizer, SubjectContext};
pub use cluster::{ClusterJoin, JoinRequest, RecordingClusterJoin};
pub use namespace::{DefaultPolicy, InMemoryNamespaceManager, Namespace, NamespaceManager, Quotas};
pub use relations::{AckCallback, LoggingRegistrar, OwnershipRegistrar, Resource};

/// Failure reported by an external collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("rejected: {0}")]
    Rejected(String),
}

/// Result type using CollaboratorError.
pub type CollaboratorResult<T> = Result<T, CollaboratorError>;
