//! nodepool - node registry with typed label queries and ownership claims.
//!
//! nodepool tracks a pool of unclaimed compute nodes, lets organizations claim
//! subsets of the pool, attaches typed labels to nodes and answers label-based
//! queries through a secondary index kept beside the canonical records.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          Services                               │
//! │   NodeService   │   LabelService   │   Registration channel     │
//! └─────────────────────────────────────────────────────────────────┘
//!                                  │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Claim Orchestrator                          │
//! │  authorize │ relocate │ relations │ quotas │ namespace │ join   │
//! └─────────────────────────────────────────────────────────────────┘
//!                                  │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │              Node Store  +  Query Resolver                      │
//! │     canonical records (nodes/...) │ label index (labels/...)    │
//! └─────────────────────────────────────────────────────────────────┘
//!                                  │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   Ordered KV backend                            │
//! │          in-memory map │ in-memory map + operation log          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Module Organization
//!
//! ## Core
//! - [`core::config`] - Configuration parsing and validation
//! - [`core::runtime`] - Composition root and lifecycle
//! - [`core::error`] - Error types and status mapping
//!
//! ## Model
//! - [`model::label`] - Typed labels and the comparison contract
//! - [`model::node`] - Node records
//! - [`model::query`] - Selectors and queries
//!
//! ## Storage
//! - [`storage::kv`] - Backend trait and in-memory ordered map
//! - [`storage::log`] - Log-backed durable backend
//!
//! ## Registry
//! - [`registry::store`] - Dual-indexed node store
//! - [`registry::query`] - Query resolution
//! - [`registry::claim`] - Ownership claims
//!
//! ## Collaborators
//! - [`control`] - Authorization, namespace, cluster-join and relation seams
//!
//! ## Services
//! - [`services`] - Client-facing operations and the registration channel
//!
//! ## CLI
//! - [`cli::commands`] - CLI command implementations
//!
//! # Key Invariants
//!
//! - A node's canonical record and its index entries share one scope prefix
//! - Relocation is delete under the old scope, then put under the new one
//! - `compare` never reports `Eq` and `Neq` together
//! - An empty query matches the full scope

// Core infrastructure
pub mod core;

// Data model
pub mod model;

// Storage layer
pub mod storage;

// Store, resolver and claims
pub mod registry;

// External collaborator seams
pub mod control;

// Client-facing services
pub mod services;

// CLI
pub mod cli;

// Re-exports for convenience
pub use self::core::{config, error, runtime};
pub use model::{Label, LabelValue, Node, NodeId, Query, Relation, RelationSet, Selector};
pub use registry::{ClaimOrchestrator, ClaimOutcome, NodeStore, QueryResolver};
pub use services::Registry;
