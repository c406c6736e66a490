//! Node registry core.
//!
//! - [`keys`] - Storage key layout and ownership scopes
//! - [`store`] - Dual-indexed node store
//! - [`query`] - Conjunctive query resolution over the label index
//! - [`claim`] - Ownership claim workflow
//!
//! Data flows downward only: claims use the store and resolver, the resolver
//! uses the store, the store uses the KV backend.

pub mod claim;
pub mod keys;
pub mod query;
pub mod store;

pub use claim::{ClaimOrchestrator, ClaimOutcome};
pub use keys::Scope;
pub use query::QueryResolver;
pub use store::NodeStore;
