//! Registry data model.
//!
//! - [`label`] - Typed labels, relations and the comparison contract
//! - [`node`] - Node records and identity
//! - [`query`] - Selectors and conjunctive queries

pub mod label;
pub mod node;
pub mod query;

pub use label::{Label, LabelValue, Relation, RelationSet};
pub use node::{Node, NodeId};
pub use query::{Query, Selector};
