//! Node records.

use crate::core::error::{RegistryError, RegistryResult};
use crate::model::label::Label;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Opaque, globally unique node identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generate a fresh random identity.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A registered compute node.
///
/// An empty `org` means the node sits in the shared pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub org: String,
    pub labels: Vec<Label>,
    pub resources: HashMap<String, f64>,
    pub bind_address: String,
}

impl Node {
    /// Create an unclaimed node.
    pub fn new(id: NodeId, bind_address: impl Into<String>) -> Self {
        Self {
            id,
            org: String::new(),
            labels: Vec::new(),
            resources: HashMap::new(),
            bind_address: bind_address.into(),
        }
    }

    /// Attach a label, replacing any label with the same key.
    pub fn with_label(mut self, label: Label) -> Self {
        self.upsert_label(label);
        self
    }

    /// Set a resource quota.
    pub fn with_resource(mut self, name: impl Into<String>, quota: f64) -> Self {
        self.resources.insert(name.into(), quota);
        self
    }

    /// Check if the node is owned by an organization.
    pub fn claimed(&self) -> bool {
        !self.org.is_empty()
    }

    /// Get a label by key.
    pub fn label(&self, key: &str) -> Option<&Label> {
        self.labels.iter().find(|l| l.key() == key)
    }

    /// Replace the label carrying the same key, or append it.
    pub fn upsert_label(&mut self, label: Label) {
        match self.labels.iter_mut().find(|l| l.key() == label.key()) {
            Some(existing) => *existing = label,
            None => self.labels.push(label),
        }
    }

    /// Remove the label with this key, returning it if present.
    pub fn remove_label(&mut self, key: &str) -> Option<Label> {
        let index = self.labels.iter().position(|l| l.key() == key)?;
        Some(self.labels.remove(index))
    }

    /// Check the invariants that keep the node addressable in the key space.
    pub fn validate(&self) -> RegistryResult<()> {
        validate_segment("node id", self.id.as_str())?;
        if self.claimed() {
            validate_segment("org", &self.org)?;
        }
        for (i, label) in self.labels.iter().enumerate() {
            validate_segment("label key", label.key())?;
            if self.labels[..i].iter().any(|l| l.key() == label.key()) {
                return Err(RegistryError::invalid(format!(
                    "duplicate label key {:?} on node {}",
                    label.key(),
                    self.id
                )));
            }
        }
        for (name, quota) in &self.resources {
            if !(quota.is_finite() && *quota >= 0.0) {
                return Err(RegistryError::invalid(format!(
                    "resource {} has invalid quota {}",
                    name, quota
                )));
            }
        }
        Ok(())
    }
}

/// Validate a value that becomes one segment of a storage key.
pub fn validate_segment(what: &str, value: &str) -> RegistryResult<()> {
    if value.is_empty() {
        return Err(RegistryError::invalid(format!("{} must not be empty", what)));
    }
    if value.contains('/') {
        return Err(RegistryError::invalid(format!(
            "{} {:?} must not contain '/'",
            what, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_replaces_by_key() {
        let mut node = Node::new(NodeId::from("n1"), "10.0.0.1:7000")
            .with_label(Label::string("zone", "eu"))
            .with_label(Label::bool("gpu", false));

        node.upsert_label(Label::string("zone", "us"));

        assert_eq!(node.labels.len(), 2);
        assert_eq!(node.label("zone").unwrap().string_value(), "us");
        assert_eq!(node.labels[0].key(), "zone");
    }

    #[test]
    fn remove_missing_label_is_noop() {
        let mut node = Node::new(NodeId::from("n1"), "").with_label(Label::bool("gpu", true));
        assert!(node.remove_label("zone").is_none());
        assert_eq!(node.labels.len(), 1);
    }

    #[test]
    fn validate_rejects_slashes_and_bad_quotas() {
        let node = Node::new(NodeId::from("n/1"), "");
        assert!(node.validate().is_err());

        let node = Node::new(NodeId::from("n1"), "").with_label(Label::bool("a/b", true));
        assert!(node.validate().is_err());

        let node = Node::new(NodeId::from("n1"), "").with_resource("cpu", -1.0);
        assert!(node.validate().is_err());

        let node = Node::new(NodeId::from("n1"), "").with_resource("cpu", 4.0);
        assert!(node.validate().is_ok());
    }

    #[test]
    fn claimed_follows_org() {
        let mut node = Node::new(NodeId::generate(), "");
        assert!(!node.claimed());
        node.org = "acme".to_string();
        assert!(node.claimed());
    }
}
