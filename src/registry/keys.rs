//! Storage key layout.
//!
//! Canonical records live under `nodes/`, the label index under `labels/`.
//! Both hierarchies encode the owning scope in the key prefix:
//!
//! ```text
//! nodes/pool/<id>
//! nodes/org/<org>/<id>
//! labels/pool/<label_key>/<id>
//! labels/org/<org>/<label_key>/<id>
//! ```
//!
//! Every prefix handed to a scan ends with `/`, so org `acme` never
//! matches keys of org `acme2`.

/// Root of the canonical hierarchy.
pub const NODES_ROOT: &str = "nodes/";

/// Root of the label index hierarchy.
pub const LABELS_ROOT: &str = "labels/";

/// Ownership scope of a node: the shared pool or one organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    Pool,
    Org(&'a str),
}

impl<'a> Scope<'a> {
    /// Scope for an `org` field; empty means the pool.
    pub fn of(org: &'a str) -> Self {
        if org.is_empty() {
            Self::Pool
        } else {
            Self::Org(org)
        }
    }

    /// The org name, empty for the pool.
    pub fn org(&self) -> &'a str {
        match self {
            Self::Pool => "",
            Self::Org(org) => org,
        }
    }

    /// Prefix of every canonical record in this scope.
    pub fn node_prefix(&self) -> String {
        match self {
            Self::Pool => format!("{}pool/", NODES_ROOT),
            Self::Org(org) => format!("{}org/{}/", NODES_ROOT, org),
        }
    }

    /// Canonical key of a node in this scope.
    pub fn node_key(&self, node_id: &str) -> String {
        format!("{}{}", self.node_prefix(), node_id)
    }

    /// Prefix of every index entry for one label key in this scope.
    pub fn label_prefix(&self, label_key: &str) -> String {
        match self {
            Self::Pool => format!("{}pool/{}/", LABELS_ROOT, label_key),
            Self::Org(org) => format!("{}org/{}/{}/", LABELS_ROOT, org, label_key),
        }
    }

    /// Index key of one label on one node.
    pub fn label_key(&self, label_key: &str, node_id: &str) -> String {
        format!("{}{}", self.label_prefix(label_key), node_id)
    }
}

/// Extract the trailing node id from a key found under `prefix`.
pub fn node_id_from_key<'k>(prefix: &str, key: &'k str) -> Option<&'k str> {
    key.strip_prefix(prefix)
        .filter(|id| !id.is_empty() && !id.contains('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        assert_eq!(Scope::Pool.node_key("n1"), "nodes/pool/n1");
        assert_eq!(Scope::Org("acme").node_key("n1"), "nodes/org/acme/n1");
        assert_eq!(Scope::Pool.label_key("zone", "n1"), "labels/pool/zone/n1");
        assert_eq!(
            Scope::Org("acme").label_key("zone", "n1"),
            "labels/org/acme/zone/n1"
        );
    }

    #[test]
    fn scope_of_empty_org_is_pool() {
        assert_eq!(Scope::of(""), Scope::Pool);
        assert_eq!(Scope::of("acme").org(), "acme");
    }

    #[test]
    fn id_extraction_rejects_nested_keys() {
        let prefix = Scope::Pool.label_prefix("zone");
        assert_eq!(node_id_from_key(&prefix, "labels/pool/zone/n1"), Some("n1"));
        assert_eq!(node_id_from_key(&prefix, "labels/pool/zone/"), None);
        assert_eq!(node_id_from_key(&prefix, "labels/pool/zone/x/n1"), None);
        assert_eq!(node_id_from_key(&prefix, "labels/pool/tier/n1"), None);
    }
}
