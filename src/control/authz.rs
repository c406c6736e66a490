//! Authorization seam.
//!
//! Decisions come from an external engine behind [`Authorizer`]. The registry
//! only names the action and resource; policy logic lives elsewhere.

use crate::core::error::{RegistryError, RegistryResult};
use serde::{Deserialize, Serialize};

/// Actions checked by the registry.
pub mod actions {
    pub const NODE_GET: &str = "node.get";
    pub const NODE_PUT: &str = "node.put";
    pub const NODE_LABEL_PUT: &str = "node.label.put";
    pub const NODE_LABEL_DELETE: &str = "node.label.delete";
}

/// Resource kinds checked by the registry.
pub mod kinds {
    pub const NODE: &str = "node";
    pub const ORG: &str = "org";
}

/// Identity of the caller, as established by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubjectContext {
    subject: String,
}

impl SubjectContext {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }

    /// Caller with no established identity.
    pub fn anonymous() -> Self {
        Self::new("")
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}

/// External authorization decision point.
pub trait Authorizer: Send + Sync {
    /// Whether `subject` may perform `action` on `resource_kind/resource_id`.
    fn authorize(
        &self,
        subject: &SubjectContext,
        action: &str,
        resource_kind: &str,
        resource_id: &str,
    ) -> bool;
}

/// Fail closed with `Forbidden` unless the authorizer allows the action.
pub fn ensure_authorized(
    authorizer: &dyn Authorizer,
    subject: &SubjectContext,
    action: &str,
    resource_kind: &str,
    resource_id: &str,
) -> RegistryResult<()> {
    if authorizer.authorize(subject, action, resource_kind, resource_id) {
        return Ok(());
    }
    tracing::debug!(
        subject = %subject.subject(),
        action = %action,
        resource = %format!("{}/{}", resource_kind, resource_id),
        "authorization denied"
    );
    Err(RegistryError::forbidden(action, resource_kind, resource_id))
}

/// Wildcard accepted in every [`Grant`] field.
pub const ANY: &str = "*";

/// One allowed `(subject, action, resource)` combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub subject: String,
    pub action: String,
    pub resource_kind: String,
    pub resource_id: String,
}

impl Grant {
    fn matches(&self, subject: &str, action: &str, kind: &str, id: &str) -> bool {
        field_matches(&self.subject, subject)
            && field_matches(&self.action, action)
            && field_matches(&self.resource_kind, kind)
            && field_matches(&self.resource_id, id)
    }
}

fn field_matches(pattern: &str, value: &str) -> bool {
    pattern == ANY || pattern == value
}

/// Embedded authorizer: allow everything, or consult a static grant table.
#[derive(Debug, Clone)]
pub enum GrantAuthorizer {
    Permissive,
    Grants(Vec<Grant>),
}

impl GrantAuthorizer {
    pub fn permissive() -> Self {
        Self::Permissive
    }

    pub fn with_grants(grants: Vec<Grant>) -> Self {
        Self::Grants(grants)
    }
}

impl Authorizer for GrantAuthorizer {
    fn authorize(
        &self,
        subject: &SubjectContext,
        action: &str,
        resource_kind: &str,
        resource_id: &str,
    ) -> bool {
        match self {
            Self::Permissive => true,
            Self::Grants(grants) => grants
                .iter()
                .any(|g| g.matches(subject.subject(), action, resource_kind, resource_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(subject: &str, action: &str, kind: &str, id: &str) -> Grant {
        Grant {
            subject: subject.into(),
            action: action.into(),
            resource_kind: kind.into(),
            resource_id: id.into(),
        }
    }

    #[test]
    fn grants_match_exactly_or_by_wildcard() {
        let authz = GrantAuthorizer::with_grants(vec![
            grant("alice", actions::NODE_PUT, kinds::ORG, "acme"),
            grant("ops", ANY, ANY, ANY),
        ]);
        let alice = SubjectContext::new("alice");
        let ops = SubjectContext::new("ops");

        assert!(authz.authorize(&alice, actions::NODE_PUT, kinds::ORG, "acme"));
        assert!(!authz.authorize(&alice, actions::NODE_PUT, kinds::ORG, "globex"));
        assert!(!authz.authorize(&alice, actions::NODE_GET, kinds::ORG, "acme"));
        assert!(authz.authorize(&ops, actions::NODE_LABEL_DELETE, kinds::NODE, "n1"));
        assert!(!authz.authorize(&SubjectContext::anonymous(), actions::NODE_GET, kinds::NODE, "n1"));
    }

    #[test]
    fn ensure_authorized_fails_closed() {
        let authz = GrantAuthorizer::with_grants(Vec::new());
        let err = ensure_authorized(
            &authz,
            &SubjectContext::new("bob"),
            actions::NODE_PUT,
            kinds::ORG,
            "acme",
        )
        .unwrap_err();
        assert!(err.is_forbidden());

        let open = GrantAuthorizer::permissive();
        assert!(ensure_authorized(&open, &SubjectContext::anonymous(), "x", "y", "z").is_ok());
    }
}
