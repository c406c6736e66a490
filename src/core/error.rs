//! Error types and transport status mapping.
//!
//! Registry operations fail with one of a small set of conditions. `Forbidden`
//! must stay distinguishable from every other failure once it reaches a
//! transport boundary, which is what [`StatusMapping`] guarantees.

use thiserror::Error;

/// Common registry error conditions.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Point lookup miss.
    #[error("node {node_id} not found{}", scope_suffix(.org))]
    NotFound { node_id: String, org: String },

    /// Authorization denial.
    #[error("forbidden: {action} on {resource_kind}/{resource_id}")]
    Forbidden {
        action: String,
        resource_kind: String,
        resource_id: String,
    },

    /// Selector literal does not parse as the label's type.
    #[error("incomparable: {literal:?} is not a valid {expected} literal")]
    Incomparable {
        literal: String,
        expected: &'static str,
    },

    /// Malformed request (bad key, unknown relation, ...).
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// Encoding/decoding or unexpected backend failure.
    #[error("server-side error: {message}")]
    ServerSide { message: String },
}

fn scope_suffix(org: &str) -> String {
    if org.is_empty() {
        " in node pool".to_string()
    } else {
        format!(" in org {}", org)
    }
}

impl RegistryError {
    /// Create a NotFound error.
    pub fn not_found(node_id: impl Into<String>, org: impl Into<String>) -> Self {
        Self::NotFound {
            node_id: node_id.into(),
            org: org.into(),
        }
    }

    /// Create a Forbidden error.
    pub fn forbidden(
        action: impl Into<String>,
        resource_kind: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        Self::Forbidden {
            action: action.into(),
            resource_kind: resource_kind.into(),
            resource_id: resource_id.into(),
        }
    }

    /// Create an InvalidRequest error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a ServerSide error.
    pub fn server_side(message: impl Into<String>) -> Self {
        Self::ServerSide {
            message: message.into(),
        }
    }

    /// Check if this is a point lookup miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an authorization denial.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden { .. })
    }
}

impl From<bincode::Error> for RegistryError {
    fn from(e: bincode::Error) -> Self {
        Self::server_side(format!("codec: {}", e))
    }
}

impl From<std::io::Error> for RegistryError {
    fn from(e: std::io::Error) -> Self {
        Self::server_side(format!("io: {}", e))
    }
}

/// Result type using RegistryError.
pub type RegistryResult<T> = Result<T, RegistryError>;

// ============================================================================
// Transport status mapping
// ============================================================================

/// gRPC-style status codes used at the transport boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok = 0,
    InvalidArgument = 3,
    NotFound = 5,
    PermissionDenied = 7,
    Internal = 13,
}

/// Maps registry errors onto transport status codes and messages.
pub struct StatusMapping;

impl StatusMapping {
    /// Map a RegistryError to a status code.
    pub fn to_status_code(error: &RegistryError) -> StatusCode {
        match error {
            RegistryError::NotFound { .. } => StatusCode::NotFound,
            RegistryError::Forbidden { .. } => StatusCode::PermissionDenied,
            RegistryError::Incomparable { .. } => StatusCode::InvalidArgument,
            RegistryError::InvalidRequest { .. } => StatusCode::InvalidArgument,
            RegistryError::ServerSide { .. } => StatusCode::Internal,
        }
    }

    /// Get the client-facing message for an error.
    ///
    /// Server-side details stay in the logs.
    pub fn to_error_message(error: &RegistryError) -> String {
        match error {
            RegistryError::Forbidden { .. } => {
                "you are not authorized to perform this operation".to_string()
            }
            RegistryError::ServerSide { .. } => {
                "an unexpected server-side error occurred".to_string()
            }
            _ => error.to_string(),
        }
    }
}
