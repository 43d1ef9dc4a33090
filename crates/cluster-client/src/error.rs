//! Cluster client errors

use thiserror::Error;

/// Errors that can occur when talking to the cluster store
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Create of an object that already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Write carried a stale resourceVersion
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Object is missing a field the operation needs (name, namespace, resourceVersion)
    #[error("Invalid object: {0}")]
    InvalidObject(String),

    /// Store unreachable or failing
    #[error("Cluster store unavailable: {0}")]
    Unavailable(String),

    /// Any other Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),
}

impl ClusterError {
    /// True for `NotFound`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// True for `Conflict`.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
