//! Controller-specific error types.
//!
//! Every failure a reconciliation can hit surfaces as one `ControllerError`,
//! which `kube_runtime` hands to the error policy for requeueing.

use cluster_client::ClusterError;
use kube::Error as KubeError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Which write (or read) of the dependent Secret failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretOperation {
    /// Fetching the existing Secret
    Get,
    /// Creating a missing Secret
    Create,
    /// Replacing an existing Secret
    Replace,
}

impl fmt::Display for SecretOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("get"),
            Self::Create => f.write_str("create"),
            Self::Replace => f.write_str("replace"),
        }
    }
}

/// Errors that can occur in the Calculator Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes client construction error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Fetching the Calculator failed for a reason other than NotFound
    #[error("Failed to get calculator: {0}")]
    GetCalculator(#[source] ClusterError),

    /// Writing the Calculator status failed
    #[error("Failed to update calculator status: {0}")]
    UpdateStatus(#[source] ClusterError),

    /// Synchronizing the dependent Secret failed
    #[error("Failed to {operation} secret: {source}")]
    SecretSync {
        /// Operation that failed
        operation: SecretOperation,
        /// Underlying store error
        #[source]
        source: ClusterError,
    },

    /// Object handed over by the watcher lacks an identity field
    #[error("Object is missing {0}")]
    MissingObjectKey(&'static str),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Reconciliation exceeded its deadline and was cancelled
    #[error("Reconciliation timed out after {0:?}")]
    Timeout(Duration),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}

impl ControllerError {
    /// True when a write was rejected because of a stale resourceVersion.
    ///
    /// Conflicts clear up as soon as the next reconciliation re-reads the
    /// object, so they are requeued without progressive backoff.
    pub fn is_conflict(&self) -> bool {
        match self {
            Self::UpdateStatus(e) | Self::SecretSync { source: e, .. } => e.is_conflict(),
            _ => false,
        }
    }
}
