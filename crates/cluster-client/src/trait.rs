//! ClusterClient trait for mocking
//!
//! The controller only ever talks to the cluster through this trait, so unit
//! tests can swap in `MockClusterClient`.

use crate::error::ClusterError;
use crds::Calculator;
use k8s_openapi::api::core::v1::Secret;

/// Trait for cluster store operations
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait ClusterClientTrait: Send + Sync {
    /// Fetch a Calculator. Returns `ClusterError::NotFound` if it does not exist.
    async fn get_calculator(&self, namespace: &str, name: &str) -> Result<Calculator, ClusterError>;

    /// Write `calc.status` through the status subresource.
    ///
    /// `calc.metadata.resource_version` must be set and still current,
    /// otherwise the write fails with `ClusterError::Conflict`.
    async fn update_calculator_status(&self, calc: &Calculator) -> Result<Calculator, ClusterError>;

    /// Fetch a Secret. Returns `ClusterError::NotFound` if it does not exist.
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, ClusterError>;

    /// Create a Secret. Returns `ClusterError::AlreadyExists` if one is present.
    async fn create_secret(&self, secret: &Secret) -> Result<Secret, ClusterError>;

    /// Replace an existing Secret wholesale.
    async fn replace_secret(&self, secret: &Secret) -> Result<Secret, ClusterError>;
}
