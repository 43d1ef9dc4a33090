//! Kubernetes-backed cluster client
//!
//! Thin wrapper over `kube::Api` that maps API status codes onto
//! `ClusterError` variants the reconciler can reason about.

use crate::cluster_trait::ClusterClientTrait;
use crate::error::ClusterError;
use crds::Calculator;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, Patch, PatchParams, PostParams};
use kube::{Client, Resource, ResourceExt};
use serde_json::json;
use tracing::debug;

/// Cluster client backed by a live Kubernetes API server.
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl std::fmt::Debug for KubeClusterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeClusterClient").finish_non_exhaustive()
    }
}

impl KubeClusterClient {
    /// Create a new client from an existing kube client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn calculators(&self, namespace: &str) -> Api<Calculator> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn secrets(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Write operation kind, used to tell a create-time 409 from an update-time 409.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteKind {
    Read,
    Create,
    Update,
}

/// Map a kube error onto the cluster error taxonomy.
fn classify(err: kube::Error, kind: WriteKind, what: String) -> ClusterError {
    match err {
        kube::Error::Api(ref resp) if resp.code == 404 => ClusterError::NotFound(what),
        kube::Error::Api(ref resp) if resp.code == 409 && kind == WriteKind::Create => {
            ClusterError::AlreadyExists(what)
        }
        kube::Error::Api(ref resp) if resp.code == 409 => {
            ClusterError::Conflict(format!("{what}: {}", resp.message))
        }
        other => ClusterError::Kube(other),
    }
}

/// Name, namespace and kind label for an object about to be written.
fn identity<K: Resource<DynamicType = ()>>(obj: &K) -> Result<(String, String), ClusterError> {
    let kind = K::kind(&());
    let name = obj
        .meta()
        .name
        .clone()
        .ok_or_else(|| ClusterError::InvalidObject(format!("{kind} missing name")))?;
    let namespace = obj
        .meta()
        .namespace
        .clone()
        .ok_or_else(|| ClusterError::InvalidObject(format!("{kind} {name} missing namespace")))?;
    Ok((name, namespace))
}

#[async_trait::async_trait]
impl ClusterClientTrait for KubeClusterClient {
    async fn get_calculator(&self, namespace: &str, name: &str) -> Result<Calculator, ClusterError> {
        self.calculators(namespace)
            .get(name)
            .await
            .map_err(|e| classify(e, WriteKind::Read, format!("Calculator {namespace}/{name}")))
    }

    async fn update_calculator_status(&self, calc: &Calculator) -> Result<Calculator, ClusterError> {
        let (name, namespace) = identity(calc)?;
        let resource_version = calc.resource_version().ok_or_else(|| {
            ClusterError::InvalidObject(format!("Calculator {namespace}/{name} missing resourceVersion"))
        })?;

        // resourceVersion in a merge patch makes the API server reject stale writes
        let status_patch = json!({
            "metadata": { "resourceVersion": resource_version },
            "status": calc.status,
        });

        debug!("Patching Calculator {}/{} status at resourceVersion {}", namespace, name, resource_version);
        self.calculators(&namespace)
            .patch_status(&name, &PatchParams::default(), &Patch::Merge(&status_patch))
            .await
            .map_err(|e| classify(e, WriteKind::Update, format!("Calculator {namespace}/{name}")))
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, ClusterError> {
        self.secrets(namespace)
            .get(name)
            .await
            .map_err(|e| classify(e, WriteKind::Read, format!("Secret {namespace}/{name}")))
    }

    async fn create_secret(&self, secret: &Secret) -> Result<Secret, ClusterError> {
        let (name, namespace) = identity(secret)?;
        self.secrets(&namespace)
            .create(&PostParams::default(), secret)
            .await
            .map_err(|e| classify(e, WriteKind::Create, format!("Secret {namespace}/{name}")))
    }

    async fn replace_secret(&self, secret: &Secret) -> Result<Secret, ClusterError> {
        let (name, namespace) = identity(secret)?;
        self.secrets(&namespace)
            .replace(&name, &PostParams::default(), secret)
            .await
            .map_err(|e| classify(e, WriteKind::Update, format!("Secret {namespace}/{name}")))
    }
}
