//! Dependent Secret synchronization.
//!
//! Every Calculator has a Secret of the same name and namespace holding its
//! result. The Secret is created when missing and replaced wholesale when
//! present; fields added to it out of band are not preserved.

use crate::error::{ControllerError, SecretOperation};
use cluster_client::{ClusterClientTrait, ClusterError};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;
use tracing::info;

/// Annotation marking Secrets written by this controller
pub const MANAGED_BY_ANNOTATION: &str = "managed-by";
/// Value of the `managed-by` annotation
pub const MANAGED_BY_VALUE: &str = "calc-operator";
/// `stringData` key holding the decimal result
pub const RESULT_KEY: &str = "result";
/// Secret type
pub const SECRET_TYPE: &str = "Opaque";

/// What `sync_secret` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretSyncOutcome {
    /// The Secret did not exist and was created
    Created,
    /// The existing Secret was replaced
    Replaced,
}

/// Builds the Secret that mirrors `result` for the Calculator `namespace/name`.
pub fn define_secret(name: &str, namespace: &str, result: i64) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            annotations: Some(BTreeMap::from([(
                MANAGED_BY_ANNOTATION.to_string(),
                MANAGED_BY_VALUE.to_string(),
            )])),
            ..Default::default()
        },
        immutable: Some(false),
        string_data: Some(BTreeMap::from([(RESULT_KEY.to_string(), result.to_string())])),
        type_: Some(SECRET_TYPE.to_string()),
        ..Default::default()
    }
}

/// Creates or replaces the Secret for `namespace/name` so it holds `result`.
///
/// Performs exactly one write, or none if the initial read fails with anything
/// other than NotFound. Errors are returned with the failing operation attached
/// and are never retried here.
pub async fn sync_secret(
    client: &dyn ClusterClientTrait,
    name: &str,
    namespace: &str,
    result: i64,
) -> Result<SecretSyncOutcome, ControllerError> {
    let mut desired = define_secret(name, namespace, result);

    match client.get_secret(namespace, name).await {
        Err(ClusterError::NotFound(_)) => {
            info!("Target secret {}/{} doesn't exist, creating it", namespace, name);
            client
                .create_secret(&desired)
                .await
                .map_err(|source| ControllerError::SecretSync {
                    operation: SecretOperation::Create,
                    source,
                })?;
            Ok(SecretSyncOutcome::Created)
        }
        Ok(existing) => {
            info!("Target secret {}/{} exists, updating it now", namespace, name);
            // Full replace, guarded by the version we just read
            desired.metadata.resource_version = existing.metadata.resource_version;
            client
                .replace_secret(&desired)
                .await
                .map_err(|source| ControllerError::SecretSync {
                    operation: SecretOperation::Replace,
                    source,
                })?;
            Ok(SecretSyncOutcome::Replaced)
        }
        Err(source) => Err(ControllerError::SecretSync {
            operation: SecretOperation::Get,
            source,
        }),
    }
}
