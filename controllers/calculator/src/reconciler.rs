//! Reconciliation logic for Calculator CRDs.
//!
//! This module drives a Calculator towards its derived state:
//! fetch the current object, recompute its status, persist the status with
//! optimistic concurrency, then synchronize the dependent Secret.

use crate::derivation;
use crate::error::ControllerError;
use crate::secret::{self, SecretSyncOutcome};
use cluster_client::{ClusterClientTrait, ClusterError};
use tracing::{debug, info};

/// Result of a successful reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The Calculator no longer exists; nothing was written
    Deleted,
    /// Status and Secret now hold `result`
    Reconciled {
        /// The derived result written to status and Secret
        result: i64,
        /// Whether the Secret was created or replaced
        secret: SecretSyncOutcome,
    },
}

/// Reconciles Calculator resources.
///
/// Stateless between invocations: every call reads the Calculator fresh from
/// the cluster, so one instance can be shared across concurrent workers.
pub struct Reconciler {
    pub(crate) client: Box<dyn ClusterClientTrait + Send + Sync>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler").finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Creates a new reconciler instance.
    pub fn new(client: impl ClusterClientTrait + 'static) -> Self {
        Self {
            client: Box::new(client),
        }
    }

    /// Reconciles the Calculator `namespace/name`.
    ///
    /// This method:
    /// 1. Fetches the Calculator (NotFound means it was deleted: success, no writes)
    /// 2. Recomputes the status from the spec, whatever the current status says
    /// 3. Writes the status back at the fetched resourceVersion
    /// 4. Creates or replaces the Secret holding the result
    ///
    /// A failed status write stops before the Secret is touched. A failed
    /// Secret sync leaves the status committed; the next attempt converges.
    pub async fn reconcile_calculator(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<ReconcileOutcome, ControllerError> {
        info!("Reconciling Calculator {}/{}", namespace, name);

        let mut calc = match self.client.get_calculator(namespace, name).await {
            Ok(calc) => calc,
            Err(ClusterError::NotFound(_)) => {
                info!("Calculator {}/{} not found, assuming it was deleted", namespace, name);
                return Ok(ReconcileOutcome::Deleted);
            }
            Err(e) => return Err(ControllerError::GetCalculator(e)),
        };

        info!(
            "Got Calculator {}/{}: x={}, y={}, state={}",
            namespace,
            name,
            calc.spec.x,
            calc.spec.y,
            calc.state()
        );

        let status = derivation::compute(&calc.spec);
        if derivation::needs_recompute(&calc.spec, calc.status.as_ref()) {
            debug!("Calculator {}/{} status is stale, result becomes {}", namespace, name, status.result);
        } else {
            debug!("Calculator {}/{} status already current, rewriting", namespace, name);
        }
        let result = status.result;
        calc.status = Some(status);

        info!("Saving Calculator {}/{} status: processed=true, result={}", namespace, name, result);
        self.client
            .update_calculator_status(&calc)
            .await
            .map_err(ControllerError::UpdateStatus)?;

        let secret = secret::sync_secret(self.client.as_ref(), name, namespace, result).await?;

        info!("Reconciled Calculator {}/{} (secret {:?})", namespace, name, secret);
        Ok(ReconcileOutcome::Reconciled { result, secret })
    }
}
