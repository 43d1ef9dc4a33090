//! Kubernetes resource watcher.
//!
//! Hooks the reconciler up to `kube_runtime::Controller`, which owns the
//! watch, the work queue and per-object serialization. A reconcile error is
//! handed to `error_policy`, which picks the requeue delay.

use crate::backoff::RequeueBackoff;
use crate::config::Config;
use crate::error::ControllerError;
use crate::reconciler::{ReconcileOutcome, Reconciler};
use crds::Calculator;
use futures::StreamExt;
use kube::Api;
use kube_runtime::{Controller, watcher, controller::{Action, Config as ControllerConfig}};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Shared state handed to every reconcile and error-policy call.
#[derive(Debug)]
pub struct Context {
    reconciler: Reconciler,
    backoff: RequeueBackoff,
    reconcile_timeout: Duration,
}

impl Context {
    /// Creates the context from a reconciler and controller settings.
    pub fn new(reconciler: Reconciler, config: &Config) -> Self {
        Self {
            reconciler,
            backoff: RequeueBackoff::new(config.backoff_min, config.backoff_max),
            reconcile_timeout: config.reconcile_timeout,
        }
    }
}

/// `namespace/name` of a Calculator handed over by the runtime.
fn object_key(calc: &Calculator) -> Result<(String, String), ControllerError> {
    let name = calc
        .metadata
        .name
        .clone()
        .ok_or(ControllerError::MissingObjectKey(".metadata.name"))?;
    let namespace = calc
        .metadata
        .namespace
        .clone()
        .ok_or(ControllerError::MissingObjectKey(".metadata.namespace"))?;
    Ok((namespace, name))
}

/// Reconcile entry point called by the runtime.
///
/// Only the identity of `calc` is used; the reconciler re-reads the object so
/// a stale cache entry never feeds a write.
pub(crate) async fn reconcile(calc: Arc<Calculator>, ctx: Arc<Context>) -> Result<Action, ControllerError> {
    let (namespace, name) = object_key(&calc)?;

    let outcome = tokio::time::timeout(
        ctx.reconcile_timeout,
        ctx.reconciler.reconcile_calculator(&namespace, &name),
    )
    .await
    .map_err(|_elapsed| ControllerError::Timeout(ctx.reconcile_timeout))??;

    ctx.backoff.reset(&format!("{namespace}/{name}"));
    match outcome {
        ReconcileOutcome::Deleted => debug!("Calculator {}/{} gone, nothing to do", namespace, name),
        ReconcileOutcome::Reconciled { result, secret } => {
            debug!("Calculator {}/{} settled at {} (secret {:?})", namespace, name, result, secret);
        }
    }
    Ok(Action::await_change())
}

/// Error policy: conflicts retry at the minimum delay, everything else backs off.
pub(crate) fn error_policy(calc: Arc<Calculator>, error: &ControllerError, ctx: Arc<Context>) -> Action {
    let key = object_key(&calc)
        .map(|(namespace, name)| format!("{namespace}/{name}"))
        .unwrap_or_else(|_| "<unknown>".to_string());

    let delay = if error.is_conflict() {
        ctx.backoff.min()
    } else {
        ctx.backoff.next_for(&key)
    };

    if error.is_conflict() {
        warn!("Calculator {} changed while reconciling, retrying in {:?}: {}", key, delay, error);
    } else {
        error!("Reconciliation error for Calculator {}: {}, requeue in {:?}", key, error, delay);
    }
    Action::requeue(delay)
}

/// Watches Calculator resources until the controller is shut down.
pub async fn watch_calculators(
    api: Api<Calculator>,
    ctx: Arc<Context>,
    config: &Config,
) -> Result<(), ControllerError> {
    info!("Starting Calculator watcher");

    // Concurrency only applies across distinct objects; the runtime never
    // runs two reconciles for the same object at once
    let controller_config = ControllerConfig::default()
        .debounce(config.debounce)
        .concurrency(config.concurrency);

    Controller::new(api, watcher::Config::default())
        .with_config(controller_config)
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(|res| async move {
            match res {
                Ok((obj, _action)) => debug!("Reconciled {}", obj),
                Err(e) => warn!("Controller error for Calculator: {}", e),
            }
        })
        .await;

    info!("Calculator watcher stopped");
    Ok(())
}
