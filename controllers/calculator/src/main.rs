//! Calculator Controller
//!
//! Watches Calculator resources, records `x + y` in their status and mirrors
//! the result into a Secret of the same name.

mod backoff;
mod config;
mod controller;
mod derivation;
mod error;
mod reconciler;
mod secret;
mod watcher;

#[cfg(test)]
mod reconciler_test;
mod test_utils;

use crate::config::Config;
use crate::error::ControllerError;
use controller::Controller;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // kube's rustls stack needs a process-wide crypto provider; Err means one is already installed
    let _ = rustls::crypto::ring::default_provider().install_default();

    info!("Starting Calculator Controller");

    let config = Config::from_env()?;

    info!("Configuration:");
    info!("  Namespace: {}", config.namespace.as_deref().unwrap_or("all namespaces"));
    info!("  Reconcile timeout: {:?}", config.reconcile_timeout);
    info!("  Concurrency: {}", config.concurrency);
    info!("  Debounce: {:?}", config.debounce);
    info!("  Backoff: {:?}..{:?}", config.backoff_min, config.backoff_max);

    let controller = Controller::new(config).await?;
    controller.run().await?;

    Ok(())
}
