//! Main controller implementation.
//!
//! This module contains the `Controller` struct that wires the Kubernetes
//! client, the reconciler and the Calculator watcher together.

use crate::config::Config;
use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use crate::watcher::{self, Context};
use cluster_client::KubeClusterClient;
use crds::Calculator;
use kube::{Api, Client};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Main controller for Calculator resources.
pub struct Controller {
    calculator_watcher: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    /// Creates a new controller instance and starts watching.
    pub async fn new(config: Config) -> Result<Self, ControllerError> {
        info!("Initializing Calculator Controller");

        let kube_client = Client::try_default().await?;

        let calculator_api: Api<Calculator> = match config.namespace.as_deref() {
            Some(ns) => Api::namespaced(kube_client.clone(), ns),
            None => Api::all(kube_client.clone()),
        };

        let reconciler = Reconciler::new(KubeClusterClient::new(kube_client));
        let ctx = Arc::new(Context::new(reconciler, &config));

        let calculator_watcher = tokio::spawn(async move {
            watcher::watch_calculators(calculator_api, ctx, &config).await
        });

        Ok(Self { calculator_watcher })
    }

    /// Runs until the watcher exits, which happens on SIGINT/SIGTERM.
    pub async fn run(self) -> Result<(), ControllerError> {
        info!("Calculator Controller running");

        self.calculator_watcher
            .await
            .map_err(|e| ControllerError::Watch(format!("Calculator watcher panicked: {}", e)))??;

        info!("Calculator Controller stopped");
        Ok(())
    }
}
