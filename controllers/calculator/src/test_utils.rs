//! Test utilities for unit testing the reconciler
//!
//! This module provides helpers for creating test data and setting up test scenarios.

#[cfg(test)]
use crate::reconciler::Reconciler;
#[cfg(test)]
use cluster_client::MockClusterClient;
#[cfg(test)]
use crds::{Calculator, CalculatorSpec, CalculatorStatus};
#[cfg(test)]
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Helper to create a test Calculator CRD
#[cfg(test)]
pub fn create_test_calculator(
    name: &str,
    namespace: &str,
    x: i32,
    y: i32,
    status: Option<CalculatorStatus>,
) -> Calculator {
    Calculator {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec: CalculatorSpec { x, y },
        status,
    }
}

/// Helper to create a reconciler sharing state with the returned mock
#[cfg(test)]
pub fn create_test_reconciler() -> (Reconciler, MockClusterClient) {
    let mock = MockClusterClient::new();
    (Reconciler::new(mock.clone()), mock)
}

/// The `result` entry of a Secret's stringData
#[cfg(test)]
pub fn secret_result(mock: &MockClusterClient, namespace: &str, name: &str) -> Option<String> {
    mock.secret(namespace, name)
        .and_then(|s| s.string_data)
        .and_then(|d| d.get(crate::secret::RESULT_KEY).cloned())
}
