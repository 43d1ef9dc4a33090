//! Mock ClusterClient for unit testing
//!
//! In-memory store that behaves like the API server for the handful of
//! operations the controller uses: resourceVersion is advanced on every write,
//! stale writes are rejected with `Conflict`, and individual operations can be
//! made to fail to exercise error paths.

use crate::cluster_trait::ClusterClientTrait;
use crate::error::ClusterError;
use crds::{Calculator, CalculatorSpec, CalculatorStatus};
use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Key = (String, String);

/// Operations that can be made to fail via `MockClusterClient::fail_on`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    /// `get_calculator`
    GetCalculator,
    /// `update_calculator_status`
    UpdateCalculatorStatus,
    /// `get_secret`
    GetSecret,
    /// `create_secret`
    CreateSecret,
    /// `replace_secret`
    ReplaceSecret,
}

/// Mock ClusterClient for testing
#[derive(Clone, Default)]
pub struct MockClusterClient {
    calculators: Arc<Mutex<HashMap<Key, Calculator>>>,
    secrets: Arc<Mutex<HashMap<Key, Secret>>>,
    failures: Arc<Mutex<HashSet<MockOperation>>>,
    // Successful writes, per operation
    writes: Arc<Mutex<HashMap<MockOperation, usize>>>,
    // Counter for generating resourceVersions
    next_version: Arc<Mutex<u64>>,
    // Bump the Calculator's resourceVersion right after the next read
    concurrent_write: Arc<Mutex<bool>>,
    // Same, for the next `get_secret`
    concurrent_secret_write: Arc<Mutex<bool>>,
}

impl std::fmt::Debug for MockClusterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockClusterClient")
            .field("calculators", &lock(&self.calculators).len())
            .field("secrets", &lock(&self.secrets).len())
            .finish_non_exhaustive()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn key_of<K: ResourceExt>(obj: &K) -> Result<Key, ClusterError> {
    let name = obj
        .meta()
        .name
        .clone()
        .ok_or_else(|| ClusterError::InvalidObject("object missing name".to_string()))?;
    let namespace = obj
        .namespace()
        .ok_or_else(|| ClusterError::InvalidObject(format!("{name} missing namespace")))?;
    Ok((namespace, name))
}

impl MockClusterClient {
    /// Create an empty mock store
    pub fn new() -> Self {
        Self::default()
    }

    fn next_version(&self) -> String {
        let mut v = lock(&self.next_version);
        *v += 1;
        v.to_string()
    }

    fn check_failure(&self, op: MockOperation) -> Result<(), ClusterError> {
        if lock(&self.failures).contains(&op) {
            return Err(ClusterError::Unavailable(format!("injected failure for {op:?}")));
        }
        Ok(())
    }

    fn record_write(&self, op: MockOperation) {
        *lock(&self.writes).entry(op).or_insert(0) += 1;
    }

    /// Make every call to `op` fail with `ClusterError::Unavailable` until cleared
    pub fn fail_on(&self, op: MockOperation) {
        lock(&self.failures).insert(op);
    }

    /// Stop injecting failures for `op`
    pub fn clear_failure(&self, op: MockOperation) {
        lock(&self.failures).remove(&op);
    }

    /// Add a Calculator to the mock store (for test setup), assigning a fresh resourceVersion
    pub fn add_calculator(&self, mut calc: Calculator) -> Calculator {
        calc.metadata.resource_version = Some(self.next_version());
        if let Ok(key) = key_of(&calc) {
            lock(&self.calculators).insert(key, calc.clone());
        }
        calc
    }

    /// Add a Secret to the mock store (for test setup), assigning a fresh resourceVersion
    pub fn add_secret(&self, mut secret: Secret) -> Secret {
        secret.metadata.resource_version = Some(self.next_version());
        if let Ok(key) = key_of(&secret) {
            lock(&self.secrets).insert(key, secret.clone());
        }
        secret
    }

    /// Change a stored Calculator's spec as its owner would, advancing its resourceVersion
    pub fn set_calculator_spec(&self, namespace: &str, name: &str, spec: CalculatorSpec) {
        let version = self.next_version();
        if let Some(calc) = lock(&self.calculators).get_mut(&(namespace.to_string(), name.to_string())) {
            calc.spec = spec;
            calc.metadata.resource_version = Some(version);
        }
    }

    /// Simulate another writer touching the Calculator between the next
    /// `get_calculator` and the status write that follows it
    pub fn simulate_concurrent_write(&self) {
        *lock(&self.concurrent_write) = true;
    }

    /// Simulate another writer touching the Secret between the next
    /// `get_secret` and the replace that follows it
    pub fn simulate_concurrent_secret_write(&self) {
        *lock(&self.concurrent_secret_write) = true;
    }

    /// Remove a Calculator, as if deleted by its owner
    pub fn delete_calculator(&self, namespace: &str, name: &str) {
        lock(&self.calculators).remove(&(namespace.to_string(), name.to_string()));
    }

    /// Snapshot of a stored Calculator
    pub fn calculator(&self, namespace: &str, name: &str) -> Option<Calculator> {
        lock(&self.calculators).get(&(namespace.to_string(), name.to_string())).cloned()
    }

    /// Snapshot of a stored Calculator's status
    pub fn calculator_status(&self, namespace: &str, name: &str) -> Option<CalculatorStatus> {
        self.calculator(namespace, name).and_then(|c| c.status)
    }

    /// Snapshot of a stored Secret
    pub fn secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        lock(&self.secrets).get(&(namespace.to_string(), name.to_string())).cloned()
    }

    /// Number of Secrets in the store
    pub fn secret_count(&self) -> usize {
        lock(&self.secrets).len()
    }

    /// Successful writes recorded for `op`
    pub fn write_count(&self, op: MockOperation) -> usize {
        lock(&self.writes).get(&op).copied().unwrap_or(0)
    }

    /// Successful writes across all operations
    pub fn total_writes(&self) -> usize {
        lock(&self.writes).values().sum()
    }
}

#[async_trait::async_trait]
impl ClusterClientTrait for MockClusterClient {
    async fn get_calculator(&self, namespace: &str, name: &str) -> Result<Calculator, ClusterError> {
        self.check_failure(MockOperation::GetCalculator)?;
        let calc = self
            .calculator(namespace, name)
            .ok_or_else(|| ClusterError::NotFound(format!("Calculator {namespace}/{name}")))?;

        let race = std::mem::take(&mut *lock(&self.concurrent_write));
        if race {
            let version = self.next_version();
            if let Some(stored) = lock(&self.calculators).get_mut(&(namespace.to_string(), name.to_string())) {
                stored.metadata.resource_version = Some(version);
            }
        }
        Ok(calc)
    }

    async fn update_calculator_status(&self, calc: &Calculator) -> Result<Calculator, ClusterError> {
        self.check_failure(MockOperation::UpdateCalculatorStatus)?;
        let key = key_of(calc)?;
        let version = self.next_version();
        let mut calculators = lock(&self.calculators);
        let stored = calculators
            .get_mut(&key)
            .ok_or_else(|| ClusterError::NotFound(format!("Calculator {}/{}", key.0, key.1)))?;

        if calc.metadata.resource_version.is_none() {
            return Err(ClusterError::InvalidObject(format!(
                "Calculator {}/{} missing resourceVersion",
                key.0, key.1
            )));
        }
        if stored.metadata.resource_version != calc.metadata.resource_version {
            return Err(ClusterError::Conflict(format!(
                "Calculator {}/{}: the object has been modified",
                key.0, key.1
            )));
        }

        // Status subresource: only status is taken from the request
        stored.status = calc.status.clone();
        stored.metadata.resource_version = Some(version);
        let updated = stored.clone();
        drop(calculators);
        self.record_write(MockOperation::UpdateCalculatorStatus);
        Ok(updated)
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, ClusterError> {
        self.check_failure(MockOperation::GetSecret)?;
        let secret = self
            .secret(namespace, name)
            .ok_or_else(|| ClusterError::NotFound(format!("Secret {namespace}/{name}")))?;

        let race = std::mem::take(&mut *lock(&self.concurrent_secret_write));
        if race {
            let version = self.next_version();
            if let Some(stored) = lock(&self.secrets).get_mut(&(namespace.to_string(), name.to_string())) {
                stored.metadata.resource_version = Some(version);
            }
        }
        Ok(secret)
    }

    async fn create_secret(&self, secret: &Secret) -> Result<Secret, ClusterError> {
        self.check_failure(MockOperation::CreateSecret)?;
        let key = key_of(secret)?;
        let version = self.next_version();
        let mut secrets = lock(&self.secrets);
        if secrets.contains_key(&key) {
            return Err(ClusterError::AlreadyExists(format!("Secret {}/{}", key.0, key.1)));
        }
        let mut created = secret.clone();
        created.metadata.resource_version = Some(version);
        secrets.insert(key, created.clone());
        drop(secrets);
        self.record_write(MockOperation::CreateSecret);
        Ok(created)
    }

    async fn replace_secret(&self, secret: &Secret) -> Result<Secret, ClusterError> {
        self.check_failure(MockOperation::ReplaceSecret)?;
        let key = key_of(secret)?;
        let version = self.next_version();
        let mut secrets = lock(&self.secrets);
        let stored = secrets
            .get_mut(&key)
            .ok_or_else(|| ClusterError::NotFound(format!("Secret {}/{}", key.0, key.1)))?;
        if secret.metadata.resource_version.is_some()
            && secret.metadata.resource_version != stored.metadata.resource_version
        {
            return Err(ClusterError::Conflict(format!(
                "Secret {}/{}: the object has been modified",
                key.0, key.1
            )));
        }
        let mut replaced = secret.clone();
        replaced.metadata.resource_version = Some(version);
        *stored = replaced.clone();
        drop(secrets);
        self.record_write(MockOperation::ReplaceSecret);
        Ok(replaced)
    }
}
