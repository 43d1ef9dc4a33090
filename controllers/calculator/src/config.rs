//! Controller configuration loaded from environment variables.

use crate::error::ControllerError;
use std::time::Duration;

/// Runtime settings for the Calculator Controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Namespace to watch; `None` watches all namespaces
    pub namespace: Option<String>,
    /// Deadline for a single reconciliation
    pub reconcile_timeout: Duration,
    /// Maximum concurrent reconciliations (distinct objects only)
    pub concurrency: u16,
    /// Quiet period after the last event before an object is reconciled
    pub debounce: Duration,
    /// First requeue delay after a failed reconciliation
    pub backoff_min: Duration,
    /// Upper bound on the requeue delay
    pub backoff_max: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: None,
            reconcile_timeout: Duration::from_secs(30),
            concurrency: 3,
            debounce: Duration::from_secs(1),
            backoff_min: Duration::from_secs(5),
            backoff_max: Duration::from_secs(300),
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unset variables fall back to defaults; set but unparsable ones are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let namespace = lookup("WATCH_NAMESPACE").filter(|ns| !ns.trim().is_empty());
        let reconcile_timeout =
            parse_secs(&lookup, "RECONCILE_TIMEOUT_SECS")?.unwrap_or(defaults.reconcile_timeout);
        let concurrency = match lookup("RECONCILE_CONCURRENCY") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| {
                ControllerError::InvalidConfig(format!("RECONCILE_CONCURRENCY={raw}: {e}"))
            })?,
            None => defaults.concurrency,
        };
        let debounce = parse_secs(&lookup, "RECONCILE_DEBOUNCE_SECS")?.unwrap_or(defaults.debounce);
        let backoff_min = parse_secs(&lookup, "BACKOFF_MIN_SECS")?.unwrap_or(defaults.backoff_min);
        let backoff_max = parse_secs(&lookup, "BACKOFF_MAX_SECS")?.unwrap_or(defaults.backoff_max);

        if reconcile_timeout.is_zero() {
            return Err(ControllerError::InvalidConfig(
                "RECONCILE_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }
        if backoff_min.is_zero() || backoff_min > backoff_max {
            return Err(ControllerError::InvalidConfig(format!(
                "backoff bounds must satisfy 0 < BACKOFF_MIN_SECS ({}) <= BACKOFF_MAX_SECS ({})",
                backoff_min.as_secs(),
                backoff_max.as_secs()
            )));
        }

        Ok(Self {
            namespace,
            reconcile_timeout,
            concurrency,
            debounce,
            backoff_min,
            backoff_max,
        })
    }
}

fn parse_secs<F>(lookup: &F, key: &str) -> Result<Option<Duration>, ControllerError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| ControllerError::InvalidConfig(format!("{key}={raw}: {e}")))
        })
        .transpose()
}
