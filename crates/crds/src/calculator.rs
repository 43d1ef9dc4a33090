//! Calculator CRD
//!
//! Declares two addends; the controller writes their sum back into status
//! and mirrors it into a Secret of the same name.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// CalculatorSpec defines the desired state of a Calculator
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[kube(
    group = "calc.example.com",
    version = "v1alpha1",
    kind = "Calculator",
    plural = "calculators",
    namespaced,
    status = "CalculatorStatus",
    printcolumn = r#"{"name":"X","type":"integer","jsonPath":".spec.x"}"#,
    printcolumn = r#"{"name":"Y","type":"integer","jsonPath":".spec.y"}"#,
    printcolumn = r#"{"name":"Result","type":"integer","jsonPath":".status.result"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorSpec {
    /// First addend
    pub x: i32,

    /// Second addend
    pub y: i32,
}

/// CalculatorStatus defines the observed state of a Calculator
///
/// Both fields are always serialized so a status write never leaves a stale
/// `result` behind; missing fields read back as `false` / `0`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorStatus {
    /// Whether `result` reflects the current spec
    #[serde(default)]
    pub processed: bool,

    /// Sum of `x` and `y`, wide enough that two int32 addends never wrap
    #[serde(default)]
    pub result: i64,
}

/// Reconciliation state of a Calculator, derived from its status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculatorState {
    /// No status yet, or `processed` is false
    Unprocessed,
    /// The controller has written a result
    Processed,
}

impl std::fmt::Display for CalculatorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unprocessed => f.write_str("Unprocessed"),
            Self::Processed => f.write_str("Processed"),
        }
    }
}

impl Calculator {
    /// Current reconciliation state.
    ///
    /// `Processed` does not imply the result is current: the spec may have
    /// changed since the last write.
    pub fn state(&self) -> CalculatorState {
        match &self.status {
            Some(status) if status.processed => CalculatorState::Processed,
            _ => CalculatorState::Unprocessed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::{CustomResourceExt, Resource};

    #[test]
    fn test_calculator_crd_metadata() {
        let crd = Calculator::crd();
        assert_eq!(crd.metadata.name.as_deref(), Some("calculators.calc.example.com"));
        assert_eq!(crd.spec.group, "calc.example.com");
        assert_eq!(crd.spec.scope, "Namespaced");
        assert_eq!(Calculator::kind(&()), "Calculator");
        assert_eq!(Calculator::api_version(&()), "calc.example.com/v1alpha1");

        let version = &crd.spec.versions[0];
        assert_eq!(version.name, "v1alpha1");
        assert!(
            version.subresources.as_ref().and_then(|s| s.status.as_ref()).is_some(),
            "Status subresource must be enabled for status writes"
        );
    }

    #[test]
    fn test_status_missing_fields_default() {
        let status: CalculatorStatus = serde_json::from_str("{}").unwrap();
        assert_eq!(status, CalculatorStatus { processed: false, result: 0 });
    }

    #[test]
    fn test_status_serializes_zero_result() {
        let status = CalculatorStatus { processed: true, result: 0 };
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value, serde_json::json!({ "processed": true, "result": 0 }));
    }

    #[test]
    fn test_status_holds_values_beyond_i32() {
        let json = r#"{"processed":true,"result":4294967294}"#;
        let status: CalculatorStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.result, 4_294_967_294);
    }

    #[test]
    fn test_calculator_state() {
        let mut calc = Calculator::new("calc", CalculatorSpec { x: 1, y: 2 });
        assert_eq!(calc.state(), CalculatorState::Unprocessed);

        calc.status = Some(CalculatorStatus { processed: false, result: 3 });
        assert_eq!(calc.state(), CalculatorState::Unprocessed);

        calc.status = Some(CalculatorStatus { processed: true, result: 3 });
        assert_eq!(calc.state(), CalculatorState::Processed);
    }
}
