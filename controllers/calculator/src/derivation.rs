//! Derivation of a Calculator's observed state from its spec.

use crds::{CalculatorSpec, CalculatorStatus};

/// Computes the status a Calculator should have for `spec`.
///
/// The sum is taken in `i64`, so `i32::MAX + i32::MAX` is `4294967294`
/// rather than a wrapped value.
pub fn compute(spec: &CalculatorSpec) -> CalculatorStatus {
    CalculatorStatus {
        processed: true,
        result: i64::from(spec.x) + i64::from(spec.y),
    }
}

/// Whether `status` differs from what `compute` would produce for `spec`.
///
/// Informational only: reconciliation always recomputes and writes, since a
/// changed spec is the only signal and it is not observable from the status.
pub fn needs_recompute(spec: &CalculatorSpec, status: Option<&CalculatorStatus>) -> bool {
    status != Some(&compute(spec))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(x: i32, y: i32) -> CalculatorSpec {
        CalculatorSpec { x, y }
    }

    #[test]
    fn test_compute_max_int32_does_not_wrap() {
        let status = compute(&spec(i32::MAX, i32::MAX));
        assert_eq!(status.result, 4_294_967_294);
        assert!(status.processed);
    }

    #[test]
    fn test_compute_min_int32_does_not_wrap() {
        let status = compute(&spec(i32::MIN, i32::MIN));
        assert_eq!(status.result, -4_294_967_296);
    }

    #[test]
    fn test_compute_mixed_signs() {
        assert_eq!(compute(&spec(i32::MAX, i32::MIN)).result, -1);
        assert_eq!(compute(&spec(-7, 3)).result, -4);
        assert_eq!(compute(&spec(0, 0)).result, 0);
    }

    #[test]
    fn test_needs_recompute() {
        let s = spec(1, 1);
        assert!(needs_recompute(&s, None));
        assert!(needs_recompute(&s, Some(&CalculatorStatus { processed: false, result: 2 })));
        // Stale result with processed=true still needs recomputing
        assert!(needs_recompute(&s, Some(&CalculatorStatus { processed: true, result: 0 })));
        assert!(!needs_recompute(&s, Some(&CalculatorStatus { processed: true, result: 2 })));
    }
}
