//! Unit tests for the Calculator reconciler

#[cfg(test)]
mod tests {
    use crate::error::ControllerError;
    use crate::reconciler::ReconcileOutcome;
    use crate::secret::{SecretSyncOutcome, MANAGED_BY_ANNOTATION, MANAGED_BY_VALUE};
    use crate::test_utils::*;
    use cluster_client::{ClusterError, MockOperation};
    use crds::{CalculatorSpec, CalculatorStatus};

    const NS: &str = "default";

    #[tokio::test]
    async fn test_reconcile_new_calculator() {
        let (reconciler, mock) = create_test_reconciler();
        mock.add_calculator(create_test_calculator("calc", NS, 2, 3, None));

        let outcome = reconciler.reconcile_calculator(NS, "calc").await.unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Reconciled { result: 5, secret: SecretSyncOutcome::Created }
        );
        assert_eq!(
            mock.calculator_status(NS, "calc"),
            Some(CalculatorStatus { processed: true, result: 5 })
        );
        assert_eq!(secret_result(&mock, NS, "calc").as_deref(), Some("5"));
        let secret = mock.secret(NS, "calc").unwrap();
        assert_eq!(
            secret.metadata.annotations.unwrap().get(MANAGED_BY_ANNOTATION).map(String::as_str),
            Some(MANAGED_BY_VALUE)
        );
        assert_eq!(secret.type_.as_deref(), Some("Opaque"));
    }

    #[tokio::test]
    async fn test_reconcile_max_int32_inputs() {
        let (reconciler, mock) = create_test_reconciler();
        mock.add_calculator(create_test_calculator("calc", NS, i32::MAX, i32::MAX, None));

        reconciler.reconcile_calculator(NS, "calc").await.unwrap();

        assert_eq!(mock.calculator_status(NS, "calc").unwrap().result, 4_294_967_294);
        assert_eq!(secret_result(&mock, NS, "calc").as_deref(), Some("4294967294"));
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let (reconciler, mock) = create_test_reconciler();
        mock.add_calculator(create_test_calculator("calc", NS, 4, 6, None));

        reconciler.reconcile_calculator(NS, "calc").await.unwrap();
        let first_status = mock.calculator_status(NS, "calc");
        let first_secret = mock.secret(NS, "calc").unwrap();

        let outcome = reconciler.reconcile_calculator(NS, "calc").await.unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Reconciled { result: 10, secret: SecretSyncOutcome::Replaced }
        );
        assert_eq!(mock.calculator_status(NS, "calc"), first_status);
        let second_secret = mock.secret(NS, "calc").unwrap();
        assert_eq!(second_secret.string_data, first_secret.string_data);
        assert_eq!(second_secret.metadata.annotations, first_secret.metadata.annotations);
        assert_eq!(mock.secret_count(), 1);
    }

    #[tokio::test]
    async fn test_reconcile_corrects_unprocessed_flag() {
        let (reconciler, mock) = create_test_reconciler();
        mock.add_calculator(create_test_calculator(
            "calc",
            NS,
            1,
            1,
            Some(CalculatorStatus { processed: false, result: 2 }),
        ));

        reconciler.reconcile_calculator(NS, "calc").await.unwrap();

        assert_eq!(
            mock.calculator_status(NS, "calc"),
            Some(CalculatorStatus { processed: true, result: 2 })
        );
    }

    #[tokio::test]
    async fn test_reconcile_overwrites_stale_processed_result() {
        let (reconciler, mock) = create_test_reconciler();
        mock.add_calculator(create_test_calculator(
            "calc",
            NS,
            1,
            1,
            Some(CalculatorStatus { processed: true, result: 0 }),
        ));

        reconciler.reconcile_calculator(NS, "calc").await.unwrap();

        assert_eq!(
            mock.calculator_status(NS, "calc"),
            Some(CalculatorStatus { processed: true, result: 2 })
        );
        assert_eq!(secret_result(&mock, NS, "calc").as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_reconcile_follows_spec_change() {
        let (reconciler, mock) = create_test_reconciler();
        mock.add_calculator(create_test_calculator("calc", NS, 1, 1, None));
        reconciler.reconcile_calculator(NS, "calc").await.unwrap();

        mock.set_calculator_spec(NS, "calc", CalculatorSpec { x: 4, y: 6 });
        reconciler.reconcile_calculator(NS, "calc").await.unwrap();

        assert_eq!(mock.calculator_status(NS, "calc").unwrap().result, 10);
        assert_eq!(secret_result(&mock, NS, "calc").as_deref(), Some("10"));
    }

    #[tokio::test]
    async fn test_reconcile_deleted_calculator() {
        let (reconciler, mock) = create_test_reconciler();

        let outcome = reconciler.reconcile_calculator(NS, "gone").await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::Deleted);
        assert_eq!(mock.total_writes(), 0);
        assert_eq!(mock.secret_count(), 0);
    }

    #[tokio::test]
    async fn test_reconcile_after_delete_leaves_secret() {
        let (reconciler, mock) = create_test_reconciler();
        mock.add_calculator(create_test_calculator("calc", NS, 1, 2, None));
        reconciler.reconcile_calculator(NS, "calc").await.unwrap();

        mock.delete_calculator(NS, "calc");
        let outcome = reconciler.reconcile_calculator(NS, "calc").await.unwrap();

        // No garbage collection of the dependent Secret
        assert_eq!(outcome, ReconcileOutcome::Deleted);
        assert_eq!(secret_result(&mock, NS, "calc").as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn test_reconcile_get_failure_propagates() {
        let (reconciler, mock) = create_test_reconciler();
        mock.add_calculator(create_test_calculator("calc", NS, 1, 2, None));
        mock.fail_on(MockOperation::GetCalculator);

        let err = reconciler.reconcile_calculator(NS, "calc").await.unwrap_err();

        assert!(matches!(err, ControllerError::GetCalculator(ClusterError::Unavailable(_))));
        assert_eq!(mock.total_writes(), 0);
    }

    #[tokio::test]
    async fn test_reconcile_conflict_skips_secret() {
        let (reconciler, mock) = create_test_reconciler();
        mock.add_calculator(create_test_calculator("calc", NS, 2, 3, None));
        mock.simulate_concurrent_write();

        let err = reconciler.reconcile_calculator(NS, "calc").await.unwrap_err();

        assert!(err.is_conflict());
        assert!(matches!(err, ControllerError::UpdateStatus(ClusterError::Conflict(_))));
        assert!(mock.calculator_status(NS, "calc").is_none());
        assert_eq!(mock.secret_count(), 0);
        assert_eq!(mock.total_writes(), 0);

        // A fresh attempt re-reads the object and succeeds
        reconciler.reconcile_calculator(NS, "calc").await.unwrap();
        assert_eq!(mock.calculator_status(NS, "calc").unwrap().result, 5);
        assert_eq!(secret_result(&mock, NS, "calc").as_deref(), Some("5"));
    }

    #[tokio::test]
    async fn test_reconcile_status_failure_skips_secret() {
        let (reconciler, mock) = create_test_reconciler();
        mock.add_calculator(create_test_calculator("calc", NS, 2, 3, None));
        mock.fail_on(MockOperation::UpdateCalculatorStatus);

        let err = reconciler.reconcile_calculator(NS, "calc").await.unwrap_err();

        assert!(matches!(err, ControllerError::UpdateStatus(ClusterError::Unavailable(_))));
        assert!(!err.is_conflict());
        assert_eq!(mock.secret_count(), 0);
    }

    #[tokio::test]
    async fn test_reconcile_secret_failure_converges_on_retry() {
        let (reconciler, mock) = create_test_reconciler();
        mock.add_calculator(create_test_calculator("calc", NS, 2, 3, None));
        mock.fail_on(MockOperation::CreateSecret);

        let err = reconciler.reconcile_calculator(NS, "calc").await.unwrap_err();

        // Status is committed even though the Secret is missing
        assert!(matches!(err, ControllerError::SecretSync { .. }));
        assert_eq!(
            mock.calculator_status(NS, "calc"),
            Some(CalculatorStatus { processed: true, result: 5 })
        );
        assert_eq!(mock.secret_count(), 0);

        mock.clear_failure(MockOperation::CreateSecret);
        let outcome = reconciler.reconcile_calculator(NS, "calc").await.unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Reconciled { result: 5, secret: SecretSyncOutcome::Created }
        );
        assert_eq!(secret_result(&mock, NS, "calc").as_deref(), Some("5"));
    }

    #[tokio::test]
    async fn test_reconcile_is_namespace_scoped() {
        let (reconciler, mock) = create_test_reconciler();
        mock.add_calculator(create_test_calculator("calc", "team-a", 1, 1, None));
        mock.add_calculator(create_test_calculator("calc", "team-b", 5, 5, None));

        reconciler.reconcile_calculator("team-a", "calc").await.unwrap();

        assert_eq!(secret_result(&mock, "team-a", "calc").as_deref(), Some("2"));
        assert!(mock.secret("team-b", "calc").is_none());
        assert!(mock.calculator_status("team-b", "calc").is_none());
    }
}
