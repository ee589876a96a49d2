// ── Outcome classifier ──
//
// Maps an appliance reply onto failed/changed. A DELETE answered with 404
// means the object was already gone: not a failure, nothing changed.

use cmdbsync_api::ApiResponse;
use tracing::debug;

use crate::outcome::Outcome;

/// Classify a CMDB reply.
pub fn classify(response: ApiResponse) -> Outcome {
    if response.is_success() {
        return Outcome::applied(response);
    }
    if response.is_delete_not_found() {
        debug!("object already absent");
        return Outcome::noop(response);
    }
    debug!(
        status = %response.status,
        http_status = response.http_status,
        "request rejected"
    );
    Outcome::rejected(response)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ReconcileError;

    #[test]
    fn success_is_a_change() {
        let outcome = classify(ApiResponse::bare("success", "PUT", 200));
        assert!(!outcome.failed());
        assert!(outcome.changed());
        assert!(outcome.error().is_none());
    }

    #[test]
    fn delete_404_is_an_idempotent_noop() {
        let outcome = classify(ApiResponse::bare("error", "DELETE", 404));
        assert!(!outcome.failed());
        assert!(!outcome.changed());
        assert_eq!(outcome.raw().unwrap().http_status, 404);
    }

    #[test]
    fn put_404_is_a_failure() {
        let outcome = classify(ApiResponse::bare("error", "PUT", 404));
        assert!(outcome.failed());
        assert!(!outcome.changed());
    }

    #[test]
    fn generic_failure_keeps_the_raw_reply() {
        let outcome = classify(ApiResponse::bare("failure", "POST", 500));
        assert!(outcome.failed());
        assert!(!outcome.changed());
        assert_eq!(outcome.raw().unwrap().status, "failure");
        assert!(matches!(
            outcome.error(),
            Some(ReconcileError::ApiFailure { http_status: 500, .. })
        ));
    }

    #[test]
    fn report_carries_meta_and_message() {
        let report = classify(ApiResponse::bare("error", "PUT", 500)).report();
        assert!(report.failed);
        assert!(report.meta.is_some());
        assert!(report.msg.unwrap().contains("HTTP 500"));

        let report = classify(ApiResponse::bare("success", "PUT", 200)).report();
        assert!(report.msg.is_none());
    }
}
