// Reconciliation outcome

use cmdbsync_api::ApiResponse;
use serde::Serialize;

use crate::error::ReconcileError;

/// Result of converging one resource.
///
/// `failed` and `changed` are never both `true`. `raw` is `None` only when
/// no call reached the appliance.
#[derive(Debug)]
pub struct Outcome {
    failed: bool,
    changed: bool,
    raw: Option<ApiResponse>,
    error: Option<ReconcileError>,
}

impl Outcome {
    /// The object was written or removed.
    pub fn applied(raw: ApiResponse) -> Self {
        Self {
            failed: false,
            changed: true,
            raw: Some(raw),
            error: None,
        }
    }

    /// Nothing to do; the appliance already matched the desired state.
    pub fn noop(raw: ApiResponse) -> Self {
        Self {
            failed: false,
            changed: false,
            raw: Some(raw),
            error: None,
        }
    }

    /// The appliance answered but rejected the request.
    pub fn rejected(raw: ApiResponse) -> Self {
        let error = ReconcileError::ApiFailure {
            status: raw.status.clone(),
            http_status: raw.http_status,
        };
        Self {
            failed: true,
            changed: false,
            raw: Some(raw),
            error: Some(error),
        }
    }

    /// The reconciliation failed before a reply was obtained.
    pub fn failure(error: ReconcileError) -> Self {
        Self {
            failed: true,
            changed: false,
            raw: None,
            error: Some(error),
        }
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn changed(&self) -> bool {
        self.changed
    }

    pub fn raw(&self) -> Option<&ApiResponse> {
        self.raw.as_ref()
    }

    pub fn error(&self) -> Option<&ReconcileError> {
        self.error.as_ref()
    }

    /// Take the failure cause, if any.
    pub fn into_error(self) -> Option<ReconcileError> {
        self.error
    }

    /// Flatten into the serializable `{failed, changed, meta, msg}` report.
    pub fn report(&self) -> OutcomeReport {
        OutcomeReport {
            failed: self.failed,
            changed: self.changed,
            meta: self.raw.clone(),
            msg: self.error.as_ref().map(ToString::to_string),
        }
    }
}

/// Serializable view of an [`Outcome`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeReport {
    pub failed: bool,
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ApiResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}
