// ── Resource reconciler ──
//
// One reconciliation is one CMDB call: filter the desired state through the
// resource schema, `set` or `delete`, classify the reply. Nothing is cached
// between calls and nothing is retried.

use cmdbsync_api::Session;
use serde_json::Value;
use tracing::{debug, info};

use crate::classify::classify;
use crate::error::ReconcileError;
use crate::filter::{DesiredState, filter};
use crate::mode::{ReconcileMode, Scope};
use crate::outcome::Outcome;
use crate::schema::{Registry, ResourceSchema};

/// Converge one resource described by `schema` to `desired`.
pub async fn reconcile<S: Session>(
    mode: ReconcileMode,
    schema: &ResourceSchema,
    desired: &DesiredState,
    scope: &Scope,
    session: &S,
) -> Result<Outcome, ReconcileError> {
    reconcile_with_mkey(mode, schema, desired, None, scope, session).await
}

/// Like [`reconcile`], with an explicit mkey used on delete when the desired
/// state does not carry the key field.
pub async fn reconcile_with_mkey<S: Session>(
    mode: ReconcileMode,
    schema: &ResourceSchema,
    desired: &DesiredState,
    mkey: Option<&Value>,
    scope: &Scope,
    session: &S,
) -> Result<Outcome, ReconcileError> {
    let token = schema.token();
    let filtered = filter(desired, schema.allowed_fields());
    debug!(resource = %token, %mode, vdom = %scope, fields = filtered.len(), "reconciling");

    let response = match mode {
        ReconcileMode::Present => {
            session
                .set(schema.category(), schema.table(), &filtered, scope.as_str())
                .await?
        }
        ReconcileMode::Absent => {
            let key = schema
                .key()
                .ok_or_else(|| ReconcileError::AbsentUnsupported {
                    resource: token.clone(),
                })?;
            let mkey = filtered
                .get(key)
                .filter(|v| addresses_object(v))
                .or(mkey.filter(|v| addresses_object(v)))
                .ok_or_else(|| ReconcileError::MissingKey {
                    resource: token.clone(),
                    key: key.to_owned(),
                })?;
            session
                .delete(schema.category(), schema.table(), mkey, scope.as_str())
                .await?
        }
    };

    let outcome = classify(response);
    info!(
        resource = %token,
        %mode,
        failed = outcome.failed(),
        changed = outcome.changed(),
        "reconciled"
    );
    Ok(outcome)
}

/// Null and empty-string keys cannot name an object.
fn addresses_object(value: &Value) -> bool {
    !(value.is_null() || value.as_str().is_some_and(str::is_empty))
}

// ── Registry-backed reconciler ──────────────────────────────────────

/// One unit of work addressed by resource token.
#[derive(Debug, Clone)]
pub struct ReconcileRequest {
    pub resource: String,
    pub mode: ReconcileMode,
    pub data: DesiredState,
    pub mkey: Option<Value>,
    pub scope: Scope,
}

impl ReconcileRequest {
    pub fn new(resource: impl Into<String>, mode: ReconcileMode, data: DesiredState) -> Self {
        Self {
            resource: resource.into(),
            mode,
            data,
            mkey: None,
            scope: Scope::default(),
        }
    }

    pub fn with_mkey(mut self, mkey: Value) -> Self {
        self.mkey = Some(mkey);
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }
}

/// Dispatches requests to the schema registered for their token.
#[derive(Debug, Clone)]
pub struct Reconciler {
    registry: Registry,
}

impl Reconciler {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub async fn run<S: Session>(
        &self,
        request: &ReconcileRequest,
        session: &S,
    ) -> Result<Outcome, ReconcileError> {
        let schema =
            self.registry
                .lookup(&request.resource)
                .ok_or_else(|| ReconcileError::UnknownResource {
                    token: request.resource.clone(),
                })?;

        reconcile_with_mkey(
            request.mode,
            &schema,
            &request.data,
            request.mkey.as_ref(),
            &request.scope,
            session,
        )
        .await
    }
}
