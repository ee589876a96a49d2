// ── Batch manifests ──
//
// A manifest lists reconciliation tasks that run back to back inside one
// guarded session. A failing task is recorded and the batch moves on.
//
// ```yaml
// vdom: root
// tasks:
//   - resource: user.device
//     state: present
//     data: { alias: laptop, master_device: desk }
//   - resource: system.storage
//     state: absent
//     mkey: disk1
// ```

use std::path::Path;

use cmdbsync_api::Session;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{CoreError, ReconcileError};
use crate::filter::DesiredState;
use crate::guard::{Connection, guarded};
use crate::mode::{ReconcileMode, Scope};
use crate::outcome::{Outcome, OutcomeReport};
use crate::reconcile::{ReconcileRequest, Reconciler};

/// A batch of tasks sharing one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// vdom for every task. Falls back to the configured scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vdom: Option<String>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// One resource to converge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// `category.table` token.
    pub resource: String,
    /// `present` or `absent`. Validated when the task runs.
    pub state: String,
    #[serde(default)]
    pub data: DesiredState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mkey: Option<Value>,
}

impl Task {
    pub fn request(&self, scope: &Scope) -> Result<ReconcileRequest, ReconcileError> {
        let mode = ReconcileMode::parse(&self.state)?;
        let mut request =
            ReconcileRequest::new(&self.resource, mode, self.data.clone()).with_scope(scope.clone());
        if let Some(ref mkey) = self.mkey {
            request = request.with_mkey(mkey.clone());
        }
        Ok(request)
    }
}

impl Manifest {
    pub fn from_yaml_str(source: &str) -> Result<Self, CoreError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_json_str(source: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Load a manifest, picking the format from the file extension
    /// (`.json` is JSON, anything else is YAML).
    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let source = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            Self::from_json_str(&source)
        } else {
            Self::from_yaml_str(&source)
        };
        parsed.map_err(|e| CoreError::Manifest {
            message: format!("{}: {e}", path.display()),
        })
    }

    /// Scope the tasks run in.
    pub fn scope(&self, default: &Scope) -> Scope {
        self.vdom
            .as_deref()
            .map_or_else(|| default.clone(), Scope::from)
    }
}

/// Outcome of one manifest task.
#[derive(Debug)]
pub struct TaskOutcome {
    pub resource: String,
    pub outcome: Outcome,
}

impl TaskOutcome {
    pub fn report(&self) -> TaskReport {
        TaskReport {
            resource: self.resource.clone(),
            report: self.outcome.report(),
        }
    }
}

/// Serializable view of a [`TaskOutcome`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskReport {
    pub resource: String,
    #[serde(flatten)]
    pub report: OutcomeReport,
}

/// Run every task of `manifest` inside one guarded session.
///
/// Always yields one outcome per task, in order. If login fails, every task
/// carries the authentication failure.
pub async fn apply_manifest<S: Session>(
    reconciler: &Reconciler,
    manifest: &Manifest,
    default_scope: &Scope,
    session: &S,
    connection: &Connection,
) -> Vec<TaskOutcome> {
    let scope = manifest.scope(default_scope);
    let scope = &scope;
    let tasks = manifest.tasks.as_slice();

    let result = guarded(session, connection, |s| run_tasks(reconciler, tasks, scope, s)).await;

    match result {
        Ok(outcomes) => outcomes,
        Err(e) => {
            let message = match e {
                ReconcileError::AuthFailure { message } => message,
                other => other.to_string(),
            };
            tasks
                .iter()
                .map(|task| TaskOutcome {
                    resource: task.resource.clone(),
                    outcome: Outcome::failure(ReconcileError::AuthFailure {
                        message: message.clone(),
                    }),
                })
                .collect()
        }
    }
}

async fn run_tasks<S: Session>(
    reconciler: &Reconciler,
    tasks: &[Task],
    scope: &Scope,
    session: &S,
) -> Vec<TaskOutcome> {
    let mut outcomes = Vec::with_capacity(tasks.len());

    for (index, task) in tasks.iter().enumerate() {
        debug!(task = index, resource = %task.resource, state = %task.state, "running task");
        let outcome = match task.request(scope) {
            Ok(request) => reconciler
                .run(&request, session)
                .await
                .unwrap_or_else(Outcome::failure),
            Err(e) => Outcome::failure(e),
        };
        if let Some(e) = outcome.error() {
            warn!(task = index, resource = %task.resource, error = %e, "task failed");
        }
        outcomes.push(TaskOutcome {
            resource: task.resource.clone(),
            outcome,
        });
    }

    outcomes
}
