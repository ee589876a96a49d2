// cmdbsync-core: Declarative reconciliation of CMDB resources.
//
// The pipeline for one resource is filter → set/delete → classify, run
// inside a login/logout guard. Resources are described by a data-driven
// catalog rather than per-table code.

pub mod classify;
pub mod config;
pub mod error;
pub mod filter;
pub mod guard;
pub mod manifest;
pub mod mode;
pub mod outcome;
pub mod reconcile;
pub mod schema;

#[cfg(test)]
pub(crate) mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use classify::classify;
pub use config::{LoginInfo, SessionConfig, TlsVerification};
pub use error::{CoreError, ReconcileError};
pub use filter::{DesiredState, filter, normalize_key};
pub use guard::{Connection, guarded, with_session};
pub use manifest::{Manifest, Task, TaskOutcome, TaskReport, apply_manifest};
pub use mode::{DEFAULT_VDOM, ReconcileMode, Scope};
pub use outcome::{Outcome, OutcomeReport};
pub use reconcile::{ReconcileRequest, Reconciler, reconcile, reconcile_with_mkey};
pub use schema::{Catalog, CatalogEntry, Registry, ResourceSchema};

// Session types callers need alongside the core API.
pub use cmdbsync_api::{ApiResponse, Error as ApiError, RestSession, Session};
