// ── Core error types ──
//
// `ReconcileError` covers everything that can go wrong while converging one
// resource. `CoreError` covers setup: catalogs, manifests, and turning a
// `SessionConfig` into a live session. Neither exposes HTTP details beyond
// what the caller needs to report an outcome.

use thiserror::Error;

/// Why a reconciliation did not succeed.
#[derive(Debug, Error)]
pub enum ReconcileError {
    // ── Session ──────────────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthFailure { message: String },

    // ── Request validation ───────────────────────────────────────────
    #[error("Invalid state '{mode}' (expected 'present' or 'absent')")]
    InvalidMode { mode: String },

    #[error("Cannot delete {resource}: no value for key field '{key}'")]
    MissingKey { resource: String, key: String },

    #[error("{resource} is a singleton and cannot be deleted")]
    AbsentUnsupported { resource: String },

    #[error("Unknown resource: {token}")]
    UnknownResource { token: String },

    // ── Appliance replies ────────────────────────────────────────────
    #[error("Appliance returned status '{status}' (HTTP {http_status})")]
    ApiFailure { status: String, http_status: u16 },

    // ── Transport (propagated unchanged) ─────────────────────────────
    #[error(transparent)]
    Transport(#[from] cmdbsync_api::Error),
}

/// Errors raised while preparing a reconciliation run.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid resource catalog: {message}")]
    Catalog { message: String },

    #[error("Invalid manifest: {message}")]
    Manifest { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot open session: {0}")]
    Session(#[from] cmdbsync_api::Error),
}

impl From<toml::de::Error> for CoreError {
    fn from(err: toml::de::Error) -> Self {
        CoreError::Catalog {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for CoreError {
    fn from(err: serde_yaml::Error) -> Self {
        CoreError::Manifest {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Manifest {
            message: err.to_string(),
        }
    }
}
