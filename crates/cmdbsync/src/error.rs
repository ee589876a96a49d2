//! CLI error types with miette diagnostics.
//!
//! Maps core, config, and session errors into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use cmdbsync_config::ConfigError;
use cmdbsync_core::{ApiError, CoreError, ReconcileError};

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
#[allow(unused_assignments)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the appliance")]
    #[diagnostic(
        code(cmdbsync::connection_failed),
        help(
            "Check that the appliance is reachable and the host is correct.\n\
             Try --http if the management interface does not speak HTTPS."
        )
    )]
    ConnectionFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("TLS error: {message}")]
    #[diagnostic(
        code(cmdbsync::tls_error),
        help(
            "The appliance is probably using a self-signed certificate.\n\
             Use --insecure (-k) to accept it, or configure ca_cert in your profile."
        )
    )]
    TlsError { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(cmdbsync::auth_failed),
        help(
            "Verify the username and password for this appliance.\n\
             Run: cmdbsync config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(cmdbsync::no_credentials),
        help(
            "Configure credentials with: cmdbsync config init\n\
             Or set CMDBSYNC_USERNAME and CMDBSYNC_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("Unknown resource '{resource}'")]
    #[diagnostic(
        code(cmdbsync::not_found),
        help("Run: cmdbsync resources list to see available resources")
    )]
    NotFound { resource: String },

    #[error("Appliance rejected {resource}: status '{status}' (HTTP {http_status})")]
    #[diagnostic(code(cmdbsync::rejected))]
    Rejected {
        resource: String,
        status: String,
        http_status: u16,
    },

    #[error("{failed} of {total} tasks failed")]
    #[diagnostic(
        code(cmdbsync::batch_failed),
        help("Re-run with -v to see why each task failed.")
    )]
    BatchFailed { failed: usize, total: usize },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(cmdbsync::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(cmdbsync::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: cmdbsync config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No appliance configured")]
    #[diagnostic(
        code(cmdbsync::no_config),
        help(
            "Create a profile with: cmdbsync config init\n\
             Or pass --host. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(cmdbsync::config))]
    Config(Box<figment::Error>),

    #[error("Invalid resource catalog: {message}")]
    #[diagnostic(
        code(cmdbsync::catalog),
        help("Check the file named by `catalog` in your config.")
    )]
    Catalog { message: String },

    #[error("Invalid manifest: {message}")]
    #[diagnostic(
        code(cmdbsync::manifest),
        help("Every task needs `resource` and `state`; `data` and `mkey` are optional.")
    )]
    Manifest { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(cmdbsync::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    #[error("Aborted")]
    #[diagnostic(code(cmdbsync::aborted))]
    Aborted,

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(cmdbsync::timeout),
        help("Increase timeout with --timeout or check appliance responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Unexpected appliance reply: {message}")]
    #[diagnostic(code(cmdbsync::protocol))]
    Protocol { message: String },
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::Manifest { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────────

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Authentication { message } => Self::AuthFailed { message },
            ApiError::NotLoggedIn => Self::AuthFailed {
                message: "session is not logged in".into(),
            },
            ApiError::Timeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },
            ApiError::Tls(message) => Self::TlsError { message },
            ApiError::InvalidUrl(e) => Self::Validation {
                field: "host".into(),
                reason: e.to_string(),
            },
            ApiError::InvalidMkey { mkey } => Self::Validation {
                field: "mkey".into(),
                reason: format!("cannot address an object with {mkey}"),
            },
            ApiError::Deserialization { message, .. } => Self::Protocol { message },
            ApiError::Transport(e) => Self::ConnectionFailed {
                source: Box::new(e),
            },
        }
    }
}

impl From<ReconcileError> for CliError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::AuthFailure { message } => Self::AuthFailed { message },
            ReconcileError::UnknownResource { token } => Self::NotFound { resource: token },
            ReconcileError::InvalidMode { mode } => Self::Validation {
                field: "state".into(),
                reason: format!("'{mode}' is not 'present' or 'absent'"),
            },
            e @ (ReconcileError::MissingKey { .. } | ReconcileError::AbsentUnsupported { .. }) => {
                Self::Validation {
                    field: "state".into(),
                    reason: e.to_string(),
                }
            }
            ReconcileError::ApiFailure {
                status,
                http_status,
            } => Self::Rejected {
                resource: "request".into(),
                status,
                http_status,
            },
            ReconcileError::Transport(e) => e.into(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Catalog { message } => Self::Catalog { message },
            CoreError::Manifest { message } => Self::Manifest { message },
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Io(e) => Self::Io(e),
            CoreError::Session(e) => e.into(),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::Serialization(e) => Self::Validation {
                field: "config".into(),
                reason: e.to_string(),
            },
            ConfigError::Figment(e) => Self::Config(e),
            ConfigError::Catalog(e) => e.into(),
            ConfigError::Io(e) => Self::Io(e),
        }
    }
}
