use thiserror::Error;

/// Top-level error type for the `cmdbsync-api` crate.
///
/// Only failures that prevent a CMDB reply from being produced live here.
/// A reply with a non-success `status` is *not* an error at this layer --
/// it comes back as an [`ApiResponse`](crate::ApiResponse) so the caller can
/// classify it. `cmdbsync-core` maps these into reconciliation errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed (wrong credentials, account locked, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// A CMDB call was attempted before `login()` succeeded.
    #[error("Not logged in -- call login() first")]
    NotLoggedIn,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// The mkey value cannot address an object (null, bool, array, ...).
    #[error("Invalid mkey: {mkey}")]
    InvalidMkey { mkey: String },

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

