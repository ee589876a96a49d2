// REST session HTTP plumbing
//
// Wraps `reqwest::Client` with CMDB URL construction, CSRF token handling,
// and reply parsing. Login/logout and the CMDB verbs are implemented as
// inherent methods in sibling files to keep this module focused on
// transport mechanics.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use reqwest::{Method, StatusCode};
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::response::ApiResponse;
use crate::transport::TransportConfig;

/// Name of the cookie carrying the CSRF token after login.
pub(crate) const CSRF_COOKIE: &str = "ccsrftoken";

/// Header the appliance expects the CSRF token echoed in.
pub(crate) const CSRF_HEADER: &str = "X-CSRFTOKEN";

/// Reqwest-backed [`Session`](crate::Session) for the appliance REST API.
///
/// The base URL is fixed at `login()` time from the host and the current
/// `https` toggle. All CMDB calls are scoped to that base. Interior state is
/// lock-protected so a session can be shared by reference.
pub struct RestSession {
    http: reqwest::Client,
    timeout: Duration,
    base_url: RwLock<Option<Url>>,
    /// CSRF token captured from the `ccsrftoken` cookie at login. Required on
    /// every mutating request.
    csrf_token: RwLock<Option<String>>,
    https: AtomicBool,
    debug: AtomicBool,
}

impl fmt::Debug for RestSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestSession")
            .field("base_url", &self.base_url())
            .field("csrf_token", &self.has_csrf_token().then_some("[redacted]"))
            .field("https", &self.https.load(Ordering::Relaxed))
            .field("debug", &self.debug_enabled())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RestSession {
    /// Create a new session from a `TransportConfig`.
    ///
    /// A cookie jar is added if the config lacks one -- the appliance keeps
    /// its session id in a cookie.
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let http = config.build_client()?;
        Ok(Self::from_parts(http, config.timeout))
    }

    /// Create a session around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self::from_parts(http, TransportConfig::default().timeout)
    }

    /// Adopt an already-authenticated connection.
    ///
    /// Used in connection-reuse mode: the caller established the session
    /// elsewhere and hands over the base URL and CSRF token.
    pub fn resume(http: reqwest::Client, base_url: Url, csrf_token: Option<String>) -> Self {
        let session = Self::with_client(http);
        *write(&session.base_url) = Some(base_url);
        *write(&session.csrf_token) = csrf_token;
        session
    }

    fn from_parts(http: reqwest::Client, timeout: Duration) -> Self {
        Self {
            http,
            timeout,
            base_url: RwLock::new(None),
            csrf_token: RwLock::new(None),
            https: AtomicBool::new(true),
            debug: AtomicBool::new(false),
        }
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The base URL of the current session, if logged in.
    pub fn base_url(&self) -> Option<Url> {
        read(&self.base_url).clone()
    }

    /// Whether a CSRF token is currently held.
    pub fn has_csrf_token(&self) -> bool {
        read(&self.csrf_token).is_some()
    }

    pub(crate) fn set_https(&self, enabled: bool) {
        self.https.store(enabled, Ordering::Relaxed);
    }

    pub(crate) fn set_debug(&self, enabled: bool) {
        self.debug.store(enabled, Ordering::Relaxed);
    }

    pub(crate) fn debug_enabled(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    // ── Session state ────────────────────────────────────────────────

    /// Build the base URL for `host`.
    ///
    /// A host that already carries a scheme is used verbatim; otherwise the
    /// scheme follows the `https` toggle.
    pub(crate) fn base_for_host(&self, host: &str) -> Result<Url, Error> {
        if host.contains("://") {
            return Ok(Url::parse(host)?);
        }
        let scheme = if self.https.load(Ordering::Relaxed) {
            "https"
        } else {
            "http"
        };
        Ok(Url::parse(&format!("{scheme}://{host}"))?)
    }

    pub(crate) fn begin(&self, base: Url) {
        *write(&self.base_url) = Some(base);
    }

    pub(crate) fn end(&self) {
        *write(&self.base_url) = None;
        *write(&self.csrf_token) = None;
    }

    pub(crate) fn require_base(&self) -> Result<Url, Error> {
        read(&self.base_url).clone().ok_or(Error::NotLoggedIn)
    }

    pub(crate) fn set_csrf_token(&self, token: String) {
        debug!("storing CSRF token");
        *write(&self.csrf_token) = Some(token);
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/api/v2/cmdb/{category}/{table}[/{mkey}]?vdom={vdom}`.
    pub(crate) fn cmdb_url(
        &self,
        category: &str,
        table: &str,
        mkey: Option<&str>,
        vdom: &str,
    ) -> Result<Url, Error> {
        let mut url = self.require_base()?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?;
            segments
                .pop_if_empty()
                .extend(["api", "v2", "cmdb", category, table]);
            if let Some(mkey) = mkey {
                segments.push(mkey);
            }
        }
        url.query_pairs_mut().append_pair("vdom", vdom);
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Attach the CSRF header to a request, if a token is held.
    pub(crate) fn apply_csrf(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match read(&self.csrf_token).as_deref() {
            Some(token) => builder.header(CSRF_HEADER, token),
            None => builder,
        }
    }

    /// Send a request and return the raw response, mapping transport failures.
    pub(crate) async fn dispatch(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, Error> {
        builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    timeout_secs: self.timeout.as_secs(),
                }
            } else {
                Error::Transport(e)
            }
        })
    }

    /// Send a CMDB request and parse the reply into an [`ApiResponse`].
    pub(crate) async fn cmdb_request(
        &self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Map<String, serde_json::Value>>,
    ) -> Result<ApiResponse, Error> {
        debug!("{method} {url}");
        if let Some(body) = body {
            if self.debug_enabled() {
                debug!(payload = %serde_json::Value::Object(body.clone()), "request body");
            }
        }

        let mut builder = self.http.request(method.clone(), url);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let resp = self.dispatch(self.apply_csrf(builder)).await?;

        self.parse_reply(&method, resp).await
    }

    /// Turn an HTTP response into an [`ApiResponse`].
    ///
    /// 401 is an auth error. Everything else becomes a response value, with
    /// `http_method`/`http_status` back-filled from the HTTP layer when the
    /// body omits them.
    pub(crate) async fn parse_reply(
        &self,
        method: &Method,
        resp: reqwest::Response,
    ) -> Result<ApiResponse, Error> {
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "session expired or invalid credentials".into(),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        if self.debug_enabled() {
            debug!(http_status = status.as_u16(), %body, "response body");
        } else {
            trace!(http_status = status.as_u16(), "response received");
        }

        match serde_json::from_str::<ApiResponse>(&body) {
            Ok(mut reply) => {
                if reply.http_method.is_empty() {
                    reply.http_method = method.as_str().to_owned();
                }
                if reply.http_status == 0 {
                    reply.http_status = status.as_u16();
                }
                Ok(reply)
            }
            Err(_) if !status.is_success() => {
                Ok(ApiResponse::bare("error", method.as_str(), status.as_u16()))
            }
            Err(e) => {
                let preview: String = body.chars().take(200).collect();
                Err(Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                })
            }
        }
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
