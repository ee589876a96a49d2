// ── Runtime session configuration ──
//
// These types describe *how* to reach an appliance. They carry credentials
// and transport tuning but never touch disk: the CLI resolves a profile and
// hands a `SessionConfig` in.

use std::path::PathBuf;
use std::time::Duration;

use cmdbsync_api::{RestSession, TlsMode, TransportConfig};
use secrecy::SecretString;

use crate::error::CoreError;
use crate::guard::Connection;
use crate::mode::Scope;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification. Appliances ship self-signed certificates.
    #[default]
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        }
    }
}

/// Everything `Session::login` needs, plus the toggles applied before it.
#[derive(Debug, Clone)]
pub struct LoginInfo {
    pub host: String,
    pub username: String,
    pub password: SecretString,
    pub https: bool,
    pub debug: bool,
}

/// Configuration for one appliance session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Host name or address, optionally with a scheme and port.
    pub host: String,
    pub username: String,
    pub password: SecretString,
    /// vdom every call is scoped to.
    pub scope: Scope,
    /// Use HTTPS (default) or plain HTTP.
    pub https: bool,
    pub tls: TlsVerification,
    pub timeout: Duration,
    /// Log request and response bodies.
    pub debug: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            username: "admin".into(),
            password: SecretString::from(String::new()),
            scope: Scope::default(),
            https: true,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            debug: false,
        }
    }
}

impl SessionConfig {
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: TlsMode::from(&self.tls),
            timeout: self.timeout,
            cookie_jar: None,
        }
        .with_cookie_jar()
    }

    pub fn login_info(&self) -> LoginInfo {
        LoginInfo {
            host: self.host.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            https: self.https,
            debug: self.debug,
        }
    }

    /// Guard mode for this config: log in and out around the work.
    pub fn connection(&self) -> Connection {
        Connection::Login(self.login_info())
    }

    /// Build an unauthenticated REST session for this appliance.
    pub fn open(&self) -> Result<RestSession, CoreError> {
        if self.host.trim().is_empty() {
            return Err(CoreError::Config {
                message: "no appliance host configured".into(),
            });
        }
        Ok(RestSession::new(&self.transport())?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn defaults_target_root_over_https() {
        let config = SessionConfig::default();
        assert!(config.https);
        assert_eq!(config.scope.as_str(), "root");
        assert_eq!(config.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn login_info_copies_credentials() {
        let config = SessionConfig {
            host: "fw.example.net".into(),
            password: SecretString::from("s3cret".to_string()),
            https: false,
            ..SessionConfig::default()
        };

        let info = config.login_info();
        assert_eq!(info.host, "fw.example.net");
        assert_eq!(info.username, "admin");
        assert_eq!(info.password.expose_secret(), "s3cret");
        assert!(!info.https);
        assert!(matches!(config.connection(), Connection::Login(_)));
    }

    #[test]
    fn transport_carries_tls_and_timeout() {
        let config = SessionConfig {
            tls: TlsVerification::CustomCa("/etc/ssl/fw.pem".into()),
            timeout: Duration::from_secs(5),
            ..SessionConfig::default()
        };

        let transport = config.transport();
        assert!(matches!(transport.tls, TlsMode::CustomCa(ref p) if p.ends_with("fw.pem")));
        assert_eq!(transport.timeout, Duration::from_secs(5));
        assert!(transport.cookie_jar.is_some());
    }

    #[test]
    fn open_requires_a_host() {
        let err = SessionConfig::default().open().unwrap_err();
        assert!(matches!(err, CoreError::Config { .. }));
    }
}
