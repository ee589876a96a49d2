//! CLI configuration: thin wrapper around `cmdbsync_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--host, --vdom, --password, etc.) on top of the active profile.

use std::time::Duration;

use secrecy::SecretString;

use cmdbsync_core::{Registry, Scope, SessionConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use cmdbsync_config::{
    Config, Profile, config_path, load_config, load_config_or_default, save_config,
};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names, for error help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort_unstable();
    names.join(", ")
}

/// Build the resource registry: built-in catalog plus the user catalog.
pub fn registry(config: &Config) -> Result<Registry, CliError> {
    let catalog = config.catalog()?;
    Ok(Registry::from_catalog(&catalog)?)
}

/// Build a `SessionConfig` from the config file, profile, and CLI overrides.
pub fn session_config(global: &GlobalOpts, config: &Config) -> Result<SessionConfig, CliError> {
    let profile_name = active_profile_name(global, config);

    if let Some(profile) = config.profiles.get(&profile_name) {
        return resolve_profile(profile, &profile_name, global, config);
    }

    // An explicitly requested profile must exist
    if global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available_profiles(config),
        });
    }

    // No profile -- build from flags / env vars alone
    let host = global.host.clone().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;
    let (Some(username), Some(password)) = (global.username.clone(), global.password.clone())
    else {
        return Err(CliError::NoCredentials {
            profile: profile_name,
        });
    };

    let tls = if global.insecure || config.defaults.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(SessionConfig {
        host,
        username,
        password: SecretString::from(password),
        scope: global.vdom.as_deref().map(Scope::from).unwrap_or_default(),
        https: !global.http,
        tls,
        timeout: Duration::from_secs(global.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        debug: global.verbose >= 2,
    })
}

/// Translate a `Profile` + global flags into a `SessionConfig`.
///
/// CLI flag overrides take priority over profile values.
fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    global: &GlobalOpts,
    config: &Config,
) -> Result<SessionConfig, CliError> {
    let mut profile = profile.clone();

    if let Some(ref host) = global.host {
        profile.host.clone_from(host);
    }
    if let Some(ref username) = global.username {
        profile.username = Some(username.clone());
    }
    if let Some(ref password) = global.password {
        profile.password = Some(password.clone());
    }
    if let Some(ref vdom) = global.vdom {
        profile.vdom.clone_from(vdom);
    }
    if global.http {
        profile.https = Some(false);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    let mut session =
        cmdbsync_config::profile_to_session_config(&profile, profile_name, &config.defaults)?;

    // An explicit password flag beats the keyring
    if let Some(ref password) = global.password {
        session.password = SecretString::from(password.clone());
    }
    session.debug = global.verbose >= 2;

    Ok(session)
}
