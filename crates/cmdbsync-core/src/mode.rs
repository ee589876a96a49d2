// Reconcile mode and scope

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ReconcileError;

/// The vdom used when none is configured.
pub const DEFAULT_VDOM: &str = "root";

/// Desired end state of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileMode {
    /// Ensure the object exists with the given values.
    Present,
    /// Ensure the object does not exist.
    Absent,
}

impl ReconcileMode {
    /// Parse `present` / `absent` (case-insensitive, surrounding whitespace
    /// ignored).
    pub fn parse(mode: &str) -> Result<Self, ReconcileError> {
        mode.trim()
            .parse()
            .map_err(|_| ReconcileError::InvalidMode {
                mode: mode.to_owned(),
            })
    }
}

/// Virtual-domain scope every CMDB call is issued in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(String);

impl Scope {
    pub fn new(vdom: impl Into<String>) -> Self {
        Self(vdom.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self(DEFAULT_VDOM.to_owned())
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Scope {
    fn from(vdom: &str) -> Self {
        Self::new(vdom)
    }
}

impl From<String> for Scope {
    fn from(vdom: String) -> Self {
        Self(vdom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!(ReconcileMode::parse("present").unwrap(), ReconcileMode::Present);
        assert_eq!(ReconcileMode::parse("ABSENT").unwrap(), ReconcileMode::Absent);
        assert_eq!(ReconcileMode::parse(" Present ").unwrap(), ReconcileMode::Present);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let err = ReconcileMode::parse("enabled").unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidMode { ref mode } if mode == "enabled"));
    }

    #[test]
    fn mode_displays_lowercase() {
        assert_eq!(ReconcileMode::Absent.to_string(), "absent");
    }

    #[test]
    fn scope_defaults_to_root() {
        assert_eq!(Scope::default().as_str(), "root");
        assert_eq!(Scope::from("vd1").to_string(), "vd1");
    }
}
