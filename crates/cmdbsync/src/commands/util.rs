//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;

use serde_json::Value;

use cmdbsync_core::DesiredState;

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal on stdin, refuses instead of prompting.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read a desired-state object for `--from-file`.
///
/// `.json` files are parsed as JSON, anything else as YAML.
pub fn read_data_file(path: &Path) -> Result<DesiredState, CliError> {
    let contents = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let parsed: Result<DesiredState, String> = if is_json {
        serde_json::from_str(&contents).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(&contents).map_err(|e| e.to_string())
    };

    parsed.map_err(|reason| CliError::Validation {
        field: "from-file".into(),
        reason: format!("{}: expected an object of fields ({reason})", path.display()),
    })
}

/// Split a `--set FIELD=VALUE` argument.
///
/// The value is parsed as JSON when it is valid JSON (`8080`, `true`,
/// `["a","b"]`), otherwise taken as a plain string.
pub fn parse_assignment(raw: &str) -> Result<(String, Value), CliError> {
    let (field, value) = raw.split_once('=').ok_or_else(|| CliError::Validation {
        field: "set".into(),
        reason: format!("expected FIELD=VALUE, got '{raw}'"),
    })?;

    let field = field.trim();
    if field.is_empty() {
        return Err(CliError::Validation {
            field: "set".into(),
            reason: format!("missing field name in '{raw}'"),
        });
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()));
    Ok((field.to_owned(), value))
}

/// Parse `--mkey`: canonical integers stay numeric, anything else is a
/// string key. `007` and `+5` are names, not numbers.
pub fn parse_mkey(raw: &str) -> Value {
    match raw.parse::<i64>() {
        Ok(n) if n.to_string() == raw => Value::from(n),
        _ => Value::String(raw.to_owned()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn assignment_values_parse_as_json_when_possible() {
        assert_eq!(parse_assignment("port=8080").unwrap(), ("port".into(), json!(8080)));
        assert_eq!(parse_assignment("on=true").unwrap(), ("on".into(), json!(true)));
        assert_eq!(
            parse_assignment("alias=lab laptop").unwrap(),
            ("alias".into(), json!("lab laptop"))
        );
        assert_eq!(
            parse_assignment("expr=a=b").unwrap(),
            ("expr".into(), json!("a=b"))
        );
    }

    #[test]
    fn assignment_needs_a_field() {
        assert!(matches!(
            parse_assignment("novalue"),
            Err(CliError::Validation { .. })
        ));
        assert!(matches!(
            parse_assignment("=1"),
            Err(CliError::Validation { .. })
        ));
    }

    #[test]
    fn mkey_keeps_numbers_numeric() {
        assert_eq!(parse_mkey("17"), json!(17));
        assert_eq!(parse_mkey("disk1"), json!("disk1"));
        assert_eq!(parse_mkey("-3"), json!(-3));
    }

    #[test]
    fn mkey_with_padding_or_sign_stays_a_string() {
        assert_eq!(parse_mkey("007"), json!("007"));
        assert_eq!(parse_mkey("+5"), json!("+5"));
        assert_eq!(parse_mkey("0"), json!(0));
    }

    #[test]
    fn data_file_accepts_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("device.yaml");
        std::fs::write(&yaml, "alias: laptop\nmaster_device: desk\n").unwrap();
        let json_path = dir.path().join("device.json");
        std::fs::write(&json_path, r#"{"alias":"laptop"}"#).unwrap();

        assert_eq!(read_data_file(&yaml).unwrap().len(), 2);
        assert_eq!(read_data_file(&json_path).unwrap()["alias"], json!("laptop"));
    }

    #[test]
    fn data_file_must_be_an_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.json");
        std::fs::write(&path, "[1,2]").unwrap();
        assert!(matches!(
            read_data_file(&path),
            Err(CliError::Validation { .. })
        ));
    }
}
