// CMDB response types
//
// Every CMDB write answers with a flat JSON object describing what happened.
// Downstream tooling inspects these fields by name, so the field set is kept
// exactly as the appliance emits it; anything else lands in `extra`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The `status` value the appliance uses for a successful call.
pub const STATUS_SUCCESS: &str = "success";

/// Structured reply from a CMDB `set` or `delete` call.
///
/// ```json
/// { "http_method": "PUT", "revision": "2a1b...", "mkey": "laptop",
///   "status": "success", "http_status": 200, "serial": "FGVM01...",
///   "version": "v6.0.2", "build": 163, "vdom": "root",
///   "path": "user", "name": "device" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// `"success"` on success, `"error"` (or anything else) otherwise.
    pub status: String,
    /// Verb the appliance saw: `GET`, `POST`, `PUT`, `DELETE`.
    #[serde(default)]
    pub http_method: String,
    #[serde(default)]
    pub http_status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<u64>,
    /// Master key of the addressed object. String or integer depending on table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mkey: Option<Value>,
    /// Table name (`device`, `storage`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Category (`user`, `system`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vdom: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Fields not modelled above (`error`, `cli_error`, `results`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApiResponse {
    /// A bare response with only the status triple filled in.
    ///
    /// Used when the appliance replies with a non-JSON body (e.g. an HTML
    /// error page) so callers still get something classifiable.
    pub fn bare(status: impl Into<String>, http_method: &str, http_status: u16) -> Self {
        Self {
            status: status.into(),
            http_method: http_method.to_owned(),
            http_status,
            build: None,
            mkey: None,
            name: None,
            path: None,
            revision: None,
            serial: None,
            vdom: None,
            version: None,
            extra: Map::new(),
        }
    }

    /// `status == "success"`.
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    /// The appliance answered a DELETE with 404 (object already gone).
    pub fn is_delete_not_found(&self) -> bool {
        self.http_method.eq_ignore_ascii_case("DELETE") && self.http_status == 404
    }
}

/// Render an mkey value as a URL path segment.
///
/// Strings are used verbatim, numbers via their decimal form. Anything else
/// (null, bool, arrays, objects) cannot address an object.
pub fn mkey_segment(mkey: &Value) -> Option<String> {
    match mkey {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_full_reply_and_keeps_unknown_fields() {
        let body = json!({
            "http_method": "PUT",
            "revision": "6c1f",
            "mkey": "laptop",
            "status": "success",
            "http_status": 200,
            "serial": "FGVM010000000001",
            "version": "v6.0.2",
            "build": 163,
            "vdom": "root",
            "path": "user",
            "name": "device",
            "cli_error": "none"
        });

        let resp: ApiResponse = serde_json::from_value(body).unwrap();
        assert!(resp.is_success());
        assert_eq!(resp.build, Some(163));
        assert_eq!(resp.mkey, Some(json!("laptop")));
        assert_eq!(resp.extra.get("cli_error"), Some(&json!("none")));
    }

    #[test]
    fn serialization_preserves_wire_field_names() {
        let resp: ApiResponse = serde_json::from_value(json!({
            "status": "error",
            "http_method": "DELETE",
            "http_status": 404,
            "mkey": 7,
            "path": "system",
            "name": "storage"
        }))
        .unwrap();

        let out = serde_json::to_value(&resp).unwrap();
        assert_eq!(out["http_method"], "DELETE");
        assert_eq!(out["http_status"], 404);
        assert_eq!(out["mkey"], 7);
        assert!(out.get("serial").is_none());
    }

    #[test]
    fn delete_not_found_is_case_insensitive_on_method() {
        let resp = ApiResponse::bare("error", "delete", 404);
        assert!(resp.is_delete_not_found());
        assert!(!ApiResponse::bare("error", "PUT", 404).is_delete_not_found());
    }

    #[test]
    fn mkey_segment_accepts_strings_and_numbers() {
        assert_eq!(mkey_segment(&json!("wan1")).as_deref(), Some("wan1"));
        assert_eq!(mkey_segment(&json!(12)).as_deref(), Some("12"));
        assert_eq!(mkey_segment(&json!("")), None);
        assert_eq!(mkey_segment(&Value::Null), None);
    }
}
