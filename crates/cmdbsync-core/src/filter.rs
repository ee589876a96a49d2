// ── Field filter ──
//
// Turns caller-supplied desired state into the payload the appliance
// accepts: keys are respelled with hyphens, then only recognised, non-null
// top-level fields survive.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

/// Desired field values for one object, keyed by field name.
pub type DesiredState = Map<String, Value>;

/// Respell a field name the way the appliance expects (`_` becomes `-`).
pub fn normalize_key(key: &str) -> String {
    key.replace('_', "-")
}

/// Normalize every object key inside `value`, recursing through nested
/// objects and arrays. Scalars are returned unchanged.
pub fn normalize_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(normalize_map(map)),
        Value::Array(items) => Value::Array(items.iter().map(normalize_value).collect()),
        other => other.clone(),
    }
}

fn normalize_map(map: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in map {
        insert_normalized(&mut out, key, normalize_value(value));
    }
    out
}

/// Insert under the hyphenated spelling of `key`. When two spellings collide
/// (`master-device` and `master_device`) the hyphenated one is kept.
fn insert_normalized(out: &mut Map<String, Value>, key: &str, value: Value) {
    let normalized = normalize_key(key);
    if normalized == key || !out.contains_key(&normalized) {
        out.insert(normalized, value);
    }
}

/// Keep the allowed, non-null fields of `desired`.
///
/// Both `desired` and `allowed` are normalized before comparison, so either
/// spelling works on either side. Nulls nested below the top level are kept.
pub fn filter(desired: &DesiredState, allowed: &BTreeSet<String>) -> DesiredState {
    let allowed: BTreeSet<String> = allowed.iter().map(|k| normalize_key(k)).collect();

    let mut out = DesiredState::new();
    for (key, value) in desired {
        if value.is_null() || !allowed.contains(&normalize_key(key)) {
            continue;
        }
        insert_normalized(&mut out, key, normalize_value(value));
    }
    out
}
