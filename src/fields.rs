//! Field resolution over raw resource documents.
//!
//! Resource bodies stay as parsed `serde_json::Value` trees; every typed
//! attribute is resolved on read by walking a key path through the tree.
//! Absent intermediate keys resolve to `None` rather than failing, which is
//! what lets optional composites collapse cleanly.

use serde_json::Value;

/// Walk an ordered key path through a JSON document.
pub fn value_at<'a>(body: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = body;
    for part in path {
        current = current.get(part)?;
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

pub fn string_at(body: &Value, path: &[&str]) -> Option<String> {
    value_at(body, path)?.as_str().map(|s| s.to_string())
}

pub fn int_at(body: &Value, path: &[&str]) -> Option<i64> {
    value_at(body, path)?.as_i64()
}

pub fn float_at(body: &Value, path: &[&str]) -> Option<f64> {
    value_at(body, path)?.as_f64()
}

pub fn bool_at(body: &Value, path: &[&str]) -> Option<bool> {
    value_at(body, path)?.as_bool()
}

/// A JSON array of strings. Absent or null resolves to `None`, not empty.
pub fn string_list_at(body: &Value, path: &[&str]) -> Option<Vec<String>> {
    let items = value_at(body, path)?.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect(),
    )
}

/// Resolve a `{"@odata.id": ...}` reference object to its URI.
pub fn resource_identity(value: &Value) -> Option<String> {
    value
        .get("@odata.id")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Resolve the URI link at `path`, i.e. `{..., path: {"@odata.id": uri}}`.
pub fn identity_at(body: &Value, path: &[&str]) -> Option<String> {
    resource_identity(value_at(body, path)?)
}

/// Resolve an array of `{"@odata.id": ...}` references to an ordered list
/// of URIs. Order follows the JSON array; no sorting is implied.
pub fn members_identities(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(resource_identity).collect())
        .unwrap_or_default()
}

/// Like [`members_identities`] but for a nested key, keeping the
/// absent-array-is-`None` contract.
pub fn members_identities_at(body: &Value, path: &[&str]) -> Option<Vec<String>> {
    let value = value_at(body, path)?;
    value.as_array()?;
    Some(members_identities(value))
}
