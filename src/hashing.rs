//! Hashing System - SHA-256 over Canonical JSON
//!
//! Gives every render output a digest that only changes when the drafted
//! resources do.

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Object keys sorted at every depth, no insignificant whitespace.
/// Array order is kept.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(&canonicalize(serde_json::to_value(value)?))
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, canonicalize(v)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        scalar => scalar,
    }
}

/// Lowercase hex SHA-256 of the canonical form. Order of a list is significant.
pub fn compute_digest<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(value)?;
    Ok(hex::encode(Sha256::digest(canonical.as_bytes())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_json_sorts_nested_keys() {
        let obj = json!({"z": 1, "a": {"y": [{"b": 1, "a": 2}], "x": null}});
        let canonical = canonical_json(&obj).unwrap();
        assert_eq!(canonical, r#"{"a":{"x":null,"y":[{"a":2,"b":1}]},"z":1}"#);
    }

    #[test]
    fn test_digest_of_empty_list() {
        assert_eq!(
            compute_digest(&json!([])).unwrap(),
            "4f53cda18c2baa0c0354bb5f9a3ecbe5ed12ab4d8e11ba873c2f11161202b945"
        );
    }

    #[test]
    fn test_digest_ignores_key_order_but_tracks_list_order() {
        let a = compute_digest(&json!([{"key": "a", "kind": "Group"}])).unwrap();
        let b = compute_digest(&json!([{"kind": "Group", "key": "a"}])).unwrap();
        assert_eq!(a, b);

        let c = compute_digest(&json!([{"key": "a"}, {"key": "b"}])).unwrap();
        let d = compute_digest(&json!([{"key": "b"}, {"key": "a"}])).unwrap();
        assert_ne!(c, d);
    }
}
