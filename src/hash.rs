//! Canonical JSON form and the hash primitive built on top of it.
//!
//! `H(x)` must satisfy exactly one property: `canonical(a) == canonical(b)`
//! if and only if `a` and `b` are the same JSON value. Recorder and
//! replay both link against this module, so the canonicalisation rule
//! must never depend on map insertion order, platform, or float
//! formatting quirks beyond what `serde_json` already pins down.
//!
//! # Algorithm
//!
//! ```text
//! SHA-256(canonical_json_bytes) -> hex string
//! ```
//!
//! Objects are rebuilt with keys in sorted order (recursively, through
//! arrays and nested objects); arrays keep their element order; scalars
//! pass through unchanged. Re-sorting explicitly — rather than relying
//! on `serde_json::Map`'s default iteration order — keeps the contract
//! documented instead of incidental.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Rebuild `value` with every object's keys in sorted order, recursively.
pub fn canonical_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted = Map::new();
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                sorted.insert(key.clone(), canonical_json(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical_json).collect()),
        other => other.clone(),
    }
}

/// SHA-256 hex digest of arbitrary bytes.
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// `H(canonical(value))` — the hash primitive spec §4.1 describes.
///
/// Serialisation of the canonical form cannot fail for any `Value`
/// `serde_json` can represent, so this never returns an error.
pub fn hash_value(value: &Value) -> String {
    let canonical = canonical_json(value);
    let bytes = serde_json::to_vec(&canonical).expect("Value serialisation is infallible");
    hash_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hash_is_independent_of_key_order() {
        let a = json!({"b": 1, "a": 2, "c": {"y": 1, "x": 2}});
        let b = json!({"a": 2, "c": {"x": 2, "y": 1}, "b": 1});
        assert_eq!(hash_value(&a), hash_value(&b));
    }

    #[test]
    fn hash_distinguishes_array_order() {
        let a = json!([1, 2, 3]);
        let b = json!([3, 2, 1]);
        assert_ne!(hash_value(&a), hash_value(&b));
    }

    #[test]
    fn hash_distinguishes_different_values() {
        let a = json!({"x": 1});
        let b = json!({"x": 2});
        assert_ne!(hash_value(&a), hash_value(&b));
    }

    #[test]
    fn hash_is_deterministic() {
        let v = json!({"nested": {"list": [1, 2, {"k": "v"}]}});
        assert_eq!(hash_value(&v), hash_value(&v));
    }

    #[test]
    fn canonical_json_is_idempotent() {
        let v = json!({"z": 1, "a": [3, 2, 1], "m": {"q": 1, "p": 2}});
        let once = canonical_json(&v);
        let twice = canonical_json(&once);
        assert_eq!(once, twice);
    }
}
