//! Hashing - SHA-256 for Artifacts and Reports
//!
//! Rendering is deterministic, so equal digests mean equal banners.

use serde::Serialize;
use serde_json::{to_string, Value};
use sha2::{Digest, Sha256};

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    Sha256::digest(data).iter().map(|b| format!("{:02x}", b)).collect()
}

/// Convert to canonical JSON (sorted keys, no whitespace)
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v: Value = serde_json::to_value(value)?;
    to_string(&sort_value(&v))
}

fn sort_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(sorted.into_iter().map(|(k, v)| (k.clone(), sort_value(v))).collect())
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_value).collect()),
        _ => v.clone(),
    }
}

/// Digest of the canonical JSON form of a report.
pub fn compute_report_hash<T: Serialize>(report: &T) -> Result<String, serde_json::Error> {
    Ok(sha256_hex(canonical_json(report)?.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_json_sorted() {
        let obj = json!({"z": 1, "a": 2, "m": {"b": 1, "a": 2}});
        assert_eq!(canonical_json(&obj).unwrap(), r#"{"a":2,"m":{"a":2,"b":1},"z":1}"#);
    }

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_report_hash_ignores_key_order() {
        let a = json!({"succeeded": 2, "failed": 0});
        let b = json!({"failed": 0, "succeeded": 2});
        assert_eq!(compute_report_hash(&a).unwrap(), compute_report_hash(&b).unwrap());
    }
}
