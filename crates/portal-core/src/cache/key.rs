// ── Cache keys ──
//
// A cache entry is identified by the endpoint name plus a canonical
// serialization of its argument. Object keys are sorted at every depth, so
// two arguments that are structurally equal always map to the same entry.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::StoreError;

/// Identity of one cached query result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    endpoint: String,
    args: String,
}

impl CacheKey {
    /// Derive the key for `endpoint` called with `arg`.
    pub fn new<A: Serialize + ?Sized>(endpoint: &str, arg: &A) -> Result<Self, StoreError> {
        let value = serde_json::to_value(arg).map_err(|e| StoreError::ArgumentEncoding {
            endpoint: endpoint.to_owned(),
            message: e.to_string(),
        })?;
        Ok(Self {
            endpoint: endpoint.to_owned(),
            args: canonicalize(value).to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Canonical JSON text of the argument.
    pub fn args(&self) -> &str {
        &self.args
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.endpoint, self.args)
    }
}

/// Rebuild `value` with object keys in sorted order, independent of how
/// `serde_json::Map` orders insertions.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (k, v) in entries {
                sorted.insert(k, canonicalize(v));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;

    #[test]
    fn unit_argument() {
        let key = CacheKey::new("fetchActiveApps", &()).unwrap();
        assert_eq!(key.to_string(), "fetchActiveApps(null)");
    }

    #[test]
    fn structurally_equal_args_share_a_key() {
        let mut a = HashMap::new();
        a.insert("subscriptionId", "s1");
        a.insert("appId", "a1");
        let b = json!({ "appId": "a1", "subscriptionId": "s1" });

        let ka = CacheKey::new("fetchSubscriptionDetail", &a).unwrap();
        let kb = CacheKey::new("fetchSubscriptionDetail", &b).unwrap();
        assert_eq!(ka, kb);
        assert_eq!(ka.args(), r#"{"appId":"a1","subscriptionId":"s1"}"#);
    }

    #[test]
    fn nested_objects_are_sorted() {
        let key = CacheKey::new("q", &json!({ "b": { "z": 1, "y": [ { "d": 1, "c": 2 } ] }, "a": 0 }))
            .unwrap();
        assert_eq!(key.args(), r#"{"a":0,"b":{"y":[{"c":2,"d":1}],"z":1}}"#);
    }

    #[test]
    fn different_endpoints_never_collide() {
        let a = CacheKey::new("fetchModelById", &"urn:x").unwrap();
        let b = CacheKey::new("fetchArtifact", &"urn:x").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn unserializable_argument_is_rejected() {
        let mut bad = HashMap::new();
        bad.insert((1, 2), "tuple keys are not JSON object keys");
        let err = CacheKey::new("q", &bad).unwrap_err();
        assert!(matches!(err, StoreError::ArgumentEncoding { .. }));
    }
}
