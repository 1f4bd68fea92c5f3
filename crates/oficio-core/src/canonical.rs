//! # Canonical Serialization
//!
//! `CanonicalBytes` is the only input accepted by [`crate::sha256_digest()`].
//! Construction goes through `serde_json::Value`, rejects floats, and then
//! serializes with `serde_jcs` (RFC 8785: sorted keys, compact separators).
//!
//! Floats are rejected because their textual form is not stable across
//! producers; ratios in audit payloads are carried as integer basis points.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization of a float-free value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize any serializable value.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        reject_floats(&value)?;
        let s = serde_jcs::to_string(&value)?;
        Ok(Self(s.into_bytes()))
    }

    /// The canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn reject_floats(value: &Value) -> Result<(), CanonicalizationError> {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => Ok(()),
        Value::Number(n) => {
            if !n.is_i64() && !n.is_u64() {
                if let Some(f) = n.as_f64() {
                    return Err(CanonicalizationError::FloatRejected(f));
                }
            }
            Ok(())
        }
        Value::Array(items) => items.iter().try_for_each(reject_floats),
        Value::Object(map) => map.values().try_for_each(reject_floats),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_sorted() {
        let cb = CanonicalBytes::new(&json!({"z": 1, "a": 2, "m": {"b": 1, "a": 0}})).unwrap();
        assert_eq!(
            std::str::from_utf8(cb.as_bytes()).unwrap(),
            r#"{"a":2,"m":{"a":0,"b":1},"z":1}"#
        );
    }

    #[test]
    fn floats_rejected_anywhere() {
        assert!(matches!(
            CanonicalBytes::new(&json!({"ratio": 0.5})),
            Err(CanonicalizationError::FloatRejected(_))
        ));
        assert!(CanonicalBytes::new(&json!([1, [2, 3.25]])).is_err());
    }

    #[test]
    fn integers_and_unicode_pass() {
        let cb = CanonicalBytes::new(&json!({"nombre": "Juan Pérez", "bps": 10000})).unwrap();
        assert!(!cb.is_empty());
        assert!(std::str::from_utf8(cb.as_ref()).unwrap().contains("Pérez"));
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let a = CanonicalBytes::new(&json!({"a": 1, "b": 2})).unwrap();
        let b = CanonicalBytes::new(&json!({"b": 2, "a": 1})).unwrap();
        assert_eq!(a, b);
    }
}
