//! # Content Digests
//!
//! SHA-256 over [`CanonicalBytes`]. Audit payloads are identified by their
//! digest so a downstream store can detect tampering or duplicates.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;

/// A SHA-256 content digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest {
    /// The raw 32-byte digest value.
    pub bytes: [u8; 32],
}

impl ContentDigest {
    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}

/// Compute the SHA-256 digest of canonical bytes.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    let hash = Sha256::digest(data.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    ContentDigest { bytes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_object_digest_is_known() {
        // SHA-256 of the two bytes "{}".
        let cb = CanonicalBytes::new(&json!({})).unwrap();
        assert_eq!(
            sha256_digest(&cb).to_hex(),
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }

    #[test]
    fn display_is_prefixed() {
        let cb = CanonicalBytes::new(&json!({"a": 1})).unwrap();
        let d = sha256_digest(&cb);
        let shown = d.to_string();
        assert!(shown.starts_with("sha256:"));
        assert_eq!(shown.len(), "sha256:".len() + 64);
    }

    #[test]
    fn key_order_does_not_change_digest() {
        let a = CanonicalBytes::new(&json!({"x": 1, "y": [1, 2]})).unwrap();
        let b = CanonicalBytes::new(&json!({"y": [1, 2], "x": 1})).unwrap();
        assert_eq!(sha256_digest(&a), sha256_digest(&b));
    }
}
