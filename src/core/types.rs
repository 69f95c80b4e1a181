// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Canonical encoding of structured values, used for both hashing and signing.
//!
//! `serde_json::Value`'s `Map` is `BTreeMap`-backed as long as the
//! `preserve_order` feature is not enabled (it is not, in this crate's
//! `Cargo.toml`), so `serde_json::to_vec` already produces a byte sequence
//! with sorted object keys and no insignificant whitespace. That is exactly
//! the canonical-bytes contract this module needs; `canonical_bytes` and
//! `hash` just name it at the call sites that matter (signing, block/state
//! commitments).
//!
//! The `arbitrary_precision` feature is enabled so `Number` keeps its exact
//! digits instead of narrowing to `i64`/`u64`/`f64`; without it, a
//! transaction value outside that range would round-trip through a lossy
//! `f64` and break the lossless-encoding guarantee this type exists for.

use ring::digest;
use serde::Serialize;
use thiserror::Error;

/// A structured, canonicalizable value (nested maps, sequences, strings,
/// numbers, booleans, null). Transaction values and signed payloads are
/// represented with this type.
pub type CanonicalValue = serde_json::Value;

/// Canonical encoding error.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The value could not be serialized to its canonical form.
    #[error("canonical encoding failed")]
    Encode,
}

/// Encode a serializable value as canonical bytes: sorted keys, no
/// insignificant whitespace, lossless number encoding.
pub fn canonical_bytes<T: Serialize>(v: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(v).map_err(|_| CodecError::Encode)
}

/// 32-byte cryptographic hash of a byte string (SHA-256).
pub fn hash(bytes: &[u8]) -> [u8; 32] {
    let digest = digest::digest(&digest::SHA256, bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(digest.as_ref());
    out
}

/// Lowercase hex encoding of a 32-byte hash.
pub fn hex32(bytes: [u8; 32]) -> String {
    hex::encode(bytes)
}

/// 64 zero hex characters: the genesis `parent_hash` sentinel.
pub fn zero_hash_hex() -> String {
    "0".repeat(64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_bytes_ignores_map_key_order() {
        let a = json!({"a": 1, "b": 2});
        let b = json!({"b": 2, "a": 1});
        assert_eq!(canonical_bytes(&a).unwrap(), canonical_bytes(&b).unwrap());
    }

    #[test]
    fn canonical_bytes_has_no_insignificant_whitespace() {
        let v = json!({"a": 1});
        let bytes = canonical_bytes(&v).unwrap();
        assert_eq!(bytes, br#"{"a":1}"#.to_vec());
    }

    #[test]
    fn hash_is_32_bytes_and_deterministic() {
        let h1 = hash(b"hello");
        let h2 = hash(b"hello");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 32);
    }
}
