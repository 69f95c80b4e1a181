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

//! Ed25519 keypairs and domain-separated signing over canonical bytes.
//!
//! Every signed artifact (transaction, block header, vote) is signed as
//! `canonical_bytes({context: CTX||CHAIN_ID, payload: P})`. Domain
//! separation via `CTX` prevents a signature minted for one artifact kind
//! (e.g. a vote) from verifying as another (e.g. a transaction).

use ring::signature::{Ed25519KeyPair, KeyPair as _, UnparsedPublicKey, ED25519};
use serde::Serialize;
use thiserror::Error;

use crate::core::types::canonical_bytes;

/// Fixed chain identifier mixed into every signing context.
pub const CHAIN_ID: &str = "bft-sim";

/// Transaction signing context.
pub const CTX_TX: &str = "TX:";
/// Block header signing context.
pub const CTX_HEADER: &str = "HEADER:";
/// Vote signing context.
pub const CTX_VOTE: &str = "VOTE:";

/// Crypto errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Keypair generation or parsing failed.
    #[error("keypair")]
    Keypair,
    /// Canonical encoding of the signing payload failed.
    #[error("encode")]
    Encode,
    /// Hex decoding of a signature or public key failed.
    #[error("hex decode")]
    HexDecode,
}

/// An Ed25519 signing/verifying keypair.
///
/// Simulator keypairs are in-memory only: they are derived once from the
/// network's seeded PRNG at initialization and never persisted or rotated
/// (the crate does not implement persistent storage across process
/// lifetimes; see spec Non-goals).
pub struct KeyPair {
    inner: Ed25519KeyPair,
    pubkey_hex: String,
}

impl KeyPair {
    /// Build a keypair from a 32-byte Ed25519 seed.
    pub fn from_seed(seed: [u8; 32]) -> Result<Self, CryptoError> {
        let inner = Ed25519KeyPair::from_seed_unchecked(&seed).map_err(|_| CryptoError::Keypair)?;
        let pubkey_hex = hex::encode(inner.public_key().as_ref());
        Ok(Self { inner, pubkey_hex })
    }

    /// Lowercase hex encoding of the public key: the stable validator identity.
    pub fn pubkey_hex(&self) -> &str {
        &self.pubkey_hex
    }

    /// Sign raw bytes, returning a 64-byte signature.
    pub fn sign_bytes(&self, msg: &[u8]) -> Vec<u8> {
        self.inner.sign(msg).as_ref().to_vec()
    }
}

/// The three fields every signed envelope surfaces alongside its payload.
#[derive(Clone, Debug, Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Envelope {
    /// Hex-encoded Ed25519 signature.
    pub signature: String,
    /// Hex-encoded Ed25519 public key (the signer's identity).
    pub pubkey: String,
    /// Domain-separation context string (`CTX || CHAIN_ID`).
    pub context: String,
}

fn domain_context(ctx: &str) -> String {
    format!("{ctx}{CHAIN_ID}")
}

fn envelope_bytes<T: Serialize>(context: &str, payload: &T) -> Result<Vec<u8>, CryptoError> {
    let payload_value = serde_json::to_value(payload).map_err(|_| CryptoError::Encode)?;
    let env = serde_json::json!({ "context": context, "payload": payload_value });
    canonical_bytes(&env).map_err(|_| CryptoError::Encode)
}

/// Sign `payload` under context `ctx`, producing the envelope fields.
pub fn sign_struct<T: Serialize>(
    ctx: &str,
    keypair: &KeyPair,
    payload: &T,
) -> Result<Envelope, CryptoError> {
    let context = domain_context(ctx);
    let bytes = envelope_bytes(&context, payload)?;
    let signature = hex::encode(keypair.sign_bytes(&bytes));
    Ok(Envelope {
        signature,
        pubkey: keypair.pubkey_hex().to_string(),
        context,
    })
}

/// Verify a signed envelope's signature under context `ctx`.
///
/// Returns `false` (never an error) on any malformed input: a mismatched
/// context, invalid hex, a wrong-length key, or an invalid signature.
/// Signature/context failures are silent rejections, not propagated errors.
pub fn verify_struct<T: Serialize>(ctx: &str, payload: &T, envelope: &Envelope) -> bool {
    let expected_ctx = domain_context(ctx);
    if envelope.context != expected_ctx {
        return false;
    }
    let Ok(bytes) = envelope_bytes(&envelope.context, payload) else {
        return false;
    };
    let Ok(sig_bytes) = hex::decode(&envelope.signature) else {
        return false;
    };
    let Ok(pk_bytes) = hex::decode(&envelope.pubkey) else {
        return false;
    };
    let pk = UnparsedPublicKey::new(&ED25519, &pk_bytes);
    pk.verify(&bytes, &sig_bytes).is_ok()
}
