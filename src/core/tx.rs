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

//! Signed transactions: an owner-scoped key/value write, signed by the owner.

use serde::{Deserialize, Serialize};

use crate::core::crypto::{sign_struct, verify_struct, CryptoError, Envelope, KeyPair, CTX_TX};
use crate::core::types::CanonicalValue;

/// The signed portion of a transaction.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TxBody {
    /// Hex-encoded public key of the key's owner; only this signer may write it.
    pub owner: String,
    /// Key name, scoped under `owner` as `"{owner}/{key}"` in `State`.
    pub key: String,
    /// Value to write.
    pub value: CanonicalValue,
    /// Strictly increasing per-owner nonce, used only for signature uniqueness
    /// (the simulator does not reject stale or replayed nonces).
    pub nonce: u64,
}

/// A transaction together with its signature envelope.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignedTx {
    /// The signed body.
    #[serde(flatten)]
    pub body: TxBody,
    /// Signature envelope over `body`.
    pub envelope: Envelope,
}

impl SignedTx {
    /// Build and sign a new transaction for `owner`.
    pub fn new(
        keypair: &KeyPair,
        key: impl Into<String>,
        value: CanonicalValue,
        nonce: u64,
    ) -> Result<Self, CryptoError> {
        let body = TxBody {
            owner: keypair.pubkey_hex().to_string(),
            key: key.into(),
            value,
            nonce,
        };
        let envelope = sign_struct(CTX_TX, keypair, &body)?;
        Ok(Self { body, envelope })
    }

    /// Verify the transaction's signature was produced by `body.owner`.
    pub fn verify(&self) -> bool {
        self.envelope.pubkey == self.body.owner && verify_struct(CTX_TX, &self.body, &self.envelope)
    }

    /// The fully-qualified state key: `"{owner}/{key}"`.
    pub fn state_key(&self) -> String {
        format!("{}/{}", self.body.owner, self.body.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kp(byte: u8) -> KeyPair {
        KeyPair::from_seed([byte; 32]).unwrap()
    }

    #[test]
    fn valid_tx_verifies() {
        let owner = kp(10);
        let tx = SignedTx::new(&owner, "balance", json!(100), 0).unwrap();
        assert!(tx.verify());
        assert_eq!(tx.state_key(), format!("{}/balance", owner.pubkey_hex()));
    }

    #[test]
    fn tampered_value_fails_verification() {
        let owner = kp(11);
        let mut tx = SignedTx::new(&owner, "balance", json!(100), 0).unwrap();
        tx.body.value = json!(999);
        assert!(!tx.verify());
    }

    #[test]
    fn tx_signed_by_non_owner_fails_verification() {
        let owner = kp(12);
        let impostor = kp(13);
        let mut tx = SignedTx::new(&owner, "balance", json!(1), 0).unwrap();
        tx.envelope = sign_struct(CTX_TX, &impostor, &tx.body).unwrap();
        assert!(!tx.verify());
    }
}
