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

//! Owner-scoped key/value state and its deterministic commitment.

use std::collections::BTreeMap;

use crate::core::tx::SignedTx;
use crate::core::types::{canonical_bytes, hash, hex32, CanonicalValue};

/// Flat key/value world state, keyed by `"{owner_pubkey_hex}/{key}"`.
///
/// `BTreeMap` keeps iteration in ascending key order, which is what makes
/// `commitment` deterministic without a separate sort step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct State {
    entries: BTreeMap<String, CanonicalValue>,
}

impl State {
    /// An empty state (the genesis state).
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a transaction, writing `value` at `"{owner}/{key}"`.
    ///
    /// Only succeeds if the transaction's signature is valid and the
    /// transaction's `owner` matches the prefix of the key being written
    /// (an owner may never write another owner's namespace). Returns
    /// `false` on rejection; invalid transactions are still recorded in
    /// the containing block, they simply have no state effect.
    pub fn apply_tx(&mut self, tx: &SignedTx) -> bool {
        if !tx.verify() {
            return false;
        }

        let suffix = format!("/{}", tx.body.key);
        for existing_key in self.entries.keys() {
            if let Some(existing_owner) = existing_key.strip_suffix(&suffix) {
                if existing_owner != tx.body.owner {
                    return false;
                }
                break;
            }
        }

        self.entries.insert(tx.state_key(), tx.body.value.clone());
        true
    }

    /// Read a value by its fully-qualified `"{owner}/{key}"` state key.
    pub fn get(&self, state_key: &str) -> Option<&CanonicalValue> {
        self.entries.get(state_key)
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the state holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Deterministic 32-byte commitment: the hash of the canonical encoding
    /// of the sorted `(key, value)` entries.
    pub fn commitment(&self) -> [u8; 32] {
        let bytes = canonical_bytes(&self.entries).expect("BTreeMap<String, Value> always encodes");
        hash(&bytes)
    }

    /// Hex-encoded commitment, as stored in a block header.
    pub fn commitment_hex(&self) -> String {
        hex32(self.commitment())
    }
}
