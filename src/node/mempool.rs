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

//! A node's pending-transaction pool: holds signed transactions from
//! receipt until they're included in a finalized block.

use crate::core::tx::SignedTx;

/// Pending transactions awaiting inclusion in a block.
#[derive(Clone, Debug, Default)]
pub struct Mempool {
    txs: Vec<SignedTx>,
}

impl Mempool {
    /// An empty mempool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `tx` if an identically-signed transaction isn't already held.
    pub fn add(&mut self, tx: SignedTx) -> bool {
        if self.txs.iter().any(|t| t.envelope.signature == tx.envelope.signature) {
            return false;
        }
        self.txs.push(tx);
        true
    }

    /// A snapshot of all pending transactions, in receipt order.
    pub fn snapshot(&self) -> Vec<SignedTx> {
        self.txs.clone()
    }

    /// Remove every transaction that appears in `included` (by signature).
    pub fn prune(&mut self, included: &[SignedTx]) {
        self.txs
            .retain(|t| !included.iter().any(|i| i.envelope.signature == t.envelope.signature));
    }

    /// Number of pending transactions.
    pub fn len(&self) -> usize {
        self.txs.len()
    }

    /// Whether the mempool holds no transactions.
    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }
}
