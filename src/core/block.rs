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

//! Signed blocks and the pure build/validate functions proposers and
//! validators run over them.

use serde::{Deserialize, Serialize};

use crate::core::crypto::{sign_struct, verify_struct, CryptoError, Envelope, KeyPair, CTX_HEADER};
use crate::core::state::State;
use crate::core::tx::SignedTx;
use crate::core::types::{canonical_bytes, hash, hex32, zero_hash_hex};

/// A block header: everything that gets hashed and signed.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockHeader {
    /// Height, 0 for genesis.
    pub height: u64,
    /// `block_hash` of the parent, or 64 zeros for genesis.
    pub parent_hash: String,
    /// `state.commitment_hex()` after applying this block's transactions.
    pub state_hash: String,
    /// Hex pubkey of the validator that proposed this block.
    pub proposer_pubkey_hex: String,
}

/// A block: header, its ordered transactions, and the header's signature.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Block {
    /// The header.
    pub header: BlockHeader,
    /// Transactions in proposal order. A transaction that fails to apply
    /// (bad signature, or writes outside its owner's namespace) still
    /// appears here; it simply has no effect on `header.state_hash`.
    pub txs: Vec<SignedTx>,
    /// Signature envelope over `header`, signed by the proposer.
    pub envelope: Envelope,
}

impl Block {
    /// Hex of the 32-byte hash of the canonical encoding of `header` alone
    /// (the signature and transaction list are not part of the hash).
    pub fn block_hash(&self) -> String {
        let bytes = canonical_bytes(&self.header).expect("BlockHeader always encodes");
        hex32(hash(&bytes))
    }

    /// Verify the header's signature was produced by `header.proposer_pubkey_hex`.
    pub fn verify_signature(&self) -> bool {
        self.envelope.pubkey == self.header.proposer_pubkey_hex
            && verify_struct(CTX_HEADER, &self.header, &self.envelope)
    }
}

/// Build and sign a new block atop `parent` (`None` for genesis), applying
/// `txs` to a scratch copy of `parent_state` in order. A transaction that
/// fails to apply is still included in the block; it has no state effect.
pub fn build_block(
    parent: Option<&Block>,
    parent_state: &State,
    txs: Vec<SignedTx>,
    proposer: &KeyPair,
) -> Result<Block, CryptoError> {
    let height = parent.map_or(0, |p| p.header.height + 1);
    let parent_hash = parent.map_or_else(zero_hash_hex, |p| p.block_hash());

    let mut scratch = parent_state.clone();
    for tx in &txs {
        scratch.apply_tx(tx);
    }

    let header = BlockHeader {
        height,
        parent_hash,
        state_hash: scratch.commitment_hex(),
        proposer_pubkey_hex: proposer.pubkey_hex().to_string(),
    };
    let envelope = sign_struct(CTX_HEADER, proposer, &header)?;
    Ok(Block {
        header,
        txs,
        envelope,
    })
}

/// Validate `block` against its parent (`None` for genesis) and the
/// parent's post-state: checks the header signature, the height/parent_hash
/// chain, and that `state_hash` matches re-executing `block.txs` atop
/// `parent_state`.
pub fn validate_block(block: &Block, parent: Option<&Block>, parent_state: &State) -> bool {
    if !block.verify_signature() {
        return false;
    }

    match parent {
        None => {
            if block.header.height != 0 || block.header.parent_hash != zero_hash_hex() {
                return false;
            }
        }
        Some(parent_block) => {
            if block.header.height != parent_block.header.height + 1 {
                return false;
            }
            if block.header.parent_hash != parent_block.block_hash() {
                return false;
            }
        }
    }

    let mut scratch = parent_state.clone();
    for tx in &block.txs {
        scratch.apply_tx(tx);
    }
    block.header.state_hash == scratch.commitment_hex()
}
