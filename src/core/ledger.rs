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

//! Append-only ledger: a mapping from height to its finalized block and
//! the post-execution state at that height.

use std::collections::BTreeMap;

use crate::core::block::Block;
use crate::core::state::State;

/// Append-only `height -> (Block, post-State)` mapping.
///
/// Invariant: for every height `h > 0`, the stored block's `parent_hash`
/// equals `block_hash` of the block at `h - 1`, and its `state_hash`
/// equals the commitment of the post-state at `h - 1` with the block's
/// transactions applied. `add_block` does not itself re-derive these
/// facts; callers finalize only blocks that `validate_block` accepted.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    entries: BTreeMap<u64, (Block, State)>,
}

impl Ledger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finalized block and its resulting state at `block.header.height`.
    ///
    /// Returns `false` without modifying the ledger if `height` is already
    /// occupied or does not immediately follow the current height.
    pub fn add_block(&mut self, block: Block, post_state: State) -> bool {
        let height = block.header.height;
        let expected = self.height_i64() + 1;
        if height as i64 != expected {
            return false;
        }
        self.entries.insert(height, (block, post_state));
        true
    }

    /// The block finalized at `height`, if any.
    pub fn get_block(&self, height: u64) -> Option<&Block> {
        self.entries.get(&height).map(|(b, _)| b)
    }

    /// The post-execution state at `height`, if any.
    pub fn get_state(&self, height: u64) -> Option<&State> {
        self.entries.get(&height).map(|(_, s)| s)
    }

    /// The most recently finalized block and its post-state.
    pub fn latest_finalized(&self) -> Option<(&Block, &State)> {
        self.entries
            .iter()
            .next_back()
            .map(|(_, (b, s))| (b, s))
    }

    /// Find a finalized block anywhere in the ledger by its `block_hash`.
    pub fn find_by_hash(&self, block_hash: &str) -> Option<&Block> {
        self.entries
            .values()
            .map(|(b, _)| b)
            .find(|b| b.block_hash() == block_hash)
    }

    /// The current ledger height: the height of the latest finalized block,
    /// or `-1` if the ledger is empty (mirrors the reference's empty-ledger
    /// sentinel rather than panicking on an unsigned underflow).
    pub fn height_i64(&self) -> i64 {
        self.entries
            .keys()
            .next_back()
            .map_or(-1, |&h| h as i64)
    }

    /// Number of finalized blocks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no blocks have been finalized yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::block::build_block;
    use crate::core::crypto::KeyPair;

    fn kp(byte: u8) -> KeyPair {
        KeyPair::from_seed([byte; 32]).unwrap()
    }

    #[test]
    fn empty_ledger_has_height_minus_one() {
        let ledger = Ledger::new();
        assert_eq!(ledger.height_i64(), -1);
        assert!(ledger.latest_finalized().is_none());
    }

    #[test]
    fn sequential_blocks_are_accepted() {
        let proposer = kp(40);
        let state = State::new();
        let genesis = build_block(None, &state, vec![], &proposer).unwrap();

        let mut ledger = Ledger::new();
        assert!(ledger.add_block(genesis.clone(), state.clone()));
        assert_eq!(ledger.height_i64(), 0);

        let child = build_block(Some(&genesis), &state, vec![], &proposer).unwrap();
        assert!(ledger.add_block(child.clone(), state.clone()));
        assert_eq!(ledger.height_i64(), 1);
        assert_eq!(ledger.get_block(1).unwrap().block_hash(), child.block_hash());
    }

    #[test]
    fn out_of_order_block_is_rejected() {
        let proposer = kp(41);
        let state = State::new();
        let genesis = build_block(None, &state, vec![], &proposer).unwrap();
        let child = build_block(Some(&genesis), &state, vec![], &proposer).unwrap();

        let mut ledger = Ledger::new();
        assert!(!ledger.add_block(child, state));
    }

    #[test]
    fn find_by_hash_locates_finalized_block() {
        let proposer = kp(42);
        let state = State::new();
        let genesis = build_block(None, &state, vec![], &proposer).unwrap();
        let mut ledger = Ledger::new();
        ledger.add_block(genesis.clone(), state);
        assert!(ledger.find_by_hash(&genesis.block_hash()).is_some());
        assert!(ledger.find_by_hash("deadbeef").is_none());
    }
}
