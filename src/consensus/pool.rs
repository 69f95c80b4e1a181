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

//! Per-(height,round) vote aggregation with supermajority queries.

use std::collections::{BTreeMap, BTreeSet};

use crate::consensus::vote::{BlockHashOrNil, Phase, Vote};

/// Aggregates votes for one `(height, round)`.
///
/// `BTreeMap<BlockHashOrNil, BTreeSet<String>>` keeps both the per-hash
/// validator sets and, via `get_prevote_leader`/`get_precommit_leader`,
/// the scan over hashes in ascending lexicographic order: ties between
/// hashes both meeting supermajority resolve deterministically to the
/// lexicographically smallest hash.
#[derive(Clone, Debug)]
pub struct VotePool {
    height: u64,
    round: u64,
    validator_count: usize,
    prevotes: BTreeMap<BlockHashOrNil, BTreeSet<String>>,
    precommits: BTreeMap<BlockHashOrNil, BTreeSet<String>>,
    prevoted_validators: BTreeSet<String>,
    precommitted_validators: BTreeSet<String>,
}

impl VotePool {
    /// A fresh, empty pool for `(height, round)` over `validator_count` validators.
    pub fn new(height: u64, round: u64, validator_count: usize) -> Self {
        Self {
            height,
            round,
            validator_count,
            prevotes: BTreeMap::new(),
            precommits: BTreeMap::new(),
            prevoted_validators: BTreeSet::new(),
            precommitted_validators: BTreeSet::new(),
        }
    }

    /// This pool's height.
    pub fn height(&self) -> u64 {
        self.height
    }

    /// This pool's round.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// Record `vote`.
    ///
    /// Rejects (returns `false`, no change) if the vote's `(height, round)`
    /// does not match this pool, its signature fails verification, or this
    /// validator already has a recorded vote in the same phase for any
    /// block_hash.
    pub fn add_vote(&mut self, vote: &Vote) -> bool {
        if vote.body.height != self.height || vote.body.round != self.round {
            return false;
        }
        if !vote.verify() {
            return false;
        }

        let (table, seen) = match vote.body.phase {
            Phase::Prevote => (&mut self.prevotes, &mut self.prevoted_validators),
            Phase::Precommit => (&mut self.precommits, &mut self.precommitted_validators),
        };

        if seen.contains(&vote.body.validator_pubkey_hex) {
            return false;
        }
        seen.insert(vote.body.validator_pubkey_hex.clone());
        table
            .entry(vote.body.block_hash.clone())
            .or_default()
            .insert(vote.body.validator_pubkey_hex.clone());
        true
    }

    fn supermajority_threshold(&self) -> usize {
        (2 * self.validator_count) / 3
    }

    /// Whether `block_hash` has strictly more than ⌊2N/3⌋ PREVOTEs.
    pub fn has_supermajority_prevotes(&self, block_hash: &BlockHashOrNil) -> bool {
        self.prevotes
            .get(block_hash)
            .is_some_and(|v| v.len() > self.supermajority_threshold())
    }

    /// Whether `block_hash` has strictly more than ⌊2N/3⌋ PRECOMMITs.
    pub fn has_supermajority_precommits(&self, block_hash: &BlockHashOrNil) -> bool {
        self.precommits
            .get(block_hash)
            .is_some_and(|v| v.len() > self.supermajority_threshold())
    }

    /// The lexicographically smallest block_hash meeting PREVOTE
    /// supermajority, if any. NIL is a valid leader here.
    pub fn get_prevote_leader(&self) -> Option<BlockHashOrNil> {
        let threshold = self.supermajority_threshold();
        self.prevotes
            .iter()
            .find(|(_, voters)| voters.len() > threshold)
            .map(|(hash, _)| hash.clone())
    }

    /// The lexicographically smallest non-NIL block_hash meeting PRECOMMIT
    /// supermajority, if any.
    pub fn get_precommit_leader(&self) -> Option<BlockHashOrNil> {
        let threshold = self.supermajority_threshold();
        self.precommits
            .iter()
            .find(|(hash, voters)| !hash.is_nil() && voters.len() > threshold)
            .map(|(hash, _)| hash.clone())
    }

    /// Number of unique validators with a recorded PRECOMMIT for `block_hash`.
    pub fn precommit_count(&self, block_hash: &BlockHashOrNil) -> usize {
        self.precommits.get(block_hash).map_or(0, BTreeSet::len)
    }
}
