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

//! The per-validator BFT consensus state machine: PREVOTE/PRECOMMIT with
//! block-locking, valid-block tracking, future-vote/future-block buffering,
//! fast-forward, and missing-block fetch.

use std::collections::{BTreeMap, BTreeSet};

use crate::core::block::Block;
use crate::core::crypto::KeyPair;

use super::pool::VotePool;
use super::vote::{build_vote, BlockHashOrNil, Phase, Vote};

/// External acceptance check run over a freshly-seen block proposal before
/// this validator will prevote it (signature, height/parent chaining,
/// state re-execution — whatever the owning `Node`'s ledger considers
/// valid). Implemented by the `Node`, not by the engine itself.
pub trait BlockValidator {
    /// Whether `block` should be accepted as a candidate to prevote.
    fn validate(&self, block: &Block) -> bool;
}

/// Callback invoked once a block is finalized (the engine has recorded
/// supermajority PRECOMMITs and the block body is known). The observer is
/// responsible for applying the block's transactions to state and
/// extending the ledger; the engine itself only tracks consensus state.
pub trait FinalizeObserver {
    /// Called exactly once per finalized block, in height order.
    fn on_finalize(&mut self, block: &Block);
}

/// Callback invoked when supermajority PRECOMMITs are observed for a block
/// whose body the engine does not have locally.
pub trait BlockRequester {
    /// Request the body of `block_hash` be fetched from a peer.
    ///
    /// `sim_time` is the time known to the engine at the call site, which
    /// is sometimes `0.0` when the triggering event carried none; callers
    /// should substitute their own current simulated time rather than
    /// trust this value.
    fn ask_for_block(&mut self, block_hash: &BlockHashOrNil, sim_time: f64);
}

/// Per-validator consensus state machine.
pub struct ConsensusEngine {
    keypair: KeyPair,
    validator_index: Option<usize>,
    validator_count: usize,

    current_height: u64,
    current_round: u64,

    my_prevote: Option<BlockHashOrNil>,
    my_precommit: Option<BlockHashOrNil>,

    locked_block: Option<BlockHashOrNil>,
    locked_round: i64,
    valid_block: Option<BlockHashOrNil>,
    valid_round: i64,

    proposed_blocks: BTreeMap<String, Block>,
    vote_pools: BTreeMap<(u64, u64), VotePool>,
    finalized_blocks: Vec<Block>,

    future_vote_buffer: BTreeMap<(u64, u64), Vec<Vote>>,
    future_block_buffer: BTreeMap<u64, Block>,

    waiting_for_block_to_finalize: Option<(u64, BlockHashOrNil)>,
}

impl ConsensusEngine {
    /// A fresh engine at height 0, round 0, with no locks.
    pub fn new(keypair: KeyPair, validator_index: Option<usize>, validator_count: usize) -> Self {
        Self {
            keypair,
            validator_index,
            validator_count,
            current_height: 0,
            current_round: 0,
            my_prevote: None,
            my_precommit: None,
            locked_block: None,
            locked_round: -1,
            valid_block: None,
            valid_round: -1,
            proposed_blocks: BTreeMap::new(),
            vote_pools: BTreeMap::new(),
            finalized_blocks: Vec::new(),
            future_vote_buffer: BTreeMap::new(),
            future_block_buffer: BTreeMap::new(),
            waiting_for_block_to_finalize: None,
        }
    }

    /// This validator's current height.
    pub fn current_height(&self) -> u64 {
        self.current_height
    }

    /// This validator's current round.
    pub fn current_round(&self) -> u64 {
        self.current_round
    }

    /// The validator's hex public key.
    pub fn pubkey_hex(&self) -> &str {
        self.keypair.pubkey_hex()
    }

    /// Blocks finalized so far, in order.
    pub fn finalized_blocks(&self) -> &[Block] {
        &self.finalized_blocks
    }

    /// The current lock, if any.
    pub fn locked_block(&self) -> Option<&BlockHashOrNil> {
        self.locked_block.as_ref()
    }

    /// `(height, block_hash)` this validator is stalled waiting to fetch,
    /// if any.
    pub fn waiting_for_block_to_finalize(&self) -> Option<&(u64, BlockHashOrNil)> {
        self.waiting_for_block_to_finalize.as_ref()
    }

    /// A previously-seen block proposal or fetched block, by hash.
    pub fn proposed_block(&self, block_hash: &str) -> Option<&Block> {
        self.proposed_blocks.get(block_hash)
    }

    /// Whether this validator is the proposer for `(height, round)`.
    ///
    /// A validator with no index (an observer) never proposes.
    pub fn should_propose(&self, height: u64, round: u64) -> bool {
        match self.validator_index {
            Some(idx) => ((height + round) as usize) % self.validator_count == idx,
            None => false,
        }
    }

    fn supermajority_threshold(&self) -> usize {
        (2 * self.validator_count) / 3
    }

    fn compute_prevote_target(&self, hash: &BlockHashOrNil) -> BlockHashOrNil {
        match &self.locked_block {
            None => hash.clone(),
            Some(locked) if locked == hash => hash.clone(),
            Some(_) => BlockHashOrNil::nil(),
        }
    }

    /// The block hash last proven to have PREVOTE supermajority, if any.
    /// Tracked alongside `locked_block` for parity with Tendermint's
    /// proof-of-lock vocabulary; this engine does not yet attach POL
    /// evidence to proposals, so it never diverges from `locked_block`.
    pub fn valid_block(&self) -> Option<&BlockHashOrNil> {
        self.valid_block.as_ref()
    }

    /// The round whose PREVOTE supermajority produced the current lock, or
    /// `-1` if unlocked. See [`Self::valid_block`].
    pub fn valid_round(&self) -> i64 {
        self.valid_round
    }

    fn sign_vote(&self, height: u64, round: u64, hash: BlockHashOrNil, phase: Phase) -> Vote {
        build_vote(&self.keypair, height, round, hash, phase)
            .expect("ed25519 signing does not fail")
    }

    /// Handle a newly-received (or locally-proposed) block.
    pub fn on_receive_block<V, F, R>(
        &mut self,
        block: Block,
        sim_time: f64,
        validator: &V,
        observer: &mut F,
        requester: &mut R,
    ) -> Vec<Vote>
    where
        V: BlockValidator,
        F: FinalizeObserver,
        R: BlockRequester,
    {
        let height = block.header.height;
        let hash = BlockHashOrNil::hash(block.block_hash());
        let mut out = Vec::new();

        if height > self.current_height {
            self.future_block_buffer.insert(height, block.clone());
            if self
                .waiting_for_block_to_finalize
                .as_ref()
                .is_some_and(|(h, bh)| *h == height && *bh == hash)
            {
                out.extend(self.finalize_block(block, sim_time, validator, observer, requester));
            }
            return out;
        }
        if height < self.current_height {
            return out;
        }

        self.proposed_blocks
            .insert(hash.as_str().to_string(), block.clone());

        if self
            .waiting_for_block_to_finalize
            .as_ref()
            .is_some_and(|(h, bh)| *h == height && *bh == hash)
        {
            out.extend(self.finalize_block(block, sim_time, validator, observer, requester));
            return out;
        }

        if self.my_prevote.is_none() && validator.validate(&block) {
            let target = self.compute_prevote_target(&hash);
            let vote = self.sign_vote(self.current_height, self.current_round, target.clone(), Phase::Prevote);
            self.my_prevote = Some(target);
            out.push(vote);
        }
        out
    }

    /// Handle a newly-received (or locally-emitted) vote.
    pub fn on_receive_vote<V, F, R>(
        &mut self,
        vote: Vote,
        sim_time: f64,
        validator: &V,
        observer: &mut F,
        requester: &mut R,
    ) -> Vec<Vote>
    where
        V: BlockValidator,
        F: FinalizeObserver,
        R: BlockRequester,
    {
        if vote.body.height > self.current_height {
            let round = vote.body.round;
            self.future_vote_buffer
                .entry((vote.body.height, round))
                .or_default()
                .push(vote.clone());
            if vote.body.height == self.current_height + 1 {
                return self.check_fast_forward(round, sim_time, validator, observer, requester);
            }
            return Vec::new();
        }
        if vote.body.height < self.current_height {
            return Vec::new();
        }
        self.process_vote_internal(vote, sim_time, validator, observer, requester)
    }

    fn process_vote_internal<V, F, R>(
        &mut self,
        vote: Vote,
        sim_time: f64,
        validator: &V,
        observer: &mut F,
        requester: &mut R,
    ) -> Vec<Vote>
    where
        V: BlockValidator,
        F: FinalizeObserver,
        R: BlockRequester,
    {
        let (h, r) = (vote.body.height, vote.body.round);
        let count = self.validator_count;
        let accepted = self
            .vote_pools
            .entry((h, r))
            .or_insert_with(|| VotePool::new(h, r, count))
            .add_vote(&vote);
        if !accepted {
            return Vec::new();
        }

        let mut out = Vec::new();
        match vote.body.phase {
            Phase::Prevote => {
                let leader = self.vote_pools.get(&(h, r)).and_then(|p| p.get_prevote_leader());
                if let Some(leader) = leader {
                    if !leader.is_nil() && self.my_precommit.is_none() {
                        self.valid_block = Some(leader.clone());
                        self.valid_round = r as i64;
                        self.locked_block = Some(leader.clone());
                        self.locked_round = r as i64;
                        self.my_precommit = Some(leader.clone());
                        out.push(self.sign_vote(h, r, leader, Phase::Precommit));
                    }
                }
            }
            Phase::Precommit => {
                let leader = self.vote_pools.get(&(h, r)).and_then(|p| p.get_precommit_leader());
                if let Some(leader) = leader {
                    out.extend(
                        self.finalize_if_known(h, leader, sim_time, validator, observer, requester),
                    );
                }
            }
        }
        out
    }

    fn finalize_if_known<V, F, R>(
        &mut self,
        height: u64,
        hash: BlockHashOrNil,
        sim_time: f64,
        validator: &V,
        observer: &mut F,
        requester: &mut R,
    ) -> Vec<Vote>
    where
        V: BlockValidator,
        F: FinalizeObserver,
        R: BlockRequester,
    {
        if let Some(block) = self.proposed_blocks.get(hash.as_str()).cloned() {
            self.finalize_block(block, sim_time, validator, observer, requester)
        } else {
            self.waiting_for_block_to_finalize = Some((height, hash.clone()));
            requester.ask_for_block(&hash, sim_time);
            Vec::new()
        }
    }

    fn finalize_block<V, F, R>(
        &mut self,
        block: Block,
        sim_time: f64,
        validator: &V,
        observer: &mut F,
        requester: &mut R,
    ) -> Vec<Vote>
    where
        V: BlockValidator,
        F: FinalizeObserver,
        R: BlockRequester,
    {
        let next_height = block.header.height + 1;
        self.finalized_blocks.push(block.clone());
        observer.on_finalize(&block);
        self.advance_to_next_height(next_height, sim_time, validator, observer, requester)
    }

    fn advance_to_next_height<V, F, R>(
        &mut self,
        new_height: u64,
        sim_time: f64,
        validator: &V,
        observer: &mut F,
        requester: &mut R,
    ) -> Vec<Vote>
    where
        V: BlockValidator,
        F: FinalizeObserver,
        R: BlockRequester,
    {
        self.current_height = new_height;
        self.current_round = 0;
        self.my_prevote = None;
        self.my_precommit = None;
        self.waiting_for_block_to_finalize = None;
        self.locked_block = None;
        self.locked_round = -1;
        self.valid_block = None;
        self.valid_round = -1;

        let mut out = Vec::new();

        if let Some(buffered_block) = self.future_block_buffer.remove(&new_height) {
            out.extend(self.on_receive_block(buffered_block, sim_time, validator, observer, requester));
        }

        if let Some(buffered_votes) = self.future_vote_buffer.remove(&(new_height, 0)) {
            for v in buffered_votes {
                out.extend(self.process_vote_internal(v, sim_time, validator, observer, requester));
            }
        }

        out
    }

    /// Scan the buffer for `(current_height + 1, round)` for a block_hash
    /// with unique-validator PRECOMMIT count exceeding supermajority; if
    /// found, finalize the current height using a locally-known proposal,
    /// or request the parent of the future block if the current proposal
    /// is not yet known.
    fn check_fast_forward<V, F, R>(
        &mut self,
        round: u64,
        sim_time: f64,
        validator: &V,
        observer: &mut F,
        requester: &mut R,
    ) -> Vec<Vote>
    where
        V: BlockValidator,
        F: FinalizeObserver,
        R: BlockRequester,
    {
        let future_height = self.current_height + 1;
        let threshold = self.supermajority_threshold();

        let Some(votes) = self.future_vote_buffer.get(&(future_height, round)) else {
            return Vec::new();
        };

        let mut counts: BTreeMap<BlockHashOrNil, BTreeSet<String>> = BTreeMap::new();
        for v in votes {
            if v.body.phase == Phase::Precommit && !v.body.block_hash.is_nil() && v.verify() {
                counts
                    .entry(v.body.block_hash.clone())
                    .or_default()
                    .insert(v.body.validator_pubkey_hex.clone());
            }
        }
        let has_fast_forward_evidence = counts.values().any(|voters| voters.len() > threshold);
        if !has_fast_forward_evidence {
            return Vec::new();
        }

        if let Some(local_proposal) = self
            .proposed_blocks
            .values()
            .find(|b| b.header.height == self.current_height)
            .cloned()
        {
            return self.finalize_block(local_proposal, sim_time, validator, observer, requester);
        }

        if let Some(future_block) = self.future_block_buffer.get(&future_height) {
            let parent_hash = BlockHashOrNil::hash(future_block.header.parent_hash.clone());
            self.waiting_for_block_to_finalize = Some((self.current_height, parent_hash.clone()));
            requester.ask_for_block(&parent_hash, sim_time);
        }
        Vec::new()
    }

    /// Advance to the next round within the same height (a liveness
    /// trigger, never a timer): clears this round's prevote/precommit,
    /// drains buffered votes for the new round, and re-offers a block
    /// buffered for the current height while it was still in the future.
    /// Locks survive. The validator's *own* already-evaluated proposal is
    /// never re-offered here — only a genuinely new proposal (whether
    /// freshly delivered or pulled from `future_block_buffer`) is, which is
    /// what lets a locked validator prevote NIL for a conflicting proposal
    /// in the new round instead of reflexively reaffirming its lock.
    pub fn advance_round<V, F, R>(
        &mut self,
        sim_time: f64,
        validator: &V,
        observer: &mut F,
        requester: &mut R,
    ) -> Vec<Vote>
    where
        V: BlockValidator,
        F: FinalizeObserver,
        R: BlockRequester,
    {
        self.current_round += 1;
        self.my_prevote = None;
        self.my_precommit = None;

        let mut out = Vec::new();
        let key = (self.current_height, self.current_round);
        if let Some(buffered) = self.future_vote_buffer.remove(&key) {
            for v in buffered {
                out.extend(self.process_vote_internal(v, sim_time, validator, observer, requester));
            }
        }

        if let Some(buffered_block) = self.future_block_buffer.remove(&self.current_height) {
            out.extend(self.on_receive_block(buffered_block, sim_time, validator, observer, requester));
        }
        out
    }
}
