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

//! A node glues a consensus engine, ledger, and mempool together and
//! routes received messages by kind.
//!
//! A `Node` owns no network handle: rather than the network calling
//! directly back into `node.receive` (which in a garbage-collected
//! reference-counted original is natural but in Rust would need a
//! `Weak`/`RefCell` table of trait objects), callers drain each method's
//! return value — votes to gossip, a proposed block to gossip, pending
//! `GET_BLOCK` requests to broadcast — and perform the actual
//! [`Network`](crate::network::Network) calls themselves. The `Simulator`
//! event loop is that caller.

use crate::consensus::engine::{BlockRequester, BlockValidator, ConsensusEngine, FinalizeObserver};
use crate::consensus::vote::{BlockHashOrNil, Vote};
use crate::core::block::{build_block, validate_block, Block};
use crate::core::crypto::KeyPair;
use crate::core::ledger::Ledger;
use crate::core::state::State;
use crate::core::tx::SignedTx;
use crate::node::mempool::Mempool;

struct SnapshotBlockValidator {
    parent_block: Option<Block>,
    parent_state: State,
}

impl BlockValidator for SnapshotBlockValidator {
    fn validate(&self, block: &Block) -> bool {
        validate_block(block, self.parent_block.as_ref(), &self.parent_state)
    }
}

struct LedgerFinalizeObserver<'a> {
    ledger: &'a mut Ledger,
    mempool: &'a mut Mempool,
}

impl FinalizeObserver for LedgerFinalizeObserver<'_> {
    fn on_finalize(&mut self, block: &Block) {
        let mut post_state = match self.ledger.latest_finalized() {
            Some((_, state)) => state.clone(),
            None => State::new(),
        };
        for tx in &block.txs {
            post_state.apply_tx(tx);
        }
        self.ledger.add_block(block.clone(), post_state);
        self.mempool.prune(&block.txs);
    }
}

struct PendingBlockRequester<'a> {
    requests: &'a mut Vec<BlockHashOrNil>,
}

impl BlockRequester for PendingBlockRequester<'_> {
    fn ask_for_block(&mut self, block_hash: &BlockHashOrNil, _sim_time: f64) {
        self.requests.push(block_hash.clone());
    }
}

/// The outcome of a successful `propose_block` call.
pub struct Proposal {
    /// The block to gossip.
    pub block: Block,
    /// The proposer's own self-PREVOTE, if the consensus engine emitted one.
    pub votes: Vec<Vote>,
}

/// A validator (or observer) node.
pub struct Node {
    node_id: String,
    keypair: KeyPair,
    consensus: ConsensusEngine,
    ledger: Ledger,
    mempool: Mempool,
    pending_get_block_requests: Vec<BlockHashOrNil>,
}

impl Node {
    /// Build a node from a 32-byte seed shared by its keypair and its
    /// consensus engine's keypair (both derive the same identity).
    pub fn new(
        node_id: impl Into<String>,
        seed: [u8; 32],
        validator_index: Option<usize>,
        validator_count: usize,
    ) -> Self {
        let keypair = KeyPair::from_seed(seed).expect("valid ed25519 seed");
        let engine_keypair = KeyPair::from_seed(seed).expect("valid ed25519 seed");
        Self {
            node_id: node_id.into(),
            keypair,
            consensus: ConsensusEngine::new(engine_keypair, validator_index, validator_count),
            ledger: Ledger::new(),
            mempool: Mempool::new(),
            pending_get_block_requests: Vec::new(),
        }
    }

    /// This node's id.
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// This node's hex public key.
    pub fn pubkey_hex(&self) -> &str {
        self.keypair.pubkey_hex()
    }

    /// Read access to the finalized ledger.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Read access to the consensus engine.
    pub fn consensus(&self) -> &ConsensusEngine {
        &self.consensus
    }

    fn snapshot_validator(&self) -> SnapshotBlockValidator {
        match self.ledger.latest_finalized() {
            Some((block, state)) => SnapshotBlockValidator {
                parent_block: Some(block.clone()),
                parent_state: state.clone(),
            },
            None => SnapshotBlockValidator {
                parent_block: None,
                parent_state: State::new(),
            },
        }
    }

    /// Verify and, if new, admit a transaction to the mempool.
    pub fn receive_tx(&mut self, tx: SignedTx) -> bool {
        if !tx.verify() {
            return false;
        }
        self.mempool.add(tx)
    }

    /// Feed a received block into consensus, returning any vote it emits.
    pub fn receive_block(&mut self, block: Block, sim_time: f64) -> Vec<Vote> {
        if !block.verify_signature() {
            return Vec::new();
        }
        let validator = self.snapshot_validator();
        let Node {
            consensus,
            ledger,
            mempool,
            pending_get_block_requests,
            ..
        } = self;
        let mut observer = LedgerFinalizeObserver { ledger, mempool };
        let mut requester = PendingBlockRequester {
            requests: pending_get_block_requests,
        };
        consensus.on_receive_block(block, sim_time, &validator, &mut observer, &mut requester)
    }

    /// Feed a received vote into consensus, returning any vote it emits.
    pub fn receive_vote(&mut self, vote: Vote, sim_time: f64) -> Vec<Vote> {
        if !vote.verify() {
            return Vec::new();
        }
        let validator = self.snapshot_validator();
        let Node {
            consensus,
            ledger,
            mempool,
            pending_get_block_requests,
            ..
        } = self;
        let mut observer = LedgerFinalizeObserver { ledger, mempool };
        let mut requester = PendingBlockRequester {
            requests: pending_get_block_requests,
        };
        consensus.on_receive_vote(vote, sim_time, &validator, &mut observer, &mut requester)
    }

    /// Advance to the next round, draining any votes buffered for it.
    pub fn advance_round(&mut self, sim_time: f64) -> Vec<Vote> {
        let validator = self.snapshot_validator();
        let Node {
            consensus,
            ledger,
            mempool,
            pending_get_block_requests,
            ..
        } = self;
        let mut observer = LedgerFinalizeObserver { ledger, mempool };
        let mut requester = PendingBlockRequester {
            requests: pending_get_block_requests,
        };
        consensus.advance_round(sim_time, &validator, &mut observer, &mut requester)
    }

    /// If this node is the proposer for its current `(height, round)`,
    /// build a block from the latest ledger parent, the mempool snapshot,
    /// and this node's own keypair, and feed it to its own consensus
    /// engine (producing a self-PREVOTE).
    pub fn propose_block(&mut self, sim_time: f64) -> Option<Proposal> {
        if !self
            .consensus
            .should_propose(self.consensus.current_height(), self.consensus.current_round())
        {
            return None;
        }

        let (parent_block, parent_state) = match self.ledger.latest_finalized() {
            Some((b, s)) => (Some(b.clone()), s.clone()),
            None => (None, State::new()),
        };
        let txs = self.mempool.snapshot();
        let block = build_block(parent_block.as_ref(), &parent_state, txs, &self.keypair)
            .expect("ed25519 signing does not fail");
        let votes = self.receive_block(block.clone(), sim_time);
        Some(Proposal { block, votes })
    }

    /// Answer a `GET_BLOCK` request by hash, if this node's ledger holds it.
    pub fn handle_get_block(&self, block_hash: &BlockHashOrNil) -> Option<Block> {
        self.ledger.find_by_hash(block_hash.as_str()).cloned()
    }

    /// Drain and return any block fetch requests raised since the last drain.
    pub fn take_block_requests(&mut self) -> Vec<BlockHashOrNil> {
        std::mem::take(&mut self.pending_get_block_requests)
    }
}
