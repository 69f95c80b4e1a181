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

//! Supermajority PRECOMMITs for a block whose body hasn't arrived yet must
//! stall finalization and request the body, then finalize as soon as it
//! does arrive — without requiring the votes to be redelivered.

use bft_sim::consensus::vote::build_vote;
use bft_sim::consensus::{BlockHashOrNil, BlockRequester, BlockValidator, ConsensusEngine, FinalizeObserver, Phase};
use bft_sim::core::block::{build_block, Block};
use bft_sim::core::crypto::KeyPair;
use bft_sim::core::state::State;

struct AcceptAll;
impl BlockValidator for AcceptAll {
    fn validate(&self, _block: &Block) -> bool {
        true
    }
}

#[derive(Default)]
struct RecordingObserver {
    finalized: Vec<Block>,
}
impl FinalizeObserver for RecordingObserver {
    fn on_finalize(&mut self, block: &Block) {
        self.finalized.push(block.clone());
    }
}

#[derive(Default)]
struct RecordingRequester {
    requested: Vec<String>,
}
impl BlockRequester for RecordingRequester {
    fn ask_for_block(&mut self, block_hash: &BlockHashOrNil, _sim_time: f64) {
        self.requested.push(block_hash.as_str().to_string());
    }
}

fn kp(byte: u8) -> KeyPair {
    KeyPair::from_seed([byte; 32]).unwrap()
}

#[test]
fn precommit_supermajority_without_the_block_body_requests_then_finalizes_on_arrival() {
    let proposer = kp(20);
    let state = State::new();
    let block = build_block(None, &state, vec![], &proposer).unwrap();
    let hash = BlockHashOrNil::hash(block.block_hash());

    let mut engine = ConsensusEngine::new(kp(0), Some(0), 4);
    let validator = AcceptAll;
    let mut observer = RecordingObserver::default();
    let mut requester = RecordingRequester::default();

    // this validator never saw the proposal itself, only the votes for it.
    for i in 1..4 {
        let v = build_vote(&kp(i), 0, 0, hash.clone(), Phase::Precommit).unwrap();
        engine.on_receive_vote(v, 0.0, &validator, &mut observer, &mut requester);
    }

    assert!(observer.finalized.is_empty());
    assert_eq!(engine.current_height(), 0);
    assert_eq!(
        engine.waiting_for_block_to_finalize(),
        Some(&(0, hash.clone()))
    );
    assert_eq!(requester.requested, vec![hash.as_str().to_string()]);

    // the body arrives afterward, with no further votes needed.
    engine.on_receive_block(block.clone(), 0.0, &validator, &mut observer, &mut requester);

    assert_eq!(engine.current_height(), 1);
    assert_eq!(observer.finalized.len(), 1);
    assert_eq!(observer.finalized[0].block_hash(), block.block_hash());
    assert!(engine.waiting_for_block_to_finalize().is_none());
}

#[test]
fn a_second_ask_for_block_is_not_issued_while_already_waiting() {
    let proposer = kp(21);
    let state = State::new();
    let block = build_block(None, &state, vec![], &proposer).unwrap();
    let hash = BlockHashOrNil::hash(block.block_hash());

    let mut engine = ConsensusEngine::new(kp(0), Some(0), 4);
    let validator = AcceptAll;
    let mut observer = RecordingObserver::default();
    let mut requester = RecordingRequester::default();

    for i in 1..4 {
        let v = build_vote(&kp(i), 0, 0, hash.clone(), Phase::Precommit).unwrap();
        engine.on_receive_vote(v, 0.0, &validator, &mut observer, &mut requester);
    }
    assert_eq!(requester.requested.len(), 1);

    // a duplicate precommit from one of the same three validators changes nothing.
    let dup = build_vote(&kp(1), 0, 0, hash.clone(), Phase::Precommit).unwrap();
    engine.on_receive_vote(dup, 0.0, &validator, &mut observer, &mut requester);
    assert_eq!(requester.requested.len(), 1);
}
