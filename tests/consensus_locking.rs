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

//! A validator that locks on a block in round 0 must prevote NIL for a
//! conflicting proposal in a later round, even though both proposals are
//! individually valid.

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
struct NoopObserver;
impl FinalizeObserver for NoopObserver {
    fn on_finalize(&mut self, _block: &Block) {}
}

#[derive(Default)]
struct NoopRequester;
impl BlockRequester for NoopRequester {
    fn ask_for_block(&mut self, _block_hash: &BlockHashOrNil, _sim_time: f64) {}
}

fn kp(byte: u8) -> KeyPair {
    KeyPair::from_seed([byte; 32]).unwrap()
}

#[test]
fn locked_block_survives_a_round_change_and_blocks_a_conflicting_proposal() {
    let proposer_a = kp(10);
    let proposer_b = kp(11);
    let state = State::new();
    let block_a = build_block(None, &state, vec![], &proposer_a).unwrap();
    let block_b = build_block(None, &state, vec![], &proposer_b).unwrap();
    let hash_a = BlockHashOrNil::hash(block_a.block_hash());

    let mut engine = ConsensusEngine::new(kp(0), Some(0), 4);
    let validator = AcceptAll;
    let mut observer = NoopObserver;
    let mut requester = NoopRequester;

    // round 0: the validator sees block_a and casts its own PREVOTE.
    let self_prevote =
        engine.on_receive_block(block_a.clone(), 0.0, &validator, &mut observer, &mut requester);
    assert_eq!(self_prevote.len(), 1);
    assert_eq!(self_prevote[0].body.block_hash, hash_a);
    assert_eq!(self_prevote[0].body.phase, Phase::Prevote);

    // three more PREVOTEs for block_a push the pool past supermajority,
    // which locks the validator and emits its own PRECOMMIT.
    let mut precommit_out = Vec::new();
    for i in 1..4 {
        let v = build_vote(&kp(i), 0, 0, hash_a.clone(), Phase::Prevote).unwrap();
        precommit_out.extend(engine.on_receive_vote(v, 0.0, &validator, &mut observer, &mut requester));
    }
    assert_eq!(engine.locked_block(), Some(&hash_a));
    assert_eq!(precommit_out.len(), 1);
    assert_eq!(precommit_out[0].body.phase, Phase::Precommit);
    assert_eq!(precommit_out[0].body.block_hash, hash_a);

    // the round times out without a precommit supermajority; move to round 1.
    let round_change_out = engine.advance_round(0.0, &validator, &mut observer, &mut requester);
    assert!(round_change_out.is_empty());
    assert_eq!(engine.current_round(), 1);
    // the lock is not cleared by a round change.
    assert_eq!(engine.locked_block(), Some(&hash_a));

    // a different (but individually valid) proposal arrives in round 1.
    let votes = engine.on_receive_block(block_b, 0.0, &validator, &mut observer, &mut requester);
    assert_eq!(votes.len(), 1);
    assert_eq!(votes[0].body.phase, Phase::Prevote);
    assert!(
        votes[0].body.block_hash.is_nil(),
        "a locked validator must prevote NIL for a conflicting block"
    );
}
