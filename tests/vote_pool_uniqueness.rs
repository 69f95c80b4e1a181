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

use bft_sim::consensus::vote::build_vote;
use bft_sim::consensus::{BlockHashOrNil, Phase, VotePool};
use bft_sim::core::crypto::KeyPair;
use proptest::prelude::*;

fn kp(byte: u8) -> KeyPair {
    KeyPair::from_seed([byte; 32]).unwrap()
}

fn arb_hash() -> impl Strategy<Value = BlockHashOrNil> {
    prop_oneof![
        Just(BlockHashOrNil::nil()),
        any::<[u8; 1]>().prop_map(|b| BlockHashOrNil::hash(hex::encode(b).repeat(32))),
    ]
}

proptest! {
    #[test]
    fn repeated_votes_from_the_same_validator_never_double_count(
        validator_byte in any::<u8>(),
        hashes in prop::collection::vec(arb_hash(), 1..6),
        phase_is_precommit in any::<bool>(),
    ) {
        let phase = if phase_is_precommit { Phase::Precommit } else { Phase::Prevote };
        let mut pool = VotePool::new(0, 0, 4);
        let keypair = kp(validator_byte);

        let mut accepted_count = 0;
        for hash in &hashes {
            let vote = build_vote(&keypair, 0, 0, hash.clone(), phase).unwrap();
            if pool.add_vote(&vote) {
                accepted_count += 1;
            }
        }

        // the same validator casting many votes in one phase only ever
        // contributes its first one.
        prop_assert!(accepted_count <= 1);
    }

    #[test]
    fn supermajority_count_never_exceeds_validator_count(
        validator_bytes in prop::collection::hash_set(any::<u8>(), 1..12),
        hash in arb_hash(),
    ) {
        let count = validator_bytes.len();
        let mut pool = VotePool::new(0, 0, count);
        for &byte in &validator_bytes {
            let vote = build_vote(&kp(byte), 0, 0, hash.clone(), Phase::Precommit).unwrap();
            pool.add_vote(&vote);
        }
        prop_assert!(pool.precommit_count(&hash) <= count);
    }
}
