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

//! E2: heavy message duplication (every send has a 50% chance of being
//! delivered twice) must not cause double-counted votes or disagreement —
//! `VotePool`'s per-validator uniqueness check absorbs the duplicates.

use bft_sim::config::{NetworkSection, SimConfig, SimulationSection};
use bft_sim::network::JsonLinesLogger;
use bft_sim::simulator::Simulator;

fn config() -> SimConfig {
    SimConfig {
        simulation: SimulationSection {
            num_nodes: 8,
            max_blocks: 3,
            drop_prob: 0.0,
            dup_prob: 0.0,
            ..Default::default()
        },
        network: NetworkSection {
            drop_prob: 0.0,
            dup_prob: 0.5,
            ..Default::default()
        },
    }
}

#[test]
fn heavy_duplication_preserves_agreement() {
    let logger = JsonLinesLogger::new(Vec::new());
    let mut sim = Simulator::new(&config(), 789, logger);
    sim.run(300_000).unwrap();

    let ledgers: Vec<_> = sim.nodes().values().map(|n| n.ledger()).collect();
    assert_eq!(ledgers.len(), 8);

    // with gossip_k (3) well under num_nodes - 1 (7) and no vote relaying
    // beyond one hop, an 8-way network isn't guaranteed to converge within
    // any fixed step budget; safety (no disagreement on whatever prefix
    // did finalize) is the property under test here, not a progress bound.
    let shortest = ledgers.iter().map(|l| l.len()).min().unwrap();
    for height in 0..shortest as u64 {
        let hashes: Vec<_> = ledgers
            .iter()
            .filter_map(|l| l.get_block(height))
            .map(|b| b.block_hash())
            .collect();
        assert!(
            hashes.windows(2).all(|w| w[0] == w[1]),
            "validators disagree on the block finalized at height {height} under duplication"
        );
    }
}
