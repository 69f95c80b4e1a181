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

//! The event loop: a single-threaded, cooperative, discrete-event driver
//! that interleaves network deliveries with a coarse proposer tick.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};

use crate::config::SimConfig;
use crate::consensus::vote::Vote;
use crate::core::block::Block;
use crate::network::event_log::JsonLinesLogger;
use crate::network::message::{Message, MessageKind};
use crate::network::rng::DeterministicRng;
use crate::network::sim_network::{DeliveryOutcome, Network};
use crate::node::node::Node;

/// How often (in simulated time) a node is offered a chance to propose.
const PROPOSAL_INTERVAL: f64 = 0.05;

/// Drives a fixed set of validator nodes over a deterministic network.
pub struct Simulator<W: Write> {
    nodes: BTreeMap<String, Node>,
    network: Network<W>,
    max_blocks: u64,
    current_time: f64,
    last_proposal_time: f64,
    next_msg_id: u64,
}

fn node_id(index: usize) -> String {
    format!("n{index}")
}

impl<W: Write> Simulator<W> {
    /// Build a simulator with `config.simulation.num_nodes` validators,
    /// all PRNG-derived signing seeds drawn before any message activity.
    pub fn new(config: &SimConfig, seed: u64, logger: JsonLinesLogger<W>) -> Self {
        let mut rng = DeterministicRng::new(seed);
        let num_nodes = config.simulation.num_nodes;

        let seeds: Vec<[u8; 32]> = (0..num_nodes).map(|_| rng.next_seed32()).collect();

        let mut network = Network::new(config.network_config(), rng, logger);
        let mut nodes = BTreeMap::new();
        for (idx, seed_bytes) in seeds.into_iter().enumerate() {
            let id = node_id(idx);
            network.register_node(id.clone());
            nodes.insert(id.clone(), Node::new(id, seed_bytes, Some(idx), num_nodes));
        }

        Self {
            nodes,
            network,
            max_blocks: config.simulation.max_blocks,
            current_time: 0.0,
            last_proposal_time: 0.0,
            next_msg_id: 0,
        }
    }

    fn next_msg_id(&mut self) -> u64 {
        let id = self.next_msg_id;
        self.next_msg_id += 1;
        id
    }

    /// Read-only access to every node's ledger, keyed by node id.
    pub fn nodes(&self) -> &BTreeMap<String, Node> {
        &self.nodes
    }

    fn all_reached_max_blocks(&self) -> bool {
        self.max_blocks == 0
            || self
                .nodes
                .values()
                .all(|n| n.ledger().len() as u64 >= self.max_blocks)
    }

    fn gossip_from(&mut self, sender: &str, kind: MessageKind) -> io::Result<()> {
        let msg_id = self.next_msg_id();
        let template = Message::new(msg_id, sender, sender, kind);
        let mut exclude = BTreeSet::new();
        exclude.insert(sender.to_string());
        self.network.gossip_send(&template, self.current_time, &exclude)
    }

    fn drain_block_requests(&mut self, node_id: &str) -> io::Result<()> {
        let requests = self
            .nodes
            .get_mut(node_id)
            .map(Node::take_block_requests)
            .unwrap_or_default();
        for hash in requests {
            self.gossip_from(node_id, MessageKind::GetBlock(hash))?;
        }
        Ok(())
    }

    fn gossip_votes(&mut self, sender: &str, votes: Vec<Vote>) -> io::Result<()> {
        for vote in votes {
            self.gossip_from(sender, MessageKind::Vote(vote))?;
        }
        Ok(())
    }

    fn proposal_tick(&mut self) -> io::Result<()> {
        let ids: Vec<String> = self.nodes.keys().cloned().collect();
        for id in ids {
            let proposal = {
                let node = self.nodes.get_mut(&id).expect("node exists");
                node.propose_block(self.current_time)
            };
            let Some(proposal) = proposal else {
                continue;
            };
            self.gossip_from(&id, MessageKind::BlockHeader(proposal.block))?;
            self.gossip_votes(&id, proposal.votes)?;
            self.drain_block_requests(&id)?;
        }
        Ok(())
    }

    fn route_block(&mut self, recipient: &str, block: Block, time: f64) -> io::Result<()> {
        let votes = {
            let Some(node) = self.nodes.get_mut(recipient) else {
                return Ok(());
            };
            node.receive_block(block, time)
        };
        self.gossip_votes(recipient, votes)?;
        self.drain_block_requests(recipient)
    }

    fn route(&mut self, message: Message, time: f64) -> io::Result<()> {
        let recipient = message.to_id.clone();
        match message.kind {
            MessageKind::Tx(tx) => {
                if let Some(node) = self.nodes.get_mut(&recipient) {
                    node.receive_tx(tx);
                }
            }
            MessageKind::BlockHeader(block) | MessageKind::BlockBody(block) => {
                self.route_block(&recipient, block, time)?;
            }
            MessageKind::Vote(vote) => {
                let votes = {
                    let Some(node) = self.nodes.get_mut(&recipient) else {
                        return Ok(());
                    };
                    node.receive_vote(vote, time)
                };
                self.gossip_votes(&recipient, votes)?;
                self.drain_block_requests(&recipient)?;
            }
            MessageKind::GetBlock(hash) => {
                if let Some(block) = self.nodes.get(&recipient).and_then(|n| n.handle_get_block(&hash)) {
                    let msg_id = self.next_msg_id();
                    let reply = Message::new(msg_id, recipient, message.from_id, MessageKind::BlockBody(block));
                    self.network.send(reply, time)?;
                }
            }
        }
        Ok(())
    }

    /// Advance every node to the next round (a liveness trigger the caller
    /// invokes externally; there is no wall-clock timer in the core).
    pub fn advance_all_rounds(&mut self) -> io::Result<()> {
        let ids: Vec<String> = self.nodes.keys().cloned().collect();
        for id in ids {
            let votes = self
                .nodes
                .get_mut(&id)
                .expect("node exists")
                .advance_round(self.current_time);
            self.gossip_votes(&id, votes)?;
            self.drain_block_requests(&id)?;
        }
        Ok(())
    }

    /// Inject a transaction directly into one node's mempool and gossip it.
    pub fn inject_tx(&mut self, node_id: &str, tx: crate::core::tx::SignedTx) -> io::Result<()> {
        if let Some(node) = self.nodes.get_mut(node_id) {
            node.receive_tx(tx.clone());
        }
        self.gossip_from(node_id, MessageKind::Tx(tx))
    }

    /// Run the event loop for up to `max_steps` iterations (one iteration
    /// is either a proposal tick or a single delivered/blocked/dropped
    /// event), stopping early once every node has finalized `max_blocks`.
    pub fn run(&mut self, max_steps: u64) -> io::Result<()> {
        for _ in 0..max_steps {
            if self.all_reached_max_blocks() {
                break;
            }

            if self.current_time >= self.last_proposal_time + PROPOSAL_INTERVAL {
                self.proposal_tick()?;
                self.last_proposal_time = self.current_time;
            }

            if !self.network.has_pending_events() {
                self.current_time += PROPOSAL_INTERVAL;
                continue;
            }

            match self.network.deliver_next()? {
                None => break,
                Some(DeliveryOutcome::Delivered { time, message }) => {
                    self.current_time = time;
                    self.route(message, time)?;
                }
                Some(DeliveryOutcome::Blocked { time }) | Some(DeliveryOutcome::DroppedNoNode { time }) => {
                    self.current_time = time;
                }
            }
        }
        self.network.logger_flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NetworkSection, SimConfig, SimulationSection};

    fn config(num_nodes: usize, max_blocks: u64) -> SimConfig {
        SimConfig {
            simulation: SimulationSection {
                num_nodes,
                max_blocks,
                drop_prob: 0.0,
                dup_prob: 0.0,
                ..Default::default()
            },
            network: NetworkSection {
                drop_prob: 0.0,
                dup_prob: 0.0,
                ..Default::default()
            },
        }
    }

    #[test]
    fn small_network_reaches_max_blocks_and_agrees() {
        let logger = JsonLinesLogger::new(Vec::new());
        let mut sim = Simulator::new(&config(4, 2), 1, logger);
        sim.run(20_000).unwrap();

        let ledgers: Vec<_> = sim.nodes().values().map(|n| n.ledger()).collect();
        assert!(ledgers.iter().all(|l| l.len() >= 2));
        let first = ledgers[0].get_block(0).unwrap().block_hash();
        assert!(ledgers.iter().all(|l| l.get_block(0).unwrap().block_hash() == first));
    }

    #[test]
    fn advance_all_rounds_is_harmless_with_no_pending_work() {
        let logger = JsonLinesLogger::new(Vec::new());
        let mut sim = Simulator::new(&config(4, 5), 2, logger);
        sim.advance_all_rounds().unwrap();
        assert!(sim.nodes().values().all(|n| n.consensus().current_round() == 1));
    }
}
