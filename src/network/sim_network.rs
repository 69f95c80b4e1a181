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

//! A single global priority queue of scheduled deliveries, imposing
//! ordering, delay, drop, duplication, and peer-blocking on an otherwise
//! purely cooperative single-threaded event loop.
//!
//! `gossip_send` selects recipients deterministically (sorted node id,
//! first `gossip_k`) and spends no PRNG draws doing so; the only draws in
//! a gossiped message's path are each recipient's own `send` draw sequence,
//! in recipient order.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};
use std::io::{self, Write};

use super::event_log::{EventExtra, JsonLinesLogger};
use super::message::Message;
use super::rng::DeterministicRng;

/// Tunable network parameters (the `network:` section of the config file).
#[derive(Clone, Debug)]
pub struct NetworkConfig {
    /// Minimum one-hop delivery delay.
    pub min_delay: f64,
    /// Maximum one-hop delivery delay.
    pub max_delay: f64,
    /// Probability a send is dropped outright.
    pub drop_prob: f64,
    /// Probability a send is additionally duplicated.
    pub dup_prob: f64,
    /// Minimum spacing enforced between two sends from the same node.
    pub min_send_interval: f64,
    /// Number of peers a gossip fan-out reaches.
    pub gossip_k: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            min_delay: 0.01,
            max_delay: 0.1,
            drop_prob: 0.0,
            dup_prob: 0.0,
            min_send_interval: 0.0,
            gossip_k: 3,
        }
    }
}

#[derive(Clone, Debug)]
struct ScheduledDelivery {
    deliver_time: f64,
    seq: u64,
    message: Message,
}

impl PartialEq for ScheduledDelivery {
    fn eq(&self, other: &Self) -> bool {
        self.deliver_time == other.deliver_time && self.seq == other.seq
    }
}
impl Eq for ScheduledDelivery {}

impl PartialOrd for ScheduledDelivery {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for ScheduledDelivery {
    fn cmp(&self, other: &Self) -> Ordering {
        self.deliver_time
            .total_cmp(&other.deliver_time)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// What happened when the next scheduled delivery was popped.
#[derive(Debug)]
pub enum DeliveryOutcome {
    /// The message should be routed to its destination node now.
    Delivered {
        /// Simulated delivery time.
        time: f64,
        /// The message to route.
        message: Message,
    },
    /// The link is now blocked; the message was dropped.
    Blocked {
        /// Simulated delivery time.
        time: f64,
    },
    /// The destination node is not registered.
    DroppedNoNode {
        /// Simulated delivery time.
        time: f64,
    },
}

/// The deterministic discrete-event network.
pub struct Network<W: Write> {
    config: NetworkConfig,
    queue: BinaryHeap<Reverse<ScheduledDelivery>>,
    next_seq: u64,
    last_send_time: BTreeMap<String, f64>,
    blocked: BTreeSet<(String, String)>,
    registered: BTreeSet<String>,
    rng: DeterministicRng,
    logger: JsonLinesLogger<W>,
}

impl<W: Write> Network<W> {
    /// A fresh network with no pending events, registered nodes, or blocks.
    pub fn new(config: NetworkConfig, rng: DeterministicRng, logger: JsonLinesLogger<W>) -> Self {
        Self {
            config,
            queue: BinaryHeap::new(),
            next_seq: 0,
            last_send_time: BTreeMap::new(),
            blocked: BTreeSet::new(),
            registered: BTreeSet::new(),
            rng,
            logger,
        }
    }

    /// Mutable access to the shared PRNG, for deriving validator seeds
    /// before any message activity begins.
    pub fn rng_mut(&mut self) -> &mut DeterministicRng {
        &mut self.rng
    }

    /// Flush the underlying event-log writer.
    pub fn logger_flush(&mut self) -> io::Result<()> {
        self.logger.flush()
    }

    /// Register `node_id` as a valid delivery destination.
    pub fn register_node(&mut self, node_id: impl Into<String>) {
        self.registered.insert(node_id.into());
    }

    /// All registered node ids, in ascending order.
    pub fn node_ids(&self) -> impl Iterator<Item = &String> {
        self.registered.iter()
    }

    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn log(&mut self, time: f64, node: &str, event: &str, extra: EventExtra) -> io::Result<()> {
        self.logger.log_event(time, node, event, extra)
    }

    /// Whether `(src, dst)` is currently blocked.
    pub fn is_blocked(&self, src: &str, dst: &str) -> bool {
        self.blocked.contains(&(src.to_string(), dst.to_string()))
    }

    /// Block delivery from `src` to `dst`.
    pub fn block_peer(&mut self, src: &str, dst: &str, now: f64) -> io::Result<()> {
        self.blocked.insert((src.to_string(), dst.to_string()));
        self.log(
            now,
            dst,
            "BLOCK_PEER",
            EventExtra {
                from: Some(src.to_string()),
                to: Some(dst.to_string()),
                ..Default::default()
            },
        )
    }

    /// Unblock delivery from `src` to `dst`.
    pub fn unblock_peer(&mut self, src: &str, dst: &str, now: f64) -> io::Result<()> {
        self.blocked.remove(&(src.to_string(), dst.to_string()));
        self.log(
            now,
            dst,
            "UNBLOCK_PEER",
            EventExtra {
                from: Some(src.to_string()),
                to: Some(dst.to_string()),
                ..Default::default()
            },
        )
    }

    /// Whether any deliveries remain in the queue.
    pub fn has_pending_events(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Send `msg`. Draws from the shared PRNG in exactly this order:
    /// drop-draw, delay-draw, dup-draw, dup-delay-draw (the last only if
    /// the dup-draw fired) — a reimplementation that reorders these draws
    /// would desynchronize from every other run's log.
    pub fn send(&mut self, msg: Message, now: f64) -> io::Result<()> {
        let from = msg.from_id.clone();
        let to = msg.to_id.clone();

        let last = *self.last_send_time.get(&from).unwrap_or(&0.0);
        let effective_send_time = now.max(last + self.config.min_send_interval);
        self.last_send_time.insert(from.clone(), effective_send_time);

        self.log(
            effective_send_time,
            &from,
            "SEND",
            EventExtra {
                to: Some(to.clone()),
                msg_id: Some(msg.msg_id),
                msg_type: Some(msg.kind.type_str().to_string()),
                height: msg.height,
                ..Default::default()
            },
        )?;

        if self.blocked.contains(&(from.clone(), to.clone())) {
            return self.log(
                effective_send_time,
                &from,
                "SEND_BLOCKED",
                EventExtra {
                    to: Some(to),
                    ..Default::default()
                },
            );
        }

        let drop_draw = self.rng.random();
        if drop_draw < self.config.drop_prob {
            return self.log(
                effective_send_time,
                &from,
                "DROP",
                EventExtra {
                    to: Some(to),
                    ..Default::default()
                },
            );
        }

        let delay = self.rng.uniform(self.config.min_delay, self.config.max_delay);
        let deliver_time = effective_send_time + delay;
        let seq = self.next_seq();
        self.queue.push(Reverse(ScheduledDelivery {
            deliver_time,
            seq,
            message: msg.clone(),
        }));
        self.log(
            deliver_time,
            &to,
            "SCHEDULE_DELIVER",
            EventExtra {
                from: Some(from.clone()),
                to: Some(to.clone()),
                ..Default::default()
            },
        )?;

        let dup_draw = self.rng.random();
        if dup_draw < self.config.dup_prob {
            let extra_delay = self.rng.uniform(0.0, self.config.min_delay);
            let dup_time = deliver_time + extra_delay;
            let dup_seq = self.next_seq();
            self.queue.push(Reverse(ScheduledDelivery {
                deliver_time: dup_time,
                seq: dup_seq,
                message: msg,
            }));
            self.log(
                dup_time,
                &from,
                "DUPLICATE_SCHEDULED",
                EventExtra {
                    to: Some(to),
                    ..Default::default()
                },
            )?;
        }
        Ok(())
    }

    /// Pop and process the smallest-`(deliver_time, seq)` pending delivery.
    pub fn deliver_next(&mut self) -> io::Result<Option<DeliveryOutcome>> {
        let Some(Reverse(delivery)) = self.queue.pop() else {
            return Ok(None);
        };
        let from = delivery.message.from_id.clone();
        let to = delivery.message.to_id.clone();

        if self.blocked.contains(&(from.clone(), to.clone())) {
            self.log(
                delivery.deliver_time,
                &to,
                "DELIVER_BLOCKED",
                EventExtra {
                    from: Some(from),
                    to: Some(to),
                    ..Default::default()
                },
            )?;
            return Ok(Some(DeliveryOutcome::Blocked {
                time: delivery.deliver_time,
            }));
        }

        if !self.registered.contains(&to) {
            self.log(
                delivery.deliver_time,
                &to,
                "DELIVER_DROPPED_NO_NODE",
                EventExtra {
                    from: Some(from),
                    to: Some(to),
                    ..Default::default()
                },
            )?;
            return Ok(Some(DeliveryOutcome::DroppedNoNode {
                time: delivery.deliver_time,
            }));
        }

        self.log(
            delivery.deliver_time,
            &to,
            "DELIVER",
            EventExtra {
                from: Some(from),
                to: Some(to),
                msg_id: Some(delivery.message.msg_id),
                msg_type: Some(delivery.message.kind.type_str().to_string()),
                height: delivery.message.height,
                ..Default::default()
            },
        )?;

        Ok(Some(DeliveryOutcome::Delivered {
            time: delivery.deliver_time,
            message: delivery.message,
        }))
    }

    /// Send `msg` (its `to_id` is overwritten per recipient) to up to
    /// `gossip_k` peers deterministically chosen from the registered set
    /// (minus `exclude`): sorted by node id, then the first `gossip_k`
    /// taken, in that order. No PRNG draw is spent on recipient selection.
    pub fn gossip_send(&mut self, msg: &Message, now: f64, exclude: &BTreeSet<String>) -> io::Result<()> {
        let candidates: Vec<String> = self
            .registered
            .iter()
            .filter(|id| !exclude.contains(*id))
            .cloned()
            .collect();
        let k = self.config.gossip_k.min(candidates.len());
        for recipient in candidates.into_iter().take(k) {
            self.send(msg.addressed_to(recipient), now)?;
        }
        Ok(())
    }
}
