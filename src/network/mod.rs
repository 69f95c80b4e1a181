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
#![allow(missing_docs)]

//! The deterministic discrete-event network: transport messages, the
//! seeded PRNG, the structured event log, and the priority-queue
//! simulator itself.

pub mod event_log;
pub mod message;
pub mod rng;
pub mod sim_network;

pub use event_log::JsonLinesLogger;
pub use message::{Message, MessageKind};
pub use rng::DeterministicRng;
pub use sim_network::{DeliveryOutcome, Network, NetworkConfig};
