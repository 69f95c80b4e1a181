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

//! BFT consensus simulator - a deterministic discrete-event testbed for a
//! Tendermint-style two-phase voting protocol.
//!
//! This crate provides:
//! - Canonical encoding and Ed25519 signing with domain separation
//! - A signed block/ledger/state substrate with owner-scoped key-value writes
//! - A per-validator BFT consensus engine (PREVOTE/PRECOMMIT, locking, fast-forward)
//! - A deterministic discrete-event network (priority queue, delay/drop/dup/block)
//! - A `Node` that glues consensus, ledger, and network together
//! - A `Simulator` event loop and a byte-identical-log determinism checker

/// Configuration types for the simulator (YAML-backed).
pub mod config;
/// Core protocol primitives: canonical encoding, crypto, tx, state, block, ledger.
pub mod core;
/// Per-validator consensus engine and vote pool.
pub mod consensus;
/// Deterministic discrete-event network simulator.
pub mod network;
/// Node: glues consensus, ledger, and network.
pub mod node;
/// Event loop driving the whole simulation.
pub mod simulator;
/// Two-run determinism checker.
pub mod determinism;
