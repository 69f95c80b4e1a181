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

//! Transport-level messages carried by the network.

use serde::{Deserialize, Serialize};

use crate::consensus::vote::{BlockHashOrNil, Vote};
use crate::core::block::Block;
use crate::core::tx::SignedTx;

/// The payload a message carries, discriminated by `kind`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "payload")]
pub enum MessageKind {
    /// A gossiped transaction.
    #[serde(rename = "TX")]
    Tx(SignedTx),
    /// A full block proposal (header + body).
    #[serde(rename = "BLOCK_HEADER")]
    BlockHeader(Block),
    /// A block body sent in response to a `GetBlock` request.
    #[serde(rename = "BLOCK_BODY")]
    BlockBody(Block),
    /// A PREVOTE or PRECOMMIT vote.
    #[serde(rename = "VOTE")]
    Vote(Vote),
    /// A request for a block body by hash.
    #[serde(rename = "GET_BLOCK")]
    GetBlock(BlockHashOrNil),
}

impl MessageKind {
    /// The event-log `msg_type` string for this kind.
    pub fn type_str(&self) -> &'static str {
        match self {
            MessageKind::Tx(_) => "TX",
            MessageKind::BlockHeader(_) => "BLOCK_HEADER",
            MessageKind::BlockBody(_) => "BLOCK_BODY",
            MessageKind::Vote(_) => "VOTE",
            MessageKind::GetBlock(_) => "GET_BLOCK",
        }
    }
}

/// A transport-level message: a signed artifact plus routing metadata.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Monotonic message identifier, assigned by the sender's node.
    pub msg_id: u64,
    /// Sending node's id.
    pub from_id: String,
    /// Destination node's id.
    pub to_id: String,
    /// The payload.
    pub kind: MessageKind,
    /// Height this message pertains to, when applicable.
    pub height: Option<u64>,
}

impl Message {
    /// Build a message, inferring `height` from the payload where one exists.
    pub fn new(msg_id: u64, from_id: impl Into<String>, to_id: impl Into<String>, kind: MessageKind) -> Self {
        let height = match &kind {
            MessageKind::BlockHeader(b) | MessageKind::BlockBody(b) => Some(b.header.height),
            MessageKind::Vote(v) => Some(v.body.height),
            _ => None,
        };
        Self {
            msg_id,
            from_id: from_id.into(),
            to_id: to_id.into(),
            kind,
            height,
        }
    }

    /// Return a clone of this message addressed to a different recipient,
    /// as used by gossip fan-out.
    pub fn addressed_to(&self, to_id: impl Into<String>) -> Self {
        Self {
            to_id: to_id.into(),
            ..self.clone()
        }
    }
}
