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

//! Votes: a validator's PREVOTE or PRECOMMIT for a block hash (or NIL) at
//! a given height and round.

use serde::{Deserialize, Serialize};

use crate::core::crypto::{sign_struct, verify_struct, CryptoError, Envelope, KeyPair, CTX_VOTE};

/// A block hash, or the sentinel `"NIL"` meaning "no block".
///
/// A newtype rather than a bare `String` so call sites can't mistake the
/// literal `"NIL"` for a real 64-char hash without going through `is_nil`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct BlockHashOrNil(String);

impl BlockHashOrNil {
    /// The NIL sentinel.
    pub fn nil() -> Self {
        Self("NIL".to_string())
    }

    /// Wrap a real block hash hex string.
    pub fn hash(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// Whether this is the NIL sentinel.
    pub fn is_nil(&self) -> bool {
        self.0 == "NIL"
    }

    /// The underlying string (hex hash, or the literal `"NIL"`).
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BlockHashOrNil {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which of the two Tendermint-style voting phases a vote belongs to.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// First phase: vote for what should be finalized.
    #[serde(rename = "PREVOTE")]
    Prevote,
    /// Second phase: commit to what reached prevote supermajority.
    #[serde(rename = "PRECOMMIT")]
    Precommit,
}

/// The signed portion of a vote.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteBody {
    /// Height this vote is for.
    pub height: u64,
    /// Round this vote is for.
    pub round: u64,
    /// Block hash being voted for, or NIL.
    pub block_hash: BlockHashOrNil,
    /// PREVOTE or PRECOMMIT.
    pub phase: Phase,
    /// Hex pubkey of the casting validator.
    pub validator_pubkey_hex: String,
}

/// A vote with its signature envelope.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vote {
    /// The signed body.
    #[serde(flatten)]
    pub body: VoteBody,
    /// Signature envelope over `body`.
    pub envelope: Envelope,
}

impl Vote {
    /// Verify the vote's signature was produced by `body.validator_pubkey_hex`.
    pub fn verify(&self) -> bool {
        self.envelope.pubkey == self.body.validator_pubkey_hex
            && verify_struct(CTX_VOTE, &self.body, &self.envelope)
    }
}

/// Build and sign a vote for `(height, round, block_hash)` in `phase`.
pub fn build_vote(
    keypair: &KeyPair,
    height: u64,
    round: u64,
    block_hash: BlockHashOrNil,
    phase: Phase,
) -> Result<Vote, CryptoError> {
    let body = VoteBody {
        height,
        round,
        block_hash,
        phase,
        validator_pubkey_hex: keypair.pubkey_hex().to_string(),
    };
    let envelope = sign_struct(CTX_VOTE, keypair, &body)?;
    Ok(Vote { body, envelope })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kp(byte: u8) -> KeyPair {
        KeyPair::from_seed([byte; 32]).unwrap()
    }

    #[test]
    fn valid_vote_verifies() {
        let validator = kp(50);
        let vote = build_vote(
            &validator,
            0,
            0,
            BlockHashOrNil::hash("ab".repeat(32)),
            Phase::Prevote,
        )
        .unwrap();
        assert!(vote.verify());
    }

    #[test]
    fn nil_vote_is_nil() {
        let validator = kp(51);
        let vote = build_vote(&validator, 0, 0, BlockHashOrNil::nil(), Phase::Prevote).unwrap();
        assert!(vote.body.block_hash.is_nil());
        assert!(vote.verify());
    }

    #[test]
    fn tampered_height_fails_verification() {
        let validator = kp(52);
        let mut vote =
            build_vote(&validator, 0, 0, BlockHashOrNil::nil(), Phase::Precommit).unwrap();
        vote.body.height = 99;
        assert!(!vote.verify());
    }

    #[test]
    fn impersonated_validator_fails_verification() {
        let validator = kp(53);
        let impostor = kp(54);
        let mut vote =
            build_vote(&validator, 0, 0, BlockHashOrNil::nil(), Phase::Prevote).unwrap();
        vote.body.validator_pubkey_hex = impostor.pubkey_hex().to_string();
        assert!(!vote.verify());
    }
}
