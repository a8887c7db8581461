//! Configurable parameters for an instance of the random beacon protocol.

use crate::utils::Vec;

use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

use crate::error::{BeaconResult, Error};
use crate::stage::SlotWindow;

/// The threshold configuration of a distributed key generation session.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, CanonicalSerialize, CanonicalDeserialize)]
pub struct ThresholdParameters {
    /// The number of proposers in the committee.
    pub n: u32,
    /// The number of key shares required to reconstruct the group signature.
    pub t: u32,
}

impl ThresholdParameters {
    /// Initialize a new set of threshold parameters.
    ///
    /// Will panic if one of the following conditions is met:
    ///  - n equals 0
    ///  - t equals 0
    ///  - n < t
    pub fn new(n: u32, t: u32) -> Self {
        assert!(n > 0);
        assert!(t > 0);
        assert!(n >= t);

        Self { n, t }
    }

    /// The degree of the secret sharing polynomial, `t - 1`.
    pub fn polynomial_degree(&self) -> usize {
        (self.t - 1) as usize
    }

    /// Serialize this `ThresholdParameters` to a vector of bytes.
    pub fn to_bytes(&self) -> BeaconResult<Vec<u8>> {
        let mut bytes = Vec::new();

        self.serialize_compressed(&mut bytes)
            .map_err(|_| Error::SerializationError)?;

        Ok(bytes)
    }

    /// Attempt to deserialize a `ThresholdParameters` from a slice of bytes.
    pub fn from_bytes(bytes: &[u8]) -> BeaconResult<Self> {
        Self::deserialize_compressed(bytes).map_err(|_| Error::DeserializationError)
    }
}

/// Chain-level protocol constants consumed by the stage clock and the two
/// precompiled contracts. Supplied by the host chain's configuration; the
/// defaults reproduce the reference network.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ProtocolConfig {
    /// Half the length, in slots, of one random-beacon stage window. Each of
    /// the six windows of an epoch spans `2 * k` slots.
    pub k: u64,
    /// Size of the random-beacon proposer committee (`Nr`).
    pub proposer_count: usize,
    /// Size of the epoch-leader set used by the slot-leader contract.
    pub epoch_leader_count: usize,
    /// Epoch-relative slot window accepting slot-leader stage-1 commitments.
    pub sma1: SlotWindow,
    /// Epoch-relative slot window accepting slot-leader stage-2 reveals.
    pub sma2: SlotWindow,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            k: 10,
            proposer_count: 21,
            epoch_leader_count: 50,
            sma1: SlotWindow { start: 0, end: 39 },
            sma2: SlotWindow { start: 50, end: 89 },
        }
    }
}
