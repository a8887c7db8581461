//! A distributed random beacon built from pairing-based threshold
//! signatures, together with the two precompiled contracts that carry its
//! messages on chain.
//!
//! Each epoch, a proposer committee runs a two-phase distributed key
//! generation: phase 1 broadcasts per-recipient polynomial commitments on
//! the second pairing group, phase 2 broadcasts the matching encrypted
//! shares on the first group with a discrete-log equality proof binding each
//! share to its commitment. Commitment rows are Reed-Solomon checked against
//! the degree bound before they are accepted. Every participant then folds
//! the shares addressed to it into a key share and signs the epoch's beacon
//! message; any observer combines enough signature shares with a single
//! pairing equality, so no trusted aggregator exists anywhere.
//!
//! The [`contract`] module hosts the random-beacon and slot-leader
//! precompiles. They validate fully before writing, persist accepted call
//! bytes verbatim, and reach the outside world only through injected traits
//! ([`contract::StateStore`] and the committee sources), so the whole
//! protocol runs unmodified against an in-memory store in tests.
//!
//! All group arithmetic is generic over a [`BeaconSuite`] pairing suite;
//! [`testing::Bn254Keccak`] instantiates it over BN254 with Keccak-256.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(any(test, feature = "std"))]
#[macro_use]
extern crate std;

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod ciphersuite;
pub mod contract;
pub mod dkg;
pub mod error;
pub mod parameters;
#[cfg(feature = "std")]
pub mod proposer;
pub mod serialization;
pub mod sign;
pub mod stage;
pub mod testing;
pub mod utils;

pub use ciphersuite::BeaconSuite;
pub use error::{BeaconResult, Error};
pub use serialization::{FromBytes, ToBytes};
