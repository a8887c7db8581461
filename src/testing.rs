//! A concrete suite over BN254 with Keccak-256, plus in-memory doubles for
//! the storage port and committee sources. Used by the test suite and the
//! benches; also a reasonable starting point for embedders.

use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

use ark_bn254::Bn254;
use ark_ec::Group;
use ark_ff::UniformRand;
use sha3::Keccak256;

use crate::ciphersuite::BeaconSuite;
use crate::contract::{
    Address, BeaconMessageSource, EpochLeaderSource, ProposerGroupSource, StateStore,
};
use crate::utils::{BTreeMap, Scalar, String, ToString, Vec, G1};
use crate::BeaconResult;

/// The BN254 pairing suite with Keccak-256 as the inner hash, matching the
/// reference network's alt-bn128 deployment.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Zeroize)]
pub struct Bn254Keccak;

impl BeaconSuite for Bn254Keccak {
    type E = Bn254;
    type HashOutput = [u8; 32];
    type InnerHasher = Keccak256;

    fn context_string() -> String {
        "THRESHOLD-BEACON-BN254-KECCAK256".to_string()
    }
}

/// Draw a fresh keypair on the first group.
pub fn keypair<C: BeaconSuite>(mut rng: impl RngCore + CryptoRng) -> (Scalar<C>, G1<C>) {
    let secret = Scalar::<C>::rand(&mut rng);
    (secret, G1::<C>::generator() * secret)
}

/// An in-memory [`StateStore`].
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    state: BTreeMap<(Address, [u8; 32]), Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get_state(&self, address: &Address, key: &[u8; 32]) -> Option<Vec<u8>> {
        self.state.get(&(*address, *key)).cloned()
    }

    fn set_state(&mut self, address: &Address, key: [u8; 32], value: Vec<u8>) {
        self.state.insert((*address, key), value);
    }
}

/// A committee source returning the same ordered key list for every epoch.
#[derive(Clone, Debug)]
pub struct StaticCommittee<C: BeaconSuite> {
    keys: Vec<G1<C>>,
}

impl<C: BeaconSuite> StaticCommittee<C> {
    pub fn new(keys: Vec<G1<C>>) -> Self {
        Self { keys }
    }
}

impl<C: BeaconSuite> ProposerGroupSource<C> for StaticCommittee<C> {
    fn proposer_group(&self, _epoch_id: u64) -> BeaconResult<Vec<G1<C>>> {
        Ok(self.keys.clone())
    }
}

impl<C: BeaconSuite> EpochLeaderSource<C> for StaticCommittee<C> {
    fn epoch_leaders(&self, _epoch_id: u64) -> BeaconResult<Vec<G1<C>>> {
        Ok(self.keys.clone())
    }
}

/// A message source returning the same bytes for every epoch.
#[derive(Clone, Debug)]
pub struct FixedMessage(pub Vec<u8>);

impl BeaconMessageSource for FixedMessage {
    fn beacon_message(&self, _epoch_id: u64) -> BeaconResult<Vec<u8>> {
        Ok(self.0.clone())
    }
}
