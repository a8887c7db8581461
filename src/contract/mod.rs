//! Shared plumbing for the two precompiled contracts: addresses, the injected
//! byte-store port, committee sources and the hashed state-key scheme.
//!
//! The contracts never touch a chain database directly. All persistence goes
//! through [`StateStore`], and all committee lookups go through the source
//! traits, so tests can wire in-memory doubles without any global state.

mod bitmap;
pub mod random_beacon;
pub mod slot_leader;

pub(crate) use bitmap::SubmissionBitmap;

use ark_serialize::CanonicalSerialize;
use core::fmt;

use crate::ciphersuite::BeaconSuite;
use crate::utils::{keccak256, Vec, G1};
use crate::{BeaconResult, Error};

/// A 20-byte account address, the host chain's sender identity.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Address(pub [u8; 20]);

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Fixed address of the random-beacon precompile.
pub const RANDOM_BEACON_ADDRESS: Address = Address([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x02, 0x62,
]);

/// Fixed address of the slot-leader precompile.
pub const SLOT_LEADER_ADDRESS: Address = Address([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x02, 0x58,
]);

/// Derive the account address owning `public_key`: the last 20 bytes of the
/// Keccak-256 digest of its compressed encoding.
pub fn address_of<C: BeaconSuite>(public_key: &G1<C>) -> BeaconResult<Address> {
    let mut encoded = Vec::new();
    public_key
        .serialize_compressed(&mut encoded)
        .map_err(|_| Error::SerializationError)?;

    let digest = keccak256(&encoded);
    let mut address = [0u8; 20];
    address.copy_from_slice(&digest[12..]);

    Ok(Address(address))
}

/// The storage port the contracts write through. Production wires this to
/// the chain state backend; tests wire it to an in-memory map.
pub trait StateStore {
    fn get_state(&self, address: &Address, key: &[u8; 32]) -> Option<Vec<u8>>;
    fn set_state(&mut self, address: &Address, key: [u8; 32], value: Vec<u8>);
}

/// Supplies the ordered proposer committee for an epoch.
///
/// Implementations return epoch 0's committee when the requested epoch's is
/// not yet populated; the contract additionally applies the same fallback
/// when the returned group is not the configured size.
pub trait ProposerGroupSource<C: BeaconSuite> {
    fn proposer_group(&self, epoch_id: u64) -> BeaconResult<Vec<G1<C>>>;
}

/// Supplies the ordered epoch-leader key list for an epoch.
pub trait EpochLeaderSource<C: BeaconSuite> {
    fn epoch_leaders(&self, epoch_id: u64) -> BeaconResult<Vec<G1<C>>>;
}

/// Supplies the random-beacon message for an epoch, derived from chain
/// history. Consumed by the local proposer when producing signature shares.
pub trait BeaconMessageSource {
    fn beacon_message(&self, epoch_id: u64) -> BeaconResult<Vec<u8>>;
}

/// Host-chain facts accompanying a contract call: the recovered sender and
/// the epoch/slot derived from chain time.
#[derive(Clone, Copy, Debug)]
pub struct CallContext {
    pub caller: Address,
    pub epoch_id: u64,
    pub slot_id: u64,
}

/// The 4-byte method selector: the leading bytes of the Keccak-256 digest of
/// the method signature string.
pub(crate) fn method_id(signature: &str) -> [u8; 4] {
    let digest = keccak256(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Storage key for a `(epoch, index)`-scoped value:
/// `keccak(epoch_be ‖ index_be ‖ label)`.
pub(crate) fn state_key(epoch_id: u64, index: u32, label: &[u8]) -> [u8; 32] {
    let mut preimage = Vec::with_capacity(12 + label.len());
    preimage.extend_from_slice(&epoch_id.to_be_bytes());
    preimage.extend_from_slice(&index.to_be_bytes());
    preimage.extend_from_slice(label);
    keccak256(&preimage)
}

/// Storage key for a per-epoch value without an index component.
pub(crate) fn epoch_key(epoch_id: u64, label: &[u8]) -> [u8; 32] {
    let mut preimage = Vec::with_capacity(8 + label.len());
    preimage.extend_from_slice(&epoch_id.to_be_bytes());
    preimage.extend_from_slice(label);
    keccak256(&preimage)
}

/// Read the per-epoch call counter. Diagnostic only, not consensus-relevant.
pub(crate) fn load_call_times(
    store: &dyn StateStore,
    address: &Address,
    epoch_id: u64,
    label: &[u8],
) -> u64 {
    store
        .get_state(address, &epoch_key(epoch_id, label))
        .and_then(|bytes| bytes.try_into().ok())
        .map(u64::from_be_bytes)
        .unwrap_or(0)
}

/// Increment the per-epoch call counter.
pub(crate) fn bump_call_times(
    store: &mut dyn StateStore,
    address: &Address,
    epoch_id: u64,
    label: &[u8],
) {
    let next = load_call_times(store, address, epoch_id, label) + 1;
    store.set_state(address, epoch_key(epoch_id, label), next.to_be_bytes().to_vec());
}
