use ark_ff::field_hashers::{DefaultFieldHasher, HashToField};

#[cfg(not(feature = "std"))]
pub use alloc::{
    boxed::Box,
    collections::btree_map::BTreeMap,
    string::{String, ToString},
    vec::{self, Vec},
};

#[cfg(feature = "std")]
pub use std::{
    boxed::Box,
    collections::btree_map::BTreeMap,
    string::{String, ToString},
    vec::{self, Vec},
};

use ark_ec::pairing::Pairing;
use digest::Digest;
use sha3::Keccak256;

use crate::ciphersuite::BeaconSuite;

/// The scalar field shared by both pairing groups of a [`BeaconSuite`].
pub type Scalar<C> = <<C as BeaconSuite>::E as Pairing>::ScalarField;

/// The first pairing group of a [`BeaconSuite`], carrying public keys,
/// encrypted shares and signature shares.
pub type G1<C> = <<C as BeaconSuite>::E as Pairing>::G1;

/// The second pairing group of a [`BeaconSuite`], carrying share commitments.
pub type G2<C> = <<C as BeaconSuite>::E as Pairing>::G2;

pub(crate) fn hash_to_field<C: BeaconSuite>(
    context_string: &[u8],
    message_to_hash: &[u8],
) -> Scalar<C> {
    let h = <DefaultFieldHasher<C::InnerHasher, 128> as HashToField<Scalar<C>>>::new(context_string);

    h.hash_to_field(message_to_hash, 1)[0]
}

pub(crate) fn hash_to_array<C: BeaconSuite>(
    context_string: &[u8],
    message_to_hash: &[u8],
) -> C::HashOutput {
    let mut hasher = C::InnerHasher::new();
    Digest::update(&mut hasher, context_string);
    Digest::update(&mut hasher, message_to_hash);
    let digest = hasher.finalize();

    let mut output = C::HashOutput::default();
    let len = output.as_ref().len();
    output.as_mut().copy_from_slice(&digest[..len]);
    output
}

/// Keccak-256 digest of `data`, the protocol's native hash for state keys,
/// method selectors and sender addresses.
pub(crate) fn keccak256(data: &[u8]) -> [u8; 32] {
    let digest = Keccak256::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Big-endian encoding of `value` with leading zero bytes stripped, matching
/// how the host chain encodes unsigned integers inside hashed preimages.
/// Zero encodes to the empty byte string.
pub(crate) fn trimmed_be_bytes(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes[first..].to_vec()
}
