use core::fmt::Debug;
use core::marker::{Send, Sync};

use zeroize::Zeroize;

use ark_ec::pairing::Pairing;

use crate::utils::{Scalar, String};
use digest::core_api::BlockSizeUser;
use digest::{Digest, DynDigest, FixedOutputReset};

/// A trait defining the pairing engine and cryptographic hash function details
/// of a random beacon protocol instantiation.
///
/// Public keys, encrypted shares and signature shares live on the engine's
/// first group; share commitments live on the second group, so that partial
/// signatures can be verified against commitments through the bilinear map
/// without anyone reconstructing the shared secret.
pub trait BeaconSuite: Copy + Clone + PartialEq + Eq + Debug + Send + Sync + Zeroize {
    /// The pairing engine on which this [`BeaconSuite`] operates.
    type E: Pairing;

    /// A byte array of a given length for this [`BeaconSuite`]'s binary hashers.
    type HashOutput: AsRef<[u8]> + AsMut<[u8]> + Default;

    /// The underlying hasher used to construct all random oracles of this
    /// [`BeaconSuite`].
    type InnerHasher: Default + Clone + Digest + DynDigest + FixedOutputReset + BlockSizeUser;

    /// A method returning this [`BeaconSuite`]'s custom context string, to be
    /// used in the different random oracles invoked in the protocol.
    fn context_string() -> String;

    /// `h0` hash for this [`BeaconSuite`].
    ///
    /// The context string for `h0` is this [`BeaconSuite`]'s context string,
    /// concatenated with "dleq".
    ///
    /// It is used to compute the Fiat-Shamir challenges of the discrete-log
    /// equality proofs binding encrypted shares to their commitments.
    fn h0(m: &[u8]) -> Scalar<Self> {
        crate::utils::hash_to_field::<Self>((Self::context_string() + "dleq").as_bytes(), m)
    }

    /// `h1` hash for this [`BeaconSuite`].
    ///
    /// The context string for `h1` is this [`BeaconSuite`]'s context string,
    /// concatenated with "abscissa".
    ///
    /// It is used to derive the polynomial evaluation point of a committee
    /// member from its public key, so every participant agrees on the
    /// evaluation points without extra coordination.
    fn h1(m: &[u8]) -> Scalar<Self> {
        crate::utils::hash_to_field::<Self>((Self::context_string() + "abscissa").as_bytes(), m)
    }

    /// Plain digest under this [`BeaconSuite`]'s hasher, without any context
    /// string. The beacon message derivation is fixed by the chain protocol
    /// and is not domain-separated.
    fn hash(m: &[u8]) -> Self::HashOutput {
        crate::utils::hash_to_array::<Self>(b"", m)
    }
}
