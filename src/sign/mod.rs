//! Threshold signing over the DKG output.
//!
//! After phase 2 every participant decrypts the shares addressed to it and
//! folds them into a single [`KeyShare`]. Signature shares are plain scalar
//! multiples of the key share; any `t` of them aggregate by summation and
//! verify against the summed public key shares with one pairing equation.

use ark_ec::pairing::Pairing;
use ark_ec::Group;
use ark_ff::{Field, PrimeField, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

use crate::ciphersuite::BeaconSuite;
use crate::serialization::impl_serialization_traits;
use crate::utils::{trimmed_be_bytes, Scalar, Vec, G1, G2};
use crate::{BeaconResult, Error};

/// A participant's aggregated signing key, the group secret polynomial
/// evaluated at that participant's abscissa on the first group.
///
/// Key shares are derived locally and never leave the holder, so they carry
/// no serialization support.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyShare<C: BeaconSuite>(G1<C>);

impl<C: BeaconSuite> KeyShare<C> {
    /// Fold the encrypted shares addressed to the holder of `private_key`
    /// into a key share.
    ///
    /// Each encrypted share is `pk * s`, so dividing their sum by the private
    /// key recovers `base1 * sum(s)` without ever exposing the individual
    /// share values.
    pub fn aggregate(
        private_key: &Scalar<C>,
        encrypted_shares: &[G1<C>],
        threshold: u32,
    ) -> BeaconResult<Self> {
        if encrypted_shares.len() < threshold as usize {
            return Err(Error::InsufficientShares(encrypted_shares.len(), threshold));
        }

        let inverse = private_key.inverse().ok_or(Error::InvalidScalar)?;
        let sum: G1<C> = encrypted_shares.iter().sum();

        Ok(Self(sum * inverse))
    }

    /// Sign `message` by scaling the key share with the message scalar.
    pub fn sign(&self, message: &[u8]) -> SignatureShare<C> {
        SignatureShare(self.0 * Scalar::<C>::from_be_bytes_mod_order(message))
    }
}

/// One participant's contribution to the threshold signature.
#[derive(Clone, Copy, Debug, Eq, PartialEq, CanonicalSerialize, CanonicalDeserialize)]
pub struct SignatureShare<C: BeaconSuite>(pub G1<C>);

impl_serialization_traits!(SignatureShare<C>);

/// Derive a participant's public key share from the phase-1 commitment rows:
/// the column sum at `index` is the group polynomial evaluated at that
/// participant's abscissa on the second group.
pub fn public_key_share<C: BeaconSuite>(
    commitment_rows: &[Vec<G2<C>>],
    index: usize,
) -> BeaconResult<G2<C>> {
    let mut sum = G2::<C>::zero();
    for row in commitment_rows {
        let entry = row
            .get(index)
            .ok_or(Error::LengthMismatch(row.len(), index + 1))?;
        sum += entry;
    }

    Ok(sum)
}

/// Verify that `signature_shares` are valid signatures on `message` under the
/// matching `public_key_shares`, checking the whole batch with one pairing
/// equation.
///
/// The equation is linear in the shares, so it holds for any subset of at
/// least `threshold` valid shares regardless of which participants
/// contributed them.
pub fn verify_aggregate_signature<C: BeaconSuite>(
    signature_shares: &[SignatureShare<C>],
    public_key_shares: &[G2<C>],
    message: &[u8],
    threshold: u32,
) -> BeaconResult<()> {
    if signature_shares.len() != public_key_shares.len() {
        return Err(Error::LengthMismatch(
            signature_shares.len(),
            public_key_shares.len(),
        ));
    }
    if signature_shares.len() < threshold as usize {
        return Err(Error::InsufficientShares(signature_shares.len(), threshold));
    }

    let signature_sum: G1<C> = signature_shares.iter().map(|s| s.0).sum();
    let public_sum: G2<C> = public_key_shares.iter().sum();
    let message_point = G1::<C>::generator() * Scalar::<C>::from_be_bytes_mod_order(message);

    if C::E::pairing(signature_sum, G2::<C>::generator())
        == C::E::pairing(message_point, public_sum)
    {
        Ok(())
    } else {
        Err(Error::PairingMismatch)
    }
}

/// The message signed for epoch `next_epoch_id`: the digest of the trimmed
/// big-endian epoch number concatenated with the previous beacon output.
pub fn beacon_message<C: BeaconSuite>(next_epoch_id: u64, previous_random: &[u8]) -> C::HashOutput {
    let mut preimage = trimmed_be_bytes(next_epoch_id);
    preimage.extend_from_slice(previous_random);

    C::hash(&preimage)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dkg::Polynomial;
    use crate::testing::Bn254Keccak;

    use ark_ff::UniformRand;
    use rand::rngs::OsRng;

    type F = Scalar<Bn254Keccak>;
    type P1 = G1<Bn254Keccak>;
    type P2 = G2<Bn254Keccak>;

    #[test]
    fn aggregation_recovers_the_polynomial_evaluation() {
        let mut rng = OsRng;
        let sk = F::rand(&mut rng);
        let pk = P1::generator() * sk;

        let shares: Vec<F> = (0..5).map(|_| F::rand(&mut rng)).collect();
        let encrypted: Vec<P1> = shares.iter().map(|s| pk * s).collect();

        let key_share = KeyShare::<Bn254Keccak>::aggregate(&sk, &encrypted, 5).unwrap();
        let expected: F = shares.iter().sum();
        assert_eq!(key_share.0, P1::generator() * expected);
    }

    #[test]
    fn aggregation_requires_threshold_shares() {
        let mut rng = OsRng;
        let sk = F::rand(&mut rng);
        let encrypted = vec![P1::generator() * F::rand(&mut rng); 3];

        assert_eq!(
            KeyShare::<Bn254Keccak>::aggregate(&sk, &encrypted, 5).unwrap_err(),
            Error::InsufficientShares(3, 5)
        );
    }

    #[test]
    fn threshold_signature_verifies_for_any_large_enough_subset() {
        let mut rng = OsRng;
        let n = 7usize;
        let t = 4u32;

        // One dealer is enough to exercise the pairing relation.
        let poly = Polynomial::<Bn254Keccak>::random(F::rand(&mut rng), 3, &mut rng).unwrap();
        let abscissas: Vec<F> = (0..n).map(|_| F::rand(&mut rng)).collect();

        let message = b"beacon round 42";
        let mut signature_shares = Vec::new();
        let mut public_shares = Vec::new();
        for x in &abscissas {
            let evaluation = poly.evaluate(x);
            let key_share = KeyShare::<Bn254Keccak>(P1::generator() * evaluation);
            signature_shares.push(key_share.sign(message));
            public_shares.push(P2::generator() * evaluation);
        }

        verify_aggregate_signature::<Bn254Keccak>(&signature_shares, &public_shares, message, t)
            .unwrap();
        verify_aggregate_signature::<Bn254Keccak>(
            &signature_shares[..4],
            &public_shares[..4],
            message,
            t,
        )
        .unwrap();

        signature_shares[0].0 = P1::generator() * F::rand(&mut rng);
        assert_eq!(
            verify_aggregate_signature::<Bn254Keccak>(
                &signature_shares,
                &public_shares,
                message,
                t
            )
            .unwrap_err(),
            Error::PairingMismatch
        );
    }

    #[test]
    fn beacon_message_matches_the_manual_digest() {
        use sha3::{Digest, Keccak256};

        let previous = [0xabu8; 32];
        let message = beacon_message::<Bn254Keccak>(0x0102, &previous);

        let mut hasher = Keccak256::new();
        hasher.update([1u8, 2]);
        hasher.update(previous);
        assert_eq!(message.as_ref(), hasher.finalize().as_slice());
    }
}
