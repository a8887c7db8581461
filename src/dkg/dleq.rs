//! Discrete-log equality proofs.
//!
//! [`DleqProof`] is a Chaum-Pedersen proof across the two pairing groups: it
//! binds an encrypted share `pk * s` on the first group to its commitment
//! `base2 * s` on the second group without revealing `s`. The verifier of a
//! DKG phase-2 submission checks one such proof per recipient against the
//! commitment row stored in phase 1.
//!
//! [`VectorDleqProof`] proves that a single exponent links every base/image
//! pair of a list on the first group; the slot-leader contract uses it to tie
//! the blinded per-slot keys to the epoch-leader key list.

use ark_ec::Group;
use ark_ff::{UniformRand, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

use rand::{CryptoRng, RngCore};

use crate::ciphersuite::BeaconSuite;
use crate::serialization::impl_serialization_traits;
use crate::utils::{Scalar, Vec, G1, G2};
use crate::{BeaconResult, Error};

/// A Chaum-Pedersen proof that the same exponent `s` relates
/// `pk -> pk * s` on the first group and `base2 -> base2 * s` on the second.
///
/// The challenge is derived by Fiat-Shamir over both bases, both images and
/// both announcements, so the proof is bound to one specific
/// (encrypted share, commitment) pair.
#[derive(Clone, Debug, Eq, PartialEq, CanonicalSerialize, CanonicalDeserialize)]
pub struct DleqProof<C: BeaconSuite> {
    /// Announcement `pk * w` on the first group.
    a1: G1<C>,
    /// Announcement `base2 * w` on the second group.
    a2: G2<C>,
    /// Response `w - c * s`.
    z: Scalar<C>,
}

impl_serialization_traits!(DleqProof<C>);

impl<C: BeaconSuite> DleqProof<C> {
    /// Prove that `share` exponentiates both `recipient_public_key` and the
    /// second group's base point.
    pub fn prove(
        recipient_public_key: &G1<C>,
        share: &Scalar<C>,
        mut rng: impl RngCore + CryptoRng,
    ) -> BeaconResult<Self> {
        Self::prove_with_nonce(recipient_public_key, share, Scalar::<C>::rand(&mut rng))
    }

    /// Prove with a caller-supplied random nonce. The nonce must be drawn
    /// from a cryptographically secure source and never reused.
    pub(crate) fn prove_with_nonce(
        recipient_public_key: &G1<C>,
        share: &Scalar<C>,
        w: Scalar<C>,
    ) -> BeaconResult<Self> {
        if share.is_zero() {
            return Err(Error::InvalidScalar);
        }

        let base2 = G2::<C>::generator();
        let a1 = *recipient_public_key * w;
        let a2 = base2 * w;

        let encrypted = *recipient_public_key * share;
        let committed = base2 * share;
        let c = challenge::<C>(recipient_public_key, &encrypted, &committed, &a1, &a2)?;

        Ok(Self {
            a1,
            a2,
            z: w - c * share,
        })
    }

    /// Verify this proof against the claimed encrypted share and commitment.
    pub fn verify(
        &self,
        recipient_public_key: &G1<C>,
        encrypted_share: &G1<C>,
        commitment: &G2<C>,
    ) -> BeaconResult<()> {
        let base2 = G2::<C>::generator();
        let c = challenge::<C>(
            recipient_public_key,
            encrypted_share,
            commitment,
            &self.a1,
            &self.a2,
        )?;

        if self.a1 == *recipient_public_key * self.z + *encrypted_share * c
            && self.a2 == base2 * self.z + *commitment * c
        {
            Ok(())
        } else {
            Err(Error::ProofInvalid)
        }
    }
}

fn challenge<C: BeaconSuite>(
    public_key: &G1<C>,
    encrypted_share: &G1<C>,
    commitment: &G2<C>,
    a1: &G1<C>,
    a2: &G2<C>,
) -> BeaconResult<Scalar<C>> {
    let mut message = Vec::new();
    for point in [public_key, encrypted_share, a1] {
        point
            .serialize_compressed(&mut message)
            .map_err(|_| Error::SerializationError)?;
    }
    for point in [commitment, a2] {
        point
            .serialize_compressed(&mut message)
            .map_err(|_| Error::SerializationError)?;
    }

    Ok(C::h0(&message))
}

/// A proof that one exponent `alpha` links `bases[i] -> images[i]` for every
/// entry of a list on the first group.
///
/// Verification recomputes the announcements as `bases[i] * z + images[i] * e`
/// and checks that they hash back to `e`.
#[derive(Clone, Debug, Eq, PartialEq, CanonicalSerialize, CanonicalDeserialize)]
pub struct VectorDleqProof<C: BeaconSuite> {
    /// The Fiat-Shamir challenge.
    e: Scalar<C>,
    /// Response `w - e * alpha`.
    z: Scalar<C>,
}

impl_serialization_traits!(VectorDleqProof<C>);

impl<C: BeaconSuite> VectorDleqProof<C> {
    /// Prove that `images[i] == bases[i] * alpha` for every `i`.
    pub fn prove(
        bases: &[G1<C>],
        alpha: &Scalar<C>,
        mut rng: impl RngCore + CryptoRng,
    ) -> BeaconResult<Self> {
        if alpha.is_zero() || bases.is_empty() {
            return Err(Error::InvalidScalar);
        }

        let w = Scalar::<C>::rand(&mut rng);
        let images: Vec<G1<C>> = bases.iter().map(|b| *b * alpha).collect();
        let announcements: Vec<G1<C>> = bases.iter().map(|b| *b * w).collect();

        let e = vector_challenge::<C>(bases, &images, &announcements)?;

        Ok(Self { e, z: w - e * alpha })
    }

    /// Verify this proof against the full base and image lists.
    pub fn verify(&self, bases: &[G1<C>], images: &[G1<C>]) -> BeaconResult<()> {
        if bases.len() != images.len() || bases.is_empty() {
            return Err(Error::LengthMismatch(images.len(), bases.len()));
        }

        let announcements: Vec<G1<C>> = bases
            .iter()
            .zip(images.iter())
            .map(|(base, image)| *base * self.z + *image * self.e)
            .collect();

        if self.e == vector_challenge::<C>(bases, images, &announcements)? {
            Ok(())
        } else {
            Err(Error::ProofInvalid)
        }
    }
}

fn vector_challenge<C: BeaconSuite>(
    bases: &[G1<C>],
    images: &[G1<C>],
    announcements: &[G1<C>],
) -> BeaconResult<Scalar<C>> {
    let mut message = Vec::new();
    for point in bases.iter().chain(images).chain(announcements) {
        point
            .serialize_compressed(&mut message)
            .map_err(|_| Error::SerializationError)?;
    }

    Ok(C::h0(&message))
}
