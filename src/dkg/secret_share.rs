//! Individual secret shares, their encrypted form and their public
//! commitments.
//!
//! A share is encrypted by scalar-multiplying it into the recipient's public
//! key on the first group, and committed by scalar-multiplying it into the
//! fixed base point of the second group. The pairing between the two groups
//! is what later lets anyone verify aggregated signature shares against the
//! stored commitments.

use ark_ec::Group;
use ark_ff::Zero;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

use zeroize::Zeroize;

use crate::ciphersuite::BeaconSuite;
use crate::serialization::impl_serialization_traits;
use crate::utils::{Scalar, G1, G2};
use crate::{BeaconResult, Error};

use super::polynomial::Polynomial;

/// A secret share calculated by evaluating a dealer's polynomial at the
/// recipient's abscissa. Zeroed on drop; only broadcast in encrypted form.
#[derive(Clone, Debug, Eq, PartialEq, Zeroize)]
pub struct SecretShare<C: BeaconSuite> {
    /// The committee index of the dealer.
    pub sender_index: u32,
    /// The committee index this share was calculated for.
    pub receiver_index: u32,
    /// The polynomial evaluation at the receiver's abscissa.
    pub(crate) evaluation: Scalar<C>,
}

impl<C: BeaconSuite> Drop for SecretShare<C> {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl<C: BeaconSuite> SecretShare<C> {
    /// Evaluate the dealer's polynomial at the receiver's abscissa `x`.
    pub fn evaluate(
        sender_index: u32,
        receiver_index: u32,
        polynomial: &Polynomial<C>,
        x: &Scalar<C>,
    ) -> Self {
        Self {
            sender_index,
            receiver_index,
            evaluation: polynomial.evaluate(x),
        }
    }

    /// Encrypt this share under the receiver's public key: `pk * share` on
    /// the first group. Safe to broadcast and to persist in chain state.
    pub fn encrypt(&self, recipient_public_key: &G1<C>) -> BeaconResult<EncryptedShare<C>> {
        if self.evaluation.is_zero() {
            return Err(Error::InvalidScalar);
        }

        Ok(EncryptedShare(*recipient_public_key * self.evaluation))
    }

    /// Commit to this share on the second group: `base2 * share`. Publicly
    /// verifiable, reveals nothing about the share.
    pub fn commit(&self) -> ShareCommitment<C> {
        ShareCommitment(G2::<C>::generator() * self.evaluation)
    }

    pub(crate) fn value(&self) -> &Scalar<C> {
        &self.evaluation
    }
}

/// A secret share multiplied into its recipient's public key.
#[derive(Clone, Copy, Debug, Eq, PartialEq, CanonicalSerialize, CanonicalDeserialize)]
pub struct EncryptedShare<C: BeaconSuite>(pub G1<C>);

impl_serialization_traits!(EncryptedShare<C>);

/// A secret share multiplied into the second group's base point.
#[derive(Clone, Copy, Debug, Eq, PartialEq, CanonicalSerialize, CanonicalDeserialize)]
pub struct ShareCommitment<C: BeaconSuite>(pub G2<C>);

impl_serialization_traits!(ShareCommitment<C>);
