//! Secret sharing polynomials and the derivation of the per-recipient
//! evaluation points.

use ark_ff::{UniformRand, Zero};
use ark_serialize::CanonicalSerialize;

use rand::{CryptoRng, RngCore};

use zeroize::Zeroize;

use crate::ciphersuite::BeaconSuite;
use crate::utils::{Scalar, ToString, Vec, G1};
use crate::{BeaconResult, Error};

/// A secret sharing polynomial over the suite's scalar field. The constant
/// term is the dealt secret; the polynomial is zeroed when it falls out of
/// scope and is never serialized.
#[derive(Clone, Debug, Zeroize)]
pub struct Polynomial<C: BeaconSuite> {
    pub(crate) coefficients: Vec<Scalar<C>>,
}

impl<C: BeaconSuite> Drop for Polynomial<C> {
    fn drop(&mut self) {
        self.coefficients.iter_mut().zeroize();
    }
}

impl<C: BeaconSuite> Polynomial<C> {
    /// Build a random polynomial of the given degree with `secret` as its
    /// constant term.
    pub fn random(
        secret: Scalar<C>,
        degree: usize,
        mut rng: impl RngCore + CryptoRng,
    ) -> BeaconResult<Self> {
        if secret.is_zero() {
            return Err(Error::InvalidScalar);
        }

        let mut coefficients = Vec::with_capacity(degree + 1);
        coefficients.push(secret);
        for _ in 0..degree {
            coefficients.push(Scalar::<C>::rand(&mut rng));
        }

        Ok(Self { coefficients })
    }

    /// The degree of this polynomial.
    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Evaluate the polynomial at `x`.
    pub fn evaluate(&self, x: &Scalar<C>) -> Scalar<C> {
        let mut sum = Scalar::<C>::zero();

        // Evaluate using Horner's method.
        for (k, coefficient) in self.coefficients.iter().rev().enumerate() {
            sum += coefficient;

            if k != (self.coefficients.len() - 1) {
                sum *= x;
            }
        }

        sum
    }
}

/// Derive the polynomial evaluation point of a committee member from its
/// public key and committee index.
///
/// Every participant evaluates every polynomial at the same per-recipient
/// abscissa, so the derivation must be deterministic and collision-free
/// across the committee; hashing the key together with the index into the
/// scalar field gives both without extra coordination.
pub fn share_abscissa<C: BeaconSuite>(
    public_key: &G1<C>,
    index: u32,
) -> BeaconResult<Scalar<C>> {
    let mut message = index.to_be_bytes().to_vec();
    public_key
        .serialize_compressed(&mut message)
        .map_err(|_| Error::SerializationError)?;

    let x = C::h1(&message);
    if x.is_zero() {
        // An abscissa of zero would evaluate the polynomial at its secret.
        return Err(Error::Custom(
            "share abscissa hashed to zero".to_string(),
        ));
    }

    Ok(x)
}
