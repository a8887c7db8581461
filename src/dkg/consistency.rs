//! Reed-Solomon consistency checking of commitment rows.
//!
//! A phase-1 commitment row is well formed iff its entries are evaluations of
//! one polynomial of degree `t - 1` in the exponent. The check interpolates
//! the row from its first `t` entries at every remaining abscissa and compares
//! against the claimed entry, which is exact for honestly generated rows and
//! fails for any row that does not lie on a single degree-bounded polynomial.

use ark_ff::{Field, One, Zero};

use crate::ciphersuite::BeaconSuite;
use crate::utils::{Scalar, ToString, G2};
use crate::{BeaconResult, Error};

/// Compute the Lagrange coefficient for interpolation point `my_abscissa`
/// among `abscissas`, evaluated at `target`.
fn lagrange_coefficient<C: BeaconSuite>(
    my_abscissa: &Scalar<C>,
    abscissas: &[Scalar<C>],
    target: &Scalar<C>,
) -> BeaconResult<Scalar<C>> {
    let mut numerator = Scalar::<C>::one();
    let mut denominator = Scalar::<C>::one();

    for abscissa in abscissas {
        if abscissa == my_abscissa {
            continue;
        }
        numerator *= *target - abscissa;
        denominator *= *my_abscissa - abscissa;
    }

    denominator
        .inverse()
        .map(|inv| numerator * inv)
        .ok_or_else(|| Error::Custom("Duplicate shares provided".to_string()))
}

/// Check that `commitments` lie on a single polynomial of degree `degree` in
/// the exponent, with `commitments[i]` the evaluation at `abscissas[i]`.
///
/// Rows with at most `degree + 1` entries are trivially consistent. Returns
/// [`Error::ValueInconsistent`] when any entry deviates from the polynomial
/// interpolated through the first `degree + 1` entries.
pub fn verify_row_consistency<C: BeaconSuite>(
    commitments: &[G2<C>],
    abscissas: &[Scalar<C>],
    degree: usize,
) -> BeaconResult<()> {
    if commitments.len() != abscissas.len() {
        return Err(Error::LengthMismatch(commitments.len(), abscissas.len()));
    }
    if commitments.len() <= degree + 1 {
        return Ok(());
    }

    let basis = &abscissas[..degree + 1];

    for (commitment, target) in commitments
        .iter()
        .zip(abscissas.iter())
        .skip(degree + 1)
    {
        let mut interpolated = G2::<C>::zero();
        for (base_commitment, base_abscissa) in commitments.iter().zip(basis.iter()) {
            let coefficient = lagrange_coefficient::<C>(base_abscissa, basis, target)?;
            interpolated += *base_commitment * coefficient;
        }

        if interpolated != *commitment {
            return Err(Error::ValueInconsistent);
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dkg::Polynomial;
    use crate::testing::Bn254Keccak;

    use ark_ec::Group;
    use ark_ff::UniformRand;
    use rand::rngs::OsRng;

    type F = Scalar<Bn254Keccak>;
    type P2 = G2<Bn254Keccak>;

    fn commitment_row(degree: usize, count: usize) -> (Vec<P2>, Vec<F>) {
        let mut rng = OsRng;
        let poly =
            Polynomial::<Bn254Keccak>::random(F::rand(&mut rng), degree, &mut rng).unwrap();
        let abscissas: Vec<F> = (0..count).map(|_| F::rand(&mut rng)).collect();
        let commitments = abscissas
            .iter()
            .map(|x| P2::generator() * poly.evaluate(x))
            .collect();

        (commitments, abscissas)
    }

    #[test]
    fn honest_row_is_consistent() {
        let (commitments, abscissas) = commitment_row(4, 9);
        verify_row_consistency::<Bn254Keccak>(&commitments, &abscissas, 4).unwrap();
    }

    #[test]
    fn tampered_entry_is_detected() {
        let mut rng = OsRng;
        let (mut commitments, abscissas) = commitment_row(4, 9);
        commitments[7] = P2::generator() * F::rand(&mut rng);

        assert_eq!(
            verify_row_consistency::<Bn254Keccak>(&commitments, &abscissas, 4).unwrap_err(),
            Error::ValueInconsistent
        );
    }

    #[test]
    fn overlong_polynomial_is_detected() {
        // A degree-5 row cannot pass a degree-4 bound once more than 5
        // evaluations are visible.
        let (commitments, abscissas) = commitment_row(5, 9);

        assert_eq!(
            verify_row_consistency::<Bn254Keccak>(&commitments, &abscissas, 4).unwrap_err(),
            Error::ValueInconsistent
        );
    }

    #[test]
    fn short_rows_are_trivially_consistent() {
        let (commitments, abscissas) = commitment_row(4, 5);
        verify_row_consistency::<Bn254Keccak>(&commitments, &abscissas, 4).unwrap();
    }
}
