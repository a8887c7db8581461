//! The local driver a committee member runs through one beacon epoch.
//!
//! A [`RandomBeaconProposer`] produces the three submission payloads in
//! order, retaining the plaintext shares between phase 1 and phase 2.
//! Nothing here has side effects: a payload only matters once it is
//! submitted to the contract, so abandoning a proposer mid-epoch is free.

use ark_ec::Group;
use ark_ff::UniformRand;
use rand::{CryptoRng, RngCore};
use rayon::prelude::*;

use crate::ciphersuite::BeaconSuite;
use crate::contract::random_beacon::{Dkg1Payload, Dkg2Payload, SigPayload};
use crate::contract::BeaconMessageSource;
use crate::dkg::{share_abscissa, DleqProof, Polynomial, SecretShare};
use crate::parameters::ThresholdParameters;
use crate::sign::KeyShare;
use crate::utils::{Scalar, Vec, G1};
use crate::{BeaconResult, Error};

/// Every committee slot whose key equals `public_key`. One node can hold
/// several indices and runs one proposer per index.
pub fn my_proposer_indices<C: BeaconSuite>(group: &[G1<C>], public_key: &G1<C>) -> Vec<u32> {
    group
        .iter()
        .enumerate()
        .filter(|(_, member)| *member == public_key)
        .map(|(index, _)| index as u32)
        .collect()
}

/// One committee member's view of one epoch of the random-beacon protocol.
#[derive(Debug)]
pub struct RandomBeaconProposer<C: BeaconSuite> {
    epoch_id: u64,
    my_index: u32,
    private_key: Scalar<C>,
    group: Vec<G1<C>>,
    parameters: ThresholdParameters,
    /// Plaintext shares retained between phase 1 and phase 2.
    shares: Option<Vec<SecretShare<C>>>,
}

impl<C: BeaconSuite> RandomBeaconProposer<C> {
    /// Set up a proposer for `my_index` in `group`. The private key must
    /// match the group entry at that index.
    pub fn new(
        epoch_id: u64,
        my_index: u32,
        private_key: Scalar<C>,
        group: Vec<G1<C>>,
        parameters: ThresholdParameters,
    ) -> BeaconResult<Self> {
        let member = group
            .get(my_index as usize)
            .ok_or(Error::UnauthorizedSender)?;
        if *member != G1::<C>::generator() * private_key {
            return Err(Error::UnauthorizedSender);
        }

        Ok(Self {
            epoch_id,
            my_index,
            private_key,
            group,
            parameters,
            shares: None,
        })
    }

    pub fn epoch_id(&self) -> u64 {
        self.epoch_id
    }

    pub fn my_index(&self) -> u32 {
        self.my_index
    }

    /// Phase 1: draw the epoch secret, evaluate one share per committee
    /// member and commit to each on the second group. The plaintext shares
    /// are retained for phase 2.
    pub fn generate_dkg1(
        &mut self,
        mut rng: impl RngCore + CryptoRng,
    ) -> BeaconResult<Dkg1Payload<C>> {
        let polynomial = Polynomial::<C>::random(
            Scalar::<C>::rand(&mut rng),
            self.parameters.polynomial_degree(),
            &mut rng,
        )?;
        let abscissas: Vec<Scalar<C>> = self
            .group
            .iter()
            .enumerate()
            .map(|(j, pk)| share_abscissa::<C>(pk, j as u32))
            .collect::<BeaconResult<_>>()?;

        let shares: Vec<SecretShare<C>> = abscissas
            .par_iter()
            .enumerate()
            .map(|(j, x)| SecretShare::evaluate(self.my_index, j as u32, &polynomial, x))
            .collect();
        let commitments = shares.par_iter().map(|share| share.commit().0).collect();

        self.shares = Some(shares);

        Ok(Dkg1Payload {
            epoch_id: self.epoch_id,
            proposer_id: self.my_index,
            commitments,
        })
    }

    /// Phase 2: encrypt every retained share under its recipient's key and
    /// prove each encryption consistent with the phase-1 commitment.
    ///
    /// The proof nonces are drawn sequentially from the caller's rng before
    /// the per-recipient work fans out.
    pub fn generate_dkg2(
        &self,
        mut rng: impl RngCore + CryptoRng,
    ) -> BeaconResult<Dkg2Payload<C>> {
        let shares = self.shares.as_ref().ok_or(Error::MissingPriorMessage)?;

        let nonces: Vec<Scalar<C>> = (0..shares.len())
            .map(|_| Scalar::<C>::rand(&mut rng))
            .collect();

        let columns: Vec<(G1<C>, DleqProof<C>)> = shares
            .par_iter()
            .zip(self.group.par_iter())
            .zip(nonces.into_par_iter())
            .map(|((share, public_key), nonce)| {
                let encrypted = share.encrypt(public_key)?;
                let proof = DleqProof::prove_with_nonce(public_key, share.value(), nonce)?;
                Ok((encrypted.0, proof))
            })
            .collect::<BeaconResult<_>>()?;

        let (encrypted_shares, proofs) = columns.into_iter().unzip();

        Ok(Dkg2Payload {
            epoch_id: self.epoch_id,
            proposer_id: self.my_index,
            encrypted_shares,
            proofs,
        })
    }

    /// Signing phase: fold the encrypted-share column addressed to us into a
    /// key share and sign the epoch's beacon message.
    pub fn generate_sig(
        &self,
        received_shares: &[G1<C>],
        message_source: &dyn BeaconMessageSource,
    ) -> BeaconResult<SigPayload<C>> {
        let message = message_source.beacon_message(self.epoch_id)?;
        let key_share =
            KeyShare::<C>::aggregate(&self.private_key, received_shares, self.parameters.t)?;

        Ok(SigPayload {
            epoch_id: self.epoch_id,
            proposer_id: self.my_index,
            signature_share: key_share.sign(&message).0,
        })
    }
}
