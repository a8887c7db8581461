//! The random-beacon precompiled contract.
//!
//! Accepts the three DKG messages from proposers, validates them fully before
//! touching storage, and archives the accepted call bytes so any observer can
//! replay the epoch's DKG from chain state alone. Rejections never write.

use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use log::{debug, error, warn};

use super::{
    address_of, bump_call_times, epoch_key, load_call_times, method_id, state_key, CallContext,
    ProposerGroupSource, StateStore, SubmissionBitmap, RANDOM_BEACON_ADDRESS,
};
use crate::ciphersuite::BeaconSuite;
use crate::dkg::{share_abscissa, verify_row_consistency, DleqProof};
use crate::parameters::{ProtocolConfig, ThresholdParameters};
use crate::stage::{epoch_stage, EpochStage};
use crate::utils::{Scalar, Vec, G1, G2};
use crate::{BeaconResult, Error};

const DKG1_LABEL: &[u8] = b"randomBeaconDkg1";
const DKG2_LABEL: &[u8] = b"randomBeaconDkg2";
const SIG_LABEL: &[u8] = b"randomBeaconSig";
const DKG1_BITMAP_LABEL: &[u8] = b"randomBeaconDkg1Bitmap";
const DKG2_BITMAP_LABEL: &[u8] = b"randomBeaconDkg2Bitmap";
const SIG_BITMAP_LABEL: &[u8] = b"randomBeaconSigBitmap";
const CALL_TIMES_LABEL: &[u8] = b"randomBeaconCallTimes";

/// Phase-1 broadcast: one G2 commitment per committee member.
#[derive(Clone, Debug, Eq, PartialEq, CanonicalSerialize, CanonicalDeserialize)]
pub struct Dkg1Payload<C: BeaconSuite> {
    pub epoch_id: u64,
    pub proposer_id: u32,
    pub commitments: Vec<G2<C>>,
}

/// Phase-2 broadcast: one encrypted share and one DLEQ proof per committee
/// member, column-aligned with the phase-1 commitments.
#[derive(Clone, Debug, Eq, PartialEq, CanonicalSerialize, CanonicalDeserialize)]
pub struct Dkg2Payload<C: BeaconSuite> {
    pub epoch_id: u64,
    pub proposer_id: u32,
    pub encrypted_shares: Vec<G1<C>>,
    pub proofs: Vec<DleqProof<C>>,
}

/// Signing-phase broadcast: the proposer's signature share on the epoch's
/// beacon message.
#[derive(Clone, Debug, Eq, PartialEq, CanonicalSerialize, CanonicalDeserialize)]
pub struct SigPayload<C: BeaconSuite> {
    pub epoch_id: u64,
    pub proposer_id: u32,
    pub signature_share: G1<C>,
}

/// A decoded contract call, resolved once at the boundary.
enum BeaconCall<C: BeaconSuite> {
    Dkg1(Dkg1Payload<C>),
    Dkg2(Dkg2Payload<C>),
    Sig(SigPayload<C>),
}

fn dkg1_selector() -> [u8; 4] {
    method_id("dkg1(bytes)")
}

fn dkg2_selector() -> [u8; 4] {
    method_id("dkg2(bytes)")
}

fn sig_selector() -> [u8; 4] {
    method_id("sigShare(bytes)")
}

fn decode_call<C: BeaconSuite>(input: &[u8]) -> BeaconResult<BeaconCall<C>> {
    if input.len() < 4 {
        return Err(Error::DeserializationError);
    }
    let (selector, mut rest) = input.split_at(4);

    let call = if selector == dkg1_selector() {
        BeaconCall::Dkg1(
            Dkg1Payload::deserialize_compressed(&mut rest)
                .map_err(|_| Error::DeserializationError)?,
        )
    } else if selector == dkg2_selector() {
        BeaconCall::Dkg2(
            Dkg2Payload::deserialize_compressed(&mut rest)
                .map_err(|_| Error::DeserializationError)?,
        )
    } else if selector == sig_selector() {
        BeaconCall::Sig(
            SigPayload::deserialize_compressed(&mut rest)
                .map_err(|_| Error::DeserializationError)?,
        )
    } else {
        return Err(Error::UnknownMethodId);
    };

    // Trailing bytes after the payload mean a malformed call.
    if !rest.is_empty() {
        return Err(Error::DeserializationError);
    }

    Ok(call)
}

/// Prefix `payload` with `selector`, producing the full call bytes.
fn encode_call<C: BeaconSuite, P: CanonicalSerialize>(
    selector: [u8; 4],
    payload: &P,
) -> BeaconResult<Vec<u8>> {
    let mut bytes = selector.to_vec();
    payload
        .serialize_compressed(&mut bytes)
        .map_err(|_| Error::SerializationError)?;
    Ok(bytes)
}

/// Encode a [`Dkg1Payload`] into full call bytes.
pub fn encode_dkg1<C: BeaconSuite>(payload: &Dkg1Payload<C>) -> BeaconResult<Vec<u8>> {
    encode_call::<C, _>(dkg1_selector(), payload)
}

/// Encode a [`Dkg2Payload`] into full call bytes.
pub fn encode_dkg2<C: BeaconSuite>(payload: &Dkg2Payload<C>) -> BeaconResult<Vec<u8>> {
    encode_call::<C, _>(dkg2_selector(), payload)
}

/// Encode a [`SigPayload`] into full call bytes.
pub fn encode_sig<C: BeaconSuite>(payload: &SigPayload<C>) -> BeaconResult<Vec<u8>> {
    encode_call::<C, _>(sig_selector(), payload)
}

/// The random-beacon precompile. Committee lookups go through the injected
/// [`ProposerGroupSource`]; all persistence goes through the [`StateStore`]
/// passed to each call.
pub struct RandomBeaconContract<C: BeaconSuite, S: ProposerGroupSource<C>> {
    group_source: S,
    parameters: ThresholdParameters,
    config: ProtocolConfig,
    _marker: core::marker::PhantomData<C>,
}

impl<C: BeaconSuite, S: ProposerGroupSource<C>> RandomBeaconContract<C, S> {
    pub fn new(group_source: S, parameters: ThresholdParameters, config: ProtocolConfig) -> Self {
        Self {
            group_source,
            parameters,
            config,
            _marker: core::marker::PhantomData,
        }
    }

    /// Dispatch one contract call. Validation happens strictly before any
    /// write; a returned error leaves the store untouched.
    pub fn run(
        &self,
        store: &mut dyn StateStore,
        context: &CallContext,
        input: &[u8],
    ) -> BeaconResult<()> {
        match decode_call::<C>(input)? {
            BeaconCall::Dkg1(payload) => self.submit_dkg1(store, context, &payload, input),
            BeaconCall::Dkg2(payload) => self.submit_dkg2(store, context, &payload, input),
            BeaconCall::Sig(payload) => self.submit_sig(store, context, &payload, input),
        }
    }

    /// The proposer committee for `epoch_id`, falling back to epoch 0's
    /// committee when the target epoch's is not the configured size.
    fn group(&self, epoch_id: u64) -> BeaconResult<Vec<G1<C>>> {
        let group = self.group_source.proposer_group(epoch_id)?;
        if group.len() == self.config.proposer_count {
            return Ok(group);
        }

        warn!(
            "proposer group for epoch {} has {} members, falling back to epoch 0",
            epoch_id,
            group.len()
        );
        self.group_source.proposer_group(0)
    }

    fn check_stage(&self, context: &CallContext, payload_epoch: u64, wanted: EpochStage) -> BeaconResult<()> {
        let (stage, _, _) = epoch_stage(context.slot_id, self.config.k);
        if stage != wanted || context.epoch_id != payload_epoch {
            warn!(
                "submission for epoch {} rejected at epoch {} slot {}: stage is {:?}, wanted {:?}",
                payload_epoch, context.epoch_id, context.slot_id, stage, wanted
            );
            return Err(Error::StageRange);
        }
        Ok(())
    }

    /// Check that the caller owns the committee slot it claims.
    fn check_sender(
        &self,
        context: &CallContext,
        group: &[G1<C>],
        proposer_id: u32,
    ) -> BeaconResult<()> {
        let member = group
            .get(proposer_id as usize)
            .ok_or(Error::UnauthorizedSender)?;
        if address_of::<C>(member)? != context.caller {
            return Err(Error::UnauthorizedSender);
        }
        Ok(())
    }

    /// Reject a repeated or out-of-range submission for `index`, otherwise
    /// mark it and persist the whole bitmap. `capacity` is the size of the
    /// epoch's resolved committee, so fallback committees of any size get a
    /// matching bitmap.
    fn claim_slot(
        &self,
        store: &mut dyn StateStore,
        epoch_id: u64,
        label: &[u8],
        index: u32,
        capacity: usize,
    ) -> BeaconResult<()> {
        let key = epoch_key(epoch_id, label);
        let mut bitmap = SubmissionBitmap::load(store, &RANDOM_BEACON_ADDRESS, &key, capacity);
        bitmap.claim(index)?;
        bitmap.persist(store, &RANDOM_BEACON_ADDRESS, key);
        Ok(())
    }

    fn submit_dkg1(
        &self,
        store: &mut dyn StateStore,
        context: &CallContext,
        payload: &Dkg1Payload<C>,
        input: &[u8],
    ) -> BeaconResult<()> {
        self.check_stage(context, payload.epoch_id, EpochStage::Dkg1)?;
        let group = self.group(payload.epoch_id)?;
        self.check_sender(context, &group, payload.proposer_id)?;

        if payload.commitments.len() != group.len() {
            return Err(Error::LengthMismatch(payload.commitments.len(), group.len()));
        }

        let abscissas: Vec<Scalar<C>> = group
            .iter()
            .enumerate()
            .map(|(j, pk)| share_abscissa::<C>(pk, j as u32))
            .collect::<BeaconResult<_>>()?;
        verify_row_consistency::<C>(
            &payload.commitments,
            &abscissas,
            self.parameters.polynomial_degree(),
        )
        .map_err(|e| {
            error!(
                "dkg1 commitment row from proposer {} for epoch {} failed consistency: {}",
                payload.proposer_id, payload.epoch_id, e
            );
            e
        })?;

        self.claim_slot(
            store,
            payload.epoch_id,
            DKG1_BITMAP_LABEL,
            payload.proposer_id,
            group.len(),
        )?;
        store.set_state(
            &RANDOM_BEACON_ADDRESS,
            state_key(payload.epoch_id, payload.proposer_id, DKG1_LABEL),
            input.to_vec(),
        );
        bump_call_times(store, &RANDOM_BEACON_ADDRESS, payload.epoch_id, CALL_TIMES_LABEL);

        debug!(
            "accepted dkg1 from proposer {} for epoch {}",
            payload.proposer_id, payload.epoch_id
        );
        Ok(())
    }

    fn submit_dkg2(
        &self,
        store: &mut dyn StateStore,
        context: &CallContext,
        payload: &Dkg2Payload<C>,
        input: &[u8],
    ) -> BeaconResult<()> {
        self.check_stage(context, payload.epoch_id, EpochStage::Dkg2)?;
        let group = self.group(payload.epoch_id)?;
        self.check_sender(context, &group, payload.proposer_id)?;

        let prior = self.get_dkg1(store, payload.epoch_id, payload.proposer_id)?;

        if payload.encrypted_shares.len() != group.len() {
            return Err(Error::LengthMismatch(
                payload.encrypted_shares.len(),
                group.len(),
            ));
        }
        if payload.proofs.len() != group.len() {
            return Err(Error::LengthMismatch(payload.proofs.len(), group.len()));
        }
        if prior.commitments.len() != payload.encrypted_shares.len() {
            return Err(Error::ValueInconsistent);
        }

        for (j, ((public_key, encrypted), (commitment, proof))) in group
            .iter()
            .zip(payload.encrypted_shares.iter())
            .zip(prior.commitments.iter().zip(payload.proofs.iter()))
            .enumerate()
        {
            proof.verify(public_key, encrypted, commitment).map_err(|e| {
                error!(
                    "dkg2 proof {} from proposer {} for epoch {} failed: {}",
                    j, payload.proposer_id, payload.epoch_id, e
                );
                e
            })?;
        }

        self.claim_slot(
            store,
            payload.epoch_id,
            DKG2_BITMAP_LABEL,
            payload.proposer_id,
            group.len(),
        )?;
        store.set_state(
            &RANDOM_BEACON_ADDRESS,
            state_key(payload.epoch_id, payload.proposer_id, DKG2_LABEL),
            input.to_vec(),
        );
        bump_call_times(store, &RANDOM_BEACON_ADDRESS, payload.epoch_id, CALL_TIMES_LABEL);

        debug!(
            "accepted dkg2 from proposer {} for epoch {}",
            payload.proposer_id, payload.epoch_id
        );
        Ok(())
    }

    fn submit_sig(
        &self,
        store: &mut dyn StateStore,
        context: &CallContext,
        payload: &SigPayload<C>,
        input: &[u8],
    ) -> BeaconResult<()> {
        self.check_stage(context, payload.epoch_id, EpochStage::Sign)?;
        let group = self.group(payload.epoch_id)?;
        self.check_sender(context, &group, payload.proposer_id)?;

        self.claim_slot(
            store,
            payload.epoch_id,
            SIG_BITMAP_LABEL,
            payload.proposer_id,
            group.len(),
        )?;
        store.set_state(
            &RANDOM_BEACON_ADDRESS,
            state_key(payload.epoch_id, payload.proposer_id, SIG_LABEL),
            input.to_vec(),
        );
        bump_call_times(store, &RANDOM_BEACON_ADDRESS, payload.epoch_id, CALL_TIMES_LABEL);

        debug!(
            "accepted signature share from proposer {} for epoch {}",
            payload.proposer_id, payload.epoch_id
        );
        Ok(())
    }

    /// Read back a stored phase-1 payload.
    pub fn get_dkg1(
        &self,
        store: &dyn StateStore,
        epoch_id: u64,
        proposer_id: u32,
    ) -> BeaconResult<Dkg1Payload<C>> {
        let bytes = store
            .get_state(
                &RANDOM_BEACON_ADDRESS,
                &state_key(epoch_id, proposer_id, DKG1_LABEL),
            )
            .ok_or(Error::MissingPriorMessage)?;

        match decode_call::<C>(&bytes)? {
            BeaconCall::Dkg1(payload)
                if payload.epoch_id == epoch_id && payload.proposer_id == proposer_id =>
            {
                Ok(payload)
            }
            _ => Err(Error::DecodeMismatch),
        }
    }

    /// Read back a stored phase-2 payload.
    pub fn get_dkg2(
        &self,
        store: &dyn StateStore,
        epoch_id: u64,
        proposer_id: u32,
    ) -> BeaconResult<Dkg2Payload<C>> {
        let bytes = store
            .get_state(
                &RANDOM_BEACON_ADDRESS,
                &state_key(epoch_id, proposer_id, DKG2_LABEL),
            )
            .ok_or(Error::MissingPriorMessage)?;

        match decode_call::<C>(&bytes)? {
            BeaconCall::Dkg2(payload)
                if payload.epoch_id == epoch_id && payload.proposer_id == proposer_id =>
            {
                Ok(payload)
            }
            _ => Err(Error::DecodeMismatch),
        }
    }

    /// Read back a stored signature-share payload.
    pub fn get_sig(
        &self,
        store: &dyn StateStore,
        epoch_id: u64,
        proposer_id: u32,
    ) -> BeaconResult<SigPayload<C>> {
        let bytes = store
            .get_state(
                &RANDOM_BEACON_ADDRESS,
                &state_key(epoch_id, proposer_id, SIG_LABEL),
            )
            .ok_or(Error::MissingPriorMessage)?;

        match decode_call::<C>(&bytes)? {
            BeaconCall::Sig(payload)
                if payload.epoch_id == epoch_id && payload.proposer_id == proposer_id =>
            {
                Ok(payload)
            }
            _ => Err(Error::DecodeMismatch),
        }
    }

    /// How many calls this epoch has accepted so far.
    pub fn call_times(&self, store: &dyn StateStore, epoch_id: u64) -> u64 {
        load_call_times(store, &RANDOM_BEACON_ADDRESS, epoch_id, CALL_TIMES_LABEL)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::contract::Address;
    use crate::testing::{Bn254Keccak, MemoryStore, StaticCommittee};
    use crate::utils::Scalar;

    use ark_ec::Group;
    use ark_ff::UniformRand;
    use rand::rngs::OsRng;

    type F = Scalar<Bn254Keccak>;

    fn small_committee(n: usize) -> (Vec<F>, StaticCommittee<Bn254Keccak>) {
        let mut rng = OsRng;
        let secrets: Vec<F> = (0..n).map(|_| F::rand(&mut rng)).collect();
        let keys = secrets
            .iter()
            .map(|sk| G1::<Bn254Keccak>::generator() * sk)
            .collect();
        (secrets, StaticCommittee::new(keys))
    }

    #[test]
    fn unknown_selector_is_rejected() {
        let (_, committee) = small_committee(3);
        let contract = RandomBeaconContract::new(
            committee,
            ThresholdParameters::new(3, 2),
            ProtocolConfig {
                proposer_count: 3,
                ..ProtocolConfig::default()
            },
        );
        let mut store = MemoryStore::default();
        let context = CallContext {
            caller: Address([0u8; 20]),
            epoch_id: 1,
            slot_id: 0,
        };

        assert_eq!(
            contract
                .run(&mut store, &context, &[0xde, 0xad, 0xbe, 0xef, 0x00])
                .unwrap_err(),
            Error::UnknownMethodId
        );
        assert_eq!(contract.call_times(&store, 1), 0);
    }

    #[test]
    fn read_back_under_a_foreign_key_is_a_decode_mismatch() {
        let (_, committee) = small_committee(3);
        let contract = RandomBeaconContract::new(
            committee,
            ThresholdParameters::new(3, 2),
            ProtocolConfig {
                proposer_count: 3,
                ..ProtocolConfig::default()
            },
        );
        let mut store = MemoryStore::default();

        let payload = Dkg1Payload::<Bn254Keccak> {
            epoch_id: 1,
            proposer_id: 0,
            commitments: vec![G2::<Bn254Keccak>::generator(); 3],
        };
        let input = encode_dkg1(&payload).unwrap();

        // Same epoch, stored under another proposer's key.
        store.set_state(
            &RANDOM_BEACON_ADDRESS,
            state_key(1, 2, DKG1_LABEL),
            input.clone(),
        );
        assert_eq!(
            contract.get_dkg1(&store, 1, 2).unwrap_err(),
            Error::DecodeMismatch
        );

        // Same proposer, stored under another epoch's key.
        store.set_state(&RANDOM_BEACON_ADDRESS, state_key(7, 0, DKG1_LABEL), input);
        assert_eq!(
            contract.get_dkg1(&store, 7, 0).unwrap_err(),
            Error::DecodeMismatch
        );
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let (_, committee) = small_committee(3);
        let contract = RandomBeaconContract::new(
            committee,
            ThresholdParameters::new(3, 2),
            ProtocolConfig {
                proposer_count: 3,
                ..ProtocolConfig::default()
            },
        );
        let mut store = MemoryStore::default();

        let payload = SigPayload::<Bn254Keccak> {
            epoch_id: 1,
            proposer_id: 0,
            signature_share: G1::<Bn254Keccak>::generator(),
        };
        let mut input = encode_sig(&payload).unwrap();
        input.push(0);

        let context = CallContext {
            caller: Address([0u8; 20]),
            epoch_id: 1,
            slot_id: 80,
        };
        assert_eq!(
            contract.run(&mut store, &context, &input).unwrap_err(),
            Error::DeserializationError
        );
    }
}
