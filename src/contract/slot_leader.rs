//! The slot-leader precompiled contract.
//!
//! A two-phase commit/reveal: stage 1 stores a masked point committing the
//! leader to its secret exponent, stage 2 reveals the full blinded key list
//! and proves with a vector DLEQ that one exponent links it to the epoch
//! leaders. The stage-2 reveal must match the stage-1 commitment exactly or
//! nothing is written.

use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use log::{debug, error, warn};

use super::{
    address_of, bump_call_times, epoch_key, load_call_times, method_id, state_key, CallContext,
    EpochLeaderSource, StateStore, SubmissionBitmap, SLOT_LEADER_ADDRESS,
};
use crate::ciphersuite::BeaconSuite;
use crate::dkg::VectorDleqProof;
use crate::parameters::ProtocolConfig;
use crate::utils::{Vec, G1};
use crate::{BeaconResult, Error};

const STAGE1_LABEL: &[u8] = b"slotLeaderStage1";
const STAGE2_LABEL: &[u8] = b"slotLeaderStage2";
const STAGE1_BITMAP_LABEL: &[u8] = b"slotLeaderStage1Bitmap";
const STAGE2_BITMAP_LABEL: &[u8] = b"slotLeaderStage2Bitmap";
const CALL_TIMES_LABEL: &[u8] = b"slotLeaderCallTimes";

/// Stage-1 commitment: the masked point `alpha * pk_self`.
#[derive(Clone, Debug, Eq, PartialEq, CanonicalSerialize, CanonicalDeserialize)]
pub struct Stage1Payload<C: BeaconSuite> {
    pub epoch_id: u64,
    pub self_index: u32,
    pub masked_point: G1<C>,
}

/// Stage-2 reveal: the full list `alpha * pk_j` over the epoch leaders plus
/// the proof that one `alpha` produced every entry.
#[derive(Clone, Debug, Eq, PartialEq, CanonicalSerialize, CanonicalDeserialize)]
pub struct Stage2Payload<C: BeaconSuite> {
    pub epoch_id: u64,
    pub self_index: u32,
    pub self_public_key: G1<C>,
    pub alpha_public_keys: Vec<G1<C>>,
    pub proof: VectorDleqProof<C>,
}

enum SlotLeaderCall<C: BeaconSuite> {
    Stage1(Stage1Payload<C>),
    Stage2(Stage2Payload<C>),
}

fn stage1_selector() -> [u8; 4] {
    method_id("slotLeaderStage1MiSave(bytes)")
}

fn stage2_selector() -> [u8; 4] {
    method_id("slotLeaderStage2InfoSave(bytes)")
}

fn decode_call<C: BeaconSuite>(input: &[u8]) -> BeaconResult<SlotLeaderCall<C>> {
    if input.len() < 4 {
        return Err(Error::DeserializationError);
    }
    let (selector, mut rest) = input.split_at(4);

    let call = if selector == stage1_selector() {
        SlotLeaderCall::Stage1(
            Stage1Payload::deserialize_compressed(&mut rest)
                .map_err(|_| Error::DeserializationError)?,
        )
    } else if selector == stage2_selector() {
        SlotLeaderCall::Stage2(
            Stage2Payload::deserialize_compressed(&mut rest)
                .map_err(|_| Error::DeserializationError)?,
        )
    } else {
        return Err(Error::UnknownMethodId);
    };

    if !rest.is_empty() {
        return Err(Error::DeserializationError);
    }

    Ok(call)
}

fn encode_call<P: CanonicalSerialize>(selector: [u8; 4], payload: &P) -> BeaconResult<Vec<u8>> {
    let mut bytes = selector.to_vec();
    payload
        .serialize_compressed(&mut bytes)
        .map_err(|_| Error::SerializationError)?;
    Ok(bytes)
}

/// Encode a [`Stage1Payload`] into full call bytes.
pub fn encode_stage1<C: BeaconSuite>(payload: &Stage1Payload<C>) -> BeaconResult<Vec<u8>> {
    encode_call(stage1_selector(), payload)
}

/// Encode a [`Stage2Payload`] into full call bytes.
pub fn encode_stage2<C: BeaconSuite>(payload: &Stage2Payload<C>) -> BeaconResult<Vec<u8>> {
    encode_call(stage2_selector(), payload)
}

/// The slot-leader precompile.
pub struct SlotLeaderContract<C: BeaconSuite, L: EpochLeaderSource<C>> {
    leader_source: L,
    config: ProtocolConfig,
    _marker: core::marker::PhantomData<C>,
}

impl<C: BeaconSuite, L: EpochLeaderSource<C>> SlotLeaderContract<C, L> {
    pub fn new(leader_source: L, config: ProtocolConfig) -> Self {
        Self {
            leader_source,
            config,
            _marker: core::marker::PhantomData,
        }
    }

    /// Dispatch one contract call. A returned error leaves the store
    /// untouched.
    pub fn run(
        &self,
        store: &mut dyn StateStore,
        context: &CallContext,
        input: &[u8],
    ) -> BeaconResult<()> {
        match decode_call::<C>(input)? {
            SlotLeaderCall::Stage1(payload) => self.submit_stage1(store, context, &payload, input),
            SlotLeaderCall::Stage2(payload) => self.submit_stage2(store, context, &payload, input),
        }
    }

    fn leaders(&self, epoch_id: u64) -> BeaconResult<Vec<G1<C>>> {
        let leaders = self.leader_source.epoch_leaders(epoch_id)?;
        if leaders.len() == self.config.epoch_leader_count {
            return Ok(leaders);
        }

        warn!(
            "epoch-leader set for epoch {} has {} members, falling back to epoch 0",
            epoch_id,
            leaders.len()
        );
        self.leader_source.epoch_leaders(0)
    }

    fn check_window(
        &self,
        context: &CallContext,
        payload_epoch: u64,
        window: &crate::stage::SlotWindow,
    ) -> BeaconResult<()> {
        if context.epoch_id != payload_epoch || !window.contains(context.slot_id) {
            warn!(
                "slot-leader submission for epoch {} rejected at epoch {} slot {}",
                payload_epoch, context.epoch_id, context.slot_id
            );
            return Err(Error::StageRange);
        }
        Ok(())
    }

    fn check_sender<'a>(
        &self,
        context: &CallContext,
        leaders: &'a [G1<C>],
        self_index: u32,
    ) -> BeaconResult<&'a G1<C>> {
        let leader = leaders
            .get(self_index as usize)
            .ok_or(Error::UnauthorizedSender)?;
        if address_of::<C>(leader)? != context.caller {
            return Err(Error::UnauthorizedSender);
        }
        Ok(leader)
    }

    /// Sized from the epoch's resolved leader list, so a fallback list of any
    /// size gets a matching bitmap and out-of-range indices are rejected.
    fn claim_slot(
        &self,
        store: &mut dyn StateStore,
        epoch_id: u64,
        label: &[u8],
        index: u32,
        capacity: usize,
    ) -> BeaconResult<()> {
        let key = epoch_key(epoch_id, label);
        let mut bitmap = SubmissionBitmap::load(store, &SLOT_LEADER_ADDRESS, &key, capacity);
        bitmap.claim(index)?;
        bitmap.persist(store, &SLOT_LEADER_ADDRESS, key);
        Ok(())
    }

    fn submit_stage1(
        &self,
        store: &mut dyn StateStore,
        context: &CallContext,
        payload: &Stage1Payload<C>,
        input: &[u8],
    ) -> BeaconResult<()> {
        self.check_window(context, payload.epoch_id, &self.config.sma1)?;
        let leaders = self.leaders(payload.epoch_id)?;
        self.check_sender(context, &leaders, payload.self_index)?;

        self.claim_slot(
            store,
            payload.epoch_id,
            STAGE1_BITMAP_LABEL,
            payload.self_index,
            leaders.len(),
        )?;
        store.set_state(
            &SLOT_LEADER_ADDRESS,
            state_key(payload.epoch_id, payload.self_index, STAGE1_LABEL),
            input.to_vec(),
        );
        bump_call_times(store, &SLOT_LEADER_ADDRESS, payload.epoch_id, CALL_TIMES_LABEL);

        debug!(
            "accepted slot-leader stage 1 from index {} for epoch {}",
            payload.self_index, payload.epoch_id
        );
        Ok(())
    }

    fn submit_stage2(
        &self,
        store: &mut dyn StateStore,
        context: &CallContext,
        payload: &Stage2Payload<C>,
        input: &[u8],
    ) -> BeaconResult<()> {
        self.check_window(context, payload.epoch_id, &self.config.sma2)?;
        let leaders = self.leaders(payload.epoch_id)?;
        let leader = self.check_sender(context, &leaders, payload.self_index)?;
        if *leader != payload.self_public_key {
            return Err(Error::UnauthorizedSender);
        }

        let commitment = self.get_stage1(store, payload.epoch_id, payload.self_index)?;

        if payload.alpha_public_keys.len() != leaders.len() {
            return Err(Error::LengthMismatch(
                payload.alpha_public_keys.len(),
                leaders.len(),
            ));
        }
        if commitment.masked_point != payload.alpha_public_keys[payload.self_index as usize] {
            error!(
                "slot-leader stage 2 from index {} for epoch {} contradicts its stage-1 commitment",
                payload.self_index, payload.epoch_id
            );
            return Err(Error::ValueInconsistent);
        }

        payload
            .proof
            .verify(&leaders, &payload.alpha_public_keys)
            .map_err(|e| {
                error!(
                    "slot-leader stage 2 proof from index {} for epoch {} failed: {}",
                    payload.self_index, payload.epoch_id, e
                );
                e
            })?;

        self.claim_slot(
            store,
            payload.epoch_id,
            STAGE2_BITMAP_LABEL,
            payload.self_index,
            leaders.len(),
        )?;
        store.set_state(
            &SLOT_LEADER_ADDRESS,
            state_key(payload.epoch_id, payload.self_index, STAGE2_LABEL),
            input.to_vec(),
        );
        bump_call_times(store, &SLOT_LEADER_ADDRESS, payload.epoch_id, CALL_TIMES_LABEL);

        debug!(
            "accepted slot-leader stage 2 from index {} for epoch {}",
            payload.self_index, payload.epoch_id
        );
        Ok(())
    }

    /// Read back a stored stage-1 commitment.
    pub fn get_stage1(
        &self,
        store: &dyn StateStore,
        epoch_id: u64,
        self_index: u32,
    ) -> BeaconResult<Stage1Payload<C>> {
        let bytes = store
            .get_state(
                &SLOT_LEADER_ADDRESS,
                &state_key(epoch_id, self_index, STAGE1_LABEL),
            )
            .ok_or(Error::MissingPriorMessage)?;

        match decode_call::<C>(&bytes)? {
            SlotLeaderCall::Stage1(payload)
                if payload.epoch_id == epoch_id && payload.self_index == self_index =>
            {
                Ok(payload)
            }
            _ => Err(Error::DecodeMismatch),
        }
    }

    /// Read back a stored stage-2 reveal.
    pub fn get_stage2(
        &self,
        store: &dyn StateStore,
        epoch_id: u64,
        self_index: u32,
    ) -> BeaconResult<Stage2Payload<C>> {
        let bytes = store
            .get_state(
                &SLOT_LEADER_ADDRESS,
                &state_key(epoch_id, self_index, STAGE2_LABEL),
            )
            .ok_or(Error::MissingPriorMessage)?;

        match decode_call::<C>(&bytes)? {
            SlotLeaderCall::Stage2(payload)
                if payload.epoch_id == epoch_id && payload.self_index == self_index =>
            {
                Ok(payload)
            }
            _ => Err(Error::DecodeMismatch),
        }
    }

    /// How many calls this epoch has accepted so far.
    pub fn call_times(&self, store: &dyn StateStore, epoch_id: u64) -> u64 {
        load_call_times(store, &SLOT_LEADER_ADDRESS, epoch_id, CALL_TIMES_LABEL)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing::{Bn254Keccak, MemoryStore, StaticCommittee};
    use crate::utils::Scalar;

    use ark_ec::Group;
    use ark_ff::UniformRand;
    use rand::rngs::OsRng;

    type F = Scalar<Bn254Keccak>;
    type P1 = G1<Bn254Keccak>;

    struct Fixture {
        contract: SlotLeaderContract<Bn254Keccak, StaticCommittee<Bn254Keccak>>,
        leaders: Vec<P1>,
        alpha: F,
    }

    fn fixture(n: usize) -> Fixture {
        let mut rng = OsRng;
        let leaders: Vec<P1> = (0..n)
            .map(|_| P1::generator() * F::rand(&mut rng))
            .collect();
        let contract = SlotLeaderContract::new(
            StaticCommittee::new(leaders.clone()),
            ProtocolConfig {
                epoch_leader_count: n,
                ..ProtocolConfig::default()
            },
        );

        Fixture {
            contract,
            leaders,
            alpha: F::rand(&mut rng),
        }
    }

    #[test]
    fn stage2_without_stage1_is_rejected() {
        let mut rng = OsRng;
        let f = fixture(4);
        let mut store = MemoryStore::default();

        let alpha_keys: Vec<P1> = f.leaders.iter().map(|pk| *pk * f.alpha).collect();
        let proof =
            VectorDleqProof::<Bn254Keccak>::prove(&f.leaders, &f.alpha, &mut rng).unwrap();
        let payload = Stage2Payload {
            epoch_id: 2,
            self_index: 1,
            self_public_key: f.leaders[1],
            alpha_public_keys: alpha_keys,
            proof,
        };
        let context = CallContext {
            caller: address_of::<Bn254Keccak>(&f.leaders[1]).unwrap(),
            epoch_id: 2,
            slot_id: 60,
        };

        let input = encode_stage2(&payload).unwrap();
        assert_eq!(
            f.contract.run(&mut store, &context, &input).unwrap_err(),
            Error::MissingPriorMessage
        );
    }

    #[test]
    fn read_back_under_a_foreign_key_is_a_decode_mismatch() {
        let f = fixture(4);
        let mut store = MemoryStore::default();

        let payload = Stage1Payload::<Bn254Keccak> {
            epoch_id: 2,
            self_index: 1,
            masked_point: f.leaders[1] * f.alpha,
        };
        let input = encode_stage1(&payload).unwrap();

        // Same epoch, stored under another leader's key.
        store.set_state(
            &SLOT_LEADER_ADDRESS,
            state_key(2, 3, STAGE1_LABEL),
            input.clone(),
        );
        assert_eq!(
            f.contract.get_stage1(&store, 2, 3).unwrap_err(),
            Error::DecodeMismatch
        );

        // Same leader, stored under another epoch's key.
        store.set_state(&SLOT_LEADER_ADDRESS, state_key(5, 1, STAGE1_LABEL), input);
        assert_eq!(
            f.contract.get_stage1(&store, 5, 1).unwrap_err(),
            Error::DecodeMismatch
        );
    }
}
