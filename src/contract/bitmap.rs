//! Per-epoch submission bitmaps.
//!
//! Each contract method keeps one bitmap per epoch recording which committee
//! members have already had a call accepted, so that a second submission from
//! the same index is rejected before any state is overwritten. The bitmap is
//! stored as a whole value under a single state key, one byte per member, and
//! is re-read and re-written on every accepted call.

use crate::utils::Vec;
use crate::{BeaconResult, Error};

use super::{Address, StateStore};

/// A bitmap of accepted submissions, one byte per committee member.
///
/// Its capacity is fixed at load time from the committee size; claims for
/// indices at or beyond that capacity are rejected rather than panicking, so
/// an oversized fallback committee can never write past the stored value.
pub(crate) struct SubmissionBitmap {
    flags: Vec<u8>,
}

impl SubmissionBitmap {
    /// Loads the bitmap stored under `key`, treating a missing or
    /// wrongly-sized value as all-clear.
    pub(crate) fn load(
        store: &dyn StateStore,
        address: &Address,
        key: &[u8; 32],
        capacity: usize,
    ) -> Self {
        let flags = match store.get_state(address, key) {
            Some(bytes) if bytes.len() == capacity => bytes,
            _ => core::iter::repeat(0u8).take(capacity).collect(),
        };

        Self { flags }
    }

    pub(crate) fn is_set(&self, index: u32) -> bool {
        self.flags.get(index as usize).is_some_and(|f| *f != 0)
    }

    /// Marks `index` as submitted, rejecting out-of-range indices and
    /// duplicates.
    pub(crate) fn claim(&mut self, index: u32) -> BeaconResult<()> {
        let flag = self
            .flags
            .get_mut(index as usize)
            .ok_or(Error::UnauthorizedSender)?;
        if *flag != 0 {
            return Err(Error::AlreadySubmitted(index));
        }
        *flag = 1;

        Ok(())
    }

    pub(crate) fn persist(self, store: &mut dyn StateStore, address: &Address, key: [u8; 32]) {
        store.set_state(address, key, self.flags);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::contract::RANDOM_BEACON_ADDRESS;
    use crate::testing::MemoryStore;

    #[test]
    fn claims_survive_a_store_roundtrip() {
        let mut store = MemoryStore::new();
        let key = [7u8; 32];

        let mut bitmap = SubmissionBitmap::load(&store, &RANDOM_BEACON_ADDRESS, &key, 4);
        assert!(!bitmap.is_set(2));
        bitmap.claim(2).unwrap();
        bitmap.persist(&mut store, &RANDOM_BEACON_ADDRESS, key);

        let bitmap = SubmissionBitmap::load(&store, &RANDOM_BEACON_ADDRESS, &key, 4);
        assert!(bitmap.is_set(2));
        assert!(!bitmap.is_set(0));
    }

    #[test]
    fn duplicate_claims_are_rejected() {
        let store = MemoryStore::new();
        let mut bitmap = SubmissionBitmap::load(&store, &RANDOM_BEACON_ADDRESS, &[0u8; 32], 4);

        bitmap.claim(1).unwrap();
        assert!(matches!(bitmap.claim(1), Err(Error::AlreadySubmitted(1))));
    }

    #[test]
    fn out_of_range_claims_are_rejected() {
        let store = MemoryStore::new();
        let mut bitmap = SubmissionBitmap::load(&store, &RANDOM_BEACON_ADDRESS, &[0u8; 32], 4);

        assert!(!bitmap.is_set(4));
        assert!(matches!(bitmap.claim(4), Err(Error::UnauthorizedSender)));
        assert!(matches!(
            bitmap.claim(u32::MAX),
            Err(Error::UnauthorizedSender)
        ));
    }

    #[test]
    fn wrong_sized_stored_value_reads_as_clear() {
        let mut store = MemoryStore::new();
        let key = [9u8; 32];
        store.set_state(&RANDOM_BEACON_ADDRESS, key, vec![1u8; 3]);

        let bitmap = SubmissionBitmap::load(&store, &RANDOM_BEACON_ADDRESS, &key, 4);
        for index in 0..4 {
            assert!(!bitmap.is_set(index));
        }
    }
}
