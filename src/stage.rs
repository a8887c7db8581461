//! The epoch stage clock.
//!
//! An epoch is partitioned into six contiguous, equal-length windows which
//! gate the random-beacon contract entry points: the two DKG phases, the
//! signing phase, and a confirmation window after each. The slot-leader
//! contract uses raw epoch-relative windows instead of this cycle.

/// The six protocol stages of a random-beacon epoch, in on-chain order.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EpochStage {
    /// Commitment rows are being submitted.
    Dkg1,
    /// Grace window after DKG phase 1.
    Dkg1Confirm,
    /// Encrypted shares and proofs are being submitted.
    Dkg2,
    /// Grace window after DKG phase 2.
    Dkg2Confirm,
    /// Signature shares over the epoch's beacon message are being submitted.
    Sign,
    /// Grace window after signing.
    SignConfirm,
}

impl EpochStage {
    fn from_index(index: u64) -> Self {
        match index {
            0 => EpochStage::Dkg1,
            1 => EpochStage::Dkg1Confirm,
            2 => EpochStage::Dkg2,
            3 => EpochStage::Dkg2Confirm,
            4 => EpochStage::Sign,
            _ => EpochStage::SignConfirm,
        }
    }
}

/// Map a slot offset within an epoch to its protocol stage, the number of
/// slots elapsed inside that stage and the number of slots remaining.
///
/// Each stage window spans `2 * k` slots; the six windows repeat in fixed
/// order. Pure and deterministic; this is what gates which contract entry
/// point may succeed at a given chain time.
pub fn epoch_stage(slot: u64, k: u64) -> (EpochStage, u64, u64) {
    let window = 2 * k;
    let stage = EpochStage::from_index((slot / window) % 6);
    let elapsed = slot % window;

    (stage, elapsed, window - 1 - elapsed)
}

/// An inclusive epoch-relative slot range, used for the slot-leader stages.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SlotWindow {
    /// First slot (inclusive) of the window.
    pub start: u64,
    /// Last slot (inclusive) of the window.
    pub end: u64,
}

impl SlotWindow {
    /// Whether `slot` falls inside this window.
    pub fn contains(&self, slot: u64) -> bool {
        slot >= self.start && slot <= self.end
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const K: u64 = 10;

    #[test]
    fn stage_boundary_table() {
        let table: &[(u64, EpochStage, u64, u64)] = &[
            (0, EpochStage::Dkg1, 0, 2 * K - 1),
            (9, EpochStage::Dkg1, 9, 2 * K - 10),
            (19, EpochStage::Dkg1, 19, 0),
            (20, EpochStage::Dkg1Confirm, 0, 2 * K - 1),
            (29, EpochStage::Dkg1Confirm, 9, 2 * K - 10),
            (39, EpochStage::Dkg1Confirm, 19, 0),
            (40, EpochStage::Dkg2, 0, 2 * K - 1),
            (49, EpochStage::Dkg2, 9, 2 * K - 10),
            (59, EpochStage::Dkg2, 19, 0),
            (60, EpochStage::Dkg2Confirm, 0, 2 * K - 1),
            (69, EpochStage::Dkg2Confirm, 9, 2 * K - 10),
            (79, EpochStage::Dkg2Confirm, 19, 0),
            (80, EpochStage::Sign, 0, 2 * K - 1),
            (89, EpochStage::Sign, 9, 2 * K - 10),
            (99, EpochStage::Sign, 19, 0),
            (100, EpochStage::SignConfirm, 0, 2 * K - 1),
            (109, EpochStage::SignConfirm, 9, 2 * K - 10),
            (119, EpochStage::SignConfirm, 19, 0),
        ];

        for (slot, stage, elapsed, remaining) in table {
            assert_eq!(
                epoch_stage(*slot, K),
                (*stage, *elapsed, *remaining),
                "slot {}",
                slot
            );
        }
    }

    #[test]
    fn stage_cycle_wraps_past_one_epoch() {
        // The clock is defined modulo the six-window cycle.
        assert_eq!(epoch_stage(120, K), (EpochStage::Dkg1, 0, 2 * K - 1));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let w = SlotWindow { start: 5, end: 9 };
        assert!(!w.contains(4));
        assert!(w.contains(5));
        assert!(w.contains(9));
        assert!(!w.contains(10));
    }
}
