//! Property-based tests for the block table.
//! Verifies invariants hold for ALL block/unblock sequences, not just fixed examples.

// Test files legitimately use arithmetic and indexing for verification.
#![allow(clippy::arithmetic_side_effects)]
#![allow(clippy::indexing_slicing)]
#![allow(clippy::unwrap_used)]

use energy::{ArbiterConfig, EnergyArbiter, EnergyMode, Fatal};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Op {
    Block(EnergyMode),
    Unblock(EnergyMode),
}

fn mode() -> impl Strategy<Value = EnergyMode> {
    (0u32..4).prop_map(|raw| EnergyMode::from_raw(raw).unwrap())
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![mode().prop_map(Op::Block), mode().prop_map(Op::Unblock)]
}

/// Straightforward model of the table: clamp at zero, refuse at the limit.
fn apply_model(model: &mut [u8; 4], op: Op, limit: u8) -> Result<(), Fatal> {
    match op {
        Op::Block(mode) => {
            let slot = &mut model[mode.index()];
            if *slot + 1 >= limit {
                return Err(Fatal::Saturated { mode, limit });
            }
            *slot += 1;
        }
        Op::Unblock(mode) => {
            let slot = &mut model[mode.index()];
            *slot = slot.saturating_sub(1);
        }
    }
    Ok(())
}

proptest! {
    /// Every count stays in [0, limit) after every operation, and the
    /// arbiter agrees with the model on counts and on fatal outcomes.
    #[test]
    fn counts_stay_below_limit_and_match_model(
        limit in 2u8..=16u8,
        ops in proptest::collection::vec(op(), 0..200),
    ) {
        let arbiter: EnergyArbiter = EnergyArbiter::new(ArbiterConfig::new(limit).unwrap());
        arbiter.initialize();
        let mut model = [0u8; 4];

        for op in ops {
            let expected = apply_model(&mut model, op, limit);
            let actual = match op {
                Op::Block(mode) => arbiter.block(mode),
                Op::Unblock(mode) => {
                    arbiter.unblock(mode);
                    Ok(())
                }
            };
            prop_assert_eq!(actual, expected);

            for (mode, count) in arbiter.counts().iter() {
                prop_assert!(count < limit, "{} count {} reached limit {}", mode, count, limit);
                prop_assert_eq!(count, model[mode.index()]);
            }
        }
    }

    /// The selected depth is always the shallowest nonzero mode, or EM3.
    #[test]
    fn selected_depth_is_shallowest_nonzero(
        ops in proptest::collection::vec(op(), 0..100),
    ) {
        let arbiter: EnergyArbiter = EnergyArbiter::default();
        for op in ops {
            match op {
                Op::Block(mode) => { let _ = arbiter.block(mode); }
                Op::Unblock(mode) => arbiter.unblock(mode),
            }
        }

        let counts = arbiter.counts();
        let expected = EnergyMode::ALL
            .into_iter()
            .find(|&mode| counts.count(mode) > 0)
            .unwrap_or(EnergyMode::DEEPEST);
        prop_assert_eq!(arbiter.select_sleep_depth(), expected);
        prop_assert_eq!(arbiter.current_blocked_mode(), expected);
    }

    /// k blocks followed by k unblocks restore the count.
    #[test]
    fn balanced_pairs_restore_count(m in mode(), k in 0u8..9u8, preload in 0u8..=1u8) {
        let arbiter: EnergyArbiter = EnergyArbiter::default();
        for _ in 0..preload {
            arbiter.block(m).unwrap();
        }
        let before = arbiter.count(m);
        for _ in 0..k {
            arbiter.block(m).unwrap();
        }
        for _ in 0..k {
            arbiter.unblock(m);
        }
        prop_assert_eq!(arbiter.count(m), before);
    }

    /// Exactly `limit` consecutive blocks: the last one is the fatal one.
    #[test]
    fn saturation_trips_on_the_call_that_would_reach_limit(m in mode(), limit in 2u8..=32u8) {
        let arbiter: EnergyArbiter = EnergyArbiter::new(ArbiterConfig::new(limit).unwrap());
        for _ in 1..limit {
            prop_assert!(arbiter.block(m).is_ok());
        }
        prop_assert_eq!(arbiter.block(m), Err(Fatal::Saturated { mode: m, limit }));
        prop_assert_eq!(arbiter.count(m), limit - 1);
    }

    /// Raw identifiers above EM3 are always fatal and never touch the table.
    #[test]
    fn out_of_range_identifiers_are_fatal(raw in 4u32..=u32::MAX) {
        let arbiter: EnergyArbiter = EnergyArbiter::default();
        prop_assert_eq!(arbiter.block_raw(raw), Err(Fatal::InvalidMode { raw }));
        prop_assert_eq!(arbiter.unblock_raw(raw), Err(Fatal::InvalidMode { raw }));
        prop_assert!(arbiter.counts().is_clear());
    }
}
