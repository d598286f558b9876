//! The energy mode arbiter.
//!
//! A reference-counting table indexed by [`EnergyMode`]. Drivers
//! [`block`](EnergyArbiter::block) the shallowest mode whose clocks they
//! need before starting a transaction and [`unblock`](EnergyArbiter::unblock)
//! it from the completion interrupt. The idle loop calls
//! [`enter_sleep`](EnergyArbiter::enter_sleep).
//!
//! ## Sharing
//!
//! There is exactly one arbiter per system. Firmware places it in a `static`
//! (the constructor is `const`) and hands `&'static EnergyArbiter` to every
//! driver and to the idle loop. The table lives behind an
//! [`embassy_sync::blocking_mutex::Mutex`]; with the default
//! [`CriticalSectionRawMutex`] every read-modify-write runs with interrupts
//! masked on target and under the global critical-section lock on host.
//!
//! ## Counting, not tracking
//!
//! The arbiter does not record which driver holds which block. Unblocking a
//! mode whose count is already zero is tolerated and leaves it at zero.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, RawMutex};
use embassy_sync::blocking_mutex::Mutex;

use crate::config::ArbiterConfig;
use crate::error::Fatal;
use crate::mode::{EnergyMode, SleepDecision};
use crate::sleep::SleepBackend;
use crate::table::BlockCounts;

/// Decides how deep the processor may sleep.
///
/// `M` selects the lock protecting the table. The default,
/// [`CriticalSectionRawMutex`], is safe to share between thread-mode code and
/// interrupt handlers.
pub struct EnergyArbiter<M: RawMutex = CriticalSectionRawMutex> {
    table: Mutex<M, Cell<BlockCounts>>,
    config: ArbiterConfig,
}

impl<M: RawMutex> EnergyArbiter<M> {
    /// Create an arbiter with every count at zero.
    pub const fn new(config: ArbiterConfig) -> Self {
        Self {
            table: Mutex::new(Cell::new(BlockCounts::CLEAR)),
            config,
        }
    }

    /// The configuration this arbiter was built with.
    pub const fn config(&self) -> ArbiterConfig {
        self.config
    }

    /// Reset every count to zero.
    ///
    /// Call once at boot, before interrupts are enabled and before any driver
    /// runs. A second call silently drops every outstanding block.
    pub fn initialize(&self) {
        self.table.lock(|table| table.set(BlockCounts::CLEAR));
        #[cfg(feature = "defmt")]
        defmt::debug!("energy arbiter initialised, saturation limit {=u8}", self.config.saturation_limit());
    }

    /// Forbid entering `mode` or anything deeper until a matching
    /// [`unblock`](Self::unblock).
    ///
    /// # Errors
    ///
    /// [`Fatal::Saturated`] if the count would reach the configured ceiling.
    /// The count is left unchanged in that case.
    #[must_use = "a Fatal outcome must halt the system"]
    pub fn block(&self, mode: EnergyMode) -> Result<(), Fatal> {
        let limit = self.config.saturation_limit();
        let outcome = self.table.lock(|table| {
            let mut counts = table.get();
            let next = counts
                .count(mode)
                .checked_add(1)
                .filter(|&next| next < limit)
                .ok_or(Fatal::Saturated { mode, limit })?;
            counts.set(mode, next);
            table.set(counts);
            Ok(next)
        });

        match outcome {
            Ok(_count) => {
                #[cfg(feature = "defmt")]
                defmt::trace!("block {} -> {=u8}", mode, _count);
                Ok(())
            }
            Err(fatal) => {
                #[cfg(feature = "defmt")]
                defmt::error!("block {} saturated at {=u8}", mode, limit);
                Err(fatal)
            }
        }
    }

    /// Release one block on `mode`.
    ///
    /// A count already at zero stays at zero; the arbiter cannot tell a
    /// defensive unblock from a double release.
    pub fn unblock(&self, mode: EnergyMode) {
        let released = self.table.lock(|table| {
            let mut counts = table.get();
            match counts.count(mode).checked_sub(1) {
                Some(next) => {
                    counts.set(mode, next);
                    table.set(counts);
                    Some(next)
                }
                None => None,
            }
        });

        match released {
            Some(_count) => {
                #[cfg(feature = "defmt")]
                defmt::trace!("unblock {} -> {=u8}", mode, _count);
            }
            None => {
                #[cfg(feature = "defmt")]
                defmt::debug!("unblock {} with no block outstanding", mode);
            }
        }
    }

    /// [`block`](Self::block) with a raw identifier from a driver.
    ///
    /// # Errors
    ///
    /// [`Fatal::InvalidMode`] for an identifier outside EM0..EM3, otherwise
    /// as [`block`](Self::block).
    #[must_use = "a Fatal outcome must halt the system"]
    pub fn block_raw(&self, raw: u32) -> Result<(), Fatal> {
        self.block(EnergyMode::from_raw(raw)?)
    }

    /// [`unblock`](Self::unblock) with a raw identifier from a driver.
    ///
    /// # Errors
    ///
    /// [`Fatal::InvalidMode`] for an identifier outside EM0..EM3.
    #[must_use = "a Fatal outcome must halt the system"]
    pub fn unblock_raw(&self, raw: u32) -> Result<(), Fatal> {
        self.unblock(EnergyMode::from_raw(raw)?);
        Ok(())
    }

    /// Block `mode` for the lifetime of the returned guard.
    ///
    /// # Errors
    ///
    /// As [`block`](Self::block).
    pub fn hold(&self, mode: EnergyMode) -> Result<SleepBlock<'_, M>, Fatal> {
        self.block(mode)?;
        Ok(SleepBlock {
            arbiter: self,
            mode,
        })
    }

    /// Shallowest blocked mode, or [`EnergyMode::DEEPEST`] when nothing is
    /// blocked.
    ///
    /// Any single block on a shallow mode wins over blocks on deeper modes.
    pub fn select_sleep_depth(&self) -> EnergyMode {
        self.counts()
            .first_blocked()
            .unwrap_or(EnergyMode::DEEPEST)
    }

    /// Diagnostic view of the arbitration result. Same answer as
    /// [`select_sleep_depth`](Self::select_sleep_depth); never mutates and
    /// never sleeps.
    pub fn current_blocked_mode(&self) -> EnergyMode {
        self.select_sleep_depth()
    }

    /// What [`enter_sleep`](Self::enter_sleep) would do right now.
    pub fn sleep_decision(&self) -> SleepDecision {
        SleepDecision::from_blocked(self.counts().first_blocked())
    }

    /// Evaluate the table once and, unless EM0 or EM1 is blocked, sleep.
    ///
    /// The decision and the sleep entry happen inside one critical section,
    /// so a block taken by an interrupt that fires in between is not lost:
    /// the interrupt wakes the core immediately and the next idle iteration
    /// sees the new block. Returns after wake-up, or at once when staying
    /// awake.
    pub fn enter_sleep<B: SleepBackend>(&self, backend: &mut B) -> SleepDecision {
        self.table.lock(|table| {
            let decision = SleepDecision::from_blocked(table.get().first_blocked());
            if let SleepDecision::Enter(depth) = decision {
                backend.enter(depth);
            }
            decision
        })
    }

    /// Copy of the block table.
    pub fn counts(&self) -> BlockCounts {
        self.table.lock(Cell::get)
    }

    /// Outstanding blocks on `mode`.
    pub fn count(&self, mode: EnergyMode) -> u8 {
        self.counts().count(mode)
    }
}

impl<M: RawMutex> Default for EnergyArbiter<M> {
    fn default() -> Self {
        Self::new(ArbiterConfig::DEFAULT)
    }
}

// ── Scoped block ─────────────────────────────────────────────────────────────

/// A block that is released when dropped.
///
/// Returned by [`EnergyArbiter::hold`]. Useful for transactions that start
/// and finish in the same scope, such as a blocking I2C read.
#[must_use = "dropping the guard releases the block immediately"]
pub struct SleepBlock<'a, M: RawMutex = CriticalSectionRawMutex> {
    arbiter: &'a EnergyArbiter<M>,
    mode: EnergyMode,
}

impl<M: RawMutex> SleepBlock<'_, M> {
    /// The mode this guard keeps blocked.
    pub fn mode(&self) -> EnergyMode {
        self.mode
    }

    /// Release the block now.
    pub fn release(self) {
        drop(self);
    }
}

impl<M: RawMutex> Drop for SleepBlock<'_, M> {
    fn drop(&mut self) {
        self.arbiter.unblock(self.mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockSleep;
    use crate::mode::SleepDepth;

    fn arbiter() -> EnergyArbiter {
        let arbiter = EnergyArbiter::new(ArbiterConfig::DEFAULT);
        arbiter.initialize();
        arbiter
    }

    #[test]
    fn initialized_arbiter_reports_deepest_mode() {
        let arbiter = arbiter();
        assert_eq!(arbiter.current_blocked_mode(), EnergyMode::Em3);
        assert!(arbiter.counts().is_clear());
    }

    #[test]
    fn block_then_unblock_em2() {
        let arbiter = arbiter();
        arbiter.block(EnergyMode::Em2).unwrap();
        assert_eq!(arbiter.select_sleep_depth(), EnergyMode::Em2);
        arbiter.unblock(EnergyMode::Em2);
        assert_eq!(arbiter.select_sleep_depth(), EnergyMode::Em3);
    }

    #[test]
    fn shallowest_block_wins() {
        let arbiter = arbiter();
        arbiter.block(EnergyMode::Em1).unwrap();
        arbiter.block(EnergyMode::Em3).unwrap();
        assert_eq!(arbiter.select_sleep_depth(), EnergyMode::Em1);
        arbiter.unblock(EnergyMode::Em1);
        assert_eq!(arbiter.select_sleep_depth(), EnergyMode::Em3);
        assert_eq!(arbiter.count(EnergyMode::Em3), 1);
    }

    #[test]
    fn over_unblock_is_clamped() {
        let arbiter = arbiter();
        arbiter.unblock(EnergyMode::Em0);
        assert_eq!(arbiter.count(EnergyMode::Em0), 0);
        arbiter.block(EnergyMode::Em0).unwrap();
        arbiter.unblock(EnergyMode::Em0);
        arbiter.unblock(EnergyMode::Em0);
        assert_eq!(arbiter.count(EnergyMode::Em0), 0);
    }

    #[test]
    fn saturation_is_fatal_and_leaves_count_below_limit() {
        let arbiter = arbiter();
        for _ in 0..9 {
            arbiter.block(EnergyMode::Em2).unwrap();
        }
        assert_eq!(
            arbiter.block(EnergyMode::Em2),
            Err(Fatal::Saturated {
                mode: EnergyMode::Em2,
                limit: 10
            })
        );
        assert_eq!(arbiter.count(EnergyMode::Em2), 9);
    }

    #[test]
    fn raw_identifiers_are_validated() {
        let arbiter = arbiter();
        assert_eq!(arbiter.block_raw(4), Err(Fatal::InvalidMode { raw: 4 }));
        assert_eq!(arbiter.unblock_raw(9), Err(Fatal::InvalidMode { raw: 9 }));
        arbiter.block_raw(2).unwrap();
        assert_eq!(arbiter.count(EnergyMode::Em2), 1);
        arbiter.unblock_raw(2).unwrap();
        assert!(arbiter.counts().is_clear());
    }

    #[test]
    fn initialize_drops_outstanding_blocks() {
        let arbiter = arbiter();
        arbiter.block(EnergyMode::Em0).unwrap();
        arbiter.initialize();
        assert!(arbiter.counts().is_clear());
    }

    #[test]
    fn hold_releases_on_drop() {
        let arbiter = arbiter();
        {
            let guard = arbiter.hold(EnergyMode::Em2).unwrap();
            assert_eq!(guard.mode(), EnergyMode::Em2);
            assert_eq!(arbiter.select_sleep_depth(), EnergyMode::Em2);
        }
        assert_eq!(arbiter.select_sleep_depth(), EnergyMode::Em3);
    }

    #[test]
    fn hold_reports_saturation() {
        let arbiter: EnergyArbiter = EnergyArbiter::new(ArbiterConfig::new(2).unwrap());
        let _first = arbiter.hold(EnergyMode::Em1).unwrap();
        assert!(arbiter.hold(EnergyMode::Em1).is_err());
        assert_eq!(arbiter.count(EnergyMode::Em1), 1);
    }

    #[test]
    fn enter_sleep_stays_awake_when_em1_blocked() {
        let arbiter = arbiter();
        let mut sleep = MockSleep::new();
        arbiter.block(EnergyMode::Em1).unwrap();
        assert_eq!(
            arbiter.enter_sleep(&mut sleep),
            SleepDecision::StayAwake {
                blocked: EnergyMode::Em1
            }
        );
        assert!(sleep.entries().is_empty());
    }

    #[test]
    fn enter_sleep_goes_deepest_when_unblocked() {
        let arbiter = arbiter();
        let mut sleep = MockSleep::new();
        arbiter.enter_sleep(&mut sleep);
        arbiter.block(EnergyMode::Em3).unwrap();
        arbiter.enter_sleep(&mut sleep);
        arbiter.block(EnergyMode::Em2).unwrap();
        arbiter.enter_sleep(&mut sleep);
        assert_eq!(
            sleep.entries(),
            &[SleepDepth::Em3, SleepDepth::Em2, SleepDepth::Em1]
        );
    }

    #[test]
    fn sleep_decision_does_not_sleep() {
        let arbiter = arbiter();
        arbiter.block(EnergyMode::Em2).unwrap();
        assert_eq!(
            arbiter.sleep_decision(),
            SleepDecision::Enter(SleepDepth::Em1)
        );
        assert_eq!(arbiter.count(EnergyMode::Em2), 1);
    }
}
